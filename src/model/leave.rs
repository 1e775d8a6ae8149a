use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Casual,
    Sick,
    Earned,
    Compensatory,
}

impl LeaveType {
    /// Counter column in `leave_balances`.
    pub fn balance_column(self) -> &'static str {
        match self {
            LeaveType::Casual => "casual_leaves",
            LeaveType::Sick => "sick_leaves",
            LeaveType::Earned => "earned_leaves",
            LeaveType::Compensatory => "compensatory_leaves",
        }
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// Days covered by `start..=end`; zero for an inverted range.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "Asha Verma", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = "2026-02-02", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-04", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "casual")]
    pub leave_type: String,
    #[schema(example = "Family function")]
    pub reason: String,
    pub document_url: Option<String>,
    #[schema(example = "pending")]
    pub status: String,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-20T10:00:00Z", value_type = String, format = "date-time")]
    pub applied_at: DateTime<Utc>,
}

impl LeaveApplication {
    pub fn days(&self) -> i64 {
        inclusive_days(self.start_date, self.end_date)
    }
}

pub const LEAVE_SELECT: &str = r#"
    SELECT l.id, l.employee_id, e.full_name AS employee_name, l.start_date, l.end_date,
           l.leave_type, l.reason, l.document_url, l.status, l.approved_by, l.approved_at,
           l.applied_at
    FROM leaves l
    LEFT JOIN employees e ON e.id = l.employee_id
"#;
