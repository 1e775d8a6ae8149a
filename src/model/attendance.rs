use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Pending,
    Approved,
    Rejected,
}

impl AttendanceStatus {
    /// Only pending records can be decided; decisions are final.
    pub fn can_transition_to(self, next: AttendanceStatus) -> bool {
        matches!(
            (self, next),
            (
                AttendanceStatus::Pending,
                AttendanceStatus::Approved | AttendanceStatus::Rejected
            )
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 28.6139)]
    pub latitude: f64,
    #[schema(example = 77.209)]
    pub longitude: f64,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "Asha Verma", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = "2026-01-05T03:30:00Z", value_type = String, format = "date-time")]
    pub signin_time: DateTime<Utc>,
    pub signin_latitude: Option<f64>,
    pub signin_longitude: Option<f64>,
    pub signin_selfie_url: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub signout_time: Option<DateTime<Utc>>,
    pub signout_latitude: Option<f64>,
    pub signout_longitude: Option<f64>,
    #[schema(example = "pending")]
    pub status: String,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Worked hours, present once the record is signed out.
    pub fn hours_worked(&self) -> Option<f64> {
        self.signout_time
            .map(|signout| hours_between(self.signin_time, signout))
    }
}

/// `(signout - signin)` in hours, never negative.
pub fn hours_between(signin: DateTime<Utc>, signout: DateTime<Utc>) -> f64 {
    let seconds = (signout - signin).num_seconds().max(0);
    seconds as f64 / 3600.0
}

pub const ATTENDANCE_SELECT: &str = r#"
    SELECT a.id, a.employee_id, e.full_name AS employee_name, a.work_date,
           a.signin_time, a.signin_latitude, a.signin_longitude, a.signin_selfie_url,
           a.signout_time, a.signout_latitude, a.signout_longitude,
           a.status, a.approved_by, a.approved_at
    FROM attendance a
    LEFT JOIN employees e ON e.id = a.employee_id
"#;
