use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "full_name": "Asha Verma",
        "email": "asha.verma@vtc.example",
        "role": "employee",
        "department": "Operations",
        "manager_id": 3,
        "created_at": "2026-01-05T09:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Asha Verma")]
    pub full_name: String,

    #[schema(example = "asha.verma@vtc.example")]
    pub email: String,

    /// admin, hr, manager, employee or temp_vendor
    #[schema(example = "employee")]
    pub role: String,

    #[schema(example = "Operations", nullable = true)]
    pub department: Option<String>,

    #[schema(example = 3, nullable = true)]
    pub manager_id: Option<u64>,

    #[schema(example = "2026-01-05T09:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

pub const EMPLOYEE_COLUMNS: &str =
    "id, full_name, email, role, department, manager_id, created_at";
