use crate::{auth::auth::AuthUser, error::AppError};
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 48)]
    pub total_employees: i64,
    #[schema(example = 6)]
    pub managers: i64,
    /// Attendance records for today, any status
    #[schema(example = 41)]
    pub signed_in_today: i64,
    #[schema(example = 5)]
    pub pending_attendance: i64,
    #[schema(example = 3)]
    pub pending_leaves: i64,
    /// Approved leaves covering today
    #[schema(example = 2)]
    pub on_leave_today: i64,
    #[schema(example = 1)]
    pub upcoming_holidays: i64,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Organisation counters", body = DashboardStats),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let today = Utc::now().date_naive();

    let row: (i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM employees),
            (SELECT COUNT(*) FROM employees WHERE role = 'manager'),
            (SELECT COUNT(*) FROM attendance WHERE work_date = ?),
            (SELECT COUNT(*) FROM attendance WHERE status = 'pending'),
            (SELECT COUNT(*) FROM leaves WHERE status = 'pending'),
            (SELECT COUNT(*) FROM leaves
                WHERE status = 'approved' AND start_date <= ? AND end_date >= ?),
            (SELECT COUNT(*) FROM holidays WHERE date >= ?)
        "#,
    )
    .bind(today)
    .bind(today)
    .bind(today)
    .bind(today)
    .fetch_one(pool.get_ref())
    .await?;

    let (
        total_employees,
        managers,
        signed_in_today,
        pending_attendance,
        pending_leaves,
        on_leave_today,
        upcoming_holidays,
    ) = row;

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_employees,
        managers,
        signed_in_today,
        pending_attendance,
        pending_leaves,
        on_leave_today,
        upcoming_holidays,
    }))
}
