use crate::{
    auth::auth::{ApprovalScope, AuthUser},
    config::Config,
    error::AppError,
    model::{
        leave::{LEAVE_SELECT, LeaveApplication, LeaveStatus, LeaveType, inclusive_days},
        leave_balance::{LeaveBalance, deduction_upsert_sql, fetch_balance},
    },
    storage::{DOCUMENT_BUCKET, Storage, sanitize_file_name},
    utils::{
        data_url::{DOCUMENT_TYPES, DataUrl},
        pagination::Pagination,
        validation::not_blank,
    },
};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct LeaveDocument {
    #[schema(example = "medical-certificate.pdf")]
    #[validate(length(min = 1, max = 255, message = "Document file name must be 1-255 characters"))]
    pub file_name: String,
    /// `data:application/pdf;base64,...`
    pub data_url: String,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateLeave {
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "casual")]
    pub leave_type: LeaveType,
    #[schema(example = "Family function")]
    #[validate(custom(function = "not_blank", message = "Reason is required"))]
    pub reason: String,
    #[validate(nested)]
    pub document: Option<LeaveDocument>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 7)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// pending, approved or rejected
    pub status: Option<String>,
    #[schema(example = "sick")]
    /// casual, sick, earned or compensatory
    pub leave_type: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveApplication>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

/// Dates, reason and balance checks for a new application; returns the
/// number of days requested.
pub fn validate_application(
    payload: &CreateLeave,
    balance: &LeaveBalance,
) -> Result<i64, AppError> {
    payload.validate()?;
    if payload.start_date > payload.end_date {
        return Err(AppError::bad_request("start_date cannot be after end_date"));
    }

    let days = inclusive_days(payload.start_date, payload.end_date);
    if !balance.can_cover(payload.leave_type, days) {
        return Err(AppError::bad_request(format!(
            "Insufficient {} leave balance: {} available, {} requested",
            payload.leave_type,
            balance.available(payload.leave_type),
            days
        )));
    }
    Ok(days)
}

fn parse_status(raw: &str) -> Result<LeaveStatus, AppError> {
    LeaveStatus::from_str(raw)
        .map_err(|_| AppError::bad_request("Invalid status. Allowed: pending, approved, rejected"))
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave application with an optional supporting document",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave application submitted", body = Object, example = json!({
            "message": "Leave application submitted", "id": 12, "days": 3, "status": "pending"
        })),
        (status = 400, description = "Invalid dates, missing reason or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id;

    // 1️⃣ dates, reason, balance
    let balance = fetch_balance(pool.get_ref(), employee_id).await?;
    let days = validate_application(&payload, &balance)?;

    // 2️⃣ optional document
    let document = match &payload.document {
        Some(doc) => {
            let file = DataUrl::parse(&doc.data_url, config.max_upload_bytes, DOCUMENT_TYPES)
                .map_err(|e| AppError::bad_request(format!("Document: {}", e)))?;
            let key = format!(
                "leave-docs/{}-{}",
                Utc::now().timestamp_millis(),
                sanitize_file_name(&doc.file_name)
            );
            let url = storage
                .put(DOCUMENT_BUCKET, &key, &file.bytes)
                .await
                .map_err(|e| {
                    error!(error = %e, employee_id, "Leave document upload failed");
                    AppError::Internal(e.to_string())
                })?;
            Some((key, url))
        }
        None => None,
    };
    let document_url = document.as_ref().map(|(_, url)| url.as_str());

    // 3️⃣ insert request
    let inserted = sqlx::query(
        r#"
        INSERT INTO leaves
            (employee_id, start_date, end_date, leave_type, reason, document_url, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(employee_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.leave_type.as_ref())
    .bind(payload.reason.trim())
    .bind(document_url)
    .execute(pool.get_ref())
    .await;

    let result = match inserted {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, employee_id, "Failed to create leave request");
            if let Some((key, _)) = &document {
                storage.remove(DOCUMENT_BUCKET, key).await;
            }
            return Err(AppError::Internal(e.to_string()));
        }
    };

    let leave_id = result.last_insert_id();
    info!(employee_id, leave_id, days, leave_type = %payload.leave_type, "Leave applied");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave application submitted",
        "id": leave_id,
        "days": days,
        "status": LeaveStatus::Pending
    })))
}

/* =========================
Own applications and balance
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/me",
    responses(
        (status = 200, description = "Own leave applications, newest first", body = Vec<LeaveApplication>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let sql = format!(
        "{} WHERE l.employee_id = ? ORDER BY l.applied_at DESC",
        LEAVE_SELECT
    );
    let leaves = sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(auth.employee_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Own leave balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn my_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    let balance = fetch_balance(pool.get_ref(), auth.employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/* =========================
Approve leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and balance deducted", body = Object, example = json!({
            "message": "Leave approved", "days_deducted": 3
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let scope = auth.approval_scope()?;
    let leave_id = path.into_inner();

    let mut tx = pool.begin().await?;

    // lock the request so concurrent approvals deduct once
    let row: Option<(u64, NaiveDate, NaiveDate, String, String, Option<u64>)> = sqlx::query_as(
        r#"
        SELECT l.employee_id, l.start_date, l.end_date, l.leave_type, l.status, e.manager_id
        FROM leaves l
        JOIN employees e ON e.id = l.employee_id
        WHERE l.id = ?
        FOR UPDATE
        "#,
    )
    .bind(leave_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((employee_id, start_date, end_date, leave_type, status, manager_id)) = row else {
        return Err(AppError::bad_request(
            "Leave request not found or already processed",
        ));
    };

    if status != LeaveStatus::Pending.as_ref() {
        return Err(AppError::bad_request(
            "Leave request not found or already processed",
        ));
    }
    ensure_can_decide(&auth, scope, employee_id, manager_id)?;

    let leave_type = LeaveType::from_str(&leave_type).map_err(|_| {
        error!(leave_id, leave_type = %leave_type, "Stored leave type is unknown");
        AppError::Internal(format!("Unknown leave type {}", leave_type))
    })?;
    let days = inclusive_days(start_date, end_date);

    sqlx::query(
        r#"
        UPDATE leaves
        SET status = 'approved', approved_by = ?, approved_at = ?
        WHERE id = ?
        "#,
    )
    .bind(auth.employee_id)
    .bind(Utc::now())
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Approve leave failed");
        AppError::Internal(e.to_string())
    })?;

    // a missing balance row starts from the default allocation
    let seeded = LeaveBalance::default_allocation(employee_id).after_deduction(leave_type, days);
    sqlx::query(&deduction_upsert_sql(leave_type))
        .bind(employee_id)
        .bind(seeded.casual_leaves)
        .bind(seeded.sick_leaves)
        .bind(seeded.earned_leaves)
        .bind(seeded.compensatory_leaves)
        .bind(days)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(leave_id, employee_id, days, leave_type = %leave_type, approver = auth.employee_id, "Leave approved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "days_deducted": days
    })))
}

/// Approvers never decide their own requests; managers only their team's.
fn ensure_can_decide(
    auth: &AuthUser,
    scope: ApprovalScope,
    employee_id: u64,
    manager_id: Option<u64>,
) -> Result<(), AppError> {
    if employee_id == auth.employee_id {
        return Err(AppError::forbidden("You cannot decide your own request"));
    }
    match scope {
        ApprovalScope::All => Ok(()),
        ApprovalScope::Team(id) if manager_id == Some(id) => Ok(()),
        ApprovalScope::Team(_) => Err(AppError::forbidden("Not a member of your team")),
    }
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request not found or already processed", body = Object, example = json!({
            "message": "Leave request not found or already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let scope = auth.approval_scope()?;
    let leave_id = path.into_inner();

    let (all, manager_id) = match scope {
        ApprovalScope::All => (true, 0),
        ApprovalScope::Team(id) => (false, id),
    };

    // rejection leaves the balance untouched
    let result = sqlx::query(
        r#"
        UPDATE leaves l
        JOIN employees e ON e.id = l.employee_id
        SET l.status = 'rejected', l.approved_by = ?, l.approved_at = ?
        WHERE l.id = ?
        AND l.status = 'pending'
        AND l.employee_id <> ?
        AND (? OR e.manager_id = ?)
        "#,
    )
    .bind(auth.employee_id)
    .bind(Utc::now())
    .bind(leave_id)
    .bind(auth.employee_id)
    .bind(all)
    .bind(manager_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Reject leave failed");
        AppError::Internal(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request(
            "Leave request not found or already processed",
        ));
    }

    info!(leave_id, approver = auth.employee_id, "Leave rejected");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected"
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveApplication),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    let sql = format!("{} WHERE l.id = ?", LEAVE_SELECT);
    let leave = sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Failed to fetch leave request");
            AppError::Internal(e.to_string())
        })?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    if !auth.can_view_employee(pool.get_ref(), leave.employee_id).await? {
        return Err(AppError::forbidden("Not allowed to view this leave request"));
    }

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    let scope = auth.approval_scope()?;

    // -------------------------
    // Pagination
    // -------------------------
    let Pagination {
        page,
        per_page,
        offset,
    } = Pagination::new(query.page, query.per_page, 10);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let ApprovalScope::Team(manager_id) = scope {
        where_sql.push_str(" AND e.manager_id = ?");
        args.push(FilterValue::U64(manager_id));
    }

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND l.employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }

    if let Some(status) = query.status.as_deref() {
        let status = parse_status(status)?;
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }

    if let Some(leave_type) = query.leave_type.as_deref() {
        let leave_type = LeaveType::from_str(leave_type).map_err(|_| {
            AppError::bad_request("Invalid leave type. Allowed: casual, sick, earned, compensatory")
        })?;
        where_sql.push_str(" AND l.leave_type = ?");
        args.push(FilterValue::Str(leave_type.to_string()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!(
        "SELECT COUNT(*) FROM leaves l LEFT JOIN employees e ON e.id = l.employee_id{}",
        where_sql
    );

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count leave requests");
        AppError::Internal(e.to_string())
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{}{} ORDER BY l.applied_at DESC LIMIT ? OFFSET ?",
        LEAVE_SELECT, where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveApplication>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch leave list");
            AppError::Internal(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn application(start: NaiveDate, end: NaiveDate, leave_type: LeaveType) -> CreateLeave {
        CreateLeave {
            start_date: start,
            end_date: end,
            leave_type,
            reason: "Family function".into(),
            document: None,
        }
    }

    #[test]
    fn counts_inclusive_days() {
        let balance = LeaveBalance::default_allocation(7);
        let days = validate_application(&application(d(2, 2), d(2, 4), LeaveType::Casual), &balance);
        assert_eq!(days.unwrap(), 3);
    }

    #[test]
    fn rejects_inverted_dates_and_blank_reason() {
        let balance = LeaveBalance::default_allocation(7);
        assert!(validate_application(&application(d(2, 4), d(2, 2), LeaveType::Casual), &balance).is_err());

        let mut blank = application(d(2, 2), d(2, 2), LeaveType::Sick);
        blank.reason = "  ".into();
        assert_eq!(
            validate_application(&blank, &balance).unwrap_err().to_string(),
            "Reason is required"
        );
    }

    #[test]
    fn rejects_more_days_than_available() {
        let balance = LeaveBalance::default_allocation(7);
        // 11 sick days against an allocation of 10
        let err = validate_application(&application(d(3, 1), d(3, 11), LeaveType::Sick), &balance)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient sick leave balance: 10 available, 11 requested"
        );
        // no compensatory days until a holiday is worked
        assert!(
            validate_application(&application(d(3, 1), d(3, 1), LeaveType::Compensatory), &balance)
                .is_err()
        );
        let credited = balance.with_compensatory_credit();
        assert!(
            validate_application(&application(d(3, 1), d(3, 1), LeaveType::Compensatory), &credited)
                .is_ok()
        );
    }

    #[test]
    fn document_needs_a_file_name() {
        let balance = LeaveBalance::default_allocation(7);
        let mut app = application(d(2, 2), d(2, 2), LeaveType::Casual);
        app.document = Some(LeaveDocument {
            file_name: String::new(),
            data_url: "data:application/pdf;base64,JVBERg==".into(),
        });
        assert!(matches!(
            validate_application(&app, &balance),
            Err(AppError::BadRequest(_))
        ));
    }

    fn approver(role: Role, employee_id: u64) -> AuthUser {
        AuthUser {
            user_id: 1,
            email: "approver@vtc.example".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn managers_decide_only_for_their_team() {
        let manager = approver(Role::Manager, 3);
        let scope = manager.approval_scope().unwrap();
        assert!(ensure_can_decide(&manager, scope, 7, Some(3)).is_ok());
        assert!(ensure_can_decide(&manager, scope, 8, Some(4)).is_err());
        assert!(ensure_can_decide(&manager, scope, 9, None).is_err());
    }

    #[test]
    fn nobody_decides_their_own_request() {
        let hr = approver(Role::Hr, 5);
        let scope = hr.approval_scope().unwrap();
        assert!(ensure_can_decide(&hr, scope, 7, None).is_ok());
        assert!(matches!(
            ensure_can_decide(&hr, scope, 5, None),
            Err(AppError::Forbidden(_))
        ));
    }
}
