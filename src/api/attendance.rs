use crate::{
    auth::auth::{ApprovalScope, AuthUser, manages},
    config::Config,
    error::{AppError, is_duplicate_key},
    model::{
        attendance::{ATTENDANCE_SELECT, AttendanceRecord, AttendanceStatus, GeoPoint},
        leave_balance::{COMPENSATORY_CREDIT_SQL, LeaveBalance},
    },
    storage::{SELFIE_BUCKET, Storage},
    utils::{
        csv_export::to_csv,
        data_url::{DataUrl, SELFIE_TYPES},
        pagination::Pagination,
    },
};
use actix_web::{HttpResponse, http::header, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Captured selfie as a `data:image/png;base64,...` URL
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub selfie: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize, ToSchema)]
pub struct SignOutRequest {
    pub location: Option<GeoPoint>,
}

#[derive(Serialize, ToSchema)]
pub struct SignInResponse {
    #[schema(example = "Sign in successful. Waiting for manager approval.")]
    pub message: String,
    #[schema(example = 42)]
    pub id: u64,
    pub status: AttendanceStatus,
    pub selfie_url: String,
    /// True when today is a holiday and a compensatory leave was credited
    pub compensatory_credited: bool,
}

#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TodayStatus {
    NotSignedIn,
    SignedIn,
    SignedOut,
}

#[derive(Serialize, ToSchema)]
pub struct MyAttendanceResponse {
    pub today: TodayStatus,
    pub data: Vec<AttendanceRecord>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MyAttendanceQuery {
    /// Most recent records to return (default 30, max 100)
    #[schema(example = 30)]
    pub limit: Option<u32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceFilter {
    /// Filter by employee ID
    #[schema(example = 7)]
    pub employee_id: Option<u64>,
    /// pending, approved or rejected
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Work date lower bound (inclusive)
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Work date upper bound (inclusive)
    #[schema(example = "2026-01-31", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 20)]
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

// Typed SQLx binding for the dynamic WHERE clause
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

/// Sign-in needs both a selfie and a usable location before anything is stored.
pub fn validate_sign_in(
    payload: &SignInRequest,
    max_upload_bytes: usize,
) -> Result<(DataUrl, GeoPoint), AppError> {
    let selfie = payload
        .selfie
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AppError::bad_request("Please capture your selfie first for face verification")
        })?;

    let location = payload
        .location
        .ok_or_else(|| AppError::bad_request("Please allow location access to sign in"))?;

    if !location.is_valid() {
        return Err(AppError::bad_request("Location coordinates are out of range"));
    }

    let selfie = DataUrl::parse(selfie, max_upload_bytes, SELFIE_TYPES)
        .map_err(|e| AppError::bad_request(format!("Selfie: {}", e)))?;

    Ok((selfie, location))
}

fn today_status(today: Option<&AttendanceRecord>) -> TodayStatus {
    match today {
        None => TodayStatus::NotSignedIn,
        Some(r) if r.signout_time.is_some() => TodayStatus::SignedOut,
        Some(_) => TodayStatus::SignedIn,
    }
}

fn parse_status(raw: &str) -> Result<AttendanceStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid status. Allowed: pending, approved, rejected"))
}

/* =========================
Sign in
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in, waiting for approval", body = SignInResponse),
        (status = 400, description = "Selfie or location missing, or already signed in today", body = Object, example = json!({
            "message": "Please capture your selfie first for face verification"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn sign_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    storage: web::Data<Storage>,
    config: web::Data<Config>,
    payload: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id;

    // 1️⃣ selfie + location, nothing is written without both
    let (selfie, location) = validate_sign_in(&payload, config.max_upload_bytes)?;

    let now = Utc::now();
    let work_date = now.date_naive();

    // 2️⃣ skip the upload when today's record already exists
    let existing: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance WHERE employee_id = ? AND work_date = ?",
    )
    .bind(employee_id)
    .bind(work_date)
    .fetch_one(pool.get_ref())
    .await?;
    if existing > 0 {
        return Err(AppError::bad_request("Already signed in today"));
    }

    // 3️⃣ upload selfie
    let key = format!(
        "attendance-selfies/{}/{}.{}",
        employee_id,
        now.timestamp_millis(),
        selfie.extension()
    );
    let selfie_url = storage
        .put(SELFIE_BUCKET, &key, &selfie.bytes)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Selfie upload failed");
            AppError::Internal(e.to_string())
        })?;

    // 4️⃣ record + holiday credit commit together; the selfie goes if they don't
    let (attendance_id, compensatory_credited) =
        match record_sign_in(pool.get_ref(), employee_id, now, location, &selfie_url).await {
            Ok(recorded) => recorded,
            Err(e) => {
                storage.remove(SELFIE_BUCKET, &key).await;
                return Err(e);
            }
        };

    info!(
        employee_id,
        attendance_id, compensatory_credited, "Signed in"
    );

    Ok(HttpResponse::Ok().json(SignInResponse {
        message: "Sign in successful. Waiting for manager approval.".into(),
        id: attendance_id,
        status: AttendanceStatus::Pending,
        selfie_url,
        compensatory_credited,
    }))
}

/// Inserts today's pending record and, on a holiday, credits one compensatory
/// day in the same transaction.
async fn record_sign_in(
    pool: &MySqlPool,
    employee_id: u64,
    now: DateTime<Utc>,
    location: GeoPoint,
    selfie_url: &str,
) -> Result<(u64, bool), AppError> {
    let work_date = now.date_naive();
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, work_date, signin_time, signin_latitude, signin_longitude,
             signin_selfie_url, status)
        VALUES (?, ?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(employee_id)
    .bind(work_date)
    .bind(now)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(selfie_url)
    .execute(&mut *tx)
    .await;

    let attendance_id = match inserted {
        Ok(r) => r.last_insert_id(),
        // concurrent sign-in for the same day
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::bad_request("Already signed in today"));
        }
        Err(e) => {
            error!(error = %e, employee_id, "Sign-in failed");
            return Err(AppError::Internal(e.to_string()));
        }
    };

    let holidays: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM holidays WHERE date = ?")
        .bind(work_date)
        .fetch_one(&mut *tx)
        .await?;

    let compensatory_credited = holidays > 0;
    if compensatory_credited {
        // a missing balance row starts from the default allocation
        let seeded = LeaveBalance::default_allocation(employee_id).with_compensatory_credit();
        sqlx::query(COMPENSATORY_CREDIT_SQL)
            .bind(employee_id)
            .bind(seeded.casual_leaves)
            .bind(seeded.sick_leaves)
            .bind(seeded.earned_leaves)
            .bind(seeded.compensatory_leaves)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok((attendance_id, compensatory_credited))
}

/* =========================
Sign out
========================= */
#[utoipa::path(
    put,
    path = "/api/attendance/sign-out",
    request_body = SignOutRequest,
    responses(
        (status = 200, description = "Signed out", body = Object, example = json!({
            "message": "Sign out successful"
        })),
        (status = 400, description = "Location missing or no active sign-in today", body = Object, example = json!({
            "message": "No active sign-in found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn sign_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<SignOutRequest>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_id;

    let location = payload
        .location
        .ok_or_else(|| AppError::bad_request("Please allow location access to sign out"))?;
    if !location.is_valid() {
        return Err(AppError::bad_request("Location coordinates are out of range"));
    }

    let now = Utc::now();

    // sign-out can be set only once
    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET signout_time = ?, signout_latitude = ?, signout_longitude = ?
        WHERE employee_id = ?
        AND work_date = ?
        AND signout_time IS NULL
        "#,
    )
    .bind(now)
    .bind(location.latitude)
    .bind(location.longitude)
    .bind(employee_id)
    .bind(now.date_naive())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Sign-out failed");
        AppError::Internal(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request("No active sign-in found for today"));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Sign out successful"
    })))
}

/* =========================
Own records
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(MyAttendanceQuery),
    responses(
        (status = 200, description = "Recent records and today's status", body = MyAttendanceResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MyAttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let limit = query.limit.unwrap_or(30).clamp(1, 100);

    let sql = format!(
        "{} WHERE a.employee_id = ? ORDER BY a.signin_time DESC LIMIT ?",
        ATTENDANCE_SELECT
    );
    let data = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(auth.employee_id)
        .bind(limit)
        .fetch_all(pool.get_ref())
        .await?;

    let today = Utc::now().date_naive();
    let status = today_status(data.iter().find(|r| r.work_date == today));

    Ok(HttpResponse::Ok().json(MyAttendanceResponse {
        today: status,
        data,
    }))
}

/* =========================
Listing (Admin/HR: all, Manager: team)
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    let scope = auth.approval_scope()?;

    // -------------------------
    // Pagination
    // -------------------------
    let Pagination {
        page,
        per_page,
        offset,
    } = Pagination::new(query.page, query.per_page, 20);

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
        where_sql.push_str(" AND a.employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }
    if let Some(status) = query.status.as_deref() {
        let status = parse_status(status)?;
        where_sql.push_str(" AND a.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    if let Some(from) = query.from {
        where_sql.push_str(" AND a.work_date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND a.work_date <= ?");
        args.push(FilterValue::Date(to));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!(
        "SELECT COUNT(*) FROM attendance a LEFT JOIN employees e ON e.id = a.employee_id{}",
        where_sql
    );
    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(s.as_str()),
            FilterValue::Date(d) => count_q.bind(*d),
        };
    }
    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count attendance");
        AppError::Internal(e.to_string())
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        "{}{} ORDER BY a.signin_time DESC LIMIT ? OFFSET ?",
        ATTENDANCE_SELECT, where_sql
    );
    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.as_str()),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }
    let data = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch attendance list");
            AppError::Internal(e.to_string())
        })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/* =========================
Approve / reject
========================= */
async fn decide_attendance(
    auth: &AuthUser,
    pool: &MySqlPool,
    attendance_id: u64,
    decision: AttendanceStatus,
) -> Result<HttpResponse, AppError> {
    let scope = auth.approval_scope()?;
    if !AttendanceStatus::Pending.can_transition_to(decision) {
        return Err(AppError::bad_request("Invalid decision"));
    }

    let (all, manager_id) = match scope {
        ApprovalScope::All => (true, 0),
        ApprovalScope::Team(id) => (false, id),
    };

    let result = sqlx::query(
        r#"
        UPDATE attendance a
        JOIN employees e ON e.id = a.employee_id
        SET a.status = ?, a.approved_by = ?, a.approved_at = ?
        WHERE a.id = ?
        AND a.status = 'pending'
        AND a.employee_id <> ?
        AND (? OR e.manager_id = ?)
        "#,
    )
    .bind(decision.as_ref())
    .bind(auth.employee_id)
    .bind(Utc::now())
    .bind(attendance_id)
    .bind(auth.employee_id)
    .bind(all)
    .bind(manager_id)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, attendance_id, "Attendance decision failed");
        AppError::Internal(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::bad_request(
            "Attendance record not found or already processed",
        ));
    }

    info!(attendance_id, decision = %decision, approver = auth.employee_id, "Attendance decided");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Attendance {}", decision),
        "status": decision
    })))
}

#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/approve",
    params(("attendance_id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Approved", body = Object, example = json!({
            "message": "Attendance approved", "status": "approved"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn approve_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide_attendance(&auth, pool.get_ref(), path.into_inner(), AttendanceStatus::Approved).await
}

#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/reject",
    params(("attendance_id" = u64, Path, description = "Attendance record ID")),
    responses(
        (status = 200, description = "Rejected", body = Object, example = json!({
            "message": "Attendance rejected", "status": "rejected"
        })),
        (status = 400, description = "Not found or already processed"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn reject_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    decide_attendance(&auth, pool.get_ref(), path.into_inner(), AttendanceStatus::Rejected).await
}

/* =========================
Mark present (Manager)
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/mark-present/{employee_id}",
    params(("employee_id" = u64, Path, description = "Team member ID")),
    responses(
        (status = 200, description = "Approved attendance recorded", body = Object, example = json!({
            "message": "Attendance marked", "id": 42
        })),
        (status = 400, description = "Attendance already recorded for today"),
        (status = 403, description = "Not a member of your team")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_present(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_manager()?;
    let employee_id = path.into_inner();

    if !manages(pool.get_ref(), auth.employee_id, employee_id).await? {
        return Err(AppError::forbidden("Not a member of your team"));
    }

    let now = Utc::now();
    let inserted = sqlx::query(
        r#"
        INSERT INTO attendance
            (employee_id, work_date, signin_time, status, approved_by, approved_at)
        VALUES (?, ?, ?, 'approved', ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(now.date_naive())
    .bind(now)
    .bind(auth.employee_id)
    .bind(now)
    .execute(pool.get_ref())
    .await;

    match inserted {
        Ok(r) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Attendance marked",
            "id": r.last_insert_id()
        }))),
        Err(e) if is_duplicate_key(&e) => Err(AppError::bad_request(
            "Attendance already recorded for today",
        )),
        Err(e) => {
            error!(error = %e, employee_id, "Mark present failed");
            Err(AppError::Internal(e.to_string()))
        }
    }
}

/* =========================
CSV export (Admin/HR)
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance/export",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance as CSV", content_type = "text/csv", body = String),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn export_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(emp_id) = query.employee_id {
        where_sql.push_str(" AND a.employee_id = ?");
        args.push(FilterValue::U64(emp_id));
    }
    if let Some(status) = query.status.as_deref() {
        let status = parse_status(status)?;
        where_sql.push_str(" AND a.status = ?");
        args.push(FilterValue::Str(status.to_string()));
    }
    if let Some(from) = query.from {
        where_sql.push_str(" AND a.work_date >= ?");
        args.push(FilterValue::Date(from));
    }
    if let Some(to) = query.to {
        where_sql.push_str(" AND a.work_date <= ?");
        args.push(FilterValue::Date(to));
    }

    let sql = format!("{}{} ORDER BY a.signin_time DESC", ATTENDANCE_SELECT, where_sql);
    let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&sql);
    for arg in &args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(*v),
            FilterValue::Str(s) => data_q.bind(s.as_str()),
            FilterValue::Date(d) => data_q.bind(*d),
        };
    }
    let records = data_q.fetch_all(pool.get_ref()).await?;

    let rows: Vec<Vec<String>> = records.iter().map(export_row).collect();
    let body = to_csv(
        &["employee_id", "employee", "date", "sign_in", "sign_out", "hours", "status"],
        &rows,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/csv; charset=utf-8"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"attendance.csv\"",
        ))
        .body(body))
}

fn export_row(r: &AttendanceRecord) -> Vec<String> {
    vec![
        r.employee_id.to_string(),
        r.employee_name.clone().unwrap_or_default(),
        r.work_date.to_string(),
        r.signin_time.to_rfc3339(),
        r.signout_time.map(|t| t.to_rfc3339()).unwrap_or_default(),
        r.hours_worked()
            .map(|h| format!("{:.2}", h))
            .unwrap_or_else(|| "N/A".to_string()),
        r.status.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use chrono::TimeZone;

    fn selfie() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG selfie"))
    }

    fn here() -> GeoPoint {
        GeoPoint {
            latitude: 28.61,
            longitude: 77.2,
        }
    }

    #[test]
    fn sign_in_requires_a_selfie() {
        for missing in [None, Some(String::new()), Some("   ".to_string())] {
            let req = SignInRequest {
                selfie: missing,
                location: Some(here()),
            };
            let err = validate_sign_in(&req, 1024).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Please capture your selfie first for face verification"
            );
        }
    }

    #[test]
    fn sign_in_requires_a_location() {
        let req = SignInRequest {
            selfie: Some(selfie()),
            location: None,
        };
        let err = validate_sign_in(&req, 1024).unwrap_err();
        assert_eq!(err.to_string(), "Please allow location access to sign in");
    }

    #[test]
    fn sign_in_rejects_out_of_range_location() {
        let req = SignInRequest {
            selfie: Some(selfie()),
            location: Some(GeoPoint {
                latitude: 120.0,
                longitude: 0.0,
            }),
        };
        assert!(matches!(
            validate_sign_in(&req, 1024),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn sign_in_accepts_selfie_and_location() {
        let req = SignInRequest {
            selfie: Some(selfie()),
            location: Some(here()),
        };
        let (image, location) = validate_sign_in(&req, 1024).unwrap();
        assert_eq!(image.extension(), "png");
        assert_eq!(location, here());
    }

    fn record(signout: bool) -> AttendanceRecord {
        let signin = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();
        AttendanceRecord {
            id: 1,
            employee_id: 7,
            employee_name: Some("=cmd".into()),
            work_date: signin.date_naive(),
            signin_time: signin,
            signin_latitude: None,
            signin_longitude: None,
            signin_selfie_url: None,
            signout_time: signout.then(|| Utc.with_ymd_and_hms(2026, 1, 5, 17, 15, 0).unwrap()),
            signout_latitude: None,
            signout_longitude: None,
            status: "approved".into(),
            approved_by: None,
            approved_at: None,
        }
    }

    #[test]
    fn today_status_follows_signout() {
        assert_eq!(today_status(None), TodayStatus::NotSignedIn);
        assert_eq!(today_status(Some(&record(false))), TodayStatus::SignedIn);
        assert_eq!(today_status(Some(&record(true))), TodayStatus::SignedOut);
    }

    #[test]
    fn export_row_formats_hours() {
        assert_eq!(export_row(&record(true))[5], "8.25");
        assert_eq!(export_row(&record(false))[5], "N/A");
    }
}
