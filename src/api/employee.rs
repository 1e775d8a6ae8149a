use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::{AppError, is_duplicate_key},
    model::{
        employee::{EMPLOYEE_COLUMNS, Employee},
        leave_balance::{LeaveBalance, fetch_balance},
        role::Role,
    },
    utils::{
        db_utils::{build_update_sql, execute_update},
        email_cache::{is_email_available, mark_taken},
        email_filter,
        pagination::Pagination,
        validation::not_blank,
    },
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Columns an update may touch. E-mail is the login identity and stays fixed.
const UPDATABLE_COLUMNS: &[&str] = &["full_name", "role", "department", "manager_id"];

#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateEmployee {
    #[schema(example = "Asha Verma")]
    #[validate(custom(function = "not_blank", message = "Full name is required"))]
    pub full_name: String,
    #[schema(example = "asha.verma@vtc.example", format = "email")]
    #[validate(email(message = "A valid e-mail is required"))]
    pub email: String,
    #[schema(example = "S3cure#pass")]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[schema(example = "employee")]
    pub role: Role,
    #[schema(example = "Operations")]
    #[validate(length(max = 255, message = "Department is too long"))]
    pub department: Option<String>,
    #[schema(example = 3)]
    pub manager_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Role text, e.g. `manager`
    pub role: Option<String>,
    pub department: Option<String>,
    /// Matches name or e-mail
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 20)]
    pub per_page: u64,
    #[schema(example = 10)]
    pub total: i64,
}

/// Checks enrollment input before anything touches the database.
pub fn validate_new_employee(payload: &CreateEmployee) -> Result<(), AppError> {
    payload.validate()?;
    Ok(())
}

/// Role and manager checks for a partial update body.
fn validate_update(body: &Value) -> Result<(), AppError> {
    if let Some(role) = body.get("role") {
        let valid = role.as_str().map(|r| Role::from_str(r).is_ok()).unwrap_or(false);
        if !valid {
            return Err(AppError::bad_request(
                "Invalid role. Allowed: admin, hr, manager, employee, temp_vendor",
            ));
        }
    }
    if let Some(name) = body.get("full_name") {
        if name.as_str().map(|n| n.trim().is_empty()).unwrap_or(true) {
            return Err(AppError::bad_request("Full name is required"));
        }
    }
    Ok(())
}

/// Admin accounts, and promotions to admin, are changed by admins only.
fn touches_admin(current_role: &str, body: &Value) -> bool {
    let admin = Role::Admin.as_ref();
    current_role == admin || body.get("role").and_then(Value::as_str) == Some(admin)
}

async fn employee_exists(pool: &MySqlPool, employee_id: u64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Enroll Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee enrolled with a login and default leave balance", body = Object, example = json!({
            "message": "Employee enrolled successfully", "id": 7
        })),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "E-mail already registered", body = Object, example = json!({
            "message": "E-mail already registered"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    validate_new_employee(&payload)?;

    // only admins create admins
    if payload.role == Role::Admin {
        auth.require_admin()?;
    }

    let email = email_filter::normalize(&payload.email);

    if !is_email_available(&email, pool.get_ref()).await? {
        return Err(AppError::Conflict("E-mail already registered".into()));
    }

    if let Some(manager_id) = payload.manager_id {
        if !employee_exists(pool.get_ref(), manager_id).await? {
            return Err(AppError::bad_request("Manager not found"));
        }
    }

    let hashed = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        AppError::Internal(e.to_string())
    })?;

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO employees (full_name, email, role, department, manager_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.full_name.trim())
    .bind(&email)
    .bind(payload.role.as_ref())
    .bind(payload.department.as_deref().map(str::trim))
    .bind(payload.manager_id)
    .execute(&mut *tx)
    .await;

    let employee_id = match inserted {
        Ok(r) => r.last_insert_id(),
        Err(e) if is_duplicate_key(&e) => {
            return Err(AppError::Conflict("E-mail already registered".into()));
        }
        Err(e) => {
            error!(error = %e, "Failed to enroll employee");
            return Err(AppError::Internal(e.to_string()));
        }
    };

    sqlx::query("INSERT INTO users (email, password, employee_id) VALUES (?, ?, ?)")
        .bind(&email)
        .bind(&hashed)
        .bind(employee_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::Conflict("E-mail already registered".into())
            } else {
                error!(error = %e, employee_id, "Failed to create login");
                AppError::Internal(e.to_string())
            }
        })?;

    let balance = LeaveBalance::default_allocation(employee_id);
    sqlx::query(
        r#"
        INSERT INTO leave_balances
            (employee_id, casual_leaves, sick_leaves, earned_leaves, compensatory_leaves)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(balance.casual_leaves)
    .bind(balance.sick_leaves)
    .bind(balance.earned_leaves)
    .bind(balance.compensatory_leaves)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    email_filter::insert(&email);
    mark_taken(&email).await;

    info!(employee_id, role = %payload.role, by = auth.employee_id, "Employee enrolled");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee enrolled successfully",
        "id": employee_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let Pagination {
        page,
        per_page,
        offset,
    } = Pagination::new(query.page, query.per_page, 20);

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(role) = query.role.as_deref() {
        conditions.push("role = ?");
        bindings.push(role.trim().to_string());
    }

    if let Some(department) = query.department.as_deref() {
        conditions.push("department = ?");
        bindings.push(department.trim().to_string());
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        conditions.push("(full_name LIKE ? OR email LIKE ?)");
        let like = format!("%{}%", search.trim());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        AppError::Internal(e.to_string())
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {} FROM employees {} ORDER BY id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(per_page).bind(offset);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        AppError::Internal(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data: employees,
        page,
        per_page,
        total,
    }))
}

/// Direct reports of the signed-in manager.
#[utoipa::path(
    get,
    path = "/api/employee/team",
    responses(
        (status = 200, description = "Team members", body = Vec<Employee>),
        (status = 403, description = "Managers only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn my_team(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_manager()?;

    let sql = format!(
        "SELECT {} FROM employees WHERE manager_id = ? ORDER BY full_name",
        EMPLOYEE_COLUMNS
    );
    let team = sqlx::query_as::<_, Employee>(&sql)
        .bind(auth.employee_id)
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(team))
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(pool.get_ref(), employee_id).await? {
        return Err(AppError::forbidden("Not allowed to view this employee"));
    }

    let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee");
            AppError::Internal(e.to_string())
        })?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body(content = Object, description = "Any of full_name, role, department, manager_id", example = json!({
        "role": "manager",
        "department": "Operations"
    })),
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Field cannot be updated or invalid value"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    validate_update(&body)?;

    let current_role: String = sqlx::query_scalar("SELECT role FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;

    if touches_admin(&current_role, &body) {
        auth.require_admin()?;
    }

    if let Some(manager_id) = body.get("manager_id").and_then(Value::as_u64) {
        if manager_id == employee_id {
            return Err(AppError::bad_request("An employee cannot manage themselves"));
        }
        if !employee_exists(pool.get_ref(), manager_id).await? {
            return Err(AppError::bad_request("Manager not found"));
        }
    }

    let update = build_update_sql("employees", &body, UPDATABLE_COLUMNS, "id", employee_id)?;

    execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to update employee");
        AppError::Internal(e.to_string())
    })?;

    info!(employee_id, by = auth.employee_id, "Employee updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}/leave-balance",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn employee_leave_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    if !auth.can_view_employee(pool.get_ref(), employee_id).await? {
        return Err(AppError::forbidden("Not allowed to view this employee"));
    }
    if !employee_exists(pool.get_ref(), employee_id).await? {
        return Err(AppError::not_found("Employee not found"));
    }

    let balance = fetch_balance(pool.get_ref(), employee_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_employee() -> CreateEmployee {
        CreateEmployee {
            full_name: "Asha Verma".into(),
            email: "Asha.Verma@vtc.example".into(),
            password: "S3cure#pass".into(),
            role: Role::Employee,
            department: Some("Operations".into()),
            manager_id: Some(3),
        }
    }

    #[test]
    fn accepts_a_complete_enrollment() {
        assert!(validate_new_employee(&new_employee()).is_ok());
    }

    #[test]
    fn rejects_bad_enrollment_input() {
        let mut e = new_employee();
        e.full_name = "  ".into();
        assert!(validate_new_employee(&e).is_err());

        let mut e = new_employee();
        e.email = "not-an-email".into();
        assert_eq!(
            validate_new_employee(&e).unwrap_err().to_string(),
            "A valid e-mail is required"
        );

        let mut e = new_employee();
        e.password = "short".into();
        let err = validate_new_employee(&e).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.to_string(), "Password must be at least 8 characters");
    }

    #[test]
    fn enrollment_role_must_be_known() {
        let body = json!({
            "full_name": "X", "email": "x@vtc.example", "password": "longenough",
            "role": "auditor"
        });
        assert!(serde_json::from_value::<CreateEmployee>(body).is_err());
    }

    #[test]
    fn admin_accounts_need_an_admin_to_change() {
        assert!(touches_admin("admin", &json!({ "role": "employee" })));
        assert!(touches_admin("admin", &json!({ "full_name": "Renamed" })));
        assert!(touches_admin("employee", &json!({ "role": "admin" })));
        assert!(!touches_admin("employee", &json!({ "role": "manager" })));
        assert!(!touches_admin("hr", &json!({ "department": "People" })));
    }

    #[test]
    fn update_validates_role_and_name() {
        assert!(validate_update(&json!({ "role": "temp_vendor" })).is_ok());
        assert!(validate_update(&json!({ "role": "auditor" })).is_err());
        assert!(validate_update(&json!({ "role": 3 })).is_err());
        assert!(validate_update(&json!({ "full_name": "" })).is_err());
        assert!(validate_update(&json!({ "department": null })).is_ok());
    }
}
