use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::setting::{AppSetting, COMPANY_NAME_KEY, DEFAULT_COMPANY_NAME, is_valid_key},
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpdateSetting {
    #[schema(example = "VTC Logistics")]
    pub value: String,
}

/// Company name shown on printed documents.
pub async fn company_name(pool: &MySqlPool) -> Result<String, sqlx::Error> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM app_settings WHERE `key` = ?")
        .bind(COMPANY_NAME_KEY)
        .fetch_optional(pool)
        .await?;

    Ok(value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "All application settings", body = Vec<AppSetting>),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let settings = sqlx::query_as::<_, AppSetting>(
        "SELECT `key`, value, updated_at FROM app_settings ORDER BY `key`",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(("key" = String, Path, description = "Setting key, e.g. company_name")),
    request_body = UpdateSetting,
    responses(
        (status = 200, description = "Setting stored", body = Object, example = json!({
            "message": "Setting updated", "key": "company_name"
        })),
        (status = 400, description = "Invalid key or empty value"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_setting(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateSetting>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let key = path.into_inner();
    if !is_valid_key(&key) {
        return Err(AppError::bad_request("Invalid setting key"));
    }
    let value = payload.value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request("Setting value is required"));
    }

    sqlx::query(
        r#"
        INSERT INTO app_settings (`key`, value) VALUES (?, ?)
        ON DUPLICATE KEY UPDATE value = VALUES(value), updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&key)
    .bind(value)
    .execute(pool.get_ref())
    .await?;

    info!(key = %key, by = auth.employee_id, "Setting updated");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Setting updated",
        "key": key
    })))
}
