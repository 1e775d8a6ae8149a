use crate::{
    auth::auth::AuthUser,
    error::{AppError, is_duplicate_key},
    model::holiday::Holiday,
    utils::validation::not_blank,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct CreateHoliday {
    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Republic Day")]
    #[validate(
        custom(function = "not_blank", message = "Holiday name is required"),
        length(max = 255, message = "Holiday name is too long")
    )]
    pub name: String,
    #[schema(example = "National holiday")]
    #[validate(length(max = 1024, message = "Description is too long"))]
    pub description: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HolidayQuery {
    /// Calendar year, e.g. 2026
    #[schema(example = 2026)]
    pub year: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays in date order", body = Vec<Holiday>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> Result<HttpResponse, AppError> {
    let holidays = match query.year {
        Some(year) => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, date, name, description FROM holidays WHERE YEAR(date) = ? ORDER BY date",
            )
            .bind(year)
            .fetch_all(pool.get_ref())
            .await?
        }
        None => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, date, name, description FROM holidays ORDER BY date",
            )
            .fetch_all(pool.get_ref())
            .await?
        }
    };

    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Object, example = json!({
            "message": "Holiday created", "id": 4
        })),
        (status = 400, description = "Name is required"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "A holiday already exists on this date", body = Object, example = json!({
            "message": "A holiday already exists on 2026-01-26"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    payload.validate()?;

    let name = payload.name.trim();
    let description = payload
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let result = sqlx::query("INSERT INTO holidays (date, name, description) VALUES (?, ?, ?)")
        .bind(payload.date)
        .bind(name)
        .bind(description)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(r) => {
            info!(date = %payload.date, name, "Holiday created");
            Ok(HttpResponse::Created().json(json!({
                "message": "Holiday created",
                "id": r.last_insert_id()
            })))
        }
        Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(format!(
            "A holiday already exists on {}",
            payload.date
        ))),
        Err(e) => {
            error!(error = %e, date = %payload.date, "Failed to create holiday");
            Err(AppError::Internal(e.to_string()))
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/holidays/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday deleted", body = Object, example = json!({
            "message": "Holiday deleted"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let holiday_id = path.into_inner();

    // credits already granted for this date stay in place
    let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, holiday_id, "Failed to delete holiday");
            AppError::Internal(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Holiday not found"));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Holiday deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holiday(name: &str) -> CreateHoliday {
        CreateHoliday {
            date: NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            name: name.into(),
            description: None,
        }
    }

    #[test]
    fn holiday_needs_a_name() {
        assert!(holiday("Republic Day").validate().is_ok());

        let err = AppError::from(holiday("   ").validate().unwrap_err());
        assert_eq!(err.to_string(), "Holiday name is required");
    }
}
