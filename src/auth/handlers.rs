use crate::{
    auth::{
        auth::AuthUser,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::AppError,
    model::role::{Dashboard, Role, resolve_dashboard},
    models::{LoginReqDto, TokenType, UserSql},
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "employee")]
    pub role: Role,
    pub dashboard: Dashboard,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(example = 11)]
    pub user_id: u64,
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "asha.verma@vtc.example")]
    pub email: String,
    pub role: Role,
    pub dashboard: Dashboard,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    error!(error = %e, "Failed to sign token");
    AppError::Internal(e.to_string())
}

async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    jti: &str,
    exp: usize,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(exp as i64)
    .execute(pool)
    .await
    .map(|_| ())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Email and password required"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "No dashboard for this role")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::bad_request("Email and password required"));
    }

    debug!("Fetching user from database");

    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT u.id, u.email, u.password, u.employee_id, e.role
        FROM users u
        JOIN employees e ON e.id = u.employee_id
        WHERE u.email = ?
        "#,
    )
    .bind(&email)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Database error while fetching user");
        AppError::Internal(e.to_string())
    })?;

    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    // Role gate: a role outside the known set gets no dashboard and no session
    let Some(dashboard) = resolve_dashboard(&db_user.role) else {
        info!(role = %db_user.role, "Login refused: no dashboard for role");
        return Err(AppError::forbidden("No dashboard is available for this role"));
    };
    let role: Role = db_user
        .role
        .trim()
        .parse()
        .map_err(|_| AppError::forbidden("No dashboard is available for this role"))?;

    let access_token = generate_access_token(
        db_user.id,
        &db_user.email,
        role.as_ref(),
        db_user.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        db_user.id,
        &db_user.email,
        role.as_ref(),
        db_user.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(pool.get_ref(), db_user.id, &refresh_claims.jti, refresh_claims.exp)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            AppError::Internal(e.to_string())
        })?;

    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        // not fatal for the login
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(role = %role, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        role,
        dashboard,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = Object, example = json!({
            "access_token": "eyJ...",
            "refresh_token": "eyJ..."
        })),
        (status = 401, description = "Refresh token missing, invalid or revoked")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let token = bearer_token(&req).ok_or_else(|| AppError::Unauthorized("No token".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }

    let mut tx = pool.begin().await?;

    // Revoke-and-check in one statement so a token can be rotated only once
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = 1
        WHERE jti = ? AND revoked = 0 AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(&mut *tx)
    .await?;

    if revoked.rows_affected() == 0 {
        return Err(AppError::Unauthorized("Refresh token revoked".into()));
    }

    // The role may have changed since the token was issued
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM employees WHERE id = ?")
        .bind(claims.employee_id)
        .fetch_optional(&mut *tx)
        .await?;
    let role = role
        .as_deref()
        .and_then(|r| r.trim().parse::<Role>().ok())
        .ok_or_else(|| AppError::forbidden("No dashboard is available for this role"))?;

    let (new_refresh_token, new_claims) = generate_refresh_token(
        claims.user_id,
        &claims.sub,
        role.as_ref(),
        claims.employee_id,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(token_error)?;

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims.user_id)
    .bind(&new_claims.jti)
    .bind(new_claims.exp as i64)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let access_token = generate_access_token(
        claims.user_id,
        &claims.sub,
        role.as_ref(),
        claims.employee_id,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(token_error)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": new_refresh_token
    })))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (idempotent)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer_token(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can log out
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

/// Resolves the signed-in principal to its dashboard.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current principal", body = SessionResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn session(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        user_id: auth.user_id,
        employee_id: auth.employee_id,
        dashboard: auth.dashboard(),
        email: auth.email,
        role: auth.role,
    })
}
