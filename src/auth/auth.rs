use crate::config::Config;
use crate::error::AppError;
use crate::model::role::{Dashboard, Role};
use crate::{auth::jwt::verify_token, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use sqlx::MySqlPool;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
    pub employee_id: u64,
}

/// Which records an approver may decide.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ApprovalScope {
    All,
    /// Only employees whose `manager_id` is this id
    Team(u64),
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Set by auth_middleware on the protected scope
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(AppError::Unauthorized("Missing token".into()))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".into()))),
        };

        ready(authenticate(token, &config.jwt_secret))
    }
}

/// Validates an access token and resolves its role.
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let claims = verify_token(token, secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized("Access token required".into()));
    }

    let role = Role::from_str(&claims.role)
        .map_err(|_| AppError::Unauthorized("Invalid role".into()))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin only"))
        }
    }

    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.role == Role::Manager {
            Ok(())
        } else {
            Err(AppError::forbidden("Managers only"))
        }
    }

    /// Admin and HR decide everything, managers their own team.
    pub fn approval_scope(&self) -> Result<ApprovalScope, AppError> {
        match self.role {
            Role::Admin | Role::Hr => Ok(ApprovalScope::All),
            Role::Manager => Ok(ApprovalScope::Team(self.employee_id)),
            _ => Err(AppError::forbidden("Approvers only")),
        }
    }

    pub fn dashboard(&self) -> Dashboard {
        self.role.dashboard()
    }

    /// Self, HR/Admin, or the employee's manager.
    pub async fn can_view_employee(
        &self,
        pool: &MySqlPool,
        employee_id: u64,
    ) -> Result<bool, sqlx::Error> {
        if self.employee_id == employee_id || self.role.is_hr_or_admin() {
            return Ok(true);
        }
        if self.role != Role::Manager {
            return Ok(false);
        }
        manages(pool, self.employee_id, employee_id).await
    }
}

pub async fn manages(
    pool: &MySqlPool,
    manager_id: u64,
    employee_id: u64,
) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ? AND manager_id = ?)",
    )
    .bind(employee_id)
    .bind(manager_id)
    .fetch_one(pool)
    .await?;

    Ok(found > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};

    const SECRET: &str = "auth-test-secret";

    #[test]
    fn access_token_authenticates() {
        let token = generate_access_token(2, "hr@vtc.example", "hr", 4, SECRET, 900).unwrap();
        let user = authenticate(&token, SECRET).unwrap();
        assert_eq!(user.role, Role::Hr);
        assert_eq!(user.employee_id, 4);
        assert_eq!(user.approval_scope().unwrap(), ApprovalScope::All);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let (token, _) = generate_refresh_token(2, "hr@vtc.example", "hr", 4, SECRET, 900).unwrap();
        assert!(matches!(
            authenticate(&token, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn unknown_role_is_unauthorized() {
        let token = generate_access_token(2, "x@vtc.example", "auditor", 4, SECRET, 900).unwrap();
        assert!(matches!(
            authenticate(&token, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn scopes_by_role() {
        let mut user = AuthUser {
            user_id: 1,
            email: "m@vtc.example".into(),
            role: Role::Manager,
            employee_id: 3,
        };
        assert_eq!(user.approval_scope().unwrap(), ApprovalScope::Team(3));

        user.role = Role::Employee;
        assert!(user.approval_scope().is_err());
        assert!(user.require_hr_or_admin().is_err());

        user.role = Role::TempVendor;
        assert_eq!(user.dashboard(), Dashboard::Employee);
    }
}
