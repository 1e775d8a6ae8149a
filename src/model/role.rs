use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Hr,
    Manager,
    Employee,
    TempVendor,
}

/// Which dashboard a principal lands on after sign in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn dashboard(self) -> Dashboard {
        match self {
            Role::Admin | Role::Hr => Dashboard::Admin,
            Role::Manager => Dashboard::Manager,
            Role::Employee | Role::TempVendor => Dashboard::Employee,
        }
    }

    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

/// Role text as stored on the employee record. Unknown roles get no dashboard.
pub fn resolve_dashboard(role: &str) -> Option<Dashboard> {
    Role::from_str(role.trim()).ok().map(Role::dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_known_role_has_a_dashboard() {
        for role in Role::iter() {
            assert!(resolve_dashboard(role.as_ref()).is_some(), "{role}");
        }
    }

    #[test]
    fn role_text_round_trips_through_snake_case() {
        assert_eq!(Role::TempVendor.as_ref(), "temp_vendor");
        assert_eq!(Role::from_str("temp_vendor").unwrap(), Role::TempVendor);
        assert_eq!(Role::Hr.to_string(), "hr");
    }

    #[test]
    fn dashboards_follow_role_groups() {
        assert_eq!(resolve_dashboard("admin"), Some(Dashboard::Admin));
        assert_eq!(resolve_dashboard("hr"), Some(Dashboard::Admin));
        assert_eq!(resolve_dashboard("manager"), Some(Dashboard::Manager));
        assert_eq!(resolve_dashboard("employee"), Some(Dashboard::Employee));
        assert_eq!(resolve_dashboard("temp_vendor"), Some(Dashboard::Employee));
    }

    #[test]
    fn unknown_roles_render_nothing() {
        for role in ["", "superuser", "Admin ", "ADMIN", "contractor"] {
            assert_eq!(resolve_dashboard(role), None, "{role:?}");
        }
    }
}
