use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const COMPANY_NAME_KEY: &str = "company_name";
pub const DEFAULT_COMPANY_NAME: &str = "VTC";

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AppSetting {
    #[schema(example = "company_name")]
    pub key: String,
    #[schema(example = "VTC")]
    pub value: String,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Keys are short identifiers: lowercase ascii, digits and underscores.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_keys() {
        assert!(is_valid_key(COMPANY_NAME_KEY));
        assert!(is_valid_key("max_daily_hours_2"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("Company Name"));
        assert!(!is_valid_key("key;drop"));
        assert!(!is_valid_key(&"k".repeat(65)));
    }
}
