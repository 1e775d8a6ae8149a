pub mod csv_export;
pub mod data_url;
pub mod db_utils;
pub mod email_cache;
pub mod email_filter;
pub mod pagination;
pub mod validation;
