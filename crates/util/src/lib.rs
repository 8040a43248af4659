//! Utility helpers shared by the podtail crates.

pub mod path_processing;
pub mod text_processing;

pub use path_processing::{APP_DIR_NAME, default_config_path, default_log_path, expand_tilde};
pub use text_processing::{redact_sensitive, redact_sensitive_with, sanitize_log_line};
