use std::path::PathBuf;

use dirs_next::{config_dir, data_local_dir, home_dir};

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "podtail";

const CONFIG_FILE_NAME: &str = "podtail.yaml";
const LOG_FILE_NAME: &str = "podtail.log";

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// `~/.config/podtail/podtail.yaml` on most platforms.
pub fn default_config_path() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Diagnostics log file. The dashboard owns stdout, so tracing output goes here.
pub fn default_log_path() -> PathBuf {
    data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(expand_tilde("/etc/kube/config"), PathBuf::from("/etc/kube/config"));
        assert_eq!(expand_tilde("  relative/path "), PathBuf::from("relative/path"));
    }

    #[test]
    fn expand_tilde_resolves_home_prefix() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/.kube/config"), home.join(".kube/config"));
            assert_eq!(expand_tilde("~"), home);
        }
    }

    #[test]
    fn default_paths_live_under_app_dir() {
        assert!(default_config_path().ends_with("podtail/podtail.yaml"));
        assert!(default_log_path().ends_with("podtail/podtail.log"));
    }
}
