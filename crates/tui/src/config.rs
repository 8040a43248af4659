//! Dashboard configuration.
//!
//! The configuration is a small YAML (or JSON) document listing the sources to
//! tail, in display order, plus a handful of tuning knobs:
//!
//! ```yaml
//! capacity: 5
//! pace_ms: 1000
//! sources:
//!   - display_key: blocc
//!     workload: blocc-controller-manager-c584d6995-jps7v
//!     namespace: blocc
//!     container: manager
//!   - workload: paas-controller-7b6988d9f6-lqh4s
//!     namespace: flow-system
//!     container: paas-controller
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use podtail_types::SourceSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::DEFAULT_CHANNEL_CAPACITY;

/// Lines kept per source.
pub const DEFAULT_CAPACITY: usize = 5;
/// Delay between two lines forwarded by the same worker.
pub const DEFAULT_PACE_MS: u64 = 1000;
/// Spinner animation interval.
pub const DEFAULT_TICK_MS: u64 = 100;

/// Error surfaced when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no sources configured")]
    NoSources,
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    #[error("source #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
    #[error("source {0} is configured more than once")]
    DuplicateSource(String),
    #[error("invalid source '{0}': expected [display=]namespace/pod/container")]
    InvalidSourceArg(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Prefix each line with the time it was received.
    #[serde(default)]
    pub show_timestamps: bool,
    /// Mask secret-looking values in displayed lines.
    #[serde(default)]
    pub redact: bool,
    #[serde(default)]
    pub kubeconfig: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    /// Historical lines requested when a stream opens; all history when unset.
    #[serde(default)]
    pub tail_lines: Option<i64>,
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            pace_ms: DEFAULT_PACE_MS,
            tick_ms: DEFAULT_TICK_MS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            show_timestamps: false,
            redact: false,
            kubeconfig: None,
            context: None,
            tail_lines: None,
            sources: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Read a config file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&data)?)
        } else {
            Self::from_yaml_str(&data)
        }
    }

    pub fn from_yaml_str(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Check the invariants the engine relies on: at least one source, a
    /// positive capacity and exactly one entry per source key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }

        let mut seen = HashSet::new();
        for (index, spec) in self.sources.iter().enumerate() {
            for (field, value) in [
                ("workload", &spec.workload),
                ("namespace", &spec.namespace),
                ("container", &spec.container),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::EmptyField { index, field });
                }
            }
            let key = spec.key();
            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateSource(key.to_string()));
            }
        }
        Ok(())
    }

    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// Parse a command-line source of the form `[display=]namespace/pod/container`.
pub fn parse_source_arg(arg: &str) -> Result<SourceSpec, ConfigError> {
    let invalid = || ConfigError::InvalidSourceArg(arg.to_string());
    let (display_key, path) = match arg.split_once('=') {
        Some((display, path)) => (Some(display.trim()), path),
        None => (None, arg),
    };

    let parts: Vec<&str> = path.split('/').map(str::trim).collect();
    let [namespace, workload, container] = parts.as_slice() else {
        return Err(invalid());
    };
    if [namespace, workload, container]
        .iter()
        .any(|part| part.is_empty() || part.contains('='))
    {
        return Err(invalid());
    }

    let spec = SourceSpec::new(*workload, *namespace, *container);
    Ok(match display_key {
        Some("") => return Err(invalid()),
        Some(display) => spec.with_display_key(display),
        None => spec,
    })
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_pace_ms() -> u64 {
    DEFAULT_PACE_MS
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_SOURCES: &str = r#"
capacity: 5
sources:
  - display_key: blocc
    workload: blocc-controller-manager-c584d6995-jps7v
    namespace: blocc
    container: manager
  - workload: paas-controller-7b6988d9f6-lqh4s
    namespace: flow-system
    container: paas-controller
"#;

    #[test]
    fn yaml_defaults_fill_unset_fields() {
        let config = DashboardConfig::from_yaml_str(TWO_SOURCES).unwrap();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.pace(), Duration::from_secs(1));
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].display_key(), "blocc");
        assert_eq!(config.sources[1].display_key(), "paas-controller-7b6988d9f6-lqh4s");
        config.validate().unwrap();
    }

    #[test]
    fn loads_json_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"capacity": 3, "sources": [{{"workload": "web-0", "namespace": "default", "container": "web"}}]}}"#
        )
        .unwrap();

        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.capacity, 3);
        assert_eq!(config.sources[0].workload, "web-0");
    }

    #[test]
    fn missing_file_reports_path() {
        let error = DashboardConfig::load(Path::new("/nonexistent/podtail.yaml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
        assert!(error.to_string().contains("/nonexistent/podtail.yaml"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = DashboardConfig::from_yaml_str("capacty: 5\n").unwrap_err();
        assert!(matches!(error, ConfigError::Yaml(_)));
    }

    #[test]
    fn rejects_unknown_fields_inside_a_source() {
        let yaml = "sources:\n  - display_kye: web\n    workload: web-0\n    namespace: default\n    container: web\n";
        let error = DashboardConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(error, ConfigError::Yaml(_)));
    }

    #[test]
    fn validate_rejects_duplicate_source_keys() {
        let mut config = DashboardConfig::from_yaml_str(TWO_SOURCES).unwrap();
        let duplicate = config.sources[0].clone().with_display_key("again");
        config.sources.push(duplicate);
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::DuplicateSource(_)));
    }

    #[test]
    fn validate_rejects_empty_configurations() {
        assert!(matches!(DashboardConfig::default().validate(), Err(ConfigError::NoSources)));

        let mut config = DashboardConfig::from_yaml_str(TWO_SOURCES).unwrap();
        config.capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroCapacity)));

        let mut config = DashboardConfig::from_yaml_str(TWO_SOURCES).unwrap();
        config.sources[1].container = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyField { index: 1, field: "container" })
        ));
    }

    #[test]
    fn parses_source_arguments() {
        let spec = parse_source_arg("blocc=blocc/blocc-controller-manager/manager").unwrap();
        assert_eq!(spec.display_key(), "blocc");
        assert_eq!(spec.namespace, "blocc");
        assert_eq!(spec.workload, "blocc-controller-manager");
        assert_eq!(spec.container, "manager");

        let plain = parse_source_arg("flow-system/paas-controller/paas-controller").unwrap();
        assert_eq!(plain.display_key, None);
    }

    #[test]
    fn rejects_malformed_source_arguments() {
        for arg in [
            "ns/pod",
            "ns/pod/container/extra",
            "ns//container",
            "=ns/pod/container",
            "a=b=ns/pod/container",
            "ns/pod=x/container",
            "",
        ] {
            assert!(
                matches!(parse_source_arg(arg), Err(ConfigError::InvalidSourceArg(_))),
                "expected {arg:?} to be rejected"
            );
        }
    }
}
