use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use podtail_kube::{KubeLogSource, KubeSourceOptions};
use podtail_tui::{DashboardConfig, parse_source_arg};
use podtail_types::SourceSpec;
use podtail_util::{default_config_path, default_log_path, expand_tilde};
use tracing::{info, warn};

/// Tail logs from several pod containers in one terminal dashboard.
#[derive(Debug, Parser)]
#[command(name = "podtail", version, about)]
struct Cli {
    /// Config file (YAML, or JSON with a .json extension).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Source to tail; repeat for more. Replaces the sources from the config file.
    #[arg(long = "source", value_name = "[DISPLAY=]NAMESPACE/POD/CONTAINER", value_parser = parse_source_arg)]
    sources: Vec<SourceSpec>,

    /// Lines kept per source.
    #[arg(long)]
    capacity: Option<usize>,

    /// Delay in milliseconds between lines from the same source; 0 disables pacing.
    #[arg(long)]
    pace_ms: Option<u64>,

    /// Kubeconfig file to use instead of the default lookup.
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<String>,

    /// Kubeconfig context.
    #[arg(long)]
    context: Option<String>,

    /// Historical lines to fetch before following.
    #[arg(long)]
    tail_lines: Option<i64>,

    /// Show the time each line was received.
    #[arg(long)]
    timestamps: bool,

    /// Mask secret-looking values in log lines.
    #[arg(long)]
    redact: bool,

    /// Where to write diagnostics; the dashboard owns the terminal.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    init_tracing(&log_path);

    let config = build_config(&cli)?;
    info!(sources = config.sources.len(), log_file = %log_path.display(), "starting podtail");

    let source = KubeLogSource::new(KubeSourceOptions {
        kubeconfig: config.kubeconfig.as_deref().map(expand_tilde),
        context: config.context.clone(),
        tail_lines: config.tail_lines,
    });
    podtail_tui::run(config, Arc::new(source)).await
}

/// Load the config file, apply command-line overrides and validate.
fn build_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let path = default_config_path();
            if path.exists() { load_config(&path)? } else { DashboardConfig::default() }
        }
    };

    if !cli.sources.is_empty() {
        config.sources = cli.sources.clone();
    }
    if let Some(capacity) = cli.capacity {
        config.capacity = capacity;
    }
    if let Some(pace_ms) = cli.pace_ms {
        config.pace_ms = pace_ms;
    }
    if let Some(kubeconfig) = &cli.kubeconfig {
        config.kubeconfig = Some(kubeconfig.clone());
    }
    if let Some(context) = &cli.context {
        config.context = Some(context.clone());
    }
    if let Some(tail_lines) = cli.tail_lines {
        config.tail_lines = Some(tail_lines);
    }
    config.show_timestamps |= cli.timestamps;
    config.redact |= cli.redact;

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<DashboardConfig> {
    let path = expand_tilde(&path.to_string_lossy());
    DashboardConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn init_tracing(path: &Path) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => file,
        Err(error) => {
            eprintln!("podtail: logging disabled, cannot open {}: {error}", path.display());
            return;
        }
    };
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_err()
    {
        warn!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("podtail").chain(args.iter().copied())).unwrap()
    }

    fn config_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn repeated_sources_keep_their_order() {
        let cli = parse(&[
            "--source",
            "blocc=blocc/blocc-0/manager",
            "--source",
            "flow-system/paas-0/paas-controller",
            "--capacity",
            "3",
        ]);
        assert_eq!(cli.sources.len(), 2);
        assert_eq!(cli.sources[0].display_key(), "blocc");
        assert_eq!(cli.sources[1].display_key(), "paas-0");
        assert_eq!(cli.capacity, Some(3));
    }

    #[test]
    fn malformed_source_is_a_usage_error() {
        let result = Cli::try_parse_from(["podtail", "--source", "just-a-pod"]);
        assert!(result.is_err());
    }

    #[test]
    fn flags_override_the_config_file() {
        let file = config_file(
            "capacity: 5\npace_ms: 1000\nsources:\n  - workload: web-0\n    namespace: default\n    container: web\n",
        );
        let path = file.path().to_str().unwrap();

        let cli = parse(&["--config", path, "--pace-ms", "0", "--capacity", "2", "--redact"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.capacity, 2);
        assert_eq!(config.pace_ms, 0);
        assert!(config.redact);
        assert_eq!(config.sources[0].workload, "web-0");

        let cli = parse(&["--config", path, "--source", "kube-system/dns-0/coredns"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].container, "coredns");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/podtail.yaml"]);
        let error = build_config(&cli).unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/podtail.yaml"));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let file = config_file("sources:\n  - workload: web-0\n    namespace: default\n    container: web\n");
        let cli = parse(&["--config", file.path().to_str().unwrap(), "--capacity", "0"]);
        assert!(build_config(&cli).is_err());
    }
}
