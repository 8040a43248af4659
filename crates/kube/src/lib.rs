//! Kubernetes pod log source.
//!
//! [`KubeLogSource`] implements [`LogSource`] on top of the pod log endpoint in
//! follow mode. One client is shared by every subscription and is built lazily
//! on the first open, so a broken kubeconfig or an unreachable cluster is
//! reported by each affected tail worker instead of aborting startup.
//!
//! # Example
//!
//! ```ignore
//! use podtail_kube::{KubeLogSource, KubeSourceOptions};
//! use podtail_types::{LogSource, SourceKey};
//!
//! let source = KubeLogSource::new(KubeSourceOptions::default());
//! let key = SourceKey::new("paas-controller-7b6988d9f6-lqh4s", "flow-system", "paas-controller");
//! let lines = source.open_follow_stream(&key).await?;
//! ```

mod lines;

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::LogParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use podtail_types::{LineStream, LogSource, SourceError, SourceKey};
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub use lines::{MAX_LINE_BYTES, split_lines};

/// Connection settings for [`KubeLogSource`].
#[derive(Debug, Clone, Default)]
pub struct KubeSourceOptions {
    /// Explicit kubeconfig file. When unset the standard inference applies
    /// (`KUBECONFIG`, `~/.kube/config`, then in-cluster).
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context to use instead of the current one.
    pub context: Option<String>,
    /// Number of historical lines to request before following.
    pub tail_lines: Option<i64>,
}

/// Follow-mode pod log streams backed by the Kubernetes API.
pub struct KubeLogSource {
    options: KubeSourceOptions,
    client: OnceCell<Client>,
}

impl KubeLogSource {
    pub fn new(options: KubeSourceOptions) -> Self {
        Self {
            options,
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client, SourceError> {
        self.client.get_or_try_init(|| build_client(&self.options)).await
    }
}

#[async_trait]
impl LogSource for KubeLogSource {
    async fn open_follow_stream(&self, key: &SourceKey) -> Result<LineStream, SourceError> {
        let client = self.client().await?.clone();
        let pods: Api<Pod> = Api::namespaced(client, &key.namespace);
        let params = log_params(key, self.options.tail_lines);

        debug!(source = %key, "opening follow-mode log stream");
        let reader = pods
            .log_stream(&key.workload, &params)
            .await
            .map_err(|error| SourceError::unavailable(key, error.to_string()))?;
        info!(source = %key, "log stream opened");

        Ok(split_lines(reader, MAX_LINE_BYTES))
    }
}

fn log_params(key: &SourceKey, tail_lines: Option<i64>) -> LogParams {
    LogParams {
        follow: true,
        container: Some(key.container.clone()),
        tail_lines,
        ..LogParams::default()
    }
}

async fn build_client(options: &KubeSourceOptions) -> Result<Client, SourceError> {
    let config = match &options.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .map_err(|error| SourceError::Config(format!("failed to read kubeconfig {}: {error}", path.display())))?;
            let config_options = KubeConfigOptions {
                context: options.context.clone(),
                ..KubeConfigOptions::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &config_options)
                .await
                .map_err(|error| SourceError::Config(error.to_string()))?
        }
        None if options.context.is_some() => {
            let config_options = KubeConfigOptions {
                context: options.context.clone(),
                ..KubeConfigOptions::default()
            };
            Config::from_kubeconfig(&config_options)
                .await
                .map_err(|error| SourceError::Config(error.to_string()))?
        }
        None => Config::infer().await.map_err(|error| SourceError::Config(error.to_string()))?,
    };
    debug!(cluster_url = %config.cluster_url, "building kubernetes client");
    Client::try_from(config).map_err(|error| SourceError::Config(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_params_follow_the_configured_container() {
        let key = SourceKey::new("blocc-controller-manager-c584d6995-jps7v", "blocc", "manager");
        let params = log_params(&key, Some(5));
        assert!(params.follow);
        assert_eq!(params.container.as_deref(), Some("manager"));
        assert_eq!(params.tail_lines, Some(5));
        assert!(!params.previous);
    }

    #[tokio::test]
    async fn missing_kubeconfig_is_reported_per_subscription() {
        let source = KubeLogSource::new(KubeSourceOptions {
            kubeconfig: Some(PathBuf::from("/nonexistent/podtail/kubeconfig")),
            ..KubeSourceOptions::default()
        });
        let key = SourceKey::new("pod", "ns", "app");
        let error = source.open_follow_stream(&key).await.err().expect("open should fail");
        assert!(matches!(error, SourceError::Config(_)), "unexpected error: {error}");
    }
}
