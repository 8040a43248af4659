//! The log provider seam.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::SourceKey;

/// Lazy, unbounded sequence of log lines from one subscription.
///
/// Dropping the stream releases the underlying subscription.
pub type LineStream = BoxStream<'static, Result<String, SourceError>>;

/// Errors surfaced by a [`LogSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// Client configuration or credentials could not be loaded.
    #[error("log source configuration error: {0}")]
    Config(String),
    /// The source could not be opened (not found, forbidden, not running).
    #[error("log source {key} unavailable: {reason}")]
    Unavailable { key: String, reason: String },
    /// A read failed mid-stream.
    #[error("log stream read error: {0}")]
    Read(#[from] std::io::Error),
}

impl SourceError {
    pub fn unavailable(key: &SourceKey, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Provider of follow-mode log streams.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Open a follow-mode subscription for `key`.
    ///
    /// Implementations do not retry; any error means the source is unavailable.
    async fn open_follow_stream(&self, key: &SourceKey) -> Result<LineStream, SourceError>;
}
