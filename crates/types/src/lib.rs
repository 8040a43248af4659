//! Shared type definitions for podtail.
//!
//! These types cross crate boundaries: the dashboard engine keys its state by
//! [`SourceKey`], workers forward [`LogEvent`]s, and log providers implement
//! [`LogSource`].

mod source;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use source::{LineStream, LogSource, SourceError};

/// Identifies one tailed (workload, container) pair.
///
/// Exactly one tail worker runs per key at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    /// Workload (pod) name the log stream is opened against.
    pub workload: String,
    pub namespace: String,
    pub container: String,
}

impl SourceKey {
    pub fn new(workload: impl Into<String>, namespace: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            workload: workload.into(),
            namespace: namespace.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.workload, self.container)
    }
}

/// One configured source: what to tail and how to label it on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    /// Label shown next to the lines of this source. Defaults to the workload name.
    #[serde(default)]
    pub display_key: Option<String>,
    pub workload: String,
    pub namespace: String,
    pub container: String,
}

impl SourceSpec {
    pub fn new(workload: impl Into<String>, namespace: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            display_key: None,
            workload: workload.into(),
            namespace: namespace.into(),
            container: container.into(),
        }
    }

    pub fn with_display_key(mut self, display_key: impl Into<String>) -> Self {
        self.display_key = Some(display_key.into());
        self
    }

    pub fn key(&self) -> SourceKey {
        SourceKey::new(&self.workload, &self.namespace, &self.container)
    }

    pub fn display_key(&self) -> &str {
        self.display_key.as_deref().unwrap_or(&self.workload)
    }
}

/// Payload of a [`LogEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEventKind {
    /// A single log line as read from the stream.
    Line(String),
    /// The stream closed or failed; no further events follow for this source.
    EndOfStream,
}

/// A timestamped event produced by exactly one tail worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub source_key: SourceKey,
    pub kind: LogEventKind,
    pub received_at: DateTime<Utc>,
}

impl LogEvent {
    pub fn line(source_key: SourceKey, text: impl Into<String>) -> Self {
        Self {
            source_key,
            kind: LogEventKind::Line(text.into()),
            received_at: Utc::now(),
        }
    }

    /// Sentinel pushed once by a worker whose stream has ended.
    pub fn terminal(source_key: SourceKey) -> Self {
        Self {
            source_key,
            kind: LogEventKind::EndOfStream,
            received_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, LogEventKind::EndOfStream)
    }

    /// Log text carried by a line event; `None` for the terminal sentinel.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            LogEventKind::Line(text) => Some(text),
            LogEventKind::EndOfStream => None,
        }
    }
}
