//! Tail workers: one task per configured source.
//!
//! A worker owns exactly one log subscription. It reads lines in order,
//! forwards each as a [`LogEvent`] through the shared event channel, and waits
//! a fixed pacing delay before reading the next one. When the stream closes or
//! fails it pushes a single terminal sentinel and exits.
//!
//! Workers never talk to each other. A worker whose source cannot be opened
//! logs the failure and exits without sending anything; the rest of the
//! dashboard keeps running.
//!
//! Shutdown: every worker watches a shared [`CancellationToken`] at each
//! suspension point (open, read, pace, send). The render loop cancels it when
//! it quits, and workers drop their subscription and exit without a sentinel.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::join_all;
use podtail_types::{LineStream, LogEvent, LogSource, SourceKey, SourceSpec};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::EventSender;

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The subscription could not be opened; nothing was sent.
    Unavailable,
    /// The stream closed normally; the sentinel was sent.
    StreamEnded,
    /// A read failed mid-stream; the sentinel was sent.
    StreamFailed,
    /// Shutdown was requested.
    Cancelled,
    /// The render loop dropped the channel.
    ConsumerGone,
}

pub struct TailWorker {
    spec: SourceSpec,
    source: Arc<dyn LogSource>,
    sender: EventSender,
    pace: Duration,
    shutdown: CancellationToken,
}

impl TailWorker {
    pub fn new(
        spec: SourceSpec,
        source: Arc<dyn LogSource>,
        sender: EventSender,
        pace: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            spec,
            source,
            sender,
            pace,
            shutdown,
        }
    }

    pub fn key(&self) -> SourceKey {
        self.spec.key()
    }

    pub fn spawn(self) -> JoinHandle<WorkerExit> {
        tokio::spawn(self.run())
    }

    /// Drive the subscription until it ends, fails or is cancelled.
    pub async fn run(self) -> WorkerExit {
        let key = self.spec.key();
        let opened = tokio::select! {
            _ = self.shutdown.cancelled() => return WorkerExit::Cancelled,
            opened = self.source.open_follow_stream(&key) => opened,
        };
        let lines = match opened {
            Ok(lines) => lines,
            Err(error) => {
                warn!(source = %key, display_key = self.spec.display_key(), error = %error, "log source unavailable");
                return WorkerExit::Unavailable;
            }
        };
        info!(source = %key, "tailing");

        // `lines` is owned by this frame and released on every return path.
        let exit = self.forward_lines(&key, lines).await;
        if matches!(exit, WorkerExit::StreamEnded | WorkerExit::StreamFailed) {
            return match self.send(LogEvent::terminal(key.clone())).await {
                Some(WorkerExit::Cancelled) => WorkerExit::Cancelled,
                Some(WorkerExit::ConsumerGone) => WorkerExit::ConsumerGone,
                _ => exit,
            };
        }
        exit
    }

    async fn forward_lines(&self, key: &SourceKey, mut lines: LineStream) -> WorkerExit {
        let mut forwarded: u64 = 0;
        loop {
            let next = tokio::select! {
                _ = self.shutdown.cancelled() => return WorkerExit::Cancelled,
                next = lines.next() => next,
            };
            match next {
                Some(Ok(line)) => {
                    if let Some(exit) = self.send(LogEvent::line(key.clone(), line)).await {
                        return exit;
                    }
                    forwarded += 1;
                    if !self.pace.is_zero() {
                        tokio::select! {
                            _ = self.shutdown.cancelled() => return WorkerExit::Cancelled,
                            _ = tokio::time::sleep(self.pace) => {}
                        }
                    }
                }
                Some(Err(error)) => {
                    warn!(source = %key, forwarded, error = %error, "log stream interrupted");
                    return WorkerExit::StreamFailed;
                }
                None => {
                    info!(source = %key, forwarded, "log stream closed");
                    return WorkerExit::StreamEnded;
                }
            }
        }
    }

    /// Returns the exit reason when the event could not be delivered.
    async fn send(&self, event: LogEvent) -> Option<WorkerExit> {
        tokio::select! {
            _ = self.shutdown.cancelled() => Some(WorkerExit::Cancelled),
            sent = self.sender.send(event) => match sent {
                Ok(()) => None,
                Err(error) => {
                    debug!(error = %error, "render loop gone; stopping worker");
                    Some(WorkerExit::ConsumerGone)
                }
            },
        }
    }
}

/// The running workers of one dashboard.
#[derive(Debug)]
pub struct WorkerSet {
    handles: Vec<(SourceKey, JoinHandle<WorkerExit>)>,
    shutdown: CancellationToken,
}

impl WorkerSet {
    /// Spawn one worker per source. Each worker gets its own sender clone and
    /// a child of `shutdown`.
    pub fn spawn(
        sources: &[SourceSpec],
        source: Arc<dyn LogSource>,
        sender: &EventSender,
        pace: Duration,
        shutdown: &CancellationToken,
    ) -> Self {
        let handles = sources
            .iter()
            .map(|spec| {
                let worker = TailWorker::new(
                    spec.clone(),
                    Arc::clone(&source),
                    sender.clone(),
                    pace,
                    shutdown.child_token(),
                );
                (worker.key(), worker.spawn())
            })
            .collect();
        Self {
            handles,
            shutdown: shutdown.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel every worker and wait up to `grace` for them to finish.
    ///
    /// Workers still running at the deadline are aborted and reported as
    /// `None`; workers that finished in time keep their exit reason.
    pub async fn shutdown(self, grace: Duration) -> Vec<(SourceKey, Option<WorkerExit>)> {
        self.shutdown.cancel();
        let deadline = Instant::now() + grace;
        let mut exits = Vec::with_capacity(self.handles.len());
        for (key, mut handle) in self.handles {
            let exit = match time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => joined.ok(),
                Err(_) => {
                    warn!(source = %key, "worker did not stop within grace period; aborting");
                    handle.abort();
                    None
                }
            };
            exits.push((key, exit));
        }
        exits
    }

    /// Wait for every worker to finish on its own.
    pub async fn join(self) -> Vec<(SourceKey, Option<WorkerExit>)> {
        let (keys, handles): (Vec<SourceKey>, Vec<JoinHandle<WorkerExit>>) = self.handles.into_iter().unzip();
        let results = join_all(handles).await.into_iter().map(Result::ok);
        keys.into_iter().zip(results).collect()
    }
}
