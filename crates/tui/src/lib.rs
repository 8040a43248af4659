//! # Podtail TUI Library
//!
//! Tails logs from several pod containers at once and shows the most recent
//! lines of each in a single terminal dashboard.
//!
//! ## Architecture
//!
//! - One [`worker::TailWorker`] per source reads its log stream and forwards
//!   each line through a shared bounded [`channel`].
//! - A single render loop ([`ui::runtime::run_loop`]) owns the
//!   [`state::DashboardState`], applies log events, ticks and keypresses to it
//!   one at a time, and redraws after every change.
//! - Each source keeps a fixed-capacity [`buffer::RollingBuffer`] pre-filled
//!   with placeholders, so the layout never shifts as lines arrive.
//!
//! Any keypress quits. Workers are cancelled and the terminal is restored.

pub mod buffer;
pub mod channel;
pub mod config;
pub mod state;
pub mod ui;
pub mod worker;

use std::sync::Arc;

use anyhow::Result;
use podtail_types::LogSource;

pub use buffer::RollingBuffer;
pub use channel::{EventReceiver, EventSender, event_channel};
pub use config::{ConfigError, DashboardConfig, parse_source_arg};
pub use state::{DashboardState, Msg, Phase, Transition};
pub use worker::{TailWorker, WorkerExit, WorkerSet};

/// Runs the dashboard until the user presses a key.
///
/// # Errors
///
/// Returns an error if `config` fails validation or the terminal cannot be
/// put into raw mode and the alternate screen. Failing sources are not
/// errors; their blocks stay empty.
pub async fn run(config: DashboardConfig, source: Arc<dyn LogSource>) -> Result<()> {
    ui::runtime::run_dashboard(config, source).await
}
