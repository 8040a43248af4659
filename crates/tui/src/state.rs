//! Dashboard state and its single transition function.
//!
//! The render loop is the only owner of [`DashboardState`]. Workers never touch
//! it; every mutation goes through [`DashboardState::update`] with one [`Msg`]
//! at a time, which serializes all changes without locks.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use podtail_types::{LogEvent, LogEventKind, SourceKey, SourceSpec};
use podtail_util::redact_sensitive;
use tracing::{debug, info};

use crate::buffer::RollingBuffer;

/// Everything the render loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A log line forwarded by a tail worker.
    Line(LogEvent),
    /// Terminal sentinel from a worker whose stream ended.
    StreamEnded(LogEvent),
    /// Any user keypress.
    Input,
    /// Spinner animation tick.
    Tick,
    /// Terminal resized.
    Resize(u16, u16),
}

impl From<LogEvent> for Msg {
    fn from(event: LogEvent) -> Self {
        match event.kind {
            LogEventKind::Line(_) => Msg::Line(event),
            LogEventKind::EndOfStream => Msg::StreamEnded(event),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    /// Terminal: no further log events are applied.
    Quitting,
}

/// Outcome of applying one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Redraw,
    /// Entered [`Phase::Quitting`]; render the final frame and stop.
    Quit,
}

/// One slot's content in a source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEntry {
    Line { text: String, received_at: DateTime<Utc> },
    /// Marker appended when the source's stream ended.
    EndOfStream { received_at: DateTime<Utc> },
}

impl DisplayEntry {
    pub fn text(&self) -> Option<&str> {
        match self {
            DisplayEntry::Line { text, .. } => Some(text),
            DisplayEntry::EndOfStream { .. } => None,
        }
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        match self {
            DisplayEntry::Line { received_at, .. } | DisplayEntry::EndOfStream { received_at } => *received_at,
        }
    }
}

/// Display block for one configured source.
#[derive(Debug, Clone)]
pub struct SourcePanel {
    pub spec: SourceSpec,
    pub buffer: RollingBuffer<DisplayEntry>,
    pub ended: bool,
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    panels: IndexMap<SourceKey, SourcePanel>,
    phase: Phase,
    spinner_frame: usize,
    capacity: usize,
    redact: bool,
    dropped_events: u64,
}

impl DashboardState {
    /// Build the initial state: one placeholder-filled buffer per source, in
    /// the given display order. A repeated key keeps its first position.
    pub fn new(sources: &[SourceSpec], capacity: usize) -> Self {
        let mut panels = IndexMap::with_capacity(sources.len());
        for spec in sources {
            panels.entry(spec.key()).or_insert_with(|| SourcePanel {
                spec: spec.clone(),
                buffer: RollingBuffer::new(capacity),
                ended: false,
            });
        }
        Self {
            panels,
            phase: Phase::Running,
            spinner_frame: 0,
            capacity: capacity.max(1),
            redact: false,
            dropped_events: 0,
        }
    }

    /// Mask secret-looking values in lines as they are appended.
    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Apply one message. This is the only place state changes.
    pub fn update(&mut self, msg: Msg) -> Transition {
        match (self.phase, msg) {
            (Phase::Quitting, _) => Transition::Unchanged,
            (Phase::Running, Msg::Input) => {
                info!("input received; quitting");
                self.phase = Phase::Quitting;
                Transition::Quit
            }
            (Phase::Running, Msg::Line(event)) | (Phase::Running, Msg::StreamEnded(event)) => self.apply_event(event),
            (Phase::Running, Msg::Tick) => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                Transition::Redraw
            }
            (Phase::Running, Msg::Resize(..)) => Transition::Redraw,
        }
    }

    fn apply_event(&mut self, event: LogEvent) -> Transition {
        let redact = self.redact;
        let Some(panel) = self.panels.get_mut(&event.source_key) else {
            self.dropped_events += 1;
            debug!(source = %event.source_key, "dropping event for unconfigured source");
            return Transition::Unchanged;
        };

        let entry = match event.kind {
            LogEventKind::Line(text) => DisplayEntry::Line {
                text: if redact { redact_sensitive(&text) } else { text },
                received_at: event.received_at,
            },
            LogEventKind::EndOfStream => {
                if panel.ended {
                    return Transition::Unchanged;
                }
                panel.ended = true;
                DisplayEntry::EndOfStream {
                    received_at: event.received_at,
                }
            }
        };
        panel.buffer.push(entry);
        Transition::Redraw
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_quitting(&self) -> bool {
        self.phase == Phase::Quitting
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Panels in display order.
    pub fn panels(&self) -> impl Iterator<Item = &SourcePanel> {
        self.panels.values()
    }

    pub fn buffer(&self, key: &SourceKey) -> Option<&RollingBuffer<DisplayEntry>> {
        self.panels.get(key).map(|panel| &panel.buffer)
    }

    /// Events that named a source this dashboard was never configured with.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }
}
