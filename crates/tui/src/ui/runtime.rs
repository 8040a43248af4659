//! Runtime: terminal lifecycle and the render loop.
//!
//! Responsibilities
//! - Own the terminal lifecycle (raw mode, alternate screen) and restore it on
//!   every exit path.
//! - Start one tail worker per source and cancel them when the loop ends.
//! - Drive a single loop that merges terminal input, log events and spinner
//!   ticks into [`Msg`]s, applies them to [`DashboardState`] and redraws.
//!
//! Input is polled ahead of log events so a keypress is never starved by a
//! busy source. A frame that fails to draw is logged and skipped; the loop
//! keeps going.

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::{Stream, StreamExt};
use podtail_types::LogSource;
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use tokio::{
    signal,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{EventReceiver, event_channel};
use crate::config::DashboardConfig;
use crate::state::{DashboardState, Msg, Transition};
use crate::ui::theme::DashboardTheme;
use crate::ui::view::DashboardView;
use crate::worker::WorkerSet;

/// How long workers get to stop after the loop ends.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Destination for rendered frames.
pub trait FrameSink {
    fn present(&mut self, view: &DashboardView, state: &DashboardState) -> Result<()>;
}

impl<B> FrameSink for Terminal<B>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    fn present(&mut self, view: &DashboardView, state: &DashboardState) -> Result<()> {
        self.draw(|frame| view.render(frame, frame.area(), state))?;
        Ok(())
    }
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(error) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(error).context("failed to enter alternate screen");
    }
    match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(terminal) => Ok(terminal),
        Err(error) => {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            Err(error).context("failed to create terminal")
        }
    }
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn present<S: FrameSink>(sink: &mut S, view: &DashboardView, state: &DashboardState) {
    if let Err(error) = sink.present(view, state) {
        warn!(error = %error, "failed to render frame");
    }
}

fn input_message(event: Event) -> Option<Msg> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(Msg::Input),
        Event::Resize(width, height) => Some(Msg::Resize(width, height)),
        _ => None,
    }
}

/// Run the dashboard until the user quits.
///
/// Fails only if the configuration is invalid or the terminal cannot be
/// initialized. Sources that cannot be opened are logged and left empty.
pub async fn run_dashboard(config: DashboardConfig, source: Arc<dyn LogSource>) -> Result<()> {
    config.validate()?;
    let mut terminal = setup_terminal().context("failed to initialize terminal")?;

    let shutdown = CancellationToken::new();
    let (sender, mut events) = event_channel(config.channel_capacity);
    let workers = WorkerSet::spawn(&config.sources, source, &sender, config.pace(), &shutdown);
    drop(sender);
    info!(sources = workers.len(), capacity = config.capacity, "dashboard started");

    let interrupt = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                result = signal::ctrl_c() => {
                    if result.is_ok() {
                        info!("interrupt received");
                        shutdown.cancel();
                    }
                }
            }
        })
    };

    let state = DashboardState::new(&config.sources, config.capacity).with_redaction(config.redact);
    let view = DashboardView::new(DashboardTheme::from_environment()).with_timestamps(config.show_timestamps);
    let input = Box::pin(EventStream::new());

    let state = run_loop(&mut terminal, state, &view, &mut events, input, config.tick(), &shutdown).await;

    for (key, exit) in workers.shutdown(SHUTDOWN_GRACE).await {
        debug!(source = %key, exit = ?exit, "worker stopped");
    }
    interrupt.abort();
    cleanup_terminal(&mut terminal).context("failed to restore terminal")?;
    info!(dropped_events = state.dropped_events(), "dashboard closed");
    Ok(())
}

/// The render loop. Returns the final state once it has entered quitting and
/// the last frame has been drawn.
///
/// Exits on the first keypress, when `input` ends or fails, or when
/// `shutdown` is cancelled. Cancels `shutdown` on the way out so workers stop.
/// A closed event channel is not a reason to exit: the last lines stay on
/// screen until the user quits.
pub async fn run_loop<S, I>(
    sink: &mut S,
    mut state: DashboardState,
    view: &DashboardView,
    events: &mut EventReceiver,
    mut input: I,
    tick: Duration,
    shutdown: &CancellationToken,
) -> DashboardState
where
    S: FrameSink,
    I: Stream<Item = io::Result<Event>> + Unpin,
{
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut events_open = true;

    present(sink, view, &state);

    loop {
        let msg = tokio::select! {
            biased;

            next = input.next() => match next {
                Some(Ok(event)) => match input_message(event) {
                    Some(msg) => msg,
                    None => continue,
                },
                Some(Err(error)) => {
                    warn!(error = %error, "failed to read terminal input; quitting");
                    Msg::Input
                }
                None => {
                    debug!("terminal input closed; quitting");
                    Msg::Input
                }
            },
            _ = shutdown.cancelled() => Msg::Input,
            event = events.recv(), if events_open => match event {
                Some(event) => Msg::from(event),
                None => {
                    info!("all tail workers have stopped");
                    events_open = false;
                    continue;
                }
            },
            _ = ticker.tick() => Msg::Tick,
        };

        match state.update(msg) {
            Transition::Unchanged => {}
            Transition::Redraw => present(sink, view, &state),
            Transition::Quit => {
                present(sink, view, &state);
                break;
            }
        }
    }

    shutdown.cancel();
    events.close();
    state
}
