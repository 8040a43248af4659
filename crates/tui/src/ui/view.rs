//! Frame composition for the dashboard.
//!
//! Layout, top to bottom:
//! - header: spinner and caption while running, a completion message once quitting
//! - one block per source in display order, separated by a blank line; each
//!   block lists its buffer oldest to newest, with a dotted placeholder for
//!   empty slots
//! - footer hint, only while running

use chrono::Local;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Padding, Paragraph},
};

use crate::state::{DashboardState, DisplayEntry, SourcePanel};
use crate::ui::theme::DashboardTheme;

pub const CAPTION: &str = "Tailing some logs...";
pub const DONE_MESSAGE: &str = "That's all for today!";
pub const HELP_HINT: &str = "Press any key to exit";
pub const END_OF_STREAM: &str = "end of stream";

#[derive(Debug, Clone)]
pub struct DashboardView {
    theme: DashboardTheme,
    show_timestamps: bool,
}

impl DashboardView {
    pub fn new(theme: DashboardTheme) -> Self {
        Self {
            theme,
            show_timestamps: false,
        }
    }

    /// Prefix each line with the local time it was received.
    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Build the lines of one frame.
    pub fn lines(&self, state: &DashboardState) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(3 + state.panels().count() * (state.capacity() + 1));
        lines.push(self.header(state));
        lines.push(Line::default());

        for (index, panel) in state.panels().enumerate() {
            if index > 0 {
                lines.push(Line::default());
            }
            lines.extend(panel.buffer.iter().map(|slot| match slot {
                None => self.placeholder(),
                Some(entry) => self.entry(panel, entry),
            }));
        }

        if !state.is_quitting() {
            lines.push(Line::default());
            lines.push(Line::styled(HELP_HINT, self.theme.help_style()));
        }
        lines
    }

    /// Draw the frame into `area` with a small outer margin.
    pub fn render(&self, frame: &mut Frame, area: Rect, state: &DashboardState) {
        let block = Block::default().padding(Padding::new(2, 2, 1, 0));
        frame.render_widget(Paragraph::new(self.lines(state)).block(block), area);
    }

    /// Frame content without styling, one row per line.
    pub fn frame_text(&self, state: &DashboardState) -> String {
        self.lines(state)
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn header(&self, state: &DashboardState) -> Line<'static> {
        if state.is_quitting() {
            return Line::styled(DONE_MESSAGE, self.theme.done_style());
        }
        Line::from(vec![
            Span::styled(self.theme.spinner_symbol(state.spinner_frame()), self.theme.spinner_style()),
            Span::raw(" "),
            Span::styled(CAPTION, self.theme.text_style()),
        ])
    }

    fn placeholder(&self) -> Line<'static> {
        Line::styled(".".repeat(self.theme.placeholder_width), self.theme.placeholder_style())
    }

    fn entry(&self, panel: &SourcePanel, entry: &DisplayEntry) -> Line<'static> {
        let mut spans = vec![Span::styled(format!("{} ", self.theme.line_marker), self.theme.spinner_style())];
        if self.show_timestamps {
            let local = entry.received_at().with_timezone(&Local);
            spans.push(Span::styled(
                format!("{} ", local.format("%H:%M:%S")),
                self.theme.text_muted_style(),
            ));
        }
        match entry {
            DisplayEntry::Line { text, .. } => spans.push(Span::styled(text.clone(), self.theme.text_style())),
            DisplayEntry::EndOfStream { .. } => {
                spans.push(Span::styled(format!("── {END_OF_STREAM} ──"), self.theme.end_marker_style()))
            }
        }
        spans.push(Span::styled(
            format!("  {}", panel.spec.display_key()),
            self.theme.text_muted_style(),
        ));
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Msg;
    use podtail_types::{LogEvent, SourceSpec};
    use ratatui::{Terminal, backend::TestBackend};

    fn sources() -> Vec<SourceSpec> {
        vec![
            SourceSpec::new("blocc-0", "blocc", "manager").with_display_key("blocc"),
            SourceSpec::new("paas-0", "flow-system", "paas-controller").with_display_key("paas"),
        ]
    }

    fn view() -> DashboardView {
        DashboardView::new(DashboardTheme::monochrome())
    }

    #[test]
    fn initial_frame_is_all_placeholders() {
        let state = DashboardState::new(&sources(), 2);
        let dots = ".".repeat(30);
        let expected = [
            format!("{} {CAPTION}", DashboardTheme::default().spinner_symbol(0)),
            String::new(),
            dots.clone(),
            dots.clone(),
            String::new(),
            dots.clone(),
            dots,
            String::new(),
            HELP_HINT.to_string(),
        ]
        .join("\n");
        assert_eq!(view().frame_text(&state), expected);
    }

    #[test]
    fn lines_render_oldest_to_newest_with_source_label() {
        let specs = sources();
        let mut state = DashboardState::new(&specs, 2);
        state.update(Msg::from(LogEvent::line(specs[0].key(), "first")));
        state.update(Msg::from(LogEvent::line(specs[0].key(), "second")));
        state.update(Msg::from(LogEvent::line(specs[1].key(), "ready")));

        let text = view().frame_text(&state);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[2], "› first  blocc");
        assert_eq!(rows[3], "› second  blocc");
        assert_eq!(rows[5], ".".repeat(30));
        assert_eq!(rows[6], "› ready  paas");
    }

    #[test]
    fn quitting_frame_announces_completion_without_hint() {
        let mut state = DashboardState::new(&sources(), 1);
        state.update(Msg::Input);
        let text = view().frame_text(&state);
        assert!(text.starts_with(DONE_MESSAGE));
        assert!(!text.contains(HELP_HINT));
        assert!(!text.contains(CAPTION));
    }

    #[test]
    fn end_of_stream_renders_a_marker() {
        let specs = sources();
        let mut state = DashboardState::new(&specs, 2);
        state.update(Msg::from(LogEvent::terminal(specs[1].key())));
        let text = view().frame_text(&state);
        assert!(text.contains(&format!("── {END_OF_STREAM} ──  paas")));
    }

    #[test]
    fn timestamps_prefix_lines_when_enabled() {
        let specs = sources();
        let mut state = DashboardState::new(&specs, 1);
        state.update(Msg::from(LogEvent::line(specs[0].key(), "hello")));
        let text = view().with_timestamps(true).frame_text(&state);
        let row = text.lines().nth(2).unwrap();
        let stamp = row.strip_prefix("› ").unwrap().split(' ').next().unwrap();
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.matches(':').count(), 2);
        assert!(row.ends_with("hello  blocc"));
    }

    #[test]
    fn renders_into_a_terminal_buffer() {
        let specs = sources();
        let mut state = DashboardState::new(&specs, 1);
        state.update(Msg::from(LogEvent::line(specs[0].key(), "booted")));

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|frame| view().render(frame, frame.area(), &state)).unwrap();

        let buffer = terminal.backend().buffer();
        let row = |y: u16| (0..60).map(|x| buffer[(x, y)].symbol().to_string()).collect::<String>();
        assert!(row(1).trim_start().starts_with(&DashboardTheme::default().spinner_symbol(0).to_string()));
        assert_eq!(row(3).trim_end(), "  › booted  blocc");
    }
}
