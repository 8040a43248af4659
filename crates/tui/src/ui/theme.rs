//! Theme styling for the dashboard.
//!
//! A theme is an immutable value built once at startup and handed to the
//! view. Nothing reads colors from global state.

use std::env;

use ratatui::style::{Color, Modifier, Style};
use tracing::debug;

/// Semantic color roles used by the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeRoles {
    pub text: Color,
    pub text_muted: Color,
    pub accent: Color,
    pub warning: Color,
}

/// Spinner frames cycled by the header while tailing.
pub const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardTheme {
    roles: Option<ThemeRoles>,
    /// Glyph prefixed to every rendered log line.
    pub line_marker: &'static str,
    /// Width of the dotted placeholder drawn for empty slots.
    pub placeholder_width: usize,
    pub spinner_frames: &'static [&'static str],
}

impl Default for DashboardTheme {
    fn default() -> Self {
        Self {
            roles: Some(ThemeRoles {
                text: Color::Reset,
                text_muted: Color::Indexed(241),
                accent: Color::Indexed(63),
                warning: Color::Indexed(167),
            }),
            line_marker: "›",
            placeholder_width: 30,
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

impl DashboardTheme {
    /// Plain theme without colors; emphasis is conveyed through modifiers only.
    pub fn monochrome() -> Self {
        Self {
            roles: None,
            ..Self::default()
        }
    }

    /// Honors `NO_COLOR` (any non-empty value) by falling back to [`monochrome`](Self::monochrome).
    pub fn from_environment() -> Self {
        let no_color = env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
        if no_color {
            debug!("NO_COLOR set; using monochrome theme");
            Self::monochrome()
        } else {
            Self::default()
        }
    }

    fn fg(&self, pick: impl Fn(&ThemeRoles) -> Color) -> Style {
        match &self.roles {
            Some(roles) => Style::default().fg(pick(roles)),
            None => Style::default(),
        }
    }

    pub fn spinner_style(&self) -> Style {
        self.fg(|roles| roles.accent)
    }

    pub fn text_style(&self) -> Style {
        self.fg(|roles| roles.text)
    }

    pub fn text_muted_style(&self) -> Style {
        match &self.roles {
            Some(roles) => Style::default().fg(roles.text_muted),
            None => Style::default().add_modifier(Modifier::DIM),
        }
    }

    pub fn placeholder_style(&self) -> Style {
        self.text_muted_style()
    }

    pub fn help_style(&self) -> Style {
        self.text_muted_style()
    }

    pub fn end_marker_style(&self) -> Style {
        self.fg(|roles| roles.warning).add_modifier(Modifier::ITALIC)
    }

    pub fn done_style(&self) -> Style {
        self.text_style().add_modifier(Modifier::BOLD)
    }

    pub fn spinner_symbol(&self, frame: usize) -> &'static str {
        match self.spinner_frames.len() {
            0 => "",
            len => self.spinner_frames[frame % len],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monochrome_sets_no_colors() {
        let theme = DashboardTheme::monochrome();
        assert_eq!(theme.spinner_style().fg, None);
        assert_eq!(theme.text_style(), Style::default());
        assert!(theme.text_muted_style().add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn default_uses_accent_for_spinner() {
        let theme = DashboardTheme::default();
        assert_eq!(theme.spinner_style().fg, Some(Color::Indexed(63)));
        assert_eq!(theme.help_style().fg, Some(Color::Indexed(241)));
    }

    #[test]
    fn spinner_symbol_wraps_around() {
        let theme = DashboardTheme::default();
        assert_eq!(theme.spinner_symbol(0), SPINNER_FRAMES[0]);
        assert_eq!(theme.spinner_symbol(SPINNER_FRAMES.len() + 1), SPINNER_FRAMES[1]);

        let empty = DashboardTheme {
            spinner_frames: &[],
            ..DashboardTheme::default()
        };
        assert_eq!(empty.spinner_symbol(3), "");
    }
}
