//! # Text Processing Utilities
//!
//! Container output is written for a plain terminal: it may carry ANSI color
//! sequences, carriage returns, tabs and the occasional secret. Lines pass
//! through [`sanitize_log_line`] before they reach the dashboard so that a
//! single noisy source cannot corrupt the layout of the others.

use once_cell::sync::Lazy;
use regex::Regex;

const TAB_WIDTH: usize = 4;

/// Matches CSI and OSC escape sequences as well as lone two-byte escapes.
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:\[[0-?]*[ -/]*[@-~]|\][^\x07\x1b]*(?:\x07|\x1b\\)|[@-Z\\-_])").expect("valid ANSI escape pattern")
});

static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(build_redact_patterns);

/// Strip terminal escape sequences and control characters from a log line.
///
/// Tabs expand to spaces; any other control character (including `\r`) is
/// dropped. Trailing whitespace is trimmed.
///
/// # Example
/// ```rust
/// use podtail_util::sanitize_log_line;
///
/// assert_eq!(sanitize_log_line("\x1b[32mINFO\x1b[0m\tready\r"), "INFO    ready");
/// ```
pub fn sanitize_log_line(input: &str) -> String {
    let stripped = ANSI_ESCAPE.replace_all(input, "");
    let mut out = String::with_capacity(stripped.len());
    for ch in stripped.chars() {
        match ch {
            '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out
}

/// Redacts values that look like secrets in a string.
///
/// # Example
/// ```rust
/// use podtail_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("API_KEY=abc123 ok"), "API_KEY=[REDACTED] ok");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, "[REDACTED]")
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{}{}", prefix, replacement)
            })
            .to_string();
    }

    redacted
}

fn build_redact_patterns() -> Vec<Regex> {
    vec![
        Regex::new(r"(?i)(authorization:\s+)(\S+(?:\s+\S+)?)").expect("valid authorization pattern"),
        Regex::new(r"(?i)(\bBearer\s+)([A-Za-z0-9\-._~+/]+=*)").expect("valid bearer pattern"),
        Regex::new(r"(?i)(\b[A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD)=)(\S+)").expect("valid env pattern"),
        Regex::new(r"(?i)(\b(?:DATABASE|REDIS|MONGO(?:DB)?)_UR[LI]=)(\S+)").expect("valid url pattern"),
        Regex::new(r#"(?i)("(?:password|secret|token|api_key)"\s*:\s*)("[^"]*")"#).expect("valid json pattern"),
    ]
}
