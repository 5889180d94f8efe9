//! Human-readable output sink
//!
//! Diagnostic commands report progress as leveled text lines. The console
//! sink colors them through `colored`, which honours `NO_COLOR`, `CLICOLOR`
//! and whether stdout is a terminal; the transcript sink keeps them in memory.

use std::fmt;
use std::io::Write;

use colored::{ColoredString, Colorize};

/// Style of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Unstyled text
    Plain,
    /// Something worth attention
    Warning,
    /// A failure
    Error,
    /// A positive outcome
    Success,
}

impl Style {
    /// Apply the terminal style for this level to `text`
    pub fn paint(self, text: &str) -> ColoredString {
        match self {
            Style::Plain => text.normal(),
            Style::Warning => text.yellow(),
            Style::Error => text.red().bold(),
            Style::Success => text.green().bold(),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Style::Plain => write!(f, "plain"),
            Style::Warning => write!(f, "warning"),
            Style::Error => write!(f, "error"),
            Style::Success => write!(f, "success"),
        }
    }
}

/// Sink accepting leveled text lines
pub trait Output {
    /// Write one line with the given style
    fn line(&mut self, style: Style, text: &str);

    fn plain(&mut self, text: &str) {
        self.line(Style::Plain, text);
    }

    fn warning(&mut self, text: &str) {
        self.line(Style::Warning, text);
    }

    fn error(&mut self, text: &str) {
        self.line(Style::Error, text);
    }

    fn success(&mut self, text: &str) {
        self.line(Style::Success, text);
    }
}

/// Output sink writing to any `Write` implementation
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> Console<W> {
    /// Create a console sink
    ///
    /// # Parameters
    ///
    /// * `out` - Destination writer
    /// * `color` - Whether to style lines at all; when set, `colored`'s
    ///   global control still decides whether escapes are emitted
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl Console<std::io::Stdout> {
    /// Console sink on stdout
    ///
    /// Coloring follows `colored`'s environment detection, see
    /// [`colored::control::set_override`] to force it either way.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout(), true)
    }
}

impl<W: Write> Output for Console<W> {
    fn line(&mut self, style: Style, text: &str) {
        let result = if self.color {
            writeln!(self.out, "{}", style.paint(text))
        } else {
            writeln!(self.out, "{}", text)
        };

        if let Err(e) = result {
            log::warn!("Failed to write output line: {}", e);
        }
    }
}

/// In-memory output sink
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    lines: Vec<(Style, String)>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded lines in order
    pub fn lines(&self) -> &[(Style, String)] {
        &self.lines
    }

    /// Whether any line with the given style contains `needle`
    pub fn contains(&self, style: Style, needle: &str) -> bool {
        self.lines
            .iter()
            .any(|(s, text)| *s == style && text.contains(needle))
    }

    /// Recorded text joined by newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for Transcript {
    fn line(&mut self, style: Style, text: &str) {
        self.lines.push((style, text.to_string()));
    }
}
