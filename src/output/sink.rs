//! Output sinks
//!
//! The reporter writes styled text through an [`OutputSink`] instead of
//! touching terminal state directly.

use std::io::{self, Write};

/// Visual style of a piece of output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Style {
    Normal,
    Success,
    Warning,
    Error,
    Info,
}

impl Style {
    fn ansi_code(self) -> Option<&'static str> {
        match self {
            Style::Normal => None,
            Style::Success => Some("\x1b[32m"),
            Style::Warning => Some("\x1b[33m"),
            Style::Error => Some("\x1b[31m"),
            Style::Info => Some("\x1b[36m"),
        }
    }
}

/// Destination for human-readable run output
pub trait OutputSink {
    /// Write a styled fragment on the current line
    fn write(&mut self, style: Style, text: &str);

    /// Terminate the current line
    fn newline(&mut self);

    fn emit_styled(&mut self, style: Style, text: &str) {
        self.write(style, text);
        self.newline();
    }

    fn emit(&mut self, text: &str) {
        self.emit_styled(Style::Normal, text);
    }

    fn emit_success(&mut self, text: &str) {
        self.emit_styled(Style::Success, text);
    }

    fn emit_error(&mut self, text: &str) {
        self.emit_styled(Style::Error, text);
    }

    fn emit_info(&mut self, text: &str) {
        self.emit_styled(Style::Info, text);
    }
}

/// Writes to a terminal or any other writer, with optional ANSI colours
pub struct ConsoleSink<W: Write> {
    writer: W,
    colorize: bool,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(colorize: bool) -> Self {
        Self::new(io::stdout(), colorize)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(writer: W, colorize: bool) -> Self {
        Self { writer, colorize }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for ConsoleSink<W> {
    // Write errors (e.g. a closed pipe) are dropped; output is observational.
    fn write(&mut self, style: Style, text: &str) {
        let _ = match style.ansi_code() {
            Some(code) if self.colorize && !text.is_empty() => {
                write!(self.writer, "{code}{text}\x1b[0m")
            }
            _ => write!(self.writer, "{text}"),
        };
    }

    fn newline(&mut self) {
        let _ = writeln!(self.writer);
        let _ = self.writer.flush();
    }
}

/// Keeps output in memory, one entry of styled fragments per line
#[cfg(test)]
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Vec<Vec<(Style, String)>>,
    current: Vec<(Style, String)>,
}

#[cfg(test)]
impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed lines as plain text
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|segments| {
                segments
                    .iter()
                    .map(|(_, text)| text.as_str())
                    .collect::<String>()
            })
            .collect()
    }

    /// Styled fragments of every completed line
    pub fn segments(&self) -> &[Vec<(Style, String)>] {
        &self.lines
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}

#[cfg(test)]
impl OutputSink for BufferSink {
    fn write(&mut self, style: Style, text: &str) {
        self.current.push((style, text.to_string()));
    }

    fn newline(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }
}
