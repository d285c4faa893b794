//! # Compiler Error Model
//!
//! A single, uniform error representation shared by the preprocessor,
//! lexer, parser, and opcode emitter. Every phase reports a `CompileError`
//! carrying a 1-indexed `(line, column)` and, when source text is
//! available, a five-line rendered context window with a caret pointing at
//! the offending column.
//!
//! Playback-time failures (missing SoundFont, missing MIDI file, malformed
//! SMF) do not share this rendering path — they live in
//! [`crate::midi::PlaybackError`], a small `thiserror`-derived enum.

use std::fmt;

/// 1-indexed source location. Columns count UTF-8 code points, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Which stage of the compilation pipeline produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Preprocess,
    Lex,
    Parse,
    Emit,
    EntryPoint,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Preprocess => "preprocess",
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Emit => "emit",
            Phase::EntryPoint => "entry-point",
        };
        f.write_str(name)
    }
}

/// A single compile-time diagnostic.
///
/// `context` is populated lazily by [`CompileError::with_context`] once the
/// canonical preprocessed source is available — the error itself only needs
/// to remember its position at the moment it is raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub phase: Phase,
    pub message: String,
    pub position: Position,
    pub context: Option<String>,
}

impl CompileError {
    pub fn new(phase: Phase, message: impl Into<String>, position: Position) -> Self {
        Self {
            phase,
            message: message.into(),
            position,
            context: None,
        }
    }

    /// Attach a rendered five-line source window to this error.
    #[must_use]
    pub fn with_context(mut self, source: &str) -> Self {
        self.context = render_context(source, self.position.line, self.position.col);
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}: {}",
            self.phase, self.position, self.message
        )?;
        if let Some(ctx) = &self.context {
            write!(f, "\n{ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Render a five-line context window around `line` (1-indexed), marking it
/// with `> N |` and a caret under `col` (1-indexed, code-point based).
///
/// Returns `None` (an empty context, per spec) when the source is empty or
/// the requested line does not exist.
pub fn render_context(source: &str, line: usize, col: usize) -> Option<String> {
    if source.is_empty() || line == 0 {
        return None;
    }

    let lines: Vec<&str> = source.lines().collect();
    if line > lines.len() {
        return None;
    }

    let first = line.saturating_sub(2).max(1);
    let last = (line + 2).min(lines.len());

    let gutter_width = last.to_string().len();
    let mut out = String::new();

    for n in first..=last {
        let text = lines[n - 1];
        if n == line {
            out.push_str(&format!("> {n:>gutter_width$} | {text}\n"));
            let caret_pad = " ".repeat(col.saturating_sub(1));
            out.push_str(&format!("  {:>gutter_width$} | {caret_pad}^\n", ""));
        } else {
            out.push_str(&format!("  {n:>gutter_width$} | {text}\n"));
        }
    }

    // Trim the single trailing newline so callers control their own spacing.
    out.pop();
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_five_line_window_with_caret() {
        let source = "int a = 1;\nint b = 2;\nint c = 3;\nint d = ;\nint e = 5;\nint f = 6;\n";
        let ctx = render_context(source, 4, 9).unwrap();
        assert!(ctx.contains("> 4 | int d = ;"));
        assert!(ctx.contains("  2 | int b = 2;"));
        assert!(ctx.contains("  6 | int f = 6;"));
        let caret_line = ctx.lines().find(|l| l.contains('^')).unwrap();
        assert_eq!(
            caret_line.find('^').unwrap() - caret_line.find('|').unwrap() - 2,
            8
        );
    }

    #[test]
    fn empty_source_yields_no_context() {
        assert_eq!(render_context("", 1, 1), None);
    }

    #[test]
    fn out_of_range_line_yields_no_context() {
        assert_eq!(render_context("a\nb\n", 50, 1), None);
    }

    #[test]
    fn gutter_width_adapts_to_largest_line_number() {
        let mut source = String::new();
        for i in 1..=12 {
            source.push_str(&format!("line{i}\n"));
        }
        let ctx = render_context(&source, 10, 1).unwrap();
        // Lines 8..=12 are shown; gutter should be two characters wide.
        assert!(ctx.contains("> 10 | line10"));
        assert!(ctx.contains("  12 | line12"));
    }
}
