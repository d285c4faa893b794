//! # Cursor
//!
//! Provides character-by-character navigation through decoded script
//! source with line/column position tracking.
//!
//! Script source arrives as Shift-JIS-decoded UTF-8 text (see
//! [`crate::preprocess`]), so unlike a strictly-ASCII source the cursor
//! iterates `char`s rather than bytes — columns must count Unicode code
//! points, not byte offsets.

use std::iter::Peekable;
use std::str::Chars;

/// A cursor for iterating through source code characters.
///
/// Tracks position in two ways:
/// - Line number (1-indexed)
/// - Column number (1-indexed, counts UTF-8 code points)
pub struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    pub fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub fn peek_second(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    /// Advance past the current character, updating line/column tracking.
    ///
    /// `\n` increments line and resets column to 1; every other code point
    /// increments column by one.
    pub fn advance(&mut self) -> Option<char> {
        let next = self.chars.next()?;
        if next == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(next)
    }

    pub fn advance_if(&mut self, func: impl FnOnce(char) -> bool) -> Option<char> {
        if self.peek().is_some_and(&func) {
            self.advance()
        } else {
            None
        }
    }

    pub fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Returns `(line, col)` of the current cursor position.
    pub fn current_pos(&self) -> (usize, usize) {
        (self.line, self.col)
    }
}
