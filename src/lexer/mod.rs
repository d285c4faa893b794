//! # Lexer
//!
//! Tokenizes preprocessed script source into a stream of tokens.
//!
//! ## Features
//!
//! - **Identifiers & keywords**: `[A-Za-z_][A-Za-z_0-9]*`, keywords matched
//!   against the closed set in [`token::lookup_keyword`] after the word is
//!   fully scanned.
//! - **Numeric literals**: decimal integers, `0x`-prefixed hexadecimal
//!   integers, and `int.frac` floats. No exponent notation.
//! - **String literals**: double-quoted, with only `\\` and `\"` escapes.
//! - **Comments**: `//` line comments, run to end of line.
//! - **Illegal characters**: recorded as an error; scanning continues at the
//!   next character so a single bad byte does not abort the whole file.

pub mod cursor;
pub mod token;


use crate::error::{CompileError, Phase, Position};
use cursor::Cursor;
use log::{debug, trace};
use token::{lookup_keyword, Token, TokenKind};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<CompileError>,
}

#[must_use]
pub fn tokenize(source: &str) -> LexResult {
    trace!("lex: tokenizing {} byte(s) of source", source.len());
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !cursor.is_at_end() {
        match lex_token(&mut cursor) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => errors.push(err),
        }
    }

    let (line, column) = cursor.current_pos();
    tokens.push(Token {
        kind: TokenKind::Eof,
        literal: String::new(),
        line,
        column,
    });

    debug!(
        "lex: produced {} token(s), {} error(s)",
        tokens.len(),
        errors.len()
    );
    LexResult { tokens, errors }
}

fn lex_token(cursor: &mut Cursor) -> Result<Option<Token>, CompileError> {
    while matches!(cursor.peek(), Some(' ' | '\t' | '\r' | '\n')) {
        cursor.advance();
    }

    if cursor.is_at_end() {
        return Ok(None);
    }

    let (line, column) = cursor.current_pos();
    let ch = cursor.peek().unwrap();

    match ch {
        '/' if cursor.peek_second() == Some('/') => lex_line_comment(cursor),
        '"' => lex_string(cursor, line, column),
        c if c.is_ascii_digit() => lex_number(cursor, line, column),
        c if c.is_ascii_alphabetic() || c == '_' => lex_word(cursor, line, column),
        _ => lex_punct(cursor, line, column),
    }
}

fn lex_line_comment(cursor: &mut Cursor) -> Result<Option<Token>, CompileError> {
    while !matches!(cursor.peek(), None | Some('\n')) {
        cursor.advance();
    }
    Ok(None)
}

fn lex_string(
    cursor: &mut Cursor,
    line: usize,
    column: usize,
) -> Result<Option<Token>, CompileError> {
    cursor.advance(); // opening quote
    let mut value = String::new();
    let mut raw = String::from("\"");

    loop {
        match cursor.peek() {
            None | Some('\n') => {
                return Err(CompileError::new(
                    Phase::Lex,
                    "unterminated string literal",
                    Position::new(line, column),
                ));
            }
            Some('"') => {
                cursor.advance();
                raw.push('"');
                break;
            }
            Some('\\') => {
                cursor.advance();
                raw.push('\\');
                match cursor.peek() {
                    Some('\\') => {
                        value.push('\\');
                        raw.push('\\');
                        cursor.advance();
                    }
                    Some('"') => {
                        value.push('"');
                        raw.push('"');
                        cursor.advance();
                    }
                    Some(other) => {
                        return Err(CompileError::new(
                            Phase::Lex,
                            format!("invalid escape sequence: \\{other}"),
                            Position::new(line, column),
                        ));
                    }
                    None => {
                        return Err(CompileError::new(
                            Phase::Lex,
                            "unterminated string literal",
                            Position::new(line, column),
                        ));
                    }
                }
            }
            Some(c) => {
                value.push(c);
                raw.push(c);
                cursor.advance();
            }
        }
    }

    Ok(Some(Token {
        kind: TokenKind::StringLiteral(value),
        literal: raw,
        line,
        column,
    }))
}

fn lex_number(
    cursor: &mut Cursor,
    line: usize,
    column: usize,
) -> Result<Option<Token>, CompileError> {
    let mut raw = String::new();

    if cursor.peek() == Some('0') && cursor.peek_second() == Some('x') {
        raw.push(cursor.advance().unwrap());
        raw.push(cursor.advance().unwrap());
        let mut digits = String::new();
        while matches!(cursor.peek(), Some(c) if c.is_ascii_hexdigit()) {
            let c = cursor.advance().unwrap();
            digits.push(c);
            raw.push(c);
        }
        if digits.is_empty() {
            return Err(CompileError::new(
                Phase::Lex,
                format!("invalid hexadecimal literal: {raw}"),
                Position::new(line, column),
            ));
        }
        let value = i64::from_str_radix(&digits, 16).map_err(|_| {
            CompileError::new(
                Phase::Lex,
                format!("invalid hexadecimal literal: {raw}"),
                Position::new(line, column),
            )
        })?;
        return Ok(Some(Token {
            kind: TokenKind::IntegerLiteral(value),
            literal: raw,
            line,
            column,
        }));
    }

    while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
        raw.push(cursor.advance().unwrap());
    }

    if cursor.peek() == Some('.') && matches!(cursor.peek_second(), Some(c) if c.is_ascii_digit())
    {
        raw.push(cursor.advance().unwrap()); // '.'
        while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            raw.push(cursor.advance().unwrap());
        }
        let value = raw.parse::<f64>().map_err(|_| {
            CompileError::new(
                Phase::Lex,
                format!("invalid float literal: {raw}"),
                Position::new(line, column),
            )
        })?;
        return Ok(Some(Token {
            kind: TokenKind::FloatLiteral(value),
            literal: raw,
            line,
            column,
        }));
    }

    let value = raw.parse::<i64>().map_err(|_| {
        CompileError::new(
            Phase::Lex,
            format!("invalid integer literal: {raw}"),
            Position::new(line, column),
        )
    })?;
    Ok(Some(Token {
        kind: TokenKind::IntegerLiteral(value),
        literal: raw,
        line,
        column,
    }))
}

fn lex_word(
    cursor: &mut Cursor,
    line: usize,
    column: usize,
) -> Result<Option<Token>, CompileError> {
    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
        word.push(cursor.advance().unwrap());
    }

    let kind = lookup_keyword(&word).unwrap_or(TokenKind::Identifier);
    Ok(Some(Token {
        kind,
        literal: word,
        line,
        column,
    }))
}

fn lex_punct(
    cursor: &mut Cursor,
    line: usize,
    column: usize,
) -> Result<Option<Token>, CompileError> {
    let ch = cursor.advance().unwrap();

    macro_rules! two_char {
        ($second:expr, $kind2:expr, $kind1:expr) => {
            if cursor.peek() == Some($second) {
                cursor.advance();
                (format!("{}{}", ch, $second), $kind2)
            } else {
                (ch.to_string(), $kind1)
            }
        };
    }

    let (literal, kind) = match ch {
        '=' => two_char!('=', TokenKind::Eq, TokenKind::Assign),
        '!' => two_char!('=', TokenKind::NotEq, TokenKind::Bang),
        '<' => two_char!('=', TokenKind::LtEq, TokenKind::Lt),
        '>' => two_char!('=', TokenKind::GtEq, TokenKind::Gt),
        '&' if cursor.peek() == Some('&') => {
            cursor.advance();
            ("&&".to_string(), TokenKind::AndAnd)
        }
        '|' if cursor.peek() == Some('|') => {
            cursor.advance();
            ("||".to_string(), TokenKind::OrOr)
        }
        '+' => ("+".to_string(), TokenKind::Plus),
        '-' => ("-".to_string(), TokenKind::Minus),
        '*' => ("*".to_string(), TokenKind::Star),
        '/' => ("/".to_string(), TokenKind::Slash),
        '%' => ("%".to_string(), TokenKind::Percent),
        ',' => (",".to_string(), TokenKind::Comma),
        ';' => (";".to_string(), TokenKind::Semicolon),
        ':' => (":".to_string(), TokenKind::Colon),
        '(' => ("(".to_string(), TokenKind::LParen),
        ')' => (")".to_string(), TokenKind::RParen),
        '{' => ("{".to_string(), TokenKind::LBrace),
        '}' => ("}".to_string(), TokenKind::RBrace),
        '[' => ("[".to_string(), TokenKind::LBracket),
        ']' => ("]".to_string(), TokenKind::RBracket),
        other => {
            return Err(CompileError::new(
                Phase::Lex,
                format!("unexpected character: '{other}'"),
                Position::new(line, column),
            ));
        }
    };

    Ok(Some(Token {
        kind,
        literal,
        line,
        column,
    }))
}
