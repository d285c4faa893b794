//! # Token Types
//!
//! Defines all token types for the script language.
//!
//! ## Token Structure
//!
//! Each token contains:
//! - `kind`: the token type (keyword, literal, punctuation, ...)
//! - `literal`: the original text from source
//! - `line` / `column`: 1-indexed source position for error reporting

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

/// Token kinds for the script language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    IntegerLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // === Keywords ===
    If,
    Else,
    For,
    While,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Function,
    Mes,
    Step,

    // === Operators & punctuation ===
    Assign,    // =
    Eq,        // ==
    NotEq,     // !=
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Bang,      // !
    AndAnd,    // &&
    OrOr,      // ||
    Comma,     // ,
    Semicolon, // ;
    Colon,     // :
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]

    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            If | Else
                | For
                | While
                | Switch
                | Case
                | Default
                | Break
                | Continue
                | Return
                | Function
                | Mes
                | Step
        )
    }
}

/// Match an identifier's literal text against the closed keyword set.
///
/// Keywords are matched post-hoc, after an identifier has already been
/// scanned in full — the lexer never special-cases keyword prefixes while
/// reading a word.
pub fn lookup_keyword(literal: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match literal {
        "if" => If,
        "else" => Else,
        "for" => For,
        "while" => While,
        "switch" => Switch,
        "case" => Case,
        "default" => Default,
        "break" => Break,
        "continue" => Continue,
        "return" => Return,
        "function" => Function,
        "mes" => Mes,
        "step" => Step,
        _ => return None,
    })
}
