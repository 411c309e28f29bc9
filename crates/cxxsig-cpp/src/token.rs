//! Token model shared by the lexer and the scanners.

use serde::{Deserialize, Serialize};

pub use cxxsig_core::patch::Span;

/// Token category.
///
/// Only the categories the scanners dispatch on are distinguished; everything
/// else lexes as [`TokenKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    /// `<`, a template bracket or a comparison depending on position.
    Lt,
    /// `>`
    Gt,
    /// `>>`, closes two template levels inside a template argument list.
    Shr,
    Comma,
    Semicolon,
    /// A whole preprocessor directive line, continuations included.
    Directive,
    Ident,
    /// `=`
    Assign,
    /// `+=`, `-=`, `<<=` and friends.
    CompoundAssign,
    /// `++`
    Increment,
    /// `--`
    Decrement,
    Whitespace,
    Comment,
    Other,
}

impl TokenKind {
    /// Whitespace and comments.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// A lexical unit with its byte range in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            span: Span::new(start, end),
        }
    }

    /// Start offset into the source buffer.
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// Read-only random access to the source buffer being scanned.
///
/// Reads return `None` instead of panicking when the range is out of bounds
/// or splits a character, so a buffer that changed under a caller degrades
/// to missing text.
pub trait SourceText {
    /// Text in `span`, if the range is readable.
    fn slice(&self, span: Span) -> Option<&str>;

    /// Length of the buffer in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SourceText for str {
    fn slice(&self, span: Span) -> Option<&str> {
        self.get(span.start..span.end)
    }

    fn len(&self) -> usize {
        str::len(self)
    }
}

impl SourceText for String {
    fn slice(&self, span: Span) -> Option<&str> {
        self.as_str().slice(span)
    }

    fn len(&self) -> usize {
        String::len(self)
    }
}
