//! Field access classification.
//!
//! Given the offset of a field name, decides how the field is used at that
//! point: read, assigned with `=`, updated in place, or called. The
//! encapsulate-field rewrite needs this to pick between a getter and a setter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexer::{last_command_separator, lex};
use crate::processor::{process_tokens, DirectiveScope, Feed, TokenProcessor};
use crate::scanner::{BlockConsumer, Skip};
use crate::token::{Span, Token, TokenKind};

/// How a field is used at one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessKind {
    /// The value is only read.
    Read,
    /// Simple assignment; `value` is the trimmed right-hand side.
    Write { value: Span },
    /// Compound assignment, `++` or `--`.
    Update,
    /// The field is invoked, e.g. a function pointer member.
    Call,
}

/// One classified field reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAccess {
    /// The field name token.
    pub reference: Span,
    #[serde(flatten)]
    pub kind: AccessKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeforeField,
    AfterField,
    Value,
    End,
}

/// [`TokenProcessor`] classifying the access at `reference_start`.
pub struct FieldAccessScanner<'a> {
    source: &'a str,
    reference_start: usize,
    state: State,
    block: Option<BlockConsumer>,
    scope: DirectiveScope,
    /// Last significant token before the member chain leading to the field.
    before_chain: Option<TokenKind>,
    reference: Option<Span>,
    value_start: usize,
    value_end: usize,
    kind: Option<AccessKind>,
}

impl<'a> FieldAccessScanner<'a> {
    pub fn new(source: &'a str, reference_start: usize) -> Self {
        FieldAccessScanner {
            source,
            reference_start,
            state: State::BeforeField,
            block: None,
            scope: DirectiveScope::default(),
            before_chain: None,
            reference: None,
            value_start: reference_start,
            value_end: reference_start,
            kind: None,
        }
    }

    /// The classified access, or `None` when the reference was never reached.
    pub fn into_access(self) -> Option<FieldAccess> {
        let reference = self.reference?;
        Some(FieldAccess {
            reference,
            kind: self.kind.unwrap_or(AccessKind::Read),
        })
    }

    fn finish(&mut self, kind: AccessKind) {
        self.kind = Some(kind);
        self.state = State::End;
    }

    fn is_chain_link(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Ident => true,
            TokenKind::Other => matches!(
                self.source.get(token.start()..token.end()),
                Some("." | "->" | "::")
            ),
            _ => false,
        }
    }

    fn before_field(&mut self, token: &Token) {
        if token.start() < self.reference_start {
            if !token.kind.is_trivia() && !self.is_chain_link(token) {
                self.before_chain = Some(token.kind);
            }
            return;
        }

        self.reference = Some(token.span);
        if matches!(
            self.before_chain,
            Some(TokenKind::Increment | TokenKind::Decrement)
        ) {
            self.finish(AccessKind::Update);
        } else {
            self.state = State::AfterField;
        }
    }

    fn after_field(&mut self, token: &Token) {
        match token.kind {
            kind if kind.is_trivia() => {}
            TokenKind::Assign => {
                self.state = State::Value;
                self.value_start = token.end();
                self.value_end = token.end();
            }
            TokenKind::CompoundAssign | TokenKind::Increment | TokenKind::Decrement => {
                self.finish(AccessKind::Update)
            }
            TokenKind::LParen => self.finish(AccessKind::Call),
            _ => self.finish(AccessKind::Read),
        }
    }

    fn value(&mut self, token: &Token) {
        match token.kind {
            TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::RParen
            | TokenKind::RBrace
            | TokenKind::RBracket => {
                self.value_end = token.start();
                self.finish_write();
            }
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                self.block = BlockConsumer::for_opener(token.kind);
                self.value_end = token.end();
            }
            _ => self.value_end = token.end(),
        }
    }

    /// Settle the classification when no terminator was seen.
    fn finish_open(&mut self) {
        match self.state {
            State::AfterField => self.finish(AccessKind::Read),
            State::Value => self.finish_write(),
            State::BeforeField | State::End => {}
        }
    }

    fn finish_write(&mut self) {
        let raw = Span::new(self.value_start, self.value_end.max(self.value_start));
        let value = match self.source.get(raw.start..raw.end) {
            Some(text) => {
                let leading = text.len() - text.trim_start().len();
                let trailing = text.len() - text.trim_end().len();
                if leading == text.len() {
                    Span::point(raw.start)
                } else {
                    Span::new(raw.start + leading, raw.end - trailing)
                }
            }
            None => {
                debug!(span = %raw, "assigned value unreadable");
                raw
            }
        };
        self.finish(AccessKind::Write { value });
    }
}

impl TokenProcessor for FieldAccessScanner<'_> {
    fn token(&mut self, token: &Token) -> bool {
        match self.scope.feed(token) {
            Feed::Descend => return true,
            Feed::Skip => return false,
            Feed::Leave => {
                self.finish_open();
                return false;
            }
            Feed::Process => {}
        }

        if let Some(block) = self.block.as_mut() {
            if block.consume(token.kind) != Skip::Inside {
                self.block = None;
            }
            if self.state == State::Value {
                self.value_end = token.end();
            }
            return false;
        }

        match self.state {
            State::BeforeField => self.before_field(token),
            State::AfterField => self.after_field(token),
            State::Value => self.value(token),
            State::End => {}
        }
        false
    }

    fn is_stopped(&self) -> bool {
        self.state == State::End
    }

    fn end(&mut self) {
        self.finish_open();
    }
}

/// Classify the access to the field whose name starts at `reference_start`.
pub fn scan_field_access(
    tokens: &[Token],
    source: &str,
    reference_start: usize,
) -> Option<FieldAccess> {
    let from = last_command_separator(tokens, reference_start);
    let mut scanner = FieldAccessScanner::new(source, reference_start);
    process_tokens(&mut scanner, tokens, source, from);
    scanner.into_access()
}

/// Lex `source` and classify the access at `reference_start`.
pub fn scan_field_access_source(source: &str, reference_start: usize) -> Option<FieldAccess> {
    scan_field_access(&lex(source), source, reference_start)
}
