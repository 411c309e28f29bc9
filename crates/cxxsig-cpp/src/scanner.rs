//! Call-site parameter scanner.
//!
//! Given the offset of a function name, walks forward to the parenthesized
//! list that follows it and records the exact span of every top-level
//! argument (or parameter, for declarations). Nested `()`, `{}` and `[]` are
//! opaque, template arguments between the name and the list are skipped, and
//! preprocessor directives never split an argument.
//!
//! The scanner never fails. Anything it cannot make sense of produces an
//! invalid [`CallSiteInfo`] (see [`CallSiteInfo::is_valid`]), which callers
//! must not use to rewrite source.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lexer::{last_command_separator, lex};
use crate::processor::{process_tokens, DirectiveScope, Feed, TokenProcessor};
use crate::token::{SourceText, Span, Token, TokenKind};

// ============================================================================
// Result Types
// ============================================================================

/// One raw, unparsed argument expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpan {
    /// Source range of the argument. For the first argument the start is
    /// advanced past leading whitespace.
    pub span: Span,
    /// Source text of `span`; empty when the buffer could not be read.
    pub text: String,
}

/// The argument list found after a function reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSiteInfo {
    /// Offset the scan was asked to start from (the name token).
    pub reference_start: usize,
    /// Offset of the opening `(`.
    pub argument_list_start: usize,
    /// One past the closing `)`.
    pub argument_list_end: usize,
    /// Source text of the whole list, parentheses included.
    pub original_text: String,
    /// Top-level arguments in source order.
    pub arguments: Vec<ArgumentSpan>,
}

impl CallSiteInfo {
    fn new(reference_start: usize) -> Self {
        CallSiteInfo {
            reference_start,
            argument_list_start: reference_start,
            argument_list_end: reference_start,
            original_text: String::new(),
            arguments: Vec::new(),
        }
    }

    /// True only when the closing `)` of the list was reached.
    pub fn is_valid(&self) -> bool {
        self.argument_list_end > self.argument_list_start
    }

    /// Range of the whole list, parentheses included.
    pub fn argument_list_span(&self) -> Span {
        Span::new(self.argument_list_start, self.argument_list_end)
    }

    pub fn argument_count(&self) -> usize {
        self.arguments.len()
    }

    pub fn argument(&self, index: usize) -> Option<&ArgumentSpan> {
        self.arguments.get(index)
    }
}

// ============================================================================
// Nested Block Skipping
// ============================================================================

/// Outcome of feeding one token to a [`BlockConsumer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Skip {
    /// Still inside the block.
    Inside,
    /// The matching closer was consumed.
    Closed,
    /// The block cannot continue (a statement boundary inside `<...>`).
    Broken,
}

/// Consumes tokens up to and including the closer matching an opener that
/// was already consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockConsumer {
    opener: TokenKind,
    closer: TokenKind,
    depth: usize,
}

impl BlockConsumer {
    pub(crate) fn new(opener: TokenKind, closer: TokenKind) -> Self {
        BlockConsumer {
            opener,
            closer,
            depth: 1,
        }
    }

    /// Template argument list: `<` ... `>`.
    pub(crate) fn angle() -> Self {
        BlockConsumer::new(TokenKind::Lt, TokenKind::Gt)
    }

    /// Consumer for a bracket opener, `None` for anything else.
    pub(crate) fn for_opener(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::LParen => Some(BlockConsumer::new(TokenKind::LParen, TokenKind::RParen)),
            TokenKind::LBrace => Some(BlockConsumer::new(TokenKind::LBrace, TokenKind::RBrace)),
            TokenKind::LBracket => Some(BlockConsumer::new(
                TokenKind::LBracket,
                TokenKind::RBracket,
            )),
            _ => None,
        }
    }

    pub(crate) fn consume(&mut self, kind: TokenKind) -> Skip {
        let angle = self.opener == TokenKind::Lt;
        if kind == self.opener {
            self.depth += 1;
        } else if kind == self.closer {
            self.depth -= 1;
        } else if angle && kind == TokenKind::Shr {
            self.depth = self.depth.saturating_sub(2);
        } else if angle
            && matches!(
                kind,
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace
            )
        {
            return Skip::Broken;
        }

        if self.depth == 0 {
            Skip::Closed
        } else {
            Skip::Inside
        }
    }
}

// ============================================================================
// Scanner
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the opening `(`.
    Start,
    InParams,
    End,
}

/// Progress through the function name while in [`State::Start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Name {
    /// The reference token has not been reached.
    Pending,
    /// An ordinary name, possibly followed by template arguments.
    Plain,
    /// `operator`, symbol not seen yet.
    Operator,
    /// `operator(`, waiting for the `)` of `operator()`.
    CallOperator,
    /// A complete operator name such as `operator+` or `operator bool`.
    OperatorSymbol,
}

/// [`TokenProcessor`] that extracts the argument list after a reference.
pub struct ParamScanner<'a, S: SourceText + ?Sized> {
    source: &'a S,
    state: State,
    name: Name,
    block: Option<BlockConsumer>,
    scope: DirectiveScope,
    argument_start: usize,
    info: CallSiteInfo,
}

impl<'a, S: SourceText + ?Sized> ParamScanner<'a, S> {
    pub fn new(source: &'a S, reference_start: usize) -> Self {
        ParamScanner {
            source,
            state: State::Start,
            name: Name::Pending,
            block: None,
            scope: DirectiveScope::default(),
            argument_start: reference_start,
            info: CallSiteInfo::new(reference_start),
        }
    }

    /// The result so far. Complete once [`TokenProcessor::end`] has run.
    pub fn into_info(self) -> CallSiteInfo {
        self.info
    }

    fn stop(&mut self, token: &Token, reason: &'static str) {
        debug!(
            reference = self.info.reference_start,
            offset = token.start(),
            kind = ?token.kind,
            reason,
            "no argument list after reference"
        );
        self.state = State::End;
    }

    /// Recognize the reference token: the one containing `reference_start`,
    /// or an identifier ending exactly there.
    fn find_reference(&mut self, token: &Token) {
        let reference = self.info.reference_start;
        let ends_at_reference = token.end() == reference && token.kind == TokenKind::Ident;
        if token.end() <= reference && !ends_at_reference {
            return;
        }
        if token.start() > reference || token.kind.is_trivia() {
            self.stop(token, "reference is not on a token");
            return;
        }

        self.name = if token.kind == TokenKind::Ident
            && self.source.slice(token.span) == Some("operator")
        {
            Name::Operator
        } else {
            Name::Plain
        };
    }

    fn before_list(&mut self, token: &Token) {
        if self.name == Name::Pending {
            self.find_reference(token);
            return;
        }

        match (self.name, token.kind) {
            (_, kind) if kind.is_trivia() => {}
            (Name::Operator, TokenKind::LParen) => self.name = Name::CallOperator,
            (Name::CallOperator, TokenKind::RParen) => self.name = Name::OperatorSymbol,
            (Name::CallOperator, _) => self.stop(token, "malformed operator()"),
            (Name::Operator, TokenKind::Semicolon | TokenKind::RParen | TokenKind::RBrace) => {
                self.stop(token, "operator without symbol")
            }
            (Name::Operator, _) => self.name = Name::OperatorSymbol,
            (_, TokenKind::LParen) => {
                self.state = State::InParams;
                self.info.argument_list_start = token.start();
                self.info.argument_list_end = token.start();
                self.argument_start = token.end();
            }
            (Name::Plain, TokenKind::Lt) => self.block = Some(BlockConsumer::angle()),
            (Name::Plain, TokenKind::Comma) => self.stop(token, "reference is a list item"),
            (_, TokenKind::Semicolon) => self.stop(token, "statement ended"),
            (_, TokenKind::RParen | TokenKind::RBrace) => self.stop(token, "unmatched closer"),
            _ => {}
        }
    }

    fn in_params(&mut self, token: &Token) {
        match token.kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => {
                self.block = BlockConsumer::for_opener(token.kind);
            }
            TokenKind::Comma => {
                self.close_argument(token.start());
                self.argument_start = token.end();
            }
            TokenKind::RParen => {
                self.close_argument(token.start());
                self.info.argument_list_end = token.end();
                self.state = State::End;
            }
            TokenKind::Semicolon => {
                self.close_argument(token.start());
                debug!(
                    reference = self.info.reference_start,
                    offset = token.start(),
                    "statement ended inside argument list"
                );
                self.state = State::End;
            }
            _ => {}
        }
    }

    fn close_argument(&mut self, end: usize) {
        let span = Span::new(self.argument_start.min(end), end);

        let text = if span.is_empty() {
            ""
        } else {
            match self.source.slice(span) {
                Some(text) => text,
                None => {
                    debug!(%span, "argument text unreadable");
                    self.info.arguments.push(ArgumentSpan {
                        span,
                        text: String::new(),
                    });
                    return;
                }
            }
        };

        if self.info.arguments.is_empty() {
            let trimmed = text.trim_start();
            if trimmed.trim_end().is_empty() {
                return;
            }
            let start = span.start + (text.len() - trimmed.len());
            self.info.arguments.push(ArgumentSpan {
                span: Span::new(start, end),
                text: trimmed.to_string(),
            });
        } else {
            self.info.arguments.push(ArgumentSpan {
                span,
                text: text.to_string(),
            });
        }
    }
}

impl<S: SourceText + ?Sized> TokenProcessor for ParamScanner<'_, S> {
    fn token(&mut self, token: &Token) -> bool {
        match self.scope.feed(token) {
            Feed::Descend => return true,
            Feed::Skip => return false,
            Feed::Leave => {
                self.stop(token, "left the directive");
                return false;
            }
            Feed::Process => {}
        }

        if let Some(block) = self.block.as_mut() {
            match block.consume(token.kind) {
                Skip::Inside => {}
                Skip::Closed => self.block = None,
                Skip::Broken => {
                    self.block = None;
                    self.stop(token, "unterminated template argument list");
                }
            }
            return false;
        }

        match self.state {
            State::Start => self.before_list(token),
            State::InParams => self.in_params(token),
            State::End => {}
        }
        false
    }

    fn is_stopped(&self) -> bool {
        self.state == State::End
    }

    fn end(&mut self) {
        if self.info.argument_list_end == self.info.argument_list_start {
            return;
        }
        match self.source.slice(self.info.argument_list_span()) {
            Some(text) => self.info.original_text = text.to_string(),
            None => debug!(
                span = %self.info.argument_list_span(),
                "argument list text unreadable"
            ),
        }
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// Scan an explicit token slice for the argument list after `reference_start`.
///
/// Tokens are fed as given; directive tokens are never expanded. When the
/// first token is a directive the following tokens are taken to be its body.
pub fn scan_call_site<S>(tokens: &[Token], source: &S, reference_start: usize) -> CallSiteInfo
where
    S: SourceText + ?Sized,
{
    let mut scanner = ParamScanner::new(source, reference_start);
    for token in tokens {
        if scanner.is_stopped() {
            break;
        }
        scanner.token(token);
    }
    scanner.end();
    scanner.into_info()
}

/// Scan already-lexed `source`, starting at the statement containing
/// `reference_start` and descending into a directive when the reference
/// lies inside one.
pub fn scan_tokens(tokens: &[Token], source: &str, reference_start: usize) -> CallSiteInfo {
    let from = last_command_separator(tokens, reference_start);
    let mut scanner = ParamScanner::new(source, reference_start);
    process_tokens(&mut scanner, tokens, source, from);
    scanner.into_info()
}

/// Lex `source` and scan it. See [`scan_tokens`].
pub fn scan_source(source: &str, reference_start: usize) -> CallSiteInfo {
    let tokens = lex(source);
    scan_tokens(&tokens, source, reference_start)
}
