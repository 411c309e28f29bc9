//! Streaming token processors.
//!
//! A [`TokenProcessor`] consumes tokens one at a time and decides when it is
//! done. [`process_tokens`] drives a processor over a lexed buffer, descending
//! into directive bodies when the processor asks for it.

use tracing::trace;

use crate::lexer::lex_embedded;
use crate::token::{Token, TokenKind};

/// A state machine fed one token at a time.
pub trait TokenProcessor {
    /// Consume a token.
    ///
    /// Returning `true` asks the driver to feed the token's embedded tokens
    /// (the body of a directive) before moving on.
    fn token(&mut self, token: &Token) -> bool;

    /// Whether the processor has finished and wants no more tokens.
    fn is_stopped(&self) -> bool;

    /// Called exactly once after the last token was fed.
    fn end(&mut self);
}

/// What a processor should do with a token under the directive rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Feed {
    /// The scan starts on this directive; ask the driver for its body.
    Descend,
    /// A directive met while scanning ordinary code.
    Skip,
    Process,
    /// The first token past the directive the scan started in.
    Leave,
}

/// Whether a scan runs inside a directive, decided by the first token fed.
///
/// A scan that starts on a directive only sees that directive's body. A scan
/// that starts on ordinary code passes over every directive it meets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum DirectiveScope {
    #[default]
    Undecided,
    Code,
    Directive {
        end: usize,
    },
}

impl DirectiveScope {
    pub(crate) fn feed(&mut self, token: &Token) -> Feed {
        let is_directive = token.kind == TokenKind::Directive;
        match *self {
            DirectiveScope::Undecided if is_directive => {
                *self = DirectiveScope::Directive { end: token.end() };
                Feed::Descend
            }
            DirectiveScope::Undecided => {
                *self = DirectiveScope::Code;
                Feed::Process
            }
            DirectiveScope::Code if is_directive => Feed::Skip,
            DirectiveScope::Code => Feed::Process,
            DirectiveScope::Directive { end } if token.start() >= end => Feed::Leave,
            DirectiveScope::Directive { .. } => Feed::Process,
        }
    }
}

/// Feed `tokens` starting at byte offset `from` to `processor`.
///
/// Tokens starting before `from` are skipped. Feeding stops as soon as the
/// processor reports it is stopped; `end` is called either way.
pub fn process_tokens<P>(processor: &mut P, tokens: &[Token], source: &str, from: usize)
where
    P: TokenProcessor + ?Sized,
{
    let first = tokens.partition_point(|t| t.start() < from);
    let mut fed = 0usize;

    for token in &tokens[first..] {
        if processor.is_stopped() {
            break;
        }
        fed += 1;
        let descend = processor.token(token);
        if descend && token.kind == TokenKind::Directive {
            for embedded in lex_embedded(token, source) {
                if processor.is_stopped() {
                    break;
                }
                fed += 1;
                processor.token(&embedded);
            }
        }
    }

    trace!(from, fed, "token stream processed");
    processor.end();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    /// Records non-trivia token text; stops after `limit` tokens.
    struct Recorder<'a> {
        source: &'a str,
        seen: Vec<&'a str>,
        limit: usize,
        descend: bool,
        ended: usize,
    }

    impl<'a> Recorder<'a> {
        fn new(source: &'a str, limit: usize, descend: bool) -> Self {
            Recorder {
                source,
                seen: Vec::new(),
                limit,
                descend,
                ended: 0,
            }
        }
    }

    impl TokenProcessor for Recorder<'_> {
        fn token(&mut self, token: &Token) -> bool {
            if !token.kind.is_trivia() {
                self.seen.push(&self.source[token.start()..token.end()]);
            }
            self.descend
        }

        fn is_stopped(&self) -> bool {
            self.seen.len() >= self.limit
        }

        fn end(&mut self) {
            self.ended += 1;
        }
    }

    #[test]
    fn stops_when_processor_stops() {
        let source = "a b c d";
        let tokens = lex(source);
        let mut recorder = Recorder::new(source, 2, false);
        process_tokens(&mut recorder, &tokens, source, 0);
        assert_eq!(recorder.seen, vec!["a", "b"]);
        assert_eq!(recorder.ended, 1);
    }

    #[test]
    fn skips_tokens_before_start() {
        let source = "a; b c";
        let tokens = lex(source);
        let mut recorder = Recorder::new(source, usize::MAX, false);
        process_tokens(&mut recorder, &tokens, source, 2);
        assert_eq!(recorder.seen, vec!["b", "c"]);
    }

    #[test]
    fn descends_into_directive_on_request() {
        let source = "#define F g(1)\n";
        let tokens = lex(source);

        let mut flat = Recorder::new(source, usize::MAX, false);
        process_tokens(&mut flat, &tokens, source, 0);
        assert_eq!(flat.seen, vec!["#define F g(1)"]);

        let mut nested = Recorder::new(source, usize::MAX, true);
        process_tokens(&mut nested, &tokens, source, 0);
        assert_eq!(nested.seen, vec!["#define F g(1)", "F", "g", "(", "1", ")"]);
    }

    #[test]
    fn directive_scope_ends_with_the_directive() {
        let source = "#define F g(1)\nh(2);";
        let tokens = lex(source);
        let mut scope = DirectiveScope::default();
        assert_eq!(scope.feed(&tokens[0]), Feed::Descend);
        for embedded in lex_embedded(&tokens[0], source) {
            assert_eq!(scope.feed(&embedded), Feed::Process);
        }
        assert!(tokens[1..].iter().all(|t| scope.feed(t) == Feed::Leave));
    }

    #[test]
    fn code_scope_skips_directives() {
        let source = "f(a,\n#if X\nb)";
        let tokens = lex(source);
        let mut scope = DirectiveScope::default();
        let feeds: Vec<Feed> = tokens.iter().map(|t| scope.feed(t)).collect();
        assert_eq!(feeds[0], Feed::Process);
        let directive = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Directive)
            .unwrap();
        assert_eq!(feeds[directive], Feed::Skip);
        assert_eq!(feeds.iter().filter(|f| **f == Feed::Skip).count(), 1);
    }

    #[test]
    fn end_called_on_empty_stream() {
        let mut recorder = Recorder::new("", 1, false);
        process_tokens(&mut recorder, &[], "", 0);
        assert_eq!(recorder.ended, 1);
    }
}
