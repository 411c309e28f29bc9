//! C/C++ lexer producing [`Token`]s with byte spans.
//!
//! The lexer only distinguishes what the scanners need. Preprocessor
//! directives are returned as a single [`TokenKind::Directive`] token covering
//! the whole logical line; [`lex_embedded`] re-lexes a directive's body when a
//! scan starts inside one. Lexing never fails: unrecognized bytes become
//! [`TokenKind::Other`].

use logos::Logos;

use crate::token::{Token, TokenKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawToken {
    #[regex(r"[ \t\r\n\x0B\x0C]+")]
    Whitespace,

    #[regex(r"\\\r?\n")]
    LineContinuation,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLit,

    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLit,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Digit separators (`1'000'000`) stay inside the literal.
    #[regex(r"[0-9]([0-9A-Za-z_.]|'[0-9A-Za-z])*")]
    Number,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token(">>")]
    Shr,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("#")]
    Hash,
    #[token("=")]
    Assign,

    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    CompoundAssign,

    #[token("++")]
    Increment,
    #[token("--")]
    Decrement,

    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("<=>")]
    #[token("<<")]
    #[token("&&")]
    #[token("||")]
    #[token("->")]
    #[token("->*")]
    #[token(".*")]
    #[token("::")]
    #[token("...")]
    #[token("##")]
    Operator,

    #[regex(r"[-+*/%&|^!~?:.@$\\]")]
    Punct,
}

/// Skip to the end of a block comment; an unterminated comment runs to end of input.
fn block_comment(lex: &mut logos::Lexer<RawToken>) -> bool {
    let remainder = lex.remainder();
    let len = remainder
        .find("*/")
        .map(|i| i + 2)
        .unwrap_or(remainder.len());
    lex.bump(len);
    true
}

impl RawToken {
    fn kind(self) -> TokenKind {
        match self {
            RawToken::Whitespace | RawToken::LineContinuation => TokenKind::Whitespace,
            RawToken::LineComment | RawToken::BlockComment => TokenKind::Comment,
            RawToken::Ident => TokenKind::Ident,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::Lt => TokenKind::Lt,
            RawToken::Gt => TokenKind::Gt,
            RawToken::Shr => TokenKind::Shr,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Assign => TokenKind::Assign,
            RawToken::CompoundAssign => TokenKind::CompoundAssign,
            RawToken::Increment => TokenKind::Increment,
            RawToken::Decrement => TokenKind::Decrement,
            RawToken::StringLit
            | RawToken::CharLit
            | RawToken::Number
            | RawToken::Hash
            | RawToken::Operator
            | RawToken::Punct => TokenKind::Other,
        }
    }
}

/// Lex a whole source buffer.
pub fn lex(source: &str) -> Vec<Token> {
    lex_range(source, 0, source.len(), true)
}

/// Lex the body of a directive token: everything after `#name`.
///
/// Offsets are relative to `source`, so embedded tokens can be fed to the
/// same processor as top-level ones. Returns an empty list for anything that
/// is not a readable directive.
pub fn lex_embedded(directive: &Token, source: &str) -> Vec<Token> {
    if directive.kind != TokenKind::Directive {
        return Vec::new();
    }
    let Some(text) = source.get(directive.start()..directive.end()) else {
        return Vec::new();
    };

    // '#', optional blanks, directive name
    let after_hash = text
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let name_len = text[after_hash..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len() - after_hash);
    let body_start = directive.start() + after_hash + name_len;

    lex_range(source, body_start, directive.end(), false)
}

fn lex_range(source: &str, from: usize, to: usize, directives: bool) -> Vec<Token> {
    let Some(text) = source.get(from..to) else {
        return Vec::new();
    };

    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(text);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let start = from + span.start;
        let end = from + span.end;

        match result {
            Ok(RawToken::Hash) if directives && starts_line(source, start) => {
                let directive_end = directive_end(source, start).min(to);
                tokens.push(Token::new(TokenKind::Directive, start, directive_end));
                lexer.bump(directive_end - end);
            }
            Ok(raw) => tokens.push(Token::new(raw.kind(), start, end)),
            Err(()) => tokens.push(Token::new(TokenKind::Other, start, end)),
        }
    }

    tokens
}

/// Whether only horizontal whitespace precedes `offset` on its line.
fn starts_line(source: &str, offset: usize) -> bool {
    source[..offset]
        .chars()
        .rev()
        .take_while(|c| *c != '\n')
        .all(|c| c == ' ' || c == '\t')
}

/// End of the logical line starting at `offset`, following `\` continuations.
/// The terminating newline is not included.
fn directive_end(source: &str, offset: usize) -> usize {
    let bytes = source.as_bytes();
    let mut i = offset;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i;
            if j > offset && bytes[j - 1] == b'\r' {
                j -= 1;
            }
            if j > offset && bytes[j - 1] == b'\\' {
                i += 1;
                continue;
            }
            return if bytes[i - 1] == b'\r' { i - 1 } else { i };
        }
        i += 1;
    }
    bytes.len()
}

/// Start offset of the statement containing `offset`.
///
/// If `offset` falls inside a directive, the directive's start is returned so
/// a processor sees the directive as its first token. Otherwise the result is
/// one past the last `;`, `{`, `}` or directive that ends at or before
/// `offset`, or 0.
pub fn last_command_separator(tokens: &[Token], offset: usize) -> usize {
    let mut separator = 0;
    for token in tokens {
        if token.start() >= offset {
            break;
        }
        match token.kind {
            TokenKind::Directive if offset < token.end() => {
                return token.start();
            }
            TokenKind::Directive
            | TokenKind::Semicolon
            | TokenKind::LBrace
            | TokenKind::RBrace => {
                separator = token.end();
            }
            _ => {}
        }
    }
    separator
}

/// The token whose span contains `offset`, if any.
pub fn token_at(tokens: &[Token], offset: usize) -> Option<&Token> {
    let index = tokens.partition_point(|t| t.end() <= offset);
    tokens.get(index).filter(|t| t.start() <= offset)
}

/// The identifier token containing `offset`.
///
/// An offset inside a directive resolves against the directive body, so
/// macro definitions can be targeted like ordinary code.
pub fn identifier_at(tokens: &[Token], source: &str, offset: usize) -> Option<Token> {
    let mut token = *token_at(tokens, offset)?;
    if token.kind == TokenKind::Directive {
        token = *token_at(&lex_embedded(&token, source), offset)?;
    }
    (token.kind == TokenKind::Ident).then_some(token)
}
