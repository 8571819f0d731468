//! Token model.

use yoctocc_util::Span;

/// Reserved words of the source language.
///
/// Identifiers whose lexeme appears here are promoted to
/// [`TokenKind::Keyword`] by the re-tagging pass after scanning.
pub const KEYWORDS: &[&str] = &[
    "return", "if", "else", "for", "while", "int", "char", "short", "long", "sizeof", "struct",
    "union",
];

/// Lexical class of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier: `[A-Za-z_][A-Za-z0-9_]*`, not a keyword.
    Ident,
    /// Punctuator: one of the two-character operators or any single
    /// punctuation character.
    Punct,
    /// Reserved word.
    Keyword,
    /// String literal; the decoded body lives in [`Token::bytes`].
    Str,
    /// Decimal integer literal; the value lives in [`Token::value`].
    Num,
    /// End-of-input sentinel, always the last token of a stream.
    Eof,
}

/// A single token.
///
/// Every token records the raw source text it was scanned from and a
/// [`Span`] whose `start` is the byte offset of its first character.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text (for string literals, including the quotes).
    pub lexeme: String,
    /// Parsed value of a `Num` token; 0 otherwise.
    pub value: i64,
    /// Decoded body of a `Str` token, escapes resolved, without the
    /// terminating NUL; empty otherwise.
    pub bytes: Vec<u8>,
    pub span: Span,
}

impl Token {
    /// True if this token's text is exactly `s`.
    ///
    /// String literals never match: their lexeme is the quoted source
    /// form, and treating body text as syntax would be a bug anyway.
    pub fn is(&self, s: &str) -> bool {
        self.kind != TokenKind::Str && self.lexeme == s
    }
}

/// True if `s` is a reserved word.
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}
