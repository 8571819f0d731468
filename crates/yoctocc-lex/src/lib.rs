//! yoctocc-lex - Lexical analysis.
//!
//! Transforms source text into a flat token stream terminated by an EOF
//! sentinel. The scanner is a single-cursor dispatch over the first
//! character of each token: whitespace and comments are skipped, then
//! numbers, string literals (with escape decoding), identifiers, and
//! punctuators are recognized in that order. A second pass over the
//! finished stream promotes identifiers that match the keyword table to
//! keyword tokens.

mod cursor;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use lexer::tokenize;
pub use token::{Token, TokenKind, KEYWORDS};
