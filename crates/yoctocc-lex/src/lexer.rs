//! The scanner.
//!
//! [`tokenize`] runs a single forward pass over the source: skip
//! whitespace and comments, then dispatch on the first character of the
//! next token. Identifiers are re-tagged as keywords in a second pass
//! over the finished stream, matching the keyword table in
//! [`crate::token`].

use yoctocc_util::{Diagnostic, Result, Span};

use crate::cursor::Cursor;
use crate::token::{is_keyword, Token, TokenKind};

/// Tokenizes `src` into a stream ending in an EOF sentinel.
///
/// # Errors
///
/// Unknown characters, unterminated block comments, and unclosed string
/// literals are fatal.
///
/// # Example
///
/// ```
/// use yoctocc_lex::{tokenize, TokenKind};
///
/// let tokens = tokenize("return 42;").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Keyword);
/// assert_eq!(tokens[1].value, 42);
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Lexer::new(src).run()?;

    for token in &mut tokens {
        if token.kind == TokenKind::Ident && is_keyword(&token.lexeme) {
            token.kind = TokenKind::Keyword;
        }
    }

    Ok(tokens)
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            cursor: Cursor::new(src),
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            if self.cursor.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            value: 0,
            bytes: Vec::new(),
            span: self.span_here(),
        });

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token> {
        let start = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();

        match self.cursor.current() {
            b'0'..=b'9' => self.lex_number(start, line, column),
            b'"' => self.lex_string(start, line, column),
            b if b.is_ascii_alphabetic() || b == b'_' => self.lex_identifier(start, line, column),
            b if b.is_ascii_punctuation() => self.lex_punctuator(start, line, column),
            b => Err(self.error_here(format!("Unexpected character '{}'", b as char))),
        }
    }

    fn lex_number(&mut self, start: usize, line: u32, column: u32) -> Result<Token> {
        while self.cursor.current().is_ascii_digit() {
            self.cursor.advance();
        }

        let lexeme = self.cursor.slice_from(start);
        let value = lexeme.parse::<i64>().map_err(|_| {
            Diagnostic::new(
                "number literal out of range",
                Span::new(start, self.cursor.position(), line, column),
            )
        })?;

        Ok(Token {
            kind: TokenKind::Num,
            lexeme: lexeme.to_string(),
            value,
            bytes: Vec::new(),
            span: Span::new(start, self.cursor.position(), line, column),
        })
    }

    fn lex_identifier(&mut self, start: usize, line: u32, column: u32) -> Result<Token> {
        while is_ident_continue(self.cursor.current()) {
            self.cursor.advance();
        }

        Ok(Token {
            kind: TokenKind::Ident,
            lexeme: self.cursor.slice_from(start).to_string(),
            value: 0,
            bytes: Vec::new(),
            span: Span::new(start, self.cursor.position(), line, column),
        })
    }

    fn lex_punctuator(&mut self, start: usize, line: u32, column: u32) -> Result<Token> {
        const TWO_CHAR: &[&[u8; 2]] = &[b"==", b"!=", b"<=", b">=", b"->"];

        let pair = [self.cursor.current(), self.cursor.peek(1)];
        let len = if TWO_CHAR.iter().any(|p| **p == pair) {
            2
        } else {
            1
        };
        for _ in 0..len {
            self.cursor.advance();
        }

        Ok(Token {
            kind: TokenKind::Punct,
            lexeme: self.cursor.slice_from(start).to_string(),
            value: 0,
            bytes: Vec::new(),
            span: Span::new(start, self.cursor.position(), line, column),
        })
    }

    fn lex_string(&mut self, start: usize, line: u32, column: u32) -> Result<Token> {
        self.cursor.advance(); // opening quote

        let mut bytes = Vec::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(self.error_here("unclosed string literal".to_string()));
            }
            match self.cursor.current() {
                b'"' => {
                    self.cursor.advance();
                    break;
                }
                b'\n' | b'\r' | 0 => {
                    return Err(self.error_here("unclosed string literal".to_string()));
                }
                b'\\' => {
                    self.cursor.advance();
                    bytes.push(self.read_escape()?);
                }
                b => {
                    bytes.push(b);
                    self.cursor.advance();
                }
            }
        }

        Ok(Token {
            kind: TokenKind::Str,
            lexeme: self.cursor.slice_from(start).to_string(),
            value: 0,
            bytes,
            span: Span::new(start, self.cursor.position(), line, column),
        })
    }

    /// Decodes one escape sequence; the cursor sits on the character
    /// after the backslash.
    fn read_escape(&mut self) -> Result<u8> {
        match self.cursor.current() {
            b'x' => {
                self.cursor.advance();
                if !self.cursor.current().is_ascii_hexdigit() {
                    return Err(self.error_here("invalid hex escape sequence".to_string()));
                }
                let mut value: u32 = 0;
                while self.cursor.current().is_ascii_hexdigit() {
                    let digit = (self.cursor.current() as char).to_digit(16).unwrap();
                    value = value.wrapping_mul(16).wrapping_add(digit);
                    self.cursor.advance();
                }
                Ok(value as u8)
            }
            b @ b'0'..=b'7' => {
                // up to three octal digits
                let mut value = u32::from(b - b'0');
                self.cursor.advance();
                for _ in 0..2 {
                    let b = self.cursor.current();
                    if !(b'0'..=b'7').contains(&b) {
                        break;
                    }
                    value = value * 8 + u32::from(b - b'0');
                    self.cursor.advance();
                }
                Ok(value as u8)
            }
            b => {
                self.cursor.advance();
                Ok(match b {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    b'v' => 0x0B,
                    b'e' => 0x1B,
                    _ => b,
                })
            }
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | b'\n' | b'\r' => self.cursor.advance(),
                b'/' if self.cursor.peek(1) == b'/' => {
                    while !self.cursor.is_at_end() && self.cursor.current() != b'\n' {
                        self.cursor.advance();
                    }
                }
                b'/' if self.cursor.peek(1) == b'*' => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        let start = self.span_here();
        self.cursor.advance();
        self.cursor.advance();
        loop {
            if self.cursor.is_at_end() {
                return Err(Diagnostic::new("unterminated block comment", start));
            }
            if self.cursor.current() == b'*' && self.cursor.peek(1) == b'/' {
                self.cursor.advance();
                self.cursor.advance();
                return Ok(());
            }
            self.cursor.advance();
        }
    }

    fn span_here(&self) -> Span {
        Span::new(
            self.cursor.position(),
            self.cursor.position(),
            self.cursor.line(),
            self.cursor.column(),
        )
    }

    fn error_here(&self, message: String) -> Diagnostic {
        Diagnostic::new(message, self.span_here())
    }
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::KEYWORDS;
    use proptest::prelude::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().iter().map(|t| t.kind).collect()
    }

    fn lexemes(src: &str) -> Vec<String> {
        tokenize(src)
            .unwrap()
            .iter()
            .map(|t| t.lexeme.clone())
            .collect()
    }

    #[test]
    fn test_empty_source_is_just_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_basic_stream() {
        assert_eq!(
            kinds("int main() { return 42; }"),
            vec![
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::Punct,
                TokenKind::Punct,
                TokenKind::Punct,
                TokenKind::Keyword,
                TokenKind::Num,
                TokenKind::Punct,
                TokenKind::Punct,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_number_value() {
        let tokens = tokenize("123").unwrap();
        assert_eq!(tokens[0].value, 123);
        assert_eq!(tokens[0].lexeme, "123");
    }

    #[test]
    fn test_number_out_of_range() {
        let err = tokenize("99999999999999999999999").unwrap_err();
        assert_eq!(err.message, "number literal out of range");
    }

    #[test]
    fn test_byte_offsets_point_at_first_character() {
        let src = "int a = 10;";
        let tokens = tokenize(src).unwrap();
        for token in tokens.iter().filter(|t| t.kind != TokenKind::Eof) {
            assert_eq!(
                &src[token.span.start..token.span.start + token.lexeme.len()],
                token.lexeme
            );
        }
    }

    #[test]
    fn test_line_tracking() {
        let tokens = tokenize("a\nb\n\nc").unwrap();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[2].span.line, 4);
    }

    #[test]
    fn test_all_keywords_retagged() {
        for kw in KEYWORDS {
            let tokens = tokenize(kw).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::Keyword, "{kw}");
        }
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        let tokens = tokenize("returned intx forX").unwrap();
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ident));
    }

    #[test]
    fn test_two_char_punctuators() {
        assert_eq!(
            lexemes("== != <= >= ->")[..5],
            ["==", "!=", "<=", ">=", "->"]
        );
    }

    #[test]
    fn test_spaced_operators_stay_separate() {
        assert_eq!(lexemes("< =")[..2], ["<", "="]);
    }

    #[test]
    fn test_greedy_punctuator_split() {
        // "===" is "==" then "="
        assert_eq!(lexemes("===")[..2], ["==", "="]);
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(kinds("1 // comment 2\n3").len(), 3); // 1, 3, eof
    }

    #[test]
    fn test_block_comment_skipped() {
        let tokens = tokenize("1 /* x ** / y */ 2").unwrap();
        assert_eq!(tokens[0].value, 1);
        assert_eq!(tokens[1].value, 2);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("1 /* never closed").unwrap_err();
        assert_eq!(err.message, "unterminated block comment");
    }

    #[test]
    fn test_string_literal_plain() {
        let tokens = tokenize("\"abc\"").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].bytes, b"abc");
        assert_eq!(tokens[0].lexeme, "\"abc\"");
        assert_eq!(tokens[0].span.start, 0);
    }

    #[test]
    fn test_string_escape_decoding() {
        // \n \t \x41 \101 -> 0x0A 0x09 0x41 0x41
        let tokens = tokenize(r#""\n\t\x41\101""#).unwrap();
        assert_eq!(tokens[0].bytes, vec![0x0A, 0x09, 0x41, 0x41]);
    }

    #[test]
    fn test_string_escape_misc() {
        let tokens = tokenize(r#""\a\b\f\v\e\\\'\"\?""#).unwrap();
        assert_eq!(
            tokens[0].bytes,
            vec![0x07, 0x08, 0x0C, 0x0B, 0x1B, b'\\', b'\'', b'"', b'?']
        );
    }

    #[test]
    fn test_octal_escape_stops_after_three_digits() {
        let tokens = tokenize(r#""\1234""#).unwrap();
        assert_eq!(tokens[0].bytes, vec![0o123, b'4']);
    }

    #[test]
    fn test_hex_escape_requires_digit() {
        let err = tokenize(r#""\xg""#).unwrap_err();
        assert_eq!(err.message, "invalid hex escape sequence");
    }

    #[test]
    fn test_empty_string_literal() {
        let tokens = tokenize("\"\"").unwrap();
        assert_eq!(tokens[0].bytes.len(), 0);
    }

    #[test]
    fn test_unclosed_string_at_eof() {
        let err = tokenize("\"abc").unwrap_err();
        assert_eq!(err.message, "unclosed string literal");
    }

    #[test]
    fn test_newline_inside_string_is_an_error() {
        let err = tokenize("\"ab\ncd\"").unwrap_err();
        assert_eq!(err.message, "unclosed string literal");
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("int \x01;").unwrap_err();
        assert!(err.message.starts_with("Unexpected character"));
        assert_eq!(err.span.start, 4);
    }

    proptest! {
        #[test]
        fn prop_identifier_streams_round_trip(
            idents in proptest::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,8}", 1..8)
        ) {
            let src = idents.join(" ");
            let tokens = tokenize(&src).unwrap();
            prop_assert_eq!(tokens.len(), idents.len() + 1);
            for (token, ident) in tokens.iter().zip(&idents) {
                prop_assert_eq!(&token.lexeme, ident);
                prop_assert_eq!(&src[token.span.start..token.span.end], ident.as_str());
            }
        }

        #[test]
        fn prop_number_values_parse(values in proptest::collection::vec(0u32..1_000_000, 1..8)) {
            let src = values
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            let tokens = tokenize(&src).unwrap();
            for (token, value) in tokens.iter().zip(&values) {
                prop_assert_eq!(token.value, i64::from(*value));
            }
        }
    }
}
