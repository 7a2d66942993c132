//! Lexer for Lux source code.
//!
//! Wraps the logos-generated lexer with scanning for string literal
//! bodies (escape decoding) and block comments.

use logos::Logos;
use memchr::{memchr, memchr3};

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span and raw text.
#[derive(Debug, Clone)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
    /// Decoded contents for string literals (escapes resolved, quotes
    /// stripped); `None` for every other token.
    pub decoded: Option<String>,
}

/// Lux lexer.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    peeked: Option<Option<ParseResult<SpannedToken<'a>>>>,
    /// Offset from the original source (used after restarting the inner
    /// lexer past a string or block comment).
    offset: usize,
}

impl<'a> std::fmt::Debug for Lexer<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer").field("offset", &self.offset).finish()
    }
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::new(source),
            peeked: None,
            offset: 0,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn make_span(&self, start: usize, end: usize) -> Span {
        self.source_map.span(start, end)
    }

    /// Span pointing at the current end of input.
    pub fn eof_span(&self) -> Span {
        self.make_span(self.source.len(), self.source.len())
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Option<&ParseResult<SpannedToken<'a>>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token_internal());
        }
        match &self.peeked {
            Some(inner) => inner.as_ref(),
            None => None,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Option<ParseResult<SpannedToken<'a>>> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }
        self.next_token_internal()
    }

    /// Restart the inner lexer from an absolute byte position.
    fn restart_from(&mut self, pos: usize) {
        self.inner = Token::lexer(&self.source[pos..]);
        self.offset = pos;
    }

    fn next_token_internal(&mut self) -> Option<ParseResult<SpannedToken<'a>>> {
        loop {
            let result = self.inner.next()?;
            let raw = self.inner.span();
            let start = self.offset + raw.start;
            let end = self.offset + raw.end;

            match result {
                Err(()) => {
                    let span = self.make_span(start, end);
                    // Stop producing tokens after a lex error.
                    self.restart_from(self.source.len());
                    return Some(Err(ParseError::LexerError { span }));
                }

                Ok(Token::BlockCommentStart) => match self.scan_block_comment(end) {
                    Ok(comment_end) => {
                        self.restart_from(comment_end);
                        continue;
                    }
                    Err(e) => {
                        self.restart_from(self.source.len());
                        return Some(Err(e));
                    }
                },

                Ok(Token::DoubleQuote) => match self.scan_string(start, end) {
                    Ok((decoded, string_end)) => {
                        self.restart_from(string_end);
                        let span = self.make_span(start, string_end);
                        let text = &self.source[start..string_end];
                        return Some(Ok(SpannedToken {
                            token: Token::DoubleQuote,
                            span,
                            text,
                            decoded: Some(decoded),
                        }));
                    }
                    Err(e) => {
                        self.restart_from(self.source.len());
                        return Some(Err(e));
                    }
                },

                Ok(token) => {
                    let span = self.make_span(start, end);
                    let text = &self.source[start..end];
                    return Some(Ok(SpannedToken {
                        token,
                        span,
                        text,
                        decoded: None,
                    }));
                }
            }
        }
    }

    /// Scan past the body of a `/* ... */` comment. Returns the byte
    /// position just after the closing `*/`.
    fn scan_block_comment(&self, body_start: usize) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut pos = body_start;
        while let Some(found) = memchr(b'*', &bytes[pos..]) {
            let star = pos + found;
            if bytes.get(star + 1) == Some(&b'/') {
                return Ok(star + 2);
            }
            pos = star + 1;
        }
        Err(ParseError::UnterminatedBlockComment {
            span: self.make_span(body_start.saturating_sub(2), body_start),
        })
    }

    /// Scan a string literal body starting just after the opening quote.
    /// Returns the decoded contents and the byte position just after the
    /// closing quote.
    fn scan_string(&self, quote_start: usize, body_start: usize) -> ParseResult<(String, usize)> {
        let bytes = self.source.as_bytes();
        let mut decoded = String::new();
        let mut pos = body_start;

        loop {
            let Some(found) = memchr3(b'"', b'\\', b'\n', &bytes[pos..]) else {
                return Err(ParseError::UnterminatedString {
                    span: self.make_span(quote_start, self.source.len()),
                });
            };
            let at = pos + found;
            decoded.push_str(&self.source[pos..at]);

            match bytes[at] {
                b'"' => return Ok((decoded, at + 1)),
                b'\n' => {
                    return Err(ParseError::UnterminatedString {
                        span: self.make_span(quote_start, at),
                    });
                }
                _ => {
                    // Escape sequence.
                    let Some(&escape) = bytes.get(at + 1) else {
                        return Err(ParseError::UnterminatedString {
                            span: self.make_span(quote_start, self.source.len()),
                        });
                    };
                    match escape {
                        b'\\' => decoded.push('\\'),
                        b'n' => decoded.push('\n'),
                        b't' => decoded.push('\t'),
                        b'r' => decoded.push('\r'),
                        b'0' => decoded.push('\0'),
                        b'"' => decoded.push('"'),
                        b'\'' => decoded.push('\''),
                        other => {
                            return Err(ParseError::InvalidEscape {
                                sequence: other as char,
                                span: self.make_span(at, at + 2),
                            });
                        }
                    }
                    pos = at + 2;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<SpannedToken<'_>> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        while let Some(result) = lexer.next_token() {
            out.push(result.unwrap());
        }
        out
    }

    #[test]
    fn test_string_literal_decoding() {
        let tokens = lex_all(r#"let s = "a\tb\n";"#);
        let string = tokens
            .iter()
            .find(|t| t.token == Token::DoubleQuote)
            .unwrap();
        assert_eq!(string.decoded.as_deref(), Some("a\tb\n"));
    }

    #[test]
    fn test_all_recognized_escapes() {
        let tokens = lex_all(r#""\\ \n \t \r \0 \" \'""#);
        assert_eq!(
            tokens[0].decoded.as_deref(),
            Some("\\ \n \t \r \0 \" '")
        );
    }

    #[test]
    fn test_invalid_escape_rejected() {
        let mut lexer = Lexer::new(r#""bad \q escape""#);
        let result = lexer.next_token().unwrap();
        assert!(matches!(
            result,
            Err(ParseError::InvalidEscape { sequence: 'q', .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"no closing quote");
        let result = lexer.next_token().unwrap();
        assert!(matches!(result, Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn test_newline_terminates_string() {
        let mut lexer = Lexer::new("\"split\nacross\"");
        let result = lexer.next_token().unwrap();
        assert!(matches!(result, Err(ParseError::UnterminatedString { .. })));
    }

    #[test]
    fn test_block_comment_skipped() {
        let tokens = lex_all("let /* a comment\nwith newlines */ a;");
        let kinds: Vec<Token> = tokens.iter().map(|t| t.token).collect();
        assert_eq!(kinds, vec![Token::KwLet, Token::Ident, Token::Semicolon]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Lexer::new("/* never closed");
        let result = lexer.next_token().unwrap();
        assert!(matches!(
            result,
            Err(ParseError::UnterminatedBlockComment { .. })
        ));
    }

    #[test]
    fn test_tokens_after_string_have_correct_spans() {
        let src = r#""hi" + x"#;
        let tokens = lex_all(src);
        assert_eq!(tokens[1].token, Token::Plus);
        assert_eq!(tokens[1].span.start, 5);
        assert_eq!(tokens[2].token, Token::Ident);
        assert_eq!(tokens[2].text, "x");
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("let a");
        assert!(matches!(
            lexer.peek().unwrap(),
            Ok(t) if t.token == Token::KwLet
        ));
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.token, Token::KwLet);
    }
}
