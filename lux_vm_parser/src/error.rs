//! Parse error types.

use crate::span::Span;
use thiserror::Error;

/// Errors produced while lexing or parsing Lux source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected token {found} at line {}, column {}, expected {expected}", .span.start_line, .span.start_column)]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("invalid escape sequence '\\{sequence}' at line {}, column {}", .span.start_line, .span.start_column)]
    InvalidEscape { sequence: char, span: Span },

    #[error("unterminated string literal starting at line {}, column {}", .span.start_line, .span.start_column)]
    UnterminatedString { span: Span },

    #[error("unterminated block comment starting at line {}, column {}", .span.start_line, .span.start_column)]
    UnterminatedBlockComment { span: Span },

    #[error("invalid number literal '{literal}' at line {}, column {}", .span.start_line, .span.start_column)]
    InvalidNumber { literal: String, span: Span },

    #[error("{message} at line {}, column {}", .span.start_line, .span.start_column)]
    InvalidSyntax { message: String, span: Span },

    #[error("unrecognized token at line {}, column {}", .span.start_line, .span.start_column)]
    LexerError { span: Span },
}

impl ParseError {
    /// The span the error points at.
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. } => span,
            ParseError::UnexpectedEof { span, .. } => span,
            ParseError::InvalidEscape { span, .. } => span,
            ParseError::UnterminatedString { span } => span,
            ParseError::UnterminatedBlockComment { span } => span,
            ParseError::InvalidNumber { span, .. } => span,
            ParseError::InvalidSyntax { span, .. } => span,
            ParseError::LexerError { span } => span,
        }
    }

    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            span,
        }
    }

    /// Render the offending source line with a caret marker.
    pub fn format_with_context(&self, source: &str) -> String {
        let span = self.span();
        let lines: Vec<&str> = source.lines().collect();
        let line_idx = span.start_line.saturating_sub(1);
        if line_idx >= lines.len() {
            return String::new();
        }

        let line = lines[line_idx];
        let col = span.start_column.saturating_sub(1);
        let len = if span.start_line == span.end_line {
            span.end_column.saturating_sub(span.start_column).max(1)
        } else {
            1
        };
        let marker = "^".repeat(len.min(line.len().saturating_sub(col)).max(1));

        format!(
            "  {} | {}\n  {} | {}{}",
            span.start_line,
            line,
            " ".repeat(span.start_line.to_string().len()),
            " ".repeat(col),
            marker
        )
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
