use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use phorge_ast::{Position, Span};
use phorge_lexer::TokenKind;
use thiserror::Error;

/// Coarse classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A required token is missing or a different one showed up.
    UnexpectedToken,
    /// The current token cannot begin an expression.
    NoPrefixParslet,
    /// The tokens are well-formed but the construct they build is not.
    MalformedConstruct,
    /// Reported by the token source.
    Lexical,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::UnexpectedToken => "unexpected_token",
            DiagnosticKind::NoPrefixParslet => "no_prefix_parslet",
            DiagnosticKind::MalformedConstruct => "malformed_construct",
            DiagnosticKind::Lexical => "lexical",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{position}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        span: Span,
        position: Position,
    },

    #[error("{position}: expected {delimiter} to close the one opened at {opened_at}, found {found}")]
    UnclosedDelimiter {
        delimiter: TokenKind,
        opened_at: Position,
        opened_span: Span,
        found: TokenKind,
        span: Span,
        position: Position,
    },

    #[error("{position}: expected expression, found {found}")]
    NoPrefixParslet {
        found: TokenKind,
        span: Span,
        position: Position,
    },

    #[error("{position}: {message}")]
    MalformedConstruct {
        message: String,
        span: Span,
        position: Position,
    },

    #[error("{position}: {message}")]
    Lexical {
        message: String,
        span: Span,
        position: Position,
    },
}

impl ParseError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ParseError::UnexpectedToken { .. } | ParseError::UnclosedDelimiter { .. } => {
                DiagnosticKind::UnexpectedToken
            }
            ParseError::NoPrefixParslet { .. } => DiagnosticKind::NoPrefixParslet,
            ParseError::MalformedConstruct { .. } => DiagnosticKind::MalformedConstruct,
            ParseError::Lexical { .. } => DiagnosticKind::Lexical,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnclosedDelimiter { span, .. }
            | ParseError::NoPrefixParslet { span, .. }
            | ParseError::MalformedConstruct { span, .. }
            | ParseError::Lexical { span, .. } => *span,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnclosedDelimiter { position, .. }
            | ParseError::NoPrefixParslet { position, .. }
            | ParseError::MalformedConstruct { position, .. }
            | ParseError::Lexical { position, .. } => *position,
        }
    }

    fn label(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {expected} here"),
            ParseError::UnclosedDelimiter { delimiter, .. } => format!("expected {delimiter}"),
            ParseError::NoPrefixParslet { found, .. } => format!("{found} cannot start an expression"),
            ParseError::MalformedConstruct { .. } => "invalid here".to_string(),
            ParseError::Lexical { .. } => "here".to_string(),
        }
    }
}

fn labeled(label: String, span: Span) -> LabeledSpan {
    LabeledSpan::new(Some(label), span.start as usize, span.len() as usize)
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("phorge::{}", self.kind())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ParseError::UnclosedDelimiter { .. } => {
                Some(Box::new("every opening delimiter needs a matching closing one"))
            }
            ParseError::NoPrefixParslet { found: TokenKind::Eof, .. } => {
                Some(Box::new("the input ends in the middle of an expression"))
            }
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let primary = labeled(self.label(), self.span());
        match self {
            ParseError::UnclosedDelimiter { opened_span, .. } => Some(Box::new(
                [primary, labeled("opened here".to_string(), *opened_span)].into_iter(),
            )),
            _ => Some(Box::new(std::iter::once(primary))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unexpected() -> ParseError {
        ParseError::UnexpectedToken {
            expected: "';'".to_string(),
            found: TokenKind::RightParen,
            span: Span::new(10, 11),
            position: Position::new(2, 4),
        }
    }

    #[test]
    fn test_message_carries_position() {
        assert_eq!(unexpected().to_string(), "2:4: expected ';', found ')'");
    }

    #[test]
    fn test_kind_and_code() {
        let err = unexpected();
        assert_eq!(err.kind(), DiagnosticKind::UnexpectedToken);
        assert_eq!(err.code().unwrap().to_string(), "phorge::unexpected_token");
    }

    #[test]
    fn test_unclosed_delimiter_labels_both_ends() {
        let err = ParseError::UnclosedDelimiter {
            delimiter: TokenKind::RightParen,
            opened_at: Position::new(1, 4),
            opened_span: Span::new(3, 4),
            found: TokenKind::Semicolon,
            span: Span::new(8, 9),
            position: Position::new(1, 9),
        };
        let labels: Vec<_> = err.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].offset(), 3);
        assert_eq!(
            err.to_string(),
            "1:9: expected ')' to close the one opened at 1:4, found ';'"
        );
    }
}
