//! Error types for expression parsing.

use aptl_lexer::{LexError, Span};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseErrorKind {
    #[error("invalid token")]
    InvalidToken,

    #[error("comma outside of a call argument list")]
    MultipleExpression,

    #[error("missing open paren")]
    MissingOpenParen,

    #[error("missing open indexor")]
    MissingOpenIndexor,

    #[error("missing close paren")]
    MissingCloseParen,

    #[error("missing close indexor")]
    MissingCloseIndexor,

    #[error("no expression")]
    NoExpression,

    #[error("unprocessed expression remains")]
    UnprocessedExpression,

    #[error("operator is missing an operand")]
    InvalidFormula,

    #[error("member access needs an identifier on the right")]
    InvalidAccessor,

    #[error("argument list used as an operand")]
    InvalidOperand,

    #[error("call without an argument list marker")]
    MissingParamMarker,
}

/// A failure to parse one expression. `span` is relative to whatever text
/// was handed to the parser until [`ParseError::shifted`] relocates it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} at {span}: '{text}'")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub text: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// An error that has no meaningful location inside the expression.
    pub fn whole(kind: ParseErrorKind) -> Self {
        Self::new(kind, Span::default(), "")
    }

    /// Move the span right by `offset` bytes.
    pub fn shifted(mut self, offset: usize) -> Self {
        self.span = self.span.shift(offset);
        self
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::InvalidToken, err.span, err.text)
    }
}
