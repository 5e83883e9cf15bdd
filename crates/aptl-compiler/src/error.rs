//! Error types for the template compiler.

use aptl_lexer::{Fragment, Span};
use aptl_parser::{ParseError, ParseErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildErrorKind {
    /// An expression, condition or loop iterable failed to parse.
    #[error("{0}")]
    Expression(ParseErrorKind),

    #[error("invalid directive")]
    InvalidDirective,

    #[error("missing endif")]
    MissingEndif,

    #[error("missing endforeach")]
    MissingEndforeach,

    #[error("duplicate else directive")]
    DuplicateElse,

    #[error("foreach expects '<item> in <expression>'")]
    InvalidForeachField,

    #[error("loop variable must be a plain identifier")]
    InvalidLoopVariable,
}

/// A compile failure located in the template source.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} at {span}: '{text}'")]
pub struct BuildError {
    pub kind: BuildErrorKind,
    pub span: Span,
    pub text: String,
}

impl BuildError {
    pub fn new(kind: BuildErrorKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// An error covering a whole `{{ }}` element.
    pub fn at_fragment(kind: BuildErrorKind, fragment: &Fragment) -> Self {
        Self::new(kind, fragment.element_span(), fragment.value.trim())
    }
}

impl From<ParseError> for BuildError {
    fn from(err: ParseError) -> Self {
        Self::new(BuildErrorKind::Expression(err.kind), err.span, err.text)
    }
}
