//! Error types for template evaluation.

use aptl_compiler::BuildError;
use aptl_lexer::Span;
use serde::Serialize;
use thiserror::Error;

use crate::hooks::HookName;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvalErrorKind {
    #[error("cannot resolve identifier")]
    IdentifierResolveFail,

    #[error("no '{hook}' hook")]
    NoHook { hook: HookName },

    #[error("{hook} in hook : '{message}'")]
    HookFailed { hook: HookName, message: String },

    #[error("operator not supported on literal")]
    OperatorNotSupported,

    #[error("malformed expression tree")]
    InvalidAst,

    #[error("loop iterator is not bound")]
    UnboundIterator,
}

/// A runtime failure located at the expression that caused it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{kind} at {span}: '{text}'")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub span: Span,
    pub text: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, span: Span, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Evaluate(#[from] EvalError),

    #[error("template failed to compile:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    CompileFailed(Vec<BuildError>),
}
