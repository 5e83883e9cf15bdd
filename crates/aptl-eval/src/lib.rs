//! Evaluator and VM for compiled APTL templates.
//!
//! Templates run against an [`Environment`] of variables, built-ins and
//! host hooks. Execution is pull-based: [`execute`] returns an iterator of
//! [`OutputEvent`]s and stops at the first runtime error.

mod environment;
mod error;
mod eval;
mod format;
mod hooks;
mod interpreter;
mod output;
mod runtime;
mod value;

pub use environment::Environment;
pub use error::{Error, EvalError, EvalErrorKind};
pub use eval::{eval_condition, eval_expr, eval_iterable, eval_rendered, Rendered};
pub use format::{format_messages, try_format_messages, Message, Part, PromptFormatter, DEFAULT_ROLE};
pub use hooks::{HookName, Hooks, ValueIter};
pub use interpreter::{execute, Execution, Interpreter};
pub use output::OutputEvent;
pub use runtime::Runtime;
pub use value::{NativeFunction, PromptSource, Value};

/// Result type for interpreter operations.
pub type Result<T> = std::result::Result<T, Error>;
