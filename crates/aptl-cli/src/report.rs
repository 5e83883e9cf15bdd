//! Human-readable diagnostics.

use aptl_compiler::BuildError;
use aptl_eval::EvalError;
use aptl_lexer::Span;

/// `file:line:col: message: 'text'`
fn located(name: &str, source: &str, span: Span, message: &str, text: &str) -> String {
    let (line, col) = span.line_col(source);
    if text.is_empty() {
        format!("{}:{}:{}: {}", name, line, col, message)
    } else {
        format!("{}:{}:{}: {}: '{}'", name, line, col, message, text)
    }
}

pub fn build_error(name: &str, source: &str, err: &BuildError) -> String {
    located(name, source, err.span, &err.kind.to_string(), &err.text)
}

pub fn eval_error(name: &str, source: &str, err: &EvalError) -> String {
    located(name, source, err.span, &err.kind.to_string(), &err.text)
}
