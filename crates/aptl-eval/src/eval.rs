//! Expression evaluation.
//!
//! Two primitive operands are combined by the built-in literal table.
//! Any other combination goes to the host's hook for that operator.

use std::cmp::Ordering;

use aptl_lexer::Span;
use aptl_parser::{Expr, Literal, Operator};

use crate::environment::Environment;
use crate::error::{EvalError, EvalErrorKind};
use crate::hooks::{HookName, ValueIter};
use crate::runtime::Runtime;
use crate::value::{PromptSource, Value};

/// An expression's value, ready for output.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    /// Nested prompt output, re-emitted event by event.
    Prompt(PromptSource),
}

/// Evaluate an expression to a value.
pub fn eval_expr(expr: &Expr, env: &Environment, runtime: &Runtime) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal { value, .. } => Ok(literal_value(value)),
        Expr::Identifier { name, span } => resolve_identifier(name, *span, env, runtime),
        Expr::Call { op: Operator::Call, lhs, rhs, span } => eval_call(lhs, rhs, *span, env, runtime),
        Expr::Call { op, lhs, rhs, span } => {
            let left = eval_expr(lhs, env, runtime)?;
            let right = eval_expr(rhs, env, runtime)?;

            if let Some(value) = literal_op(*op, &left, &right) {
                return Ok(value);
            }
            binary_hook(HookName::for_operator(*op), &left, &right, env, *span, op.symbol())
        }
        Expr::Param { span, .. } => Err(EvalError::new(EvalErrorKind::InvalidAst, *span, expr.label())),
    }
}

/// Evaluate an `if`/`elseif` condition.
pub fn eval_condition(expr: &Expr, env: &Environment, runtime: &Runtime) -> Result<bool, EvalError> {
    Ok(eval_expr(expr, env, runtime)?.to_bool())
}

/// Evaluate an expression for output.
///
/// Strings pass through, other primitives use their literal text and prompt
/// values are handed back whole. Everything else needs `stringify`.
pub fn eval_rendered(expr: &Expr, env: &Environment, runtime: &Runtime) -> Result<Rendered, EvalError> {
    let value = eval_expr(expr, env, runtime)?;
    match value {
        Value::String(text) => Ok(Rendered::Text(text)),
        Value::Prompt(prompt) => Ok(Rendered::Prompt(prompt)),
        value if value.is_primitive() => Ok(Rendered::Text(value.to_string_value())),
        value => {
            let span = expr.span();
            let Some(stringify) = env.hooks().stringify() else {
                return Err(no_hook(HookName::Stringify, span, value.to_string_value()));
            };
            stringify(&value)
                .map(Rendered::Text)
                .map_err(|err| hook_failed(HookName::Stringify, err, span, expr.label()))
        }
    }
}

/// Evaluate the iterable of a `foreach` and obtain its items.
pub fn eval_iterable(expr: &Expr, env: &Environment, runtime: &Runtime) -> Result<ValueIter, EvalError> {
    let value = eval_expr(expr, env, runtime)?;
    let span = expr.span();

    if value.is_primitive() {
        return Err(EvalError::new(
            EvalErrorKind::OperatorNotSupported,
            span,
            value.to_string_value(),
        ));
    }
    let Some(iterate) = env.hooks().iterate() else {
        return Err(no_hook(HookName::Iterate, span, expr.label()));
    };
    iterate(&value).map_err(|err| hook_failed(HookName::Iterate, err, span, expr.label()))
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Bool(b) => Value::Boolean(*b),
    }
}

/// `:name` reads a built-in, anything else reads the loop scope and then the
/// template variables.
fn resolve_identifier(
    name: &str,
    span: Span,
    env: &Environment,
    runtime: &Runtime,
) -> Result<Value, EvalError> {
    let found = match name.strip_prefix(':') {
        Some(builtin) => env.builtin(builtin),
        None => runtime.get_var(name).or_else(|| env.var(name)),
    };
    let value = found
        .cloned()
        .ok_or_else(|| EvalError::new(EvalErrorKind::IdentifierResolveFail, span, name))?;

    if value.is_primitive() {
        return Ok(value);
    }
    match env.hooks().objectify() {
        Some(objectify) => objectify(&value).map_err(|err| hook_failed(HookName::Objectify, err, span, name)),
        None => Ok(value),
    }
}

fn eval_call(
    callee: &Expr,
    params: &Expr,
    span: Span,
    env: &Environment,
    runtime: &Runtime,
) -> Result<Value, EvalError> {
    let target = eval_expr(callee, env, runtime)?;
    let Expr::Param { args, .. } = params else {
        return Err(EvalError::new(EvalErrorKind::InvalidAst, params.span(), params.label()));
    };
    let args = args
        .iter()
        .map(|arg| eval_expr(arg, env, runtime))
        .collect::<Result<Vec<_>, _>>()?;

    let symbol = Operator::Call.symbol();
    let Some(call) = env.hooks().call() else {
        return Err(no_hook(HookName::Call, span, symbol));
    };
    call(&target, &args).map_err(|err| hook_failed(HookName::Call, err, span, symbol))
}

fn binary_hook(
    name: HookName,
    left: &Value,
    right: &Value,
    env: &Environment,
    span: Span,
    text: &str,
) -> Result<Value, EvalError> {
    let Some(hook) = env.hooks().binary(name) else {
        return Err(no_hook(name, span, text));
    };
    hook(left, right).map_err(|err| hook_failed(name, err, span, text))
}

/// Built-in semantics for two primitive operands. Member access, indexing
/// and calls have no built-in form.
fn literal_op(op: Operator, a: &Value, b: &Value) -> Option<Value> {
    if !a.is_primitive() || !b.is_primitive() {
        return None;
    }
    let value = match op {
        Operator::Add => match (a, b) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", a.to_string_value(), b.to_string_value()))
            }
            _ => Value::Number(a.to_number() + b.to_number()),
        },
        Operator::Subtract => Value::Number(a.to_number() - b.to_number()),
        Operator::Multiply => Value::Number(a.to_number() * b.to_number()),
        Operator::Divide => Value::Number(a.to_number() / b.to_number()),
        Operator::Modulo => Value::Number(a.to_number() % b.to_number()),
        Operator::Greater => Value::Boolean(compare(a, b).is_some_and(Ordering::is_gt)),
        Operator::GreaterOrEqual => Value::Boolean(compare(a, b).is_some_and(Ordering::is_ge)),
        Operator::Less => Value::Boolean(compare(a, b).is_some_and(Ordering::is_lt)),
        Operator::LessOrEqual => Value::Boolean(compare(a, b).is_some_and(Ordering::is_le)),
        Operator::Equal => Value::Boolean(loose_equal(a, b)),
        Operator::NotEqual => Value::Boolean(!loose_equal(a, b)),
        Operator::LogicalAnd => if a.to_bool() { b.clone() } else { a.clone() },
        Operator::LogicalOr => if a.to_bool() { a.clone() } else { b.clone() },
        Operator::Access | Operator::Index | Operator::Call => return None,
    };
    Some(value)
}

/// Strings compare lexically with each other; any other pair compares as
/// numbers. `None` when either side is NaN.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn loose_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        _ => a.to_number() == b.to_number(),
    }
}

fn no_hook(hook: HookName, span: Span, text: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::NoHook { hook }, span, text)
}

fn hook_failed(hook: HookName, err: anyhow::Error, span: Span, text: impl Into<String>) -> EvalError {
    tracing::debug!(%hook, error = %err, "hook failed");
    EvalError::new(
        EvalErrorKind::HookFailed {
            hook,
            message: err.to_string(),
        },
        span,
        text,
    )
}
