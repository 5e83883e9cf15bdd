//! Expression trees and the postfix reducer that builds them.

use aptl_lexer::Span;
use serde::Serialize;

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::token::{Operator, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Number(f64),
    /// Never produced by the parser: `true` and `false` lex as identifiers.
    /// Hosts building trees by hand can still use it.
    Bool(bool),
}

/// An expression node. Every node knows the exact source range it covers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
        span: Span,
    },
    /// A variable reference. Names starting with `:` refer to built-ins.
    Identifier {
        name: String,
        span: Span,
    },
    /// A binary operation, member access, index or invocation. For
    /// [`Operator::Call`] the right operand is always an [`Expr::Param`].
    Call {
        op: Operator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// Argument list of an invocation. Never evaluated on its own.
    Param {
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Call { span, .. }
            | Expr::Param { span, .. } => *span,
        }
    }

    /// Short text naming the node in diagnostics: the identifier, the
    /// literal, or the operator symbol.
    pub fn label(&self) -> String {
        match self {
            Expr::Literal { value, .. } => match value {
                Literal::String(s) => s.clone(),
                Literal::Number(n) => n.to_string(),
                Literal::Bool(b) => b.to_string(),
            },
            Expr::Identifier { name, .. } => name.clone(),
            Expr::Call { op, .. } => op.symbol().to_string(),
            Expr::Param { .. } => "()".to_string(),
        }
    }

    /// Move every span in the tree right by `offset` bytes.
    pub fn shift(&mut self, offset: usize) {
        match self {
            Expr::Literal { span, .. } | Expr::Identifier { span, .. } => {
                *span = span.shift(offset);
            }
            Expr::Call { lhs, rhs, span, .. } => {
                lhs.shift(offset);
                rhs.shift(offset);
                *span = span.shift(offset);
            }
            Expr::Param { args, span } => {
                for arg in args {
                    arg.shift(offset);
                }
                *span = span.shift(offset);
            }
        }
    }
}

/// Operand stack entry while reducing.
#[derive(Debug)]
enum Item {
    Expr(Expr),
    Param(Span),
}

/// Reduce a postfix token sequence to a single expression tree.
pub fn build_ast(tokens: Vec<Token>) -> Result<Expr> {
    let mut stack: Vec<Item> = Vec::new();

    for token in tokens {
        match token.kind {
            TokenKind::Number(n) => stack.push(Item::Expr(Expr::Literal {
                value: Literal::Number(n),
                span: token.span,
            })),
            TokenKind::String(s) => stack.push(Item::Expr(Expr::Literal {
                value: Literal::String(s),
                span: token.span,
            })),
            TokenKind::Identifier(name) => stack.push(Item::Expr(Expr::Identifier {
                name,
                span: token.span,
            })),
            TokenKind::Param => stack.push(Item::Param(token.span)),
            TokenKind::Operator(Operator::Call) => {
                let call = reduce_call(&mut stack, token.span)?;
                stack.push(Item::Expr(call));
            }
            TokenKind::Operator(op) => {
                let node = reduce_binary(&mut stack, op, token.span)?;
                stack.push(Item::Expr(node));
            }
        }
    }

    match stack.len() {
        0 => Err(ParseError::whole(ParseErrorKind::NoExpression)),
        1 => match stack.pop() {
            Some(Item::Expr(expr)) => Ok(expr),
            _ => Err(ParseError::whole(ParseErrorKind::UnprocessedExpression)),
        },
        _ => Err(ParseError::whole(ParseErrorKind::UnprocessedExpression)),
    }
}

fn reduce_binary(stack: &mut Vec<Item>, op: Operator, op_span: Span) -> Result<Expr> {
    let missing = || ParseError::new(ParseErrorKind::InvalidFormula, op_span, op.symbol());

    let rhs = match stack.pop() {
        Some(Item::Expr(expr)) => expr,
        Some(Item::Param(span)) => {
            return Err(ParseError::new(ParseErrorKind::InvalidOperand, span, "("));
        }
        None => return Err(missing()),
    };
    let lhs = match stack.pop() {
        Some(Item::Expr(expr)) => expr,
        Some(Item::Param(span)) => {
            // The marker belongs to an enclosing call, leave it for `()`.
            stack.push(Item::Param(span));
            return Err(missing());
        }
        None => return Err(missing()),
    };

    let rhs = if op == Operator::Access {
        match rhs {
            Expr::Identifier { name, span } => Expr::Literal {
                value: Literal::String(name),
                span,
            },
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidAccessor,
                    op_span,
                    op.symbol(),
                ));
            }
        }
    } else {
        rhs
    };

    let span = lhs.span().join(rhs.span()).join(op_span);
    Ok(Expr::Call {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    })
}

fn reduce_call(stack: &mut Vec<Item>, parens: Span) -> Result<Expr> {
    let mut args = Vec::new();
    loop {
        match stack.pop() {
            Some(Item::Expr(arg)) => args.push(arg),
            Some(Item::Param(_)) => break,
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingParamMarker,
                    parens,
                    "()",
                ));
            }
        }
    }
    args.reverse();

    let callee = match stack.pop() {
        Some(Item::Expr(expr)) => expr,
        Some(Item::Param(span)) => {
            return Err(ParseError::new(ParseErrorKind::InvalidOperand, span, "("));
        }
        None => {
            return Err(ParseError::new(
                ParseErrorKind::InvalidFormula,
                parens,
                "()",
            ));
        }
    };

    let span = callee.span().join(parens);
    Ok(Expr::Call {
        op: Operator::Call,
        lhs: Box::new(callee),
        rhs: Box::new(Expr::Param { args, span: parens }),
        span,
    })
}
