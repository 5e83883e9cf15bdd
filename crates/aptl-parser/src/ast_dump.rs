//! AST dumping utilities for testing and debugging
//!
//! Provides human-readable tree representations of expression trees.

use crate::ast::{Expr, Literal};
use std::fmt::Write as FmtWrite;

/// Dump an expression as a pretty-printed tree
pub fn dump_expr(expr: &Expr) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_expr(&mut out, expr, 0);
    out
}

pub fn write_expr(out: &mut String, expr: &Expr, indent: usize) -> std::fmt::Result {
    let prefix = "  ".repeat(indent);
    match expr {
        Expr::Literal { value, span } => match value {
            Literal::String(s) => writeln!(out, "{}String: {:?} @{}", prefix, s, span)?,
            Literal::Number(n) => writeln!(out, "{}Number: {} @{}", prefix, n, span)?,
            Literal::Bool(b) => writeln!(out, "{}Bool: {} @{}", prefix, b, span)?,
        },
        Expr::Identifier { name, span } => {
            writeln!(out, "{}Identifier: {} @{}", prefix, name, span)?;
        }
        Expr::Call { op, lhs, rhs, span } => {
            writeln!(out, "{}Call: {} @{}", prefix, op, span)?;
            write_expr(out, lhs, indent + 1)?;
            write_expr(out, rhs, indent + 1)?;
        }
        Expr::Param { args, span } => {
            writeln!(out, "{}Params: {} @{}", prefix, args.len(), span)?;
            for arg in args {
                write_expr(out, arg, indent + 1)?;
            }
        }
    }
    Ok(())
}
