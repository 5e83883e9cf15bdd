//! Expression parser for APTL templates.
//!
//! Parsing runs in three passes: [`aptl_lexer::tokenize`] produces raw
//! tokens, [`to_postfix`] reorders them with the shunting-yard algorithm,
//! and [`build_ast`] reduces the postfix sequence into an [`Expr`] tree.

pub mod ast;
pub mod ast_dump;
pub mod error;
pub mod postfix;
pub mod token;

pub use ast::{build_ast, Expr, Literal};
pub use ast_dump::dump_expr;
pub use error::{ParseError, ParseErrorKind};
pub use postfix::to_postfix;
pub use token::{Operator, Token, TokenKind};

use aptl_lexer::tokenize;

/// Parse one expression. Error spans are relative to `input`.
pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let postfix = to_postfix(&tokens)?;
    build_ast(postfix)
}

/// Parse an expression that starts `offset` bytes into a larger source.
/// Spans in the tree and in errors are absolute.
pub fn parse_expression_at(input: &str, offset: usize) -> Result<Expr, ParseError> {
    match parse_expression(input) {
        Ok(mut expr) => {
            expr.shift(offset);
            Ok(expr)
        }
        Err(err) => Err(err.shifted(offset)),
    }
}
