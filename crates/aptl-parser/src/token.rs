//! Postfix tokens produced by the shunting-yard transform.
use std::fmt;

use aptl_lexer::Span;
use serde::Serialize;

/// Binary operators, including the synthetic access/index/call operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    LogicalAnd,
    LogicalOr,
    /// `a.b`
    Access,
    /// `a[b]`
    Index,
    /// `a(b, c)`
    Call,
}

/// Precedence of `.`, `[]` and `()`.
pub const HIGHEST_PRECEDENCE: u8 = 8;

impl Operator {
    /// Look up an operator token as produced by the lexer.
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        let op = match symbol {
            "+" => Operator::Add,
            "-" => Operator::Subtract,
            "*" => Operator::Multiply,
            "/" => Operator::Divide,
            "%" => Operator::Modulo,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessOrEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterOrEqual,
            "&&" => Operator::LogicalAnd,
            "||" => Operator::LogicalOr,
            "." => Operator::Access,
            "[]" => Operator::Index,
            "()" => Operator::Call,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LogicalAnd => "&&",
            Operator::LogicalOr => "||",
            Operator::Access => ".",
            Operator::Index => "[]",
            Operator::Call => "()",
        }
    }

    /// Binding strength; every operator is left-associative.
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Access | Operator::Index | Operator::Call => HIGHEST_PRECEDENCE,
            Operator::Multiply | Operator::Divide | Operator::Modulo => 6,
            Operator::Add | Operator::Subtract => 5,
            Operator::Less
            | Operator::LessOrEqual
            | Operator::Greater
            | Operator::GreaterOrEqual => 4,
            Operator::Equal | Operator::NotEqual => 3,
            Operator::LogicalAnd => 2,
            Operator::LogicalOr => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenKind {
    Number(f64),
    /// String literal with quotes stripped and escapes resolved.
    String(String),
    Identifier(String),
    Operator(Operator),
    /// Marks where a call's argument list starts.
    Param,
}

/// A token in postfix order. `text` is the source text the token came from
/// (`"()"`/`"[]"` for the synthetic call/index operators).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    pub fn operator(op: Operator, span: Span) -> Self {
        Self::new(TokenKind::Operator(op), op.symbol(), span)
    }
}

/// Resolve backslash escapes in a string literal body.
///
/// Unknown escapes are kept verbatim, backslash included.
pub fn process_escape_sequences(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(escaped @ ('\\' | '"' | '\'')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// Strip the surrounding quotes of a string token and resolve escapes.
pub fn unquote(text: &str) -> String {
    let inner = if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    };
    process_escape_sequences(inner)
}
