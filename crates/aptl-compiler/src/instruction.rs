//! Compiled instruction tree.
//!
//! Control flow is flat: each [`Instruction::Group`] is an array executed by
//! its own pointer, and jump targets are indices into the enclosing array.

use aptl_lexer::Span;
use aptl_parser::Expr;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    Single(Single),
    Group { instructions: Vec<Instruction> },
    Action(Action),
}

/// Instructions that produce output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Single {
    Text { text: String, span: Span },
    Expression { expr: Expr, span: Span },
    Role { role: String, span: Span },
    Split { span: Span },
}

/// Control-flow instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Jump {
        target: usize,
    },
    ConditionalJump {
        condition: Expr,
        target: usize,
    },
    /// Abandon the rest of the current group.
    Break,
    EnterScope,
    ExitScope,
    /// Evaluate `iterable` and bind an iterator for the loop variable `iterator`.
    IterateInit {
        iterable: Expr,
        iterator: String,
    },
    /// Advance `iterator`, binding the next item to `element`.
    IterateNext {
        iterator: String,
        element: String,
    },
    JumpIfIterateDone {
        iterator: String,
        target: usize,
    },
}

impl Instruction {
    pub fn text(text: impl Into<String>, span: Span) -> Self {
        Instruction::Single(Single::Text {
            text: text.into(),
            span,
        })
    }

    pub fn group(instructions: Vec<Instruction>) -> Self {
        Instruction::Group { instructions }
    }

    pub fn action(action: Action) -> Self {
        Instruction::Action(action)
    }
}
