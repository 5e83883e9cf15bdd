//! `if` / `elseif` / `else` / `endif` lowering.
//!
//! A chain with conditions `c0..cn` compiles to one group:
//!
//! ```text
//! 0..n        ConditionalJump(c_i -> first + 2*i)
//! n           Group(else) ; Break      (or just Break without else)
//! first+2*i   Group(block_i) ; Break
//! ```

use aptl_lexer::{Fragment, FragmentKind};
use aptl_parser::Expr;

use crate::builder::{Cursor, InstructionBuilder, Keyword};
use crate::error::{BuildError, BuildErrorKind};
use crate::instruction::{Action, Instruction};

struct Branch {
    condition: Option<Expr>,
    body: Vec<Instruction>,
}

pub(crate) fn build<'a>(
    builder: &mut InstructionBuilder,
    open: &'a Fragment,
    cursor: &mut Cursor<'a>,
) -> Option<Instruction> {
    let mut branches = vec![Branch {
        condition: condition(builder, open),
        body: Vec::new(),
    }];
    let mut otherwise: Option<Vec<Instruction>> = None;

    loop {
        let Some(fragment) = cursor.next() else {
            builder.record(BuildError::at_fragment(BuildErrorKind::MissingEndif, open));
            return None;
        };

        match Keyword::of(fragment) {
            Some(Keyword::EndIf) => break,
            Some(Keyword::ElseIf) if otherwise.is_some() => {
                builder.record(BuildError::at_fragment(
                    BuildErrorKind::InvalidDirective,
                    fragment,
                ));
            }
            Some(Keyword::ElseIf) => branches.push(Branch {
                condition: condition(builder, fragment),
                body: Vec::new(),
            }),
            Some(Keyword::Else) if otherwise.is_some() => {
                builder.record(BuildError::at_fragment(
                    BuildErrorKind::DuplicateElse,
                    fragment,
                ));
            }
            Some(Keyword::Else) => otherwise = Some(Vec::new()),
            _ => {
                if let Some(instruction) = builder.build(fragment, cursor) {
                    match otherwise.as_mut() {
                        Some(block) => block.push(instruction),
                        None => {
                            if let Some(branch) = branches.last_mut() {
                                branch.body.push(instruction);
                            }
                        }
                    }
                }
            }
        }
    }

    let mut conditions = Vec::with_capacity(branches.len());
    let mut bodies = Vec::with_capacity(branches.len());
    for branch in branches {
        conditions.push(branch.condition?);
        bodies.push(branch.body);
    }
    Some(lay_out(conditions, bodies, otherwise))
}

fn condition(builder: &mut InstructionBuilder, fragment: &Fragment) -> Option<Expr> {
    match &fragment.kind {
        FragmentKind::Directive { field, .. } => builder.expression(field),
        _ => None,
    }
}

fn lay_out(
    conditions: Vec<Expr>,
    bodies: Vec<Vec<Instruction>>,
    otherwise: Option<Vec<Instruction>>,
) -> Instruction {
    let else_len = if otherwise.is_some() { 2 } else { 1 };
    let first_block = conditions.len() + else_len;

    let mut group = Vec::with_capacity(first_block + 2 * bodies.len());
    for (i, condition) in conditions.into_iter().enumerate() {
        group.push(Instruction::action(Action::ConditionalJump {
            condition,
            target: first_block + 2 * i,
        }));
    }
    if let Some(block) = otherwise {
        group.push(Instruction::group(block));
    }
    group.push(Instruction::action(Action::Break));
    for body in bodies {
        group.push(Instruction::group(body));
        group.push(Instruction::action(Action::Break));
    }

    Instruction::group(group)
}
