//! `foreach` / `endforeach` lowering.

use std::sync::LazyLock;

use aptl_lexer::{Fragment, FragmentKind, Segment, Span};
use aptl_parser::{parse_expression_at, Expr};
use regex::Regex;

use crate::builder::{Cursor, InstructionBuilder, Keyword};
use crate::error::{BuildError, BuildErrorKind};
use crate::instruction::{Action, Instruction};

/// Separates the loop variable from the iterable: `item in items`.
static IN_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+in\s+").expect("invalid foreach regex"));

/// Slot of `IterateNext` in the loop group.
const LOOP_HEAD: usize = 2;
/// Slot of `ExitScope` in the loop group.
const LOOP_EXIT: usize = 6;

struct Header {
    element: String,
    iterable: Expr,
}

/// Compile a loop into its fixed seven-slot group:
///
/// ```text
/// 0 EnterScope
/// 1 IterateInit(iterable, x)
/// 2 IterateNext(x, x)
/// 3 JumpIfIterateDone(x -> 6)
/// 4 Group(body)
/// 5 Jump(-> 2)
/// 6 ExitScope
/// ```
pub(crate) fn build<'a>(
    builder: &mut InstructionBuilder,
    open: &'a Fragment,
    cursor: &mut Cursor<'a>,
) -> Option<Instruction> {
    let header = header(builder, open);
    let mut body = Vec::new();

    loop {
        let Some(fragment) = cursor.next() else {
            builder.record(BuildError::at_fragment(
                BuildErrorKind::MissingEndforeach,
                open,
            ));
            return None;
        };
        if Keyword::of(fragment) == Some(Keyword::EndForeach) {
            break;
        }
        if let Some(instruction) = builder.build(fragment, cursor) {
            body.push(instruction);
        }
    }

    let Header { element, iterable } = header?;
    Some(Instruction::group(vec![
        Instruction::action(Action::EnterScope),
        Instruction::action(Action::IterateInit {
            iterable,
            iterator: element.clone(),
        }),
        Instruction::action(Action::IterateNext {
            iterator: element.clone(),
            element: element.clone(),
        }),
        Instruction::action(Action::JumpIfIterateDone {
            iterator: element,
            target: LOOP_EXIT,
        }),
        Instruction::group(body),
        Instruction::action(Action::Jump { target: LOOP_HEAD }),
        Instruction::action(Action::ExitScope),
    ]))
}

fn header(builder: &mut InstructionBuilder, open: &Fragment) -> Option<Header> {
    let FragmentKind::Directive { field, .. } = &open.kind else {
        return None;
    };

    let separators: Vec<_> = IN_KEYWORD.find_iter(&field.text).collect();
    let [separator] = separators.as_slice() else {
        builder.record(BuildError::at_fragment(
            BuildErrorKind::InvalidForeachField,
            open,
        ));
        return None;
    };

    let element_text = &field.text[..separator.start()];
    let element = loop_variable(element_text, field.position);
    let iterable = builder.expression(&Segment {
        text: field.text[separator.end()..].to_string(),
        prefix: String::new(),
        suffix: String::new(),
        position: field.position + separator.end(),
    });

    let element = match element {
        Some(name) => name,
        None => {
            builder.record(BuildError::new(
                BuildErrorKind::InvalidLoopVariable,
                Span::at(field.position, element_text.len()),
                element_text,
            ));
            return None;
        }
    };

    Some(Header {
        element,
        iterable: iterable?,
    })
}

/// The loop variable must be a single non-builtin identifier.
fn loop_variable(text: &str, position: usize) -> Option<String> {
    match parse_expression_at(text, position).ok()? {
        Expr::Identifier { name, .. } if !name.starts_with(':') => Some(name),
        _ => None,
    }
}
