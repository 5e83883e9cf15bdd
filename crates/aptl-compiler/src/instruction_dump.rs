//! Instruction dumping utilities for testing and debugging
//!
//! Provides a human-readable tree of compiled instructions, with jump
//! targets shown as slot indices of the enclosing group.

use std::fmt::Write as FmtWrite;

use aptl_parser::ast_dump::write_expr;

use crate::instruction::{Action, Instruction, Single};

/// Dump an instruction sequence as a pretty-printed tree
pub fn dump_instructions(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_instructions(&mut out, instructions, 0);
    out
}

fn write_instructions(
    out: &mut String,
    instructions: &[Instruction],
    indent: usize,
) -> std::fmt::Result {
    for (slot, instruction) in instructions.iter().enumerate() {
        write_instruction(out, slot, instruction, indent)?;
    }
    Ok(())
}

fn write_instruction(
    out: &mut String,
    slot: usize,
    instruction: &Instruction,
    indent: usize,
) -> std::fmt::Result {
    let prefix = format!("{}{}: ", "  ".repeat(indent), slot);
    match instruction {
        Instruction::Single(single) => match single {
            Single::Text { text, .. } => writeln!(out, "{}Text {:?}", prefix, text)?,
            Single::Expression { expr, .. } => {
                writeln!(out, "{}Expression", prefix)?;
                write_expr(out, expr, indent + 2)?;
            }
            Single::Role { role, .. } => writeln!(out, "{}Role {}", prefix, role)?,
            Single::Split { .. } => writeln!(out, "{}Split", prefix)?,
        },
        Instruction::Group { instructions } => {
            writeln!(out, "{}Group", prefix)?;
            write_instructions(out, instructions, indent + 1)?;
        }
        Instruction::Action(action) => match action {
            Action::Jump { target } => writeln!(out, "{}Jump -> {}", prefix, target)?,
            Action::ConditionalJump { condition, target } => {
                writeln!(out, "{}JumpIf -> {}", prefix, target)?;
                write_expr(out, condition, indent + 2)?;
            }
            Action::Break => writeln!(out, "{}Break", prefix)?,
            Action::EnterScope => writeln!(out, "{}EnterScope", prefix)?,
            Action::ExitScope => writeln!(out, "{}ExitScope", prefix)?,
            Action::IterateInit { iterable, iterator } => {
                writeln!(out, "{}IterateInit {}", prefix, iterator)?;
                write_expr(out, iterable, indent + 2)?;
            }
            Action::IterateNext { iterator, element } => {
                writeln!(out, "{}IterateNext {} -> {}", prefix, iterator, element)?;
            }
            Action::JumpIfIterateDone { iterator, target } => {
                writeln!(out, "{}JumpIfDone {} -> {}", prefix, iterator, target)?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn test_dump_foreach() {
        let output = compile("{{#foreach x in xs}}{{x}}{{#endforeach}}");
        let dump = dump_instructions(&output.instructions);
        let expected = "\
0: Group
  0: EnterScope
  1: IterateInit x
      Identifier: xs @16..18
  2: IterateNext x -> x
  3: JumpIfDone x -> 6
  4: Group
    0: Expression
        Identifier: x @22..23
  5: Jump -> 2
  6: ExitScope
";
        assert_eq!(dump, expected);
    }
}
