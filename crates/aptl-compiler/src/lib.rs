//! APTL template compiler
//!
//! Turns template text into a tree of [`Instruction`]s: flat groups with
//! index-based jumps for conditionals and loops. Compilation collects every
//! error it finds instead of stopping at the first one.

mod builder;
pub mod driver;
pub mod error;
mod foreach;
mod if_chain;
pub mod instruction;
pub mod instruction_dump;

pub use driver::{compile, CompileOptions, CompileOutput, Compiler};
pub use error::{BuildError, BuildErrorKind};
pub use instruction::{Action, Instruction, Single};
pub use instruction_dump::dump_instructions;
