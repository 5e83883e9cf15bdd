//! Compiler driver that runs fragmenting and instruction building.

use aptl_lexer::{fragment, FragmentOptions};
use serde::Serialize;

use crate::builder::{Cursor, InstructionBuilder};
use crate::error::BuildError;
use crate::instruction::Instruction;

/// Compilation output structure
///
/// When `ok` is false, `instructions` may hold whatever could be built and
/// must not be executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOutput {
    pub ok: bool,
    pub instructions: Vec<Instruction>,
    /// Every failure found, in source order.
    pub errors: Vec<BuildError>,
}

/// Options for compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Accept the `{{:: keyword}}` directive spelling
    pub legacy_directives: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self {
            legacy_directives: true,
        }
    }

    pub fn legacy_directives(mut self, enabled: bool) -> Self {
        self.legacy_directives = enabled;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The template compiler
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with the given options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile a template. Never fails outright: problems are reported in
    /// [`CompileOutput::errors`].
    pub fn compile(&self, source: &str) -> CompileOutput {
        let fragments = fragment(
            source,
            FragmentOptions {
                legacy_directives: self.options.legacy_directives,
            },
        );
        tracing::debug!(fragments = fragments.len(), "fragmented template");

        let mut builder = InstructionBuilder::new();
        let mut cursor = Cursor::new(&fragments);
        let mut instructions = Vec::new();
        while let Some(fragment) = cursor.next() {
            if let Some(instruction) = builder.build(fragment, &mut cursor) {
                instructions.push(instruction);
            }
        }

        let mut errors = builder.into_errors();
        errors.sort_by_key(|err| err.span.begin);
        tracing::debug!(
            instructions = instructions.len(),
            errors = errors.len(),
            "compiled template"
        );

        CompileOutput {
            ok: errors.is_empty(),
            instructions,
            errors,
        }
    }
}

/// Compile a template with default options.
pub fn compile(source: &str) -> CompileOutput {
    Compiler::default().compile(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildErrorKind;

    #[test]
    fn test_compile_options_builder() {
        let options = CompileOptions::new().legacy_directives(false);
        assert!(!options.legacy_directives);
        assert!(CompileOptions::default().legacy_directives);
    }

    #[test]
    fn test_legacy_directives_toggle() {
        let source = "{{:: role system}}hi";
        let output = compile(source);
        assert!(output.ok);
        assert_eq!(output.instructions.len(), 2);

        let strict = Compiler::new(CompileOptions::new().legacy_directives(false)).compile(source);
        assert!(!strict.ok);
        assert!(matches!(
            strict.errors[0].kind,
            BuildErrorKind::Expression(_)
        ));
    }

    #[test]
    fn test_errors_are_sorted() {
        let output = compile("{{#if a}}x{{ 1 - }}");
        assert!(!output.ok);
        assert_eq!(output.errors.len(), 2);
        assert_eq!(output.errors[0].kind, BuildErrorKind::MissingEndif);
        assert!(output.errors[0].span.begin < output.errors[1].span.begin);
    }
}
