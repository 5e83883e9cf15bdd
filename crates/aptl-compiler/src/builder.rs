//! Fragment-to-instruction dispatch.

use aptl_lexer::{Fragment, FragmentKind, Segment};
use aptl_parser::{parse_expression_at, Expr};

use crate::error::{BuildError, BuildErrorKind};
use crate::instruction::{Instruction, Single};
use crate::{foreach, if_chain};

/// Directive keywords, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Role,
    Split,
    If,
    IfInline,
    ElseIf,
    Else,
    EndIf,
    Foreach,
    ForeachInline,
    EndForeach,
}

impl Keyword {
    pub(crate) fn of(fragment: &Fragment) -> Option<Keyword> {
        let keyword = match fragment.keyword()?.as_str() {
            "role" => Keyword::Role,
            "split" => Keyword::Split,
            "if" => Keyword::If,
            "if_inline" => Keyword::IfInline,
            "elseif" | "elif" => Keyword::ElseIf,
            "else" => Keyword::Else,
            "endif" => Keyword::EndIf,
            "foreach" => Keyword::Foreach,
            "foreach_inline" => Keyword::ForeachInline,
            "endforeach" => Keyword::EndForeach,
            _ => return None,
        };
        Some(keyword)
    }
}

/// Forward-only view over the fragment list shared by all block builders.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    fragments: &'a [Fragment],
    index: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(fragments: &'a [Fragment]) -> Self {
        Self {
            fragments,
            index: 0,
        }
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = &'a Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        let fragment = self.fragments.get(self.index)?;
        self.index += 1;
        Some(fragment)
    }
}

/// Turns fragments into instructions, collecting every error on the way.
#[derive(Debug, Default)]
pub(crate) struct InstructionBuilder {
    errors: Vec<BuildError>,
}

impl InstructionBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, err: BuildError) {
        tracing::debug!(error = %err, "build error");
        self.errors.push(err);
    }

    pub(crate) fn into_errors(self) -> Vec<BuildError> {
        self.errors
    }

    /// Build one fragment. Block directives keep pulling fragments from
    /// `cursor` until their closing keyword.
    pub(crate) fn build<'a>(
        &mut self,
        fragment: &'a Fragment,
        cursor: &mut Cursor<'a>,
    ) -> Option<Instruction> {
        match &fragment.kind {
            FragmentKind::Whitespace => None,
            FragmentKind::Text => Some(Instruction::text(fragment.value.clone(), fragment.span())),
            FragmentKind::Expression { expression } => {
                let expr = self.expression(expression)?;
                Some(Instruction::Single(Single::Expression {
                    expr,
                    span: fragment.element_span(),
                }))
            }
            FragmentKind::Directive { field, .. } => match Keyword::of(fragment) {
                Some(Keyword::Role) => Some(Instruction::Single(Single::Role {
                    role: field.text.clone(),
                    span: fragment.element_span(),
                })),
                Some(Keyword::Split) => Some(Instruction::Single(Single::Split {
                    span: fragment.element_span(),
                })),
                Some(Keyword::If | Keyword::IfInline) => if_chain::build(self, fragment, cursor),
                Some(Keyword::Foreach | Keyword::ForeachInline) => {
                    foreach::build(self, fragment, cursor)
                }
                Some(Keyword::ElseIf | Keyword::Else | Keyword::EndIf | Keyword::EndForeach)
                | None => {
                    self.record(BuildError::at_fragment(
                        BuildErrorKind::InvalidDirective,
                        fragment,
                    ));
                    None
                }
            },
        }
    }

    /// Parse the text of `segment` as an expression with absolute spans.
    pub(crate) fn expression(&mut self, segment: &Segment) -> Option<Expr> {
        match parse_expression_at(&segment.text, segment.position) {
            Ok(expr) => Some(expr),
            Err(err) => {
                self.record(err.into());
                None
            }
        }
    }
}
