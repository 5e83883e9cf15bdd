//! Lexical layer for APTL prompt templates.
//!
//! Two tokenizers live here: the fragmenter, which cuts a template into
//! text, `{{expression}}` and `{{#directive}}` pieces, and the expression
//! tokenizer used on the inside of those pieces.

mod fragment;
mod lexer;
mod span;
mod whitespace;

pub use fragment::{split_fragments, Fragment, FragmentKind, FragmentOptions, Segment};
pub use lexer::{tokenize, LexError, RawToken, RawTokenKind};
pub use span::Span;
pub use whitespace::normalize_whitespace;

/// Split a template into fragments with whitespace migration applied.
pub fn fragment(source: &str, options: FragmentOptions) -> Vec<Fragment> {
    normalize_whitespace(split_fragments(source, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_roles() {
        let source = "{{#role system}}\nYou are helpful.\n{{#role user}}\nHi {{name}}!";
        let fragments = fragment(source, FragmentOptions::default());
        let kinds: Vec<&str> = fragments
            .iter()
            .map(|f| match f.kind {
                FragmentKind::Text => "text",
                FragmentKind::Whitespace => "ws",
                FragmentKind::Expression { .. } => "expr",
                FragmentKind::Directive { .. } => "directive",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["directive", "text", "directive", "text", "expr", "text"]
        );
        assert_eq!(fragments[1].value, "You are helpful.");
        assert_eq!(fragments[3].value, "Hi ");
    }

    #[test]
    fn test_values_cover_source() {
        let source = "  A {{#if x}}\n B\n{{#else}}\nC{{#endif}}  ";
        let fragments = fragment(source, FragmentOptions::default());
        let rebuilt: String = fragments.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(rebuilt, source);
        for f in &fragments {
            assert_eq!(&source[f.span().begin..f.span().end], f.value);
        }
    }
}
