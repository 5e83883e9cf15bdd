//! Tokenizer for the expression language inside `{{ }}`.
//!
//! Tokens are positionless; callers recover offsets by summing token lengths,
//! which is why whitespace is kept as [`RawTokenKind::Space`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawTokenKind {
    Number,
    String,
    Operator,
    Identifier,
    Paren,
    Space,
    Indexor,
    Delimiter,
}

impl fmt::Display for RawTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RawTokenKind::Number => "number",
            RawTokenKind::String => "string",
            RawTokenKind::Operator => "operator",
            RawTokenKind::Identifier => "identifier",
            RawTokenKind::Paren => "paren",
            RawTokenKind::Space => "space",
            RawTokenKind::Indexor => "indexor",
            RawTokenKind::Delimiter => "delimiter",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawToken {
    pub kind: RawTokenKind,
    pub text: String,
}

impl RawToken {
    pub fn new(kind: RawTokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The only lexical failure: text that no token pattern accepts.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("invalid token '{text}' at {span}")]
pub struct LexError {
    pub span: Span,
    pub text: String,
}

/// Digit-led identifiers such as `1a` or `:3.5x`.
static INVALID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:?[0-9]+(?:\.[0-9]+)?[A-Za-z_][A-Za-z0-9_]*").expect("invalid token regex")
});

/// Token patterns in priority order. Each is anchored at the cursor.
static PATTERNS: LazyLock<Vec<(RawTokenKind, Regex)>> = LazyLock::new(|| {
    [
        (RawTokenKind::Number, r"^[0-9]+(?:\.[0-9]+)?"),
        (
            RawTokenKind::String,
            r#"^(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#,
        ),
        (
            RawTokenKind::Operator,
            r"^(?:\+|-|\*|/|%|!=|==|<=|>=|<|>|&&|\|\||\.)",
        ),
        (RawTokenKind::Identifier, r"^:?[A-Za-z_][A-Za-z0-9_]*"),
        (RawTokenKind::Paren, r"^[()]"),
        (RawTokenKind::Space, r"^\s+"),
        (RawTokenKind::Indexor, r"^[\[\]]"),
        (RawTokenKind::Delimiter, r"^,"),
    ]
    .into_iter()
    .map(|(kind, pattern)| {
        let regex = Regex::new(pattern).expect("invalid token pattern");
        (kind, regex)
    })
    .collect()
});

/// Split an expression into raw tokens.
///
/// The first matching pattern wins, in the order number, string, operator,
/// identifier, paren, space, indexor, delimiter. Spans in errors are relative
/// to `input`.
pub fn tokenize(input: &str) -> Result<Vec<RawToken>, LexError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];

        if let Some(m) = INVALID.find(rest) {
            return Err(LexError {
                span: Span::at(pos, m.len()),
                text: m.as_str().to_string(),
            });
        }

        let matched = PATTERNS
            .iter()
            .find_map(|(kind, regex)| regex.find(rest).map(|m| (*kind, m.as_str())));

        match matched {
            Some((kind, text)) => {
                pos += text.len();
                tokens.push(RawToken::new(kind, text));
            }
            None => {
                let ch = rest.chars().next().map(char::len_utf8).unwrap_or(1);
                return Err(LexError {
                    span: Span::at(pos, ch),
                    text: rest[..ch].to_string(),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use RawTokenKind::*;

    fn kinds(input: &str) -> Vec<RawTokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("a + 1.5 * (b - 2)"),
            vec![
                Identifier, Space, Operator, Space, Number, Space, Operator, Space, Paren,
                Identifier, Space, Operator, Space, Number, Paren
            ]
        );
    }

    #[test]
    fn test_operators_prefer_longest() {
        let tokens = tokenize("a<=b&&c!=d").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "<=", "b", "&&", "c", "!=", "d"]);
    }

    #[test]
    fn test_strings_with_escapes() {
        let tokens = tokenize(r#""say \"hi\"" + 'it\'s'"#).unwrap();
        assert_eq!(tokens[0], RawToken::new(String, r#""say \"hi\"""#));
        assert_eq!(tokens[4], RawToken::new(String, r"'it\'s'"));
    }

    #[test]
    fn test_access_index_and_call() {
        assert_eq!(
            kinds(":fn(x, y[0]).z"),
            vec![
                Identifier, Paren, Identifier, Delimiter, Space, Identifier, Indexor, Number,
                Indexor, Paren, Operator, Identifier
            ]
        );
    }

    #[test]
    fn test_digit_led_identifier_is_invalid() {
        let err = tokenize("x + 3.14abc").unwrap_err();
        assert_eq!(err.span, Span::new(4, 11));
        assert_eq!(err.text, "3.14abc");

        let err = tokenize(":1a").unwrap_err();
        assert_eq!(err.span, Span::new(0, 3));
    }

    #[test]
    fn test_unknown_character() {
        let err = tokenize("a ! b").unwrap_err();
        assert_eq!(err.span, Span::new(2, 3));
        assert_eq!(err.text, "!");

        let err = tokenize("a = b").unwrap_err();
        assert_eq!(err.text, "=");
    }

    #[test]
    fn test_number_after_dot() {
        let tokens = tokenize("data.1").unwrap();
        assert_eq!(tokens[1], RawToken::new(Operator, "."));
        assert_eq!(tokens[2], RawToken::new(Number, "1"));
    }
}
