//! Splitting template source into text, expression and directive fragments.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::span::Span;

/// Matches one `{{ ... }}` element, possibly spanning lines.
static ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("invalid element regex"));

/// `{{#keyword field}}`
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<open>\{\{\s*)(?P<marker>#)(?P<keyword>\S+)(?P<gap>\s*)(?P<field>.*?)(?P<close>\s*\}\})$")
        .expect("invalid directive regex")
});

/// `{{:: keyword field}}`
static LEGACY_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<open>\{\{\s*)(?P<marker>::\s*)(?P<keyword>\S+)(?P<gap>\s*)(?P<field>.*?)(?P<close>\s*\}\})$")
        .expect("invalid legacy directive regex")
});

static EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<open>\{\{\s*)(?P<body>.*?)(?P<close>\s*\}\})$").expect("invalid expression regex")
});

/// A piece of fragment text together with the text around it inside the
/// enclosing `{{ }}` element. `position` is the absolute offset of `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub prefix: String,
    pub suffix: String,
    pub position: usize,
}

impl Segment {
    pub fn span(&self) -> Span {
        Span::at(self.position, self.text.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FragmentKind {
    Text,
    /// Leading or trailing whitespace of the whole template.
    Whitespace,
    Expression { expression: Segment },
    Directive { keyword: Segment, field: Segment },
}

/// One contiguous piece of a template.
///
/// `value` starts out as the exact source text of the fragment. Whitespace
/// handling may move surrounding whitespace into directive values, in which
/// case `position` moves with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    #[serde(flatten)]
    pub kind: FragmentKind,
    pub value: String,
    pub position: usize,
}

impl Fragment {
    pub fn text(value: impl Into<String>, position: usize) -> Self {
        Self {
            kind: FragmentKind::Text,
            value: value.into(),
            position,
        }
    }

    pub fn whitespace(value: impl Into<String>, position: usize) -> Self {
        Self {
            kind: FragmentKind::Whitespace,
            value: value.into(),
            position,
        }
    }

    pub fn span(&self) -> Span {
        Span::at(self.position, self.value.len())
    }

    /// Span of the `{{ ... }}` element itself, ignoring absorbed whitespace.
    pub fn element_span(&self) -> Span {
        match &self.kind {
            FragmentKind::Directive { keyword, field } => {
                let begin = keyword.position - keyword.prefix.len();
                Span::new(begin, field.position + field.text.len() + field.suffix.len())
            }
            FragmentKind::Expression { expression } => Span::new(
                expression.position - expression.prefix.len(),
                expression.position + expression.text.len() + expression.suffix.len(),
            ),
            FragmentKind::Text | FragmentKind::Whitespace => self.span(),
        }
    }

    /// Lowercased directive keyword, if this is a directive.
    pub fn keyword(&self) -> Option<String> {
        match &self.kind {
            FragmentKind::Directive { keyword, .. } => Some(keyword.text.to_lowercase()),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, FragmentKind::Text)
    }
}

/// Fragmenter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOptions {
    /// Recognize the `{{:: keyword}}` directive spelling.
    pub legacy_directives: bool,
}

impl Default for FragmentOptions {
    fn default() -> Self {
        Self {
            legacy_directives: true,
        }
    }
}

/// Split `source` into raw fragments, without any whitespace handling.
pub fn split_fragments(source: &str, options: FragmentOptions) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0;

    for element in ELEMENT.find_iter(source) {
        if element.start() > cursor {
            fragments.push(Fragment::text(&source[cursor..element.start()], cursor));
        }
        fragments.push(classify_element(element.as_str(), element.start(), options));
        cursor = element.end();
    }
    if cursor < source.len() {
        fragments.push(Fragment::text(&source[cursor..], cursor));
    }

    fragments
}

fn classify_element(raw: &str, position: usize, options: FragmentOptions) -> Fragment {
    if let Some(caps) = DIRECTIVE.captures(raw) {
        return directive_fragment(raw, position, &caps);
    }
    if options.legacy_directives {
        if let Some(caps) = LEGACY_DIRECTIVE.captures(raw) {
            return directive_fragment(raw, position, &caps);
        }
    }
    // The expression regex matches any element, it cannot fail here.
    let (prefix, text, suffix) = match EXPRESSION.captures(raw) {
        Some(caps) => (group(&caps, "open"), group(&caps, "body"), group(&caps, "close")),
        None => ("", raw, ""),
    };
    Fragment {
        kind: FragmentKind::Expression {
            expression: Segment {
                text: text.to_string(),
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                position: position + prefix.len(),
            },
        },
        value: raw.to_string(),
        position,
    }
}

fn directive_fragment(raw: &str, position: usize, caps: &Captures<'_>) -> Fragment {
    let open = group(caps, "open");
    let marker = group(caps, "marker");
    let keyword = group(caps, "keyword");
    let gap = group(caps, "gap");
    let field = group(caps, "field");
    let close = group(caps, "close");

    let keyword_prefix = format!("{open}{marker}");
    let keyword_position = position + keyword_prefix.len();
    let field_prefix = format!("{keyword_prefix}{keyword}{gap}");
    let field_position = position + field_prefix.len();

    Fragment {
        kind: FragmentKind::Directive {
            keyword: Segment {
                text: keyword.to_string(),
                prefix: keyword_prefix,
                suffix: format!("{gap}{field}{close}"),
                position: keyword_position,
            },
            field: Segment {
                text: field.to_string(),
                prefix: field_prefix,
                suffix: close.to_string(),
                position: field_position,
            },
        },
        value: raw.to_string(),
        position,
    }
}

fn group<'t>(caps: &Captures<'t>, name: &str) -> &'t str {
    caps.name(name).map(|m| m.as_str()).unwrap_or("")
}
