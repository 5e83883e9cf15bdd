//! Whitespace migration between text fragments and the directives next to them.
//!
//! Directives own the whitespace that surrounds them so that a block like
//!
//! ```text
//! Intro
//! {{#if flag}}
//! Body
//! {{#endif}}
//! ```
//!
//! renders as `Intro\nBody\n` or `Intro\n` with no stray blank lines. The
//! `_inline` forms leave their surroundings untouched.

use crate::fragment::{Fragment, FragmentKind};

/// How much of the adjacent whitespace a directive takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Absorb {
    Nothing,
    /// Everything on both sides.
    All,
    /// Everything on both sides, except that the first line break before the
    /// directive stays with the preceding text.
    KeepLineBreak,
}

/// Apply whitespace migration and split off the template's leading and
/// trailing whitespace as [`FragmentKind::Whitespace`] fragments. Empty text
/// fragments are dropped.
pub fn normalize_whitespace(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    // true for each open `_inline` block
    let mut blocks: Vec<bool> = Vec::new();

    for i in 0..fragments.len() {
        let Some(keyword) = fragments[i].keyword() else {
            continue;
        };
        let absorb = classify(&keyword, &mut blocks);
        if absorb == Absorb::Nothing {
            continue;
        }

        if i > 0 && fragments[i - 1].is_text() {
            let (left, right) = fragments.split_at_mut(i);
            absorb_preceding(&mut left[i - 1], &mut right[0], absorb);
        }
        if i + 1 < fragments.len() && fragments[i + 1].is_text() {
            let (left, right) = fragments.split_at_mut(i + 1);
            absorb_following(&mut left[i], &mut right[0]);
        }
    }

    let mut fragments = split_outer_whitespace(fragments);
    fragments.retain(|f| !(f.is_text() && f.value.is_empty()));
    fragments
}

fn classify(keyword: &str, blocks: &mut Vec<bool>) -> Absorb {
    let inline = match keyword {
        "if_inline" | "foreach_inline" => {
            blocks.push(true);
            true
        }
        "if" | "foreach" => {
            blocks.push(false);
            false
        }
        "endif" | "endforeach" => blocks.pop().unwrap_or(false),
        "else" | "elseif" | "elif" => blocks.last().copied().unwrap_or(false),
        _ => return Absorb::All,
    };
    if inline {
        Absorb::Nothing
    } else {
        Absorb::KeepLineBreak
    }
}

fn absorb_preceding(text: &mut Fragment, directive: &mut Fragment, absorb: Absorb) {
    let content_len = text.value.trim_end().len();
    let mut cut = content_len;
    if absorb == Absorb::KeepLineBreak {
        if let Some(newline) = text.value[content_len..].find('\n') {
            cut = content_len + newline + 1;
        }
    }
    if cut == text.value.len() {
        return;
    }
    let moved = text.value.split_off(cut);
    directive.position -= moved.len();
    directive.value.insert_str(0, &moved);
}

fn absorb_following(directive: &mut Fragment, text: &mut Fragment) {
    let rest = text.value.trim_start();
    let moved_len = text.value.len() - rest.len();
    if moved_len == 0 {
        return;
    }
    let rest = rest.to_string();
    directive.value.push_str(&text.value[..moved_len]);
    text.value = rest;
    text.position += moved_len;
}

fn split_outer_whitespace(mut fragments: Vec<Fragment>) -> Vec<Fragment> {
    if let Some(first) = fragments.first_mut().filter(|f| f.is_text()) {
        let leading = first.value.len() - first.value.trim_start().len();
        if leading > 0 {
            let ws = Fragment::whitespace(&first.value[..leading], first.position);
            first.value.drain(..leading);
            first.position += leading;
            fragments.insert(0, ws);
        }
    }
    if let Some(last) = fragments.last_mut().filter(|f| f.is_text()) {
        let content = last.value.trim_end().len();
        if content < last.value.len() {
            let trailing = last.value.split_off(content);
            let ws = Fragment::whitespace(trailing, last.position + content);
            fragments.push(ws);
        }
    }
    fragments
}
