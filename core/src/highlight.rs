use crate::preprocess::{fold, tokens, Language};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Query tokens shorter than this are not highlighted.
pub const MIN_HIGHLIGHT_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    pub open: String,
    pub close: String,
}

impl Markup {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self { open: open.into(), close: close.into() }
    }
}

impl Default for Markup {
    fn default() -> Self {
        Self::new("<em>", "</em>")
    }
}

lazy_static! {
    // A word together with any punctuation joined inside it, e.g. `COVID-19`
    // or `don't`. Folding such a run yields exactly one token.
    static ref WORD_RUN: Regex =
        Regex::new(r"[\p{L}\p{M}\p{N}]+(?:[\p{P}\p{S}]+[\p{L}\p{M}\p{N}]+)*").expect("valid regex");
}

/// Wraps whole-word occurrences of the query's tokens in `markup`. A word in
/// `text` matches when it folds (NFKC, lowercase, punctuation removed) to a
/// query token, so `ﬁbrosis` matches `fibrosis` and `COVID-19` matches
/// `covid19`. Text already inside a markup span is left alone, so applying the
/// same highlight twice changes nothing. Returns `text` unchanged when there
/// is nothing to mark.
pub fn highlight(text: &str, query: &str, language: Language, markup: &Markup) -> String {
    let terms = query_terms(query, language);
    if terms.is_empty() || markup.open.is_empty() {
        return text.to_string();
    }
    highlight_outside_markup(text, &terms, markup)
}

fn query_terms(query: &str, language: Language) -> HashSet<String> {
    tokens(query, language)
        .into_iter()
        .filter(|t| t.chars().count() >= MIN_HIGHLIGHT_CHARS)
        .collect()
}

fn highlight_outside_markup(text: &str, terms: &HashSet<String>, markup: &Markup) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open_at) = rest.find(&markup.open) {
        out.push_str(&wrap(&rest[..open_at], terms, markup));
        let body_at = open_at + markup.open.len();
        let span_end = rest[body_at..]
            .find(&markup.close)
            .map_or(rest.len(), |i| body_at + i + markup.close.len());
        out.push_str(&rest[open_at..span_end]);
        rest = &rest[span_end..];
    }
    out.push_str(&wrap(rest, terms, markup));
    out
}

fn wrap(segment: &str, terms: &HashSet<String>, markup: &Markup) -> String {
    WORD_RUN
        .replace_all(segment, |caps: &regex::Captures| {
            let word = &caps[0];
            if terms.contains(&fold(word)) {
                format!("{}{}{}", markup.open, word, markup.close)
            } else {
                word.to_string()
            }
        })
        .into_owned()
}
