use crate::error::{Error, Result};
use crate::index::WeightModel;
use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_SUMMARY_SENTENCES: usize = 2;

lazy_static! {
    static ref TERMINATOR: Regex = Regex::new(r#"[.!?]+["'”’)\]]*(?:\s+|$)"#).expect("valid regex");
}

/// Splits on `.`, `!` or `?` followed by whitespace or end of text. Trailing
/// text without a terminator is the last sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in TERMINATOR.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Extractive summary: the `n` sentences with the highest total TF-IDF weight
/// under `model`, kept in their original order. Paragraphs with `n` or fewer
/// sentences come back unchanged.
pub fn summarize(paragraph: &str, model: &WeightModel<'_>, n: usize) -> Result<String> {
    if n == 0 {
        return Err(Error::invalid("summary sentence count must be positive"));
    }
    let sentences = split_sentences(paragraph);
    if sentences.len() <= n {
        return Ok(paragraph.to_string());
    }

    let mut scored: Vec<(usize, f32)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (i, model.vectorize(s).total_weight()))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    let mut chosen: Vec<usize> = scored.into_iter().take(n).map(|(i, _)| i).collect();
    chosen.sort_unstable();
    Ok(chosen.into_iter().map(|i| sentences[i]).collect::<Vec<_>>().join(" "))
}
