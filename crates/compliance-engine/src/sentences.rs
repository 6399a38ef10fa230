//! Sentence splitting on terminal punctuation
//!
//! A sentence ends at `.`, `!` or `?` when the mark is followed by at least one
//! whitespace character. The whitespace run separates sentences and belongs to
//! neither of them. Empty input yields a single empty sentence.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Terminal punctuation followed by a whitespace run
    static ref SENTENCE_BOUNDARY: Regex = Regex::new(r"[.!?]\s+").unwrap();
}

/// Byte ranges of every sentence in `text`, in document order
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Punctuation is a single byte, keep it with the sentence
        let end = boundary.start() + 1;
        spans.push(start..end);
        start = boundary.end();
    }

    spans.push(start..text.len());
    spans
}

/// Split `text` into sentences
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_spans(text)
        .into_iter()
        .map(|span| &text[span])
        .collect()
}
