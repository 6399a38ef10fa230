//! Sentence highlighting for flagged clauses
//!
//! Highlighting is additive: markers are inserted around sentences and no
//! original character is removed or reordered. [`strip_highlights`] undoes it.

use std::collections::HashSet;
use std::ops::Range;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::sentences::{sentence_spans, split_sentences};

/// Opening marker placed before a flagged sentence
pub const HIGHLIGHT_OPEN: &str =
    r#"<span style="background-color: yellow; color: red; font-weight: bold;">"#;

/// Closing marker placed after a flagged sentence
pub const HIGHLIGHT_CLOSE: &str = "</span>";

/// How flagged sentences are located in the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightMode {
    /// Replace every occurrence of a matching sentence's text, including
    /// copies embedded in other sentences
    #[default]
    Literal,
    /// Wrap only the sentence spans that contain the needle
    Positional,
}

impl HighlightMode {
    pub fn apply(self, text: &str, needle: &str) -> String {
        match self {
            HighlightMode::Literal => highlight(text, needle),
            HighlightMode::Positional => highlight_positional(text, needle),
        }
    }
}

impl FromStr for HighlightMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "literal" => Ok(HighlightMode::Literal),
            "positional" => Ok(HighlightMode::Positional),
            _ => Err(ConfigError::UnknownHighlightMode(s.to_string())),
        }
    }
}

fn wrap(sentence: &str) -> String {
    format!("{}{}{}", HIGHLIGHT_OPEN, sentence, HIGHLIGHT_CLOSE)
}

/// Needle test on the sentence's own text, ignoring markers inside it
fn contains_needle(sentence: &str, needle_lower: &str) -> bool {
    !sentence.is_empty() && strip_highlights(sentence).to_lowercase().contains(needle_lower)
}

/// Byte ranges of the markers already present in `text`
fn marker_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = [HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE]
        .iter()
        .flat_map(|marker| {
            text.match_indices(marker)
                .map(|(start, m)| start..start + m.len())
        })
        .collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

fn cuts_marker(range: &Range<usize>, markers: &[Range<usize>]) -> bool {
    let inside = |pos: usize, m: &Range<usize>| pos > m.start && pos < m.end;
    markers
        .iter()
        .any(|m| inside(range.start, m) || inside(range.end, m))
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn wrap_ranges(text: &str, mut ranges: Vec<Range<usize>>) -> String {
    ranges.sort_by_key(|r| r.start);

    let mut highlighted = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in ranges {
        highlighted.push_str(&text[cursor..range.start]);
        highlighted.push_str(&wrap(&text[range.clone()]));
        cursor = range.end;
    }
    highlighted.push_str(&text[cursor..]);
    highlighted
}

/// Wrap every sentence containing `needle` (case-insensitive).
///
/// Replacement is by sentence text, not position: every copy of a matching
/// sentence's text is wrapped, wherever it occurs. Copies that overlap one
/// already chosen, or that would split an existing marker, are skipped.
pub fn highlight(text: &str, needle: &str) -> String {
    if needle.is_empty() {
        return text.to_string();
    }

    let needle_lower = needle.to_lowercase();
    let markers = marker_ranges(text);
    let mut seen = HashSet::new();
    let mut chosen: Vec<Range<usize>> = Vec::new();

    for sentence in split_sentences(text) {
        if !contains_needle(sentence, &needle_lower) || !seen.insert(sentence) {
            continue;
        }
        for (start, _) in text.match_indices(sentence) {
            let range = start..start + sentence.len();
            if cuts_marker(&range, &markers) || chosen.iter().any(|c| overlaps(c, &range)) {
                continue;
            }
            chosen.push(range);
        }
    }

    wrap_ranges(text, chosen)
}

/// Marker-free view of highlighted text with a byte map back into it
struct PlainView {
    plain: String,
    /// Byte offset in the highlighted text of each byte of `plain`
    origin: Vec<usize>,
    text_len: usize,
}

impl PlainView {
    fn new(text: &str) -> Self {
        let mut plain = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        let mut cursor = 0;

        for marker in marker_ranges(text) {
            plain.push_str(&text[cursor..marker.start]);
            origin.extend(cursor..marker.start);
            cursor = marker.end;
        }
        plain.push_str(&text[cursor..]);
        origin.extend(cursor..text.len());

        Self {
            plain,
            origin,
            text_len: text.len(),
        }
    }

    /// Map a non-empty plain range to the highlighted text, excluding markers
    /// on either side of it
    fn to_text_range(&self, span: Range<usize>) -> Range<usize> {
        let start = self.origin.get(span.start).copied().unwrap_or(self.text_len);
        let end = self.origin[span.end - 1] + 1;
        start..end
    }
}

fn is_wrapped(text: &str, range: &Range<usize>) -> bool {
    text[..range.start].ends_with(HIGHLIGHT_OPEN) && text[range.end..].starts_with(HIGHLIGHT_CLOSE)
}

/// Wrap exactly the sentence spans containing `needle` (case-insensitive).
///
/// Sentences are found in the text with markers removed, so earlier
/// highlights never hide a boundary. A sentence that is already wrapped is
/// left as is.
pub fn highlight_positional(text: &str, needle: &str) -> String {
    if needle.is_empty() {
        return text.to_string();
    }

    let needle_lower = needle.to_lowercase();
    let view = PlainView::new(text);
    let ranges = sentence_spans(&view.plain)
        .into_iter()
        .filter(|span| contains_needle(&view.plain[span.clone()], &needle_lower))
        .map(|span| view.to_text_range(span))
        .filter(|range| !is_wrapped(text, range))
        .collect();

    wrap_ranges(text, ranges)
}

/// Remove all highlight markers
pub fn strip_highlights(text: &str) -> String {
    text.replace(HIGHLIGHT_OPEN, "").replace(HIGHLIGHT_CLOSE, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wraps_only_matching_sentence() {
        let text = "Wages are fair. Digital privacy is waived. Holidays apply.";
        let expected = format!(
            "Wages are fair. {}Digital privacy is waived.{} Holidays apply.",
            HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE
        );
        assert_eq!(highlight(text, "digital privacy"), expected);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let out = highlight("MINIMUM WAGE is not paid.", "minimum wage");
        assert!(out.starts_with(HIGHLIGHT_OPEN));
    }

    #[test]
    fn test_no_match_returns_text_unchanged() {
        let text = "Nothing to see here. Move along.";
        assert_eq!(highlight(text, "child labour"), text);
        assert_eq!(highlight_positional(text, "child labour"), text);
    }

    #[test]
    fn test_empty_needle_is_noop() {
        let text = "Some clause.";
        assert_eq!(highlight(text, ""), text);
        assert_eq!(highlight_positional(text, ""), text);
    }

    #[test]
    fn test_literal_wraps_duplicate_sentences_once_each() {
        let text = "Yes. Minors work here. Yes.";
        let out = highlight(text, "yes");
        assert_eq!(out.matches(HIGHLIGHT_OPEN).count(), 2);
        assert_eq!(strip_highlights(&out), text);
    }

    #[test]
    fn test_literal_wraps_sentence_text_embedded_elsewhere() {
        // The first sentence's text also occurs inside the second sentence
        let text = "Data is shared. Consent says Data is shared.with partners.";

        let literal = highlight(text, "shared");
        let expected_literal = format!(
            "{open}Data is shared.{close} Consent says {open}Data is shared.{close}with partners.",
            open = HIGHLIGHT_OPEN,
            close = HIGHLIGHT_CLOSE
        );
        assert_eq!(literal, expected_literal);

        let positional = highlight_positional(text, "shared");
        let expected_positional = format!(
            "{open}Data is shared.{close} {open}Consent says Data is shared.with partners.{close}",
            open = HIGHLIGHT_OPEN,
            close = HIGHLIGHT_CLOSE
        );
        assert_eq!(positional, expected_positional);

        assert_eq!(strip_highlights(&literal), text);
        assert_eq!(strip_highlights(&positional), text);
    }

    #[test]
    fn test_never_splits_existing_marker() {
        // "red" also occurs inside the marker's style attribute
        let text = "Unpaid work. Paid. red";
        let out = highlight(&highlight(text, "unpaid"), "red");
        assert_eq!(
            out,
            format!(
                "{open}Unpaid work.{close} Paid. {open}red{close}",
                open = HIGHLIGHT_OPEN,
                close = HIGHLIGHT_CLOSE
            )
        );
        assert_eq!(strip_highlights(&out), text);
    }

    #[test]
    fn test_composition_accumulates_markers() {
        let text = "Child labour is used. Minimum wage is ignored.";
        let once = highlight(text, "child labour");
        let twice = highlight(&once, "minimum wage");
        assert_eq!(twice.matches(HIGHLIGHT_OPEN).count(), 2);
        assert_eq!(strip_highlights(&twice), text);
    }

    #[test]
    fn test_positional_keeps_boundaries_after_earlier_highlights() {
        let text = "Child labour is used. Minimum wage is ignored. Done.";
        let once = highlight_positional(text, "child labour");
        let twice = highlight_positional(&once, "minimum wage");
        assert_eq!(
            twice,
            format!(
                "{open}Child labour is used.{close} {open}Minimum wage is ignored.{close} Done.",
                open = HIGHLIGHT_OPEN,
                close = HIGHLIGHT_CLOSE
            )
        );
    }

    #[test]
    fn test_positional_does_not_rewrap_or_spread() {
        let text = "Child labour and minimum wage issues. Rent is due.";
        let once = highlight_positional(text, "child labour");
        let twice = highlight_positional(&once, "minimum wage");
        assert_eq!(
            twice,
            format!(
                "{open}Child labour and minimum wage issues.{close} Rent is due.",
                open = HIGHLIGHT_OPEN,
                close = HIGHLIGHT_CLOSE
            )
        );
        assert_eq!(highlight_positional(&twice, "child labour"), twice);
    }

    #[test]
    fn test_literal_merges_sentence_after_highlight() {
        // The closing marker hides the boundary, so the next pass sees one sentence
        let text = "Child labour is used. Minimum wage is ignored.";
        let twice = highlight(&highlight(text, "child labour"), "minimum wage");
        assert!(twice.starts_with(&format!("{open}{open}", open = HIGHLIGHT_OPEN)));
        assert_eq!(strip_highlights(&twice), text);
    }

    #[test]
    fn test_mode_parses_from_str() {
        assert_eq!("literal".parse::<HighlightMode>(), Ok(HighlightMode::Literal));
        assert_eq!(" Positional ".parse::<HighlightMode>(), Ok(HighlightMode::Positional));
        assert!("spans".parse::<HighlightMode>().is_err());
    }
}
