//! Answer span selection from start/end logits

/// Best answer span within one window, in token indices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanCandidate {
    pub start: usize,
    pub end: usize,
    /// Product of the start and end probabilities
    pub score: f32,
}

/// Softmax over the allowed positions; disallowed positions get probability 0
pub fn masked_softmax(logits: &[f32], allowed: &[bool]) -> Vec<f32> {
    let max = logits
        .iter()
        .zip(allowed)
        .filter(|(_, ok)| **ok)
        .map(|(&l, _)| l)
        .fold(f32::NEG_INFINITY, f32::max);

    if max == f32::NEG_INFINITY {
        return vec![0.0; logits.len()];
    }

    let exps: Vec<f32> = logits
        .iter()
        .zip(allowed)
        .map(|(&l, &ok)| if ok { (l - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Highest-scoring span `start <= end < start + max_answer_len` over allowed tokens
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    allowed: &[bool],
    max_answer_len: usize,
) -> Option<SpanCandidate> {
    let start_probs = masked_softmax(start_logits, allowed);
    let end_probs = masked_softmax(end_logits, allowed);

    let mut best: Option<SpanCandidate> = None;
    for start in (0..start_probs.len()).filter(|&i| allowed[i]) {
        let last = (start + max_answer_len).min(end_probs.len());
        for end in (start..last).filter(|&j| allowed[j]) {
            let score = start_probs[start] * end_probs[end];
            if best.map_or(true, |b| score > b.score) {
                best = Some(SpanCandidate { start, end, score });
            }
        }
    }
    best
}
