//! Interpretation of QA answers
//!
//! The gate is deliberately narrow: the lowercased answer must equal one of
//! [`AFFIRMATIVE_ANSWERS`] exactly. Paraphrases such as "yes, it is" or
//! "permitted" are not flagged.

/// Answers that count as an affirmative reply to a compliance question
pub const AFFIRMATIVE_ANSWERS: &[&str] = &["yes", "true", "allowed"];

/// Confidence an answer must strictly exceed to be flagged
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerInterpreter {
    threshold: f64,
}

impl AnswerInterpreter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff the answer is affirmative and `confidence > threshold`
    pub fn is_flagged(&self, answer: &str, confidence: f64) -> bool {
        let answer = answer.to_lowercase();
        AFFIRMATIVE_ANSWERS.contains(&answer.as_str()) && confidence > self.threshold
    }
}

impl Default for AnswerInterpreter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

/// Interpret with the default threshold
pub fn interpret(answer: &str, confidence: f64) -> bool {
    AnswerInterpreter::default().is_flagged(answer, confidence)
}

/// Round a confidence score to two decimal places
pub fn round_confidence(confidence: f64) -> f64 {
    (confidence * 100.0).round() / 100.0
}
