//! Question-answering capability used by question rules
//!
//! The engine only depends on [`QuestionAnswerer`]. A model implementation is
//! created once at startup and shared read-only across evaluations.

use std::sync::Mutex;

use thiserror::Error;

/// An extracted answer with the model's confidence in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub confidence: f64,
}

impl Answer {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }

    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Failures of the QA subsystem
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QaError {
    #[error("QA model unavailable: {0}")]
    Unavailable(String),

    #[error("QA inference failed: {0}")]
    Inference(String),

    #[error("Malformed QA response: {0}")]
    MalformedResponse(String),
}

/// Answers a natural-language question against a context passage
pub trait QuestionAnswerer: Send + Sync {
    fn answer(&self, question: &str, context: &str) -> Result<Answer, QaError>;
}

/// Serializes calls into an answerer whose runtime is not reentrant
pub struct Serialized<Q> {
    inner: Q,
    gate: Mutex<()>,
}

impl<Q: QuestionAnswerer> Serialized<Q> {
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

impl<Q: QuestionAnswerer> QuestionAnswerer for Serialized<Q> {
    fn answer(&self, question: &str, context: &str) -> Result<Answer, QaError> {
        let _guard = self
            .gate
            .lock()
            .map_err(|_| QaError::Unavailable("answerer lock poisoned".to_string()))?;
        self.inner.answer(question, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Records the highest number of concurrent calls it observed
    struct ConcurrencyProbe {
        active: AtomicUsize,
        peak: Arc<AtomicUsize>,
    }

    impl QuestionAnswerer for ConcurrencyProbe {
        fn answer(&self, _question: &str, _context: &str) -> Result<Answer, QaError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Answer::new("no", 0.1))
        }
    }

    #[test]
    fn test_serialized_allows_one_call_at_a_time() {
        let peak = Arc::new(AtomicUsize::new(0));
        let shared = Arc::new(Serialized::new(ConcurrencyProbe {
            active: AtomicUsize::new(0),
            peak: Arc::clone(&peak),
        }));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.answer("q", "c"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_confidence_range_check() {
        assert!(Answer::new("yes", 0.0).has_valid_confidence());
        assert!(Answer::new("yes", 1.0).has_valid_confidence());
        assert!(!Answer::new("yes", 1.2).has_valid_confidence());
        assert!(!Answer::new("yes", f64::NAN).has_valid_confidence());
    }

    #[test]
    fn test_error_messages() {
        let err = QaError::Unavailable("weights missing".to_string());
        assert_eq!(err.to_string(), "QA model unavailable: weights missing");
    }
}
