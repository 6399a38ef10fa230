//! Compliance Engine - flags contract clauses against Indian-law rules
//!
//! This crate provides:
//! - Sentence splitting and non-destructive sentence highlighting
//! - Keyword and question rule tables
//! - Answer interpretation for QA-backed rules
//! - The evaluator that ties them together

pub mod config;
pub mod error;
pub mod highlight;
pub mod interpret;
pub mod qa;
pub mod rules;
pub mod sentences;

use std::sync::Arc;

use shared_types::{EvaluationResult, Findings, RuleError, ViolationRecord};
use tracing::{debug, warn};

pub use config::{EngineConfig, Strategy};
pub use error::ConfigError;
pub use highlight::{highlight, highlight_positional, strip_highlights, HighlightMode};
pub use interpret::{interpret, AnswerInterpreter};
pub use qa::{Answer, QaError, QuestionAnswerer, Serialized};
pub use rules::{Rule, RuleOutcome, RuleTable};
pub use sentences::split_sentences;

/// ComplianceEngine entry point
pub struct ComplianceEngine {
    rules: RuleTable,
    config: EngineConfig,
    answerer: Option<Arc<dyn QuestionAnswerer>>,
}

impl ComplianceEngine {
    pub fn new(rules: RuleTable, config: EngineConfig) -> Self {
        Self {
            rules,
            config,
            answerer: None,
        }
    }

    /// Keyword strategy with the default rule table
    pub fn keyword() -> Self {
        Self::new(RuleTable::keywords(), EngineConfig::default())
    }

    /// Question strategy with the default rule table
    pub fn question(answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self::new(RuleTable::questions(), EngineConfig::default()).with_answerer(answerer)
    }

    pub fn with_answerer(mut self, answerer: Arc<dyn QuestionAnswerer>) -> Self {
        self.answerer = Some(answerer);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate `text` against every rule in table order.
    ///
    /// Returns the compliant marker with the untouched input when no record
    /// was produced. Failed question rules produce `{error}` records, which
    /// count as records: a text whose only outcome is a failure is never
    /// reported compliant.
    pub fn evaluate(&self, text: &str) -> EvaluationResult {
        let ctx = rules::RuleContext {
            answerer: self.answerer.as_deref(),
            interpreter: AnswerInterpreter::new(self.config.confidence_threshold),
        };

        let mut records = Vec::new();
        let mut highlighted = text.to_string();

        for (index, rule) in self.rules.iter().enumerate() {
            match rule.evaluate(text, &ctx) {
                RuleOutcome::Flagged { violation, needle } => {
                    debug!(rule = index, law = %violation.law, needle = %needle, "Rule flagged");
                    highlighted = self.config.highlight_mode.apply(&highlighted, &needle);
                    records.push(ViolationRecord::Violation(violation));
                }
                RuleOutcome::Clear => {
                    debug!(rule = index, law = rule.law(), "Rule clear");
                }
                RuleOutcome::Failed(error) => {
                    warn!(rule = index, law = rule.law(), %error, "Rule evaluation failed");
                    records.push(ViolationRecord::Error(RuleError { error }));
                }
            }
        }

        if records.is_empty() {
            return EvaluationResult::compliant(text);
        }

        EvaluationResult {
            violations: Findings::Violations(records),
            highlighted,
        }
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::keyword()
    }
}
