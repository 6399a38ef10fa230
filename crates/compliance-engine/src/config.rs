//! Engine configuration
//!
//! Handles the matching strategy, highlight mode and confidence threshold.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::highlight::HighlightMode;
use crate::interpret::DEFAULT_CONFIDENCE_THRESHOLD;

/// Rule matching strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Case-insensitive keyword containment
    #[default]
    Keyword,
    /// Yes/no questions answered by a QA model
    Question,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" | "keywords" => Ok(Strategy::Keyword),
            "question" | "questions" | "qa" => Ok(Strategy::Question),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Keyword => write!(f, "keyword"),
            Strategy::Question => write!(f, "question"),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Confidence an affirmative answer must strictly exceed
    pub confidence_threshold: f64,
    /// How flagged sentences are wrapped
    pub highlight_mode: HighlightMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            highlight_mode: HighlightMode::Literal,
        }
    }
}

impl EngineConfig {
    /// Set the confidence threshold, rejecting values outside `[0, 1]`
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold.to_string()));
        }
        self.confidence_threshold = threshold;
        Ok(self)
    }

    pub fn with_highlight_mode(mut self, mode: HighlightMode) -> Self {
        self.highlight_mode = mode;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Expected variables:
    /// - COMPLIANCE_CONFIDENCE_THRESHOLD: number in [0, 1] (default: 0.5)
    /// - COMPLIANCE_HIGHLIGHT_MODE: "literal" or "positional" (default: "literal")
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("COMPLIANCE_CONFIDENCE_THRESHOLD") {
            let threshold: f64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidThreshold(raw.clone()))?;
            config = config.with_confidence_threshold(threshold)?;
        }

        if let Some(raw) = lookup("COMPLIANCE_HIGHLIGHT_MODE") {
            config = config.with_highlight_mode(raw.parse()?);
        }

        Ok(config)
    }
}
