use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Message carried by the compliant sentinel when serialized
pub const COMPLIANT_MESSAGE: &str = "✅ Compliant. No major legal risks detected.";

/// A single finding produced when a rule fires
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    pub law: String,   // e.g., "Minimum Wages Act, 1948"
    pub issue: String, // Keyword description or the question that was asked
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>, // Raw QA answer (question rules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>, // Rounded to 2 decimals (question rules only)
}

/// A rule that could not be evaluated, recorded in place of a finding
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuleError {
    pub error: String,
}

/// One entry of the violations list
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ViolationRecord {
    Violation(Violation),
    Error(RuleError),
}

impl ViolationRecord {
    pub fn as_violation(&self) -> Option<&Violation> {
        match self {
            ViolationRecord::Violation(v) => Some(v),
            ViolationRecord::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ViolationRecord::Error(_))
    }
}

/// Sentinel meaning "no rule fired".
///
/// Kept as its own type so it can never be confused with an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComplianceOk;

impl Serialize for ComplianceOk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(COMPLIANT_MESSAGE)
    }
}

impl<'de> Deserialize<'de> for ComplianceOk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == COMPLIANT_MESSAGE {
            Ok(ComplianceOk)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected compliant marker, got '{}'",
                raw
            )))
        }
    }
}

/// Either the compliant sentinel or the ordered records of the rules that fired
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Findings {
    Compliant(ComplianceOk),
    Violations(Vec<ViolationRecord>),
}

impl Findings {
    pub fn is_compliant(&self) -> bool {
        matches!(self, Findings::Compliant(_))
    }

    /// Records in rule order; empty for the compliant sentinel
    pub fn records(&self) -> &[ViolationRecord] {
        match self {
            Findings::Compliant(_) => &[],
            Findings::Violations(records) => records,
        }
    }
}

/// Output of one evaluation call
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvaluationResult {
    pub violations: Findings,
    pub highlighted: String, // Input text with offending sentences wrapped
}

impl EvaluationResult {
    pub fn compliant(original: &str) -> Self {
        Self {
            violations: Findings::Compliant(ComplianceOk),
            highlighted: original.to_string(),
        }
    }

    pub fn violation_count(&self) -> usize {
        self.violations
            .records()
            .iter()
            .filter(|r| r.as_violation().is_some())
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .records()
            .iter()
            .filter(|r| r.is_error())
            .count()
    }
}
