pub mod types;

pub use types::{
    ComplianceOk, EvaluationResult, Findings, RuleError, Violation, ViolationRecord,
    COMPLIANT_MESSAGE,
};
