//! Compliance rules
//!
//! A rule pairs a trigger with the law it cites. Rules are plain data held in
//! an ordered [`RuleTable`]; table order is evaluation order and output order.

pub mod keywords;
pub mod questions;

use shared_types::Violation;

use crate::interpret::{round_confidence, AnswerInterpreter};
use crate::qa::{QaError, QuestionAnswerer};

/// Child Labour (Prohibition and Regulation) Act, Section 3
pub const CHILD_LABOUR_ACT: &str = "Child Labour (Prohibition and Regulation) Act, 1986, Section 3";
/// Article 15: prohibition of discrimination on grounds of religion, caste, sex
pub const CONSTITUTION_ARTICLE_15: &str = "Indian Constitution, Article 15";
pub const MINIMUM_WAGES_ACT: &str = "Minimum Wages Act, 1948";
/// Section 43A: compensation for failure to protect personal data
pub const IT_ACT_SECTION_43A: &str = "Information Technology Act, 2000, Section 43A";
pub const CONSUMER_PROTECTION_ACT: &str = "Consumer Protection Act, 2019";

pub const KEYWORD_SUGGESTION: &str = "Please review this clause carefully.";
pub const QUESTION_SUGGESTION: &str = "This clause may violate Indian law. Please review.";

/// Literal phrase matched case-insensitively against the whole text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub law: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, law: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            law: law.into(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        !self.keyword.is_empty() && text.to_lowercase().contains(&self.keyword.to_lowercase())
    }

    fn evaluate(&self, text: &str) -> RuleOutcome {
        if !self.matches(text) {
            return RuleOutcome::Clear;
        }

        RuleOutcome::Flagged {
            violation: Violation {
                law: self.law.clone(),
                issue: format!("Possible violation related to '{}'", self.keyword),
                suggestion: KEYWORD_SUGGESTION.to_string(),
                answer: None,
                confidence: None,
            },
            needle: self.keyword.clone(),
        }
    }
}

/// Yes/no question put to the QA subsystem with the text as context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRule {
    pub question: String,
    pub law: String,
}

impl QuestionRule {
    pub fn new(question: impl Into<String>, law: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            law: law.into(),
        }
    }

    fn evaluate(&self, text: &str, ctx: &RuleContext<'_>) -> RuleOutcome {
        let Some(answerer) = ctx.answerer else {
            return RuleOutcome::Failed("no question answerer configured".to_string());
        };

        let answer = match answerer.answer(&self.question, text) {
            Ok(answer) => answer,
            Err(err) => return RuleOutcome::Failed(err.to_string()),
        };

        if !answer.has_valid_confidence() {
            let err = QaError::MalformedResponse(format!(
                "confidence {} outside [0, 1]",
                answer.confidence
            ));
            return RuleOutcome::Failed(err.to_string());
        }

        if !ctx.interpreter.is_flagged(&answer.text, answer.confidence) {
            return RuleOutcome::Clear;
        }

        RuleOutcome::Flagged {
            violation: Violation {
                law: self.law.clone(),
                issue: self.question.clone(),
                suggestion: QUESTION_SUGGESTION.to_string(),
                answer: Some(answer.text.clone()),
                confidence: Some(round_confidence(answer.confidence)),
            },
            needle: answer.text,
        }
    }
}

/// A compliance rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Keyword(KeywordRule),
    Question(QuestionRule),
}

impl Rule {
    pub fn keyword(keyword: impl Into<String>, law: impl Into<String>) -> Self {
        Rule::Keyword(KeywordRule::new(keyword, law))
    }

    pub fn question(question: impl Into<String>, law: impl Into<String>) -> Self {
        Rule::Question(QuestionRule::new(question, law))
    }

    pub fn law(&self) -> &str {
        match self {
            Rule::Keyword(rule) => &rule.law,
            Rule::Question(rule) => &rule.law,
        }
    }

    /// Evaluate this rule against the full input text
    pub fn evaluate(&self, text: &str, ctx: &RuleContext<'_>) -> RuleOutcome {
        match self {
            Rule::Keyword(rule) => rule.evaluate(text),
            Rule::Question(rule) => rule.evaluate(text, ctx),
        }
    }
}

/// Collaborators available to rules during one evaluation
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub answerer: Option<&'a dyn QuestionAnswerer>,
    pub interpreter: AnswerInterpreter,
}

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The rule fired; `needle` is what gets highlighted
    Flagged { violation: Violation, needle: String },
    Clear,
    Failed(String),
}

/// Ordered, immutable list of rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Keyword rules for the Indian-law topics
    pub fn keywords() -> Self {
        Self::new(keywords::keyword_rules())
    }

    /// Question rules for the Indian-law topics
    pub fn questions() -> Self {
        Self::new(questions::question_rules())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True if any rule needs a QA subsystem
    pub fn requires_answerer(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Question(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qa::Answer;

    struct Fixed(Result<Answer, QaError>);

    impl QuestionAnswerer for Fixed {
        fn answer(&self, _question: &str, _context: &str) -> Result<Answer, QaError> {
            self.0.clone()
        }
    }

    fn ctx(answerer: &dyn QuestionAnswerer) -> RuleContext<'_> {
        RuleContext {
            answerer: Some(answerer),
            interpreter: AnswerInterpreter::default(),
        }
    }

    #[test]
    fn test_keyword_rule_matches_whole_text_case_insensitively() {
        let rule = KeywordRule::new("minimum wage", MINIMUM_WAGES_ACT);
        assert!(rule.matches("Pay below the MINIMUM WAGE."));
        assert!(!rule.matches("Wages are fair."));
    }

    #[test]
    fn test_keyword_rule_builds_violation() {
        let outcome = Rule::keyword("digital privacy", IT_ACT_SECTION_43A)
            .evaluate("No digital privacy for staff.", &RuleContext {
                answerer: None,
                interpreter: AnswerInterpreter::default(),
            });
        match outcome {
            RuleOutcome::Flagged { violation, needle } => {
                assert_eq!(violation.law, IT_ACT_SECTION_43A);
                assert_eq!(violation.issue, "Possible violation related to 'digital privacy'");
                assert_eq!(violation.suggestion, KEYWORD_SUGGESTION);
                assert_eq!(needle, "digital privacy");
            }
            other => panic!("expected flagged outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_question_rule_flags_confident_yes() {
        let qa = Fixed(Ok(Answer::new("yes", 0.876)));
        let outcome = Rule::question("Is child labour allowed under 14 years?", CHILD_LABOUR_ACT)
            .evaluate("Children under 14 may work.", &ctx(&qa));
        match outcome {
            RuleOutcome::Flagged { violation, needle } => {
                assert_eq!(violation.issue, "Is child labour allowed under 14 years?");
                assert_eq!(violation.answer.as_deref(), Some("yes"));
                assert_eq!(violation.confidence, Some(0.88));
                assert_eq!(violation.suggestion, QUESTION_SUGGESTION);
                assert_eq!(needle, "yes");
            }
            other => panic!("expected flagged outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_question_rule_clear_on_negative_answer() {
        let qa = Fixed(Ok(Answer::new("no", 0.95)));
        let outcome = Rule::question("q", CHILD_LABOUR_ACT).evaluate("text", &ctx(&qa));
        assert_eq!(outcome, RuleOutcome::Clear);
    }

    #[test]
    fn test_question_rule_records_failure() {
        let qa = Fixed(Err(QaError::Inference("tensor shape mismatch".to_string())));
        let outcome = Rule::question("q", CHILD_LABOUR_ACT).evaluate("text", &ctx(&qa));
        assert_eq!(
            outcome,
            RuleOutcome::Failed("QA inference failed: tensor shape mismatch".to_string())
        );
    }

    #[test]
    fn test_question_rule_rejects_out_of_range_confidence() {
        let qa = Fixed(Ok(Answer::new("yes", 3.0)));
        let outcome = Rule::question("q", CHILD_LABOUR_ACT).evaluate("text", &ctx(&qa));
        assert!(matches!(outcome, RuleOutcome::Failed(msg) if msg.starts_with("Malformed")));
    }

    #[test]
    fn test_question_rule_without_answerer_fails() {
        let outcome = Rule::question("q", CHILD_LABOUR_ACT).evaluate("text", &RuleContext {
            answerer: None,
            interpreter: AnswerInterpreter::default(),
        });
        assert_eq!(
            outcome,
            RuleOutcome::Failed("no question answerer configured".to_string())
        );
    }

    #[test]
    fn test_tables_cover_topics_in_order() {
        let keywords = RuleTable::keywords();
        assert_eq!(keywords.len(), 7);
        assert!(!keywords.requires_answerer());
        assert_eq!(keywords.rules()[0].law(), CHILD_LABOUR_ACT);

        let questions = RuleTable::questions();
        let laws: Vec<_> = questions.iter().map(Rule::law).collect();
        assert_eq!(
            laws,
            vec![
                CHILD_LABOUR_ACT,
                CONSTITUTION_ARTICLE_15,
                MINIMUM_WAGES_ACT,
                IT_ACT_SECTION_43A,
                CONSUMER_PROTECTION_ACT,
            ]
        );
        assert!(questions.requires_answerer());
    }
}
