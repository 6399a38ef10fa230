//! Question triggers answered by the QA subsystem

use super::{
    Rule, CHILD_LABOUR_ACT, CONSTITUTION_ARTICLE_15, CONSUMER_PROTECTION_ACT,
    IT_ACT_SECTION_43A, MINIMUM_WAGES_ACT,
};

/// Question and cited law, in evaluation order
pub const QUESTION_TRIGGERS: &[(&str, &str)] = &[
    ("Is child labour allowed under 14 years?", CHILD_LABOUR_ACT),
    (
        "Does this contract discriminate by gender, caste, or religion?",
        CONSTITUTION_ARTICLE_15,
    ),
    ("Does this contract violate minimum wage rules?", MINIMUM_WAGES_ACT),
    (
        "Does this contract restrict digital privacy rights?",
        IT_ACT_SECTION_43A,
    ),
    (
        "Does this contract prevent consumer protection?",
        CONSUMER_PROTECTION_ACT,
    ),
];

pub fn question_rules() -> Vec<Rule> {
    QUESTION_TRIGGERS
        .iter()
        .map(|(question, law)| Rule::question(*question, *law))
        .collect()
}
