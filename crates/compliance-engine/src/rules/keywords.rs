//! Keyword triggers
//!
//! Each keyword is a lowercase phrase tested by containment against the whole
//! text, not per sentence.

use super::{
    Rule, CHILD_LABOUR_ACT, CONSTITUTION_ARTICLE_15, CONSUMER_PROTECTION_ACT,
    IT_ACT_SECTION_43A, MINIMUM_WAGES_ACT,
};

/// Keyword and cited law, in evaluation order
pub const KEYWORD_TRIGGERS: &[(&str, &str)] = &[
    ("child labour", CHILD_LABOUR_ACT),
    ("gender discrimination", CONSTITUTION_ARTICLE_15),
    ("religion discrimination", CONSTITUTION_ARTICLE_15),
    ("caste discrimination", CONSTITUTION_ARTICLE_15),
    ("minimum wage", MINIMUM_WAGES_ACT),
    ("digital privacy", IT_ACT_SECTION_43A),
    ("consumer protection", CONSUMER_PROTECTION_ACT),
];

pub fn keyword_rules() -> Vec<Rule> {
    KEYWORD_TRIGGERS
        .iter()
        .map(|(keyword, law)| Rule::keyword(*keyword, *law))
        .collect()
}
