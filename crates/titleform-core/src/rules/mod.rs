//! Declarative field rules
//!
//! Every validator and visibility predicate on the form is one of these
//! variants. They serialize to JSON (`{"kind": "...", ...}`) and are run by
//! the interpreter in [`eval`] against the full form state.

pub mod eval;

use serde::{Deserialize, Serialize};
use shared_types::FieldValue;

pub use eval::{EvalContext, RuleSet};

/// Generic error recorded for required fields without a custom message
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// A validation rule attached to a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Non-empty text or a checked box
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Whole-value regex match
    Regex {
        pattern: String,
        message: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    /// Integer between two inclusive bounds
    Range {
        min: Bound,
        max: Bound,
        message: String,
    },
    /// MM-DD-YYYY, calendar-valid, not after today
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Required only while `when` holds
    ConditionalRequired { when: Condition, message: String },
    /// At least one member of `group` must be checked
    AtLeastOneOf { group: Vec<String>, message: String },
    /// This field and `partner` are both empty or both filled
    PairedRequired { partner: String, message: String },
    /// Skip the inner rule while the value is empty
    Optional { rule: Box<Rule> },
    /// First failing rule wins
    Composite { rules: Vec<Rule> },
}

impl Rule {
    pub fn required() -> Self {
        Rule::Required { message: None }
    }

    pub fn regex(pattern: &str, message: &str) -> Self {
        Rule::Regex {
            pattern: pattern.to_string(),
            message: message.to_string(),
            case_insensitive: false,
        }
    }

    pub fn regex_ci(pattern: &str, message: &str) -> Self {
        Rule::Regex {
            pattern: pattern.to_string(),
            message: message.to_string(),
            case_insensitive: true,
        }
    }

    pub fn range(min: Bound, max: Bound, message: &str) -> Self {
        Rule::Range {
            min,
            max,
            message: message.to_string(),
        }
    }

    pub fn date() -> Self {
        Rule::Date { message: None }
    }

    pub fn required_if(when: Condition, message: &str) -> Self {
        Rule::ConditionalRequired {
            when,
            message: message.to_string(),
        }
    }

    pub fn at_least_one_of(group: &[&str], message: &str) -> Self {
        Rule::AtLeastOneOf {
            group: group.iter().map(|s| s.to_string()).collect(),
            message: message.to_string(),
        }
    }

    pub fn paired_with(partner: &str, message: &str) -> Self {
        Rule::PairedRequired {
            partner: partner.to_string(),
            message: message.to_string(),
        }
    }

    pub fn optional(rule: Rule) -> Self {
        Rule::Optional {
            rule: Box::new(rule),
        }
    }

    pub fn all(rules: Vec<Rule>) -> Self {
        Rule::Composite { rules }
    }

    /// Field ids this rule reads besides its own
    pub fn references(&self) -> Vec<&str> {
        match self {
            Rule::ConditionalRequired { when, .. } => when.references(),
            Rule::AtLeastOneOf { group, .. } => group.iter().map(String::as_str).collect(),
            Rule::PairedRequired { partner, .. } => vec![partner.as_str()],
            Rule::Optional { rule } => rule.references(),
            Rule::Composite { rules } => rules.iter().flat_map(Rule::references).collect(),
            Rule::Required { .. } | Rule::Regex { .. } | Rule::Range { .. } | Rule::Date { .. } => {
                Vec::new()
            }
        }
    }

    /// Every regex carried by this rule, with its case sensitivity
    pub fn patterns(&self) -> Vec<(&str, bool)> {
        match self {
            Rule::Regex {
                pattern,
                case_insensitive,
                ..
            } => vec![(pattern.as_str(), *case_insensitive)],
            Rule::Optional { rule } => rule.patterns(),
            Rule::Composite { rules } => rules.iter().flat_map(Rule::patterns).collect(),
            _ => Vec::new(),
        }
    }

    /// Groups for which this rule acts as the anchor validator
    pub fn anchored_groups(&self) -> Vec<&[String]> {
        match self {
            Rule::AtLeastOneOf { group, .. } => vec![group.as_slice()],
            Rule::Optional { rule } => rule.anchored_groups(),
            Rule::Composite { rules } => rules.iter().flat_map(Rule::anchored_groups).collect(),
            _ => Vec::new(),
        }
    }
}

/// Numeric bound for [`Rule::Range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Fixed(i64),
    /// The clock's calendar year plus an offset
    CurrentYearOffset(i32),
}

/// Predicate over the full form state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    IsTrue { field: String },
    IsFalse { field: String },
    Equals { field: String, value: FieldValue },
    NotEmpty { field: String },
    Any { conditions: Vec<Condition> },
    All { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

impl Condition {
    pub fn is_true(field: &str) -> Self {
        Condition::IsTrue {
            field: field.to_string(),
        }
    }

    pub fn is_false(field: &str) -> Self {
        Condition::IsFalse {
            field: field.to_string(),
        }
    }

    pub fn equals(field: &str, value: impl Into<FieldValue>) -> Self {
        Condition::Equals {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn not_empty(field: &str) -> Self {
        Condition::NotEmpty {
            field: field.to_string(),
        }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any { conditions }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All { conditions }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not {
            condition: Box::new(condition),
        }
    }

    pub fn references(&self) -> Vec<&str> {
        match self {
            Condition::IsTrue { field }
            | Condition::IsFalse { field }
            | Condition::Equals { field, .. }
            | Condition::NotEmpty { field } => vec![field.as_str()],
            Condition::Any { conditions } | Condition::All { conditions } => {
                conditions.iter().flat_map(Condition::references).collect()
            }
            Condition::Not { condition } => condition.references(),
        }
    }
}
