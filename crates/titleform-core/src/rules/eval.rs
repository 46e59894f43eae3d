//! Rule interpreter

use std::collections::HashMap;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use shared_types::{FieldValue, FormState};

use super::{Bound, Condition, Rule, REQUIRED_MESSAGE};
use crate::calendar::{check_form_date, DateProblem};

const DATE_FORMAT_MESSAGE: &str = "Use the format MM-DD-YYYY";
const DATE_CALENDAR_MESSAGE: &str = "Enter a valid calendar date";
const DATE_FUTURE_MESSAGE: &str = "Date cannot be in the future";

/// Everything a rule may look at while it runs
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub state: &'a FormState,
    pub today: NaiveDate,
}

impl<'a> EvalContext<'a> {
    pub fn new(state: &'a FormState, today: NaiveDate) -> Self {
        Self { state, today }
    }

    fn value(&self, field: &str) -> FieldValue {
        self.state.get(field).cloned().unwrap_or_default()
    }
}

/// Compiled regex cache, built once per registry
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    compiled: HashMap<(String, bool), Regex>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a pattern ahead of evaluation
    pub fn compile(&mut self, pattern: &str, case_insensitive: bool) -> Result<(), regex::Error> {
        let key = (pattern.to_string(), case_insensitive);
        if self.compiled.contains_key(&key) {
            return Ok(());
        }
        let re = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        self.compiled.insert(key, re);
        Ok(())
    }

    /// Run `rule` for the value of `field_id`; `None` means the value passes.
    pub fn check(&self, rule: &Rule, field_id: &str, ctx: &EvalContext<'_>) -> Option<String> {
        let value = ctx.value(field_id);
        self.check_value(rule, &value, ctx)
    }

    fn check_value(&self, rule: &Rule, value: &FieldValue, ctx: &EvalContext<'_>) -> Option<String> {
        match rule {
            Rule::Required { message } => value
                .is_empty()
                .then(|| message.clone().unwrap_or_else(|| REQUIRED_MESSAGE.to_string())),

            Rule::Regex {
                pattern,
                message,
                case_insensitive,
            } => {
                let text = value.to_text();
                let matched = match self.compiled.get(&(pattern.clone(), *case_insensitive)) {
                    Some(re) => re.is_match(text.trim()),
                    // Registries always precompile; a stray rule fails closed
                    None => false,
                };
                (!matched).then(|| message.clone())
            }

            Rule::Range { min, max, message } => {
                let parsed = value.to_text().trim().parse::<i64>().ok();
                let (lo, hi) = (resolve_bound(*min, ctx), resolve_bound(*max, ctx));
                match parsed {
                    Some(n) if n >= lo && n <= hi => None,
                    _ => Some(message.clone()),
                }
            }

            Rule::Date { message } => {
                let text = value.to_text();
                match check_form_date(&text, ctx.today) {
                    Ok(_) => None,
                    Err(problem) => Some(message.clone().unwrap_or_else(|| {
                        match problem {
                            DateProblem::Format => DATE_FORMAT_MESSAGE,
                            DateProblem::Calendar => DATE_CALENDAR_MESSAGE,
                            DateProblem::Future => DATE_FUTURE_MESSAGE,
                        }
                        .to_string()
                    })),
                }
            }

            Rule::ConditionalRequired { when, message } => {
                (value.is_empty() && evaluate_condition(when, ctx.state)).then(|| message.clone())
            }

            Rule::AtLeastOneOf { group, message } => {
                let any_checked = group.iter().any(|id| ctx.value(id).is_checked());
                (!any_checked).then(|| message.clone())
            }

            Rule::PairedRequired { partner, message } => {
                let partner_empty = ctx.value(partner).is_empty();
                (value.is_empty() != partner_empty).then(|| message.clone())
            }

            Rule::Optional { rule } => {
                if value.is_empty() {
                    None
                } else {
                    self.check_value(rule, value, ctx)
                }
            }

            Rule::Composite { rules } => rules
                .iter()
                .find_map(|rule| self.check_value(rule, value, ctx)),
        }
    }
}

fn resolve_bound(bound: Bound, ctx: &EvalContext<'_>) -> i64 {
    use chrono::Datelike;
    match bound {
        Bound::Fixed(n) => n,
        Bound::CurrentYearOffset(offset) => i64::from(ctx.today.year()) + i64::from(offset),
    }
}

/// Evaluate a condition against the full state; missing fields read as empty.
pub fn evaluate_condition(condition: &Condition, state: &FormState) -> bool {
    let value = |field: &str| state.get(field).cloned().unwrap_or_default();
    match condition {
        Condition::IsTrue { field } => value(field).is_checked(),
        Condition::IsFalse { field } => !value(field).is_checked(),
        Condition::Equals { field, value: expected } => &value(field) == expected,
        Condition::NotEmpty { field } => !value(field).is_empty(),
        Condition::Any { conditions } => conditions.iter().any(|c| evaluate_condition(c, state)),
        Condition::All { conditions } => conditions.iter().all(|c| evaluate_condition(c, state)),
        Condition::Not { condition } => !evaluate_condition(condition, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn state(pairs: &[(&str, FieldValue)]) -> FormState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn rules_for(rule: &Rule) -> RuleSet {
        let mut set = RuleSet::new();
        for (pattern, ci) in rule.patterns() {
            set.compile(pattern, ci).unwrap();
        }
        set
    }

    fn check(rule: &Rule, value: FieldValue, others: &[(&str, FieldValue)]) -> Option<String> {
        let mut s = state(others);
        s.insert("field".to_string(), value);
        rules_for(rule).check(rule, "field", &EvalContext::new(&s, today()))
    }

    #[test]
    fn test_vin_rule() {
        let rule = Rule::all(vec![
            Rule::required(),
            Rule::regex_ci(patterns::VIN, "VIN must be 17 characters"),
        ]);
        assert_eq!(check(&rule, "1HGCM82633A004352".into(), &[]), None);
        assert_eq!(check(&rule, "1hgcm82633a004352".into(), &[]), None);
        assert_eq!(
            check(&rule, "1HGCM82633A00435".into(), &[]),
            Some("VIN must be 17 characters".to_string())
        );
        assert_eq!(
            check(&rule, "".into(), &[]),
            Some(REQUIRED_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_year_range_tracks_clock() {
        let rule = Rule::all(vec![
            Rule::required(),
            Rule::range(Bound::Fixed(1886), Bound::CurrentYearOffset(1), "bad year"),
        ]);
        assert!(check(&rule, "1885".into(), &[]).is_some());
        assert!(check(&rule, "1886".into(), &[]).is_none());
        assert!(check(&rule, "2027".into(), &[]).is_none());
        assert!(check(&rule, "2028".into(), &[]).is_some());
        assert!(check(&rule, "abc".into(), &[]).is_some());
    }

    #[test]
    fn test_optional_skips_empty() {
        let rule = Rule::optional(Rule::regex(patterns::PHONE10, "bad phone"));
        assert_eq!(check(&rule, "".into(), &[]), None);
        assert_eq!(check(&rule, "3055551234".into(), &[]), None);
        assert_eq!(
            check(&rule, "555-1234".into(), &[]),
            Some("bad phone".to_string())
        );
    }

    #[test]
    fn test_date_messages_distinguish_problems() {
        let rule = Rule::optional(Rule::date());
        assert_eq!(
            check(&rule, "02-30-2024".into(), &[]),
            Some(DATE_CALENDAR_MESSAGE.to_string())
        );
        assert_eq!(
            check(&rule, "01-01-2999".into(), &[]),
            Some(DATE_FUTURE_MESSAGE.to_string())
        );
        assert_eq!(
            check(&rule, "2020-01-01".into(), &[]),
            Some(DATE_FORMAT_MESSAGE.to_string())
        );
        assert_eq!(check(&rule, "01-01-2020".into(), &[]), None);
    }

    #[test]
    fn test_conditional_required_reads_sibling() {
        let rule = Rule::required_if(Condition::is_true("hasTradeIn"), "trade-in VIN needed");
        assert_eq!(check(&rule, "".into(), &[("hasTradeIn", false.into())]), None);
        assert_eq!(
            check(&rule, "".into(), &[("hasTradeIn", true.into())]),
            Some("trade-in VIN needed".to_string())
        );
        assert_eq!(
            check(&rule, "X".into(), &[("hasTradeIn", true.into())]),
            None
        );
    }

    #[test]
    fn test_at_least_one_of_group() {
        let rule = Rule::at_least_one_of(&["a", "b", "c"], "pick one");
        assert_eq!(
            check(
                &rule,
                false.into(),
                &[("a", false.into()), ("b", false.into()), ("c", false.into())]
            ),
            Some("pick one".to_string())
        );
        assert_eq!(
            check(
                &rule,
                false.into(),
                &[("a", false.into()), ("b", false.into()), ("c", true.into())]
            ),
            None
        );
    }

    #[test]
    fn test_pairing_requires_both_or_neither() {
        let rule = Rule::paired_with("partner", "both or neither");
        assert_eq!(check(&rule, "".into(), &[("partner", "".into())]), None);
        assert_eq!(check(&rule, "x".into(), &[("partner", "y".into())]), None);
        assert!(check(&rule, "x".into(), &[("partner", "".into())]).is_some());
        assert!(check(&rule, "".into(), &[("partner", "y".into())]).is_some());
    }

    #[test]
    fn test_composite_first_failure_wins() {
        let rule = Rule::all(vec![
            Rule::paired_with("name", "pair error"),
            Rule::optional(Rule::date()),
        ]);
        // Both problems present: pairing error is reported
        assert_eq!(
            check(&rule, "02-30-2024".into(), &[("name", "".into())]),
            Some("pair error".to_string())
        );
        // Pairing satisfied: date problem surfaces
        assert_eq!(
            check(&rule, "02-30-2024".into(), &[("name", "Jo".into())]),
            Some(DATE_CALENDAR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_uncompiled_pattern_fails_closed() {
        let rule = Rule::regex(patterns::ZIP5, "bad zip");
        let s = state(&[("field", "33101".into())]);
        let empty = RuleSet::new();
        assert_eq!(
            empty.check(&rule, "field", &EvalContext::new(&s, today())),
            Some("bad zip".to_string())
        );
    }

    #[test]
    fn test_condition_combinators() {
        let s = state(&[
            ("a", true.into()),
            ("b", false.into()),
            ("state", "FL".into()),
        ]);
        assert!(evaluate_condition(&Condition::is_true("a"), &s));
        assert!(evaluate_condition(&Condition::is_false("b"), &s));
        assert!(evaluate_condition(&Condition::is_false("missing"), &s));
        assert!(evaluate_condition(&Condition::equals("state", "FL"), &s));
        assert!(evaluate_condition(
            &Condition::any(vec![Condition::is_true("b"), Condition::is_true("a")]),
            &s
        ));
        assert!(!evaluate_condition(
            &Condition::all(vec![Condition::is_true("b"), Condition::is_true("a")]),
            &s
        ));
        assert!(evaluate_condition(
            &Condition::negate(Condition::not_empty("missing")),
            &s
        ));
    }
}
