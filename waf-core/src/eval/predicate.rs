//! C2 — the predicate evaluator (spec.md §4.2).
//!
//! Every operator here is pure and total: no predicate ever panics or
//! propagates an error, including on a malformed regex — it simply
//! evaluates to `false` (spec.md §7 "C2 and C3 contain all predicate
//! faults ... as predicate-false").

use super::regex_cache::RegexCache;
use crate::field::{FieldMap, FieldValue};
use crate::model::{Operator, Predicate, RuleValue};

/// Evaluates a single predicate against the projected field map.
///
/// `rule_id`/`predicate_index` identify this predicate's slot in the regex
/// compile cache (spec.md §4.2, §5).
pub fn evaluate(
    predicate: &Predicate,
    fields: &FieldMap,
    rule_id: &str,
    predicate_index: usize,
    regex_cache: &RegexCache,
) -> bool {
    let actual = fields.get(predicate.field.as_str());

    match predicate.operator {
        Operator::IsNull => actual.is_none(),
        Operator::IsNotNull => actual.is_some(),
        _ => {
            let Some(actual) = actual else {
                return false;
            };
            match predicate.operator {
                Operator::Equals => actual.as_loose_string() == predicate.value.as_loose_string(),
                Operator::NotEquals => actual.as_loose_string() != predicate.value.as_loose_string(),
                Operator::Contains => contains(actual, &predicate.value),
                Operator::NotContains => !contains(actual, &predicate.value),
                Operator::In => member_of(actual, &predicate.value),
                Operator::NotIn => !member_of(actual, &predicate.value),
                Operator::GreaterThan => compare(actual, &predicate.value, |o| o.is_gt()),
                Operator::LessThan => compare(actual, &predicate.value, |o| o.is_lt()),
                Operator::Matches => matches_regex(actual, &predicate.value, rule_id, predicate_index, regex_cache),
                Operator::NotMatches => {
                    !matches_regex(actual, &predicate.value, rule_id, predicate_index, regex_cache)
                }
                Operator::IsNull | Operator::IsNotNull => unreachable!("handled above"),
            }
        }
    }
}

fn contains(actual: &FieldValue, needle: &RuleValue) -> bool {
    match actual {
        FieldValue::Str(s) => s.contains(&needle.as_loose_string()),
        _ => false,
    }
}

fn member_of(actual: &FieldValue, value: &RuleValue) -> bool {
    let RuleValue::List(items) = value else {
        return false;
    };
    let actual_str = actual.as_loose_string();
    items.iter().any(|item| item.as_loose_string() == actual_str)
}

fn compare(actual: &FieldValue, value: &RuleValue, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    match (actual.as_number(), value.as_number()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).map(accept).unwrap_or(false),
        _ => accept(actual.as_loose_string().cmp(&value.as_loose_string())),
    }
}

fn matches_regex(
    actual: &FieldValue,
    value: &RuleValue,
    rule_id: &str,
    predicate_index: usize,
    regex_cache: &RegexCache,
) -> bool {
    let pattern = value.as_loose_string();
    match regex_cache.get_or_compile(rule_id, predicate_index, &pattern) {
        Some(re) => re.is_match(&actual.as_loose_string()),
        None => false,
    }
}

trait OrderingExt {
    fn is_gt(self) -> bool;
    fn is_lt(self) -> bool;
}

impl OrderingExt for std::cmp::Ordering {
    fn is_gt(self) -> bool {
        self == std::cmp::Ordering::Greater
    }
    fn is_lt(self) -> bool {
        self == std::cmp::Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    fn fields(pairs: &[(&str, FieldValue)]) -> FieldMap {
        pairs.iter().cloned().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn pred(field: &str, op: Operator, value: RuleValue) -> Predicate {
        Predicate {
            field: field.to_string(),
            operator: op,
            value,
        }
    }

    #[test]
    fn is_null_true_when_absent() {
        let cache = RegexCache::new(8);
        let f = fields(&[]);
        assert!(evaluate(&pred("request.cf.country", Operator::IsNull, RuleValue::Null), &f, "r", 0, &cache));
    }

    #[test]
    fn equals_loose_string_comparison() {
        let cache = RegexCache::new(8);
        let f = fields(&[("request.cf.country", FieldValue::Str("T1".into()))]);
        assert!(evaluate(
            &pred("request.cf.country", Operator::Equals, RuleValue::String("T1".into())),
            &f,
            "r",
            0,
            &cache
        ));
    }

    #[test]
    fn contains_false_when_absent_or_not_string() {
        let cache = RegexCache::new(8);
        let f = fields(&[("request.cf.threatScore", FieldValue::Num(5.0))]);
        assert!(!evaluate(
            &pred("request.cf.threatScore", Operator::Contains, RuleValue::String("5".into())),
            &f,
            "r",
            0,
            &cache
        ));
        assert!(!evaluate(
            &pred("request.missing", Operator::Contains, RuleValue::String("x".into())),
            &f,
            "r",
            0,
            &cache
        ));
    }

    #[test]
    fn invalid_regex_never_matches() {
        let cache = RegexCache::new(8);
        let f = fields(&[("request.headers.user-agent", FieldValue::Str("curl".into()))]);
        assert!(!evaluate(
            &pred("request.headers.user-agent", Operator::Matches, RuleValue::String("(".into())),
            &f,
            "r",
            0,
            &cache
        ));
    }

    #[test]
    fn greater_than_numeric_compare() {
        let cache = RegexCache::new(8);
        let f = fields(&[("request.cf.threatScore", FieldValue::Num(80.0))]);
        assert!(evaluate(
            &pred("request.cf.threatScore", Operator::GreaterThan, RuleValue::Number(50.0)),
            &f,
            "r",
            0,
            &cache
        ));
    }

    #[test]
    fn in_checks_list_membership() {
        let cache = RegexCache::new(8);
        let f = fields(&[("request.cf.country", FieldValue::Str("T1".into()))]);
        let list = RuleValue::List(vec![RuleValue::String("T1".into()), RuleValue::String("T2".into())]);
        assert!(evaluate(&pred("request.cf.country", Operator::In, list), &f, "r", 0, &cache));
    }
}
