//! C3 — the expression evaluator (spec.md §4.3).
//!
//! An expression is a conjunction: every predicate must hold. Evaluation
//! short-circuits on the first `false` predicate, and an empty expression
//! is vacuously true — this is how a rule with no conditions acts as an
//! unconditional match.

use super::predicate;
use super::regex_cache::RegexCache;
use crate::field::FieldMap;
use crate::model::Expression;

/// Evaluates every predicate in `expression` against `fields`, short
/// circuiting on the first failure.
pub fn evaluate(expression: &Expression, fields: &FieldMap, rule_id: &str, regex_cache: &RegexCache) -> bool {
    expression
        .iter()
        .enumerate()
        .all(|(index, pred)| predicate::evaluate(pred, fields, rule_id, index, regex_cache))
}
