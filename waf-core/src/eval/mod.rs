//! C2/C3/C4 — the rule-evaluation engine (spec.md §4.2–§4.4).
//!
//! [`RegexCache`] is the only piece of shared, mutable state on the
//! evaluation path; everything else here is pure functions over
//! [`crate::field::FieldMap`] and the rule model.

mod expression;
mod predicate;
mod regex_cache;
mod ruleset;

pub use regex_cache::RegexCache;
pub use ruleset::evaluate as evaluate_ruleset;
