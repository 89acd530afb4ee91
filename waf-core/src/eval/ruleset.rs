//! C4 — the rule set evaluator (spec.md §4.4).
//!
//! Disabled rules are skipped entirely. Enabled rules are tried in
//! ascending `(priority, id)` order; the first whose expression matches
//! wins and short-circuits the remaining rules. No match among any
//! enabled rule yields [`EvalOutcome::NoMatch`].

use super::expression;
use super::regex_cache::RegexCache;
use crate::field::FieldMap;
use crate::model::{EvalOutcome, Rule};

/// Evaluates `rules` against `fields` in priority order, returning the
/// first match or [`EvalOutcome::NoMatch`].
pub fn evaluate(rules: &[Rule], fields: &FieldMap, regex_cache: &RegexCache) -> EvalOutcome {
    let mut ordered: Vec<&Rule> = rules.iter().filter(|r| r.enabled).collect();
    ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));

    for rule in ordered {
        if expression::evaluate(&rule.expression, fields, &rule.id, regex_cache) {
            return EvalOutcome::Match {
                action: rule.action,
                matched_rule_id: rule.id.clone(),
                block_http_code: rule.block_http_code,
            };
        }
    }
    EvalOutcome::NoMatch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;

    fn rule(id: &str, priority: i64, enabled: bool, action: Action) -> Rule {
        Rule {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            enabled,
            action,
            expression: Vec::new(),
            tags: Default::default(),
            priority,
            trigger_alert: false,
            block_http_code: None,
        }
    }

    #[test]
    fn first_match_by_priority_wins() {
        let cache = RegexCache::new(8);
        let rules = vec![
            rule("low-priority-allow", 20, true, Action::Allow),
            rule("high-priority-block", 10, true, Action::Block),
        ];
        let outcome = evaluate(&rules, &FieldMap::new(), &cache);
        assert_eq!(
            outcome,
            EvalOutcome::Match {
                action: Action::Block,
                matched_rule_id: "high-priority-block".to_string(),
                block_http_code: None,
            }
        );
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let cache = RegexCache::new(8);
        let rules = vec![rule("disabled", 1, false, Action::Block)];
        assert_eq!(evaluate(&rules, &FieldMap::new(), &cache), EvalOutcome::NoMatch);
    }

    #[test]
    fn no_rules_is_no_match() {
        let cache = RegexCache::new(8);
        assert_eq!(evaluate(&[], &FieldMap::new(), &cache), EvalOutcome::NoMatch);
    }

    #[test]
    fn ties_break_on_id() {
        let cache = RegexCache::new(8);
        let rules = vec![
            rule("rule-b", 5, true, Action::Allow),
            rule("rule-a", 5, true, Action::Block),
        ];
        let outcome = evaluate(&rules, &FieldMap::new(), &cache);
        assert_eq!(
            outcome,
            EvalOutcome::Match {
                action: Action::Block,
                matched_rule_id: "rule-a".to_string(),
                block_http_code: None,
            }
        );
    }
}
