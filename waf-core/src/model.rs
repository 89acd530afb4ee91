//! Domain model shared by the evaluator, the tenant store, and the control
//! plane API (spec.md §3). All types are `Serialize`/`Deserialize` so they
//! cross the HTTP boundary in `waf-api` without a separate DTO layer, the
//! same way the teacher's `Gateway`/`GatewayNode`/`Proxy` structs in
//! `router-api/src/api/settings/mod.rs` double as both the persisted and
//! wire representation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The four actions a matched rule can carry (spec.md §3, §9 "prefer tagged
/// unions over sentinel strings").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Block,
    Challenge,
    Allow,
    Log,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Block => "BLOCK",
            Action::Challenge => "CHALLENGE",
            Action::Allow => "ALLOW",
            Action::Log => "LOG",
        }
    }
}

/// The closed operator vocabulary a predicate may use (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    IsNull,
    IsNotNull,
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Matches,
    NotMatches,
    In,
    NotIn,
    GreaterThan,
    LessThan,
}

/// A scalar or list value a predicate compares the projected field against.
/// `Null` only makes sense paired with `is_null`/`is_not_null`, which never
/// inspect `value`, but the variant keeps the type total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<RuleValue>),
}

impl RuleValue {
    /// Loose string representation used by `equals`/`not_equals`/`contains`
    /// comparisons (spec.md §4.2).
    pub fn as_loose_string(&self) -> String {
        match self {
            RuleValue::Null => String::new(),
            RuleValue::Bool(b) => b.to_string(),
            RuleValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            RuleValue::String(s) => s.clone(),
            RuleValue::List(_) => String::new(),
        }
    }

    /// Numeric projection used by `greater_than`/`less_than` when both
    /// sides parse as numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RuleValue::String(s) => s.parse::<f64>().ok(),
            RuleValue::Null | RuleValue::List(_) => None,
        }
    }
}

/// A single `(field, operator, value)` test (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub operator: Operator,
    #[serde(default = "RuleValue::default_null")]
    pub value: RuleValue,
}

impl RuleValue {
    fn default_null() -> RuleValue {
        RuleValue::Null
    }
}

/// A conjunctive, ordered list of predicates. An empty expression matches
/// every request (spec.md §4.3).
pub type Expression = Vec<Predicate>;

/// A single rule belonging to one tenant store (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
    pub action: Action,
    #[serde(default)]
    pub expression: Expression,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Positive integer; unique among enabled rules in the same tenant
    /// (spec.md §3 invariant). Ignored (but still stored) when `enabled`
    /// is false.
    pub priority: i64,
    #[serde(default)]
    pub trigger_alert: bool,
    #[serde(default)]
    pub block_http_code: Option<u16>,
}

/// The origin a route forwards admitted traffic to (spec.md §3, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    Service,
    Url,
}

/// A tenant-defining route, owned by the global store's directory
/// (spec.md §3 "Ownership").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    /// Exact FQDN, or a left-wildcard `*.suffix`.
    pub incoming_host: String,
    pub origin_type: OriginType,
    #[serde(default)]
    pub origin_url: Option<String>,
    #[serde(default)]
    pub origin_service_name: Option<String>,
    pub enabled: bool,
}

/// A custom block-response body keyed by HTTP status code (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPage {
    pub http_code: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub content_type: String,
    pub body: String,
}

/// The outcome of running a rule set evaluator over a field map (spec.md §9
/// "Sum types for outcomes"). Deliberately a closed sum rather than a
/// sentinel string.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    NoMatch,
    Match {
        action: Action,
        matched_rule_id: String,
        block_http_code: Option<u16>,
    },
}

impl EvalOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, EvalOutcome::Match { .. })
    }
}
