//! C1 — the field projector.
//!
//! Flattens a raw inbound request into the keyed attribute map the
//! evaluator (C2/C3/C4) reads from. This module performs no I/O: it is a
//! pure function of its input, matching spec.md §5 ("The evaluation path
//! C1–C4 performs no I/O").

mod projector;

use std::collections::HashMap;

pub use projector::project;

/// A case-insensitive header map, mirroring "headers (case-insensitive map
/// of string→string)" from spec.md §6. Keys are normalized to lowercase on
/// insert and lookup.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct HeaderMap(HashMap<String, String>);

impl HeaderMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

/// A single scalar/boolean/integer attribute carried in the edge's `meta`
/// bag (spec.md §6: "The core treats `meta` attributes as opaque
/// scalars/booleans/integers").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    String(String),
}

/// The raw inbound request handed to the pipeline orchestrator (spec.md
/// §6 "Incoming request").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RawRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HeaderMap,
    /// Keyed by the suffix after `request.cf.` (e.g. `"country"`,
    /// `"botManagement.score"`), not by the full dotted field name — the
    /// projector adds the `request.cf.` prefix.
    #[serde(default)]
    pub meta: HashMap<String, MetaValue>,
}

/// A single projected field value. A field absent from the map is treated
/// as absent, never as `Null` — the evaluator relies on this distinction
/// for `is_null`/`is_not_null` (spec.md §4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl FieldValue {
    pub fn as_loose_string(&self) -> String {
        match self {
            FieldValue::Str(s) => s.clone(),
            FieldValue::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Num(n) => Some(*n),
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Str(s) => s.parse::<f64>().ok(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&MetaValue> for FieldValue {
    fn from(v: &MetaValue) -> Self {
        match v {
            MetaValue::Bool(b) => FieldValue::Bool(*b),
            MetaValue::Number(n) => FieldValue::Num(*n),
            MetaValue::String(s) => FieldValue::Str(s.clone()),
        }
    }
}

/// The flat, read-only map the evaluator queries, keyed by dotted field
/// name (spec.md §4.1).
pub type FieldMap = HashMap<String, FieldValue>;
