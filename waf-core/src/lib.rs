//! # WAF Core
//!
//! The hot-path engine and per-tenant persistence layer for the multi-tenant
//! Web Application Firewall. This crate is transport-agnostic: it never
//! terminates TLS or owns a socket. Callers (the `waf-api` control plane, or
//! tests) hand it an already-parsed request and a tenant id, and get back a
//! terminal outcome.
//!
//! ## Module map
//!
//! - [`model`] — the domain types: `Rule`, `Predicate`, `Route`, `Action`, `ErrorPage`.
//! - [`error`] — the shared `WafError` taxonomy.
//! - [`field`] — C1, the field projector.
//! - [`eval`] — C2/C3/C4, predicate/expression/rule-set evaluation.
//! - [`store`] — C5, the tenant store (SQLite + cached snapshot).
//! - [`router`] — C6, host routing (exact + left-wildcard).
//! - [`pipeline`] — C7, the per-request orchestrator state machine.
//! - [`origin`] — C8, origin dispatch (service or URL).
//! - [`events`] — C9, the fire-and-forget decision logger.

pub mod error;
pub mod model;

pub mod field;
pub mod eval;
pub mod store;
pub mod router;
pub mod pipeline;
pub mod origin;
pub mod events;

pub use error::{WafError, WafResult};
