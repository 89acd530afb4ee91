//! C7 — the per-request pipeline orchestrator (spec.md §4.7).
//!
//! Fixed dataflow, unconditionally in this order: project fields (C1) →
//! evaluate the global ruleset (C4 over C3/C2) → resolve the tenant route
//! (C6) → evaluate the route's own ruleset (C4) → dispatch to the origin
//! (C8) or return a block/challenge response. Only `BLOCK` and
//! `CHALLENGE` actions are terminal; an `ALLOW` or `LOG` match records
//! which rule fired (for the decision event) but does not short-circuit
//! the remaining stages — the dataflow is a straight line, not a tree of
//! early exits, matching the architecture's single fixed pipeline shape.
//!
//! A [`Deadline`] is checked before every suspension point (a snapshot
//! load or the final origin call); exceeding it produces the dedicated
//! `deadline-exceeded` BLOCK outcome instead of hanging the request.

mod deadline;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub use deadline::Deadline;

use waf_common::{
    DEADLINE_EXCEEDED_RULE_ID, DEFAULT_BLOCK_STATUS, DEFAULT_GLOBAL_DENY_RULE_ID, DEFAULT_ROUTE_BLOCK_RULE_ID,
    NO_ROUTE_MATCH_RULE_ID,
};

use crate::error::WafResult;
use crate::eval::{self, RegexCache};
use crate::events::{DecisionEvent, EventAction, EventBus};
use crate::field::{self, RawRequest};
use crate::model::{Action, EvalOutcome};
use crate::origin::{self, DispatchError, OriginResponse, ServiceRegistry};
use crate::router;
use crate::store::{Snapshot, TenantStore};

/// The terminal result of running one request through the pipeline.
#[derive(Debug, Clone)]
pub enum Decision {
    Block {
        rule_id: String,
        http_code: u16,
        content_type: String,
        body: Vec<u8>,
    },
    Challenge {
        rule_id: String,
    },
    Forwarded {
        matched_rule_id: Option<String>,
        response: OriginResponse,
    },
    OriginMisconfig {
        matched_rule_id: Option<String>,
        detail: String,
    },
}

impl Decision {
    /// The event record's action (spec.md §4.9), distinct from a rule's own
    /// `Action` — `FinalDeny` and `OriginMisconfig` have no matching rule
    /// action, and a plain route-tier default-block stays `Block` rather
    /// than collapsing into `FinalDeny` (spec.md §4.7's BLOCK_RESPONSE vs
    /// FINAL_DENY terminal states are distinct).
    fn event_action(&self) -> EventAction {
        match self {
            Decision::Block { rule_id, .. }
                if rule_id == DEFAULT_GLOBAL_DENY_RULE_ID || rule_id == NO_ROUTE_MATCH_RULE_ID =>
            {
                EventAction::FinalDeny
            }
            Decision::Block { .. } => EventAction::Block,
            Decision::Challenge { .. } => EventAction::Challenge,
            Decision::Forwarded { .. } => EventAction::OriginDispatch,
            Decision::OriginMisconfig { .. } => EventAction::OriginMisconfig,
        }
    }

    fn http_status(&self) -> u16 {
        match self {
            Decision::Block { http_code, .. } => *http_code,
            Decision::Challenge { .. } => 403,
            Decision::Forwarded { response, .. } => response.status,
            Decision::OriginMisconfig { .. } => 500,
        }
    }

    fn matched_rule_id(&self) -> Option<String> {
        match self {
            Decision::Block { rule_id, .. } => Some(rule_id.clone()),
            Decision::Challenge { rule_id, .. } => Some(rule_id.clone()),
            Decision::Forwarded { matched_rule_id, .. } => matched_rule_id.clone(),
            Decision::OriginMisconfig { matched_rule_id, .. } => matched_rule_id.clone(),
        }
    }
}

/// Owns every piece of shared state the orchestrator needs across
/// requests: the global store, a lazily-populated cache of per-route
/// stores, the process-wide regex cache, the origin service registry, and
/// the decision event bus.
pub struct Pipeline {
    global_store: Arc<TenantStore>,
    route_stores: RwLock<HashMap<String, Arc<TenantStore>>>,
    data_dir: PathBuf,
    regex_cache: Arc<RegexCache>,
    service_registry: Arc<ServiceRegistry>,
    event_bus: Arc<EventBus>,
    default_deadline: Duration,
}

impl Pipeline {
    pub fn new(
        global_store: Arc<TenantStore>,
        data_dir: PathBuf,
        regex_cache: Arc<RegexCache>,
        service_registry: Arc<ServiceRegistry>,
        event_bus: Arc<EventBus>,
        default_deadline: Duration,
    ) -> Self {
        Self {
            global_store,
            route_stores: RwLock::new(HashMap::new()),
            data_dir,
            regex_cache,
            service_registry,
            event_bus,
            default_deadline,
        }
    }

    fn route_store(&self, route_id: &str) -> WafResult<Arc<TenantStore>> {
        if let Some(store) = self.route_stores.read().unwrap().get(route_id) {
            return Ok(store.clone());
        }
        let store = Arc::new(TenantStore::open(&self.data_dir, route_id)?);
        self.route_stores
            .write()
            .unwrap()
            .insert(route_id.to_string(), store.clone());
        Ok(store)
    }

    /// Runs `request` through the full pipeline, emitting a decision event
    /// for the terminal outcome before returning it.
    pub async fn handle(&self, request: &RawRequest) -> Decision {
        self.handle_with_deadline(request, Deadline::after(self.default_deadline)).await
    }

    pub async fn handle_with_deadline(&self, request: &RawRequest, deadline: Deadline) -> Decision {
        let fields = field::project(request);
        let host = fields
            .get("request.headers.host")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let (decision, context) = self.run(request, &fields, &host, deadline).await;
        self.emit(request, &fields, &host, &context, &decision);
        decision
    }

    async fn run(
        &self,
        request: &RawRequest,
        fields: &field::FieldMap,
        host: &str,
        deadline: Deadline,
    ) -> (Decision, String) {
        if deadline.has_expired() {
            return (self.deadline_decision(None), "global".to_string());
        }
        let global_snapshot = match self.global_store.snapshot() {
            Ok(s) => s,
            Err(e) => return (self.internal_error_decision(&e.to_string()), "global".to_string()),
        };

        let global_outcome = eval::evaluate_ruleset(&global_snapshot.rules, fields, &self.regex_cache);
        if let Some(decision) =
            self.terminal_decision(&global_outcome, &global_snapshot, DEFAULT_GLOBAL_DENY_RULE_ID)
        {
            return (decision, "global".to_string());
        }

        if deadline.has_expired() {
            return (self.deadline_decision(None), "global".to_string());
        }
        let Some(route) = router::resolve(&global_snapshot.routes, host) else {
            return (
                self.block_decision(&global_snapshot, DEFAULT_BLOCK_STATUS, NO_ROUTE_MATCH_RULE_ID.to_string()),
                "global".to_string(),
            );
        };

        if deadline.has_expired() {
            return (self.deadline_decision(Some(route.id.clone())), route.id.clone());
        }
        let route_store = match self.route_store(&route.id) {
            Ok(s) => s,
            Err(e) => return (self.internal_error_decision(&e.to_string()), route.id.clone()),
        };
        let route_snapshot = match route_store.snapshot() {
            Ok(s) => s,
            Err(e) => return (self.internal_error_decision(&e.to_string()), route.id.clone()),
        };

        let route_outcome = eval::evaluate_ruleset(&route_snapshot.rules, fields, &self.regex_cache);
        if let Some(decision) =
            self.terminal_decision(&route_outcome, &global_snapshot, DEFAULT_ROUTE_BLOCK_RULE_ID)
        {
            return (decision, route.id.clone());
        }

        if deadline.has_expired() {
            return (self.deadline_decision(Some(route.id.clone())), route.id.clone());
        }
        let matched_rule_id = match (&global_outcome, &route_outcome) {
            (_, EvalOutcome::Match { matched_rule_id, .. }) => Some(matched_rule_id.clone()),
            (EvalOutcome::Match { matched_rule_id, .. }, _) => Some(matched_rule_id.clone()),
            _ => None,
        };

        let decision = match origin::dispatch(route, request, &self.service_registry, deadline.remaining()).await {
            Ok(response) => Decision::Forwarded { matched_rule_id, response },
            Err(DispatchError::Misconfigured(detail)) => {
                log::error!("origin misconfigured for route {}: {detail}", route.id);
                Decision::OriginMisconfig { matched_rule_id, detail }
            }
            Err(DispatchError::Unreachable(detail)) => {
                log::warn!("origin dispatch failed for route {}: {detail}", route.id);
                self.block_decision(&global_snapshot, 502, format!("upstream-error:{}", route.id))
            }
        };
        (decision, route.id.clone())
    }

    /// Maps a rule-set outcome to a terminal [`Decision`], or `None` if the
    /// match (`ALLOW`/`LOG`) should not stop the pipeline. `NoMatch` is
    /// always terminal — a ruleset that admits nothing denies the request
    /// rather than falling through to the next stage (spec.md §4.7
    /// "no rule matched (=no global admission)" / "no match
    /// (default-block)"), using `default_deny_rule_id` to distinguish a
    /// global-tier denial (FINAL_DENY) from a route-tier one (BLOCK_RESPONSE).
    fn terminal_decision(
        &self,
        outcome: &EvalOutcome,
        global_snapshot: &Snapshot,
        default_deny_rule_id: &str,
    ) -> Option<Decision> {
        match outcome {
            EvalOutcome::NoMatch => Some(self.block_decision(
                global_snapshot,
                DEFAULT_BLOCK_STATUS,
                default_deny_rule_id.to_string(),
            )),
            EvalOutcome::Match {
                action,
                matched_rule_id,
                block_http_code,
            } => match action {
                Action::Block => {
                    let code = block_http_code.unwrap_or(DEFAULT_BLOCK_STATUS);
                    Some(self.block_decision(global_snapshot, code, matched_rule_id.clone()))
                }
                Action::Challenge => Some(Decision::Challenge {
                    rule_id: matched_rule_id.clone(),
                }),
                Action::Allow | Action::Log => None,
            },
        }
    }

    fn block_decision(&self, global_snapshot: &Snapshot, http_code: u16, rule_id: String) -> Decision {
        match global_snapshot.error_page(http_code) {
            Some(page) => Decision::Block {
                rule_id,
                http_code,
                content_type: page.content_type.clone(),
                body: page.body.clone().into_bytes(),
            },
            None => Decision::Block {
                rule_id,
                http_code,
                content_type: "text/plain".to_string(),
                body: b"request blocked".to_vec(),
            },
        }
    }

    fn deadline_decision(&self, route_id: Option<String>) -> Decision {
        log::warn!("request deadline exceeded (route: {route_id:?})");
        Decision::Block {
            rule_id: DEADLINE_EXCEEDED_RULE_ID.to_string(),
            http_code: 503,
            content_type: "text/plain".to_string(),
            body: b"request exceeded its deadline".to_vec(),
        }
    }

    fn internal_error_decision(&self, detail: &str) -> Decision {
        log::error!("pipeline internal error: {detail}");
        Decision::Block {
            rule_id: "internal-error".to_string(),
            http_code: 500,
            content_type: "text/plain".to_string(),
            body: b"internal error".to_vec(),
        }
    }

    fn emit(&self, request: &RawRequest, fields: &field::FieldMap, host: &str, context: &str, decision: &Decision) {
        let tenant_route_id = if context == "global" {
            None
        } else {
            Some(context.to_string())
        };
        let ip = request
            .headers
            .get("cf-connecting-ip")
            .or_else(|| request.headers.get("x-forwarded-for"))
            .or_else(|| request.headers.get("x-real-ip"))
            .map(str::to_string);
        let user_agent = request.headers.get("user-agent").map(str::to_string);
        let country = fields.get("request.cf.country").map(|v| v.as_loose_string());
        let asn = fields.get("request.cf.asn").map(|v| v.as_loose_string());
        let colo = fields.get("request.cf.colo").map(|v| v.as_loose_string());
        let meta_blob = serde_json::to_string(&request.meta).unwrap_or_default();
        let headers_blob = serde_json::to_string(
            &request
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<HashMap<String, String>>(),
        )
        .unwrap_or_default();

        self.event_bus.send(DecisionEvent {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_route_id,
            context: context.to_string(),
            host: host.to_string(),
            method: request.method.clone(),
            url: request.url.clone(),
            action: decision.event_action(),
            matched_rule_id: decision.matched_rule_id(),
            http_status: decision.http_status(),
            ip,
            user_agent,
            country,
            asn,
            colo,
            meta_blob,
            headers_blob,
            timestamp: chrono::Utc::now(),
        });
    }
}
