//! C9 — the decision logger (spec.md §4.9, §6 "external event sink").
//!
//! Fire-and-forget: the pipeline orchestrator never waits on this path.
//! Grounded in the teacher's `module/udp_logger.rs` multi-port fetcher,
//! which fans bounded `crossbeam_channel` queues out to background
//! consumer threads rather than blocking the producer; here there is a
//! single bounded queue per [`EventBus`], with a background thread
//! draining it into an injected [`EventSink`] instead of a UDP socket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, TrySendError};

/// The outcome recorded for one terminal pipeline state (spec.md §4.9: one
/// of "every terminal state (BLOCK, CHALLENGE, FINAL_DENY, ORIGIN_DISPATCH,
/// ORIGIN_MISCONFIG)"). Distinct from [`crate::model::Action`], which is a
/// rule's configured action — `FinalDeny` and `OriginMisconfig` have no
/// corresponding rule action, since they are pipeline outcomes rather than
/// rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Block,
    Challenge,
    FinalDeny,
    OriginDispatch,
    OriginMisconfig,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Block => "BLOCK",
            EventAction::Challenge => "CHALLENGE",
            EventAction::FinalDeny => "FINAL_DENY",
            EventAction::OriginDispatch => "ORIGIN_DISPATCH",
            EventAction::OriginMisconfig => "ORIGIN_MISCONFIG",
        }
    }
}

/// One terminal request outcome, recorded after the pipeline orchestrator
/// reaches a decision (spec.md §4.9: id, timestamp, action, rule_id?,
/// context (global|route id), route_host?, ip, user_agent, country, asn,
/// colo, meta_blob, headers_blob).
#[derive(Debug, Clone)]
pub struct DecisionEvent {
    pub id: String,
    pub tenant_route_id: Option<String>,
    /// "global" or the route id that produced this event (spec.md §4.9
    /// "context (global|route id)").
    pub context: String,
    pub host: String,
    pub method: String,
    pub url: String,
    pub action: EventAction,
    pub matched_rule_id: Option<String>,
    pub http_status: u16,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub asn: Option<String>,
    pub colo: Option<String>,
    pub meta_blob: String,
    pub headers_blob: String,
    pub timestamp: DateTime<Utc>,
}

/// Where drained [`DecisionEvent`]s go. `waf-api` implements this over its
/// audit/event store; tests implement it over a `Vec`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DecisionEvent);
}

/// A bounded, drop-oldest-on-overflow fire-and-forget channel feeding a
/// background consumer thread. `send` never blocks the caller (spec.md §5
/// "C9 never applies backpressure to the request path").
pub struct EventBus {
    sender: Sender<DecisionEvent>,
    dropped: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl EventBus {
    /// Spawns the background consumer thread draining into `sink`.
    pub fn spawn(capacity: usize, sink: Arc<dyn EventSink>) -> Self {
        let (sender, receiver): (Sender<DecisionEvent>, Receiver<DecisionEvent>) =
            crossbeam_channel::bounded(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        let worker = std::thread::spawn(move || {
            for event in receiver.iter() {
                sink.emit(event);
            }
        });

        Self {
            sender,
            dropped,
            worker: Some(worker),
        }
    }

    /// Enqueues `event` without blocking. On a full queue, drops the event
    /// and counts it rather than applying backpressure to the request path.
    pub fn send(&self, event: DecisionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::warn!("decision event queue full, dropped event (total dropped: {total})");
            }
            Err(TrySendError::Disconnected(_)) => {
                log::error!("decision event queue disconnected, event lost");
            }
        }
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        // Dropping `sender` closes the channel so the worker's `for` loop
        // over `receiver.iter()` terminates and the thread can be joined.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CollectingSink {
        events: Mutex<Vec<DecisionEvent>>,
    }

    impl EventSink for CollectingSink {
        fn emit(&self, event: DecisionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn sample_event() -> DecisionEvent {
        DecisionEvent {
            id: "11111111-1111-1111-1111-111111111111".to_string(),
            tenant_route_id: Some("route-1".to_string()),
            context: "route-1".to_string(),
            host: "api.example.com".to_string(),
            method: "GET".to_string(),
            url: "/".to_string(),
            action: EventAction::Block,
            matched_rule_id: Some("rule-1".to_string()),
            http_status: 403,
            ip: None,
            user_agent: None,
            country: None,
            asn: None,
            colo: None,
            meta_blob: "{}".to_string(),
            headers_blob: "{}".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn delivers_events_to_sink() {
        let sink = Arc::new(CollectingSink { events: Mutex::new(Vec::new()) });
        let bus = EventBus::spawn(8, sink.clone());
        bus.send(sample_event());
        drop(bus); // closes the channel and joins the worker, flushing delivery
        assert_eq!(sink.events.lock().unwrap().len(), 1);
    }

    #[test]
    fn overflow_drops_and_counts_instead_of_blocking() {
        struct SlowSink;
        impl EventSink for SlowSink {
            fn emit(&self, _event: DecisionEvent) {
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
        }
        let bus = EventBus::spawn(1, Arc::new(SlowSink));
        for _ in 0..10 {
            bus.send(sample_event());
        }
        // At least some sends overflowed the 1-slot queue while the slow
        // sink was draining the first event.
        assert!(bus.dropped_count() > 0);
    }
}
