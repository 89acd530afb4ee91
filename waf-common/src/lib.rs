//! Shared constants for the WAF control plane (`waf-api`) and hot-path
//! engine (`waf-core`).
//!
//! This crate has no logic, only the small set of process-wide numbers and
//! names that both planes need to agree on.

/// Default capacity of the per-worker decision-event channel (C9). Chosen
/// generously so a burst of terminated requests does not immediately start
/// dropping events under normal load.
pub const EVENT_CHANNEL_CAPACITY: usize = 4_096;

/// Capacity of the process-wide regex compile cache (shared across all
/// tenant stores), keyed by `(rule_id, predicate_index)`.
pub const REGEX_CACHE_CAPACITY: usize = 4_096;

/// Default directory for per-tenant SQLite databases. Overridable via the
/// `WAF_DATA_DIR` environment variable.
pub const DEFAULT_DATA_DIR: &str = "/tmp/wafrs/data";

/// Tenant id reserved for the global singleton store.
pub const GLOBAL_TENANT_ID: &str = "global";

/// Default HTTP status used for BLOCK outcomes when a rule does not
/// override `block_http_code` and no matching error page is configured.
pub const DEFAULT_BLOCK_STATUS: u16 = 403;

/// Status used for the default-block-at-route-tier outcome.
pub const DEFAULT_ROUTE_BLOCK_RULE_ID: &str = "default-route-block";

/// Rule id used when the global ruleset matches nothing at all — "no
/// global admission" (spec FINAL_DENY), distinct from an explicit global
/// BLOCK rule match.
pub const DEFAULT_GLOBAL_DENY_RULE_ID: &str = "global-no-admission";

/// Rule id used when the incoming host resolves to no route at all
/// (FINAL_DENY), distinct from a route's own ruleset evaluating to
/// no-match (`DEFAULT_ROUTE_BLOCK_RULE_ID`, a BLOCK_RESPONSE).
pub const NO_ROUTE_MATCH_RULE_ID: &str = "no-route-match";

/// Synthetic rule id used for the deadline-exceeded BLOCK outcome.
pub const DEADLINE_EXCEEDED_RULE_ID: &str = "deadline-exceeded";

/// Tag applied to auto-generated route-admission rules in the global store.
pub const ROUTE_ADMISSION_TAG: &str = "route-admission";

/// Priority assigned to auto-generated route-admission rules. Chosen well
/// above any realistic user-assigned priority so user rules are not forced
/// to renumber around it; admission rules never collide with each other in
/// practice because their expressions test mutually exclusive hosts.
pub const ROUTE_ADMISSION_PRIORITY: i64 = 1_000_000;

/// Default request deadline, in milliseconds, applied when a caller does
/// not supply one.
pub const DEFAULT_DEADLINE_MS: u64 = 2_000;

/// Field vocabulary: the closed set of dotted names predicates may
/// reference for Cloudflare-style `meta` signals (spec.md §6). Listed here
/// so both the field projector and any validation/documentation tooling
/// share one source of truth.
pub const META_FIELD_NAMES: &[&str] = &[
    "request.cf.country",
    "request.cf.continent",
    "request.cf.region",
    "request.cf.regionCode",
    "request.cf.city",
    "request.cf.postalCode",
    "request.cf.metroCode",
    "request.cf.timezone",
    "request.cf.latitude",
    "request.cf.longitude",
    "request.cf.isEUCountry",
    "request.cf.colo",
    "request.cf.asn",
    "request.cf.asOrganization",
    "request.cf.httpProtocol",
    "request.cf.threatScore",
    "request.cf.botManagement.score",
    "request.cf.botManagement.verifiedBot",
    "request.cf.botManagement.staticResource",
    "request.cf.botManagement.ja3Hash",
    "request.cf.botManagement.ja4",
    "request.cf.tlsVersion",
    "request.cf.tlsCipher",
    "request.cf.tlsClientHelloLength",
];
