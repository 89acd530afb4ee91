//! The cached, immutable view of one tenant's configuration (spec.md §4.5:
//! "the hot path never touches SQL directly; it reads a cached snapshot").
//!
//! Grounded in the teacher's `REDIRECT_RULES: LazyLock<RwLock<HashMap<...,
//! Arc<Vec<RedirectRule>>>>>` global in `router-core/src/app/gateway_fast.rs`:
//! readers take a cheap `Arc` clone under a read lock, writers replace the
//! whole snapshot under a write lock. We scope that pattern per tenant
//! store instead of one process-wide global, and add a `Mutex`-guarded
//! single-flight reload so a cache miss under concurrent load triggers one
//! SQL read, not N.

use std::sync::{Arc, Mutex, RwLock};

use crate::error::WafResult;
use crate::model::{ErrorPage, Route, Rule};

use super::database::Database;
use super::{error_pages_repo, routes_repo, rules_repo};

/// Everything the hot path needs from one tenant's store, loaded in one
/// pass and held immutable until the next write invalidates it.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub rules: Vec<Rule>,
    pub routes: Vec<Route>,
    pub error_pages: Vec<ErrorPage>,
}

impl Snapshot {
    fn load(db: &Database) -> WafResult<Self> {
        Ok(Self {
            rules: rules_repo::list(db)?,
            routes: routes_repo::list(db)?,
            error_pages: error_pages_repo::list(db)?,
        })
    }

    pub fn error_page(&self, http_code: u16) -> Option<&ErrorPage> {
        self.error_pages.iter().find(|p| p.http_code == http_code)
    }
}

/// An invalidate-on-write, single-flight-reload cache over one
/// [`Snapshot`].
pub struct SnapshotCache {
    cached: RwLock<Option<Arc<Snapshot>>>,
    reload_lock: Mutex<()>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            cached: RwLock::new(None),
            reload_lock: Mutex::new(()),
        }
    }

    /// Returns the cached snapshot, loading it from `db` on a cold cache.
    /// Concurrent misses serialize on `reload_lock` so only one of them
    /// actually hits SQL; the rest observe the winner's freshly-stored
    /// snapshot once they acquire the lock.
    pub fn get_or_load(&self, db: &Database) -> WafResult<Arc<Snapshot>> {
        if let Some(snapshot) = self.cached.read().unwrap().clone() {
            return Ok(snapshot);
        }

        let _guard = self.reload_lock.lock().unwrap();
        if let Some(snapshot) = self.cached.read().unwrap().clone() {
            return Ok(snapshot);
        }

        let snapshot = Arc::new(Snapshot::load(db)?);
        *self.cached.write().unwrap() = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drops the cached snapshot; the next `get_or_load` repopulates it
    /// from SQL. Called after every configuration write (spec.md §4.5).
    pub fn invalidate(&self) {
        *self.cached.write().unwrap() = None;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::ensure_schema;
    use crate::model::Action;
    use std::collections::BTreeSet;

    #[test]
    fn loads_once_and_invalidates() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        let cache = SnapshotCache::new();

        let first = cache.get_or_load(&db).unwrap();
        assert!(first.rules.is_empty());

        rules_repo::create(
            &db,
            &Rule {
                id: "r1".to_string(),
                name: "r1".to_string(),
                description: String::new(),
                enabled: true,
                action: Action::Block,
                expression: Vec::new(),
                tags: BTreeSet::new(),
                priority: 1,
                trigger_alert: false,
                block_http_code: None,
            },
        )
        .unwrap();

        // Still cold: the stale cached snapshot is returned until invalidated.
        let stale = cache.get_or_load(&db).unwrap();
        assert!(stale.rules.is_empty());

        cache.invalidate();
        let fresh = cache.get_or_load(&db).unwrap();
        assert_eq!(fresh.rules.len(), 1);
    }

    #[test]
    fn error_page_lookup() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        error_pages_repo::put(
            &db,
            &ErrorPage {
                http_code: 403,
                name: String::new(),
                description: String::new(),
                content_type: "text/plain".to_string(),
                body: "blocked".to_string(),
            },
        )
        .unwrap();
        let cache = SnapshotCache::new();
        let snapshot = cache.get_or_load(&db).unwrap();
        assert_eq!(snapshot.error_page(403).unwrap().body, "blocked");
        assert!(snapshot.error_page(404).is_none());
    }
}
