//! C5 — the per-tenant stateful store (spec.md §4.5).
//!
//! A [`TenantStore`] owns one SQLite database (global or per-route) plus a
//! [`SnapshotCache`] over it. The hot path (C6/C7) only ever reads the
//! cached [`Snapshot`]; the configuration API (`waf-api`) writes through
//! the repo modules and calls [`TenantStore::invalidate`] afterward.

pub mod audit;
mod database;
mod error_pages_repo;
mod routes_repo;
mod rules_repo;
mod schema;
mod snapshot;
mod users_repo;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use database::Database;
pub use snapshot::Snapshot;
pub use users_repo::{Role, User};

use crate::error::WafResult;
use crate::model::{ErrorPage, Route, Rule};
use snapshot::SnapshotCache;

/// One tenant's persistence layer: its SQLite database plus the cached
/// snapshot the hot path reads.
pub struct TenantStore {
    pub tenant_id: String,
    db: Database,
    cache: SnapshotCache,
}

impl TenantStore {
    /// Opens the tenant database at `data_dir/<tenant_id>.db`, creating and
    /// migrating the schema if needed.
    pub fn open(data_dir: &Path, tenant_id: &str) -> WafResult<Self> {
        let path: PathBuf = data_dir.join(format!("{tenant_id}.db"));
        let db = Database::open(&path)?;
        schema::ensure_schema(&db)?;
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            db,
            cache: SnapshotCache::new(),
        })
    }

    /// An in-memory tenant store, used by tests and by the single-process
    /// demo CLI fixtures.
    pub fn open_in_memory(tenant_id: &str) -> WafResult<Self> {
        let db = Database::open_in_memory()?;
        schema::ensure_schema(&db)?;
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            db,
            cache: SnapshotCache::new(),
        })
    }

    /// The cached, immutable view the hot path evaluates against.
    pub fn snapshot(&self) -> WafResult<Arc<Snapshot>> {
        self.cache.get_or_load(&self.db)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn audit(&self) -> &Database {
        &self.db
    }

    // -- Rules -------------------------------------------------------

    pub fn list_rules(&self) -> WafResult<Vec<Rule>> {
        rules_repo::list(&self.db)
    }

    pub fn get_rule(&self, id: &str) -> WafResult<Option<Rule>> {
        rules_repo::get(&self.db, id)
    }

    pub fn create_rule(&self, rule: &Rule) -> WafResult<()> {
        rules_repo::create(&self.db, rule)?;
        self.invalidate();
        Ok(())
    }

    pub fn update_rule(&self, rule: &Rule) -> WafResult<()> {
        rules_repo::update(&self.db, rule)?;
        self.invalidate();
        Ok(())
    }

    pub fn delete_rule(&self, id: &str) -> WafResult<()> {
        rules_repo::delete(&self.db, id)?;
        self.invalidate();
        Ok(())
    }

    pub fn reorder_rules(&self, ordered_ids: &[String]) -> WafResult<()> {
        rules_repo::reorder(&self.db, ordered_ids)?;
        self.invalidate();
        Ok(())
    }

    // -- Routes (global store only) -----------------------------------

    pub fn list_routes(&self) -> WafResult<Vec<Route>> {
        routes_repo::list(&self.db)
    }

    pub fn get_route(&self, id: &str) -> WafResult<Option<Route>> {
        routes_repo::get(&self.db, id)
    }

    pub fn get_route_by_host(&self, host: &str) -> WafResult<Option<Route>> {
        routes_repo::get_by_host(&self.db, host)
    }

    pub fn put_route(&self, route: &Route) -> WafResult<()> {
        routes_repo::put(&self.db, route)?;
        self.invalidate();
        Ok(())
    }

    pub fn delete_route(&self, id: &str) -> WafResult<()> {
        routes_repo::delete(&self.db, id)?;
        self.invalidate();
        Ok(())
    }

    // -- Error pages ----------------------------------------------------

    pub fn list_error_pages(&self) -> WafResult<Vec<ErrorPage>> {
        error_pages_repo::list(&self.db)
    }

    pub fn put_error_page(&self, page: &ErrorPage) -> WafResult<()> {
        error_pages_repo::put(&self.db, page)?;
        self.invalidate();
        Ok(())
    }

    pub fn delete_error_page(&self, http_code: u16) -> WafResult<()> {
        error_pages_repo::delete(&self.db, http_code)?;
        self.invalidate();
        Ok(())
    }

    // -- Users (global store only) ---------------------------------------

    pub fn list_users(&self) -> WafResult<Vec<User>> {
        users_repo::list(&self.db)
    }

    pub fn get_user(&self, id: &str) -> WafResult<Option<User>> {
        users_repo::get(&self.db, id)
    }

    pub fn get_user_by_username(&self, username: &str) -> WafResult<Option<User>> {
        users_repo::get_by_username(&self.db, username)
    }

    pub fn insert_user(&self, user: &User) -> WafResult<()> {
        users_repo::insert(&self.db, user)
    }

    pub fn delete_user(&self, id: &str) -> WafResult<()> {
        users_repo::delete(&self.db, id)
    }

    pub fn bootstrap_default_admin(&self) -> WafResult<()> {
        users_repo::bootstrap_default_admin(&self.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;
    use std::collections::BTreeSet;

    #[test]
    fn write_invalidates_cached_snapshot() {
        let store = TenantStore::open_in_memory("global").unwrap();
        assert!(store.snapshot().unwrap().rules.is_empty());

        store
            .create_rule(&Rule {
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
            })
            .unwrap();

        assert_eq!(store.snapshot().unwrap().rules.len(), 1);
    }

    #[test]
    fn bootstraps_exactly_one_admin() {
        let store = TenantStore::open_in_memory("global").unwrap();
        store.bootstrap_default_admin().unwrap();
        store.bootstrap_default_admin().unwrap();
        assert_eq!(store.list_users().unwrap().len(), 1);
    }
}
