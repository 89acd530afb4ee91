//! CRUD for the `routes` table. Only the global store's database ever has
//! rows here — routes are how the global store owns the tenant directory
//! (spec.md §3 "Ownership").
//!
//! Every write here also maintains the route's auto-generated
//! "route-admission" global ALLOW rule (spec.md §4.5 "Global store special
//! roles") in the same SQL transaction as the route row itself, so the two
//! can never observably diverge (spec.md §8 "Route auto-admission
//! coherence").

use std::collections::BTreeSet;

use waf_common::{ROUTE_ADMISSION_PRIORITY, ROUTE_ADMISSION_TAG};

use super::database::Database;
use crate::error::{WafError, WafResult};
use crate::model::{Operator, OriginType, Predicate, Route, RuleValue};

/// Deterministic id for the admission rule guarding `route_id`, so it can be
/// upserted and deleted without a lookup join.
fn admission_rule_id(route_id: &str) -> String {
    format!("route-admission:{route_id}")
}

fn row_to_route(row: &rusqlite::Row<'_>) -> rusqlite::Result<Route> {
    let origin_type_str: String = row.get(2)?;
    Ok(Route {
        id: row.get(0)?,
        incoming_host: row.get(1)?,
        origin_type: if origin_type_str == "service" {
            OriginType::Service
        } else {
            OriginType::Url
        },
        origin_url: row.get(3)?,
        origin_service_name: row.get(4)?,
        enabled: row.get::<_, i64>(5)? != 0,
    })
}

pub fn list(db: &Database) -> WafResult<Vec<Route>> {
    db.query(
        "SELECT id, incoming_host, origin_type, origin_url, origin_service_name, enabled FROM routes ORDER BY incoming_host ASC",
        [],
        row_to_route,
    )
}

pub fn get(db: &Database, id: &str) -> WafResult<Option<Route>> {
    db.query_one(
        "SELECT id, incoming_host, origin_type, origin_url, origin_service_name, enabled FROM routes WHERE id = ?1",
        [id],
        row_to_route,
    )
}

pub fn get_by_host(db: &Database, host: &str) -> WafResult<Option<Route>> {
    db.query_one(
        "SELECT id, incoming_host, origin_type, origin_url, origin_service_name, enabled FROM routes WHERE incoming_host = ?1",
        [host],
        row_to_route,
    )
}

pub fn put(db: &Database, route: &Route) -> WafResult<()> {
    let origin_type_str = match route.origin_type {
        OriginType::Service => "service",
        OriginType::Url => "url",
    };
    let existing_host_owner = db.query_one::<String, _, _>(
        "SELECT id FROM routes WHERE incoming_host = ?1 AND id != ?2",
        rusqlite::params![route.incoming_host, route.id],
        |row| row.get(0),
    )?;
    if existing_host_owner.is_some() {
        return Err(WafError::Conflict(format!(
            "host {} is already owned by another route",
            route.incoming_host
        )));
    }

    let admission_rule_id = admission_rule_id(&route.id);
    let expression_json = serde_json::to_string(&vec![Predicate {
        field: "request.headers.host".to_string(),
        operator: Operator::Equals,
        value: RuleValue::String(route.incoming_host.clone()),
    }])?;
    let mut tags = BTreeSet::new();
    tags.insert(ROUTE_ADMISSION_TAG.to_string());
    let tags_json = serde_json::to_string(&tags)?;
    let admission_name = format!("route-admission:{}", route.incoming_host);

    db.transaction(|conn| {
        conn.execute(
            "INSERT INTO routes (id, incoming_host, origin_type, origin_url, origin_service_name, enabled, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET
                incoming_host = excluded.incoming_host,
                origin_type = excluded.origin_type,
                origin_url = excluded.origin_url,
                origin_service_name = excluded.origin_service_name,
                enabled = excluded.enabled,
                updated_at = CURRENT_TIMESTAMP",
            rusqlite::params![
                route.id,
                route.incoming_host,
                origin_type_str,
                route.origin_url,
                route.origin_service_name,
                route.enabled as i64,
            ],
        )?;

        // The admission rule's `enabled` tracks the route's `enabled` in
        // lockstep, in the same transaction as the route write itself.
        conn.execute(
            "INSERT INTO rules (id, name, description, enabled, action, expression_json, tags_json, priority, trigger_alert, block_http_code, updated_at)
             VALUES (?1, ?2, '', ?3, 'ALLOW', ?4, ?5, ?6, 0, NULL, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                enabled = excluded.enabled,
                expression_json = excluded.expression_json,
                tags_json = excluded.tags_json,
                updated_at = CURRENT_TIMESTAMP",
            rusqlite::params![
                admission_rule_id,
                admission_name,
                route.enabled as i64,
                expression_json,
                tags_json,
                ROUTE_ADMISSION_PRIORITY,
            ],
        )?;

        Ok(())
    })
}

pub fn delete(db: &Database, id: &str) -> WafResult<()> {
    let admission_rule_id = admission_rule_id(id);
    let affected = db.transaction(|conn| {
        conn.execute("DELETE FROM rules WHERE id = ?1", rusqlite::params![admission_rule_id])?;
        conn.execute("DELETE FROM routes WHERE id = ?1", rusqlite::params![id])
    })?;
    if affected == 0 {
        return Err(WafError::NotFound(format!("route {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::ensure_schema;

    fn sample(id: &str, host: &str) -> Route {
        Route {
            id: id.to_string(),
            incoming_host: host.to_string(),
            origin_type: OriginType::Url,
            origin_url: Some("https://origin.example".to_string()),
            origin_service_name: None,
            enabled: true,
        }
    }

    #[test]
    fn put_rejects_duplicate_host() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();
        let conflicting = sample("route-2", "a.example.com");
        assert!(put(&db, &conflicting).is_err());
    }

    #[test]
    fn get_by_host_round_trips() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();
        let found = get_by_host(&db, "a.example.com").unwrap().unwrap();
        assert_eq!(found.id, "route-1");
        assert!(get_by_host(&db, "missing.example.com").unwrap().is_none());
    }

    #[test]
    fn updating_same_id_does_not_conflict_with_itself() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();
        let mut updated = sample("route-1", "a.example.com");
        updated.enabled = false;
        put(&db, &updated).unwrap();
        assert!(!get(&db, "route-1").unwrap().unwrap().enabled);
    }

    #[test]
    fn put_creates_an_enabled_admission_rule() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();

        let rule = crate::store::rules_repo::get(&db, &admission_rule_id("route-1"))
            .unwrap()
            .expect("admission rule must exist");
        assert!(rule.enabled);
        assert_eq!(rule.action, crate::model::Action::Allow);
        assert!(rule.tags.contains(ROUTE_ADMISSION_TAG));
        assert_eq!(rule.expression.len(), 1);
        assert_eq!(rule.expression[0].field, "request.headers.host");
    }

    #[test]
    fn admission_rule_enabled_tracks_route_enabled() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();

        let mut disabled = sample("route-1", "a.example.com");
        disabled.enabled = false;
        put(&db, &disabled).unwrap();

        let rule = crate::store::rules_repo::get(&db, &admission_rule_id("route-1"))
            .unwrap()
            .unwrap();
        assert!(!rule.enabled);
    }

    #[test]
    fn delete_removes_the_admission_rule_too() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        put(&db, &sample("route-1", "a.example.com")).unwrap();
        delete(&db, "route-1").unwrap();

        assert!(get(&db, "route-1").unwrap().is_none());
        assert!(crate::store::rules_repo::get(&db, &admission_rule_id("route-1"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn delete_unknown_route_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        assert!(matches!(delete(&db, "missing"), Err(WafError::NotFound(_))));
    }
}
