//! CRUD for the `rules` table, shared by the global store and every
//! per-route store. Grounded in the teacher's
//! `router-api/src/api/settings/gateway_queries.rs` (get-all/get-by-id/
//! insert-or-replace/delete shape, ordered by priority).

use std::collections::BTreeSet;

use super::database::Database;
use crate::error::{WafError, WafResult};
use crate::model::{Action, Expression, Rule};

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rule> {
    let action_str: String = row.get(4)?;
    let expression_json: String = row.get(5)?;
    let tags_json: String = row.get(6)?;

    let action = match action_str.as_str() {
        "BLOCK" => Action::Block,
        "CHALLENGE" => Action::Challenge,
        "ALLOW" => Action::Allow,
        _ => Action::Log,
    };
    let expression: Expression = serde_json::from_str(&expression_json).unwrap_or_default();
    let tags: BTreeSet<String> = serde_json::from_str(&tags_json).unwrap_or_default();

    Ok(Rule {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        enabled: row.get::<_, i64>(3)? != 0,
        action,
        expression,
        tags,
        priority: row.get(7)?,
        trigger_alert: row.get::<_, i64>(8)? != 0,
        block_http_code: row.get(9)?,
    })
}

pub fn list(db: &Database) -> WafResult<Vec<Rule>> {
    let rules = db.query(
        "SELECT id, name, description, enabled, action, expression_json, tags_json, priority, trigger_alert, block_http_code
         FROM rules ORDER BY priority ASC, id ASC",
        [],
        row_to_rule,
    )?;
    Ok(rules)
}

pub fn get(db: &Database, id: &str) -> WafResult<Option<Rule>> {
    db.query_one(
        "SELECT id, name, description, enabled, action, expression_json, tags_json, priority, trigger_alert, block_http_code
         FROM rules WHERE id = ?1",
        [id],
        row_to_rule,
    )
}

/// Highest `priority` among currently enabled rules, or 0 if none exist
/// (spec.md §4.5 "priority must be ... greater than current-max + 1").
fn max_enabled_priority(db: &Database) -> WafResult<i64> {
    let row: Option<Option<i64>> = db.query_one(
        "SELECT MAX(priority) FROM rules WHERE enabled != 0",
        [],
        |row| row.get(0),
    )?;
    Ok(row.flatten().unwrap_or(0))
}

fn insert_or_replace(db: &Database, rule: &Rule) -> WafResult<()> {
    let expression_json = serde_json::to_string(&rule.expression)?;
    let tags_json = serde_json::to_string(&rule.tags)?;
    db.execute(
        "INSERT INTO rules (id, name, description, enabled, action, expression_json, tags_json, priority, trigger_alert, block_http_code, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, CURRENT_TIMESTAMP)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            enabled = excluded.enabled,
            action = excluded.action,
            expression_json = excluded.expression_json,
            tags_json = excluded.tags_json,
            priority = excluded.priority,
            trigger_alert = excluded.trigger_alert,
            block_http_code = excluded.block_http_code,
            updated_at = CURRENT_TIMESTAMP",
        rusqlite::params![
            rule.id,
            rule.name,
            rule.description,
            rule.enabled as i64,
            rule.action.as_str(),
            expression_json,
            tags_json,
            rule.priority,
            rule.trigger_alert as i64,
            rule.block_http_code,
        ],
    )?;
    Ok(())
}

/// Inserts a brand-new rule (spec.md §4.5 "create_rule"). Rejects an id
/// that already exists, a non-positive priority, and a priority more than
/// one past the current enabled-rule maximum.
pub fn create(db: &Database, rule: &Rule) -> WafResult<()> {
    if get(db, &rule.id)?.is_some() {
        return Err(WafError::Conflict(format!("rule {} already exists", rule.id)));
    }
    if rule.priority <= 0 {
        return Err(WafError::InvalidInput("priority must be greater than 0".to_string()));
    }
    let ceiling = max_enabled_priority(db)? + 1;
    if rule.priority > ceiling {
        return Err(WafError::InvalidInput(format!(
            "priority {} exceeds current-max + 1 ({ceiling})",
            rule.priority
        )));
    }
    insert_or_replace(db, rule)
}

/// Fully replaces an existing rule (spec.md §4.5 "update_rule"). Rejects an
/// unknown id with `NotFound` rather than silently creating it.
pub fn update(db: &Database, rule: &Rule) -> WafResult<()> {
    if get(db, &rule.id)?.is_none() {
        return Err(WafError::NotFound(format!("rule {}", rule.id)));
    }
    insert_or_replace(db, rule)
}

pub fn delete(db: &Database, id: &str) -> WafResult<()> {
    let affected = db.execute("DELETE FROM rules WHERE id = ?1", [id])?;
    if affected == 0 {
        return Err(WafError::NotFound(format!("rule {id}")));
    }
    Ok(())
}

/// Applies a caller-supplied total order to every *enabled* rule's
/// `priority` (spec.md §4.5 "reorder"), rejecting the call unless
/// `ordered_ids` names exactly the enabled rule set with no repeats —
/// disabled rules carry no priority semantics and are not part of this
/// call (spec.md §3 "Disabled rules have no priority semantically").
pub fn reorder(db: &Database, ordered_ids: &[String]) -> WafResult<()> {
    let enabled_ids: BTreeSet<String> = list(db)?.into_iter().filter(|r| r.enabled).map(|r| r.id).collect();
    let requested: BTreeSet<String> = ordered_ids.iter().cloned().collect();
    if requested.len() != ordered_ids.len() || requested != enabled_ids {
        return Err(WafError::InvalidInput(
            "reorder must list every enabled rule id exactly once".to_string(),
        ));
    }
    db.transaction(|conn| {
        for (index, id) in ordered_ids.iter().enumerate() {
            conn.execute(
                "UPDATE rules SET priority = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                rusqlite::params![(index + 1) as i64, id],
            )?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Operator, Predicate, RuleValue};
    use crate::store::schema::ensure_schema;

    fn sample(id: &str, priority: i64) -> Rule {
        Rule {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            enabled: true,
            action: Action::Block,
            expression: vec![Predicate {
                field: "request.method".to_string(),
                operator: Operator::Equals,
                value: RuleValue::String("POST".to_string()),
            }],
            tags: BTreeSet::new(),
            priority,
            trigger_alert: false,
            block_http_code: Some(403),
        }
    }

    #[test]
    fn create_get_list_delete_round_trip() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();

        create(&db, &sample("rule-1", 1)).unwrap();
        create(&db, &sample("rule-2", 2)).unwrap();
        // Bypass create()'s priority ceiling to set up an out-of-order fixture.
        insert_or_replace(&db, &sample("rule-0", 0)).unwrap();

        let all = list(&db).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, "rule-0"); // lower priority sorts first

        let fetched = get(&db, "rule-1").unwrap().unwrap();
        assert_eq!(fetched.expression.len(), 1);
        assert_eq!(fetched.block_http_code, Some(403));

        delete(&db, "rule-1").unwrap();
        assert!(get(&db, "rule-1").unwrap().is_none());
        assert!(delete(&db, "rule-1").is_err());
    }

    #[test]
    fn create_rejects_nonpositive_priority() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        assert!(matches!(create(&db, &sample("rule-1", 0)), Err(WafError::InvalidInput(_))));
    }

    #[test]
    fn create_rejects_priority_beyond_max_plus_one() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        create(&db, &sample("rule-1", 1)).unwrap();
        assert!(matches!(create(&db, &sample("rule-2", 3)), Err(WafError::InvalidInput(_))));
        // max + 1 is still accepted.
        create(&db, &sample("rule-3", 2)).unwrap();
    }

    #[test]
    fn create_rejects_existing_id() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        create(&db, &sample("rule-1", 1)).unwrap();
        assert!(matches!(create(&db, &sample("rule-1", 2)), Err(WafError::Conflict(_))));
    }

    #[test]
    fn update_rejects_unknown_id() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        assert!(matches!(update(&db, &sample("rule-1", 1)), Err(WafError::NotFound(_))));
    }

    #[test]
    fn update_replaces_existing_rule() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        create(&db, &sample("rule-1", 1)).unwrap();
        let mut updated = sample("rule-1", 1);
        updated.name = "renamed".to_string();
        update(&db, &updated).unwrap();
        assert_eq!(get(&db, "rule-1").unwrap().unwrap().name, "renamed");
    }

    #[test]
    fn reorder_rejects_mismatched_id_set() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        create(&db, &sample("rule-1", 1)).unwrap();
        assert!(reorder(&db, &["rule-1".to_string(), "rule-2".to_string()]).is_err());
    }

    #[test]
    fn reorder_rejects_disabled_id_in_the_list() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        create(&db, &sample("rule-1", 1)).unwrap();
        let mut disabled = sample("rule-2", 2);
        disabled.enabled = false;
        insert_or_replace(&db, &disabled).unwrap();
        // Only "rule-1" is enabled; listing the disabled id too is rejected.
        assert!(reorder(&db, &["rule-1".to_string(), "rule-2".to_string()]).is_err());
        // Omitting the disabled id and reordering just the enabled ones works.
        reorder(&db, &["rule-1".to_string()]).unwrap();
    }

    #[test]
    fn reorder_densifies_to_one_based_priorities() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        insert_or_replace(&db, &sample("rule-a", 2)).unwrap();
        insert_or_replace(&db, &sample("rule-b", 5)).unwrap();
        insert_or_replace(&db, &sample("rule-c", 9)).unwrap();

        reorder(&db, &["rule-c".to_string(), "rule-a".to_string(), "rule-b".to_string()]).unwrap();
        let all = list(&db).unwrap();
        assert_eq!(all[0].id, "rule-c");
        assert_eq!(all[0].priority, 1);
        assert_eq!(all[1].id, "rule-a");
        assert_eq!(all[1].priority, 2);
        assert_eq!(all[2].id, "rule-b");
        assert_eq!(all[2].priority, 3);
    }
}
