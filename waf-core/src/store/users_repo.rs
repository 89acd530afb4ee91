//! Administrator accounts, stored in the global store only. Grounded in the
//! teacher's `router-api/src/api/users` module; the `Role`/`User` shapes and
//! the simulated password hash are carried over verbatim since this is
//! ambient session-layer plumbing, not WAF rule-evaluation logic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::database::Database;
use crate::error::{WafError, WafResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::User => "user",
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "staff" => Role::Staff,
            _ => Role::User,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn new(username: String, email: String, password: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            password_hash: hash_password(password),
            role,
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        self.password_hash == hash_password(password)
    }
}

/// Simulated password hash. Not a real KDF — this ambient auth layer is
/// explicitly out of scope beyond accepting an already-resolved
/// `{actor, role}`; a real deployment would swap this for argon2/bcrypt.
fn hash_password(password: &str) -> String {
    format!("hashed_{password}")
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::from(role_str.as_str()),
    })
}

pub fn list(db: &Database) -> WafResult<Vec<User>> {
    db.query(
        "SELECT id, username, email, password_hash, role FROM users ORDER BY username ASC",
        [],
        row_to_user,
    )
}

pub fn get(db: &Database, id: &str) -> WafResult<Option<User>> {
    db.query_one(
        "SELECT id, username, email, password_hash, role FROM users WHERE id = ?1",
        [id],
        row_to_user,
    )
}

pub fn get_by_username(db: &Database, username: &str) -> WafResult<Option<User>> {
    db.query_one(
        "SELECT id, username, email, password_hash, role FROM users WHERE username = ?1",
        [username],
        row_to_user,
    )
}

pub fn insert(db: &Database, user: &User) -> WafResult<()> {
    let existing = get_by_username(db, &user.username)?;
    if existing.is_some() {
        return Err(WafError::Conflict(format!("username {} already exists", user.username)));
    }
    db.execute(
        "INSERT INTO users (id, username, email, password_hash, role) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![user.id, user.username, user.email, user.password_hash, user.role.as_str()],
    )?;
    Ok(())
}

pub fn delete(db: &Database, id: &str) -> WafResult<()> {
    let affected = db.execute("DELETE FROM users WHERE id = ?1", [id])?;
    if affected == 0 {
        return Err(WafError::NotFound(format!("user {id}")));
    }
    Ok(())
}

/// Creates the default administrator account on first start, mirroring the
/// teacher's `init_database` bootstrap. No-op if any user already exists.
pub fn bootstrap_default_admin(db: &Database) -> WafResult<()> {
    if !list(db)?.is_empty() {
        return Ok(());
    }
    let admin = User::new(
        "admin".to_string(),
        "admin@localhost".to_string(),
        "admin",
        Role::Admin,
    );
    insert(db, &admin)?;
    log::info!("bootstrapped default administrator account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::ensure_schema;

    #[test]
    fn bootstrap_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        bootstrap_default_admin(&db).unwrap();
        bootstrap_default_admin(&db).unwrap();
        assert_eq!(list(&db).unwrap().len(), 1);
    }

    #[test]
    fn password_round_trips() {
        let user = User::new("alice".to_string(), "a@example.com".to_string(), "hunter2", Role::Staff);
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("wrong"));
    }

    #[test]
    fn insert_rejects_duplicate_username() {
        let db = Database::open_in_memory().unwrap();
        ensure_schema(&db).unwrap();
        let user = User::new("alice".to_string(), "a@example.com".to_string(), "pw", Role::User);
        insert(&db, &user).unwrap();
        let dup = User::new("alice".to_string(), "b@example.com".to_string(), "pw2", Role::User);
        assert!(insert(&db, &dup).is_err());
    }
}
