//! CRUD for the `error_pages` table, keyed by HTTP status code
//! (spec.md §3, §6).

use super::database::Database;
use crate::error::{WafError, WafResult};
use crate::model::ErrorPage;

fn row_to_error_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<ErrorPage> {
    Ok(ErrorPage {
        http_code: row.get::<_, i64>(0)? as u16,
        name: row.get(1)?,
        description: row.get(2)?,
        content_type: row.get(3)?,
        body: row.get(4)?,
    })
}

pub fn list(db: &Database) -> WafResult<Vec<ErrorPage>> {
    db.query(
        "SELECT http_code, name, description, content_type, body FROM error_pages ORDER BY http_code ASC",
        [],
        row_to_error_page,
    )
}

pub fn get(db: &Database, http_code: u16) -> WafResult<Option<ErrorPage>> {
    db.query_one(
        "SELECT http_code, name, description, content_type, body FROM error_pages WHERE http_code = ?1",
        [http_code],
        row_to_error_page,
    )
}

pub fn put(db: &Database, page: &ErrorPage) -> WafResult<()> {
    db.execute(
        "INSERT INTO error_pages (http_code, name, description, content_type, body)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(http_code) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            content_type = excluded.content_type,
            body = excluded.body",
        rusqlite::params![page.http_code, page.name, page.description, page.content_type, page.body],
    )?;
    Ok(())
}

pub fn delete(db: &Database, http_code: u16) -> WafResult<()> {
    let affected = db.execute("DELETE FROM error_pages WHERE http_code = ?1", [http_code])?;
    if affected == 0 {
        return Err(WafError::NotFound(format!("error page {http_code}")));
    }
    Ok(())
}
