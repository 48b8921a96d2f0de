use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::ClientError;

pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, ClientError> {
    let value = conn
        .query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_value(conn: &Connection, key: &str, value: &str) -> Result<(), ClientError> {
    conn.execute(
        "INSERT INTO local_storage (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![key, value],
    )?;
    Ok(())
}

pub fn remove_value(conn: &Connection, key: &str) -> Result<bool, ClientError> {
    let count = conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
    Ok(count > 0)
}

pub fn clear_all(conn: &Connection) -> Result<usize, ClientError> {
    let count = conn.execute("DELETE FROM local_storage", [])?;
    Ok(count)
}
