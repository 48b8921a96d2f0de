pub mod migrations;
pub mod queries;

use rusqlite::Connection;

use crate::errors::ClientError;

/// Opens the local key-value store at `path` (`":memory:"` for tests).
pub fn init_db(path: &str) -> Result<Connection, ClientError> {
    let conn = Connection::open(path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}
