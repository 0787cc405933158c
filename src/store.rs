//! Per-source "last seen message id", persisted in SQLite so a restart
//! does not re-relay the catch-up backlog.

use anyhow::{Result, anyhow};
use sqlite::State;
use std::sync::{Arc, Mutex};

pub type SharedStore = Arc<Mutex<sqlite::Connection>>;

pub fn open_store(path: &str) -> Result<SharedStore> {
    let conn = sqlite::open(path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS last_seen (
            source_id  INTEGER PRIMARY KEY,
            message_id INTEGER NOT NULL
        );",
    )?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn last_seen(store: &SharedStore, source_id: i64) -> Result<Option<i64>> {
    let db = store.lock().map_err(|_| anyhow!("state db lock poisoned"))?;
    let mut stmt = db.prepare("SELECT message_id FROM last_seen WHERE source_id = ?")?;
    stmt.bind((1, source_id))?;
    if let State::Row = stmt.next()? {
        return Ok(Some(stmt.read::<i64, _>(0)?));
    }
    Ok(None)
}

/// Record `message_id` for `source_id`.  Never moves backwards.
pub fn mark_seen(store: &SharedStore, source_id: i64, message_id: i64) -> Result<()> {
    let db = store.lock().map_err(|_| anyhow!("state db lock poisoned"))?;
    let mut stmt = db.prepare(
        "INSERT INTO last_seen (source_id, message_id) VALUES (?, ?)
         ON CONFLICT(source_id) DO UPDATE SET message_id = excluded.message_id
         WHERE excluded.message_id > last_seen.message_id",
    )?;
    stmt.bind((1, source_id))?;
    stmt.bind((2, message_id))?;
    stmt.next()?;
    Ok(())
}

/// `true` when `message_id` was already handled for this source.
pub fn already_seen(store: &SharedStore, source_id: i64, message_id: i64) -> Result<bool> {
    Ok(last_seen(store, source_id)?.is_some_and(|seen| message_id <= seen))
}
