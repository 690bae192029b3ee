use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use super::seed;
use crate::error::LedgerResult;
use crate::models::organization::OrganizationData;

/// How `load_data` obtained the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Seeded,
    /// The slot could not be parsed; it was dropped and the seed installed.
    Recovered { reason: String },
}

/// Writes the complete store into the slot, replacing what was there.
pub fn save_data(conn: &Connection, key: &str, data: &OrganizationData) -> LedgerResult<()> {
    let payload = serde_json::to_string(data)?;
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, payload, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn load_raw(conn: &Connection, key: &str) -> LedgerResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn remove_slot(conn: &Connection, key: &str) -> LedgerResult<()> {
    conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
    Ok(())
}

pub fn load_data(conn: &Connection, key: &str) -> LedgerResult<(OrganizationData, LoadOutcome)> {
    let raw = match load_raw(conn, key)? {
        Some(raw) => raw,
        None => {
            let data = seed::seed_data();
            save_data(conn, key, &data)?;
            return Ok((data, LoadOutcome::Seeded));
        }
    };

    match serde_json::from_str::<OrganizationData>(&raw) {
        Ok(mut data) => {
            if data.teams.is_empty() {
                seed::install_seed_hierarchy(&mut data);
                save_data(conn, key, &data)?;
            }
            Ok((data, LoadOutcome::Loaded))
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "persisted data is corrupted, resetting to seed");
            remove_slot(conn, key)?;
            let data = seed::seed_data();
            save_data(conn, key, &data)?;
            Ok((
                data,
                LoadOutcome::Recovered {
                    reason: err.to_string(),
                },
            ))
        }
    }
}
