use chrono::Utc;
use rusqlite::Connection;

use crate::db::repository::{self, LoadOutcome};
use crate::error::LedgerResult;
use crate::models::organization::OrganizationData;

/// Hands out strictly increasing, time-derived ids.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn starting_after(last: i64) -> Self {
        Self { last }
    }

    pub fn next_id(&mut self) -> i64 {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        self.last
    }
}

/// Owns the live store and the slot it is persisted to.
///
/// All mutations go through [`Workspace::commit`]: the change is applied to a
/// copy, the copy is saved, and only then does it replace the live store. A
/// rejected change or a failed save leaves nothing behind.
pub struct Workspace {
    conn: Connection,
    slot_key: String,
    data: OrganizationData,
    ids: IdGenerator,
}

impl Workspace {
    /// Loads the slot (or the seed) and reports how the state was obtained.
    pub fn open(conn: Connection, slot_key: &str) -> LedgerResult<(Self, LoadOutcome)> {
        let (data, outcome) = repository::load_data(&conn, slot_key)?;
        let ids = IdGenerator::starting_after(data.max_record_id());
        let workspace = Self {
            conn,
            slot_key: slot_key.to_string(),
            data,
            ids,
        };
        Ok((workspace, outcome))
    }

    pub fn data(&self) -> &OrganizationData {
        &self.data
    }

    pub fn commit<T, F>(&mut self, change: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut OrganizationData, &mut IdGenerator) -> LedgerResult<T>,
    {
        let mut working = self.data.clone();
        let mut ids = self.ids.clone();
        let value = change(&mut working, &mut ids)?;
        repository::save_data(&self.conn, &self.slot_key, &working)?;
        self.data = working;
        self.ids = ids;
        Ok(value)
    }

    /// Swaps in a whole new store, as restore and import do.
    pub fn replace(&mut self, data: OrganizationData) -> LedgerResult<()> {
        let floor = data.max_record_id().max(self.ids.last);
        repository::save_data(&self.conn, &self.slot_key, &data)?;
        self.data = data;
        self.ids = IdGenerator::starting_after(floor);
        Ok(())
    }

    pub fn save(&self) -> LedgerResult<()> {
        repository::save_data(&self.conn, &self.slot_key, &self.data)
    }
}

#[cfg(test)]
pub fn test_workspace() -> Workspace {
    let conn = crate::db::connection::establish_test_connection().unwrap();
    let (workspace, _) = Workspace::open(conn, "test_slot").unwrap();
    workspace
}
