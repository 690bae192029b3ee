use chrono::Utc;

use crate::error::{LedgerError, LedgerResult};
use crate::models::backup::Backup;
use crate::workspace::Workspace;

/// Snapshots the whole store, backups list included, into a new backup.
pub fn create_backup(workspace: &mut Workspace) -> LedgerResult<Backup> {
    let backup = workspace.commit(|data, ids| {
        let backup = Backup {
            id: ids.next_id(),
            date: Utc::now(),
            data: data.clone(),
        };
        data.backups.push(backup.clone());
        Ok(backup)
    })?;
    tracing::info!(id = backup.id, "backup created");
    Ok(backup)
}

/// Replaces the live store with a snapshot. Nothing is saved beforehand, so
/// changes made after the snapshot are lost.
pub fn restore_backup(workspace: &mut Workspace, id: i64) -> LedgerResult<()> {
    let snapshot = workspace
        .data()
        .backup(id)
        .map(|b| b.data.clone())
        .ok_or_else(|| LedgerError::NotFound(format!("Backup {}", id)))?;
    workspace.replace(snapshot)?;
    tracing::info!(id, "backup restored");
    Ok(())
}

pub fn delete_backup(workspace: &mut Workspace, id: i64) -> LedgerResult<()> {
    workspace.commit(|data, _| {
        let pos = data
            .backups
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LedgerError::NotFound(format!("Backup {}", id)))?;
        data.backups.remove(pos);
        Ok(())
    })?;
    tracing::info!(id, "backup deleted");
    Ok(())
}

/// Backups, newest first.
pub fn list_backups(workspace: &Workspace) -> Vec<&Backup> {
    let mut backups: Vec<&Backup> = workspace.data().backups.iter().collect();
    backups.sort_by(|a, b| b.id.cmp(&a.id));
    backups
}
