use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::organization::OrganizationData;

/// A full copy of the store taken at `date`. The copy carries the backups
/// list as it was at that moment, so snapshots nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub data: OrganizationData,
}
