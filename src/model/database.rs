use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::fingerprint;

/// Identity of a remote tabular database at the moment it was fetched.
/// Never cached across sessions: every update call refetches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    pub name: String,
    pub version: i64,
    pub last_update: DateTime<Utc>,
}

impl DatabaseSnapshot {
    pub fn new(name: impl Into<String>, version: i64, last_update: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            version,
            last_update,
        }
    }

    /// Fingerprint of this snapshot, see [`fingerprint::compute`]
    pub fn etag(&self) -> String {
        fingerprint::compute(&self.name, self.version, self.last_update)
    }
}

/// Browse view of a database: snapshot fields plus the ETag callers must
/// stamp on the edits they render against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInfo {
    pub name: String,
    pub version: i64,
    pub last_update: DateTime<Utc>,
    pub etag: String,
}

impl From<&DatabaseSnapshot> for DatabaseInfo {
    fn from(snapshot: &DatabaseSnapshot) -> Self {
        Self {
            name: snapshot.name.clone(),
            version: snapshot.version,
            last_update: snapshot.last_update,
            etag: snapshot.etag(),
        }
    }
}
