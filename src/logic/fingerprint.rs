use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Ticks (100ns units) between 0001-01-01T00:00:00Z and the Unix epoch
const UNIX_EPOCH_TICKS: i128 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i128 = 10_000_000;

/// Compute the ETag identifying one version of a tabular database.
///
/// The digest covers `name`, `version` and `last_update` only, never measure
/// content. It detects concurrent modification and must not be used for
/// authentication.
pub fn compute(name: &str, version: i64, last_update: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(version.to_le_bytes());
    hasher.update(ticks(last_update).to_le_bytes());

    hex::encode(hasher.finalize())
}

/// 100ns ticks since 0001-01-01.
///
/// Timestamps past the `i64` tick range (around year 29,000) wrap modulo 2^64.
pub fn ticks(timestamp: DateTime<Utc>) -> i64 {
    let ticks = UNIX_EPOCH_TICKS
        + i128::from(timestamp.timestamp()) * TICKS_PER_SECOND
        + i128::from(timestamp.timestamp_subsec_nanos() / 100);
    ticks as i64
}
