use serde::{Deserialize, Serialize};

use crate::model::{FormattedMeasureChange, UpdateError};
use crate::store::traits::{MeasureHandle, ModelSession};

/// Counts produced by one apply pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Expressions written into the pending change set
    pub applied: usize,
    /// Entries whose text already matched
    pub unchanged: usize,
    /// Entries skipped because of formatting errors
    pub skipped: usize,
}

/// Write the accepted entries of an already validated batch into the
/// session's pending change set.
///
/// Stops at the first measure that does not resolve. Earlier writes of the
/// pass stay pending; they are discarded with the session unless saved.
pub fn apply<S: ModelSession>(
    batch: &[FormattedMeasureChange],
    session: &mut S,
    database: &str,
) -> Result<ApplyReport, UpdateError> {
    let mut report = ApplyReport::default();

    for change in batch {
        if change.has_errors() {
            log::debug!(
                "Skipping {}: {} formatting error(s)",
                change.measure,
                change.errors.len()
            );
            report.skipped += 1;
            continue;
        }

        let handle = session
            .measure_mut(database, &change.measure)
            .ok_or_else(|| UpdateError::MeasureNotFound {
                measure: change.measure.clone(),
            })?;

        if handle.expression() == change.expression {
            report.unchanged += 1;
            continue;
        }

        handle.set_expression(&change.expression);
        report.applied += 1;
    }

    Ok(report)
}
