use crate::model::{FormattedMeasureChange, UpdateError};

/// Reject the whole batch if any entry was rendered against another snapshot.
///
/// Every entry is checked, including entries carrying formatting errors, and
/// nothing is written before this returns. The error names the first stale
/// entry in batch order.
pub fn validate(batch: &[FormattedMeasureChange], current_etag: &str) -> Result<(), UpdateError> {
    match batch.iter().find(|change| change.etag != current_etag) {
        Some(stale) => {
            log::debug!(
                "Measure {} carries ETag {} but the database is at {}",
                stale.measure,
                stale.etag,
                current_etag
            );
            Err(UpdateError::Conflict {
                measure: stale.measure.clone(),
            })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MeasureRef;

    fn change(table: &str, measure: &str, etag: &str) -> FormattedMeasureChange {
        FormattedMeasureChange::new(MeasureRef::new(table, measure), "1", etag)
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert!(validate(&[], "E1").is_ok());
    }

    #[test]
    fn test_matching_batch_is_valid() {
        let batch = vec![change("Sales", "Total", "E1"), change("Sales", "Count", "E1")];
        assert!(validate(&batch, "E1").is_ok());
    }

    #[test]
    fn test_single_stale_entry_rejects_batch() {
        let batch = vec![
            change("Sales", "Total", "E1"),
            change("Sales", "Count", "E0"),
            change("Sales", "Avg", "E0"),
        ];

        let err = validate(&batch, "E1").unwrap_err();
        assert_eq!(
            err,
            UpdateError::Conflict {
                measure: MeasureRef::new("Sales", "Count")
            }
        );
    }

    #[test]
    fn test_entries_with_formatting_errors_are_checked() {
        let batch = vec![change("Sales", "Total", "E0").with_errors(vec!["bad".to_string()])];
        assert!(validate(&batch, "E1").unwrap_err().is_conflict());
    }
}
