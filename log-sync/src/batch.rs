use crate::entry::{LogEntry, NormalizedRow};
use crate::metrics_defs::ENTRIES_SKIPPED;
use serde_json::Value;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch payload is not a list")]
    NotASequence,
    #[error("batch payload is an empty list")]
    Empty,
}

#[derive(Debug, Default, PartialEq)]
pub struct Batch {
    /// Rows for the valid entries, in submission order.
    pub rows: Vec<NormalizedRow>,
    /// Positions of the entries that were dropped.
    pub skipped: Vec<usize>,
}

/// Validates and normalizes every entry of a bulk payload.
///
/// Invalid entries are dropped with a warning instead of failing the batch.
/// An empty list is rejected so that it can be told apart from a batch whose
/// entries were all invalid.
pub fn assemble(payload: &Value) -> Result<Batch, BatchError> {
    let entries = payload.as_array().ok_or(BatchError::NotASequence)?;
    if entries.is_empty() {
        return Err(BatchError::Empty);
    }

    let mut batch = Batch {
        rows: Vec::with_capacity(entries.len()),
        skipped: Vec::new(),
    };

    for (index, value) in entries.iter().enumerate() {
        match LogEntry::from_value(value) {
            Ok(entry) => batch.rows.push(entry.into_row()),
            Err(e) => {
                tracing::warn!(index, entry = %value, error = %e, "Skipping invalid entry during sync");
                batch.skipped.push(index);
            }
        }
    }

    if !batch.skipped.is_empty() {
        shared::counter!(ENTRIES_SKIPPED).increment(batch.skipped.len() as u64);
    }

    Ok(batch)
}
