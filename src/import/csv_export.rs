use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::models::Transaction;

pub(crate) const EXPORT_HEADERS: [&str; 6] = ["id", "date", "item", "type", "category", "amount"];

/// Write transactions as CSV in the same column layout the importer reads.
pub(crate) fn write_csv<W: Write>(writer: W, txns: &[&Transaction]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADERS)?;
    for txn in txns {
        wtr.write_record([
            txn.id.as_str(),
            &txn.entry_date.format("%Y-%m-%d").to_string(),
            txn.item.as_str(),
            txn.kind.as_str(),
            txn.category.key(),
            &txn.amount.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(txns.len())
}

pub(crate) fn export_to_csv(path: &Path, txns: &[&Transaction]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let count = write_csv(file, txns)?;
    tracing::info!(path = %path.display(), count, "Exported transactions");
    Ok(count)
}
