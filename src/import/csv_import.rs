use chrono::NaiveDate;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::ImportError;
use crate::models::{NewTransaction, Transaction};

const DATE_HEADERS: &[&str] = &["date", "entry_date", "entrydate"];
const ITEM_HEADERS: &[&str] = &["item", "description"];
const TYPE_HEADERS: &[&str] = &["type", "kind"];
const CATEGORY_HEADERS: &[&str] = &["category"];
const AMOUNT_HEADERS: &[&str] = &["amount"];

struct Columns {
    date: usize,
    item: usize,
    kind: usize,
    category: usize,
    amount: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |names: &[&str], label: &'static str| -> Result<usize, ImportError> {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
                .ok_or(ImportError::MissingColumn(label))
        };
        Ok(Self {
            date: find(DATE_HEADERS, "date")?,
            item: find(ITEM_HEADERS, "item")?,
            kind: find(TYPE_HEADERS, "type")?,
            category: find(CATEGORY_HEADERS, "category")?,
            amount: find(AMOUNT_HEADERS, "amount")?,
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    pub(crate) fn from_path(path: &Path) -> Result<Vec<Transaction>, ImportError> {
        let file = std::fs::File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }

    /// Parse and validate every row. A single bad row rejects the whole file,
    /// reported with its 1-based line number (the header is line 1).
    pub(crate) fn from_reader<R: Read>(reader: R) -> Result<Vec<Transaction>, ImportError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::locate(rdr.headers()?)?;
        let field = |record: &csv::StringRecord, idx: usize| record.get(idx).unwrap_or_default().to_string();

        let mut transactions = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            let form = NewTransaction {
                item: field(&record, columns.item),
                amount: field(&record, columns.amount),
                kind: field(&record, columns.kind),
                category: field(&record, columns.category),
                entry_date: normalize_date(&field(&record, columns.date)),
            };
            let txn = form
                .validate()
                .map_err(|source| ImportError::Row { line: i + 2, source })?;
            transactions.push(txn);
        }

        if transactions.is_empty() {
            return Err(ImportError::Empty);
        }
        Ok(transactions)
    }
}

/// Rewrite common date spellings to ISO; anything unrecognised passes through
/// so validation reports it.
fn normalize_date(s: &str) -> String {
    for fmt in &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d", "%m/%d/%y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    s.to_string()
}

/// Drop incoming rows that match an existing transaction on date, item,
/// amount and category, and repeats within the batch itself.
pub(crate) fn skip_duplicates(existing: &[Transaction], incoming: Vec<Transaction>) -> (Vec<Transaction>, usize) {
    let mut seen: HashSet<u64> = existing.iter().map(fingerprint).collect();
    let before = incoming.len();
    let fresh: Vec<Transaction> = incoming
        .into_iter()
        .filter(|t| seen.insert(fingerprint(t)))
        .collect();
    let skipped = before - fresh.len();
    (fresh, skipped)
}

fn fingerprint(txn: &Transaction) -> u64 {
    let input = format!(
        "{}|{}|{}|{}",
        txn.entry_date,
        txn.item.to_lowercase(),
        txn.amount.normalize(),
        txn.category.key()
    );
    fnv1a(input.as_bytes())
}

/// FNV-1a (64-bit), stable across Rust releases unlike `DefaultHasher`.
fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
