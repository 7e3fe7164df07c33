use thiserror::Error;

use crate::models::{Category, TxnType};

/// Rejection reasons for a transaction form. One variant per field rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ValidationError {
    #[error("Item description is required")]
    EmptyItem,

    #[error("Item description must not contain digits")]
    ItemHasDigits,

    #[error("Item description must be at most {0} characters")]
    ItemTooLong(usize),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Unknown transaction type: {0} (use income or expense)")]
    UnknownType(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Category {category} is not a valid {kind} category")]
    CategoryTypeMismatch { category: Category, kind: TxnType },

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Invalid month: {0} (expected YYYY-MM)")]
    InvalidMonth(String),
}

/// Failures talking to the remote assistant. Never escapes `AiService`.
#[derive(Debug, Error)]
pub(crate) enum AiError {
    #[error("AI backend not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI backend returned status {0}")]
    Status(u16),

    #[error("Invalid response from AI backend: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Import is all or nothing, so any row error aborts the whole file.
#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(&'static str),

    #[error("Line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("File contains no transactions")]
    Empty,
}
