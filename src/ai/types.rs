//! Wire types for the remote assistant. Amounts travel as JSON numbers and
//! dates as `YYYY-MM-DD` strings.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::to_f64;
use crate::models::{BudgetMap, Transaction, TxnType};

/// The backend requires `amount`; an amount not yet known is sent as 0.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CategoryRequest {
    pub(crate) item: String,
    pub(crate) amount: f64,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    #[serde(rename = "entryDate")]
    pub(crate) entry_date: String,
}

impl CategoryRequest {
    pub(crate) fn new(item: &str, kind: TxnType, amount: Option<Decimal>, date: NaiveDate) -> Self {
        Self {
            item: item.trim().to_string(),
            amount: amount.map(to_f64).unwrap_or(0.0),
            kind: kind.as_str().to_string(),
            entry_date: date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CategoryResponse {
    pub(crate) suggested_category: String,
    #[serde(default)]
    pub(crate) confidence: f64,
    #[serde(default)]
    pub(crate) reasoning: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ReceiptResponse {
    pub(crate) success: bool,
    #[serde(default)]
    pub(crate) message: String,
    pub(crate) data: Option<ReceiptPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ReceiptPayload {
    pub(crate) vendor: Option<String>,
    pub(crate) amount: Option<f64>,
    pub(crate) date: Option<String>,
    pub(crate) suggested_category: Option<String>,
    #[serde(default)]
    pub(crate) confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransactionPayload {
    pub(crate) id: String,
    pub(crate) item: String,
    pub(crate) amount: f64,
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) category: String,
    #[serde(rename = "entryDate")]
    pub(crate) entry_date: String,
}

impl From<&Transaction> for TransactionPayload {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: txn.id.clone(),
            item: txn.item.clone(),
            amount: to_f64(txn.amount),
            kind: txn.kind.as_str().to_string(),
            category: txn.category.key().to_string(),
            entry_date: txn.entry_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SpendingRequest {
    pub(crate) transactions: Vec<TransactionPayload>,
    pub(crate) days_ahead: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpendingResponse {
    pub(crate) predicted_amount: f64,
    pub(crate) confidence_interval: (f64, f64),
    #[serde(default)]
    pub(crate) trend: String,
    #[serde(default)]
    pub(crate) factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct InsightsRequest {
    pub(crate) transactions: Vec<TransactionPayload>,
    pub(crate) budgets: BTreeMap<String, f64>,
    pub(crate) current_month: String,
}

pub(crate) fn budget_payload(budgets: &BudgetMap) -> BTreeMap<String, f64> {
    budgets
        .iter()
        .map(|(category, limit)| (category.key().to_string(), to_f64(limit)))
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InsightsResponse {
    #[serde(default)]
    pub(crate) insights: Vec<RemoteInsight>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RemoteInsight {
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) action: String,
    #[serde(default)]
    pub(crate) priority: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HealthResponse {
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) version: String,
    #[serde(default)]
    pub(crate) features: Vec<String>,
}
