use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use super::{Category, MonthKey, TxnType};
use crate::error::ValidationError;

pub(crate) const MAX_ITEM_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Transaction {
    pub(crate) id: String,
    pub(crate) item: String,
    pub(crate) amount: Decimal,
    pub(crate) kind: TxnType,
    pub(crate) category: Category,
    pub(crate) entry_date: NaiveDate,
    pub(crate) month: MonthKey,
}

impl Transaction {
    pub(crate) fn is_income(&self) -> bool {
        self.kind == TxnType::Income
    }

    pub(crate) fn is_expense(&self) -> bool {
        self.kind == TxnType::Expense
    }

    /// Rebuild a record that was already validated once (storage, import).
    pub(crate) fn restore(
        id: String,
        item: String,
        amount: Decimal,
        category: Category,
        entry_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(Self {
            id,
            item,
            amount: round_amount(amount),
            kind: category.kind(),
            category,
            entry_date,
            month: MonthKey::from_date(entry_date),
        })
    }
}

/// Raw form input, exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NewTransaction {
    pub(crate) item: String,
    pub(crate) amount: String,
    pub(crate) kind: String,
    pub(crate) category: String,
    pub(crate) entry_date: String,
}

impl NewTransaction {
    /// Check every field and build a [`Transaction`] with a fresh id.
    /// Nothing is produced unless all fields pass.
    pub(crate) fn validate(&self) -> Result<Transaction, ValidationError> {
        let item = self.item.trim();
        if item.is_empty() {
            return Err(ValidationError::EmptyItem);
        }
        if item.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::ItemHasDigits);
        }
        if item.chars().count() > MAX_ITEM_LEN {
            return Err(ValidationError::ItemTooLong(MAX_ITEM_LEN));
        }

        let amount = parse_amount(&self.amount)?;

        let kind = TxnType::parse(&self.kind)
            .ok_or_else(|| ValidationError::UnknownType(self.kind.trim().to_string()))?;

        let category = Category::parse(&self.category)
            .ok_or_else(|| ValidationError::UnknownCategory(self.category.trim().to_string()))?;
        if category.kind() != kind {
            return Err(ValidationError::CategoryTypeMismatch { category, kind });
        }

        let entry_date = NaiveDate::parse_from_str(self.entry_date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(self.entry_date.trim().to_string()))?;

        Ok(Transaction {
            id: new_id(),
            item: item.to_string(),
            amount,
            kind,
            category,
            entry_date,
            month: MonthKey::from_date(entry_date),
        })
    }
}

/// Parse a user-supplied amount: strips `$` and `,`, requires > 0, rounds to cents.
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let cleaned = raw.trim().replace(['$', ','], "");
    let amount = Decimal::from_str(&cleaned)
        .map_err(|_| ValidationError::InvalidAmount(raw.trim().to_string()))?;
    let amount = round_amount(amount);
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    Ok(amount)
}

pub(crate) fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Timestamp plus a random tie-break, so two entries in the same millisecond differ.
fn new_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{millis}-{}", &random[..8])
}

/// Ordered list of every transaction ever recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TransactionStore {
    items: Vec<Transaction>,
}

impl TransactionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_vec(items: Vec<Transaction>) -> Self {
        Self { items }
    }

    pub(crate) fn push(&mut self, txn: Transaction) {
        self.items.push(txn);
    }

    pub(crate) fn remove(&mut self, id: &str) -> Option<Transaction> {
        let pos = self.items.iter().position(|t| t.id == id)?;
        Some(self.items.remove(pos))
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Transaction> {
        self.items.iter().find(|t| t.id == id)
    }

    pub(crate) fn all(&self) -> &[Transaction] {
        &self.items
    }

    pub(crate) fn for_month(&self, month: MonthKey) -> impl Iterator<Item = &Transaction> {
        self.items.iter().filter(move |t| t.month == month)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
