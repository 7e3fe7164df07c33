use rust_decimal::Decimal;

use crate::events::AppEvent;
use crate::models::{BudgetMap, Category, MonthKey, Transaction, TransactionStore};

/// Everything the user owns: transactions, budget ceilings and the month in view.
/// The UI thread is the only owner; every change goes through a method here
/// and comes back as an [`AppEvent`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AppState {
    pub(crate) transactions: TransactionStore,
    pub(crate) budgets: BudgetMap,
    pub(crate) selected_month: MonthKey,
}

impl AppState {
    pub(crate) fn new(selected_month: MonthKey) -> Self {
        Self {
            transactions: TransactionStore::new(),
            budgets: BudgetMap::default(),
            selected_month,
        }
    }

    pub(crate) fn add_transaction(&mut self, txn: Transaction) -> AppEvent {
        let event = AppEvent::TransactionAdded {
            id: txn.id.clone(),
            month: txn.month,
        };
        tracing::info!(id = %txn.id, amount = %txn.amount, category = txn.category.key(), "Transaction added");
        self.transactions.push(txn);
        event
    }

    pub(crate) fn delete_transaction(&mut self, id: &str) -> Option<AppEvent> {
        let removed = self.transactions.remove(id)?;
        tracing::info!(id, "Transaction deleted");
        Some(AppEvent::TransactionDeleted {
            id: removed.id,
            month: removed.month,
        })
    }

    pub(crate) fn set_budget(&mut self, category: Category, limit: Decimal) -> Option<AppEvent> {
        if !self.budgets.set(category, limit) {
            return None;
        }
        Some(AppEvent::BudgetChanged { category })
    }

    pub(crate) fn step_budget(&mut self, category: Category, up: bool) -> AppEvent {
        self.budgets.step(category, up);
        AppEvent::BudgetChanged { category }
    }

    pub(crate) fn select_month(&mut self, month: MonthKey) -> AppEvent {
        self.selected_month = month;
        AppEvent::MonthChanged(month)
    }

    /// Append a batch that was validated as a whole.
    pub(crate) fn import(&mut self, txns: Vec<Transaction>) -> AppEvent {
        let count = txns.len();
        for txn in txns {
            self.transactions.push(txn);
        }
        AppEvent::Imported { count }
    }

    /// Transactions of the selected month, newest first.
    pub(crate) fn month_transactions(&self) -> Vec<&Transaction> {
        let mut txns: Vec<&Transaction> = self.transactions.for_month(self.selected_month).collect();
        txns.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        txns
    }
}
