use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::models::{BudgetMap, Category, MonthKey, Transaction, TxnType};

use super::to_f64;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTotal {
    pub(crate) category: Category,
    pub(crate) total: Decimal,
    pub(crate) budget: Decimal,
}

impl CategoryTotal {
    pub(crate) fn remaining(&self) -> Decimal {
        self.budget - self.total
    }

    /// Fraction of the budget used, 0.0 when the budget is zero.
    pub(crate) fn ratio(&self) -> f64 {
        if self.budget.is_zero() {
            0.0
        } else {
            to_f64(self.total) / to_f64(self.budget)
        }
    }

    pub(crate) fn is_over(&self) -> bool {
        self.total > self.budget
    }
}

/// Per-category totals for one month, both directions.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthAggregate {
    pub(crate) month: MonthKey,
    pub(crate) income: Vec<CategoryTotal>,
    pub(crate) expense: Vec<CategoryTotal>,
}

impl MonthAggregate {
    pub(crate) fn totals(&self, kind: TxnType) -> &[CategoryTotal] {
        match kind {
            TxnType::Income => &self.income,
            TxnType::Expense => &self.expense,
        }
    }

    pub(crate) fn total_income(&self) -> Decimal {
        self.income.iter().map(|c| c.total).sum()
    }

    pub(crate) fn total_expense(&self) -> Decimal {
        self.expense.iter().map(|c| c.total).sum()
    }

    pub(crate) fn net(&self) -> Decimal {
        self.total_income() - self.total_expense()
    }

    pub(crate) fn expense_by_category(&self) -> BTreeMap<Category, Decimal> {
        self.expense.iter().map(|c| (c.category, c.total)).collect()
    }
}

/// Sum the month's transactions by category. Every category of each type is
/// present, in declaration order, with zero when nothing was recorded.
pub(crate) fn aggregate_month(
    transactions: &[Transaction],
    month: MonthKey,
    budgets: &BudgetMap,
) -> MonthAggregate {
    let mut sums: BTreeMap<Category, Decimal> = BTreeMap::new();
    for txn in transactions.iter().filter(|t| t.month == month) {
        *sums.entry(txn.category).or_default() += txn.amount;
    }

    let build = |kind: TxnType| -> Vec<CategoryTotal> {
        Category::all_for(kind)
            .iter()
            .map(|&category| CategoryTotal {
                category,
                total: sums.get(&category).copied().unwrap_or_default(),
                budget: budgets.get(category),
            })
            .collect()
    };

    MonthAggregate {
        month,
        income: build(TxnType::Income),
        expense: build(TxnType::Expense),
    }
}

/// Expense total of `category` in each of `months`, zero-filled.
pub(crate) fn category_history(
    transactions: &[Transaction],
    category: Category,
    months: &[MonthKey],
) -> Vec<f64> {
    months
        .iter()
        .map(|&month| {
            transactions
                .iter()
                .filter(|t| t.month == month && t.category == category && t.is_expense())
                .map(|t| to_f64(t.amount))
                .sum()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthTotals {
    pub(crate) month: MonthKey,
    pub(crate) income: Decimal,
    pub(crate) expense: Decimal,
}

/// Income and expense per month for the `count` months ending at `last`
/// (inclusive), oldest first.
pub(crate) fn monthly_trend(transactions: &[Transaction], last: MonthKey, count: usize) -> Vec<MonthTotals> {
    if count == 0 {
        return Vec::new();
    }
    let mut months = last.preceding(count - 1);
    months.push(last);

    months
        .into_iter()
        .map(|month| {
            let mut totals = MonthTotals {
                month,
                income: Decimal::ZERO,
                expense: Decimal::ZERO,
            };
            for txn in transactions.iter().filter(|t| t.month == month) {
                match txn.kind {
                    TxnType::Income => totals.income += txn.amount,
                    TxnType::Expense => totals.expense += txn.amount,
                }
            }
            totals
        })
        .collect()
}

/// Expense per month rounded to whole units, oldest first.
pub(crate) fn monthly_expense_totals(trend: &[MonthTotals]) -> Vec<u64> {
    trend
        .iter()
        .map(|m| m.expense.round().to_u64().unwrap_or(0))
        .collect()
}
