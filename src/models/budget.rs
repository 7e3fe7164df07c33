use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{Category, TxnType};

pub(crate) const BUDGET_STEP: i64 = 50;
pub(crate) const BUDGET_PRESET_MAX: i64 = 2000;

/// Budget ceiling per category. Every category always has an entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BudgetMap {
    limits: BTreeMap<Category, Decimal>,
}

impl Default for BudgetMap {
    fn default() -> Self {
        let limits = Category::all().map(|c| (c, c.default_budget())).collect();
        Self { limits }
    }
}

impl BudgetMap {
    pub(crate) fn get(&self, category: Category) -> Decimal {
        self.limits
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_budget())
    }

    /// Overwrite a ceiling. Non-positive values are refused.
    pub(crate) fn set(&mut self, category: Category, limit: Decimal) -> bool {
        if limit <= Decimal::ZERO {
            return false;
        }
        self.limits.insert(category, limit.round_dp(2));
        true
    }

    /// Move a ceiling to the next or previous preset (multiples of 50 up to 2000).
    /// Off-grid values snap to the neighbouring preset first.
    pub(crate) fn step(&mut self, category: Category, up: bool) -> Decimal {
        let step = Decimal::from(BUDGET_STEP);
        let current = self.get(category);
        let steps = current / step;
        let next = if up {
            (steps.floor() + Decimal::ONE) * step
        } else {
            (steps.ceil() - Decimal::ONE) * step
        };
        let clamped = next.clamp(step, Decimal::from(BUDGET_PRESET_MAX));
        self.limits.insert(category, clamped);
        clamped
    }

    pub(crate) fn total_for(&self, kind: TxnType) -> Decimal {
        Category::all_for(kind).iter().map(|c| self.get(*c)).sum()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (Category, Decimal)> + '_ {
        self.limits.iter().map(|(c, d)| (*c, *d))
    }
}
