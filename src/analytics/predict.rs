use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{BudgetMap, Category, MonthKey, Transaction, TxnType};

use super::to_f64;

const RECENT_WINDOW_DAYS: u32 = 7;
const AVG_WEIGHT: f64 = 0.3;
const RECENT_WEIGHT: f64 = 0.7;
const CATEGORY_ALERT_RATIO: f64 = 0.8;

/// How much the projection can be trusted, from the amount of data behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum DataQuality {
    None,
    Minimal,
    Limited,
    Moderate,
    Good,
}

impl DataQuality {
    pub(crate) fn classify(expense_count: usize, current_day: u32) -> Self {
        match (expense_count, current_day) {
            (0, _) => Self::None,
            (n, d) if n < 3 || d < 3 => Self::Minimal,
            (n, d) if n < 10 || d < 7 => Self::Limited,
            (n, d) if n < 20 || d < 14 => Self::Moderate,
            _ => Self::Good,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Limited => "limited",
            Self::Moderate => "moderate",
            Self::Good => "good",
        }
    }

    /// Whether prediction-derived advice should be shown at all.
    pub(crate) fn is_usable(&self) -> bool {
        *self >= Self::Limited
    }
}

impl std::fmt::Display for DataQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Prediction {
    pub(crate) month: MonthKey,
    pub(crate) current_spending: f64,
    pub(crate) projected_total: f64,
    pub(crate) projected_remaining: f64,
    pub(crate) avg_daily: f64,
    pub(crate) recent_daily: f64,
    pub(crate) days_remaining: u32,
    pub(crate) current_day: u32,
    pub(crate) days_in_month: u32,
    pub(crate) spending_by_category: Vec<(Category, f64)>,
    pub(crate) data_quality: DataQuality,
    pub(crate) transaction_count: usize,
}

impl Prediction {
    fn empty(month: MonthKey, current_day: u32) -> Self {
        let days_in_month = month.days_in_month();
        Self {
            month,
            current_spending: 0.0,
            projected_total: 0.0,
            projected_remaining: 0.0,
            avg_daily: 0.0,
            recent_daily: 0.0,
            days_remaining: days_in_month.saturating_sub(current_day),
            current_day,
            days_in_month,
            spending_by_category: Vec::new(),
            data_quality: DataQuality::None,
            transaction_count: 0,
        }
    }

    pub(crate) fn is_insufficient(&self) -> bool {
        self.data_quality == DataQuality::None
    }

    /// Recent daily pace relative to the month average, as a percentage increase.
    pub(crate) fn acceleration_pct(&self) -> Option<f64> {
        (self.avg_daily > 0.0).then(|| (self.recent_daily / self.avg_daily - 1.0) * 100.0)
    }
}

/// Day of `month` that counts as "today" for projection purposes.
pub(crate) fn resolve_current_day(month: MonthKey, today: NaiveDate) -> u32 {
    if month.contains(today) {
        today.day()
    } else if month < MonthKey::from_date(today) {
        month.days_in_month()
    } else {
        0
    }
}

/// Project month-end expense from the spending recorded so far.
pub(crate) fn predict_month(transactions: &[Transaction], month: MonthKey, today: NaiveDate) -> Prediction {
    let current_day = resolve_current_day(month, today);
    let expenses: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.month == month && t.kind == TxnType::Expense)
        .collect();

    if expenses.is_empty() {
        return Prediction::empty(month, current_day);
    }

    let mut by_day: BTreeMap<u32, f64> = BTreeMap::new();
    let mut by_category: BTreeMap<Category, f64> = BTreeMap::new();
    for txn in &expenses {
        let amount = to_f64(txn.amount);
        *by_day.entry(txn.entry_date.day()).or_default() += amount;
        *by_category.entry(txn.category).or_default() += amount;
    }

    let days_in_month = month.days_in_month();
    let days_remaining = days_in_month.saturating_sub(current_day);
    let total: f64 = by_day.values().sum();
    let avg_daily = if current_day == 0 {
        0.0
    } else {
        total / f64::from(current_day)
    };

    let window_start = current_day.saturating_sub(RECENT_WINDOW_DAYS);
    let recent: Vec<f64> = by_day
        .iter()
        .filter(|(&day, _)| day > window_start && day <= current_day)
        .map(|(_, amount)| *amount)
        .collect();
    let recent_daily = if recent.is_empty() {
        avg_daily
    } else {
        recent.iter().sum::<f64>() / recent.len() as f64
    };

    let predicted_daily = avg_daily * AVG_WEIGHT + recent_daily * RECENT_WEIGHT;
    let projected_remaining = predicted_daily * f64::from(days_remaining);

    let data_quality = DataQuality::classify(expenses.len(), current_day);
    tracing::debug!(
        month = %month,
        spent = total,
        projected = total + projected_remaining,
        quality = data_quality.as_str(),
        "Prediction computed"
    );

    Prediction {
        month,
        current_spending: total,
        projected_total: total + projected_remaining,
        projected_remaining,
        avg_daily,
        recent_daily,
        days_remaining,
        current_day,
        days_in_month,
        spending_by_category: by_category.into_iter().collect(),
        data_quality,
        transaction_count: expenses.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecommendationKind {
    DailyBudget,
    CategoryAlert,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Recommendation {
    pub(crate) kind: RecommendationKind,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) category: Option<Category>,
    pub(crate) value: f64,
}

/// Daily allowance for the rest of the month plus alerts for categories
/// past 80% of their ceiling.
pub(crate) fn recommendations(prediction: &Prediction, budgets: &BudgetMap) -> Vec<Recommendation> {
    let mut out = Vec::new();
    if prediction.is_insufficient() {
        return out;
    }

    let total_budget = to_f64(budgets.total_for(TxnType::Expense));
    if prediction.days_remaining > 0 {
        let daily = (total_budget - prediction.current_spending) / f64::from(prediction.days_remaining);
        out.push(Recommendation {
            kind: RecommendationKind::DailyBudget,
            title: "Daily Budget Recommendation".into(),
            message: format!(
                "To stay on budget, limit spending to ${daily:.2}/day for the remaining {} days.",
                prediction.days_remaining
            ),
            category: None,
            value: daily,
        });
    }

    for &(category, spent) in &prediction.spending_by_category {
        let budget = to_f64(budgets.get(category));
        if budget > 0.0 && spent > budget * CATEGORY_ALERT_RATIO {
            let pct = spent / budget * 100.0;
            out.push(Recommendation {
                kind: RecommendationKind::CategoryAlert,
                title: format!("{category} Alert"),
                message: format!(
                    "You've used {pct:.1}% of your {} budget.",
                    category.display_name().to_lowercase()
                ),
                category: Some(category),
                value: pct,
            });
        }
    }

    out
}
