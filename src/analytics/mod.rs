//! Pure month analytics: totals, month-end projection and ranked insights.

mod aggregate;
mod insights;
mod predict;
mod report;

pub(crate) use aggregate::{
    aggregate_month, category_history, monthly_expense_totals, monthly_trend, CategoryTotal, MonthAggregate, MonthTotals,
};
pub(crate) use insights::{CategoryTrend, Insight, InsightGenerator, InsightKind, Priority, TrendDirection};
pub(crate) use predict::{predict_month, recommendations, Prediction, Recommendation};
pub(crate) use report::{MonthReport, ReportCache};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub(crate) fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests;
