use chrono::NaiveDate;

use crate::events::{AppEvent, EventObserver};
use crate::state::AppState;

use super::{
    aggregate_month, monthly_trend, predict_month, recommendations, CategoryTrend, Insight, InsightGenerator,
    MonthAggregate, MonthTotals, Prediction, Recommendation,
};

const TREND_MONTHS: usize = 12;

/// Everything the screens show for the selected month, computed in one pass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthReport {
    pub(crate) aggregate: MonthAggregate,
    pub(crate) prediction: Prediction,
    pub(crate) insights: Vec<Insight>,
    pub(crate) recommendations: Vec<Recommendation>,
    pub(crate) category_trends: Vec<CategoryTrend>,
    pub(crate) trend: Vec<MonthTotals>,
}

impl MonthReport {
    pub(crate) fn build(state: &AppState, generator: &InsightGenerator, today: NaiveDate) -> Self {
        let month = state.selected_month;
        let txns = state.transactions.all();
        let prediction = predict_month(txns, month, today);
        Self {
            aggregate: aggregate_month(txns, month, &state.budgets),
            insights: generator.generate(txns, &state.budgets, month, &prediction),
            recommendations: recommendations(&prediction, &state.budgets),
            category_trends: generator.category_trends(txns, month),
            trend: monthly_trend(txns, month, TREND_MONTHS),
            prediction,
        }
    }
}

/// Holds the last report and recomputes it only after a data event, a
/// month switch or a change of date.
pub(crate) struct ReportCache {
    generator: InsightGenerator,
    report: Option<MonthReport>,
    built_on: Option<NaiveDate>,
    dirty: bool,
}

impl ReportCache {
    pub(crate) fn new(generator: InsightGenerator) -> Self {
        Self {
            generator,
            report: None,
            built_on: None,
            dirty: true,
        }
    }

    /// Whether the next `get` will rebuild. The projection depends on the
    /// current day, so a report built on another date is stale.
    pub(crate) fn is_stale(&self, state: &AppState, today: NaiveDate) -> bool {
        self.dirty
            || self.built_on != Some(today)
            || self
                .report
                .as_ref()
                .map_or(true, |r| r.aggregate.month != state.selected_month)
    }

    /// Last built report, without rebuilding.
    pub(crate) fn current(&self) -> Option<&MonthReport> {
        self.report.as_ref()
    }

    /// Current report, rebuilding it first when stale.
    pub(crate) fn get(&mut self, state: &AppState, today: NaiveDate) -> &MonthReport {
        if self.is_stale(state, today) {
            tracing::debug!(month = %state.selected_month, %today, "Rebuilding month report");
            self.report = Some(MonthReport::build(state, &self.generator, today));
            self.built_on = Some(today);
            self.dirty = false;
        }
        self.report
            .get_or_insert_with(|| MonthReport::build(state, &self.generator, today))
    }

    /// Replace the insight list, e.g. after merging remote insights.
    pub(crate) fn set_insights(&mut self, insights: Vec<Insight>) {
        if let Some(report) = self.report.as_mut() {
            report.insights = insights;
        }
    }
}

impl EventObserver for ReportCache {
    fn on_event(&mut self, event: &AppEvent) {
        if event.invalidates_analytics() {
            self.dirty = true;
        }
    }
}
