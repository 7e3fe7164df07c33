use std::collections::HashSet;

use crate::config::AnalyticsConfig;
use crate::models::{BudgetMap, Category, MonthKey, Transaction, TxnType};

use super::category_history;
use super::predict::{DataQuality, Prediction};
use super::to_f64;

const BUDGET_SAVINGS_RATIO: f64 = 0.8;
const VELOCITY_FACTOR: f64 = 1.3;
const ANOMALY_SIGMAS: f64 = 2.0;
const HIGH_SEVERITY_FACTOR: f64 = 1.5;
const HIGH_DAILY_SPEND: f64 = 50.0;
const LOW_DAILY_SPEND: f64 = 20.0;
const VARIABLE_SPEND_RATIO: f64 = 0.5;
const STEADY_RISE_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InsightKind {
    Warning,
    Success,
    Info,
}

impl InsightKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Info => "info",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "warning" | "alert" => Self::Warning,
            "success" => Self::Success,
            _ => Self::Info,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub(crate) fn demote(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium | Self::Low => Self::Low,
        }
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub(crate) fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Identity of an insight for de-duplication: what it is about, which
/// category, and the headline figure rounded to whole units.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct InsightKey {
    pub(crate) topic: String,
    pub(crate) category: Option<Category>,
    pub(crate) metric: i64,
}

impl InsightKey {
    fn new(topic: impl Into<String>, category: Option<Category>, metric: f64) -> Self {
        Self {
            topic: topic.into(),
            category,
            metric: metric.round() as i64,
        }
    }

    /// The condition reported, without the headline figure.
    fn condition(&self) -> (String, Option<Category>) {
        (self.topic.clone(), self.category)
    }
}

/// Recognise a remote title that reports a condition the local generator
/// also covers, so both end up under one key.
fn remote_condition(title: &str) -> Option<(&'static str, Option<Category>)> {
    let title = title.trim().to_lowercase();
    let words: Vec<&str> = title.split_whitespace().collect();
    let category = Category::all_for(TxnType::Expense)
        .iter()
        .copied()
        .find(|c| words.contains(&c.display_name().to_lowercase().as_str()));

    let topic = if title.contains("overage") || title.contains("exceed") {
        "budget_overage"
    } else if title.contains("savings") {
        "budget_savings"
    } else if title.contains("acceleration") {
        "velocity"
    } else if title.ends_with("budget tip") {
        "seasonal"
    } else if title.starts_with("unusual") && category.is_some() {
        "high_spending"
    } else if title.starts_with("lower") && category.is_some() {
        "low_spending"
    } else if title.ends_with("spending rising") && category.is_some() {
        "trend"
    } else {
        return None;
    };
    let category = match topic {
        "high_spending" | "low_spending" | "trend" => category,
        _ => None,
    };
    Some((topic, category))
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Insight {
    pub(crate) kind: InsightKind,
    pub(crate) title: String,
    pub(crate) message: String,
    pub(crate) action: String,
    pub(crate) priority: Priority,
    pub(crate) key: InsightKey,
}

impl Insight {
    /// Wrap an insight that came from the remote backend.
    pub(crate) fn remote(kind: &str, title: String, message: String, action: String, priority: &str) -> Self {
        let key = match remote_condition(&title) {
            Some((topic, category)) => InsightKey::new(topic, category, 0.0),
            None => InsightKey::new(format!("remote:{}", title.trim().to_lowercase()), None, 0.0),
        };
        Self {
            kind: InsightKind::parse(kind),
            title,
            message,
            action,
            priority: Priority::parse(priority),
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnomalyKind {
    HighSpending,
    LowSpending,
}

impl AnomalyKind {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::HighSpending => "high_spending",
            Self::LowSpending => "low_spending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Anomaly {
    pub(crate) category: Category,
    pub(crate) kind: AnomalyKind,
    pub(crate) current: f64,
    pub(crate) expected: f64,
    pub(crate) severity: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

/// Historical picture of one expense category over the analysis window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CategoryTrend {
    pub(crate) category: Category,
    pub(crate) average: f64,
    pub(crate) recent: f64,
    pub(crate) variance: f64,
    pub(crate) direction: TrendDirection,
    pub(crate) monthly: Vec<f64>,
}

impl CategoryTrend {
    fn from_history(category: Category, monthly: Vec<f64>) -> Self {
        let (average, variance) = mean_variance(&monthly);
        let tail = &monthly[monthly.len().saturating_sub(2)..];
        let recent = if tail.is_empty() {
            0.0
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        };
        let direction = if recent > average {
            TrendDirection::Increasing
        } else if recent < average {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        };
        Self {
            category,
            average,
            recent,
            variance,
            direction,
            monthly,
        }
    }

    pub(crate) fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    fn has_history(&self) -> bool {
        self.monthly.iter().any(|v| *v > 0.0)
    }
}

/// Mean and population variance; both zero for an empty slice.
pub(crate) fn mean_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// One-line tip for months with known seasonal spending patterns.
pub(crate) fn seasonal_tip(month: MonthKey) -> Option<(&'static str, &'static str)> {
    match month.month() {
        12 => Some(("Holiday", "Holiday spending typically increases. Set aside extra budget for gifts.")),
        1 => Some(("New Year", "Great time to review and optimize your budget for the year ahead.")),
        3 => Some(("Spring", "Spring cleaning season. Consider selling items you no longer need.")),
        6 => Some(("Summer", "Summer activities may increase entertainment and travel expenses.")),
        9 => Some(("Back to School", "School supplies and activities may impact family budgets.")),
        _ => None,
    }
}

/// Produces the ranked advisory list for a month.
#[derive(Debug, Clone, Default)]
pub(crate) struct InsightGenerator {
    config: AnalyticsConfig,
}

impl InsightGenerator {
    pub(crate) fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Per-category history over the months strictly before `month`.
    pub(crate) fn category_trends(&self, transactions: &[Transaction], month: MonthKey) -> Vec<CategoryTrend> {
        let months = month.preceding(self.config.history_months);
        Category::all_for(TxnType::Expense)
            .iter()
            .map(|&category| {
                CategoryTrend::from_history(category, category_history(transactions, category, &months))
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn detect_anomalies(&self, transactions: &[Transaction], month: MonthKey) -> Vec<Anomaly> {
        let trends = self.category_trends(transactions, month);
        self.anomalies_from(&trends, transactions, month)
    }

    fn anomalies_from(&self, trends: &[CategoryTrend], transactions: &[Transaction], month: MonthKey) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();
        for trend in trends.iter().filter(|t| t.has_history()) {
            let current: f64 = transactions
                .iter()
                .filter(|t| t.month == month && t.category == trend.category && t.is_expense())
                .map(|t| to_f64(t.amount))
                .sum();

            let spread = ANOMALY_SIGMAS * trend.std_dev();
            let high = trend.average + spread;
            let low = (trend.average - spread).max(0.0);

            if current > high {
                let severity = if current > high * HIGH_SEVERITY_FACTOR {
                    Priority::High
                } else {
                    Priority::Medium
                };
                anomalies.push(Anomaly {
                    category: trend.category,
                    kind: AnomalyKind::HighSpending,
                    current,
                    expected: trend.average,
                    severity,
                });
            } else if current < low && trend.average > self.config.low_spending_floor {
                anomalies.push(Anomaly {
                    category: trend.category,
                    kind: AnomalyKind::LowSpending,
                    current,
                    expected: trend.average,
                    severity: Priority::Low,
                });
            }
        }
        anomalies
    }

    /// Build, de-duplicate, rank and cap the insights for `month`.
    pub(crate) fn generate(
        &self,
        transactions: &[Transaction],
        budgets: &BudgetMap,
        month: MonthKey,
        prediction: &Prediction,
    ) -> Vec<Insight> {
        let trends = self.category_trends(transactions, month);
        let mut candidates = Vec::new();

        candidates.extend(self.prediction_insights(prediction, budgets));
        candidates.extend(self.trend_insights(&trends));
        candidates.extend(anomaly_insights(&self.anomalies_from(&trends, transactions, month)));
        candidates.extend(spending_summary_insights(prediction, budgets));
        candidates.extend(self.pattern_insights(&trends));
        if let Some((season, tip)) = seasonal_tip(month) {
            candidates.push(Insight {
                kind: InsightKind::Info,
                title: format!("{season} Budget Tip"),
                message: tip.into(),
                action: "Plan accordingly for seasonal expenses".into(),
                priority: Priority::Low,
                key: InsightKey::new("seasonal", None, f64::from(month.month())),
            });
        }

        let insights = self.rank(candidates);
        tracing::debug!(month = %month, count = insights.len(), "Insights generated");
        insights
    }

    /// Fold remote insights into a local list under the same key set and
    /// ranking. A remote insight reporting a condition already present
    /// locally is dropped; the local one carries the exact figure.
    pub(crate) fn merge(&self, local: Vec<Insight>, remote: Vec<Insight>) -> Vec<Insight> {
        let covered: HashSet<(String, Option<Category>)> = local.iter().map(|i| i.key.condition()).collect();
        let mut all = local;
        all.extend(remote.into_iter().filter(|r| !covered.contains(&r.key.condition())));
        self.rank(all)
    }

    fn rank(&self, candidates: Vec<Insight>) -> Vec<Insight> {
        let mut seen = HashSet::new();
        let mut unique: Vec<Insight> = candidates
            .into_iter()
            .filter(|i| seen.insert(i.key.clone()))
            .collect();
        // Stable, so generation order breaks ties
        unique.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));
        unique.truncate(self.config.max_insights);
        unique
    }

    fn prediction_insights(&self, prediction: &Prediction, budgets: &BudgetMap) -> Vec<Insight> {
        let quality = prediction.data_quality;
        if !quality.is_usable() {
            return Vec::new();
        }
        let soften = |p: Priority| {
            if quality == DataQuality::Limited {
                p.demote()
            } else {
                p
            }
        };

        let mut out = Vec::new();
        let total_budget = to_f64(budgets.total_for(TxnType::Expense));
        if prediction.projected_total > total_budget {
            let overage = prediction.projected_total - total_budget;
            out.push(Insight {
                kind: InsightKind::Warning,
                title: "Budget Overage Predicted".into(),
                message: format!("You're projected to exceed your budget by ${overage:.2} this month."),
                action: "Consider reducing spending in flexible categories".into(),
                priority: soften(Priority::High),
                key: InsightKey::new("budget_overage", None, overage),
            });
        } else if prediction.projected_total < total_budget * BUDGET_SAVINGS_RATIO {
            let savings = total_budget - prediction.projected_total;
            out.push(Insight {
                kind: InsightKind::Success,
                title: "Great Savings Potential".into(),
                message: format!("You could save ${savings:.2} this month!"),
                action: "Consider allocating savings to an emergency fund".into(),
                priority: soften(Priority::Medium),
                key: InsightKey::new("budget_savings", None, savings),
            });
        }

        if prediction.avg_daily > 0.0 && prediction.recent_daily > prediction.avg_daily * VELOCITY_FACTOR {
            let pct = prediction.acceleration_pct().unwrap_or_default();
            out.push(Insight {
                kind: InsightKind::Warning,
                title: "Spending Acceleration Detected".into(),
                message: format!("Recent spending is {pct:.1}% higher than your monthly average."),
                action: "Review recent expenses and identify any unnecessary purchases".into(),
                priority: soften(Priority::High),
                key: InsightKey::new("velocity", None, pct),
            });
        }
        out
    }

    fn trend_insights(&self, trends: &[CategoryTrend]) -> Vec<Insight> {
        trends
            .iter()
            .filter(|t| {
                t.direction == TrendDirection::Increasing
                    && t.average > 0.0
                    && t.recent > t.average * self.config.trend_factor
            })
            .map(|t| {
                let name = t.category.display_name();
                let pct = (t.recent / t.average - 1.0) * 100.0;
                Insight {
                    kind: InsightKind::Info,
                    title: format!("{name} Spending Rising"),
                    message: format!(
                        "Your {} spending has increased {pct:.1}% recently.",
                        name.to_lowercase()
                    ),
                    action: "Review this category for optimization opportunities".into(),
                    priority: Priority::Medium,
                    key: InsightKey::new("trend", Some(t.category), pct),
                }
            })
            .collect()
    }

    /// Variability and steady rises that fall short of the trend threshold.
    fn pattern_insights(&self, trends: &[CategoryTrend]) -> Vec<Insight> {
        let mut out = Vec::new();
        for t in trends.iter().filter(|t| t.has_history()) {
            let name = t.category.display_name();
            if t.variance > t.average * VARIABLE_SPEND_RATIO {
                out.push(Insight {
                    kind: InsightKind::Info,
                    title: format!("Variable {name} Spending"),
                    message: format!("{name} spending is highly variable from month to month."),
                    action: "Set aside a buffer for this category".into(),
                    priority: Priority::Low,
                    key: InsightKey::new("variable", Some(t.category), t.std_dev()),
                });
            }
            let rising = t.direction == TrendDirection::Increasing
                && t.recent > t.average * STEADY_RISE_FACTOR
                && t.recent <= t.average * self.config.trend_factor;
            if rising {
                out.push(Insight {
                    kind: InsightKind::Info,
                    title: format!("{name} Costs Creeping Up"),
                    message: format!("{name} costs are rising consistently."),
                    action: "Check for price increases or new habits".into(),
                    priority: Priority::Low,
                    key: InsightKey::new("steady_rise", Some(t.category), t.recent),
                });
            }
        }
        out
    }
}

/// Plain facts about the month so far: the biggest category, the daily
/// pace and how many categories are over budget.
fn spending_summary_insights(prediction: &Prediction, budgets: &BudgetMap) -> Vec<Insight> {
    let mut out = Vec::new();
    if prediction.data_quality == DataQuality::None {
        return out;
    }

    let top = prediction
        .spending_by_category
        .iter()
        .fold(None::<(Category, f64)>, |best, &(category, spent)| match best {
            Some((_, most)) if most >= spent => best,
            _ => Some((category, spent)),
        });
    if let Some((category, spent)) = top {
        let name = category.display_name();
        out.push(Insight {
            kind: InsightKind::Info,
            title: format!("Biggest Expense: {name}"),
            message: format!("Your biggest expense this month is {name} (${spent:.2})."),
            action: "Make sure this matches your priorities".into(),
            priority: Priority::Low,
            key: InsightKey::new("top_category", Some(category), spent),
        });
    }

    let daily = prediction.avg_daily;
    if daily > HIGH_DAILY_SPEND {
        out.push(Insight {
            kind: InsightKind::Warning,
            title: "High Daily Spending".into(),
            message: format!("You're spending ${daily:.2}/day on average."),
            action: "Look for one daily expense you can skip".into(),
            priority: Priority::Low,
            key: InsightKey::new("daily_pace", None, daily),
        });
    } else if daily > 0.0 && daily < LOW_DAILY_SPEND {
        out.push(Insight {
            kind: InsightKind::Success,
            title: "Low Daily Spending".into(),
            message: format!("Great job! You're only spending ${daily:.2}/day on average."),
            action: "Keep it up".into(),
            priority: Priority::Low,
            key: InsightKey::new("daily_pace", None, daily),
        });
    }

    let over = prediction
        .spending_by_category
        .iter()
        .filter(|&&(category, spent)| {
            let limit = to_f64(budgets.get(category));
            limit > 0.0 && spent > limit
        })
        .count();
    if over > 0 {
        out.push(Insight {
            kind: InsightKind::Warning,
            title: "Categories Over Budget".into(),
            message: format!("You're over budget in {over} categories."),
            action: "Rebalance budgets or cut back in those categories".into(),
            priority: Priority::Low,
            key: InsightKey::new("over_budget", None, over as f64),
        });
    }
    out
}

fn anomaly_insights(anomalies: &[Anomaly]) -> Vec<Insight> {
    anomalies
        .iter()
        .map(|a| {
            let name = a.category.display_name();
            match a.kind {
                AnomalyKind::HighSpending => Insight {
                    kind: InsightKind::Warning,
                    title: format!("Unusual {name} Spending"),
                    message: format!(
                        "{name} spending (${:.2}) is significantly higher than usual (${:.2} average).",
                        a.current, a.expected
                    ),
                    action: "Check if this was planned or if you can reduce future spending".into(),
                    priority: a.severity,
                    key: InsightKey::new(a.kind.as_str(), Some(a.category), a.current),
                },
                AnomalyKind::LowSpending => Insight {
                    kind: InsightKind::Success,
                    title: format!("Lower {name} Spending"),
                    message: format!(
                        "{name} spending (${:.2}) is well below your usual ${:.2}.",
                        a.current, a.expected
                    ),
                    action: "Nice work. Keep the difference as savings".into(),
                    priority: a.severity,
                    key: InsightKey::new(a.kind.as_str(), Some(a.category), a.current),
                },
            }
        })
        .collect()
}
