#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::insights::{mean_variance, seasonal_tip, AnomalyKind, InsightKey};
use super::predict::{DataQuality, RecommendationKind};
use super::*;
use crate::config::AnalyticsConfig;
use crate::models::{BudgetMap, Category, MonthKey, Transaction, TxnType};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn month(s: &str) -> MonthKey {
    MonthKey::parse(s).unwrap()
}

fn txn(amount: Decimal, category: Category, on: &str) -> Transaction {
    Transaction::restore(
        format!("{on}-{category}-{amount}"),
        "Test item".into(),
        amount,
        category,
        date(on),
    )
    .unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

// ── Aggregator ────────────────────────────────────────────────

#[test]
fn test_aggregate_sums_match_month_total() {
    let txns = vec![
        txn(dec!(12.50), Category::Food, "2026-03-02"),
        txn(dec!(7.25), Category::Food, "2026-03-09"),
        txn(dec!(300), Category::Rent, "2026-03-01"),
        txn(dec!(1000), Category::Uco, "2026-03-15"),
        txn(dec!(999), Category::Rent, "2026-04-01"),
    ];
    let agg = aggregate_month(&txns, month("2026-03"), &BudgetMap::default());

    let category_sum: Decimal = agg.income.iter().chain(agg.expense.iter()).map(|c| c.total).sum();
    let month_sum: Decimal = txns
        .iter()
        .filter(|t| t.month == month("2026-03"))
        .map(|t| t.amount)
        .sum();
    assert_eq!(category_sum, month_sum);
    assert_eq!(agg.total_expense(), dec!(319.75));
    assert_eq!(agg.total_income(), dec!(1000));
    assert_eq!(agg.net(), dec!(680.25));
}

#[test]
fn test_aggregate_lists_every_category_in_order() {
    let agg = aggregate_month(&[], month("2026-03"), &BudgetMap::default());
    let expense: Vec<Category> = agg.expense.iter().map(|c| c.category).collect();
    assert_eq!(expense, Category::all_for(TxnType::Expense));
    assert_eq!(agg.income.len(), 2);
    assert!(agg.expense.iter().all(|c| c.total.is_zero()));
}

#[test]
fn test_aggregate_carries_budget_and_remaining() {
    let mut budgets = BudgetMap::default();
    budgets.set(Category::Food, dec!(80));
    let txns = vec![txn(dec!(100), Category::Food, "2026-03-02")];
    let agg = aggregate_month(&txns, month("2026-03"), &budgets);
    let food = agg.expense.iter().find(|c| c.category == Category::Food).unwrap();
    assert_eq!(food.budget, dec!(80));
    assert_eq!(food.remaining(), dec!(-20));
    assert!(food.is_over());
    assert!(approx(food.ratio(), 1.25));
}

#[test]
fn test_category_history_zero_fills() {
    let txns = vec![
        txn(dec!(40), Category::Food, "2026-01-05"),
        txn(dec!(45), Category::Food, "2026-03-05"),
    ];
    let months = month("2026-04").preceding(3);
    assert_eq!(category_history(&txns, Category::Food, &months), vec![40.0, 0.0, 45.0]);
}

#[test]
fn test_monthly_trend_oldest_first() {
    let txns = vec![
        txn(dec!(10), Category::Food, "2026-02-05"),
        txn(dec!(500), Category::Gong, "2026-03-05"),
    ];
    let trend = monthly_trend(&txns, month("2026-03"), 3);
    assert_eq!(trend.len(), 3);
    assert_eq!(trend[0].month, month("2026-01"));
    assert_eq!(trend[1].expense, dec!(10));
    assert_eq!(trend[2].income, dec!(500));
    assert!(monthly_trend(&txns, month("2026-03"), 0).is_empty());
    assert_eq!(monthly_expense_totals(&trend), vec![0, 10, 0]);
}

// ── Predictor ─────────────────────────────────────────────────

#[test]
fn test_predict_empty_month_is_all_zero() {
    let p = predict_month(&[], month("2026-06"), date("2026-06-15"));
    assert_eq!(p.data_quality, DataQuality::None);
    assert!(p.is_insufficient());
    assert_eq!(p.current_spending, 0.0);
    assert_eq!(p.projected_total, 0.0);
    assert_eq!(p.projected_remaining, 0.0);
    assert_eq!(p.avg_daily, 0.0);
    assert_eq!(p.recent_daily, 0.0);
    assert_eq!(p.transaction_count, 0);
    assert!(p.spending_by_category.is_empty());
}

#[test]
fn test_predict_income_only_is_insufficient() {
    let txns = vec![txn(dec!(1000), Category::Uco, "2026-06-02")];
    let p = predict_month(&txns, month("2026-06"), date("2026-06-15"));
    assert!(p.is_insufficient());
}

#[test]
fn test_predict_day_one_scenario() {
    let txns = vec![
        txn(dec!(50), Category::Food, "2026-06-01"),
        txn(dec!(100), Category::Grocery, "2026-06-01"),
        txn(dec!(300), Category::Rent, "2026-06-01"),
    ];
    let p = predict_month(&txns, month("2026-06"), date("2026-06-15"));
    assert_eq!(p.days_in_month, 30);
    assert_eq!(p.current_day, 15);
    assert_eq!(p.days_remaining, 15);
    assert!(approx(p.current_spending, 450.0));
    assert!(approx(p.avg_daily, 30.0));
    // Day 1 is outside the recent window, so the average stands in
    assert!(approx(p.recent_daily, 30.0));
    assert!(approx(p.projected_total, 900.0));
    assert!(approx(p.projected_remaining, 450.0));
    assert_eq!(p.spending_by_category.len(), 3);
}

#[test]
fn test_predict_recent_window_weighting() {
    let txns = vec![
        txn(dec!(100), Category::Food, "2026-06-10"),
        txn(dec!(50), Category::Food, "2026-06-14"),
    ];
    let p = predict_month(&txns, month("2026-06"), date("2026-06-15"));
    assert!(approx(p.avg_daily, 10.0));
    assert!(approx(p.recent_daily, 75.0));
    let daily = 10.0 * 0.3 + 75.0 * 0.7;
    assert!(approx(p.projected_total, 150.0 + daily * 15.0));
}

#[test]
fn test_predict_last_day_has_no_days_remaining() {
    let txns = vec![txn(dec!(20), Category::Food, "2026-06-30")];
    let p = predict_month(&txns, month("2026-06"), date("2026-06-30"));
    assert_eq!(p.days_remaining, 0);
    assert!(approx(p.projected_total, 20.0));
}

#[test]
fn test_predict_past_month_is_complete() {
    let txns = vec![txn(dec!(62), Category::Food, "2026-02-14")];
    let p = predict_month(&txns, month("2026-02"), date("2026-06-10"));
    assert_eq!(p.current_day, 28);
    assert_eq!(p.days_remaining, 0);
    assert!(approx(p.avg_daily, 62.0 / 28.0));
    assert!(approx(p.projected_total, 62.0));
}

#[test]
fn test_predict_future_month_does_not_divide_by_zero() {
    let txns = vec![txn(dec!(300), Category::Rent, "2026-09-01")];
    let p = predict_month(&txns, month("2026-09"), date("2026-06-10"));
    assert_eq!(p.current_day, 0);
    assert_eq!(p.avg_daily, 0.0);
    assert_eq!(p.recent_daily, 0.0);
    assert!(approx(p.projected_total, 300.0));
}

#[test]
fn test_data_quality_tiers() {
    assert_eq!(DataQuality::classify(0, 20), DataQuality::None);
    assert_eq!(DataQuality::classify(2, 20), DataQuality::Minimal);
    assert_eq!(DataQuality::classify(25, 2), DataQuality::Minimal);
    assert_eq!(DataQuality::classify(5, 20), DataQuality::Limited);
    assert_eq!(DataQuality::classify(15, 10), DataQuality::Moderate);
    assert_eq!(DataQuality::classify(25, 20), DataQuality::Good);
}

#[test]
fn test_recommendations_daily_and_alert() {
    let mut budgets = BudgetMap::default();
    budgets.set(Category::Food, dec!(100));
    let txns = vec![txn(dec!(90), Category::Food, "2026-06-05")];
    let p = predict_month(&txns, month("2026-06"), date("2026-06-10"));
    let recs = recommendations(&p, &budgets);

    let daily = recs.iter().find(|r| r.kind == RecommendationKind::DailyBudget).unwrap();
    let total_budget = to_f64(budgets.total_for(TxnType::Expense));
    assert!(approx(daily.value, (total_budget - 90.0) / 20.0));

    let alert = recs.iter().find(|r| r.kind == RecommendationKind::CategoryAlert).unwrap();
    assert_eq!(alert.category, Some(Category::Food));
    assert!(alert.message.contains("90.0%"));
}

#[test]
fn test_recommendations_skip_daily_when_month_over() {
    let txns = vec![txn(dec!(10), Category::Gym, "2026-02-05")];
    let p = predict_month(&txns, month("2026-02"), date("2026-06-10"));
    let recs = recommendations(&p, &BudgetMap::default());
    assert!(recs.iter().all(|r| r.kind != RecommendationKind::DailyBudget));
    assert!(recommendations(&predict_month(&[], month("2026-02"), date("2026-06-10")), &BudgetMap::default()).is_empty());
}

// ── Insights ──────────────────────────────────────────────────

fn food_history(values: &[i64], current: i64) -> Vec<Transaction> {
    let target = month("2026-07");
    let mut txns: Vec<Transaction> = target
        .preceding(values.len())
        .iter()
        .zip(values)
        .map(|(m, v)| txn(Decimal::from(*v), Category::Food, &format!("{m}-10")))
        .collect();
    if current > 0 {
        txns.push(txn(Decimal::from(current), Category::Food, "2026-07-10"));
    }
    txns
}

#[test]
fn test_high_spending_anomaly_scenario() {
    let txns = food_history(&[40, 45, 42, 40, 100, 120], 150);
    let gen = InsightGenerator::default();
    let anomalies = gen.detect_anomalies(&txns, month("2026-07"));

    assert_eq!(anomalies.len(), 1);
    let a = &anomalies[0];
    assert_eq!(a.category, Category::Food);
    assert_eq!(a.kind, AnomalyKind::HighSpending);
    assert_eq!(a.severity, Priority::Medium);
    assert!(approx(a.expected, 64.5));
    assert!(approx(a.current, 150.0));
}

#[test]
fn test_severe_anomaly_is_high_priority() {
    let txns = food_history(&[40, 45, 42, 40, 100, 120], 400);
    let anomalies = InsightGenerator::default().detect_anomalies(&txns, month("2026-07"));
    assert_eq!(anomalies[0].severity, Priority::High);
}

#[test]
fn test_low_spending_respects_floor() {
    let txns = food_history(&[200, 200, 200, 200, 200, 200], 100);
    let anomalies = InsightGenerator::default().detect_anomalies(&txns, month("2026-07"));
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].kind, AnomalyKind::LowSpending);

    let strict = InsightGenerator::new(AnalyticsConfig {
        low_spending_floor: 250.0,
        ..AnalyticsConfig::default()
    });
    assert!(strict.detect_anomalies(&txns, month("2026-07")).is_empty());
}

#[test]
fn test_categories_without_history_are_skipped() {
    let txns = vec![txn(dec!(500), Category::Home, "2026-07-03")];
    assert!(InsightGenerator::default()
        .detect_anomalies(&txns, month("2026-07"))
        .is_empty());
}

#[test]
fn test_trend_direction_and_rising_insight() {
    let txns = food_history(&[10, 10, 10, 10, 50, 50], 0);
    let gen = InsightGenerator::default();
    let trends = gen.category_trends(&txns, month("2026-07"));
    let food = trends.iter().find(|t| t.category == Category::Food).unwrap();
    assert_eq!(food.direction, TrendDirection::Increasing);
    assert!(approx(food.recent, 50.0));

    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let insights = gen.generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    assert!(insights.iter().any(|i| i.title == "Food Spending Rising"));
}

#[test]
fn test_mean_variance_population() {
    let (mean, var) = mean_variance(&[40.0, 45.0, 42.0, 40.0, 100.0, 120.0]);
    assert!(approx(mean, 64.5));
    assert!(approx(var, 1071.25));
    assert_eq!(mean_variance(&[]), (0.0, 0.0));
}

#[test]
fn test_generate_is_idempotent_and_unique() {
    let txns = food_history(&[40, 45, 42, 40, 100, 120], 150);
    let gen = InsightGenerator::default();
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let budgets = BudgetMap::default();

    let first = gen.generate(&txns, &budgets, month("2026-07"), &p);
    let second = gen.generate(&txns, &budgets, month("2026-07"), &p);
    assert_eq!(first, second);

    let keys: std::collections::HashSet<&InsightKey> = first.iter().map(|i| &i.key).collect();
    assert_eq!(keys.len(), first.len());

    // Re-merging the same list must not grow it
    let merged = gen.merge(first.clone(), first.clone());
    assert_eq!(merged, first);
}

#[test]
fn test_insights_sorted_and_capped() {
    let gen = InsightGenerator::new(AnalyticsConfig {
        max_insights: 2,
        ..AnalyticsConfig::default()
    });
    // December brings a low-priority seasonal tip
    let txns = vec![
        txn(dec!(2000), Category::Rent, "2026-12-01"),
        txn(dec!(20), Category::Food, "2026-12-02"),
        txn(dec!(20), Category::Food, "2026-12-03"),
    ];
    let p = predict_month(&txns, month("2026-12"), date("2026-12-20"));
    let insights = gen.generate(&txns, &BudgetMap::default(), month("2026-12"), &p);
    assert!(insights.len() <= 2);
    assert!(insights
        .windows(2)
        .all(|w| w[0].priority.rank() >= w[1].priority.rank()));
}

#[test]
fn test_seasonal_tip_months() {
    assert!(seasonal_tip(month("2026-12")).is_some());
    assert!(seasonal_tip(month("2026-09")).is_some());
    assert!(seasonal_tip(month("2026-07")).is_none());

    let p = predict_month(&[], month("2026-12"), date("2026-12-05"));
    let insights = InsightGenerator::default().generate(&[], &BudgetMap::default(), month("2026-12"), &p);
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].title, "Holiday Budget Tip");
    assert_eq!(insights[0].priority, Priority::Low);
}

#[test]
fn test_minimal_quality_suppresses_budget_insights() {
    // Two expenses far beyond the whole budget
    let txns = vec![
        txn(dec!(5000), Category::Rent, "2026-07-01"),
        txn(dec!(5000), Category::Home, "2026-07-02"),
    ];
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    assert_eq!(p.data_quality, DataQuality::Minimal);
    let insights = InsightGenerator::default().generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    assert!(insights.iter().all(|i| i.title != "Budget Overage Predicted"));
}

#[test]
fn test_limited_quality_demotes_budget_insights() {
    let txns = vec![
        txn(dec!(3000), Category::Rent, "2026-07-01"),
        txn(dec!(3000), Category::Home, "2026-07-02"),
        txn(dec!(3000), Category::Gym, "2026-07-03"),
    ];
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    assert_eq!(p.data_quality, DataQuality::Limited);
    let insights = InsightGenerator::default().generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    let overage = insights
        .iter()
        .find(|i| i.title == "Budget Overage Predicted")
        .unwrap();
    assert_eq!(overage.priority, Priority::Medium);
}

#[test]
fn test_savings_insight_under_eighty_percent() {
    let txns: Vec<Transaction> = (1..=12)
        .map(|d| txn(dec!(5), Category::Food, &format!("2026-07-{d:02}")))
        .collect();
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    assert_eq!(p.data_quality, DataQuality::Moderate);
    let insights = InsightGenerator::default().generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    let savings = insights
        .iter()
        .find(|i| i.kind == InsightKind::Success && i.title == "Great Savings Potential")
        .unwrap();
    assert_eq!(savings.priority, Priority::Medium);
}

#[test]
fn test_remote_insight_merges_under_same_ranking() {
    let gen = InsightGenerator::default();
    let remote = Insight::remote(
        "warning",
        "Dining Out".into(),
        "Consider cooking at home".into(),
        "Plan meals".into(),
        "high",
    );
    let merged = gen.merge(Vec::new(), vec![remote.clone(), remote]);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].priority, Priority::High);
    assert_eq!(merged[0].kind, InsightKind::Warning);
}

#[test]
fn test_remote_insight_for_local_condition_shown_once() {
    let txns: Vec<Transaction> = (1..=15)
        .map(|d| txn(dec!(200), Category::Extra, &format!("2026-07-{d:02}")))
        .collect();
    let gen = InsightGenerator::default();
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let local = gen.generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    assert!(local.iter().any(|i| i.title == "Budget Overage Predicted"));

    let remote = vec![Insight::remote(
        "warning",
        "Budget Overage Predicted".into(),
        "Spending is on track to pass the budget.".into(),
        String::new(),
        "high",
    )];
    let merged = gen.merge(local, remote);
    let overage: Vec<&Insight> = merged.iter().filter(|i| i.title == "Budget Overage Predicted").collect();
    assert_eq!(overage.len(), 1);
    assert!(overage[0].message.starts_with("You're projected to exceed"));
}

#[test]
fn test_remote_titles_map_onto_local_conditions() {
    let remote = |title: &str| Insight::remote("info", title.into(), String::new(), String::new(), "low");

    let unusual = remote("Unusual Food Spending");
    assert_eq!(unusual.key.topic, "high_spending");
    assert_eq!(unusual.key.category, Some(Category::Food));
    assert_eq!(remote("Great Savings Potential").key.topic, "budget_savings");
    assert_eq!(remote("Spending Acceleration Detected").key.topic, "velocity");
    assert_eq!(remote("Holiday Budget Tip").key.topic, "seasonal");
    assert_eq!(remote("Gym Spending Rising").key.category, Some(Category::Gym));
    assert_eq!(remote("Dining Out Rising").key.topic, "remote:dining out rising");
}

#[test]
fn test_spending_summary_insights() {
    let gen = InsightGenerator::new(AnalyticsConfig {
        max_insights: 10,
        ..AnalyticsConfig::default()
    });
    let txns = vec![
        txn(dec!(1200), Category::Rent, "2026-07-01"),
        txn(dec!(20), Category::Food, "2026-07-02"),
        txn(dec!(20), Category::Food, "2026-07-03"),
    ];
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let insights = gen.generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
    assert!(titles.contains(&"Biggest Expense: Rent"));
    assert!(titles.contains(&"High Daily Spending"));
    let over = insights.iter().find(|i| i.title == "Categories Over Budget").unwrap();
    assert_eq!(over.message, "You're over budget in 1 categories.");
    assert_eq!(over.priority, Priority::Low);
}

#[test]
fn test_low_daily_spending_praised() {
    let txns: Vec<Transaction> = (1..=3)
        .map(|d| txn(dec!(5), Category::Food, &format!("2026-07-{d:02}")))
        .collect();
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let insights = InsightGenerator::default().generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    let pace = insights.iter().find(|i| i.key.topic == "daily_pace").unwrap();
    assert_eq!(pace.kind, InsightKind::Success);
    assert!(insights.iter().all(|i| i.title != "Categories Over Budget"));
}

#[test]
fn test_no_spending_gives_no_summary() {
    let p = predict_month(&[], month("2026-07"), date("2026-07-20"));
    assert!(InsightGenerator::default()
        .generate(&[], &BudgetMap::default(), month("2026-07"), &p)
        .is_empty());
}

#[test]
fn test_steady_rise_below_trend_threshold() {
    let txns = food_history(&[30, 30, 30, 30, 45, 45], 0);
    let p = predict_month(&txns, month("2026-07"), date("2026-07-20"));
    let insights = InsightGenerator::default().generate(&txns, &BudgetMap::default(), month("2026-07"), &p);
    let titles: Vec<&str> = insights.iter().map(|i| i.title.as_str()).collect();
    assert!(titles.contains(&"Food Costs Creeping Up"));
    assert!(titles.contains(&"Variable Food Spending"));
    assert!(!titles.contains(&"Food Spending Rising"));
}

// ── Report cache ──────────────────────────────────────────────

#[test]
fn test_report_cache_rebuilds_only_after_data_events() {
    use crate::events::{AppEvent, EventObserver};
    use crate::state::AppState;

    let mut state = AppState::new(month("2026-07"));
    let today = date("2026-07-20");
    let mut cache = ReportCache::new(InsightGenerator::default());
    assert!(cache.is_stale(&state, today));
    assert!(cache.get(&state, today).aggregate.total_expense().is_zero());
    assert!(!cache.is_stale(&state, today));

    let event = state.add_transaction(txn(dec!(42), Category::Food, "2026-07-03"));
    // Stale until the event is observed
    assert!(cache.get(&state, date("2026-07-20")).aggregate.total_expense().is_zero());
    cache.on_event(&event);
    assert_eq!(cache.get(&state, date("2026-07-20")).aggregate.total_expense(), dec!(42));

    cache.on_event(&AppEvent::ScreenChanged(crate::ui::Screen::Insights));
    assert!(!cache.is_stale(&state, today));
}

#[test]
fn test_report_cache_rebuilds_when_the_date_changes() {
    use crate::state::AppState;

    let mut state = AppState::new(month("2026-07"));
    state.add_transaction(txn(dec!(100), Category::Food, "2026-07-02"));
    let mut cache = ReportCache::new(InsightGenerator::default());
    assert_eq!(cache.get(&state, date("2026-07-10")).prediction.current_day, 10);

    let next_day = date("2026-07-11");
    assert!(cache.is_stale(&state, next_day));
    assert_eq!(cache.get(&state, next_day).prediction.current_day, 11);
    assert!(!cache.is_stale(&state, next_day));
}

#[test]
fn test_report_follows_selected_month() {
    use crate::state::AppState;

    let mut state = AppState::new(month("2026-07"));
    state.add_transaction(txn(dec!(42), Category::Food, "2026-06-03"));
    let mut cache = ReportCache::new(InsightGenerator::default());
    assert!(cache.get(&state, date("2026-07-20")).aggregate.total_expense().is_zero());
    state.select_month(month("2026-06"));
    let report = cache.get(&state, date("2026-07-20"));
    assert_eq!(report.aggregate.total_expense(), dec!(42));
    assert_eq!(report.trend.len(), 12);
}
