#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;
use std::time::{Duration, Instant};

use super::mock::MockBackend;
use super::service::{OFFLINE_NOTICE, ONLINE_NOTICE};
use super::types::CategoryRequest;
use super::*;
use crate::analytics::{predict_month, Insight, InsightGenerator, Priority};
use crate::categorize::{CategorySuggester, Suggestion};
use crate::error::AiError;
use crate::models::{Category, MonthKey, Transaction, TxnType};
use crate::state::AppState;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn txn(amount: Decimal, category: Category, on: &str) -> Transaction {
    Transaction::restore(format!("{on}-{amount}"), "Test item".into(), amount, category, date(on)).unwrap()
}

fn offline() -> AiService {
    AiService::new(None, CategorySuggester::new())
}

fn with_mock(mock: &MockBackend) -> AiService {
    AiService::new(Some(Box::new(mock.clone())), CategorySuggester::new())
}

// ── Category suggestion ───────────────────────────────────────

#[test]
fn test_offline_by_config_is_silent() {
    let mut service = offline();
    assert!(!service.is_configured());

    let result = service.suggest_category("Starbucks coffee", TxnType::Expense, None, date("2026-03-01"));
    assert_eq!(result.source, Source::Local);
    assert_eq!(result.value.category, Category::Food);
    assert_eq!(result.notice, None);
}

#[test]
fn test_remote_suggestion_used_when_valid() {
    let mock = MockBackend::new("Grocery");
    let mut service = with_mock(&mock);

    let result = service.suggest_category("Starbucks coffee", TxnType::Expense, Some(dec!(5)), date("2026-03-01"));
    assert_eq!(result.source, Source::Remote);
    assert_eq!(result.value.category, Category::Grocery);
    assert_eq!(result.value.confidence, 0.9);
    assert_eq!(result.notice, None);
}

#[test]
fn test_remote_category_of_wrong_type_falls_back() {
    let mock = MockBackend::new("UCO");
    let mut service = with_mock(&mock);

    let result = service.suggest_category("Starbucks coffee", TxnType::Expense, None, date("2026-03-01"));
    assert_eq!(result.source, Source::Local);
    assert_eq!(result.value.category, Category::Food);
}

#[test]
fn test_offline_notice_once_per_outage() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);
    let day = date("2026-03-01");

    mock.set_healthy(false);
    let first = service.suggest_category("Pizza night", TxnType::Expense, None, day);
    let second = service.suggest_category("Pizza night", TxnType::Expense, None, day);
    assert_eq!(first.notice.as_deref(), Some(OFFLINE_NOTICE));
    assert_eq!(second.notice, None);
    assert_eq!(second.source, Source::Local);

    mock.set_healthy(true);
    let back = service.suggest_category("Pizza night", TxnType::Expense, None, day);
    assert_eq!(back.source, Source::Remote);

    mock.set_healthy(false);
    let again = service.suggest_category("Pizza night", TxnType::Expense, None, day);
    assert_eq!(again.notice.as_deref(), Some(OFFLINE_NOTICE));
}

#[test]
fn test_category_request_always_carries_an_amount() {
    let request = CategoryRequest::new("  coffee ", TxnType::Expense, None, date("2026-10-15"));
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        serde_json::json!({"item": "coffee", "amount": 0.0, "type": "expense", "entryDate": "2026-10-15"})
    );

    let request = CategoryRequest::new("coffee", TxnType::Expense, Some(dec!(4.50)), date("2026-10-15"));
    assert_eq!(request.amount, 4.5);
}

#[test]
fn test_learned_mapping_skips_remote() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);
    service.learn("Weekly shop", Category::Grocery);

    let result = service.suggest_category("weekly  shop", TxnType::Expense, None, date("2026-03-01"));
    assert_eq!(result.source, Source::Local);
    assert_eq!(result.value.category, Category::Grocery);
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_unreachable_backend_falls_back() {
    let backend = HttpBackend::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
    let mut service = AiService::new(Some(Box::new(backend)), CategorySuggester::new());

    let result = service.suggest_category("Starbucks coffee", TxnType::Expense, None, date("2026-03-01"));
    assert_eq!(result.source, Source::Local);
    assert_eq!(result.value.category, Category::Food);
    assert_eq!(result.notice.as_deref(), Some(OFFLINE_NOTICE));
}

#[test]
fn test_http_root_url() {
    let backend = HttpBackend::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
    assert_eq!(backend.root_url(), "http://localhost:8000");
    assert_eq!(backend.endpoint(), "http://localhost:8000/api");
}

// ── Health ────────────────────────────────────────────────────

#[test]
fn test_health_announces_once() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);

    let first = service.health();
    assert!(first.value);
    assert_eq!(first.notice.as_deref(), Some(ONLINE_NOTICE));
    assert_eq!(service.health().notice, None);

    mock.set_healthy(false);
    let down = service.health();
    assert!(!down.value);
    assert_eq!(down.notice.as_deref(), Some(OFFLINE_NOTICE));

    mock.set_healthy(true);
    assert_eq!(service.health().notice.as_deref(), Some(ONLINE_NOTICE));
}

// ── Receipts ──────────────────────────────────────────────────

#[test]
fn test_image_receipt_goes_remote() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();

    let result = service.process_receipt(file.path());
    assert_eq!(result.source, Source::Remote);
    let data = result.value.unwrap();
    assert_eq!(data.vendor.as_deref(), Some("Kroger"));
    assert_eq!(data.amount, Some(dec!(23.46)));
    assert_eq!(data.date, Some(date("2026-02-03")));
    assert_eq!(data.suggested_category, Some(Category::Grocery));
}

#[test]
fn test_image_receipt_needs_backend() {
    let file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    let result = offline().process_receipt(file.path());
    assert!(matches!(result.value, Err(AiError::NotConfigured)));
    assert_eq!(result.notice, None);
}

#[test]
fn test_failed_upload_reports_outage_once() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    mock.set_healthy(false);

    let failed = service.process_receipt(file.path());
    assert!(matches!(failed.value, Err(AiError::Status(503))));
    assert_eq!(failed.source, Source::Local);
    assert_eq!(failed.notice.as_deref(), Some(OFFLINE_NOTICE));

    // Same outage: later fallbacks stay quiet
    let later = service.suggest_category("Starbucks coffee", TxnType::Expense, None, date("2026-03-04"));
    assert_eq!(later.source, Source::Local);
    assert_eq!(later.notice, None);
}

#[test]
fn test_text_receipt_parsed_locally() {
    let mock = MockBackend::new("Food");
    let mut service = with_mock(&mock);
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"STARBUCKS\n2026-03-04\nTOTAL 6.75\n").unwrap();

    let result = service.process_receipt(file.path());
    assert_eq!(result.source, Source::Local);
    let data = result.value.unwrap();
    assert_eq!(data.amount, Some(dec!(6.75)));
    assert_eq!(data.suggested_category, Some(Category::Food));
    assert_eq!(mock.call_count(), 0);
}

// ── Forecast and insights ─────────────────────────────────────

fn march_spending() -> Vec<Transaction> {
    vec![
        txn(dec!(30), Category::Food, "2026-03-01"),
        txn(dec!(20), Category::Petrol, "2026-03-04"),
        txn(dec!(50), Category::Grocery, "2026-03-09"),
    ]
}

#[test]
fn test_forecast_local_and_remote() {
    let txns = march_spending();
    let prediction = predict_month(&txns, MonthKey::parse("2026-03").unwrap(), date("2026-03-10"));
    assert_eq!(prediction.days_remaining, 21);

    let local = offline().predict_spending(&txns, &prediction);
    assert_eq!(local.source, Source::Local);
    assert_eq!(local.value.amount, prediction.projected_remaining);
    assert!(local.value.low <= local.value.high);

    let mock = MockBackend::new("Food");
    let remote = with_mock(&mock).predict_spending(&txns, &prediction);
    assert_eq!(remote.source, Source::Remote);
    assert_eq!(remote.value.amount, 210.0);
    assert_eq!(remote.value.trend, "increasing");
}

#[test]
fn test_remote_insights_merge_into_ranking() {
    let mut state = AppState::new(MonthKey::parse("2026-03").unwrap());
    for t in march_spending() {
        state.add_transaction(t);
    }
    let generator = InsightGenerator::default();
    let local = vec![Insight::remote("info", "Local tip".into(), String::new(), String::new(), "low")];

    let mock = MockBackend::new("Food");
    let result = with_mock(&mock).advanced_insights(&state, &generator, local.clone());
    assert_eq!(result.source, Source::Remote);
    assert_eq!(result.value.len(), 2);
    assert_eq!(result.value[0].title, "Dining Out Rising");
    assert_eq!(result.value[0].priority, Priority::High);

    mock.set_healthy(false);
    let fallback = with_mock(&mock).advanced_insights(&state, &generator, local.clone());
    assert_eq!(fallback.value, local);
}

// ── Debounce ──────────────────────────────────────────────────

fn food() -> Suggestion {
    Suggestion {
        category: Category::Food,
        confidence: 0.5,
        reasoning: String::new(),
        matched: Vec::new(),
    }
}

#[test]
fn test_tracker_waits_for_quiet_period() {
    let start = Instant::now();
    let mut tracker = SuggestionTracker::new(Duration::from_millis(800));

    tracker.input("Star", TxnType::Expense, start);
    tracker.input("Starbucks", TxnType::Expense, start + Duration::from_millis(500));
    assert!(tracker.poll(start + Duration::from_millis(1000)).is_none());

    let request = tracker.poll(start + Duration::from_millis(1300)).unwrap();
    assert_eq!(request.item, "Starbucks");
    assert_eq!(request.kind, TxnType::Expense);
    assert!(tracker.complete(request.generation, food()));
    assert_eq!(tracker.current().map(|s| s.category), Some(Category::Food));
}

#[test]
fn test_tracker_one_request_in_flight() {
    let start = Instant::now();
    let delay = Duration::from_millis(800);
    let mut tracker = SuggestionTracker::new(delay);

    tracker.input("Coffee", TxnType::Expense, start);
    let first = tracker.poll(start + delay).unwrap();

    tracker.input("Coffee beans", TxnType::Expense, start + delay);
    assert!(tracker.poll(start + delay * 3).is_none());

    // Input changed after dispatch, so the answer is stale
    assert!(!tracker.complete(first.generation, food()));
    assert!(tracker.current().is_none());

    let second = tracker.poll(start + delay * 3).unwrap();
    assert_eq!(second.item, "Coffee beans");
    assert!(second.generation > first.generation);
    assert!(tracker.complete(second.generation, food()));
}

#[test]
fn test_tracker_ignores_old_generation() {
    let start = Instant::now();
    let delay = Duration::from_millis(100);
    let mut tracker = SuggestionTracker::new(delay);

    tracker.input("Gym", TxnType::Expense, start);
    let request = tracker.poll(start + delay).unwrap();
    assert!(!tracker.complete(request.generation + 1, food()));
    assert!(!tracker.complete(request.generation - 1, food()));
}

#[test]
fn test_tracker_empty_input_never_fires() {
    let start = Instant::now();
    let mut tracker = SuggestionTracker::new(Duration::from_millis(10));
    tracker.input("   ", TxnType::Income, start);
    assert!(tracker.poll(start + Duration::from_secs(5)).is_none());
}
