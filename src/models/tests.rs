#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::transaction::MAX_ITEM_LEN;
use super::*;
use crate::error::ValidationError;

fn form(item: &str, amount: &str, kind: &str, category: &str, date: &str) -> NewTransaction {
    NewTransaction {
        item: item.into(),
        amount: amount.into(),
        kind: kind.into(),
        category: category.into(),
        entry_date: date.into(),
    }
}

// ── NewTransaction::validate ──────────────────────────────────

#[test]
fn test_validate_builds_transaction() {
    let txn = form("  Weekly shop ", "$1,204.555", "Expense", "grocery", "2026-03-14")
        .validate()
        .unwrap();
    assert_eq!(txn.item, "Weekly shop");
    assert_eq!(txn.amount, dec!(1204.56));
    assert_eq!(txn.kind, TxnType::Expense);
    assert_eq!(txn.category, Category::Grocery);
    assert_eq!(txn.month, MonthKey::new(2026, 3).unwrap());
    assert!(!txn.id.is_empty());
}

#[test]
fn test_validate_item_rules_come_first() {
    // Every field is bad; the item is reported
    let err = form("", "abc", "loan", "Yachts", "soon").validate().unwrap_err();
    assert_eq!(err, ValidationError::EmptyItem);

    let err = form("Coffee 2", "abc", "loan", "Yachts", "soon").validate().unwrap_err();
    assert_eq!(err, ValidationError::ItemHasDigits);

    let long = "x".repeat(MAX_ITEM_LEN + 1);
    let err = form(&long, "1", "expense", "Food", "2026-03-01").validate().unwrap_err();
    assert_eq!(err, ValidationError::ItemTooLong(MAX_ITEM_LEN));
}

#[test]
fn test_validate_amount_before_type() {
    let err = form("Coffee", "0", "loan", "Food", "2026-03-01").validate().unwrap_err();
    assert_eq!(err, ValidationError::NonPositiveAmount);

    let err = form("Coffee", "4", "loan", "Food", "2026-03-01").validate().unwrap_err();
    assert_eq!(err, ValidationError::UnknownType("loan".into()));
}

#[test]
fn test_validate_category_must_match_type() {
    let err = form("Salary", "900", "income", "Food", "2026-03-01").validate().unwrap_err();
    assert_eq!(
        err,
        ValidationError::CategoryTypeMismatch {
            category: Category::Food,
            kind: TxnType::Income,
        }
    );
}

#[test]
fn test_validate_date_format() {
    let err = form("Coffee", "4", "expense", "Food", "03/01/2026").validate().unwrap_err();
    assert_eq!(err, ValidationError::InvalidDate("03/01/2026".into()));
}

#[test]
fn test_ids_are_unique() {
    let f = form("Coffee", "4", "expense", "Food", "2026-03-01");
    assert_ne!(f.validate().unwrap().id, f.validate().unwrap().id);
}

// ── parse_amount ──────────────────────────────────────────────

#[test]
fn test_parse_amount_rounds_half_away_from_zero() {
    assert_eq!(parse_amount("2.345").unwrap(), dec!(2.35));
    assert_eq!(parse_amount(" $10 ").unwrap(), dec!(10));
}

#[test]
fn test_parse_amount_rejects_tiny_and_negative() {
    assert_eq!(parse_amount("0.004"), Err(ValidationError::NonPositiveAmount));
    assert_eq!(parse_amount("-5"), Err(ValidationError::NonPositiveAmount));
    assert_eq!(parse_amount("ten"), Err(ValidationError::InvalidAmount("ten".into())));
}

// ── Category / TxnType ────────────────────────────────────────

#[test]
fn test_category_parse_key_or_display_name() {
    assert_eq!(Category::parse("gong"), Some(Category::Gong));
    assert_eq!(Category::parse("Private"), Some(Category::Gong));
    assert_eq!(Category::parse("uco"), Some(Category::Uco));
    assert_eq!(Category::parse("Yachts"), None);
}

#[test]
fn test_parse_for_filters_by_type() {
    assert_eq!(Category::parse_for(TxnType::Income, "Food"), None);
    assert_eq!(Category::parse_for(TxnType::Expense, "food"), Some(Category::Food));
}

#[test]
fn test_every_category_belongs_to_its_list() {
    for kind in TxnType::all() {
        assert!(Category::all_for(*kind).iter().all(|c| c.kind() == *kind));
    }
    assert_eq!(Category::all().count(), 11);
}

#[test]
fn test_txn_type_aliases() {
    assert_eq!(TxnType::parse("EXP"), Some(TxnType::Expense));
    assert_eq!(TxnType::parse("in"), Some(TxnType::Income));
    assert_eq!(TxnType::parse("transfer"), None);
}

// ── MonthKey ──────────────────────────────────────────────────

#[test]
fn test_month_parse_and_display() {
    let m = MonthKey::parse("2026-02-17").unwrap();
    assert_eq!(m.to_string(), "2026-02");
    assert_eq!(m.days_in_month(), 28);
    assert_eq!(m.long_name(), "February 2026");
    assert!(MonthKey::parse("2026-13").is_none());
    assert!(MonthKey::parse("26-1").is_none());
}

#[test]
fn test_month_navigation_crosses_years() {
    let december = MonthKey::new(2025, 12).unwrap();
    assert_eq!(december.next(), MonthKey::new(2026, 1).unwrap());
    assert_eq!(december.next().prev(), december);
}

#[test]
fn test_preceding_excludes_self_oldest_first() {
    let m = MonthKey::new(2026, 2).unwrap();
    let months: Vec<String> = m.preceding(3).iter().map(|k| k.to_string()).collect();
    assert_eq!(months, vec!["2025-11", "2025-12", "2026-01"]);
    assert!(m.preceding(0).is_empty());
}

#[test]
fn test_month_contains() {
    let m = MonthKey::new(2024, 2).unwrap();
    assert_eq!(m.days_in_month(), 29);
    assert!(m.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    assert!(!m.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
}

// ── BudgetMap ─────────────────────────────────────────────────

#[test]
fn test_budget_defaults() {
    let budgets = BudgetMap::default();
    assert_eq!(budgets.get(Category::Rent), dec!(300));
    assert_eq!(budgets.total_for(TxnType::Income), dec!(2300));
    assert_eq!(budgets.total_for(TxnType::Expense), dec!(1310));
}

#[test]
fn test_budget_set_refuses_non_positive() {
    let mut budgets = BudgetMap::default();
    assert!(!budgets.set(Category::Food, dec!(0)));
    assert_eq!(budgets.get(Category::Food), dec!(100));
    assert!(budgets.set(Category::Food, dec!(87.456)));
    assert_eq!(budgets.get(Category::Food), dec!(87.46));
}

#[test]
fn test_budget_step_snaps_and_clamps() {
    let mut budgets = BudgetMap::default();
    budgets.set(Category::Food, dec!(87));
    assert_eq!(budgets.step(Category::Food, true), dec!(100));
    budgets.set(Category::Food, dec!(87));
    assert_eq!(budgets.step(Category::Food, false), dec!(50));
    assert_eq!(budgets.step(Category::Food, false), dec!(50));

    budgets.set(Category::Rent, dec!(2000));
    assert_eq!(budgets.step(Category::Rent, true), dec!(2000));
}

// ── TransactionStore ──────────────────────────────────────────

#[test]
fn test_store_filters_by_month_and_removes() {
    let mut store = TransactionStore::new();
    let march = form("Lunch", "10", "expense", "Food", "2026-03-02").validate().unwrap();
    let april = form("Lunch", "10", "expense", "Food", "2026-04-02").validate().unwrap();
    let march_id = march.id.clone();
    store.push(march);
    store.push(april);

    assert_eq!(store.for_month(MonthKey::new(2026, 3).unwrap()).count(), 1);
    assert!(store.remove(&march_id).is_some());
    assert!(store.remove(&march_id).is_none());
    assert_eq!(store.len(), 1);
}
