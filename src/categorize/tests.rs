#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;

// ── Keyword scoring ───────────────────────────────────────────

#[test]
fn test_starbucks_coffee_is_food() {
    let s = CategorySuggester::new().suggest("Starbucks coffee", TxnType::Expense, None);
    assert_eq!(s.category, Category::Food);
    assert!(s.confidence > 0.0);
    assert!(s.reasoning.contains("starbucks"));
}

#[test]
fn test_case_and_whitespace_insensitive() {
    let cat = CategorySuggester::new();
    assert_eq!(cat.suggest("  WALMART run ", TxnType::Expense, None).category, Category::Grocery);
    assert_eq!(cat.suggest("Shell station", TxnType::Expense, None).category, Category::Petrol);
}

#[test]
fn test_longer_keyword_outscores_shorter() {
    let s = CategorySuggester::new().suggest("Car insurance renewal", TxnType::Expense, None);
    assert_eq!(s.category, Category::Insurance);
    assert!(s.matched.contains(&"car insurance".to_string()));
}

#[test]
fn test_multi_word_partial_match_scores_one() {
    // "depot" alone only partially matches "home depot"
    let s = CategorySuggester::new().suggest("Depot", TxnType::Expense, None);
    assert_eq!(s.category, Category::Home);
    assert!((s.confidence - 0.15).abs() < 1e-9);
}

#[test]
fn test_pattern_bonus_applies() {
    let s = CategorySuggester::new().suggest("breakfast", TxnType::Expense, None);
    assert_eq!(s.category, Category::Food);
    assert!((s.confidence - 0.45).abs() < 1e-9);
    assert_eq!(s.reasoning, "Matched keywords: pattern_match");
}

#[test]
fn test_confidence_is_capped() {
    let s = CategorySuggester::new().suggest("pizza restaurant dinner", TxnType::Expense, None);
    assert!((s.confidence - 0.95).abs() < 1e-9);
}

#[test]
fn test_reasoning_lists_at_most_three() {
    let s = CategorySuggester::new().suggest("restaurant pizza lunch dinner", TxnType::Expense, None);
    assert_eq!(s.category, Category::Food);
    assert!(s.matched.len() >= 4);
    assert_eq!(s.reasoning.matches(", ").count(), 2);
}

// ── Defaults ──────────────────────────────────────────────────

#[test]
fn test_expense_default_is_extra() {
    let s = CategorySuggester::new().suggest("Zzyzx thing", TxnType::Expense, None);
    assert_eq!(s, Suggestion::fallback(TxnType::Expense));
    assert_eq!(s.category, Category::Extra);
    assert!((s.confidence - 0.3).abs() < 1e-9);
}

#[test]
fn test_income_default_is_gong() {
    let s = CategorySuggester::new().suggest("Birthday money", TxnType::Income, None);
    assert_eq!(s.category, Category::Gong);
    assert!((s.confidence - 0.4).abs() < 1e-9);
}

#[test]
fn test_empty_item_falls_back() {
    let s = CategorySuggester::new().suggest("   ", TxnType::Expense, Some(dec!(300)));
    assert_eq!(s.category, Category::Extra);
}

#[test]
fn test_income_keywords() {
    let cat = CategorySuggester::new();
    assert_eq!(cat.suggest("UCO stipend", TxnType::Income, None).category, Category::Uco);
    assert_eq!(cat.suggest("Freelance design", TxnType::Income, None).category, Category::Gong);
}

#[test]
fn test_suggestion_stays_within_type() {
    // "coffee" is an expense keyword; income suggestions never leave income
    let s = CategorySuggester::new().suggest("coffee", TxnType::Income, None);
    assert_eq!(s.category.kind(), TxnType::Income);
}

// ── Amount proximity ──────────────────────────────────────────

#[test]
fn test_amount_alone_picks_typical_category() {
    let s = CategorySuggester::new().suggest("Landlord", TxnType::Expense, Some(dec!(300)));
    assert_eq!(s.category, Category::Rent);
    assert_eq!(s.reasoning, "Typical amount for this category");
}

#[test]
fn test_amount_near_typical_raises_confidence() {
    let cat = CategorySuggester::new();
    let without = cat.suggest("depot", TxnType::Expense, None);
    let with = cat.suggest("depot", TxnType::Expense, Some(dec!(80)));
    assert_eq!(with.category, Category::Home);
    assert!((with.confidence - 0.6).abs() < 1e-9);
    assert!(with.confidence > without.confidence);
}

#[test]
fn test_amount_does_not_boost_unmatched_categories() {
    let s = CategorySuggester::new().suggest("coffee", TxnType::Expense, Some(dec!(300)));
    assert_eq!(s.category, Category::Food);
}

// ── Learned mappings ──────────────────────────────────────────

#[test]
fn test_learned_mapping_wins() {
    let mut cat = CategorySuggester::new();
    cat.learn("Corner Shop", Category::Grocery);
    let s = cat.suggest("corner   shop", TxnType::Expense, None);
    assert_eq!(s.category, Category::Grocery);
    assert_eq!(s.reasoning, "Learned from your history");
    assert!((s.confidence - 0.95).abs() < 1e-9);
}

#[test]
fn test_strong_keywords_beat_learned_mapping() {
    let cat = CategorySuggester::new().with_learned(vec![("Starbucks coffee".to_string(), Category::Extra)]);
    assert_eq!(cat.learned_count(), 1);
    let s = cat.suggest("Starbucks coffee", TxnType::Expense, None);
    // 20 learned points do not beat 33 keyword points
    assert_eq!(s.category, Category::Food);
}

#[test]
fn test_learned_mapping_of_other_type_is_ignored() {
    let mut cat = CategorySuggester::new();
    cat.learn("tips", Category::Food);
    let s = cat.suggest("tips", TxnType::Income, None);
    assert_eq!(s.category, Category::Gong);
}

#[test]
fn test_normalize() {
    assert_eq!(normalize("  Corner   SHOP "), "corner shop");
    assert_eq!(normalize(""), "");
}
