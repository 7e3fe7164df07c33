//! Local extraction of vendor, total and date from receipt text.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::{Category, NewTransaction};

const AMOUNT_PATTERNS: &[&str] = &[
    r"\$\s*(\d+\.\d{2})",
    r"TOTAL[:\s]*\$?\s*(\d+\.\d{2})",
    r"AMOUNT[:\s]*\$?\s*(\d+\.\d{2})",
    r"(\d+\.\d{2})\s*$",
];

const DATE_PATTERNS: &[&str] = &[
    r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}",
    r"\d{4}[/-]\d{1,2}[/-]\d{1,2}",
    r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4}",
    r"\d{1,2}\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+\d{4}",
];

static AMOUNT_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(AMOUNT_PATTERNS));
static DATE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(DATE_PATTERNS));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(&format!("(?i){p}")).ok())
        .collect()
}

const NUMERIC_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d", "%Y-%m-%d", "%m/%d/%y", "%m-%d-%y"];
const NAMED_DATE_FORMATS: &[&str] = &["%b %d, %Y", "%b %d %Y", "%B %d, %Y", "%B %d %Y", "%d %b %Y", "%d %B %Y"];

const VENDORS: &[(Category, &[&str])] = &[
    (
        Category::Grocery,
        &["walmart", "kroger", "safeway", "publix", "whole foods", "costco", "target"],
    ),
    (
        Category::Food,
        &["mcdonalds", "subway", "starbucks", "pizza", "burger", "kfc", "taco bell"],
    ),
    (
        Category::Petrol,
        &["shell", "exxon", "bp", "chevron", "mobil", "texaco", "speedway"],
    ),
    (Category::Home, &["home depot", "lowes", "ikea", "ace hardware"]),
    (
        Category::Gym,
        &["planet fitness", "la fitness", "gold's gym", "24 hour fitness"],
    ),
];

const AMOUNT_CONFIDENCE: f64 = 0.4;
const DATE_CONFIDENCE: f64 = 0.3;
const VENDOR_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReceiptData {
    pub(crate) vendor: Option<String>,
    pub(crate) amount: Option<Decimal>,
    pub(crate) date: Option<NaiveDate>,
    pub(crate) suggested_category: Option<Category>,
    pub(crate) confidence: f64,
}

impl ReceiptData {
    /// Pre-filled expense form; `None` when no total was found.
    pub(crate) fn to_form(&self, today: NaiveDate) -> Option<NewTransaction> {
        let amount = self.amount?;
        let item: String = self
            .vendor
            .as_deref()
            .unwrap_or("Receipt")
            .chars()
            .filter(|c| !c.is_ascii_digit())
            .collect();
        Some(NewTransaction {
            item: item.trim().to_string(),
            amount: amount.to_string(),
            kind: "expense".into(),
            category: self
                .suggested_category
                .unwrap_or(Category::Extra)
                .key()
                .to_string(),
            entry_date: self.date.unwrap_or(today).format("%Y-%m-%d").to_string(),
        })
    }
}

/// Pull vendor, total and date out of receipt text.
pub(crate) fn parse_text(text: &str) -> ReceiptData {
    let amount = extract_amount(text);
    let date = extract_date(text);
    let vendor = extract_vendor(text);

    let mut confidence = 0.0;
    if amount.is_some() {
        confidence += AMOUNT_CONFIDENCE;
    }
    if date.is_some() {
        confidence += DATE_CONFIDENCE;
    }
    if vendor.is_some() {
        confidence += VENDOR_CONFIDENCE;
    }

    let (vendor, suggested_category) = match vendor {
        Some((name, category)) => (Some(name), Some(category)),
        None => (None, None),
    };

    tracing::debug!(?amount, ?date, vendor = ?vendor, "Receipt text parsed");
    ReceiptData {
        vendor,
        amount,
        date,
        suggested_category,
        confidence,
    }
}

/// Highest-scoring amount: "total" lines beat "amount" lines beat the tail.
fn extract_amount(text: &str) -> Option<Decimal> {
    let lines: Vec<&str> = text.lines().collect();
    let mut best: Option<(Decimal, u32)> = None;

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        for pattern in AMOUNT_REGEXES.iter() {
            for caps in pattern.captures_iter(line) {
                let Some(amount) = caps.get(1).and_then(|m| Decimal::from_str(m.as_str()).ok()) else {
                    continue;
                };
                let mut score = 0;
                if lower.contains("total") {
                    score += 10;
                }
                if lower.contains("amount") {
                    score += 8;
                }
                if i + 3 >= lines.len() {
                    score += 5;
                }
                if amount > Decimal::ONE {
                    score += 2;
                }
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((amount, score));
                }
            }
        }
    }

    best.map(|(amount, _)| amount)
}

fn extract_date(text: &str) -> Option<NaiveDate> {
    DATE_REGEXES.iter().find_map(|pattern| {
        let found = pattern.find(text)?;
        parse_date(found.as_str())
    })
}

/// Parse a date in any of the receipt spellings; two-digit years are 20xx.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let cleaned = s.trim().replace('.', "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    NUMERIC_DATE_FORMATS
        .iter()
        .chain(NAMED_DATE_FORMATS)
        .filter_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .find(|d| d.year() >= 1000)
}

fn extract_vendor(text: &str) -> Option<(String, Category)> {
    let lower = text.to_lowercase();
    for (category, vendors) in VENDORS {
        if let Some(vendor) = vendors.iter().find(|v| lower.contains(*v)) {
            return Some((title_case(vendor), *category));
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(5)
        .find_map(|line| {
            let letters: String = line
                .chars()
                .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
                .collect();
            let letters = letters.trim();
            let len = letters.chars().count();
            (len > 3 && len < 30).then(|| (title_case(letters), Category::Extra))
        })
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
