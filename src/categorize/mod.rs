use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::analytics::to_f64;
use crate::models::{Category, TxnType};

const LEARNED_BONUS: u32 = 20;
const PATTERN_BONUS: u32 = 3;
const NEAR_TYPICAL_BONUS: u32 = 3;
const IN_RANGE_BONUS: u32 = 1;
const NEAR_TYPICAL_TOLERANCE: f64 = 0.25;
const CONFIDENCE_PER_POINT: f64 = 0.15;
const MAX_CONFIDENCE: f64 = 0.95;

fn keywords(category: Category) -> &'static [&'static str] {
    match category {
        Category::Rent => &["rent", "apartment", "house payment", "mortgage", "housing"],
        Category::Grocery => &[
            "grocery",
            "supermarket",
            "walmart",
            "costco",
            "food shopping",
            "kroger",
            "safeway",
        ],
        Category::Food => &[
            "restaurant",
            "pizza",
            "mcdonalds",
            "subway",
            "starbucks",
            "coffee",
            "lunch",
            "dinner",
            "cafe",
        ],
        Category::Petrol => &["gas", "fuel", "petrol", "shell", "exxon", "bp", "chevron", "gasoline"],
        Category::Home => &[
            "furniture",
            "home depot",
            "ikea",
            "home improvement",
            "appliances",
            "cleaning supplies",
        ],
        Category::Gym => &["gym", "fitness", "planet fitness", "membership", "workout", "yoga"],
        Category::Mobile => &["phone", "mobile", "verizon", "att", "tmobile", "cell phone", "smartphone"],
        Category::Extra => &["entertainment", "movie", "shopping", "amazon", "miscellaneous"],
        Category::Insurance => &["insurance", "health insurance", "car insurance", "life insurance"],
        Category::Uco => &["uco", "university", "school payment", "student payment", "academic"],
        Category::Gong => &[
            "gong",
            "private",
            "freelance",
            "consulting",
            "work",
            "job",
            "contract",
            "gig",
        ],
    }
}

fn patterns(category: Category) -> &'static [&'static str] {
    match category {
        Category::Petrol => &[r"\$?\d+\.\d{2}.*gas", r"shell|exxon|bp|chevron"],
        Category::Food => &[r"(restaurant|cafe|coffee|pizza)", r"(lunch|dinner|breakfast)"],
        Category::Grocery => &[r"(grocery|supermarket)", r"(walmart|costco|kroger)"],
        Category::Mobile => &[r"(phone|mobile).*bill", r"(verizon|att|tmobile)"],
        _ => &[],
    }
}

/// Plausible `(min, typical, max)` amount for a single transaction.
fn amount_range(category: Category) -> (f64, f64, f64) {
    match category {
        Category::Rent => (150.0, 300.0, 3000.0),
        Category::Grocery => (5.0, 60.0, 400.0),
        Category::Food => (2.0, 15.0, 150.0),
        Category::Petrol => (10.0, 45.0, 150.0),
        Category::Home => (5.0, 80.0, 2000.0),
        Category::Gym => (10.0, 40.0, 200.0),
        Category::Mobile => (15.0, 60.0, 250.0),
        Category::Extra => (1.0, 25.0, 500.0),
        Category::Insurance => (30.0, 150.0, 1500.0),
        Category::Uco => (100.0, 1000.0, 5000.0),
        Category::Gong => (20.0, 500.0, 10000.0),
    }
}

/// Lowercased, trimmed, single-spaced form used as the learned-mapping key.
pub(crate) fn normalize(item: &str) -> String {
    item.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Suggestion {
    pub(crate) category: Category,
    pub(crate) confidence: f64,
    pub(crate) reasoning: String,
    pub(crate) matched: Vec<String>,
}

impl Suggestion {
    pub(crate) fn fallback(kind: TxnType) -> Self {
        let (confidence, reasoning) = match kind {
            TxnType::Expense => (0.3, "No specific keywords matched, defaulting to Extra category"),
            TxnType::Income => (0.4, "General income, categorized as private"),
        };
        Self {
            category: Category::default_for(kind),
            confidence,
            reasoning: reasoning.into(),
            matched: Vec::new(),
        }
    }
}

#[derive(Clone)]
struct CompiledPattern {
    category: Category,
    regex: Regex,
}

#[derive(Debug, Default)]
struct Score {
    points: u32,
    matched: Vec<String>,
    learned: bool,
}

/// Offline category suggester: keyword, pattern, amount and learned scoring.
#[derive(Clone)]
pub(crate) struct CategorySuggester {
    patterns: Vec<CompiledPattern>,
    learned: HashMap<String, Category>,
}

impl Default for CategorySuggester {
    fn default() -> Self {
        Self::new()
    }
}

impl CategorySuggester {
    pub(crate) fn new() -> Self {
        let patterns = Category::all()
            .flat_map(|category| {
                patterns(category).iter().filter_map(move |p| {
                    Regex::new(&format!("(?i){p}"))
                        .ok()
                        .map(|regex| CompiledPattern { category, regex })
                })
            })
            .collect();

        Self {
            patterns,
            learned: HashMap::new(),
        }
    }

    pub(crate) fn with_learned(mut self, learned: impl IntoIterator<Item = (String, Category)>) -> Self {
        for (item, category) in learned {
            self.learn(&item, category);
        }
        self
    }

    /// Remember that `item` belongs to `category`. Later suggestions for the
    /// same normalized description strongly prefer it.
    pub(crate) fn learn(&mut self, item: &str, category: Category) {
        let key = normalize(item);
        if !key.is_empty() {
            self.learned.insert(key, category);
        }
    }

    pub(crate) fn learned(&self, item: &str) -> Option<Category> {
        self.learned.get(&normalize(item)).copied()
    }

    pub(crate) fn learned_count(&self) -> usize {
        self.learned.len()
    }

    pub(crate) fn suggest(&self, item: &str, kind: TxnType, amount: Option<Decimal>) -> Suggestion {
        let text = item.trim().to_lowercase();
        if text.is_empty() {
            return Suggestion::fallback(kind);
        }

        let candidates = Category::all_for(kind);
        let mut scores: Vec<(Category, Score)> = candidates.iter().map(|&c| (c, Score::default())).collect();

        for (category, score) in scores.iter_mut() {
            for &keyword in keywords(*category) {
                if text.contains(keyword) {
                    score.points += keyword.len() as u32 * 2;
                    score.matched.push(keyword.to_string());
                } else if keyword.contains(' ') && keyword.split(' ').any(|w| text.contains(w)) {
                    score.points += 1;
                    score.matched.push(keyword.to_string());
                }
            }
            for pattern in self.patterns.iter().filter(|p| p.category == *category) {
                if pattern.regex.is_match(&text) {
                    score.points += PATTERN_BONUS;
                    if score.matched.is_empty() {
                        score.matched.push("pattern_match".into());
                    }
                }
            }
        }

        if let Some(amount) = amount.map(to_f64).filter(|a| *a > 0.0) {
            let any_keyword = scores.iter().any(|(_, s)| s.points > 0);
            for (category, score) in scores.iter_mut() {
                if any_keyword && score.points == 0 {
                    continue;
                }
                score.points += amount_bonus(*category, amount);
            }
        }

        if let Some(&learned) = self.learned.get(&normalize(item)) {
            if let Some((_, score)) = scores.iter_mut().find(|(c, _)| *c == learned) {
                score.points += LEARNED_BONUS;
                score.learned = true;
            }
        }

        // First maximum wins, so declaration order breaks ties
        let mut best: Option<(Category, Score)> = None;
        for (category, score) in scores.into_iter().filter(|(_, s)| s.points > 0) {
            if best.as_ref().map_or(true, |(_, b)| score.points > b.points) {
                best = Some((category, score));
            }
        }

        let Some((category, score)) = best else {
            return Suggestion::fallback(kind);
        };

        let reasoning = if score.learned {
            "Learned from your history".to_string()
        } else if score.matched.is_empty() {
            "Typical amount for this category".to_string()
        } else {
            let shown: Vec<&str> = score.matched.iter().take(3).map(String::as_str).collect();
            format!("Matched keywords: {}", shown.join(", "))
        };

        Suggestion {
            category,
            confidence: (f64::from(score.points) * CONFIDENCE_PER_POINT).min(MAX_CONFIDENCE),
            reasoning,
            matched: score.matched,
        }
    }
}

fn amount_bonus(category: Category, amount: f64) -> u32 {
    let (min, typical, max) = amount_range(category);
    if (amount - typical).abs() <= typical * NEAR_TYPICAL_TOLERANCE {
        NEAR_TYPICAL_BONUS
    } else if (min..=max).contains(&amount) {
        IN_RANGE_BONUS
    } else {
        0
    }
}

#[cfg(test)]
mod tests;
