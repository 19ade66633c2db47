//! Keyword rule table used when no trained model is available.

use crate::types::prediction::{Prediction, DEFAULT_CATEGORY};
use crate::types::transaction::TransactionRecord;

/// Confidence reported when no keyword matches
pub const DEFAULT_CONFIDENCE: f64 = 0.50;

/// One row of the rule table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleEntry {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
    pub confidence: f64,
}

/// Rule table in evaluation order. The first entry with any keyword
/// contained in the text wins, so reordering rows changes results
/// ("food" resolves to Groceries, "gas bill" to Transportation).
pub const RULES: &[RuleEntry] = &[
    RuleEntry {
        category: "Groceries",
        keywords: &[
            "grocery", "groceries", "walmart", "kroger", "target", "whole foods",
            "trader joe", "costco", "safeway", "food", "supermarket",
        ],
        confidence: 0.85,
    },
    RuleEntry {
        category: "Dining",
        keywords: &[
            "restaurant", "cafe", "coffee", "starbucks", "mcdonald", "burger",
            "pizza", "chipotle", "subway", "dunkin", "dining", "food",
        ],
        confidence: 0.88,
    },
    RuleEntry {
        category: "Transportation",
        keywords: &[
            "gas", "fuel", "shell", "exxon", "chevron", "bp", "mobil",
            "uber", "lyft", "taxi", "parking", "toll", "transit",
        ],
        confidence: 0.82,
    },
    RuleEntry {
        category: "Entertainment",
        keywords: &[
            "netflix", "spotify", "hulu", "disney", "amazon prime", "movie",
            "theater", "cinema", "concert", "ticket", "game", "entertainment",
        ],
        confidence: 0.90,
    },
    RuleEntry {
        category: "Shopping",
        keywords: &[
            "amazon", "ebay", "shop", "store", "mall", "clothing", "shoes",
            "electronics", "best buy", "purchase",
        ],
        confidence: 0.75,
    },
    RuleEntry {
        category: "Bills & Utilities",
        keywords: &[
            "electric", "water", "gas bill", "internet", "phone", "utility",
            "bill", "payment", "insurance", "rent", "mortgage",
        ],
        confidence: 0.92,
    },
    RuleEntry {
        category: "Healthcare",
        keywords: &[
            "pharmacy", "doctor", "hospital", "medical", "health", "cvs",
            "walgreens", "clinic", "prescription", "medicine",
        ],
        confidence: 0.87,
    },
    RuleEntry {
        category: "Travel",
        keywords: &[
            "hotel", "airline", "flight", "airbnb", "booking", "expedia",
            "travel", "vacation", "trip",
        ],
        confidence: 0.83,
    },
    RuleEntry {
        category: "Fitness",
        keywords: &[
            "gym", "fitness", "yoga", "sports", "athletic", "workout",
            "exercise", "health club",
        ],
        confidence: 0.86,
    },
];

/// Stateless first-match-wins keyword classifier
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine {
    rules: &'static [RuleEntry],
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self { rules: RULES }
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify by substring match over `"{description} {merchant}"`, lowercased.
    pub fn classify(&self, description: &str, merchant: Option<&str>) -> Prediction {
        let text = format!("{} {}", description, merchant.unwrap_or("")).to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| text.contains(keyword)))
            .map(|rule| Prediction::from_rules(rule.category, rule.confidence))
            .unwrap_or_else(|| Prediction::from_rules(DEFAULT_CATEGORY, DEFAULT_CONFIDENCE))
    }

    pub fn classify_record(&self, record: &TransactionRecord) -> Prediction {
        self.classify(&record.description, record.merchant.as_deref())
    }

    /// Classify many records, preserving order
    pub fn classify_batch(&self, records: &[TransactionRecord]) -> Vec<Prediction> {
        records.iter().map(|r| self.classify_record(r)).collect()
    }

    /// Categories this table can produce, in declaration order, then "Other"
    pub fn categories(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.category.to_string())
            .chain(std::iter::once(DEFAULT_CATEGORY.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::prediction::PredictionSource;

    #[test]
    fn test_starbucks_is_dining() {
        let engine = RuleEngine::new();
        let prediction = engine.classify("STARBUCKS COFFEE #1234", Some("Starbucks"));

        assert_eq!(prediction.category, "Dining");
        assert_eq!(prediction.confidence, 0.88);
        assert_eq!(prediction.source, PredictionSource::Rules);
        assert!(!prediction.is_degraded());
    }

    #[test]
    fn test_no_match_is_other() {
        let engine = RuleEngine::new();

        let empty = engine.classify("", Some(""));
        assert_eq!(empty.category, "Other");
        assert_eq!(empty.confidence, 0.50);

        let unknown = engine.classify("ZZZ 42", None);
        assert_eq!(unknown.category, "Other");
    }

    #[test]
    fn test_first_match_wins() {
        let engine = RuleEngine::new();

        // "food" is listed under both Groceries and Dining
        assert_eq!(engine.classify("FOOD COURT", None).category, "Groceries");
        // "gas" matches Transportation before "gas bill" reaches Bills & Utilities
        assert_eq!(engine.classify("CITY GAS BILL", None).category, "Transportation");
        // Groceries outranks Shopping for "target store"
        assert_eq!(engine.classify("TARGET STORE #1234", None).category, "Groceries");
    }

    #[test]
    fn test_merchant_participates() {
        let engine = RuleEngine::new();
        let prediction = engine.classify("POS 0042", Some("Netflix"));

        assert_eq!(prediction.category, "Entertainment");
        assert_eq!(prediction.confidence, 0.90);
    }

    #[test]
    fn test_batch_preserves_order() {
        let engine = RuleEngine::new();
        let records = vec![
            TransactionRecord::new("UBER TRIP", 12.0),
            TransactionRecord::new("GOLD GYM MEMBERSHIP", 40.0),
            TransactionRecord::new("", 0.0),
        ];

        let categories: Vec<String> = engine
            .classify_batch(&records)
            .into_iter()
            .map(|p| p.category)
            .collect();
        assert_eq!(categories, vec!["Transportation", "Fitness", "Other"]);
    }

    #[test]
    fn test_categories() {
        let categories = RuleEngine::new().categories();

        assert_eq!(categories.len(), 10);
        assert_eq!(categories.first().map(String::as_str), Some("Groceries"));
        assert_eq!(categories.last().map(String::as_str), Some("Other"));
    }
}
