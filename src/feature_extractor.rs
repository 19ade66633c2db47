//! Feature extraction for transaction classification.
//!
//! A feature vector is the term-weighted text channel (one column per
//! vocabulary term) followed by a single standardized amount column. The
//! vocabulary and the amount statistics are fitted together on one training
//! corpus and frozen; inference reuses them unchanged so every vector a model
//! sees has exactly `feature_count` columns.

use crate::config::FeatureConfig;
use crate::error::Degradation;
use crate::text;
use crate::types::transaction::TransactionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Lower bound applied to the amount standard deviation
pub const SCALE_EPSILON: f64 = 1e-8;

/// Name of the trailing amount column
pub const AMOUNT_FEATURE: &str = "amount";

/// Fixed-width numeric input of the ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the trailing amount column
    pub fn amount(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

/// Frozen term-to-column mapping with per-term inverse document frequency.
///
/// Terms are stored in lexicographic order; a term's column is its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl Vocabulary {
    /// Select terms from tokenized documents.
    ///
    /// Terms outside the document-frequency window are dropped, the rest are
    /// ranked by total count (ties lexicographic) and the top `max_terms` kept.
    pub fn fit(documents: &[Vec<String>], settings: &FeatureConfig) -> Self {
        let n_documents = documents.len();
        // term -> (total count, document frequency)
        let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();

        for doc in documents {
            let mut seen = HashSet::new();
            for term in doc {
                let entry = stats.entry(term.as_str()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(term.as_str()) {
                    entry.1 += 1;
                }
            }
        }

        let max_df = settings.max_df_ratio * n_documents as f64;
        let mut candidates: Vec<(&str, usize, usize)> = stats
            .into_iter()
            .filter(|&(_, (_, df))| df >= settings.min_df && df as f64 <= max_df)
            .map(|(term, (count, df))| (term, count, df))
            .collect();

        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(settings.max_terms);
        candidates.sort_by(|a, b| a.0.cmp(b.0));

        let n = n_documents as f64;
        let idf = candidates
            .iter()
            .map(|&(_, _, df)| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        let terms = candidates.into_iter().map(|(term, _, _)| term.to_string()).collect();

        Self { terms, idf }
    }

    /// Column of a term, if it is in the vocabulary
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// L2-normalized tf-idf weights of one document's terms.
    ///
    /// Terms outside the vocabulary contribute nothing.
    pub fn weigh(&self, terms: &[String]) -> Vec<f64> {
        let mut weights = vec![0.0; self.terms.len()];
        for term in terms {
            if let Some(idx) = self.index_of(term) {
                weights[idx] += 1.0;
            }
        }

        for (weight, idf) in weights.iter_mut().zip(&self.idf) {
            *weight *= idf;
        }

        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in &mut weights {
                *weight /= norm;
            }
        }

        weights
    }
}

/// Mean and standard deviation of absolute amounts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingStats {
    pub mean: f64,
    pub stddev: f64,
}

impl ScalingStats {
    /// Population statistics of `|amount|`; non-finite amounts are skipped.
    pub fn fit(amounts: &[f64]) -> Self {
        let values: Vec<f64> = amounts
            .iter()
            .filter(|a| a.is_finite())
            .map(|a| a.abs())
            .collect();

        if values.is_empty() {
            return Self {
                mean: 0.0,
                stddev: 0.0,
            };
        }

        let count = values.len() as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;

        Self {
            mean,
            stddev: variance.sqrt(),
        }
    }

    /// Standardized absolute amount, `None` when the input is not finite
    pub fn scale(&self, amount: f64) -> Option<f64> {
        let scaled = (amount.abs() - self.mean) / self.stddev.max(SCALE_EPSILON);
        scaled.is_finite().then_some(scaled)
    }
}

/// Output of inference-mode extraction
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub vector: FeatureVector,
    pub degradation: Option<Degradation>,
}

/// Feature extractor bound to one training generation.
///
/// Only constructible by fitting, so inference against an untrained model is
/// impossible by construction at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractor {
    vocabulary: Vocabulary,
    scaling: ScalingStats,
    ngram_max: usize,
}

impl FeatureExtractor {
    /// Fit vocabulary and scaling on a corpus and return its training vectors.
    pub fn fit(
        records: &[TransactionRecord],
        settings: &FeatureConfig,
    ) -> (Self, Vec<FeatureVector>) {
        let documents: Vec<Vec<String>> = records
            .iter()
            .map(|r| Self::document(r, settings.ngram_max))
            .collect();
        let amounts: Vec<f64> = records.iter().map(|r| r.amount).collect();

        let extractor = Self {
            vocabulary: Vocabulary::fit(&documents, settings),
            scaling: ScalingStats::fit(&amounts),
            ngram_max: settings.ngram_max,
        };

        debug!(
            vocabulary = extractor.vocabulary.len(),
            amount_mean = extractor.scaling.mean,
            amount_stddev = extractor.scaling.stddev,
            "Feature extractor fitted"
        );

        let vectors = documents
            .iter()
            .zip(&amounts)
            .map(|(doc, &amount)| extractor.assemble(doc, amount).vector)
            .collect();

        (extractor, vectors)
    }

    /// Extract the feature vector of one transaction.
    ///
    /// A non-finite amount zero-fills the amount column and reports a
    /// [`Degradation::FeatureExtraction`].
    pub fn extract(&self, record: &TransactionRecord) -> Extraction {
        let doc = Self::document(record, self.ngram_max);
        self.assemble(&doc, record.amount)
    }

    fn document(record: &TransactionRecord, ngram_max: usize) -> Vec<String> {
        let combined = text::combine(&record.description, record.merchant.as_deref());
        text::terms(&combined, ngram_max)
    }

    fn assemble(&self, doc: &[String], amount: f64) -> Extraction {
        let mut values = self.vocabulary.weigh(doc);
        let mut degradation = None;

        let scaled = self.scaling.scale(amount).unwrap_or_else(|| {
            warn!(amount = %amount, "Non-finite amount, zero-filling amount feature");
            degradation = Some(Degradation::feature_extraction(format!(
                "amount {amount} is not finite"
            )));
            0.0
        });
        values.push(scaled);

        Extraction {
            vector: FeatureVector::new(values),
            degradation,
        }
    }

    /// Number of columns produced: vocabulary terms plus the amount.
    pub fn feature_count(&self) -> usize {
        self.vocabulary.len() + 1
    }

    /// Column names in vector order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.vocabulary
            .terms()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(AMOUNT_FEATURE))
            .collect()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn scaling(&self) -> &ScalingStats {
        &self.scaling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<TransactionRecord> {
        vec![
            TransactionRecord::new("WALMART GROCERY #1234", 87.42).with_merchant("Walmart"),
            TransactionRecord::new("TARGET GROCERY", 71.34).with_merchant("Target"),
            TransactionRecord::new("UBER TRIP", 23.45).with_merchant("Uber"),
            TransactionRecord::new("LYFT RIDE", 18.90).with_merchant("Lyft"),
            TransactionRecord::new("NETFLIX SUBSCRIPTION", 15.99),
        ]
    }

    #[test]
    fn test_feature_extraction() {
        let (extractor, vectors) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());

        assert_eq!(vectors.len(), 5);
        for vector in &vectors {
            assert_eq!(vector.len(), extractor.feature_count());
        }
        assert_eq!(extractor.feature_names().len(), extractor.feature_count());
        assert_eq!(extractor.feature_names().last(), Some(&AMOUNT_FEATURE));
    }

    #[test]
    fn test_vocabulary_contains_bigrams() {
        let (extractor, _) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());
        let vocab = extractor.vocabulary();

        assert!(vocab.index_of("grocery").is_some());
        assert!(vocab.index_of("walmart grocery").is_some());
        assert!(vocab.index_of("starbucks").is_none());

        let mut sorted = vocab.terms().to_vec();
        sorted.sort();
        assert_eq!(sorted, vocab.terms());
    }

    #[test]
    fn test_vocabulary_keeps_most_frequent_terms() {
        let settings = FeatureConfig {
            max_terms: 2,
            ..FeatureConfig::default()
        };
        let (extractor, _) = FeatureExtractor::fit(&corpus(), &settings);

        // five terms occur twice; ties resolve lexicographically
        assert_eq!(extractor.vocabulary().terms(), &["grocery", "lyft"]);
        assert_eq!(extractor.feature_count(), 3);
    }

    #[test]
    fn test_max_df_drops_ubiquitous_terms() {
        let records: Vec<TransactionRecord> = (0..5)
            .map(|i| TransactionRecord::new(format!("PAYMENT REF{i}"), 10.0))
            .collect();
        let (extractor, _) = FeatureExtractor::fit(&records, &FeatureConfig::default());

        assert!(extractor.vocabulary().index_of("payment").is_none());
        assert!(extractor.vocabulary().index_of("ref0").is_some());
    }

    #[test]
    fn test_text_channel_is_normalized() {
        let (extractor, vectors) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());
        let text = &vectors[0].as_slice()[..extractor.vocabulary().len()];
        let norm: f64 = text.iter().map(|w| w * w).sum::<f64>().sqrt();

        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unseen_tokens_contribute_nothing() {
        let (extractor, _) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());
        let extraction = extractor.extract(&TransactionRecord::new("ZZZ QQQ", 20.0));
        let text = &extraction.vector.as_slice()[..extractor.vocabulary().len()];

        assert!(text.iter().all(|&w| w == 0.0));
        assert_eq!(extraction.vector.len(), extractor.feature_count());
        assert!(extraction.degradation.is_none());
    }

    #[test]
    fn test_refund_matches_purchase() {
        let (extractor, _) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());
        let purchase = extractor.extract(&TransactionRecord::new("UBER TRIP", 23.45));
        let refund = extractor.extract(&TransactionRecord::new("UBER TRIP", -23.45));

        assert_eq!(purchase.vector, refund.vector);
    }

    #[test]
    fn test_non_finite_amount_degrades() {
        let (extractor, _) = FeatureExtractor::fit(&corpus(), &FeatureConfig::default());
        let extraction = extractor.extract(&TransactionRecord::new("UBER TRIP", f64::NAN));

        assert_eq!(extraction.vector.amount(), Some(0.0));
        assert_eq!(extraction.vector.len(), extractor.feature_count());
        assert!(matches!(
            extraction.degradation,
            Some(Degradation::FeatureExtraction { .. })
        ));
    }

    #[test]
    fn test_scaling_stats() {
        let stats = ScalingStats::fit(&[10.0, -20.0, 30.0]);
        assert!((stats.mean - 20.0).abs() < 1e-12);
        assert!((stats.stddev - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(stats.scale(20.0), Some(0.0));
        assert_eq!(stats.scale(f64::INFINITY), None);
    }

    #[test]
    fn test_constant_amounts_use_epsilon() {
        let stats = ScalingStats::fit(&[5.0, 5.0, -5.0]);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.scale(5.0), Some(0.0));
        assert!(stats.scale(6.0).unwrap() > 1e6);
    }
}
