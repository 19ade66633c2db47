//! Accuracy estimation for freshly fitted ensembles.

use crate::config::TrainingConfig;
use crate::feature_extractor::FeatureVector;
use crate::models::forest::{ForestError, ForestParams, RandomForest};
use tracing::{debug, warn};

/// Assign every sample to one of `k` folds, balancing each class.
///
/// Samples are ordered by class (stable within a class) and dealt out
/// round-robin, so every fold receives a near-equal share of every class.
pub fn stratified_folds(labels: &[usize], k: usize) -> Vec<usize> {
    let k = k.max(1);
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by_key(|&i| labels[i]);

    let mut folds = vec![0; labels.len()];
    for (position, &sample) in order.iter().enumerate() {
        folds[sample] = position % k;
    }
    folds
}

/// Mean held-out accuracy over `k` stratified folds.
pub fn cross_validate(
    rows: &[FeatureVector],
    labels: &[usize],
    n_classes: usize,
    params: &ForestParams,
    k: usize,
) -> Result<f64, ForestError> {
    let folds = stratified_folds(labels, k);
    let mut scores = Vec::with_capacity(k);

    for fold in 0..k {
        let mut train_rows = Vec::new();
        let mut train_labels = Vec::new();
        let mut test_rows = Vec::new();
        let mut test_labels = Vec::new();

        for (i, row) in rows.iter().enumerate() {
            if folds[i] == fold {
                test_rows.push(row.clone());
                test_labels.push(labels[i]);
            } else {
                train_rows.push(row.clone());
                train_labels.push(labels[i]);
            }
        }

        let forest = RandomForest::fit(&train_rows, &train_labels, n_classes, params)?;
        let score = forest.score(&test_rows, &test_labels)?;
        debug!(fold = fold, score = score, "Cross-validation fold scored");
        scores.push(score);
    }

    if scores.is_empty() {
        return Err(ForestError::EmptyTrainingSet);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Accuracy reported for a training run.
///
/// Uses `min(max_folds, n / 2)`-fold cross-validation once the corpus has
/// `cv_min_samples` rows, otherwise the in-sample score of `fitted`. Any
/// failure yields 0.0 instead of failing the training call.
pub fn estimate_accuracy(
    rows: &[FeatureVector],
    labels: &[usize],
    n_classes: usize,
    params: &ForestParams,
    fitted: &RandomForest,
    settings: &TrainingConfig,
) -> f64 {
    let n = rows.len();
    let folds = settings.max_folds.min(n / 2);

    let result = if n >= settings.cv_min_samples && folds >= 2 {
        cross_validate(rows, labels, n_classes, params, folds)
    } else {
        fitted.score(rows, labels)
    };

    match result {
        Ok(accuracy) => accuracy,
        Err(e) => {
            warn!(error = %e, "Could not calculate accuracy, reporting 0.0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n_per_class: usize) -> (Vec<FeatureVector>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_per_class {
            rows.push(FeatureVector::new(vec![i as f64 * 0.1]));
            labels.push(0);
            rows.push(FeatureVector::new(vec![10.0 + i as f64 * 0.1]));
            labels.push(1);
        }
        (rows, labels)
    }

    fn params() -> ForestParams {
        ForestParams {
            n_estimators: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        let labels = vec![0, 1, 0, 1, 0, 1, 0, 1, 2, 2];
        let folds = stratified_folds(&labels, 2);

        for fold in 0..2 {
            for class in 0..3 {
                let count = labels
                    .iter()
                    .zip(&folds)
                    .filter(|&(&l, &f)| l == class && f == fold)
                    .count();
                let expected = labels.iter().filter(|&&l| l == class).count() / 2;
                assert_eq!(count, expected);
            }
        }
    }

    #[test]
    fn test_cross_validate_separable() {
        let (rows, labels) = dataset(10);
        let accuracy = cross_validate(&rows, &labels, 2, &params(), 5).unwrap();

        assert!(accuracy > 0.9);
        assert!(accuracy <= 1.0);
    }

    #[test]
    fn test_small_corpus_scores_in_sample() {
        let (rows, labels) = dataset(4);
        let forest = RandomForest::fit(&rows, &labels, 2, &params()).unwrap();
        let settings = TrainingConfig::default();

        let accuracy = estimate_accuracy(&rows, &labels, 2, &params(), &forest, &settings);
        assert_eq!(accuracy, forest.score(&rows, &labels).unwrap());
    }

    #[test]
    fn test_failure_reports_zero() {
        let (rows, labels) = dataset(10);
        let forest = RandomForest::fit(&rows, &labels, 2, &params()).unwrap();
        let empty = ForestParams {
            n_estimators: 0,
            ..params()
        };

        let accuracy =
            estimate_accuracy(&rows, &labels, 2, &empty, &forest, &TrainingConfig::default());
        assert_eq!(accuracy, 0.0);
    }
}
