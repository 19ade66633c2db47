//! Vote aggregation for the tree ensemble

/// Hard votes cast by ensemble members for one input.
///
/// Class indices follow the model's category order, which is also the
/// tie-break order everywhere in this type.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteTally {
    counts: Vec<usize>,
    total: usize,
}

impl VoteTally {
    /// Create an empty tally over `n_classes` classes.
    pub fn new(n_classes: usize) -> Self {
        Self {
            counts: vec![0; n_classes],
            total: 0,
        }
    }

    /// Record one vote; out-of-range classes are ignored.
    pub fn record(&mut self, class: usize) {
        if let Some(count) = self.counts.get_mut(class) {
            *count += 1;
            self.total += 1;
        }
    }

    /// Number of votes recorded.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Fraction of votes for `class` (0.0 when nothing was recorded).
    pub fn fraction(&self, class: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.counts.get(class).copied().unwrap_or(0) as f64 / self.total as f64
    }

    /// Per-class vote fractions; sums to 1 when any vote was recorded.
    pub fn fractions(&self) -> Vec<f64> {
        (0..self.counts.len()).map(|class| self.fraction(class)).collect()
    }

    /// Class with the most votes, lowest index on ties.
    pub fn majority(&self) -> usize {
        self.ranked(1).first().map(|&(class, _)| class).unwrap_or(0)
    }

    /// Top `limit` classes by descending fraction.
    ///
    /// The sort is stable, so equal fractions keep class order.
    pub fn ranked(&self, limit: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self.fractions().into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(votes: &[usize], n_classes: usize) -> VoteTally {
        let mut tally = VoteTally::new(n_classes);
        for &vote in votes {
            tally.record(vote);
        }
        tally
    }

    #[test]
    fn test_vote_fractions() {
        let tally = tally(&[0, 1, 1, 2], 3);

        assert_eq!(tally.total(), 4);
        assert_eq!(tally.fractions(), vec![0.25, 0.5, 0.25]);
        assert!((tally.fractions().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_majority_ties_keep_class_order() {
        let tally = tally(&[2, 1, 2, 1], 3);
        assert_eq!(tally.majority(), 1);
        assert_eq!(tally.fraction(tally.majority()), 0.5);
    }

    #[test]
    fn test_ranked_is_stable() {
        let tally = tally(&[3, 3, 0, 2], 4);
        let ranked = tally.ranked(3);

        assert_eq!(ranked, vec![(3, 0.5), (0, 0.25), (2, 0.25)]);
    }

    #[test]
    fn test_ranked_includes_unvoted_classes() {
        let tally = tally(&[1, 1], 3);
        assert_eq!(tally.ranked(3), vec![(1, 1.0), (0, 0.0), (2, 0.0)]);
    }

    #[test]
    fn test_empty_tally() {
        let mut tally = VoteTally::new(2);
        tally.record(5);

        assert_eq!(tally.total(), 0);
        assert_eq!(tally.fractions(), vec![0.0, 0.0]);
        assert_eq!(tally.majority(), 0);
    }
}
