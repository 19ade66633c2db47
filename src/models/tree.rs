//! CART classification tree with gini impurity.

use crate::feature_extractor::FeatureVector;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Splits must reduce impurity by more than this
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features evaluated per node
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        class: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Decision tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct TrainingSet<'a> {
    rows: &'a [FeatureVector],
    labels: &'a [usize],
    n_classes: usize,
}

struct Split {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl DecisionTree {
    /// Grow a tree on `sample`, a list of row indices that may repeat.
    ///
    /// `rng` decides the order in which candidate features are visited.
    pub fn fit<R: Rng + ?Sized>(
        rows: &[FeatureVector],
        labels: &[usize],
        n_classes: usize,
        sample: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let data = TrainingSet {
            rows,
            labels,
            n_classes,
        };
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(&data, sample, 0, params, rng);
        tree
    }

    /// Class predicted for a feature row, or `None` if the walk leaves the
    /// arena or visits more nodes than it holds.
    ///
    /// Missing columns read as zero; callers enforce the width.
    pub fn predict(&self, features: &[f64]) -> Option<usize> {
        let mut idx = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx)? {
                Node::Leaf { class } => return Some(*class),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(0.0);
                    idx = if value <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Depth of the deepest leaf (a single leaf has depth 0)
    ///
    /// Visits at most `node_count` nodes.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0, 0)];
        let mut visited = 0;
        while let Some((idx, depth)) = stack.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                break;
            }
            deepest = deepest.max(depth);
            if let Some(Node::Split { left, right, .. }) = self.nodes.get(idx) {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        deepest
    }

    /// Two splits pointing at each other, as a corrupt blob could decode.
    #[cfg(test)]
    pub(crate) fn cyclic() -> Self {
        let split = |next| Node::Split {
            feature: 0,
            threshold: 0.5,
            left: next,
            right: next,
        };
        Self {
            nodes: vec![split(1), split(0)],
        }
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        data: &TrainingSet<'_>,
        sample: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> usize {
        let counts = class_counts(data, &sample);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            class: majority(&counts),
        });

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth >= params.max_depth || sample.len() < params.min_samples_split {
            return id;
        }

        let Some(split) = best_split(data, &sample, &counts, params, rng) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = sample
            .into_iter()
            .partition(|&i| data.rows[i].as_slice()[split.feature] <= split.threshold);

        let left = self.grow(data, left, depth + 1, params, rng);
        let right = self.grow(data, right, depth + 1, params, rng);

        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

fn class_counts(data: &TrainingSet<'_>, sample: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; data.n_classes];
    for &i in sample {
        counts[data.labels[i]] += 1;
    }
    counts
}

/// Most frequent class, lowest index on ties
fn majority(counts: &[usize]) -> usize {
    counts
        .iter()
        .enumerate()
        .fold((0, 0), |best, (class, &count)| {
            if count > best.1 {
                (class, count)
            } else {
                best
            }
        })
        .0
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / total).powi(2)).sum::<f64>()
}

/// Best gini split over up to `max_features` non-constant features.
///
/// Constant features do not count toward the limit, so a node with any
/// variation left always gets a chance to split.
fn best_split<R: Rng + ?Sized>(
    data: &TrainingSet<'_>,
    sample: &[usize],
    counts: &[usize],
    params: &TreeParams,
    rng: &mut R,
) -> Option<Split> {
    let total = sample.len();
    let n_features = data.rows[sample[0]].len();
    let parent = gini(counts, total);

    let mut order: Vec<usize> = (0..n_features).collect();
    order.shuffle(rng);

    let mut best: Option<Split> = None;
    let mut evaluated = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(total);

    for feature in order {
        if evaluated >= params.max_features {
            break;
        }

        column.clear();
        column.extend(
            sample
                .iter()
                .map(|&i| (data.rows[i].as_slice()[feature], data.labels[i])),
        );
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[total - 1].0 {
            continue;
        }
        evaluated += 1;

        let mut left = vec![0; data.n_classes];
        let mut right = counts.to_vec();

        for pos in 1..total {
            let (value, label) = column[pos - 1];
            left[label] += 1;
            right[label] -= 1;

            let next = column[pos].0;
            if next <= value {
                continue;
            }
            if pos < params.min_samples_leaf || total - pos < params.min_samples_leaf {
                continue;
            }

            let impurity = (pos as f64 * gini(&left, pos)
                + (total - pos) as f64 * gini(&right, total - pos))
                / total as f64;
            let decrease = parent - impurity;

            let improves = best.as_ref().map_or(true, |b| decrease > b.decrease);
            if decrease > MIN_IMPURITY_DECREASE && improves {
                let mid = value / 2.0 + next / 2.0;
                best = Some(Split {
                    feature,
                    threshold: if mid < next { mid } else { value },
                    decrease,
                });
            }
        }
    }

    best
}
