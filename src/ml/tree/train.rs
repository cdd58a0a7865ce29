use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{DecisionTree, Node, Split};
use crate::ml::{TrainDataset, TrainError};

/// Decision tree hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeOptions {
    /// Maximum depth in edges; the root sits at depth 0.
    pub max_depth: usize,
    /// Nodes with fewer samples than this become leaves.
    pub min_samples_split: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
        }
    }
}

/// Fit a CART tree on every sample, considering every feature at each split.
pub fn train_decision_tree(
    dataset: &TrainDataset,
    options: &TreeOptions,
) -> Result<DecisionTree, TrainError> {
    dataset.validate()?;
    let samples: Vec<usize> = (0..dataset.len()).collect();
    Ok(grow_tree(
        dataset,
        samples,
        options,
        &mut FeatureSampler::All,
    ))
}

/// Which features a node may split on.
pub(crate) enum FeatureSampler<'a> {
    All,
    /// Visit features in random order until `max_features` non-constant ones were scored.
    Random {
        rng: &'a mut StdRng,
        max_features: usize,
    },
}

impl FeatureSampler<'_> {
    fn order(&mut self, n_features: usize) -> (Vec<usize>, usize) {
        let mut order: Vec<usize> = (0..n_features).collect();
        match self {
            FeatureSampler::All => (order, n_features),
            FeatureSampler::Random { rng, max_features } => {
                order.shuffle(&mut **rng);
                (order, (*max_features).clamp(1, n_features.max(1)))
            }
        }
    }
}

/// Grow a tree over `samples`, which may repeat rows (bootstrap).
///
/// The dataset must already be validated.
pub(crate) fn grow_tree(
    dataset: &TrainDataset,
    samples: Vec<usize>,
    options: &TreeOptions,
    sampler: &mut FeatureSampler<'_>,
) -> DecisionTree {
    let n_features = dataset.x.first().map(Vec::len).unwrap_or(0);
    let mut builder = Builder {
        dataset,
        options,
        sampler,
        n_features,
        nodes: Vec::new(),
    };
    builder.build(samples, 0);
    DecisionTree {
        n_features,
        n_classes: dataset.n_classes,
        nodes: builder.nodes,
    }
}

struct Builder<'a, 'b> {
    dataset: &'a TrainDataset,
    options: &'a TreeOptions,
    sampler: &'a mut FeatureSampler<'b>,
    n_features: usize,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    score: f64,
    feature: usize,
    threshold: f32,
}

impl Builder<'_, '_> {
    /// Append the subtree for `samples` in pre-order and return its root index.
    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        let id = self.nodes.len();
        self.nodes.push(Node {
            split: None,
            class_counts: counts.clone(),
        });

        let impure = counts.iter().filter(|&&count| count > 0).count() > 1;
        if !impure
            || depth >= self.options.max_depth
            || samples.len() < self.options.min_samples_split.max(2)
        {
            return id;
        }
        let Some(best) = self.best_split(&samples, &counts) else {
            return id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.dataset.x[i][best.feature] <= best.threshold);
        let left_id = self.build(left, depth + 1);
        let right_id = self.build(right, depth + 1);
        self.nodes[id].split = Some(Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_id,
            right: right_id,
        });
        id
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<u32> {
        let mut counts = vec![0u32; self.dataset.n_classes];
        for &i in samples {
            counts[self.dataset.y[i]] += 1;
        }
        counts
    }

    fn best_split(&mut self, samples: &[usize], counts: &[u32]) -> Option<BestSplit> {
        let (order, max_features) = self.sampler.order(self.n_features);
        let mut best: Option<BestSplit> = None;
        let mut scored = 0usize;
        for feature in order {
            if scored >= max_features {
                break;
            }
            let Some(candidate) = self.best_split_for_feature(samples, counts, feature) else {
                continue;
            };
            scored += 1;
            if best.is_none_or(|current| candidate.score < current.score) {
                best = Some(candidate);
            }
        }
        best
    }

    /// Lowest weighted Gini over all thresholds of one feature; `None` if the feature is
    /// constant across `samples`.
    fn best_split_for_feature(
        &self,
        samples: &[usize],
        counts: &[u32],
        feature: usize,
    ) -> Option<BestSplit> {
        let mut sorted: Vec<(f32, usize)> = samples
            .iter()
            .map(|&i| (self.dataset.x[i][feature], self.dataset.y[i]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = sorted.len() as f64;
        let mut left = vec![0u32; counts.len()];
        let mut right = counts.to_vec();
        let mut best: Option<BestSplit> = None;
        for pos in 0..sorted.len().saturating_sub(1) {
            let (value, label) = sorted[pos];
            left[label] += 1;
            right[label] -= 1;
            let next = sorted[pos + 1].0;
            if next <= value {
                continue;
            }
            let n_left = (pos + 1) as f64;
            let n_right = total - n_left;
            let score = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / total;
            if best.is_none_or(|current| score < current.score) {
                best = Some(BestSplit {
                    score,
                    feature,
                    threshold: midpoint(value, next),
                });
            }
        }
        best
    }
}

fn gini(counts: &[u32], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Threshold between two consecutive distinct values, kept strictly below `hi`.
fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = ((lo as f64 + hi as f64) / 2.0) as f32;
    if mid >= hi || mid < lo { lo } else { mid }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..10 {
            x.push(vec![i as f32 * 0.1, 1.0]);
            y.push(0);
            x.push(vec![2.0 + i as f32 * 0.1, 1.0]);
            y.push(1);
        }
        TrainDataset { n_classes: 2, x, y }
    }

    #[test]
    fn separable_data_gives_single_split() {
        let tree = train_decision_tree(&two_blobs(), &TreeOptions::default()).unwrap();
        assert_eq!(tree.nodes.len(), 3);
        let split = tree.nodes[0].split.unwrap();
        assert_eq!(split.feature, 0);
        assert!(split.threshold > 0.9 && split.threshold < 2.0);
        assert_eq!(tree.nodes[1].class_counts, vec![10, 0]);
        assert_eq!(tree.nodes[2].class_counts, vec![0, 10]);
    }

    #[test]
    fn max_depth_caps_growth() {
        let dataset = TrainDataset {
            n_classes: 2,
            x: (0..16).map(|i| vec![i as f32]).collect(),
            y: (0..16).map(|i| i % 2).collect(),
        };
        let options = TreeOptions {
            max_depth: 2,
            ..TreeOptions::default()
        };
        let tree = train_decision_tree(&dataset, &options).unwrap();
        assert!(tree.depth() <= 2);
        tree.validate().unwrap();

        let deep = train_decision_tree(
            &dataset,
            &TreeOptions {
                max_depth: 32,
                ..TreeOptions::default()
            },
        )
        .unwrap();
        for (row, &label) in dataset.x.iter().zip(dataset.y.iter()) {
            assert_eq!(deep.predict(row), label);
        }
    }

    #[test]
    fn constant_features_leave_a_single_leaf() {
        let dataset = TrainDataset {
            n_classes: 2,
            x: vec![vec![1.0], vec![1.0], vec![1.0]],
            y: vec![0, 1, 1],
        };
        let tree = train_decision_tree(&dataset, &TreeOptions::default()).unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.predict(&[1.0]), 1);
    }

    #[test]
    fn midpoint_stays_below_upper_value() {
        let lo = 1.0f32;
        let hi = f32::from_bits(lo.to_bits() + 1);
        let mid = midpoint(lo, hi);
        assert!(lo <= mid && mid < hi);
        assert_eq!(midpoint(1.0, 2.0), 1.5);
    }

    #[test]
    fn nodes_are_stored_in_pre_order() {
        let dataset = TrainDataset {
            n_classes: 3,
            x: (0..30).map(|i| vec![i as f32, (i % 7) as f32]).collect(),
            y: (0..30).map(|i| (i / 10) as usize).collect(),
        };
        let tree = train_decision_tree(&dataset, &TreeOptions::default()).unwrap();
        tree.validate().unwrap();
        for (idx, node) in tree.nodes.iter().enumerate() {
            if let Some(split) = node.split {
                assert_eq!(split.left, idx + 1);
                assert!(split.right > split.left);
            }
        }
    }
}
