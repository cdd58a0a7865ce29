//! Bagged ensemble of CART trees with hard majority voting.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, FeatureSampler, TreeOptions, grow_tree};
use super::{Classifier, TrainDataset, TrainError, argmax};

/// Random forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOptions {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features scored per split; `None` means `floor(sqrt(n_features))`.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for ForestOptions {
    fn default() -> Self {
        Self {
            n_estimators: 5,
            max_depth: 4,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
        }
    }
}

/// Fitted forest. Prediction is a vote over per-tree classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub n_classes: usize,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Votes per class for a feature vector.
    pub fn votes(&self, features: &[f32]) -> Vec<u32> {
        let mut votes = vec![0u32; self.n_classes];
        for tree in &self.trees {
            if let Some(slot) = votes.get_mut(tree.predict(features)) {
                *slot += 1;
            }
        }
        votes
    }

    /// Majority vote; ties go to the lowest class index.
    pub fn predict(&self, features: &[f32]) -> usize {
        argmax(&self.votes(features))
    }
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[f32]) -> usize {
        RandomForest::predict(self, features)
    }
}

/// Fit `n_estimators` trees, each on a bootstrap resample with per-split feature sampling.
pub fn train_random_forest(
    dataset: &TrainDataset,
    options: &ForestOptions,
) -> Result<RandomForest, TrainError> {
    let n_features = dataset.validate()?;
    if options.n_estimators == 0 {
        return Err(TrainError::InvalidOption(
            "n_estimators must be at least 1".to_string(),
        ));
    }
    let max_features = options
        .max_features
        .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
        .max(1);
    let tree_options = TreeOptions {
        max_depth: options.max_depth,
        min_samples_split: options.min_samples_split,
    };

    let n = dataset.len();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.n_estimators);
    for _ in 0..options.n_estimators {
        let samples: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
        let mut tree_rng = StdRng::seed_from_u64(rng.random::<u64>());
        let mut sampler = FeatureSampler::Random {
            rng: &mut tree_rng,
            max_features,
        };
        trees.push(grow_tree(dataset, samples, &tree_options, &mut sampler));
    }
    tracing::debug!(
        "Trained random forest: {} trees, max_features={}",
        trees.len(),
        max_features
    );
    Ok(RandomForest {
        n_features,
        n_classes: dataset.n_classes,
        trees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::tree::{Node, Split};

    fn leaf(class: usize, n_classes: usize) -> DecisionTree {
        let mut counts = vec![0u32; n_classes];
        counts[class] = 1;
        DecisionTree {
            n_features: 1,
            n_classes,
            nodes: vec![Node {
                split: None,
                class_counts: counts,
            }],
        }
    }

    #[test]
    fn tied_votes_go_to_lowest_class() {
        let forest = RandomForest {
            n_features: 1,
            n_classes: 3,
            trees: vec![leaf(2, 3), leaf(1, 3), leaf(2, 3), leaf(1, 3)],
        };
        assert_eq!(forest.votes(&[0.0]), vec![0, 2, 2]);
        assert_eq!(forest.predict(&[0.0]), 1);
    }

    #[test]
    fn votes_follow_each_tree() {
        let split_tree = DecisionTree {
            n_features: 1,
            n_classes: 2,
            nodes: vec![
                Node {
                    split: Some(Split {
                        feature: 0,
                        threshold: 0.0,
                        left: 1,
                        right: 2,
                    }),
                    class_counts: vec![1, 1],
                },
                Node {
                    split: None,
                    class_counts: vec![1, 0],
                },
                Node {
                    split: None,
                    class_counts: vec![0, 1],
                },
            ],
        };
        let forest = RandomForest {
            n_features: 1,
            n_classes: 2,
            trees: vec![split_tree.clone(), split_tree, leaf(1, 2)],
        };
        assert_eq!(forest.predict(&[-1.0]), 0);
        assert_eq!(forest.predict(&[1.0]), 1);
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let dataset = TrainDataset {
            n_classes: 2,
            x: (0..40)
                .map(|i| vec![i as f32, (i * 7 % 11) as f32, (i % 3) as f32, 1.0])
                .collect(),
            y: (0..40).map(|i| usize::from(i >= 20)).collect(),
        };
        let options = ForestOptions::default();
        let a = train_random_forest(&dataset, &options).unwrap();
        let b = train_random_forest(&dataset, &options).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.trees.len(), 5);
        for tree in &a.trees {
            tree.validate().unwrap();
            assert!(tree.depth() <= options.max_depth);
        }
    }

    #[test]
    fn zero_estimators_is_rejected() {
        let dataset = TrainDataset {
            n_classes: 2,
            x: vec![vec![0.0], vec![1.0]],
            y: vec![0, 1],
        };
        let options = ForestOptions {
            n_estimators: 0,
            ..ForestOptions::default()
        };
        assert!(matches!(
            train_random_forest(&dataset, &options),
            Err(TrainError::InvalidOption(_))
        ));
    }
}
