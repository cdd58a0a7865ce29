//! Binary CART decision tree stored as pre-order node arrays.

mod train;

pub use train::{TreeOptions, train_decision_tree};
pub(crate) use train::{FeatureSampler, grow_tree};

use serde::{Deserialize, Serialize};

use super::{Classifier, argmax};

/// Internal-node test: `features[feature] <= threshold` goes left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: usize,
    pub threshold: f32,
    pub left: usize,
    pub right: usize,
}

/// One tree node. Leaves have no split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub split: Option<Split>,
    /// Training samples of each class that reached this node.
    pub class_counts: Vec<u32>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        self.split.is_none()
    }

    /// Majority class at this node; ties go to the lowest label.
    pub fn majority_class(&self) -> usize {
        argmax(&self.class_counts)
    }
}

/// Fitted decision tree. Node 0 is the root and children always follow their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub n_classes: usize,
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    /// Check the node arrays for dangling or backwards child links.
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if node.class_counts.len() != self.n_classes {
                return Err(format!(
                    "Node {idx} has {} class counts, expected {}",
                    node.class_counts.len(),
                    self.n_classes
                ));
            }
            if let Some(split) = node.split {
                for child in [split.left, split.right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("Node {idx} links to invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Index of the leaf a feature vector lands in.
    pub fn leaf_index(&self, features: &[f32]) -> usize {
        let mut idx = 0usize;
        while let Some(split) = self.nodes.get(idx).and_then(|node| node.split) {
            let value = features.get(split.feature).copied().unwrap_or(0.0);
            idx = if value <= split.threshold {
                split.left
            } else {
                split.right
            };
        }
        idx
    }

    /// Predict the class label for a feature vector.
    pub fn predict(&self, features: &[f32]) -> usize {
        self.nodes
            .get(self.leaf_index(features))
            .map(Node::majority_class)
            .unwrap_or(0)
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        fn walk(tree: &DecisionTree, idx: usize) -> usize {
            match tree.nodes[idx].split {
                Some(split) => 1 + walk(tree, split.left).max(walk(tree, split.right)),
                None => 0,
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(self, 0) }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &[f32]) -> usize {
        DecisionTree::predict(self, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f32) -> DecisionTree {
        DecisionTree {
            n_features: 1,
            n_classes: 2,
            nodes: vec![
                Node {
                    split: Some(Split {
                        feature: 0,
                        threshold,
                        left: 1,
                        right: 2,
                    }),
                    class_counts: vec![3, 3],
                },
                Node {
                    split: None,
                    class_counts: vec![3, 0],
                },
                Node {
                    split: None,
                    class_counts: vec![0, 3],
                },
            ],
        }
    }

    #[test]
    fn threshold_is_inclusive_on_the_left() {
        let tree = stump(0.5);
        assert_eq!(tree.predict(&[0.4]), 0);
        assert_eq!(tree.predict(&[0.5]), 0);
        assert_eq!(tree.predict(&[0.6]), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn tied_leaf_counts_pick_lowest_class() {
        let node = Node {
            split: None,
            class_counts: vec![0, 2, 2],
        };
        assert_eq!(node.majority_class(), 1);
    }

    #[test]
    fn validate_rejects_backward_links() {
        let mut tree = stump(0.5);
        tree.validate().unwrap();
        if let Some(split) = tree.nodes[0].split.as_mut() {
            split.right = 0;
        }
        assert!(tree.validate().is_err());
    }
}
