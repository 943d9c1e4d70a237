//! Single CART decision tree: fit, inspect, predict.
//!
//! Builds one binary tree by exhaustive threshold search. Classification
//! trees use Gini impurity or entropy over one-hot targets and store class
//! distributions in their leaves; regression trees use variance or mean
//! absolute deviation from the median and store subset means.

mod criterion;
mod encoding;
mod error;
mod node;
mod predict;
mod split;
mod tree;

pub use criterion::{Criterion, ENTROPY_EPS, entropy, gini, mad_median, variance};
pub use encoding::{
    class_distribution, count_distinct, labels_from_column, majority_class, one_hot_decode,
    one_hot_encode,
};
pub use error::TreeError;
pub use node::{FeatureIndex, Impurity, LeafValue, Node, NodeIndex};
pub use predict::Prediction;
pub use split::{SplitResult, choose_best_split, goes_left, partition};
pub use tree::{DecisionTree, DecisionTreeConfig};
