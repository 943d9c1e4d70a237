use std::str::FromStr;

use tracing::{debug, instrument, trace};

use crate::{
    TreeError,
    criterion::{Criterion, mean},
    encoding::{
        class_distribution, count_distinct, labels_from_column, majority_class, one_hot_encode,
    },
    node::{Impurity, LeafValue, Node, NodeIndex},
    split::{choose_best_split, goes_left},
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default                     |
/// |---------------------|-----------------------------|
/// | `criterion`         | `Gini`                      |
/// | `n_classes`         | `None` (distinct label count) |
/// | `max_depth`         | `None` (unlimited)          |
/// | `min_samples_split` | 2                           |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: Criterion,
    pub(crate) n_classes: Option<usize>,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    ///
    /// All parameters use the defaults shown in the struct-level documentation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Gini,
            n_classes: None,
            max_depth: None,
            min_samples_split: 2,
        }
    }

    /// Set the split quality criterion, which also selects classification or
    /// regression.
    #[must_use]
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the criterion by name: `gini`, `entropy`, `variance` or `mad_median`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownCriterion`] for any other name.
    pub fn with_criterion_name(self, name: &str) -> Result<Self, TreeError> {
        Ok(self.with_criterion(Criterion::from_str(name)?))
    }

    /// Override the number of classes.
    ///
    /// `None` infers it from the number of distinct training labels. Ignored
    /// by regression criteria.
    #[must_use]
    pub fn with_n_classes(mut self, n_classes: Option<usize>) -> Self {
        self.n_classes = n_classes;
        self
    }

    /// Set the maximum tree depth.
    ///
    /// `None` means grow until no split is possible. `Some(d)` limits depth
    /// to `d` levels (root is depth 0, so `Some(0)` yields a single leaf).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples on each side of an accepted split.
    ///
    /// Nodes with fewer than `2 * min_samples_split` samples become leaves.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    // --- Getters ---

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Return the class count override, if any.
    #[must_use]
    pub fn n_classes(&self) -> Option<usize> {
        self.n_classes
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum samples required on each side of a split.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Train a decision tree on the provided row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` is row-major. `targets` is a column:
    /// `targets[sample_idx]` holds exactly one value, a zero-based class label
    /// for classification criteria or the regression target otherwise.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                              |
    /// |--------------------------------------|---------------------------------------------------|
    /// | [`TreeError::InvalidMinSamplesSplit`]| `min_samples_split` is zero                       |
    /// | [`TreeError::InvalidClassCount`]     | `n_classes` is `Some(0)`                          |
    /// | [`TreeError::EmptyDataset`]          | `features` is empty                               |
    /// | [`TreeError::LengthMismatch`]        | `features` and `targets` differ in length         |
    /// | [`TreeError::TargetShape`]           | a target row does not hold exactly one value      |
    /// | [`TreeError::ZeroFeatures`]          | rows have zero feature columns                    |
    /// | [`TreeError::FeatureCountMismatch`]  | rows have inconsistent lengths                    |
    /// | [`TreeError::NonFiniteValue`]        | any feature value is NaN or infinite              |
    /// | [`TreeError::InvalidLabel`]          | a class target is not a non-negative integer      |
    /// | [`TreeError::LabelOutOfRange`]       | a class label is `>= n_classes`                   |
    /// | [`TreeError::NonFiniteTarget`]       | a regression target is NaN or infinite            |
    #[instrument(
        skip(self, features, targets),
        fields(n_samples = features.len(), criterion = %self.criterion)
    )]
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        targets: &[Vec<f64>],
    ) -> Result<DecisionTree, TreeError> {
        // --- Validate config ---
        if self.min_samples_split == 0 {
            return Err(TreeError::InvalidMinSamplesSplit {
                min_samples_split: 0,
            });
        }

        if let Some(n_classes) = self.n_classes
            && n_classes == 0
        {
            return Err(TreeError::InvalidClassCount { n_classes });
        }

        // --- Validate inputs ---
        if features.is_empty() {
            return Err(TreeError::EmptyDataset);
        }

        if features.len() != targets.len() {
            return Err(TreeError::LengthMismatch {
                n_features_rows: features.len(),
                n_target_rows: targets.len(),
            });
        }

        for (sample_index, row) in targets.iter().enumerate() {
            if row.len() != 1 {
                return Err(TreeError::TargetShape {
                    sample_index,
                    got: row.len(),
                });
            }
        }

        let n_samples = features.len();
        let n_features = features[0].len();

        if n_features == 0 {
            return Err(TreeError::ZeroFeatures);
        }

        for (sample_index, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(TreeError::FeatureCountMismatch {
                    expected: n_features,
                    got: row.len(),
                    sample_index,
                });
            }
            for (feature_index, &val) in row.iter().enumerate() {
                if !val.is_finite() {
                    return Err(TreeError::NonFiniteValue {
                        sample_index,
                        feature_index,
                    });
                }
            }
        }

        // --- Target representation ---
        let (encoded, n_classes) = if self.criterion.is_classification() {
            let labels = labels_from_column(targets)?;
            let n_classes = self.n_classes.unwrap_or_else(|| count_distinct(&labels));
            (one_hot_encode(n_classes, &labels)?, Some(n_classes))
        } else {
            if let Some(sample_index) = targets.iter().position(|row| !row[0].is_finite()) {
                return Err(TreeError::NonFiniteTarget { sample_index });
            }
            (targets.to_vec(), None)
        };

        debug!(
            n_samples = n_samples,
            n_features = n_features,
            n_classes = ?n_classes,
            max_depth = ?self.max_depth,
            min_samples_split = self.min_samples_split,
            "fitting decision tree"
        );

        // Convert to column-major layout for choose_best_split.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let sample_indices: Vec<usize> = (0..n_samples).collect();
        let mut arena: Vec<Node> = Vec::new();

        let root = build_tree(
            &col_features,
            &encoded,
            &sample_indices,
            self,
            0,
            &mut arena,
        );

        let tree = DecisionTree {
            nodes: arena,
            n_features,
            n_classes,
            criterion: self.criterion,
        };

        debug!(
            root_index = root.index(),
            n_nodes = tree.n_nodes(),
            n_leaves = tree.n_leaves(),
            depth = tree.depth(),
            "decision tree built"
        );

        Ok(tree)
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively build the arena-based decision tree.
///
/// `depth` is the depth of the node about to be created. Returns the
/// [`NodeIndex`] of that node in `arena`.
fn build_tree(
    col_features: &[Vec<f64>],
    targets: &[Vec<f64>],
    sample_indices: &[usize],
    config: &DecisionTreeConfig,
    depth: usize,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let subset: Vec<&[f64]> = sample_indices
        .iter()
        .map(|&si| targets[si].as_slice())
        .collect();
    let impurity = config.criterion.impurity(&subset);

    // Stopping conditions → leaf.
    let depth_exceeded = config.max_depth.is_some_and(|max_d| depth >= max_d);
    let too_few = n_samples < config.min_samples_split.saturating_mul(2);

    if depth_exceeded || too_few {
        return push_leaf(arena, config.criterion, &subset, impurity, depth);
    }

    let Some(split) = choose_best_split(
        col_features,
        targets,
        sample_indices,
        config.criterion,
        config.min_samples_split,
    ) else {
        return push_leaf(arena, config.criterion, &subset, impurity, depth);
    };

    // Arena pattern: reserve index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        value: LeafValue::Mean(0.0),
        impurity,
        n_samples,
    });

    let left = build_tree(
        col_features,
        targets,
        &split.left_indices,
        config,
        depth + 1,
        arena,
    );
    let right = build_tree(
        col_features,
        targets,
        &split.right_indices,
        config,
        depth + 1,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        impurity,
        n_samples,
        gain: split.gain,
    };

    NodeIndex::new(node_idx)
}

fn push_leaf(
    arena: &mut Vec<Node>,
    criterion: Criterion,
    subset: &[&[f64]],
    impurity: Impurity,
    depth: usize,
) -> NodeIndex {
    let value = if criterion.is_classification() {
        LeafValue::Class {
            label: majority_class(subset),
            distribution: class_distribution(subset),
        }
    } else {
        LeafValue::Mean(mean(subset))
    };
    trace!(depth, n_samples = subset.len(), value = ?value, "leaf");

    let idx = arena.len();
    arena.push(Node::Leaf {
        value,
        impurity,
        n_samples: subset.len(),
    });
    NodeIndex::new(idx)
}

/// A fitted CART decision tree.
///
/// Stored as an arena-based `Vec<Node>` with the root at index 0. The tree is
/// never modified after [`DecisionTreeConfig::fit`] returns it.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: Option<usize>,
    pub(crate) criterion: Criterion,
}

impl DecisionTree {
    /// Return the criterion the tree was fitted with.
    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Return `true` if the tree predicts class labels.
    #[must_use]
    pub fn is_classifier(&self) -> bool {
        self.criterion.is_classification()
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes, or `None` for a regression tree.
    #[must_use]
    pub fn n_classes(&self) -> Option<usize> {
        self.n_classes
    }

    /// Return all nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Return the node at `index`, if it exists.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.index())
    }

    /// Compute gain-based feature importances.
    ///
    /// Each `Split` node contributes `gain * n_samples` to its feature, then
    /// the totals are normalized so they sum to 1.0. Returns a `Vec` of length
    /// `n_features`; all zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                gain,
                n_samples,
                ..
            } = node
            {
                totals[feature.index()] += gain * *n_samples as f64;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];

        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }

        max_depth
    }

    /// Traverse the tree from the root and return the leaf reached by `sample`.
    ///
    /// At each `Split`, goes left when `sample[feature] < threshold` and
    /// right otherwise.
    pub(crate) fn traverse(&self, sample: &[f64]) -> &LeafValue {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if goes_left(sample[feature.index()], *threshold) {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    fn separable() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let features = vec![
            vec![0.0],
            vec![1.0],
            vec![2.0],
            vec![10.0],
            vec![11.0],
            vec![12.0],
        ];
        (features, column(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]))
    }

    fn leaf_distributions(tree: &DecisionTree) -> Vec<&Vec<f64>> {
        tree.nodes()
            .iter()
            .filter_map(|n| match n.leaf_value() {
                Some(LeafValue::Class { distribution, .. }) => Some(distribution),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_dataset_error() {
        let err = DecisionTreeConfig::new().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));
    }

    #[test]
    fn unknown_criterion_name_fails_fast() {
        let err = DecisionTreeConfig::new()
            .with_criterion_name("friedman_mse")
            .unwrap_err();
        assert!(matches!(err, TreeError::UnknownCriterion { .. }));
    }

    #[test]
    fn criterion_name_selects_task() {
        let cfg = DecisionTreeConfig::new()
            .with_criterion_name("mad_median")
            .unwrap();
        assert_eq!(cfg.criterion(), Criterion::MadMedian);
        assert!(!cfg.criterion().is_classification());
    }

    #[test]
    fn length_mismatch_error() {
        let (features, _) = separable();
        let err = DecisionTreeConfig::new()
            .fit(&features, &column(&[0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::LengthMismatch {
                n_features_rows: 6,
                n_target_rows: 2
            }
        ));
    }

    #[test]
    fn target_must_be_a_column() {
        let features = vec![vec![1.0], vec![2.0]];
        let targets = vec![vec![0.0], vec![1.0, 0.0]];
        let err = DecisionTreeConfig::new().fit(&features, &targets).unwrap_err();
        assert!(matches!(
            err,
            TreeError::TargetShape {
                sample_index: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn feature_count_mismatch_error() {
        let features = vec![vec![1.0, 2.0], vec![3.0]];
        let err = DecisionTreeConfig::new()
            .fit(&features, &column(&[0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, TreeError::FeatureCountMismatch { .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let features = vec![vec![1.0, f64::NAN], vec![3.0, 4.0]];
        let err = DecisionTreeConfig::new()
            .fit(&features, &column(&[0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::NonFiniteValue {
                sample_index: 0,
                feature_index: 1
            }
        ));
    }

    #[test]
    fn non_finite_regression_target_error() {
        let features = vec![vec![1.0], vec![2.0]];
        let err = DecisionTreeConfig::new()
            .with_criterion(Criterion::Variance)
            .fit(&features, &column(&[1.0, f64::INFINITY]))
            .unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteTarget { sample_index: 1 }));
    }

    #[test]
    fn zero_min_samples_split_rejected() {
        let (features, targets) = separable();
        let err = DecisionTreeConfig::new()
            .with_min_samples_split(0)
            .fit(&features, &targets)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinSamplesSplit { .. }));
    }

    #[test]
    fn inferred_class_count_rejects_gapped_labels() {
        // Two distinct labels are inferred as two classes, so label 2 is out of range.
        let features = vec![vec![1.0], vec![2.0], vec![3.0]];
        let err = DecisionTreeConfig::new()
            .fit(&features, &column(&[0.0, 2.0, 2.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::LabelOutOfRange {
                label: 2,
                n_classes: 2,
                ..
            }
        ));
    }

    #[test]
    fn class_count_override_widens_distribution() {
        let (features, targets) = separable();
        let tree = DecisionTreeConfig::new()
            .with_n_classes(Some(4))
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(tree.n_classes(), Some(4));
        for dist in leaf_distributions(&tree) {
            assert_eq!(dist.len(), 4);
        }
    }

    #[test]
    fn separable_data_single_split() {
        let (features, targets) = separable();
        let tree = DecisionTreeConfig::new().fit(&features, &targets).unwrap();

        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert!(tree.node(NodeIndex::new(3)).is_none());
        match tree.root() {
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                assert_eq!(feature.index(), 0);
                assert!(*threshold > 2.0 && *threshold <= 10.0);
                assert!(tree.node(*left).is_some_and(Node::is_leaf));
                assert_eq!(tree.node(*right).map(Node::n_samples), Some(3));
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn leaf_distributions_sum_to_one() {
        let features: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![f64::from(i % 7), f64::from(i)])
            .collect();
        let targets: Vec<Vec<f64>> = (0..30).map(|i| vec![f64::from(i % 3)]).collect();
        let tree = DecisionTreeConfig::new()
            .with_criterion(Criterion::Entropy)
            .with_min_samples_split(1)
            .fit(&features, &targets)
            .unwrap();
        for dist in leaf_distributions(&tree) {
            assert_eq!(dist.len(), 3);
            assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn max_depth_zero_is_single_leaf() {
        let (features, targets) = separable();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn max_depth_limits_tree() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![f64::from(i)]).collect();
        let targets: Vec<Vec<f64>> = (0..16).map(|i| vec![f64::from(i % 2)]).collect();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(2))
            .with_min_samples_split(1)
            .fit(&features, &targets)
            .unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn small_subset_becomes_leaf() {
        // 5 samples < 2 * 3, so the root never tries to split.
        let features: Vec<Vec<f64>> = (1..=5).map(|i| vec![f64::from(i)]).collect();
        let tree = DecisionTreeConfig::new()
            .with_min_samples_split(3)
            .fit(&features, &column(&[0.0, 0.0, 1.0, 1.0, 1.0]))
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert!(matches!(
            tree.root().leaf_value(),
            Some(LeafValue::Class { label: 1, .. })
        ));
    }

    #[test]
    fn constant_regression_target_single_leaf() {
        let features = vec![vec![1.0, 9.0], vec![2.0, 8.0], vec![3.0, 7.0], vec![4.0, 6.0]];
        let tree = DecisionTreeConfig::new()
            .with_criterion(Criterion::Variance)
            .with_min_samples_split(1)
            .fit(&features, &column(&[5.0, 5.0, 5.0, 5.0]))
            .unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.root().leaf_value(), Some(&LeafValue::Mean(5.0)));
        assert_eq!(tree.n_classes(), None);
    }

    #[test]
    fn regression_leaves_hold_means() {
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i)]).collect();
        let targets = column(&[1.0, 2.0, 1.0, 2.0, 10.0, 11.0, 10.0, 11.0]);
        let tree = DecisionTreeConfig::new()
            .with_criterion(Criterion::Variance)
            .with_max_depth(Some(1))
            .fit(&features, &targets)
            .unwrap();
        let means: Vec<f64> = tree
            .nodes()
            .iter()
            .filter_map(|n| match n.leaf_value() {
                Some(LeafValue::Mean(m)) => Some(*m),
                _ => None,
            })
            .collect();
        assert_eq!(means, vec![1.5, 10.5]);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let features = vec![
            vec![0.0, 100.0],
            vec![1.0, 200.0],
            vec![2.0, 300.0],
            vec![10.0, 100.0],
            vec![11.0, 200.0],
            vec![12.0, 300.0],
        ];
        let (_, targets) = separable();
        let tree = DecisionTreeConfig::new().fit(&features, &targets).unwrap();
        let importances = tree.feature_importances();
        assert_eq!(importances, vec![1.0, 0.0]);
    }

    #[test]
    fn single_leaf_importances_are_zero() {
        let (features, targets) = separable();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(Some(0))
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(tree.feature_importances(), vec![0.0]);
    }
}
