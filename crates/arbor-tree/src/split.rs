use tracing::trace;

use crate::criterion::Criterion;
use crate::encoding::class_distribution;
use crate::node::FeatureIndex;

/// Best split found for a node.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Feature used for the split.
    pub feature: FeatureIndex,
    /// Threshold value: samples with feature < threshold go left.
    pub threshold: f64,
    /// Information gain `H(parent) - w_l·H(left) - w_r·H(right)`.
    pub gain: f64,
    /// Sample indices going to the left child.
    pub left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub right_indices: Vec<usize>,
}

/// The split rule: a value goes to the left child when it is below the threshold.
#[inline]
#[must_use]
pub fn goes_left(value: f64, threshold: f64) -> bool {
    value < threshold
}

/// Split `sample_indices` by one feature column.
///
/// A sample goes left when `column[sample] < threshold` and right otherwise.
/// Relative order of the indices is preserved on both sides.
#[must_use]
pub fn partition(
    column: &[f64],
    sample_indices: &[usize],
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    sample_indices
        .iter()
        .partition(|&&si| goes_left(column[si], threshold))
}

/// Find the split with the largest information gain by exhaustive search.
///
/// For every feature, each distinct value of the subset except the smallest
/// and the largest is tried as a threshold. A candidate is kept only when both
/// sides hold at least `min_samples_split` samples, and it replaces the best
/// so far only on strictly larger gain, so ties resolve to the lowest feature
/// index and then the lowest threshold.
///
/// Returns `None` when no candidate has positive gain. Classification subsets
/// made of a single class are not searched at all.
///
/// # Column-major layout
///
/// `col_features` is column-major: `col_features[feature_idx][sample_idx]`.
/// `targets[sample_idx]` is a one-hot row for classification criteria and a
/// single-value row for regression criteria. `sample_indices` index both.
#[must_use]
pub fn choose_best_split(
    col_features: &[Vec<f64>],
    targets: &[Vec<f64>],
    sample_indices: &[usize],
    criterion: Criterion,
    min_samples_split: usize,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples == 0 || col_features.is_empty() {
        return None;
    }

    let parent: Vec<&[f64]> = sample_indices
        .iter()
        .map(|&si| targets[si].as_slice())
        .collect();

    if criterion.is_classification() {
        let max_fraction = class_distribution(&parent)
            .into_iter()
            .fold(0.0f64, f64::max);
        if max_fraction == 1.0 {
            return None;
        }
    }

    let parent_impurity = criterion.impurity(&parent).value();
    let n = n_samples as f64;

    let mut best_gain = 0.0f64;
    let mut best: Option<(FeatureIndex, f64)> = None;
    let mut left_y: Vec<&[f64]> = Vec::with_capacity(n_samples);
    let mut right_y: Vec<&[f64]> = Vec::with_capacity(n_samples);

    for (feat_idx, column) in col_features.iter().enumerate() {
        let mut values: Vec<f64> = sample_indices.iter().map(|&si| column[si]).collect();
        values.sort_unstable_by(f64::total_cmp);
        values.dedup();

        // Min and max are never thresholds, so fewer than 3 distinct values
        // leaves nothing to try.
        if values.len() < 3 {
            continue;
        }

        for &threshold in &values[1..values.len() - 1] {
            left_y.clear();
            right_y.clear();
            for &si in sample_indices {
                if goes_left(column[si], threshold) {
                    left_y.push(&targets[si]);
                } else {
                    right_y.push(&targets[si]);
                }
            }

            let (n_left, n_right) = (left_y.len(), right_y.len());
            if n_left < min_samples_split || n_right < min_samples_split {
                continue;
            }

            let gain = parent_impurity
                - criterion.impurity(&left_y).value() * (n_left as f64 / n)
                - criterion.impurity(&right_y).value() * (n_right as f64 / n);

            if gain > best_gain {
                best_gain = gain;
                best = Some((FeatureIndex::new(feat_idx), threshold));
            }
        }
    }

    let (feature, threshold) = best?;
    let (left_indices, right_indices) =
        partition(&col_features[feature.index()], sample_indices, threshold);

    trace!(
        feature = feature.index(),
        threshold,
        gain = best_gain,
        n_left = left_indices.len(),
        n_right = right_indices.len(),
        "best split"
    );

    Some(SplitResult {
        feature,
        threshold,
        gain: best_gain,
        left_indices,
        right_indices,
    })
}
