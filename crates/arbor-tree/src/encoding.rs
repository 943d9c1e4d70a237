//! Conversions between class labels and one-hot target rows.

use crate::error::TreeError;

/// Encode class labels as a one-hot matrix with `n_classes` columns.
///
/// # Errors
///
/// Returns [`TreeError::LabelOutOfRange`] when a label is `>= n_classes`.
pub fn one_hot_encode(n_classes: usize, labels: &[usize]) -> Result<Vec<Vec<f64>>, TreeError> {
    labels
        .iter()
        .enumerate()
        .map(|(sample_index, &label)| {
            if label >= n_classes {
                return Err(TreeError::LabelOutOfRange {
                    sample_index,
                    label,
                    n_classes,
                });
            }
            let mut row = vec![0.0; n_classes];
            row[label] = 1.0;
            Ok(row)
        })
        .collect()
}

/// Decode each row to the index of its largest entry.
///
/// Ties go to the lowest index; an empty row decodes to 0.
#[must_use]
pub fn one_hot_decode<R: AsRef<[f64]>>(y: &[R]) -> Vec<usize> {
    y.iter().map(|row| argmax(row.as_ref())).collect()
}

/// Convert a single-column target matrix of floats into class labels.
///
/// # Errors
///
/// Returns [`TreeError::InvalidLabel`] for negative, fractional, or
/// non-finite values. The caller checks the column shape beforehand.
pub fn labels_from_column(targets: &[Vec<f64>]) -> Result<Vec<usize>, TreeError> {
    targets
        .iter()
        .enumerate()
        .map(|(sample_index, row)| {
            let value = row.first().copied().unwrap_or(f64::NAN);
            if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
                return Err(TreeError::InvalidLabel {
                    sample_index,
                    value,
                });
            }
            Ok(value as usize)
        })
        .collect()
}

/// Number of distinct labels.
#[must_use]
pub fn count_distinct(labels: &[usize]) -> usize {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Column sums divided by the row count.
///
/// For a one-hot matrix this is the empirical class distribution. Returns an
/// empty vector for an empty subset.
#[must_use]
pub fn class_distribution<R: AsRef<[f64]>>(y: &[R]) -> Vec<f64> {
    let Some(first) = y.first() else {
        return Vec::new();
    };
    let mut sums = vec![0.0f64; first.as_ref().len()];
    for row in y {
        for (s, v) in sums.iter_mut().zip(row.as_ref()) {
            *s += v;
        }
    }
    let n = y.len() as f64;
    sums.iter_mut().for_each(|s| *s /= n);
    sums
}

/// Most frequent decoded label, ties to the lowest label.
#[must_use]
pub fn majority_class<R: AsRef<[f64]>>(y: &[R]) -> usize {
    let labels = one_hot_decode(y);
    let n_bins = labels.iter().max().map_or(0, |&m| m + 1);
    let mut counts = vec![0usize; n_bins];
    for label in labels {
        counts[label] += 1;
    }
    counts
        .iter()
        .enumerate()
        .fold((0usize, 0usize), |best, (label, &count)| {
            if count > best.1 { (label, count) } else { best }
        })
        .0
}

fn argmax(row: &[f64]) -> usize {
    let mut best = 0usize;
    for (i, v) in row.iter().enumerate().skip(1) {
        if *v > row[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_single_one_per_row() {
        let y = one_hot_encode(3, &[2, 0, 1]).unwrap();
        assert_eq!(
            y,
            vec![
                vec![0.0, 0.0, 1.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0]
            ]
        );
    }

    #[test]
    fn encode_label_out_of_range() {
        let err = one_hot_encode(2, &[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            TreeError::LabelOutOfRange {
                sample_index: 2,
                label: 2,
                n_classes: 2
            }
        ));
    }

    #[test]
    fn decode_ties_to_lowest_index() {
        let y = vec![vec![0.5, 0.5, 0.0], vec![0.2, 0.4, 0.4]];
        assert_eq!(one_hot_decode(&y), vec![0, 1]);
    }

    #[test]
    fn decoded_labels_round_trip() {
        let y = vec![
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
        ];
        let decoded = one_hot_decode(&y);
        let again = one_hot_decode(&one_hot_encode(4, &decoded).unwrap());
        assert_eq!(again, decoded);
    }

    #[test]
    fn labels_from_integral_column() {
        let labels = labels_from_column(&[vec![0.0], vec![3.0], vec![1.0]]).unwrap();
        assert_eq!(labels, vec![0, 3, 1]);
    }

    #[test]
    fn labels_reject_fractional_and_negative() {
        let err = labels_from_column(&[vec![0.0], vec![1.5]]).unwrap_err();
        assert!(matches!(err, TreeError::InvalidLabel { sample_index: 1, .. }));

        let err = labels_from_column(&[vec![-1.0]]).unwrap_err();
        assert!(matches!(err, TreeError::InvalidLabel { sample_index: 0, .. }));

        let err = labels_from_column(&[vec![f64::NAN]]).unwrap_err();
        assert!(matches!(err, TreeError::InvalidLabel { .. }));
    }

    #[test]
    fn distinct_count() {
        assert_eq!(count_distinct(&[3, 1, 3, 0, 1]), 3);
        assert_eq!(count_distinct(&[]), 0);
    }

    #[test]
    fn distribution_sums_to_one() {
        let y = one_hot_encode(3, &[0, 0, 1, 2, 2, 2]).unwrap();
        let dist = class_distribution(&y);
        assert_eq!(dist.len(), 3);
        assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((dist[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn majority_prefers_lowest_on_tie() {
        let y = one_hot_encode(3, &[2, 1, 2, 1]).unwrap();
        assert_eq!(majority_class(&y), 1);
    }

    #[test]
    fn majority_of_skewed_subset() {
        let y = one_hot_encode(3, &[0, 2, 2, 1, 2]).unwrap();
        assert_eq!(majority_class(&y), 2);
    }
}
