//! Impurity criteria for classification and regression subsets.
//!
//! Classification criteria read a one-hot matrix (one row per sample, one
//! column per class). Regression criteria read the first column of each row
//! as the scalar target.

use std::fmt;
use std::str::FromStr;

use crate::encoding::class_distribution;
use crate::error::TreeError;
use crate::node::Impurity;

/// Added inside the logarithm of [`entropy`] so empty classes stay finite.
pub const ENTROPY_EPS: f64 = 0.0005;

/// Criterion for measuring the quality of a split.
///
/// The criterion also decides the task: [`Criterion::Gini`] and
/// [`Criterion::Entropy`] build classifiers, [`Criterion::Variance`] and
/// [`Criterion::MadMedian`] build regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · log2(p_i + ε))
    Entropy,
    /// Mean squared deviation from the mean.
    Variance,
    /// Mean absolute deviation from the median.
    MadMedian,
}

impl Criterion {
    /// All criteria, in the order their names are listed in error messages.
    pub const ALL: [Criterion; 4] = [
        Criterion::Gini,
        Criterion::Entropy,
        Criterion::Variance,
        Criterion::MadMedian,
    ];

    /// Return `true` for classification criteria.
    #[must_use]
    pub fn is_classification(self) -> bool {
        matches!(self, Criterion::Gini | Criterion::Entropy)
    }

    /// Return the canonical lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
            Criterion::Variance => "variance",
            Criterion::MadMedian => "mad_median",
        }
    }

    /// Compute the impurity of a subset of target rows.
    ///
    /// `y` must be one-hot rows for classification criteria and single-value
    /// rows for regression criteria.
    #[must_use]
    pub fn impurity<R: AsRef<[f64]>>(self, y: &[R]) -> Impurity {
        let value = match self {
            Criterion::Gini => gini(y),
            Criterion::Entropy => entropy(y),
            Criterion::Variance => variance(y),
            Criterion::MadMedian => mad_median(y),
        };
        Impurity::new(value)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Criterion {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Criterion::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| TreeError::UnknownCriterion {
                name: s.to_string(),
            })
    }
}

/// Gini impurity of a one-hot matrix: `1 - Σ p_i²`.
///
/// Returns 0.0 for an empty subset.
#[must_use]
pub fn gini<R: AsRef<[f64]>>(y: &[R]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = class_distribution(y).iter().map(|p| p * p).sum();
    1.0 - sum_sq
}

/// Entropy of a one-hot matrix in bits: `-Σ p_i · log2(p_i + ε)`.
///
/// Returns 0.0 for an empty subset.
#[must_use]
pub fn entropy<R: AsRef<[f64]>>(y: &[R]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    -class_distribution(y)
        .iter()
        .map(|&p| p * (p + ENTROPY_EPS).log2())
        .sum::<f64>()
}

/// Mean squared deviation of the scalar targets from their mean.
///
/// Returns 0.0 for an empty subset.
#[must_use]
pub fn variance<R: AsRef<[f64]>>(y: &[R]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let n = y.len() as f64;
    let mean = y.iter().map(|row| scalar(row)).sum::<f64>() / n;
    y.iter()
        .map(|row| {
            let d = scalar(row) - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

/// Mean absolute deviation of the scalar targets from their median.
///
/// Returns 0.0 for an empty subset.
#[must_use]
pub fn mad_median<R: AsRef<[f64]>>(y: &[R]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let mut values: Vec<f64> = y.iter().map(|row| scalar(row)).collect();
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    values.iter().map(|v| (v - median).abs()).sum::<f64>() / values.len() as f64
}

/// Mean of the scalar targets. Returns 0.0 for an empty subset.
#[must_use]
pub(crate) fn mean<R: AsRef<[f64]>>(y: &[R]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    y.iter().map(|row| scalar(row)).sum::<f64>() / y.len() as f64
}

fn scalar<R: AsRef<[f64]>>(row: &R) -> f64 {
    row.as_ref().first().copied().unwrap_or(0.0)
}
