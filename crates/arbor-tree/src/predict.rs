//! Prediction methods for a fitted decision tree.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::TreeError;
use crate::node::LeafValue;
use crate::tree::DecisionTree;

/// Output of a single prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    /// Predicted class label of a classification tree.
    Class(usize),
    /// Predicted target of a regression tree.
    Value(f64),
}

impl Prediction {
    /// Return the class label, or `None` for a regression prediction.
    #[must_use]
    pub fn class(self) -> Option<usize> {
        match self {
            Prediction::Class(label) => Some(label),
            Prediction::Value(_) => None,
        }
    }

    /// Return the prediction as a single column value.
    ///
    /// Class labels are converted to `f64`.
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            Prediction::Class(label) => label as f64,
            Prediction::Value(v) => v,
        }
    }
}

impl DecisionTree {
    /// Predict the class label or regression target for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_sample(&self, sample: &[f64]) -> Result<Prediction, TreeError> {
        self.check_width(sample)?;
        Ok(match self.traverse(sample) {
            LeafValue::Class { label, .. } => Prediction::Class(*label),
            LeafValue::Mean(v) => Prediction::Value(*v),
        })
    }

    /// Return the class probability distribution for a single sample.
    ///
    /// The returned `Vec` is the reached leaf's distribution: length
    /// `n_classes`, summing to 1.0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ProbaUnsupported`] | the tree is a regressor |
    /// | [`TreeError::PredictionFeatureMismatch`] | `sample.len() != n_features` |
    pub fn predict_proba_sample(&self, sample: &[f64]) -> Result<Vec<f64>, TreeError> {
        self.check_proba()?;
        self.leaf_distribution(sample)
    }

    /// Predict a batch of samples in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<Prediction>, TreeError> {
        features
            .into_par_iter()
            .map(|sample| self.predict_sample(sample))
            .collect()
    }

    /// Return class probability rows for a batch of samples in parallel.
    ///
    /// The result has one row of length `n_classes` per input sample, in
    /// input order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ProbaUnsupported`] | the tree is a regressor |
    /// | [`TreeError::PredictionFeatureMismatch`] | any sample has the wrong feature count |
    pub fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, TreeError> {
        self.check_proba()?;
        features
            .into_par_iter()
            .map(|sample| self.leaf_distribution(sample))
            .collect()
    }

    /// Distribution of the leaf reached by `sample`. The caller has already
    /// checked that the tree is a classifier.
    fn leaf_distribution(&self, sample: &[f64]) -> Result<Vec<f64>, TreeError> {
        self.check_width(sample)?;
        match self.traverse(sample) {
            LeafValue::Class { distribution, .. } => Ok(distribution.clone()),
            LeafValue::Mean(_) => unreachable!("classification trees only hold class leaves"),
        }
    }

    fn check_width(&self, sample: &[f64]) -> Result<(), TreeError> {
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        Ok(())
    }

    fn check_proba(&self) -> Result<(), TreeError> {
        if !self.is_classifier() {
            return Err(TreeError::ProbaUnsupported {
                criterion: self.criterion,
            });
        }
        Ok(())
    }
}
