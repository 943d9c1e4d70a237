use crate::criterion::Criterion;

/// Errors from decision tree configuration, fitting, and prediction.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when a criterion name is not one of the supported names.
    #[error("unknown criterion {name:?}, expected one of: gini, entropy, variance, mad_median")]
    UnknownCriterion {
        /// The unrecognized name.
        name: String,
    },

    /// Returned when min_samples_split is zero.
    #[error("min_samples_split must be at least 1, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when the n_classes override is zero.
    #[error("n_classes must be at least 1, got {n_classes}")]
    InvalidClassCount {
        /// The invalid n_classes value provided.
        n_classes: usize,
    },

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a target row is not a single-element column entry.
    #[error("target row {sample_index} has {got} columns, expected a single column")]
    TargetShape {
        /// The zero-based index of the offending target row.
        sample_index: usize,
        /// The number of values found in that row.
        got: usize,
    },

    /// Returned when features and targets have a different number of rows.
    #[error("features have {n_features_rows} rows but targets have {n_target_rows}")]
    LengthMismatch {
        /// Number of feature rows.
        n_features_rows: usize,
        /// Number of target rows.
        n_target_rows: usize,
    },

    /// Returned when a classification target is not a non-negative integer.
    #[error("target {value} at sample {sample_index} is not a valid class label")]
    InvalidLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending target value.
        value: f64,
    },

    /// Returned when a class label does not fit the configured class count.
    #[error("class label {label} at sample {sample_index} is out of range for {n_classes} classes")]
    LabelOutOfRange {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The offending label.
        label: usize,
        /// The number of classes in use.
        n_classes: usize,
    },

    /// Returned when a regression target is NaN or infinite.
    #[error("non-finite regression target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when class probabilities are requested from a regression tree.
    #[error("predict_proba is only available for classification, tree uses {criterion}")]
    ProbaUnsupported {
        /// The regression criterion the tree was fitted with.
        criterion: Criterion,
    },
}
