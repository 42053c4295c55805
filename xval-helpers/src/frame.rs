use ndarray::{Array2, ArrayView2, Axis};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use crate::Float;

/// Sentinel fold id for a row that has not been assigned yet.
///
/// A finished [`FoldedFrame`] can never hold this value; it only appears
/// while an assignment is being built, and in raw fold columns read back
/// from disk before validation.
pub const UNASSIGNED: i64 = -1;

/// Errors raised when constructing a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The number of labels differs from the number of feature rows.
    LabelCountMismatch { rows: usize, labels: usize },
    /// The number of feature names differs from the number of feature columns.
    ColumnCountMismatch { names: usize, columns: usize },
    /// The same feature column name appears more than once.
    DuplicateColumn(String),
    /// The label column name collides with a feature column name.
    LabelColumnClash(String),
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::LabelCountMismatch { rows, labels } => {
                write!(f, "{} feature rows but {} labels", rows, labels)
            }
            FrameError::ColumnCountMismatch { names, columns } => {
                write!(f, "{} feature names but {} feature columns", names, columns)
            }
            FrameError::DuplicateColumn(name) => {
                write!(f, "duplicate feature column name '{}'", name)
            }
            FrameError::LabelColumnClash(name) => {
                write!(f, "label column '{}' is also declared as a feature column", name)
            }
        }
    }
}

impl Error for FrameError {}

/// Errors raised when attaching a fold column to a [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub enum FoldError {
    /// The fold column length differs from the row count.
    LengthMismatch { rows: usize, fold_ids: usize },
    /// A row still carries the [`UNASSIGNED`] sentinel.
    UnassignedRow { row: usize },
    /// A fold id falls outside `[0, k)`.
    OutOfRange { row: usize, fold_id: i64, k: usize },
}

impl Display for FoldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FoldError::LengthMismatch { rows, fold_ids } => {
                write!(f, "{} rows but {} fold ids", rows, fold_ids)
            }
            FoldError::UnassignedRow { row } => {
                write!(f, "row {} has no fold assigned", row)
            }
            FoldError::OutOfRange { row, fold_id, k } => {
                write!(f, "row {} has fold id {} outside [0, {})", row, fold_id, k)
            }
        }
    }
}

impl Error for FoldError {}

/// A labeled tabular dataset with a statically declared schema.
///
/// Rows are ordered; every row has one value per feature column plus a
/// label. The feature columns and the label column are declared once at
/// construction and validated against the data shape, instead of being
/// looked up dynamically per access.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `i32`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Frame<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    feature_names: Vec<String>,
    label_name: String,
    features: Array2<F>,
    labels: Vec<L>,
}

impl<L, F> Frame<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    /// Creates a frame from a feature matrix and one label per row.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the label count does not match the row
    /// count, the feature names do not match the column count, a feature
    /// name repeats, or the label column name collides with a feature name.
    pub fn new(
        feature_names: Vec<String>,
        label_name: impl Into<String>,
        features: Array2<F>,
        labels: Vec<L>,
    ) -> Result<Self, FrameError> {
        let label_name = label_name.into();
        if labels.len() != features.nrows() {
            return Err(FrameError::LabelCountMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if feature_names.len() != features.ncols() {
            return Err(FrameError::ColumnCountMismatch {
                names: feature_names.len(),
                columns: features.ncols(),
            });
        }
        for (i, name) in feature_names.iter().enumerate() {
            if feature_names[..i].contains(name) {
                return Err(FrameError::DuplicateColumn(name.clone()));
            }
        }
        if feature_names.contains(&label_name) {
            return Err(FrameError::LabelColumnClash(label_name));
        }
        Ok(Self {
            feature_names,
            label_name,
            features,
            labels,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn features(&self) -> ArrayView2<'_, F> {
        self.features.view()
    }

    pub fn labels(&self) -> &[L] {
        &self.labels
    }

    /// Returns a new frame containing the given rows, in the given order.
    ///
    /// The schema is carried over unchanged. Indices must be in bounds.
    pub fn select(&self, indices: &[usize]) -> Frame<L, F> {
        Frame {
            feature_names: self.feature_names.clone(),
            label_name: self.label_name.clone(),
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

/// A [`Frame`] augmented with one fold id per row.
///
/// Fold ids partition the rows into `k` disjoint, row-complete groups;
/// construction rejects anything else, so holding a `FoldedFrame` is proof
/// that the partition invariant holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct FoldedFrame<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    frame: Frame<L, F>,
    fold_ids: Vec<usize>,
    k: usize,
}

impl<L, F> FoldedFrame<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    /// Attaches a raw fold column to a frame.
    ///
    /// The column is taken as read from disk: `i64` values where
    /// [`UNASSIGNED`] marks a row that never received a fold.
    ///
    /// # Errors
    ///
    /// Returns a [`FoldError`] when the column length differs from the row
    /// count, a row is still unassigned, or a fold id falls outside
    /// `[0, k)`.
    pub fn new(frame: Frame<L, F>, fold_ids: Vec<i64>, k: usize) -> Result<Self, FoldError> {
        if fold_ids.len() != frame.n_rows() {
            return Err(FoldError::LengthMismatch {
                rows: frame.n_rows(),
                fold_ids: fold_ids.len(),
            });
        }
        let mut checked = Vec::with_capacity(fold_ids.len());
        for (row, &id) in fold_ids.iter().enumerate() {
            if id == UNASSIGNED {
                return Err(FoldError::UnassignedRow { row });
            }
            if id < 0 || id >= k as i64 {
                return Err(FoldError::OutOfRange { row, fold_id: id, k });
            }
            checked.push(id as usize);
        }
        Ok(Self {
            frame,
            fold_ids: checked,
            k,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn frame(&self) -> &Frame<L, F> {
        &self.frame
    }

    pub fn fold_ids(&self) -> &[usize] {
        &self.fold_ids
    }

    pub fn fold_of(&self, row: usize) -> usize {
        self.fold_ids[row]
    }

    /// Number of rows assigned to each fold, indexed by fold id.
    pub fn fold_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.k];
        for &id in &self.fold_ids {
            counts[id] += 1;
        }
        counts
    }

    /// Row indices of the train/validation split for one fold.
    ///
    /// Train rows are those whose fold id differs from `fold`; validation
    /// rows are those whose fold id equals `fold`. Original row order is
    /// preserved on both sides.
    pub fn split_indices(&self, fold: usize) -> (Vec<usize>, Vec<usize>) {
        let mut train = Vec::new();
        let mut valid = Vec::new();
        for (row, &id) in self.fold_ids.iter().enumerate() {
            if id == fold {
                valid.push(row);
            } else {
                train.push(row);
            }
        }
        (train, valid)
    }

    /// Derives the `(train, validation)` frames for one fold.
    ///
    /// The two frames are disjoint and together cover every row; deriving
    /// the split twice yields identical frames.
    pub fn split(&self, fold: usize) -> (Frame<L, F>, Frame<L, F>) {
        let (train, valid) = self.split_indices(fold);
        (self.frame.select(&train), self.frame.select(&valid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_frame() -> Frame<&'static str, f64> {
        Frame::new(
            vec!["x".to_string(), "y".to_string()],
            "class",
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]],
            vec!["a", "a", "b", "b"],
        )
        .unwrap()
    }

    #[test]
    fn test_frame_accessors() {
        let frame = sample_frame();
        assert_eq!(frame.n_rows(), 4);
        assert_eq!(frame.n_features(), 2);
        assert_eq!(frame.label_name(), "class");
        assert_eq!(frame.feature_names(), &["x".to_string(), "y".to_string()]);
        assert_eq!(frame.labels(), &["a", "a", "b", "b"]);
    }

    #[test]
    fn test_frame_label_count_mismatch() {
        let result = Frame::new(
            vec!["x".to_string()],
            "class",
            array![[1.0], [2.0]],
            vec!["a"],
        );
        assert!(matches!(
            result,
            Err(FrameError::LabelCountMismatch { rows: 2, labels: 1 })
        ));
    }

    #[test]
    fn test_frame_column_count_mismatch() {
        let result = Frame::new(
            vec!["x".to_string()],
            "class",
            array![[1.0, 2.0]],
            vec!["a"],
        );
        assert!(matches!(
            result,
            Err(FrameError::ColumnCountMismatch { names: 1, columns: 2 })
        ));
    }

    #[test]
    fn test_frame_duplicate_column() {
        let result = Frame::new(
            vec!["x".to_string(), "x".to_string()],
            "class",
            array![[1.0, 2.0]],
            vec!["a"],
        );
        assert!(matches!(result, Err(FrameError::DuplicateColumn(_))));
    }

    #[test]
    fn test_frame_label_clash() {
        let result = Frame::new(
            vec!["x".to_string(), "class".to_string()],
            "class",
            array![[1.0, 2.0]],
            vec!["a"],
        );
        assert!(matches!(result, Err(FrameError::LabelColumnClash(_))));
    }

    #[test]
    fn test_select_preserves_schema_and_order() {
        let frame = sample_frame();
        let subset = frame.select(&[2, 0]);
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.feature_names(), frame.feature_names());
        assert_eq!(subset.label_name(), "class");
        assert_eq!(subset.labels(), &["b", "a"]);
        assert_eq!(subset.features()[[0, 0]], 5.0);
        assert_eq!(subset.features()[[1, 0]], 1.0);
    }

    #[test]
    fn test_folded_frame_rejects_sentinel() {
        let result = FoldedFrame::new(sample_frame(), vec![0, UNASSIGNED, 1, 0], 2);
        assert!(matches!(result, Err(FoldError::UnassignedRow { row: 1 })));
    }

    #[test]
    fn test_folded_frame_rejects_out_of_range() {
        let result = FoldedFrame::new(sample_frame(), vec![0, 1, 2, 0], 2);
        assert!(matches!(
            result,
            Err(FoldError::OutOfRange { row: 2, fold_id: 2, k: 2 })
        ));
    }

    #[test]
    fn test_folded_frame_rejects_length_mismatch() {
        let result = FoldedFrame::new(sample_frame(), vec![0, 1], 2);
        assert!(matches!(
            result,
            Err(FoldError::LengthMismatch { rows: 4, fold_ids: 2 })
        ));
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let folded = FoldedFrame::new(sample_frame(), vec![0, 1, 0, 1], 2).unwrap();
        for fold in 0..2 {
            let (train, valid) = folded.split_indices(fold);
            assert!(train.iter().all(|i| !valid.contains(i)));
            let mut all: Vec<usize> = train.iter().chain(valid.iter()).copied().collect();
            all.sort();
            assert_eq!(all, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_split_derivation_is_idempotent() {
        let folded = FoldedFrame::new(sample_frame(), vec![0, 1, 0, 1], 2).unwrap();
        let first = folded.split(1);
        let second = folded.split(1);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn test_fold_counts() {
        let folded = FoldedFrame::new(sample_frame(), vec![0, 1, 0, 0], 2).unwrap();
        assert_eq!(folded.fold_counts(), vec![3, 1]);
    }
}
