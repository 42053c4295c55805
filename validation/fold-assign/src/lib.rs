use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

// Core components from the shared library.
use xval_helpers::{Float, FoldedFrame, Frame, UNASSIGNED};

/// Errors that can occur when assigning folds.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignError {
    /// The fold count must satisfy `2 <= k <= n_rows`.
    InvalidFoldCount { k: usize, n_rows: usize },
    /// Stratified assignment needs at least `k` rows of every label.
    InsufficientLabelCount {
        label: String,
        count: usize,
        k: usize,
    },
}

impl Display for AssignError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AssignError::InvalidFoldCount { k, n_rows } => {
                write!(
                    f,
                    "fold count {} is invalid for {} rows (need 2 <= k <= rows)",
                    k, n_rows
                )
            }
            AssignError::InsufficientLabelCount { label, count, k } => {
                write!(
                    f,
                    "label {} occurs {} times, fewer than the {} folds",
                    label, count, k
                )
            }
        }
    }
}

impl Error for AssignError {}

/// How rows are distributed across folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Distribute rows without regard to their labels.
    Plain,
    /// Distribute each label's rows separately, preserving class
    /// proportions across folds to within one row per label per fold.
    Stratified,
}

/// Assigns every row of a dataset to exactly one of `k` evaluation folds.
///
/// The assigner does not mutate its input; it returns a new
/// [`FoldedFrame`] carrying the fold column. Shuffling is on by default
/// and can be disabled with [`FoldAssigner::with_shuffle`], in which case
/// row order alone determines the assignment.
#[derive(Debug, Clone)]
pub struct FoldAssigner {
    k: usize,
    strategy: Strategy,
    shuffle: bool,
}

impl FoldAssigner {
    /// Creates an assigner for `k` folds under the given strategy.
    ///
    /// Shuffling is enabled by default. Validation of `k` against the
    /// dataset happens at assignment time, since it depends on the row
    /// count.
    pub fn new(k: usize, strategy: Strategy) -> Self {
        Self {
            k,
            strategy,
            shuffle: true,
        }
    }

    /// Enables or disables shuffling before assignment.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Assigns folds using the thread-local generator.
    ///
    /// # Errors
    ///
    /// Returns `AssignError::InvalidFoldCount` when `k < 2` or `k` exceeds
    /// the row count, and `AssignError::InsufficientLabelCount` in
    /// stratified mode when any label occurs fewer than `k` times. No row
    /// is touched when validation fails.
    pub fn assign<L, F>(&self, frame: &Frame<L, F>) -> Result<FoldedFrame<L, F>, AssignError>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
    {
        self.assign_with_rng(frame, &mut rand::rng())
    }

    /// Assigns folds with a seeded generator for reproducible results.
    pub fn assign_with_seed<L, F>(
        &self,
        frame: &Frame<L, F>,
        seed: u64,
    ) -> Result<FoldedFrame<L, F>, AssignError>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
    {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self.assign_with_rng(frame, &mut rng)
    }

    /// Assigns folds with an explicit generator.
    ///
    /// The generator is an explicit parameter rather than ambient state so
    /// that assignment stays reproducible and testable in isolation.
    pub fn assign_with_rng<L, F, R>(
        &self,
        frame: &Frame<L, F>,
        rng: &mut R,
    ) -> Result<FoldedFrame<L, F>, AssignError>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
        R: Rng,
    {
        let n = frame.n_rows();
        if self.k < 2 || self.k > n {
            return Err(AssignError::InvalidFoldCount { k: self.k, n_rows: n });
        }

        let mut fold_ids = vec![UNASSIGNED; n];
        match self.strategy {
            Strategy::Plain => {
                let mut order: Vec<usize> = (0..n).collect();
                if self.shuffle {
                    order.shuffle(rng);
                }
                // Round-robin over the (possibly shuffled) order: position i
                // lands in fold i % k, so fold sizes differ by at most one.
                for (pos, &row) in order.iter().enumerate() {
                    fold_ids[row] = (pos % self.k) as i64;
                }
            }
            Strategy::Stratified => {
                let groups = self.group_by_label(frame)?;
                for mut rows in groups {
                    if self.shuffle {
                        rows.shuffle(rng);
                    }
                    // Same round-robin rule, applied per label group, which
                    // keeps each label balanced across folds on its own.
                    for (pos, &row) in rows.iter().enumerate() {
                        fold_ids[row] = (pos % self.k) as i64;
                    }
                }
            }
        }

        // Every index 0..n was written exactly once above.
        let folded = FoldedFrame::new(frame.clone(), fold_ids, self.k)
            .expect("assignment writes a valid fold id for every row");
        Ok(folded)
    }

    /// Groups row indices by label, in first-occurrence order.
    ///
    /// First-occurrence order keeps the grouping deterministic without
    /// requiring `L: Ord`.
    fn group_by_label<L, F>(&self, frame: &Frame<L, F>) -> Result<Vec<Vec<usize>>, AssignError>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
    {
        let mut group_of: HashMap<&L, usize> = HashMap::new();
        let mut group_labels: Vec<&L> = Vec::new();
        let mut group_rows: Vec<Vec<usize>> = Vec::new();
        for (row, label) in frame.labels().iter().enumerate() {
            let g = *group_of.entry(label).or_insert_with(|| {
                group_labels.push(label);
                group_rows.push(Vec::new());
                group_rows.len() - 1
            });
            group_rows[g].push(row);
        }
        for (g, rows) in group_rows.iter().enumerate() {
            if rows.len() < self.k {
                return Err(AssignError::InsufficientLabelCount {
                    label: format!("{:?}", group_labels[g]),
                    count: rows.len(),
                    k: self.k,
                });
            }
        }
        Ok(group_rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn frame_with_labels(labels: Vec<&'static str>) -> Frame<&'static str, f64> {
        let n = labels.len();
        let features =
            Array2::from_shape_fn((n, 2), |(i, j)| i as f64 * 2.0 + j as f64);
        Frame::new(
            vec!["x".to_string(), "y".to_string()],
            "class",
            features,
            labels,
        )
        .unwrap()
    }

    #[test]
    fn test_plain_assignment_is_balanced() {
        let frame = frame_with_labels(vec!["a"; 10]);
        let folded = FoldAssigner::new(3, Strategy::Plain)
            .assign_with_seed(&frame, 7)
            .unwrap();
        let counts = folded.fold_counts();
        assert_eq!(counts.iter().sum::<usize>(), 10);
        assert!(counts.iter().all(|&c| c == 3 || c == 4));
        assert!(folded.fold_ids().iter().all(|&id| id < 3));
    }

    #[test]
    fn test_plain_without_shuffle_preserves_order() {
        let frame = frame_with_labels(vec!["a"; 6]);
        let folded = FoldAssigner::new(3, Strategy::Plain)
            .with_shuffle(false)
            .assign(&frame)
            .unwrap();
        // Row i goes to fold i % k when no shuffle happens.
        assert_eq!(folded.fold_ids(), &[0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_seeded_assignment_is_reproducible() {
        let frame = frame_with_labels(vec!["a", "a", "b", "b", "a", "b", "a", "b"]);
        let assigner = FoldAssigner::new(2, Strategy::Stratified);
        let first = assigner.assign_with_seed(&frame, 42).unwrap();
        let second = assigner.assign_with_seed(&frame, 42).unwrap();
        assert_eq!(first.fold_ids(), second.fold_ids());
    }

    #[test]
    fn test_stratified_balances_each_label() {
        // 10 of each label, k=5: every fold must hold exactly 2 of each.
        let mut labels = vec!["a"; 10];
        labels.extend(vec!["b"; 10]);
        let frame = frame_with_labels(labels);
        let folded = FoldAssigner::new(5, Strategy::Stratified)
            .assign_with_seed(&frame, 1)
            .unwrap();

        for fold in 0..5 {
            let (_, valid) = folded.split_indices(fold);
            assert_eq!(valid.len(), 4);
            let a_count = valid
                .iter()
                .filter(|&&row| frame.labels()[row] == "a")
                .count();
            assert_eq!(a_count, 2);
        }
    }

    #[test]
    fn test_stratified_two_class_ten_rows_five_folds() {
        let labels = vec!["0", "1", "0", "1", "0", "1", "0", "1", "0", "1"];
        let frame = frame_with_labels(labels);
        let folded = FoldAssigner::new(5, Strategy::Stratified)
            .assign_with_seed(&frame, 9)
            .unwrap();
        for fold in 0..5 {
            let (_, valid) = folded.split_indices(fold);
            assert_eq!(valid.len(), 2);
            let zeros = valid
                .iter()
                .filter(|&&row| frame.labels()[row] == "0")
                .count();
            assert_eq!(zeros, 1);
        }
    }

    #[test]
    fn test_uneven_label_counts_stay_within_one_row() {
        let mut labels = vec!["a"; 7];
        labels.extend(vec!["b"; 5]);
        let frame = frame_with_labels(labels);
        let folded = FoldAssigner::new(3, Strategy::Stratified)
            .assign_with_seed(&frame, 3)
            .unwrap();
        for fold in 0..3 {
            let (_, valid) = folded.split_indices(fold);
            let a_count = valid
                .iter()
                .filter(|&&row| frame.labels()[row] == "a")
                .count();
            let b_count = valid.len() - a_count;
            // 7 a's over 3 folds: 2 or 3 each; 5 b's over 3 folds: 1 or 2.
            assert!(a_count == 2 || a_count == 3);
            assert!(b_count == 1 || b_count == 2);
        }
    }

    #[test]
    fn test_error_on_k_too_small() {
        let frame = frame_with_labels(vec!["a"; 4]);
        let result = FoldAssigner::new(1, Strategy::Plain).assign(&frame);
        assert!(matches!(
            result,
            Err(AssignError::InvalidFoldCount { k: 1, n_rows: 4 })
        ));
    }

    #[test]
    fn test_error_on_k_exceeding_rows() {
        let frame = frame_with_labels(vec!["a"; 4]);
        let result = FoldAssigner::new(5, Strategy::Plain).assign(&frame);
        assert!(matches!(
            result,
            Err(AssignError::InvalidFoldCount { k: 5, n_rows: 4 })
        ));
    }

    #[test]
    fn test_error_on_rare_label() {
        let frame = frame_with_labels(vec!["a", "a", "a", "b", "a", "a"]);
        let result = FoldAssigner::new(3, Strategy::Stratified).assign(&frame);
        match result {
            Err(AssignError::InsufficientLabelCount { label, count, k }) => {
                assert_eq!(label, "\"b\"");
                assert_eq!(count, 1);
                assert_eq!(k, 3);
            }
            other => panic!("expected InsufficientLabelCount, got {:?}", other),
        }
    }

    #[test]
    fn test_input_frame_is_unchanged() {
        let frame = frame_with_labels(vec!["a"; 6]);
        let before = frame.clone();
        let _ = FoldAssigner::new(2, Strategy::Plain)
            .assign_with_seed(&frame, 5)
            .unwrap();
        assert_eq!(frame, before);
    }
}
