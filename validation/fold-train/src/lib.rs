use ndarray::ArrayView2;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::hash::Hash;

// Core components from the shared library.
use xval_helpers::{Float, FoldedFrame};

/// A classifier capability: anything that can fit a model on labeled
/// features and predict labels for new features.
///
/// The trainer only ever talks to this trait, so any conforming
/// implementation (nearest centroid, k-NN, a linear model, ...) is
/// substitutable without touching the fold loop.
pub trait Learner<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    /// The opaque model artifact produced by a fit.
    type Model;
    type Error: Error + Send + Sync + 'static;

    /// Fits a model on the training features and their labels.
    fn fit(&self, features: ArrayView2<F>, labels: &[L]) -> Result<Self::Model, Self::Error>;

    /// Predicts one label per row of `features`.
    fn predict(&self, model: &Self::Model, features: ArrayView2<F>)
        -> Result<Vec<L>, Self::Error>;
}

/// A persistence capability for model artifacts, keyed by fold index.
///
/// `persist` returns the key under which the artifact was stored (e.g. a
/// file name like `model_3.json`).
pub trait ArtifactSink<M> {
    type Error: Error + Send + Sync + 'static;

    fn persist(&mut self, model: &M, fold: usize) -> Result<String, Self::Error>;
}

/// Which side of a train/validation split was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Train,
    Validation,
}

impl Display for SplitSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitSide::Train => write!(f, "train"),
            SplitSide::Validation => write!(f, "validation"),
        }
    }
}

/// Errors that can occur while processing one fold.
///
/// `Fit`, `Predict` and `Persist` carry the collaborator's error verbatim
/// as their source; the trainer does not interpret it.
#[derive(Debug)]
pub enum TrainError {
    /// One side of the split has no rows; detected before fitting.
    EmptySplit { fold: usize, side: SplitSide },
    /// Train and validation subsets disagree on the feature columns.
    SchemaMismatch { fold: usize },
    /// The learner failed to fit.
    Fit {
        fold: usize,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The learner failed to predict.
    Predict {
        fold: usize,
        source: Box<dyn Error + Send + Sync>,
    },
    /// The artifact sink failed; already-persisted folds are untouched.
    Persist {
        fold: usize,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl TrainError {
    /// The index of the fold this error belongs to.
    pub fn fold(&self) -> usize {
        match self {
            TrainError::EmptySplit { fold, .. }
            | TrainError::SchemaMismatch { fold }
            | TrainError::Fit { fold, .. }
            | TrainError::Predict { fold, .. }
            | TrainError::Persist { fold, .. } => *fold,
        }
    }
}

impl Display for TrainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::EmptySplit { fold, side } => {
                write!(f, "fold {}: {} subset is empty", fold, side)
            }
            TrainError::SchemaMismatch { fold } => {
                write!(f, "fold {}: train and validation feature columns differ", fold)
            }
            TrainError::Fit { fold, source } => write!(f, "fold {}: fit failed: {}", fold, source),
            TrainError::Predict { fold, source } => {
                write!(f, "fold {}: predict failed: {}", fold, source)
            }
            TrainError::Persist { fold, source } => {
                write!(f, "fold {}: persist failed: {}", fold, source)
            }
        }
    }
}

impl Error for TrainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainError::EmptySplit { .. } | TrainError::SchemaMismatch { .. } => None,
            TrainError::Fit { source, .. }
            | TrainError::Predict { source, .. }
            | TrainError::Persist { source, .. } => Some(source.as_ref()),
        }
    }
}

/// The result of one successfully processed fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldOutcome {
    pub fold: usize,
    /// Fraction of validation rows whose predicted label exactly matched.
    pub accuracy: f64,
    /// The key the artifact sink stored the model under.
    pub artifact: String,
}

/// Fraction of positions where `predicted` equals `actual`.
///
/// This is an exact equality comparison on label values; returns 0.0 for
/// empty input.
///
/// # Panics
///
/// Panics if `predicted` and `actual` have different lengths.
pub fn accuracy<L: PartialEq>(predicted: &[L], actual: &[L]) -> f64 {
    assert_eq!(
        predicted.len(),
        actual.len(),
        "one prediction per actual label"
    );
    if actual.is_empty() {
        return 0.0;
    }
    let hits = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();
    hits as f64 / actual.len() as f64
}

/// Runs the per-fold train/validate/persist cycle over a folded dataset.
///
/// Folds are processed sequentially in ascending index order. Each fold
/// walks Split -> Fit -> Predict -> Score -> Persist; a failure at any
/// step abandons that fold only, and the run continues with the next one.
/// No state is carried from fold to fold.
#[derive(Debug)]
pub struct FoldTrainer<Lrn, S> {
    learner: Lrn,
    sink: S,
}

impl<Lrn, S> FoldTrainer<Lrn, S> {
    pub fn new(learner: Lrn, sink: S) -> Self {
        Self { learner, sink }
    }

    /// Processes every fold of `data` and returns one entry per fold.
    ///
    /// The returned vector is indexed by fold; failed folds hold their
    /// [`TrainError`] in place of an outcome.
    pub fn run_all<L, F>(
        &mut self,
        data: &FoldedFrame<L, F>,
    ) -> Vec<Result<FoldOutcome, TrainError>>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
        Lrn: Learner<L, F>,
        S: ArtifactSink<Lrn::Model>,
    {
        (0..data.k()).map(|fold| self.run_fold(data, fold)).collect()
    }

    /// Processes a single fold.
    ///
    /// # Errors
    ///
    /// Returns a [`TrainError`] naming the failing step; see the per-fold
    /// cycle described on [`FoldTrainer`].
    pub fn run_fold<L, F>(
        &mut self,
        data: &FoldedFrame<L, F>,
        fold: usize,
    ) -> Result<FoldOutcome, TrainError>
    where
        L: Clone + Eq + Hash + Debug,
        F: Float,
        Lrn: Learner<L, F>,
        S: ArtifactSink<Lrn::Model>,
    {
        let (train, valid) = data.split(fold);
        if train.n_rows() == 0 {
            return Err(TrainError::EmptySplit {
                fold,
                side: SplitSide::Train,
            });
        }
        if valid.n_rows() == 0 {
            return Err(TrainError::EmptySplit {
                fold,
                side: SplitSide::Validation,
            });
        }
        if train.feature_names() != valid.feature_names() {
            return Err(TrainError::SchemaMismatch { fold });
        }

        let model = self
            .learner
            .fit(train.features(), train.labels())
            .map_err(|e| TrainError::Fit {
                fold,
                source: Box::new(e),
            })?;
        let predicted = self
            .learner
            .predict(&model, valid.features())
            .map_err(|e| TrainError::Predict {
                fold,
                source: Box::new(e),
            })?;
        let accuracy = accuracy(&predicted, valid.labels());
        let artifact = self
            .sink
            .persist(&model, fold)
            .map_err(|e| TrainError::Persist {
                fold,
                source: Box::new(e),
            })?;
        Ok(FoldOutcome {
            fold,
            accuracy,
            artifact,
        })
    }
}
