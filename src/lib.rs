//! Umbrella crate for the k-fold cross-validation workspace.
//!
//! Re-exports the shared data model plus both pipeline components so
//! downstream code can depend on a single crate.

pub use xval_helpers::{
    Distance, Float, FoldError, FoldedFrame, Frame, FrameError, L1Dist, L2Dist, LInfDist,
    UNASSIGNED,
};

pub use fold_assign::{AssignError, FoldAssigner, Strategy};
pub use fold_train::{
    ArtifactSink, FoldOutcome, FoldTrainer, Learner, SplitSide, TrainError, accuracy,
};
