use ndarray::{NdFloat, ScalarOperand};

use num_traits::{FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;

// Include submodules
mod distance;
mod frame;

// Re-export types from submodules
pub use distance::{Distance, L1Dist, L2Dist, LInfDist};
pub use frame::{FoldError, FoldedFrame, Frame, FrameError, UNASSIGNED};

pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }
}

impl Float for f32 {}

impl Float for f64 {}
