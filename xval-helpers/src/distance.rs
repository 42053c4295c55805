use ndarray::ArrayView1;

use crate::Float;

/// A distance metric between two feature vectors.
///
/// `rdistance` is a "reduced" distance that preserves ordering but may skip
/// work (e.g., squared Euclidean without the square root); use it when only
/// comparisons matter.
pub trait Distance<F: Float> {
    /// The true distance between `a` and `b`.
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    /// A monotonic surrogate of the distance, cheaper to compute.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.distance(a, b)
    }
}

/// Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L1Dist;

impl<F: Float> Distance<F> for L1Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
    }
}

/// Euclidean (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdistance(a, b).sqrt()
    }

    // Squared Euclidean; avoids the square root when only ordering matters.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y) * (x - y))
            .sum()
    }
}

/// Chebyshev (L-infinity) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LInfDist;

impl<F: Float> Distance<F> for LInfDist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y).abs())
            .fold(F::zero(), F::max)
    }
}
