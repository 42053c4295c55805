use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

use fold_train::Learner;
use xval::Distance;

/// The distance metrics the runner can train with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DistanceMetric {
    /// Manhattan distance.
    L1,
    /// Euclidean distance.
    L2,
    /// Chebyshev distance.
    LInf,
}

impl Display for DistanceMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::L1 => write!(f, "L1"),
            DistanceMetric::L2 => write!(f, "L2"),
            DistanceMetric::LInf => write!(f, "L-Infinity"),
        }
    }
}

/// Errors that can occur when using the nearest-centroid classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum NearestCentroidError {
    /// Cannot fit or predict with an empty training set
    EmptyTrainingSet,
    /// A prediction row has a different width than the fitted centroids
    MismatchedDimensions { expected: usize, found: usize },
}

impl Display for NearestCentroidError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NearestCentroidError::EmptyTrainingSet => {
                write!(f, "Cannot fit or predict with an empty training set")
            }
            NearestCentroidError::MismatchedDimensions { expected, found } => {
                write!(
                    f,
                    "Expected feature vectors of length {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl Error for NearestCentroidError {}

/// One fitted class centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Centroid {
    pub label: String,
    pub center: Array1<f64>,
}

/// The persisted model artifact: one centroid per class seen in training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Centroid>,
}

/// A nearest-centroid classifier.
///
/// Fitting computes the mean feature vector of every class; prediction
/// returns the label of the closest centroid under the chosen distance.
/// Simple, but enough to exercise the full fold cycle end to end.
#[derive(Debug, Clone)]
pub struct NearestCentroid<D>
where
    D: Distance<f64>,
{
    distance: D,
}

impl<D> NearestCentroid<D>
where
    D: Distance<f64>,
{
    pub fn new(distance: D) -> Self {
        Self { distance }
    }
}

impl<D> Learner<String, f64> for NearestCentroid<D>
where
    D: Distance<f64>,
{
    type Model = CentroidModel;
    type Error = NearestCentroidError;

    fn fit(
        &self,
        features: ArrayView2<f64>,
        labels: &[String],
    ) -> Result<CentroidModel, NearestCentroidError> {
        if features.nrows() == 0 {
            return Err(NearestCentroidError::EmptyTrainingSet);
        }

        // Accumulate per-class sums in first-occurrence order so the model
        // is deterministic for a given row order.
        let mut group_of: HashMap<&String, usize> = HashMap::new();
        let mut names: Vec<String> = Vec::new();
        let mut sums: Vec<Array1<f64>> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        for (row, label) in labels.iter().enumerate() {
            let g = *group_of.entry(label).or_insert_with(|| {
                names.push(label.clone());
                sums.push(Array1::zeros(features.ncols()));
                counts.push(0);
                names.len() - 1
            });
            sums[g] += &features.row(row);
            counts[g] += 1;
        }

        let centroids = names
            .into_iter()
            .zip(sums)
            .zip(counts)
            .map(|((label, sum), count)| Centroid {
                label,
                center: sum / count as f64,
            })
            .collect();
        Ok(CentroidModel { centroids })
    }

    fn predict(
        &self,
        model: &CentroidModel,
        features: ArrayView2<f64>,
    ) -> Result<Vec<String>, NearestCentroidError> {
        if model.centroids.is_empty() {
            return Err(NearestCentroidError::EmptyTrainingSet);
        }
        let expected = model.centroids[0].center.len();
        let mut predicted = Vec::with_capacity(features.nrows());
        for row in features.rows() {
            if row.len() != expected {
                return Err(NearestCentroidError::MismatchedDimensions {
                    expected,
                    found: row.len(),
                });
            }
            // `rdistance` keeps the ordering of the true distance, which is
            // all the argmin needs.
            let nearest = model
                .centroids
                .iter()
                .map(|c| (c, self.distance.rdistance(row, c.center.view())))
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
                .map(|(c, _)| c.label.clone())
                .ok_or(NearestCentroidError::EmptyTrainingSet)?;
            predicted.push(nearest);
        }
        Ok(predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use xval::L2Dist;

    fn training_data() -> (ndarray::Array2<f64>, Vec<String>) {
        (
            array![
                [1.0, 1.0],
                [2.0, 2.0],
                [1.0, 2.0],
                [8.0, 8.0],
                [9.0, 8.0],
                [8.0, 9.0]
            ],
            vec![
                "A".to_string(),
                "A".to_string(),
                "A".to_string(),
                "B".to_string(),
                "B".to_string(),
                "B".to_string(),
            ],
        )
    }

    #[test]
    fn test_fit_computes_class_means() {
        let (features, labels) = training_data();
        let model = NearestCentroid::new(L2Dist)
            .fit(features.view(), &labels)
            .unwrap();
        assert_eq!(model.centroids.len(), 2);
        assert_eq!(model.centroids[0].label, "A");
        assert!((model.centroids[0].center[0] - 4.0 / 3.0).abs() < 1e-12);
        assert!((model.centroids[1].center[0] - 25.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_separates_clusters() {
        let (features, labels) = training_data();
        let learner = NearestCentroid::new(L2Dist);
        let model = learner.fit(features.view(), &labels).unwrap();
        let queries = array![[2.5, 2.5], [7.5, 8.5]];
        let predicted = learner.predict(&model, queries.view()).unwrap();
        assert_eq!(predicted, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_error_on_empty_training_set() {
        let features = ndarray::Array2::<f64>::zeros((0, 2));
        let result = NearestCentroid::new(L2Dist).fit(features.view(), &[]);
        assert!(matches!(result, Err(NearestCentroidError::EmptyTrainingSet)));
    }

    #[test]
    fn test_error_on_mismatched_dimensions() {
        let (features, labels) = training_data();
        let learner = NearestCentroid::new(L2Dist);
        let model = learner.fit(features.view(), &labels).unwrap();
        let queries = array![[1.0, 2.0, 3.0]];
        let result = learner.predict(&model, queries.view());
        assert!(matches!(
            result,
            Err(NearestCentroidError::MismatchedDimensions {
                expected: 2,
                found: 3,
            })
        ));
    }

    #[test]
    fn test_model_round_trips_through_json() {
        let (features, labels) = training_data();
        let model = NearestCentroid::new(L2Dist)
            .fit(features.view(), &labels)
            .unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: CentroidModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.centroids.len(), 2);
        assert_eq!(restored.centroids[0].label, "A");
        assert_eq!(restored.centroids[0].center, model.centroids[0].center);
    }
}
