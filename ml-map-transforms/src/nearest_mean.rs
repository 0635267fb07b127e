//! Nearest mean classifier

use std::sync::Arc;

use ndarray::{Array2, Axis};
use tracing::debug;

use ml_map_core::{
    Dataset, DefinitionKind, Error, Fitted, Hyperparameters, LeafMapping, MappingDefinition,
    MappingInstance, OutputLabels, Result,
};

use crate::common::{require_features, require_sample_labels};

/// One mean vector per class
#[derive(Debug, Clone, PartialEq)]
pub struct NearestMeanParams {
    /// Class names, in output column order
    pub classes: Vec<String>,

    /// Class means, one row per class
    pub means: Array2<f64>,
}

/// Definition of the nearest mean classifier
///
/// Training stores the mean of every class. Applying yields one column per
/// class holding the negated squared Euclidean distance to that class mean,
/// so the largest value marks the nearest class. Chain with softmax for
/// posterior-like outputs.
#[derive(Debug, Default)]
pub struct NearestMean;

impl MappingDefinition for NearestMean {
    fn name(&self) -> &str {
        "Nearest mean"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Trainable
    }

    fn train(&self, data: &Dataset, _hyperparameters: &Hyperparameters) -> Result<Fitted> {
        require_sample_labels(data, self.name())?;

        let classes = data.class_names();
        let mut means = Array2::zeros((classes.len(), data.feature_count()));

        for (c, class) in classes.iter().enumerate() {
            let members: Vec<usize> = data
                .sample_labels()
                .iter()
                .enumerate()
                .filter(|(_, label)| *label == class)
                .map(|(i, _)| i)
                .collect();

            let mean = data
                .matrix()
                .select(Axis(0), &members)
                .mean_axis(Axis(0))
                .ok_or_else(|| Error::InvalidArgument(format!("Class '{class}' has no samples")))?;
            means.row_mut(c).assign(&mean);
        }

        debug!(classes = classes.len(), features = data.feature_count(), "fitted nearest mean");

        let labels = OutputLabels::Named(classes.clone());
        Ok(Fitted::new(NearestMeanParams { classes, means }, labels))
    }

    fn apply(&self, data: &Dataset, trained: &LeafMapping) -> Result<Array2<f64>> {
        let params = trained.params::<NearestMeanParams>()?;
        require_features(data, params.means.ncols(), self.name())?;

        let matrix = data.matrix();
        Ok(Array2::from_shape_fn(
            (data.row_count(), params.classes.len()),
            |(i, c)| {
                let diff = &matrix.row(i) - &params.means.row(c);
                -diff.dot(&diff)
            },
        ))
    }
}

/// Untrained nearest mean classifier
pub fn nmc() -> MappingInstance {
    MappingInstance::new(Arc::new(NearestMean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ml_map_core::DatasetBuilder;
    use ndarray::array;

    fn two_classes() -> Dataset {
        DatasetBuilder::new()
            .rows(&[vec![0.0, 0.0], vec![0.0, 2.0], vec![10.0, 0.0], vec![10.0, 2.0]])
            .sample_labels(["left", "left", "right", "right"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_learns_class_means() {
        let classifier = nmc().trained(&two_classes()).unwrap();
        let params = classifier
            .as_leaf()
            .unwrap()
            .params::<NearestMeanParams>()
            .unwrap();

        assert_eq!(params.classes, ["left", "right"]);
        assert_eq!(params.means, array![[0.0, 1.0], [10.0, 1.0]]);
    }

    #[test]
    fn test_outputs_one_column_per_class() {
        let classifier = nmc().trained(&two_classes()).unwrap();
        let out = classifier.apply(&two_classes()).unwrap().into_dataset().unwrap();

        assert_eq!(out.feature_labels(), ["left", "right"]);
        assert_eq!(out.matrix().row(0).to_vec(), vec![-1.0, -101.0]);
        assert_eq!(out.max_labels().unwrap(), ["left", "left", "right", "right"]);
    }

    #[test]
    fn test_requires_labelled_samples() {
        let unlabelled = Dataset::from_rows(&[vec![1.0]]).unwrap();
        assert!(matches!(
            nmc().trained(&unlabelled),
            Err(Error::InvalidArgument(_))
        ));
    }
}
