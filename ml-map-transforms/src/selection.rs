//! Feature selection by column index

use std::sync::Arc;

use ndarray::{Array2, Axis};

use ml_map_core::{
    Dataset, DefinitionKind, Error, Fitted, Hyperparameters, LeafMapping, MappingDefinition,
    MappingInstance, OutputLabels, Result,
};

use crate::common::require_features;

/// Columns kept by a trained selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionParams {
    /// Indices into the training features, in output order
    pub indices: Vec<usize>,

    /// Feature count seen during training
    pub features_in: usize,
}

/// Definition of the feature selection mapping
///
/// The `indices` hyperparameter lists the columns to keep; an empty list
/// keeps every column. Training checks the indices against the data and
/// records the selected feature labels.
#[derive(Debug, Default)]
pub struct FeatureSelection;

impl MappingDefinition for FeatureSelection {
    fn name(&self) -> &str {
        "Feature selection"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Trainable
    }

    fn default_hyperparameters(&self) -> Hyperparameters {
        Hyperparameters::new([("indices", Vec::<usize>::new())])
    }

    fn train(&self, data: &Dataset, hyperparameters: &Hyperparameters) -> Result<Fitted> {
        let features_in = data.feature_count();
        let requested = hyperparameters.indices("indices")?;
        let indices: Vec<usize> = if requested.is_empty() {
            (0..features_in).collect()
        } else {
            requested.to_vec()
        };

        if let Some(bad) = indices.iter().find(|&&j| j >= features_in) {
            return Err(Error::InvalidArgument(format!(
                "Feature index {bad} out of range for {features_in} features"
            )));
        }

        let labels = if data.feature_labels().is_empty() {
            OutputLabels::Terminal
        } else {
            OutputLabels::Named(
                indices
                    .iter()
                    .map(|&j| data.feature_labels()[j].clone())
                    .collect(),
            )
        };

        Ok(Fitted::new(SelectionParams { indices, features_in }, labels))
    }

    fn apply(&self, data: &Dataset, trained: &LeafMapping) -> Result<Array2<f64>> {
        let params = trained.params::<SelectionParams>()?;
        require_features(data, params.features_in, self.name())?;
        Ok(data.matrix().select(Axis(1), &params.indices))
    }
}

/// Untrained selection of the given columns
pub fn featsel(indices: Vec<usize>) -> Result<MappingInstance> {
    let hyperparameters = FeatureSelection
        .default_hyperparameters()
        .with("indices", indices)?;
    MappingInstance::with_hyperparameters(Arc::new(FeatureSelection), hyperparameters)
}
