//! Classification error, a terminal performance measure

use std::sync::Arc;

use ndarray::Array2;

use ml_map_core::{
    Dataset, DefinitionKind, Hyperparameters, LeafMapping, MappingDefinition, MappingInstance,
    OutputKind, Result,
};

use crate::common::require_sample_labels;

/// Definition of the classification error measure
///
/// Applied to classifier output, it compares each sample's label with the
/// feature label of its largest output and yields the fraction of
/// disagreements as a scalar.
#[derive(Debug, Default)]
pub struct ClassificationError;

impl MappingDefinition for ClassificationError {
    fn name(&self) -> &str {
        "Classification error"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Fixed
    }

    fn declared_output(&self, _hyperparameters: &Hyperparameters) -> OutputKind {
        OutputKind::Terminal
    }

    fn apply(&self, data: &Dataset, _trained: &LeafMapping) -> Result<Array2<f64>> {
        require_sample_labels(data, self.name())?;

        let assigned = data.max_labels()?;
        let wrong = assigned
            .iter()
            .zip(data.sample_labels())
            .filter(|(assigned, truth)| assigned != truth)
            .count();

        #[allow(clippy::cast_precision_loss)]
        let rate = wrong as f64 / data.row_count() as f64;
        Ok(Array2::from_elem((1, 1), rate))
    }
}

/// Fixed classification error measure
pub fn testc() -> MappingInstance {
    MappingInstance::new(Arc::new(ClassificationError))
}
