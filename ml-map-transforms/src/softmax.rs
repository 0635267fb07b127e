//! Row-wise softmax, a fixed mapping

use std::sync::Arc;

use ndarray::{Array2, Axis};

use ml_map_core::{Dataset, DefinitionKind, LeafMapping, MappingDefinition, MappingInstance, Result};

/// Definition of the softmax mapping
///
/// Every row is mapped to `exp(x - max) / sum(exp(x - max))`, so each output
/// row is non-negative and sums to one. Feature labels are kept.
#[derive(Debug, Default)]
pub struct Softmax;

impl MappingDefinition for Softmax {
    fn name(&self) -> &str {
        "Softmax"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Fixed
    }

    fn apply(&self, data: &Dataset, _trained: &LeafMapping) -> Result<Array2<f64>> {
        let mut out = data.matrix().to_owned();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let max = row.fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
            row.mapv_inplace(|v| (v - max).exp());
            let total = row.sum();
            row.mapv_inplace(|v| v / total);
        }
        Ok(out)
    }
}

/// Fixed softmax mapping
pub fn softmax() -> MappingInstance {
    MappingInstance::new(Arc::new(Softmax))
}
