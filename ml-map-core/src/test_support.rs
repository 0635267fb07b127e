//! Small definitions used by the unit tests

use ndarray::{Array1, Array2, Axis};

use crate::dataset::Dataset;
use crate::definition::{DefinitionKind, Fitted, MappingDefinition, OutputKind};
use crate::error::{Error, Result};
use crate::hyperparams::Hyperparameters;
use crate::instance::LeafMapping;
use crate::output::OutputLabels;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Trainable: subtracts the per-column mean seen in training
#[derive(Debug)]
pub(crate) struct Centre;

impl MappingDefinition for Centre {
    fn name(&self) -> &str {
        "Centre"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Trainable
    }

    fn train(&self, data: &Dataset, _hyperparameters: &Hyperparameters) -> Result<Fitted> {
        let mean = data
            .matrix()
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::InvalidArgument("Cannot centre an empty dataset".into()))?;
        Ok(Fitted::new(mean.to_vec(), OutputLabels::SameAsInput))
    }

    fn apply(&self, data: &Dataset, trained: &LeafMapping) -> Result<Array2<f64>> {
        let mean = Array1::from(trained.params::<Vec<f64>>()?.clone());
        Ok(data.matrix() - &mean)
    }
}

/// Fixed: flips the sign of every value
#[derive(Debug)]
pub(crate) struct Negate;

impl MappingDefinition for Negate {
    fn name(&self) -> &str {
        "Negate"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Fixed
    }

    fn apply(&self, data: &Dataset, _trained: &LeafMapping) -> Result<Array2<f64>> {
        Ok(data.matrix().mapv(|v| -v))
    }
}

/// Fixed, terminal: sum of all values
#[derive(Debug)]
pub(crate) struct Score;

impl MappingDefinition for Score {
    fn name(&self) -> &str {
        "Score"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Fixed
    }

    fn declared_output(&self, _hyperparameters: &Hyperparameters) -> OutputKind {
        OutputKind::Terminal
    }

    fn apply(&self, data: &Dataset, _trained: &LeafMapping) -> Result<Array2<f64>> {
        Ok(Array2::from_elem((1, 1), data.matrix().sum()))
    }
}

/// Fixed: `n` copies of each row's sum, labelled `s0..`
#[derive(Debug)]
pub(crate) struct Widen(pub usize);

impl MappingDefinition for Widen {
    fn name(&self) -> &str {
        "Widen"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Fixed
    }

    fn fixed_output_labels(&self, _hyperparameters: &Hyperparameters) -> OutputLabels {
        OutputLabels::Named((0..self.0).map(|j| format!("s{j}")).collect())
    }

    fn apply(&self, data: &Dataset, _trained: &LeafMapping) -> Result<Array2<f64>> {
        let sums = data.matrix().sum_axis(Axis(1));
        Ok(Array2::from_shape_fn((data.row_count(), self.0), |(i, _)| sums[i]))
    }
}
