//! Per-feature scaling learned from training data
//!
//! Each feature `j` is mapped to `(x - offset[j]) / scale[j]`. The method
//! hyperparameter picks the statistics:
//!
//! - `variance`: offset is the mean, scale the population standard deviation
//! - `domain`: offset is the minimum, scale the range, so training data lands in `[0, 1]`
//! - `centre`: offset is the mean, scale is 1
//!
//! Constant features get a scale of 1.

use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use ml_map_core::{
    Dataset, DefinitionKind, Error, Fitted, Hyperparameters, LeafMapping, MappingDefinition,
    MappingInstance, OutputLabels, Result,
};

use crate::common::{require_features, require_rows};

/// Scaling statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMethod {
    /// Zero mean, unit variance
    Variance,

    /// Minimum to 0, maximum to 1
    Domain,

    /// Zero mean only
    Centre,
}

impl ScaleMethod {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "variance" => Ok(ScaleMethod::Variance),
            "domain" => Ok(ScaleMethod::Domain),
            "centre" => Ok(ScaleMethod::Centre),
            other => Err(Error::InvalidArgument(format!(
                "Unknown scaling method: {other}"
            ))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ScaleMethod::Variance => "variance",
            ScaleMethod::Domain => "domain",
            ScaleMethod::Centre => "centre",
        }
    }
}

/// Learned offsets and scales, one per feature
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingParams {
    /// Subtracted from each feature
    pub offset: Array1<f64>,

    /// Divides each feature after the offset
    pub scale: Array1<f64>,
}

/// Definition of the scaling mapping
#[derive(Debug, Default)]
pub struct Scaling;

impl MappingDefinition for Scaling {
    fn name(&self) -> &str {
        "Scaling"
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Trainable
    }

    fn default_hyperparameters(&self) -> Hyperparameters {
        Hyperparameters::new([("method", ScaleMethod::Variance.as_str())])
    }

    fn train(&self, data: &Dataset, hyperparameters: &Hyperparameters) -> Result<Fitted> {
        let method = ScaleMethod::parse(hyperparameters.text("method")?)?;
        require_rows(data, self.name())?;

        let matrix = data.matrix();
        let (offset, scale) = match method {
            ScaleMethod::Variance => (column_mean(matrix)?, matrix.std_axis(Axis(0), 0.0)),
            ScaleMethod::Domain => {
                let min = matrix.fold_axis(Axis(0), f64::INFINITY, |acc, v| acc.min(*v));
                let max = matrix.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, v| acc.max(*v));
                let range = &max - &min;
                (min, range)
            }
            ScaleMethod::Centre => (column_mean(matrix)?, Array1::ones(matrix.ncols())),
        };
        let scale = scale.mapv(|s| if s > 0.0 { s } else { 1.0 });

        debug!(method = method.as_str(), features = matrix.ncols(), "fitted scaling");

        Ok(Fitted::new(
            ScalingParams { offset, scale },
            OutputLabels::Named(data.feature_labels().to_vec()),
        ))
    }

    fn apply(&self, data: &Dataset, trained: &LeafMapping) -> Result<Array2<f64>> {
        let params = trained.params::<ScalingParams>()?;
        require_features(data, params.offset.len(), self.name())?;

        Ok((data.matrix() - &params.offset) / &params.scale)
    }
}

fn column_mean(matrix: &Array2<f64>) -> Result<Array1<f64>> {
    matrix
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::InvalidArgument("Cannot average an empty dataset".into()))
}

/// Untrained variance scaling
pub fn scalem() -> MappingInstance {
    MappingInstance::new(Arc::new(Scaling))
}

/// Untrained scaling with the given method
pub fn scalem_with(method: ScaleMethod) -> Result<MappingInstance> {
    let hyperparameters = Scaling.default_hyperparameters().with("method", method.as_str())?;
    MappingInstance::with_hyperparameters(Arc::new(Scaling), hyperparameters)
}
