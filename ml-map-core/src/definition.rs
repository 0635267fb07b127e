//! The contract every mapping definition implements

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::hyperparams::Hyperparameters;
use crate::instance::LeafMapping;
use crate::output::OutputLabels;

/// Whether instances of a definition need training before use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    /// Instances start untrained and learn parameters from data
    Trainable,

    /// Instances are usable immediately; training is a no-op
    Fixed,
}

/// What a definition's `apply` produces, known before training
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// A labelled matrix that can feed a further mapping
    Dataset,

    /// A raw value that ends any composition
    Terminal,
}

/// Answer to the describe task
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    /// Display name of the mapping
    pub name: String,

    /// Default hyperparameters, which also fix the record's arity
    pub defaults: Hyperparameters,
}

/// Opaque parameters learned by training
///
/// Shared immutably, so cloning a trained instance is cheap and never
/// exposes a partially updated value.
#[derive(Clone)]
pub struct FittedParams(Arc<dyn Any + Send + Sync>);

impl FittedParams {
    /// Wrap learned parameters
    pub fn new<T: Any + Send + Sync>(params: T) -> Self {
        Self(Arc::new(params))
    }

    /// Placeholder carried by fixed instances
    pub fn none() -> Self {
        Self::new(())
    }

    /// Borrow the parameters as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Result<&T> {
        self.0.downcast_ref::<T>().ok_or_else(|| {
            Error::InvalidOperation(format!(
                "Fitted parameters are not of type {}",
                type_name::<T>()
            ))
        })
    }
}

impl fmt::Debug for FittedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FittedParams(..)")
    }
}

/// Result of training: learned parameters plus the labels `apply` will emit
#[derive(Debug, Clone)]
pub struct Fitted {
    /// Learned parameters
    pub params: FittedParams,

    /// Output feature labels
    pub output_labels: OutputLabels,
}

impl Fitted {
    /// Bundle parameters with their output labels
    pub fn new<T: Any + Send + Sync>(params: T, output_labels: OutputLabels) -> Self {
        Self {
            params: FittedParams::new(params),
            output_labels,
        }
    }

    /// The result of training a fixed mapping: no parameters, its fixed labels
    pub fn placeholder(output_labels: OutputLabels) -> Self {
        Self {
            params: FittedParams::none(),
            output_labels,
        }
    }
}

/// A named, stateless procedure that can be described, trained and applied
///
/// Definitions are shared between instances through `Arc`, so they must not
/// hold per-instance state. Instances are built with
/// [`MappingInstance::new`](crate::MappingInstance::new) and
/// [`MappingInstance::with_hyperparameters`](crate::MappingInstance::with_hyperparameters).
pub trait MappingDefinition: Send + Sync + fmt::Debug {
    /// Display name
    fn name(&self) -> &str;

    /// Whether instances need training
    fn kind(&self) -> DefinitionKind;

    /// Default hyperparameters
    fn default_hyperparameters(&self) -> Hyperparameters {
        Hyperparameters::empty()
    }

    /// Static declaration of what `apply` yields
    fn declared_output(&self, _hyperparameters: &Hyperparameters) -> OutputKind {
        OutputKind::Dataset
    }

    /// Output labels of a fixed instance
    fn fixed_output_labels(&self, hyperparameters: &Hyperparameters) -> OutputLabels {
        match self.declared_output(hyperparameters) {
            OutputKind::Dataset => OutputLabels::SameAsInput,
            OutputKind::Terminal => OutputLabels::Terminal,
        }
    }

    /// Name and default hyperparameters; never fails
    fn describe(&self, _hyperparameters: Option<&Hyperparameters>) -> Description {
        Description {
            name: self.name().to_string(),
            defaults: self.default_hyperparameters(),
        }
    }

    /// Learn parameters from `data`
    ///
    /// Fixed definitions keep this default, which returns
    /// [`Fitted::placeholder`] with their fixed labels. A trainable definition
    /// that does not override it fails with `UnsupportedOperation`.
    fn train(&self, _data: &Dataset, hyperparameters: &Hyperparameters) -> Result<Fitted> {
        match self.kind() {
            DefinitionKind::Fixed => Ok(Fitted::placeholder(
                self.fixed_output_labels(hyperparameters),
            )),
            DefinitionKind::Trainable => Err(Error::UnsupportedOperation(format!(
                "'{}' is trainable but does not implement training",
                self.name()
            ))),
        }
    }

    /// Map `data` with a trained or fixed instance, returning the raw matrix
    fn apply(&self, data: &Dataset, trained: &LeafMapping) -> Result<Array2<f64>>;
}
