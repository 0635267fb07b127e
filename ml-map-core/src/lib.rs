//! Trainable dataset mappings and their composition
//!
//! A mapping turns a [`Dataset`] into a new dataset or into a raw value.
//! Classifiers, preprocessors and performance measures all share this one
//! contract: a stateless [`MappingDefinition`] is bound to [`Hyperparameters`]
//! to form a [`MappingInstance`], which is trained once and then applied to
//! any number of datasets. Instances compose with [`sequential`] and
//! [`parallel`], and composites are instances again.
//!
//! ```ignore
//! use ml_map_core::{sequential, Dataset};
//!
//! let chain = sequential(vec![scaling, classifier])?.trained(&train)?;
//! let scores = chain.apply(&test)?.into_dataset()?;
//! ```

#![warn(missing_docs)]

pub mod compose;
pub mod dataset;
pub mod definition;
pub mod dispatch;
pub mod error;
pub mod hyperparams;
pub mod instance;
pub mod output;
pub mod task;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use compose::{parallel, sequential};
pub use dataset::{Dataset, DatasetBuilder};
pub use definition::{
    DefinitionKind, Description, Fitted, FittedParams, MappingDefinition, OutputKind,
};
pub use dispatch::{Executor, ExecutorConfig};
pub use error::{Error, Result};
pub use hyperparams::{HyperValue, Hyperparameters};
pub use instance::{CompositionMode, LeafMapping, LifecycleState, MappingInstance};
pub use output::{Output, OutputLabels, RawValue};
pub use task::{run_selector, run_task, Task, TaskOutput, TaskRequest};
