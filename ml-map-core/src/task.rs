//! Task selectors for callers that name lifecycle operations textually

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::Array2;
use tracing::trace;

use crate::dataset::Dataset;
use crate::definition::{DefinitionKind, Description, Fitted, MappingDefinition};
use crate::error::{Error, Result};
use crate::hyperparams::Hyperparameters;
use crate::instance::MappingInstance;

/// One of the four lifecycle operations of a mapping definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Name and default hyperparameters
    Describe,

    /// Learn parameters from a dataset
    Train,

    /// Map a dataset with a trained instance
    Apply,

    /// Build a new instance
    Construct,
}

impl Task {
    /// The selector naming this task
    pub fn as_str(self) -> &'static str {
        match self {
            Task::Describe => "describe",
            Task::Train => "train",
            Task::Apply => "apply",
            Task::Construct => "construct",
        }
    }
}

impl FromStr for Task {
    type Err = Error;

    /// Parse a selector; the empty selector means construction
    fn from_str(selector: &str) -> Result<Self> {
        match selector {
            "describe" => Ok(Task::Describe),
            "train" => Ok(Task::Train),
            "apply" => Ok(Task::Apply),
            "construct" | "" => Ok(Task::Construct),
            other => Err(Error::UnsupportedTask {
                selector: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments for [`run_task`]
#[derive(Debug, Default)]
pub struct TaskRequest<'a> {
    /// Input dataset, required by train and apply
    pub dataset: Option<&'a Dataset>,

    /// Hyperparameters; the definition's defaults when absent
    pub hyperparameters: Option<Hyperparameters>,

    /// Trained instance, required by apply
    pub trained: Option<&'a MappingInstance>,
}

/// Answer of [`run_task`]
#[derive(Debug)]
pub enum TaskOutput {
    /// From describe
    Description(Description),

    /// From train
    Fitted(Fitted),

    /// From apply: the raw matrix before output casting
    Matrix(Array2<f64>),

    /// From construct
    Instance(MappingInstance),
}

/// Run one lifecycle task of `definition`
pub fn run_task(
    definition: &Arc<dyn MappingDefinition>,
    task: Task,
    request: TaskRequest<'_>,
) -> Result<TaskOutput> {
    match task {
        Task::Describe => Ok(TaskOutput::Description(
            definition.describe(request.hyperparameters.as_ref()),
        )),
        Task::Train => {
            let data = require(request.dataset, task)?;
            let hyperparameters = bound(definition, request.hyperparameters)?;
            if definition.kind() == DefinitionKind::Fixed {
                trace!(mapping = definition.name(), "fixed mapping, returning placeholder");
                return Ok(TaskOutput::Fitted(Fitted::placeholder(
                    definition.fixed_output_labels(&hyperparameters),
                )));
            }
            definition
                .train(data, &hyperparameters)
                .map(TaskOutput::Fitted)
        }
        Task::Apply => {
            let data = require(request.dataset, task)?;
            let leaf = require(request.trained, task)?.as_leaf().ok_or_else(|| {
                Error::InvalidArgument("The apply task expects a single mapping".into())
            })?;
            if !leaf.lifecycle_state().is_usable() {
                return Err(Error::NotTrained {
                    name: leaf.name().to_string(),
                });
            }
            definition.apply(data, leaf).map(TaskOutput::Matrix)
        }
        Task::Construct => {
            let hyperparameters = bound(definition, request.hyperparameters)?;
            MappingInstance::with_hyperparameters(Arc::clone(definition), hyperparameters)
                .map(TaskOutput::Instance)
        }
    }
}

/// Parse `selector` and run the task it names
pub fn run_selector(
    definition: &Arc<dyn MappingDefinition>,
    selector: &str,
    request: TaskRequest<'_>,
) -> Result<TaskOutput> {
    run_task(definition, selector.parse()?, request)
}

fn require<T>(value: Option<T>, task: Task) -> Result<T> {
    value.ok_or_else(|| Error::InvalidArgument(format!("The {task} task needs more input")))
}

fn bound(
    definition: &Arc<dyn MappingDefinition>,
    hyperparameters: Option<Hyperparameters>,
) -> Result<Hyperparameters> {
    let defaults = definition.default_hyperparameters();
    match hyperparameters {
        Some(hyperparameters) => {
            hyperparameters.conforms_to(&defaults)?;
            Ok(hyperparameters)
        }
        None => Ok(defaults),
    }
}
