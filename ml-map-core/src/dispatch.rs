//! Execution of training and application over single and composite mappings

use std::borrow::Cow;

use ndarray::{concatenate, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::instance::{CompositionMode, LeafMapping, LifecycleState, MappingInstance, Node};
use crate::output::{cast, disambiguate, Output};

/// Configuration for an executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Run the children of parallel composites on the rayon pool
    ///
    /// Ignored unless the `parallel` feature is enabled.
    pub parallel: bool,

    /// Minimum number of children before a parallel composite uses the pool
    pub parallel_threshold: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            parallel_threshold: 2,
        }
    }
}

/// Trains and applies mapping instances
///
/// Sequential composites run strictly in order. Parallel composites may run
/// their children concurrently; results are always joined in child order.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    /// Configuration for this executor
    config: ExecutorConfig,
}

impl Executor {
    /// Create a new executor
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration of this executor
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Train `instance` on `data`
    ///
    /// The instance is replaced only if every part trains successfully.
    pub fn train(&self, instance: &mut MappingInstance, data: &Dataset) -> Result<()> {
        let mut staged = instance.clone();
        self.train_in_place(&mut staged, data)?;
        *instance = staged;
        Ok(())
    }

    /// Apply a trained or fixed `instance` to `data`
    pub fn apply(&self, instance: &MappingInstance, data: &Dataset) -> Result<Output> {
        match &instance.node {
            Node::Leaf(leaf) => Self::apply_leaf(leaf, data),
            Node::Composite {
                mode: CompositionMode::Sequential,
                children,
            } => self.apply_sequential(children, data),
            Node::Composite {
                mode: CompositionMode::Parallel,
                children,
            } => self.apply_parallel(children, data),
        }
    }

    fn train_in_place(&self, instance: &mut MappingInstance, data: &Dataset) -> Result<()> {
        match &mut instance.node {
            Node::Leaf(leaf) => Self::train_leaf(leaf, data),
            Node::Composite {
                mode: CompositionMode::Sequential,
                children,
            } => self.train_sequential(children, data),
            Node::Composite {
                mode: CompositionMode::Parallel,
                children,
            } => self.train_children(children, data),
        }
    }

    fn train_leaf(leaf: &mut LeafMapping, data: &Dataset) -> Result<()> {
        match leaf.lifecycle_state() {
            LifecycleState::Fixed => {
                trace!(mapping = leaf.name(), "fixed mapping, training skipped");
                return Ok(());
            }
            LifecycleState::Trained => {
                warn!(mapping = leaf.name(), "retraining a trained mapping");
            }
            LifecycleState::Untrained => {}
        }

        debug!(
            mapping = leaf.name(),
            rows = data.row_count(),
            features = data.feature_count(),
            "training mapping"
        );

        let fitted = leaf
            .definition()
            .train(data, leaf.hyperparameters())?;
        leaf.install(fitted);
        Ok(())
    }

    fn train_sequential(&self, children: &mut [MappingInstance], data: &Dataset) -> Result<()> {
        let last = children.len().saturating_sub(1);
        let mut current = Cow::Borrowed(data);

        for (index, child) in children.iter_mut().enumerate() {
            self.train_in_place(child, &current)?;
            if index < last {
                let next = self.apply(child, &current)?;
                current = Cow::Owned(Self::stage_dataset(next, index, child)?);
            }
        }

        Ok(())
    }

    fn apply_leaf(leaf: &LeafMapping, data: &Dataset) -> Result<Output> {
        let labels = leaf.output_labels().ok_or_else(|| Error::NotTrained {
            name: leaf.name().to_string(),
        })?;

        trace!(mapping = leaf.name(), rows = data.row_count(), "applying mapping");

        let matrix = leaf.definition().apply(data, leaf)?;
        cast(matrix, data, labels)
    }

    fn apply_sequential(&self, children: &[MappingInstance], data: &Dataset) -> Result<Output> {
        let (last, stages) = children
            .split_last()
            .ok_or_else(|| Error::InvalidOperation("Empty sequential mapping".into()))?;

        let mut current = Cow::Borrowed(data);
        for (index, child) in stages.iter().enumerate() {
            let next = self.apply(child, &current)?;
            current = Cow::Owned(Self::stage_dataset(next, index, child)?);
        }

        self.apply(last, &current)
    }

    fn apply_parallel(&self, children: &[MappingInstance], data: &Dataset) -> Result<Output> {
        let outputs = self.apply_children(children, data)?;

        let mut blocks = Vec::with_capacity(outputs.len());
        for (index, output) in outputs.into_iter().enumerate() {
            let block = output.into_dataset().map_err(|_| {
                Error::CompositionType(format!(
                    "Parallel child {index} ('{}') produced a terminal output",
                    children[index].name()
                ))
            })?;
            blocks.push(block);
        }

        let views: Vec<_> = blocks.iter().map(|block| block.matrix().view()).collect();
        let matrix = concatenate(Axis(1), &views).map_err(|e| {
            Error::CompositionType(format!("Parallel outputs cannot be joined: {e}"))
        })?;

        let labels = disambiguate(
            blocks
                .iter()
                .map(|block| block.feature_labels().to_vec())
                .collect(),
        );

        let data = Dataset::new(matrix, data.sample_labels().to_vec(), labels)?;
        Ok(Output::Dataset(data))
    }

    fn stage_dataset(output: Output, index: usize, stage: &MappingInstance) -> Result<Dataset> {
        output.into_dataset().map_err(|_| {
            Error::CompositionType(format!(
                "Stage {index} ('{}') produced a terminal output and cannot feed the next stage",
                stage.name()
            ))
        })
    }

    #[cfg(feature = "parallel")]
    fn runs_parallel(&self, children: usize) -> bool {
        self.config.parallel && children >= self.config.parallel_threshold
    }

    #[cfg(feature = "parallel")]
    fn train_children(&self, children: &mut [MappingInstance], data: &Dataset) -> Result<()> {
        use rayon::prelude::*;

        if self.runs_parallel(children.len()) {
            children
                .par_iter_mut()
                .try_for_each(|child| self.train_in_place(child, data))
        } else {
            children
                .iter_mut()
                .try_for_each(|child| self.train_in_place(child, data))
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn train_children(&self, children: &mut [MappingInstance], data: &Dataset) -> Result<()> {
        children
            .iter_mut()
            .try_for_each(|child| self.train_in_place(child, data))
    }

    #[cfg(feature = "parallel")]
    fn apply_children(&self, children: &[MappingInstance], data: &Dataset) -> Result<Vec<Output>> {
        use rayon::prelude::*;

        if self.runs_parallel(children.len()) {
            children.par_iter().map(|child| self.apply(child, data)).collect()
        } else {
            children.iter().map(|child| self.apply(child, data)).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn apply_children(&self, children: &[MappingInstance], data: &Dataset) -> Result<Vec<Output>> {
        children.iter().map(|child| self.apply(child, data)).collect()
    }
}
