//! Mapping instances: bound hyperparameters, lifecycle state and fitted parameters

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::definition::{DefinitionKind, Fitted, FittedParams, MappingDefinition, OutputKind};
use crate::dispatch::Executor;
use crate::error::{Error, Result};
use crate::hyperparams::Hyperparameters;
use crate::output::{Output, OutputLabels};

/// Lifecycle state of a mapping instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created, not yet trained; `apply` fails
    Untrained,

    /// Trained on a dataset
    Trained,

    /// Usable without training
    Fixed,
}

impl LifecycleState {
    /// Whether `apply` may be called
    pub fn is_usable(self) -> bool {
        !matches!(self, LifecycleState::Untrained)
    }
}

/// How a composite combines its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionMode {
    /// Each child feeds the next
    Sequential,

    /// Every child sees the same input; outputs are concatenated column-wise
    Parallel,
}

/// A single mapping bound to a definition
#[derive(Clone)]
pub struct LeafMapping {
    /// Shared definition
    definition: Arc<dyn MappingDefinition>,

    /// Hyperparameters bound at construction
    hyperparameters: Hyperparameters,

    /// Current lifecycle state
    state: LifecycleState,

    /// Parameters and labels, present once trained or fixed
    fitted: Option<Fitted>,
}

impl LeafMapping {
    /// Get the definition of this mapping
    pub fn definition(&self) -> &Arc<dyn MappingDefinition> {
        &self.definition
    }

    /// Get the name of this mapping
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Get the bound hyperparameters
    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Get the lifecycle state
    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    /// Get the fitted parameters, if trained or fixed
    pub fn fitted_parameters(&self) -> Option<&FittedParams> {
        self.fitted.as_ref().map(|fitted| &fitted.params)
    }

    /// Get the output labels, if trained or fixed
    pub fn output_labels(&self) -> Option<&OutputLabels> {
        self.fitted.as_ref().map(|fitted| &fitted.output_labels)
    }

    /// Borrow the fitted parameters as a concrete type
    pub fn params<T: Any>(&self) -> Result<&T> {
        self.fitted_parameters()
            .ok_or_else(|| Error::NotTrained {
                name: self.name().to_string(),
            })?
            .downcast_ref::<T>()
    }

    pub(crate) fn install(&mut self, fitted: Fitted) {
        self.fitted = Some(fitted);
        self.state = LifecycleState::Trained;
    }

    fn reset(&mut self) {
        if self.state == LifecycleState::Trained {
            self.fitted = None;
            self.state = LifecycleState::Untrained;
        }
    }
}

impl fmt::Debug for LeafMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafMapping")
            .field("name", &self.name())
            .field("hyperparameters", &self.hyperparameters)
            .field("state", &self.state)
            .field("output_labels", &self.output_labels())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(LeafMapping),
    Composite {
        mode: CompositionMode,
        children: Vec<MappingInstance>,
    },
}

/// A mapping that can be trained on a dataset and applied to datasets
///
/// Either a single definition bound to hyperparameters, or a sequential or
/// parallel composite built with [`sequential`](crate::sequential) and
/// [`parallel`](crate::parallel). Composites satisfy the same contract as
/// single mappings.
#[derive(Debug, Clone)]
pub struct MappingInstance {
    pub(crate) node: Node,
}

impl MappingInstance {
    /// Instantiate a definition with its default hyperparameters
    ///
    /// Fixed definitions yield an instance that is usable immediately.
    pub fn new(definition: Arc<dyn MappingDefinition>) -> Self {
        let hyperparameters = definition.default_hyperparameters();
        Self::bind(definition, hyperparameters)
    }

    /// Instantiate a definition with explicit hyperparameters
    ///
    /// The record must have the same names, order and value kinds as the
    /// definition's defaults.
    pub fn with_hyperparameters(
        definition: Arc<dyn MappingDefinition>,
        hyperparameters: Hyperparameters,
    ) -> Result<Self> {
        hyperparameters.conforms_to(&definition.default_hyperparameters())?;
        Ok(Self::bind(definition, hyperparameters))
    }

    fn bind(definition: Arc<dyn MappingDefinition>, hyperparameters: Hyperparameters) -> Self {
        let (state, fitted) = match definition.kind() {
            DefinitionKind::Trainable => (LifecycleState::Untrained, None),
            DefinitionKind::Fixed => {
                let fitted = Fitted::placeholder(definition.fixed_output_labels(&hyperparameters));
                (LifecycleState::Fixed, Some(fitted))
            }
        };

        Self {
            node: Node::Leaf(LeafMapping {
                definition,
                hyperparameters,
                state,
                fitted,
            }),
        }
    }

    pub(crate) fn composite(mode: CompositionMode, children: Vec<MappingInstance>) -> Self {
        Self {
            node: Node::Composite { mode, children },
        }
    }

    /// Display name; composites list their children
    pub fn name(&self) -> String {
        match &self.node {
            Node::Leaf(leaf) => leaf.name().to_string(),
            Node::Composite { mode, children } => {
                let names: Vec<String> = children.iter().map(MappingInstance::name).collect();
                format!("{mode:?}({})", names.join(", "))
            }
        }
    }

    /// Bound hyperparameters; composites have none of their own
    pub fn hyperparameters(&self) -> Hyperparameters {
        match &self.node {
            Node::Leaf(leaf) => leaf.hyperparameters.clone(),
            Node::Composite { .. } => Hyperparameters::empty(),
        }
    }

    /// Lifecycle state
    ///
    /// A composite is trained once every child is trained or fixed.
    pub fn lifecycle_state(&self) -> LifecycleState {
        match &self.node {
            Node::Leaf(leaf) => leaf.state,
            Node::Composite { children, .. } => {
                if children.iter().all(|child| child.lifecycle_state().is_usable()) {
                    LifecycleState::Trained
                } else {
                    LifecycleState::Untrained
                }
            }
        }
    }

    /// Output feature labels, once every part is trained or fixed
    pub fn output_feature_labels(&self) -> Option<OutputLabels> {
        match &self.node {
            Node::Leaf(leaf) => leaf.output_labels().cloned(),
            Node::Composite { mode, children } => {
                let mut labels = children.iter().map(MappingInstance::output_feature_labels);
                match mode {
                    CompositionMode::Sequential => {
                        let first = labels.next()??;
                        labels.try_fold(first, |acc, next| Some(acc.then(&next?)))
                    }
                    CompositionMode::Parallel => {
                        labels.collect::<Option<Vec<_>>>().map(OutputLabels::stack)
                    }
                }
            }
        }
    }

    /// Fitted parameters of a single mapping
    ///
    /// Composites keep their children's parameters; see [`children`](Self::children).
    pub fn fitted_parameters(&self) -> Option<&FittedParams> {
        self.as_leaf().and_then(LeafMapping::fitted_parameters)
    }

    /// The single mapping, if this is not a composite
    pub fn as_leaf(&self) -> Option<&LeafMapping> {
        match &self.node {
            Node::Leaf(leaf) => Some(leaf),
            Node::Composite { .. } => None,
        }
    }

    /// Composition mode, if this is a composite
    pub fn mode(&self) -> Option<CompositionMode> {
        match &self.node {
            Node::Leaf(_) => None,
            Node::Composite { mode, .. } => Some(*mode),
        }
    }

    /// Children of a composite; empty for a single mapping
    pub fn children(&self) -> &[MappingInstance] {
        match &self.node {
            Node::Leaf(_) => &[],
            Node::Composite { children, .. } => children,
        }
    }

    /// Whether `apply` is known to yield a raw value, before or after training
    pub fn declares_terminal_output(&self) -> bool {
        match &self.node {
            Node::Leaf(leaf) => match leaf.output_labels() {
                Some(labels) => labels.is_terminal(),
                None => {
                    leaf.definition.declared_output(&leaf.hyperparameters) == OutputKind::Terminal
                }
            },
            Node::Composite {
                mode: CompositionMode::Sequential,
                children,
            } => children
                .last()
                .is_some_and(MappingInstance::declares_terminal_output),
            Node::Composite { .. } => false,
        }
    }

    /// Train on `data`, replacing any earlier training
    ///
    /// Fixed mappings are left untouched. On failure the instance is unchanged.
    pub fn train(&mut self, data: &Dataset) -> Result<()> {
        Executor::default().train(self, data)
    }

    /// Train on `data` and return the trained instance
    pub fn trained(mut self, data: &Dataset) -> Result<Self> {
        self.train(data)?;
        Ok(self)
    }

    /// Apply to `data`
    pub fn apply(&self, data: &Dataset) -> Result<Output> {
        Executor::default().apply(self, data)
    }

    /// Forget training; fixed mappings stay usable
    pub fn reset(&mut self) {
        match &mut self.node {
            Node::Leaf(leaf) => leaf.reset(),
            Node::Composite { children, .. } => children.iter_mut().for_each(MappingInstance::reset),
        }
    }
}

impl From<LeafMapping> for MappingInstance {
    fn from(leaf: LeafMapping) -> Self {
        Self {
            node: Node::Leaf(leaf),
        }
    }
}

static_assertions::assert_impl_all!(MappingInstance: Send, Sync, Clone);
static_assertions::assert_impl_all!(LeafMapping: Send, Sync);
