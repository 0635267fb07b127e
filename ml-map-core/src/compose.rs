//! Builders for sequential and parallel composites

use tracing::debug;

use crate::error::{Error, Result};
use crate::instance::{CompositionMode, MappingInstance, Node};

/// Chain mappings so that each one feeds the next
///
/// Nested sequences are flattened, so `sequential([a, sequential([b, c])])`
/// behaves exactly like `sequential([a, b, c])`. A single mapping is returned
/// as is. Fails if any stage but the last is known to produce a terminal
/// output.
pub fn sequential(stages: Vec<MappingInstance>) -> Result<MappingInstance> {
    if stages.is_empty() {
        return Err(Error::InvalidArgument(
            "A sequential mapping needs at least one stage".into(),
        ));
    }

    let mut flat = Vec::with_capacity(stages.len());
    for stage in stages {
        match stage.node {
            Node::Composite {
                mode: CompositionMode::Sequential,
                children,
            } => flat.extend(children),
            node => flat.push(MappingInstance { node }),
        }
    }

    if let Some((index, stage)) = flat[..flat.len() - 1]
        .iter()
        .enumerate()
        .find(|(_, stage)| stage.declares_terminal_output())
    {
        return Err(Error::CompositionType(format!(
            "Stage {index} ('{}') produces a terminal output and cannot feed '{}'",
            stage.name(),
            flat[index + 1].name()
        )));
    }

    if flat.len() == 1 {
        return Ok(flat.remove(0));
    }

    let chain = MappingInstance::composite(CompositionMode::Sequential, flat);
    debug!(mapping = %chain.name(), "built sequential mapping");
    Ok(chain)
}

/// Apply mappings side by side to the same input and join their outputs column-wise
///
/// Children keep their identity: nested parallel composites are not
/// flattened. Colliding output labels are suffixed with the child index.
/// Fails if any child is known to produce a terminal output.
pub fn parallel(children: Vec<MappingInstance>) -> Result<MappingInstance> {
    if children.is_empty() {
        return Err(Error::InvalidArgument(
            "A parallel mapping needs at least one child".into(),
        ));
    }

    if let Some((index, child)) = children
        .iter()
        .enumerate()
        .find(|(_, child)| child.declares_terminal_output())
    {
        return Err(Error::CompositionType(format!(
            "Parallel child {index} ('{}') produces a terminal output",
            child.name()
        )));
    }

    let stacked = MappingInstance::composite(CompositionMode::Parallel, children);
    debug!(mapping = %stacked.name(), "built parallel mapping");
    Ok(stacked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::dataset::Dataset;
    use crate::instance::LifecycleState;
    use crate::output::OutputLabels;
    use crate::test_support::{Centre, Negate, Score, Widen};

    fn centre() -> MappingInstance {
        MappingInstance::new(Arc::new(Centre))
    }

    fn negate() -> MappingInstance {
        MappingInstance::new(Arc::new(Negate))
    }

    fn score() -> MappingInstance {
        MappingInstance::new(Arc::new(Score))
    }

    fn widen(by: usize) -> MappingInstance {
        MappingInstance::new(Arc::new(Widen(by)))
    }

    #[test]
    fn test_sequential_flattens_nested_chains() {
        let nested = sequential(vec![centre(), sequential(vec![negate(), centre()]).unwrap()]).unwrap();
        assert_eq!(nested.mode(), Some(CompositionMode::Sequential));
        assert_eq!(nested.children().len(), 3);
        assert_eq!(nested.name(), "Sequential(Centre, Negate, Centre)");
    }

    #[test]
    fn test_sequential_of_one_is_the_stage() {
        let single = sequential(vec![negate()]).unwrap();
        assert!(single.as_leaf().is_some());
    }

    #[test]
    fn test_empty_compositions_rejected() {
        assert!(matches!(sequential(Vec::new()), Err(Error::InvalidArgument(_))));
        assert!(matches!(parallel(Vec::new()), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_terminal_stage_rejected_at_build() {
        let result = sequential(vec![score(), negate()]);
        assert!(matches!(result, Err(Error::CompositionType(_))));

        // Terminal last stage is fine
        assert!(sequential(vec![negate(), score()]).is_ok());

        // A chain ending in a terminal stage is itself terminal
        let ends_in_score = sequential(vec![negate(), score()]).unwrap();
        assert!(sequential(vec![ends_in_score, negate()]).is_err());
    }

    #[test]
    fn test_parallel_rejects_terminal_child() {
        let result = parallel(vec![negate(), score()]);
        assert!(matches!(result, Err(Error::CompositionType(_))));
    }

    #[test]
    fn test_parallel_is_not_flattened() {
        let inner = parallel(vec![negate(), negate()]).unwrap();
        let outer = parallel(vec![inner, centre()]).unwrap();
        assert_eq!(outer.children().len(), 2);
    }

    #[test]
    fn test_composite_state_follows_children() {
        let data = Dataset::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let mut chain = sequential(vec![negate(), centre()]).unwrap();
        assert_eq!(chain.lifecycle_state(), LifecycleState::Untrained);
        assert!(chain.output_feature_labels().is_none());

        chain.train(&data).unwrap();
        assert_eq!(chain.lifecycle_state(), LifecycleState::Trained);
        assert_eq!(chain.output_feature_labels(), Some(OutputLabels::SameAsInput));

        let fixed_only = parallel(vec![negate(), negate()]).unwrap();
        assert_eq!(fixed_only.lifecycle_state(), LifecycleState::Trained);
    }

    fn matrix_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
        (1usize..6, 1usize..4).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(prop::collection::vec(-100.0..100.0f64, cols), rows)
        })
    }

    proptest! {
        #[test]
        fn prop_sequential_nesting_is_associative(rows in matrix_strategy()) {
            let data = Dataset::from_rows(&rows).unwrap();

            let left = sequential(vec![sequential(vec![centre(), negate()]).unwrap(), centre()]).unwrap();
            let right = sequential(vec![centre(), sequential(vec![negate(), centre()]).unwrap()]).unwrap();
            let flat = sequential(vec![centre(), negate(), centre()]).unwrap();

            let left = left.trained(&data).unwrap().apply(&data).unwrap();
            let right = right.trained(&data).unwrap().apply(&data).unwrap();
            let flat = flat.trained(&data).unwrap().apply(&data).unwrap();

            prop_assert_eq!(&left, &flat);
            prop_assert_eq!(&right, &flat);
        }

        #[test]
        fn prop_parallel_column_count(rows in matrix_strategy(), widths in prop::collection::vec(1usize..4, 1..4)) {
            let data = Dataset::from_rows(&rows).unwrap();
            let children = widths.iter().map(|w| widen(*w)).collect();
            let stacked = parallel(children).unwrap();

            let out = stacked.apply(&data).unwrap().into_dataset().unwrap();
            prop_assert_eq!(out.row_count(), data.row_count());
            prop_assert_eq!(out.feature_count(), widths.iter().sum::<usize>());
            prop_assert_eq!(out.feature_labels().len(), out.feature_count());
        }
    }
}
