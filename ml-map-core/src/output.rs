//! Output labels and the policy that turns a raw matrix into an output

use std::collections::{HashMap, HashSet};

use ndarray::Array2;

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Feature labels a trained mapping emits
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLabels {
    /// Explicit labels, one per output column
    Named(Vec<String>),

    /// The input's feature labels, unchanged
    SameAsInput,

    /// No labels: `apply` yields a raw value
    Terminal,

    /// Column-wise concatenation of several outputs
    Stacked(Vec<OutputLabels>),
}

impl OutputLabels {
    /// Whether this mapping ends a composition
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputLabels::Terminal)
    }

    /// Concrete labels for an input with the given feature labels
    ///
    /// An empty result means the output is a raw value.
    pub fn resolve(&self, input: &[String]) -> Vec<String> {
        match self {
            OutputLabels::Named(labels) => labels.clone(),
            OutputLabels::SameAsInput => input.to_vec(),
            OutputLabels::Terminal => Vec::new(),
            OutputLabels::Stacked(parts) => {
                disambiguate(parts.iter().map(|part| part.resolve(input)).collect())
            }
        }
    }

    /// Labels of `next` applied to the output of a stage labelled `self`
    pub fn then(&self, next: &OutputLabels) -> OutputLabels {
        match next {
            OutputLabels::SameAsInput => self.clone(),
            OutputLabels::Stacked(parts) => {
                OutputLabels::stack(parts.iter().map(|part| self.then(part)).collect())
            }
            other => other.clone(),
        }
    }

    /// Labels of a column-wise concatenation
    pub fn stack(parts: Vec<OutputLabels>) -> OutputLabels {
        if parts.iter().all(|part| matches!(part, OutputLabels::Named(_))) {
            let names = parts
                .into_iter()
                .map(|part| match part {
                    OutputLabels::Named(labels) => labels,
                    _ => Vec::new(),
                })
                .collect();
            OutputLabels::Named(disambiguate(names))
        } else {
            OutputLabels::Stacked(parts)
        }
    }
}

/// Concatenate per-child label groups into one sequence of distinct labels
///
/// A label that occurs once is kept. Every occurrence of a repeated label,
/// within one group or across groups, becomes `{label}_{child}`; if that name
/// is already in use, `_{k}` is appended with the smallest free `k`.
pub fn disambiguate(groups: Vec<Vec<String>>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in groups.iter().flatten() {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut taken: HashSet<String> = counts
        .iter()
        .filter(|(_, count)| **count == 1)
        .map(|(label, _)| (*label).to_string())
        .collect();

    let mut out = Vec::with_capacity(groups.iter().map(Vec::len).sum());
    for (child, labels) in groups.iter().enumerate() {
        for label in labels {
            if counts[label.as_str()] == 1 {
                out.push(label.clone());
                continue;
            }

            let base = format!("{label}_{child}");
            let mut candidate = base.clone();
            let mut k = 1;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{k}");
                k += 1;
            }
            taken.insert(candidate.clone());
            out.push(candidate);
        }
    }
    out
}

/// A terminal result that cannot feed a further mapping
///
/// A 1×1 result is always reported as [`RawValue::Scalar`], whatever the
/// mapping computed; a terminal mapping applied to a single sample with a
/// single output column yields a scalar too. Use [`RawValue::into_array`]
/// when the matrix shape matters.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Single number, such as an error rate
    Scalar(f64),

    /// Unlabelled matrix
    Array(Array2<f64>),
}

impl RawValue {
    /// The value as a matrix; a scalar becomes 1×1
    pub fn into_array(self) -> Array2<f64> {
        match self {
            RawValue::Scalar(value) => Array2::from_elem((1, 1), value),
            RawValue::Array(matrix) => matrix,
        }
    }
}

impl From<Array2<f64>> for RawValue {
    fn from(matrix: Array2<f64>) -> Self {
        if matrix.dim() == (1, 1) {
            RawValue::Scalar(matrix[[0, 0]])
        } else {
            RawValue::Array(matrix)
        }
    }
}

/// Result of applying a mapping
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Labelled dataset, usable as input to another mapping
    Dataset(Dataset),

    /// Terminal raw value
    Raw(RawValue),
}

impl Output {
    /// Whether this output ends a composition
    pub fn is_terminal(&self) -> bool {
        matches!(self, Output::Raw(_))
    }

    /// Borrow the dataset, if any
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Output::Dataset(data) => Some(data),
            Output::Raw(_) => None,
        }
    }

    /// The scalar value, if this is a scalar raw output
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Output::Raw(RawValue::Scalar(value)) => Some(*value),
            _ => None,
        }
    }

    /// Unwrap a dataset, rejecting terminal outputs
    pub fn into_dataset(self) -> Result<Dataset> {
        match self {
            Output::Dataset(data) => Ok(data),
            Output::Raw(_) => Err(Error::CompositionType(
                "A terminal output cannot be used as a dataset".into(),
            )),
        }
    }
}

/// Wrap the raw result of `apply` according to the mapping's output labels
///
/// Non-empty labels produce a dataset carrying the input's sample labels; it
/// must keep the input's row count and have one column per label. Empty
/// labels produce a raw value.
pub fn cast(matrix: Array2<f64>, input: &Dataset, labels: &OutputLabels) -> Result<Output> {
    let feature_labels = labels.resolve(input.feature_labels());
    if feature_labels.is_empty() {
        return Ok(Output::Raw(RawValue::from(matrix)));
    }

    if matrix.nrows() != input.row_count() {
        return Err(Error::CompositionType(format!(
            "Mapping produced {} rows from {} input rows",
            matrix.nrows(),
            input.row_count()
        )));
    }

    if matrix.ncols() != feature_labels.len() {
        return Err(Error::CompositionType(format!(
            "Mapping produced {} columns for {} output labels",
            matrix.ncols(),
            feature_labels.len()
        )));
    }

    let data = Dataset::new(matrix, input.sample_labels().to_vec(), feature_labels)?;
    Ok(Output::Dataset(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use test_case::test_case;

    fn named(labels: &[&str]) -> OutputLabels {
        OutputLabels::Named(labels.iter().map(|s| s.to_string()).collect())
    }

    fn input() -> Dataset {
        Dataset::new(
            array![[1.0, 2.0], [3.0, 4.0]],
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_disambiguate_suffixes_only_collisions() {
        let labels = disambiguate(vec![
            vec!["x".into(), "y".into()],
            vec!["x".into(), "z".into()],
        ]);
        assert_eq!(labels, ["x_0", "y", "x_1", "z"]);
    }

    #[test]
    fn test_disambiguate_avoids_existing_labels() {
        let labels = disambiguate(vec![
            vec!["x".into(), "x_1".into()],
            vec!["x".into()],
        ]);
        assert_eq!(labels, ["x_0", "x_1", "x_1_1"]);
    }

    #[test]
    fn test_disambiguate_repeats_within_one_child() {
        let labels = disambiguate(vec![vec!["a".into(), "a".into()], vec!["a".into()]]);
        assert_eq!(labels, ["a_0", "a_0_1", "a_1"]);
    }

    #[test]
    fn test_stacked_labels_match_disambiguation() {
        let stacked = OutputLabels::stack(vec![OutputLabels::SameAsInput, named(&["x"])]);
        let input: Vec<String> = vec!["x".into(), "x_1".into()];
        let resolved = stacked.resolve(&input);
        assert_eq!(resolved, ["x_0", "x_1", "x_1_1"]);
        assert_eq!(
            resolved,
            disambiguate(vec![input.clone(), vec!["x".into()]])
        );
    }

    #[test_case(array![[0.5]], RawValue::Scalar(0.5) ; "one by one")]
    #[test_case(array![[0.5, 0.5]], RawValue::Array(array![[0.5, 0.5]]) ; "one row")]
    #[test_case(array![[0.5], [0.5]], RawValue::Array(array![[0.5], [0.5]]) ; "one column")]
    fn test_raw_value_from_matrix(matrix: Array2<f64>, expected: RawValue) {
        let raw = RawValue::from(matrix.clone());
        assert_eq!(raw, expected);
        assert_eq!(raw.into_array(), matrix);
    }

    #[test]
    fn test_then_keeps_previous_for_same_as_input() {
        let scaled = named(&["x", "y"]);
        assert_eq!(scaled.then(&OutputLabels::SameAsInput), scaled);
        assert_eq!(scaled.then(&OutputLabels::Terminal), OutputLabels::Terminal);
    }

    #[test]
    fn test_stack_resolves_lazily_with_input_labels() {
        let stacked = OutputLabels::stack(vec![named(&["p"]), OutputLabels::SameAsInput]);
        assert!(matches!(stacked, OutputLabels::Stacked(_)));
        assert_eq!(stacked.resolve(&["x".into(), "y".into()]), ["p", "x", "y"]);

        let resolved = named(&["x"]).then(&stacked);
        assert_eq!(resolved, named(&["p", "x"]));
    }

    #[test]
    fn test_cast_wraps_dataset_with_sample_labels() {
        let output = cast(array![[0.5], [0.7]], &input(), &named(&["s"])).unwrap();
        let data = output.as_dataset().unwrap();
        assert_eq!(data.sample_labels(), ["a", "b"]);
        assert_eq!(data.feature_labels(), ["s"]);
    }

    #[test]
    fn test_cast_returns_raw_for_terminal() {
        let output = cast(array![[0.25]], &input(), &OutputLabels::Terminal).unwrap();
        assert_eq!(output.scalar(), Some(0.25));
        assert!(output.clone().into_dataset().is_err());
    }

    #[test]
    fn test_cast_rejects_row_count_change() {
        let result = cast(array![[1.0, 2.0]], &input(), &OutputLabels::SameAsInput);
        assert!(matches!(result, Err(Error::CompositionType(_))));
    }

    #[test]
    fn test_cast_rejects_label_count_mismatch() {
        let result = cast(array![[1.0], [2.0]], &input(), &named(&["a", "b"]));
        assert!(matches!(result, Err(Error::CompositionType(_))));
    }
}
