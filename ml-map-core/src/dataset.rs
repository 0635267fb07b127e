//! In-memory dataset: a sample-by-feature matrix with sample and feature labels

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::error::{Error, Result};

/// A labelled matrix of `N` samples by `D` features
///
/// Mappings treat a dataset as read-only input and always produce a new one.
/// An empty `feature_labels` sequence marks a matrix that is not meant to be
/// fed into a further mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// The sample-by-feature values
    matrix: Array2<f64>,

    /// One label per sample, or none
    sample_labels: Vec<String>,

    /// One label per feature, or none
    feature_labels: Vec<String>,
}

impl Dataset {
    /// Create a dataset, checking that label sequences match the matrix shape
    pub fn new(
        matrix: Array2<f64>,
        sample_labels: Vec<String>,
        feature_labels: Vec<String>,
    ) -> Result<Self> {
        if !sample_labels.is_empty() && sample_labels.len() != matrix.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "{} sample labels for {} rows",
                sample_labels.len(),
                matrix.nrows()
            )));
        }

        if !feature_labels.is_empty() && feature_labels.len() != matrix.ncols() {
            return Err(Error::ShapeMismatch(format!(
                "{} feature labels for {} columns",
                feature_labels.len(),
                matrix.ncols()
            )));
        }

        Ok(Self {
            matrix,
            sample_labels,
            feature_labels,
        })
    }

    /// Create an unlabelled-sample dataset from row vectors
    ///
    /// Features are named `f0`, `f1`, ...
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        DatasetBuilder::new().rows(rows).build()
    }

    /// Get the matrix of this dataset
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Get the sample labels of this dataset
    pub fn sample_labels(&self) -> &[String] {
        &self.sample_labels
    }

    /// Get the feature labels of this dataset
    pub fn feature_labels(&self) -> &[String] {
        &self.feature_labels
    }

    /// Number of samples
    pub fn row_count(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of features
    pub fn feature_count(&self) -> usize {
        self.matrix.ncols()
    }

    /// Distinct sample labels in sorted order
    pub fn class_names(&self) -> Vec<String> {
        self.sample_labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// For every sample, the feature label of its largest value
    ///
    /// Ties resolve to the leftmost column.
    pub fn max_labels(&self) -> Result<Vec<String>> {
        if self.feature_labels.is_empty() {
            return Err(Error::InvalidArgument(
                "Dataset has no feature labels to choose from".into(),
            ));
        }

        let labels = self
            .matrix
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (j, value) in row.iter().enumerate() {
                    if *value > row[best] {
                        best = j;
                    }
                }
                self.feature_labels[best].clone()
            })
            .collect();

        Ok(labels)
    }
}

/// A builder for creating datasets
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    /// Row-major values
    values: Vec<f64>,

    /// Number of rows added
    rows: usize,

    /// Number of columns, fixed by the first row
    columns: Option<usize>,

    /// Sample labels
    sample_labels: Vec<String>,

    /// Feature labels
    feature_labels: Option<Vec<String>>,

    /// Set when a row disagrees with the column count
    ragged: bool,
}

impl DatasetBuilder {
    /// Create a new dataset builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single row
    pub fn row(mut self, row: &[f64]) -> Self {
        match self.columns {
            Some(columns) if columns != row.len() => self.ragged = true,
            _ => self.columns = Some(row.len()),
        }
        self.values.extend_from_slice(row);
        self.rows += 1;
        self
    }

    /// Append several rows
    pub fn rows(self, rows: &[Vec<f64>]) -> Self {
        rows.iter().fold(self, |builder, row| builder.row(row))
    }

    /// Set the sample labels
    pub fn sample_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.sample_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the feature labels
    pub fn feature_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.feature_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Build the dataset
    pub fn build(self) -> Result<Dataset> {
        if self.ragged {
            return Err(Error::ShapeMismatch(
                "All rows must have the same length".into(),
            ));
        }

        let columns = self.columns.unwrap_or(0);
        let matrix = Array2::from_shape_vec((self.rows, columns), self.values)
            .map_err(|e| Error::ShapeMismatch(e.to_string()))?;

        let feature_labels = self
            .feature_labels
            .unwrap_or_else(|| (0..columns).map(|j| format!("f{j}")).collect());

        Dataset::new(matrix, self.sample_labels, feature_labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_builder_names_features_by_default() {
        let data = Dataset::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

        assert_eq!(data.row_count(), 2);
        assert_eq!(data.feature_count(), 2);
        assert_eq!(data.feature_labels(), ["f0", "f1"]);
        assert!(data.sample_labels().is_empty());
    }

    #[test]
    fn test_builder_rejects_ragged_rows() {
        let result = DatasetBuilder::new()
            .row(&[1.0, 2.0])
            .row(&[3.0])
            .build();

        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_new_rejects_label_length_mismatch() {
        let result = Dataset::new(
            array![[1.0, 2.0]],
            vec!["a".into(), "b".into()],
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));

        let result = Dataset::new(array![[1.0, 2.0]], Vec::new(), vec!["x".into()]);
        assert!(matches!(result, Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_class_names_sorted_and_distinct() {
        let data = DatasetBuilder::new()
            .rows(&[vec![0.0], vec![1.0], vec![2.0]])
            .sample_labels(["b", "a", "b"])
            .build()
            .unwrap();

        assert_eq!(data.class_names(), ["a", "b"]);
    }

    #[test]
    fn test_max_labels_picks_leftmost_maximum() {
        let data = DatasetBuilder::new()
            .rows(&[vec![0.1, 0.9], vec![0.5, 0.5], vec![2.0, -1.0]])
            .feature_labels(["a", "b"])
            .build()
            .unwrap();

        assert_eq!(data.max_labels().unwrap(), ["b", "a", "a"]);
    }

    #[test]
    fn test_max_labels_requires_feature_labels() {
        let data = Dataset::new(array![[1.0]], Vec::new(), Vec::new()).unwrap();
        assert!(matches!(data.max_labels(), Err(Error::InvalidArgument(_))));
    }
}
