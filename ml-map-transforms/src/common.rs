//! Checks shared by the mapping definitions

use ml_map_core::{Dataset, Error, Result};

/// Fail unless `data` has at least one sample
pub(crate) fn require_rows(data: &Dataset, mapping: &str) -> Result<()> {
    if data.row_count() == 0 {
        return Err(Error::InvalidArgument(format!(
            "{mapping} needs at least one sample"
        )));
    }
    Ok(())
}

/// Fail unless `data` has the feature count seen during training
pub(crate) fn require_features(data: &Dataset, expected: usize, mapping: &str) -> Result<()> {
    if data.feature_count() != expected {
        return Err(Error::ShapeMismatch(format!(
            "{mapping} was trained on {expected} features, got {}",
            data.feature_count()
        )));
    }
    Ok(())
}

/// Fail unless every sample carries a label
pub(crate) fn require_sample_labels(data: &Dataset, mapping: &str) -> Result<()> {
    if data.sample_labels().len() != data.row_count() || data.row_count() == 0 {
        return Err(Error::InvalidArgument(format!(
            "{mapping} needs labelled samples"
        )));
    }
    Ok(())
}
