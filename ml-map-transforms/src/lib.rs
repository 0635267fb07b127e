//! Concrete mappings built on `ml-map-core`
//!
//! Preprocessing ([`scalem`], [`featsel`], [`softmax`]), a classifier
//! ([`nmc`]) and a performance measure ([`testc`]). Each constructor returns
//! an untrained (or fixed) instance ready for composition.

#![warn(missing_docs)]

mod common;

pub mod error_rate;
pub mod nearest_mean;
pub mod scaling;
pub mod selection;
pub mod softmax;

pub use error_rate::{testc, ClassificationError};
pub use nearest_mean::{nmc, NearestMean, NearestMeanParams};
pub use scaling::{scalem, scalem_with, ScaleMethod, Scaling, ScalingParams};
pub use selection::{featsel, FeatureSelection, SelectionParams};
pub use softmax::{softmax, Softmax};
