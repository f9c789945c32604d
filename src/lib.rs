//! Saturation Per-Region Overlap (SPRO) for anomaly-segmentation evaluation.
//!
//! Feed prediction and label batches to a [`Spro`] accumulator, then call
//! [`Spro::compute`]. Each nonzero label id in a mask is a region; a region
//! is fully detected once enough of its pixels score above the threshold,
//! where "enough" is its whole area unless a [`SaturationConfig`] rule
//! relaxes it.

pub mod error;
pub mod input;
pub mod logging;
pub mod metric;
pub mod model;
pub mod report;

pub use error::SproError;
pub use metric::{CurvePoint, RegionIdStats, Spro, spro_curve, spro_score};
pub use model::{Batch, MaskBatch, PredictionBatch, SaturationConfig, SaturationRule, Shape};
