use thiserror::Error;

use crate::model::grid::Shape;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SproError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("shape mismatch: {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: Shape,
        found: Shape,
    },
    #[error("batch size mismatch: predictions have {predictions} samples, masks have {masks}")]
    BatchMismatch { predictions: usize, masks: usize },
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
    #[error("no regions observed; SPRO is undefined")]
    NoRegions,
    #[error("cannot merge accumulators: {0}")]
    IncompatibleMerge(String),
}
