use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

pub mod grids;

use crate::error::SproError;
use crate::model::grid::{MaskBatch, PredictionBatch};
use crate::model::saturation::SaturationConfig;

pub use grids::{parse_masks, parse_predictions};

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Metric(#[from] SproError),
}

impl InputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        InputError::Json {
            path: path.display().to_string(),
            source,
        }
    }
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|e| InputError::io(path, e))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn read_json(path: &Path) -> Result<serde_json::Value, InputError> {
    let reader = open_maybe_gz(path)?;
    serde_json::from_reader(reader).map_err(|e| InputError::json(path, e))
}

pub fn load_predictions(path: &Path) -> Result<PredictionBatch, InputError> {
    let value = read_json(path)?;
    let batch = parse_predictions(&value)
        .map_err(|e| InputError::InvalidInput(format!("{}: {e}", path.display())))?;
    crate::info!(
        "loaded predictions: path={}, samples={}, shape={}",
        path.display(),
        batch.n_samples(),
        batch.shape()
    );
    Ok(batch)
}

pub fn load_masks(path: &Path) -> Result<MaskBatch, InputError> {
    let value = read_json(path)?;
    let batch = parse_masks(&value)
        .map_err(|e| InputError::InvalidInput(format!("{}: {e}", path.display())))?;
    crate::info!(
        "loaded masks: path={}, samples={}, shape={}",
        path.display(),
        batch.n_samples(),
        batch.shape()
    );
    Ok(batch)
}

/// Reads either the id-keyed map form or the defect-list form.
pub fn load_saturation_config(path: &Path) -> Result<SaturationConfig, InputError> {
    let reader = open_maybe_gz(path)?;
    let config: SaturationConfig =
        serde_json::from_reader(reader).map_err(|e| InputError::json(path, e))?;
    crate::info!(
        "loaded saturation config: path={}, rules={}",
        path.display(),
        config.len()
    );
    Ok(config)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
