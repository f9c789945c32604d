use serde::Serialize;

use crate::error::SproError;
use crate::metric::spro::Spro;
use crate::model::grid::{MaskBatch, PredictionBatch};
use crate::model::saturation::SaturationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub threshold: f32,
    pub spro: f64,
    pub pooled_coverage: f64,
}

/// SPRO at each threshold over the same inputs. Thresholds are sorted
/// ascending and duplicates dropped.
pub fn spro_curve(
    predictions: &PredictionBatch,
    layers: &[MaskBatch],
    thresholds: &[f32],
    saturation: Option<&SaturationConfig>,
) -> Result<Vec<CurvePoint>, SproError> {
    if thresholds.is_empty() {
        return Err(SproError::InvalidConfig(
            "at least one threshold is required".to_string(),
        ));
    }
    let mut sorted = thresholds.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup_by(|a, b| a.to_bits() == b.to_bits());

    let mut points = Vec::with_capacity(sorted.len());
    for threshold in sorted {
        let mut metric = Spro::new(threshold, saturation.cloned())?;
        metric.update_layers(predictions, layers)?;
        points.push(CurvePoint {
            threshold,
            spro: metric.compute()?,
            pooled_coverage: metric.pooled_coverage()?,
        });
    }
    Ok(points)
}

#[cfg(test)]
#[path = "../../tests/src_inline/metric/sweep.rs"]
mod tests;
