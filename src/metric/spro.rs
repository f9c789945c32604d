use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::SproError;
use crate::model::grid::{MaskBatch, PredictionBatch, Shape};
use crate::model::regions::{RegionTally, tally_regions};
use crate::model::saturation::SaturationConfig;

/// Running totals for every region sharing one label id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionIdStats {
    pub regions: u64,
    pub score_sum: f64,
    pub area: u64,
    pub hits: u64,
    pub satisfied: f64,
    pub requirement: f64,
}

impl RegionIdStats {
    pub fn mean_score(&self) -> f64 {
        if self.regions == 0 {
            0.0
        } else {
            self.score_sum / self.regions as f64
        }
    }

    fn absorb(&mut self, other: &RegionIdStats) {
        self.regions += other.regions;
        self.score_sum += other.score_sum;
        self.area += other.area;
        self.hits += other.hits;
        self.satisfied += other.satisfied;
        self.requirement += other.requirement;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SproState {
    score_sum: f64,
    regions: u64,
    satisfied: f64,
    requirement: f64,
    samples: u64,
    shape: Option<Shape>,
    per_id: BTreeMap<u32, RegionIdStats>,
}

impl SproState {
    fn record(&mut self, tally: RegionTally, requirement: f64) {
        let satisfied = (tally.hits as f64).min(requirement);
        let score = satisfied / requirement;

        self.score_sum += score;
        self.regions += 1;
        self.satisfied += satisfied;
        self.requirement += requirement;

        let stats = self.per_id.entry(tally.id).or_default();
        stats.regions += 1;
        stats.score_sum += score;
        stats.area += tally.area;
        stats.hits += tally.hits;
        stats.satisfied += satisfied;
        stats.requirement += requirement;
    }
}

/// Saturation Per-Region Overlap accumulator.
///
/// Every nonzero label id in a mask sample is one region. A region scores
/// `min(hits, requirement) / requirement`, where hits are its pixels with a
/// prediction strictly above the threshold and the requirement is its area,
/// optionally relaxed by a [`SaturationConfig`] rule. [`Spro::compute`]
/// returns the mean region score over everything passed to `update`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spro {
    threshold: f32,
    saturation: Option<SaturationConfig>,
    state: SproState,
}

impl Spro {
    pub fn new(threshold: f32, saturation: Option<SaturationConfig>) -> Result<Self, SproError> {
        if !threshold.is_finite() {
            return Err(SproError::InvalidConfig(format!(
                "threshold must be finite, got {threshold}"
            )));
        }
        Ok(Self {
            threshold,
            saturation,
            state: SproState::default(),
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn saturation(&self) -> Option<&SaturationConfig> {
        self.saturation.as_ref()
    }

    pub fn update(
        &mut self,
        predictions: &PredictionBatch,
        masks: &MaskBatch,
    ) -> Result<(), SproError> {
        self.update_layers(predictions, std::slice::from_ref(masks))
    }

    /// Scores several mask layers against the same predictions. Regions in
    /// different layers are independent even when they share a label id.
    /// Inputs are validated before any state changes.
    pub fn update_layers(
        &mut self,
        predictions: &PredictionBatch,
        layers: &[MaskBatch],
    ) -> Result<(), SproError> {
        if layers.is_empty() {
            return Err(SproError::InvalidGrid(
                "at least one mask layer is required".to_string(),
            ));
        }
        let shape = predictions.shape();
        let n_samples = predictions.n_samples();
        for layer in layers {
            if layer.n_samples() != n_samples {
                return Err(SproError::BatchMismatch {
                    predictions: n_samples,
                    masks: layer.n_samples(),
                });
            }
            if n_samples > 0 && layer.shape() != shape {
                return Err(SproError::ShapeMismatch {
                    context: "masks vs predictions",
                    expected: shape,
                    found: layer.shape(),
                });
            }
        }
        if n_samples == 0 {
            return Ok(());
        }
        if let Some(locked) = self.state.shape
            && locked != shape
        {
            return Err(SproError::ShapeMismatch {
                context: "update vs earlier updates",
                expected: locked,
                found: shape,
            });
        }

        let regions_before = self.state.regions;
        for sample in 0..n_samples {
            let preds = predictions.sample(sample);
            for layer in layers {
                for tally in tally_regions(preds, layer.sample(sample), self.threshold) {
                    let requirement = self.requirement(tally.id, tally.area);
                    self.state.record(tally, requirement);
                }
            }
        }
        self.state.samples += n_samples as u64;
        self.state.shape = Some(shape);

        crate::debug!(
            samples = n_samples,
            layers = layers.len(),
            regions = self.state.regions - regions_before,
            "spro update"
        );
        Ok(())
    }

    fn requirement(&self, region_id: u32, area: u64) -> f64 {
        match &self.saturation {
            Some(config) => config.requirement(region_id, area),
            None => area as f64,
        }
    }

    /// Mean region score in [0, 1]. Fails with [`SproError::NoRegions`]
    /// when no region has been observed.
    pub fn compute(&self) -> Result<f64, SproError> {
        if self.state.regions == 0 {
            return Err(SproError::NoRegions);
        }
        Ok(self.state.score_sum / self.state.regions as f64)
    }

    /// Total satisfied pixels over total required pixels, pooled across
    /// regions instead of averaged per region.
    pub fn pooled_coverage(&self) -> Result<f64, SproError> {
        if self.state.regions == 0 {
            return Err(SproError::NoRegions);
        }
        Ok(self.state.satisfied / self.state.requirement)
    }

    pub fn reset(&mut self) {
        self.state = SproState::default();
    }

    /// Folds `other` into `self`. Both sides must share threshold and
    /// saturation configuration; the result matches feeding both inputs
    /// to one accumulator up to floating-point rounding.
    pub fn merge(&mut self, other: &Spro) -> Result<(), SproError> {
        if self.threshold.to_bits() != other.threshold.to_bits() {
            return Err(SproError::IncompatibleMerge(format!(
                "threshold {} != {}",
                self.threshold, other.threshold
            )));
        }
        if self.saturation != other.saturation {
            return Err(SproError::IncompatibleMerge(
                "saturation configurations differ".to_string(),
            ));
        }
        let shape = match (self.state.shape, other.state.shape) {
            (Some(a), Some(b)) if a != b => {
                return Err(SproError::ShapeMismatch {
                    context: "merged accumulator",
                    expected: a,
                    found: b,
                });
            }
            (a, b) => a.or(b),
        };

        let state = &mut self.state;
        state.score_sum += other.state.score_sum;
        state.regions += other.state.regions;
        state.satisfied += other.state.satisfied;
        state.requirement += other.state.requirement;
        state.samples += other.state.samples;
        state.shape = shape;
        for (id, stats) in &other.state.per_id {
            state.per_id.entry(*id).or_default().absorb(stats);
        }
        Ok(())
    }

    pub fn n_samples(&self) -> u64 {
        self.state.samples
    }

    pub fn n_regions(&self) -> u64 {
        self.state.regions
    }

    pub fn shape(&self) -> Option<Shape> {
        self.state.shape
    }

    pub fn per_region_id(&self) -> &BTreeMap<u32, RegionIdStats> {
        &self.state.per_id
    }

    /// Configured ids that no observed region carried.
    pub fn unused_saturation_ids(&self) -> Vec<u32> {
        match &self.saturation {
            Some(config) => config
                .region_ids()
                .filter(|id| !self.state.per_id.contains_key(id))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// One-shot SPRO over a single batch.
pub fn spro_score(
    predictions: &PredictionBatch,
    masks: &MaskBatch,
    threshold: f32,
    saturation: Option<&SaturationConfig>,
) -> Result<f64, SproError> {
    let mut metric = Spro::new(threshold, saturation.cloned())?;
    metric.update(predictions, masks)?;
    metric.compute()
}

#[cfg(test)]
#[path = "../../tests/src_inline/metric/spro.rs"]
mod tests;
