pub mod grid;
pub mod regions;
pub mod saturation;

pub use grid::{Batch, MaskBatch, PredictionBatch, Shape};
pub use regions::{RegionTally, tally_regions};
pub use saturation::{SaturationConfig, SaturationEntry, SaturationRule};
