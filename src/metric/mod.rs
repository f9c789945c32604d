pub mod spro;
pub mod sweep;

pub use spro::{RegionIdStats, Spro, spro_score};
pub use sweep::{CurvePoint, spro_curve};
