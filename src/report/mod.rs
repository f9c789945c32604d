use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::metric::{CurvePoint, Spro};

pub mod json;
pub mod text;

use json::render_report_json;
use text::render_report_text;

pub const TOOL_NAME: &str = "kira-spro";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionIdReport {
    pub region_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect_name: Option<String>,
    pub regions: u64,
    pub mean_score: f64,
    pub area: u64,
    pub hits: u64,
    pub requirement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SproReport {
    pub tool: String,
    pub version: String,
    pub threshold: f32,
    pub saturation_config: bool,
    pub n_samples: u64,
    pub n_regions: u64,
    pub spro: f64,
    pub pooled_coverage: f64,
    pub per_region_id: Vec<RegionIdReport>,
    pub unused_saturation_ids: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<Vec<CurvePoint>>,
}

impl SproReport {
    /// Snapshot of a metric that has seen at least one region.
    pub fn from_metric(
        metric: &Spro,
        curve: Option<Vec<CurvePoint>>,
    ) -> Result<Self, crate::SproError> {
        let saturation = metric.saturation();
        let per_region_id = metric
            .per_region_id()
            .iter()
            .map(|(&region_id, stats)| RegionIdReport {
                region_id,
                defect_name: saturation
                    .and_then(|c| c.defect_name(region_id))
                    .map(str::to_string),
                regions: stats.regions,
                mean_score: stats.mean_score(),
                area: stats.area,
                hits: stats.hits,
                requirement: stats.requirement,
            })
            .collect();

        Ok(Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            threshold: metric.threshold(),
            saturation_config: saturation.is_some(),
            n_samples: metric.n_samples(),
            n_regions: metric.n_regions(),
            spro: metric.compute()?,
            pooled_coverage: metric.pooled_coverage()?,
            per_region_id,
            unused_saturation_ids: metric.unused_saturation_ids(),
            curve,
        })
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

/// Writes `summary.json` and `report.txt` into `out_dir`, returning both paths.
pub fn write_reports(report: &SproReport, out_dir: &Path) -> std::io::Result<[PathBuf; 2]> {
    fs::create_dir_all(out_dir)?;

    let summary_path = out_dir.join("summary.json");
    let json = render_report_json(report).map_err(std::io::Error::other)?;
    write_text(&summary_path, &json)?;

    let report_path = out_dir.join("report.txt");
    write_text(&report_path, &render_report_text(report))?;

    Ok([summary_path, report_path])
}

fn write_text(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
