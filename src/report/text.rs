use crate::report::{SproReport, format_f64_6};

pub fn render_report_text(report: &SproReport) -> String {
    let mut out = String::new();

    out.push_str("Saturation Per-Region Overlap Report\n");
    out.push_str("====================================\n\n");

    out.push_str(&format!("Threshold: {}\n", report.threshold));
    out.push_str(&format!(
        "Saturation config: {}\n",
        if report.saturation_config {
            "yes"
        } else {
            "no (full coverage required)"
        }
    ));
    out.push_str(&format!(
        "Samples: {}\nRegions: {}\n\n",
        report.n_samples, report.n_regions
    ));

    out.push_str(&format!("SPRO: {}\n", format_f64_6(report.spro)));
    out.push_str(&format!(
        "Pooled coverage: {}\n\n",
        format_f64_6(report.pooled_coverage)
    ));

    out.push_str("Per region id\n");
    for r in &report.per_region_id {
        let name = r.defect_name.as_deref().unwrap_or("-");
        out.push_str(&format!(
            "  {} ({}): regions={} mean={} hits={}/{}\n",
            r.region_id,
            name,
            r.regions,
            format_f64_6(r.mean_score),
            r.hits,
            r.area
        ));
    }

    if !report.unused_saturation_ids.is_empty() {
        let ids = report
            .unused_saturation_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>();
        out.push_str(&format!(
            "\nSaturation ids never observed: {}\n",
            ids.join(", ")
        ));
    }

    if let Some(curve) = &report.curve {
        out.push_str("\nThreshold sweep\n");
        for point in curve {
            out.push_str(&format!(
                "  {}\t{}\n",
                point.threshold,
                format_f64_6(point.spro)
            ));
        }
    }

    out
}
