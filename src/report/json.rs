use crate::report::SproReport;

pub fn render_report_json(report: &SproReport) -> serde_json::Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}
