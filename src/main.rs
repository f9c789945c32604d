use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use kira_spro::input::{load_masks, load_predictions, load_saturation_config};
use kira_spro::logging::init_logging;
use kira_spro::metric::{CurvePoint, Spro, spro_curve};
use kira_spro::model::{MaskBatch, PredictionBatch, SaturationConfig};
use kira_spro::report::{SproReport, format_f64_6, write_reports};

#[derive(Debug, Parser)]
#[command(
    name = "kira-spro",
    version,
    about = "Saturation Per-Region Overlap for anomaly-segmentation outputs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score predictions at one threshold.
    Score(ScoreArgs),
    /// Score predictions at several thresholds.
    Sweep(SweepArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Prediction scores, JSON [N][H][W] or [H][W] (.gz accepted).
    #[arg(long)]
    preds: PathBuf,
    /// Region label masks; repeat for additional mask layers.
    #[arg(long, required = true)]
    masks: Vec<PathBuf>,
    /// Per-region saturation rules (id map or defect list).
    #[arg(long)]
    saturation_config: Option<PathBuf>,
    /// Directory for summary.json and report.txt.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ScoreArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(long, allow_negative_numbers = true)]
    threshold: f32,
}

#[derive(Debug, Args)]
struct SweepArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Comma-separated thresholds.
    #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    thresholds: Vec<f32>,
}

struct LoadedInputs {
    predictions: PredictionBatch,
    layers: Vec<MaskBatch>,
    saturation: Option<SaturationConfig>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Score(args) => run_score(&args),
        Command::Sweep(args) => run_sweep(&args),
    }
}

fn run_score(args: &ScoreArgs) -> Result<(), String> {
    init_logging(args.input.verbose);
    let inputs = load_inputs(&args.input)?;

    let metric = accumulate(args.threshold, &inputs)?;
    let spro = metric.compute().map_err(|e| e.to_string())?;
    println!("{}", format_f64_6(spro));

    finish(&metric, None, args.input.out.as_deref())
}

fn run_sweep(args: &SweepArgs) -> Result<(), String> {
    init_logging(args.input.verbose);
    let inputs = load_inputs(&args.input)?;

    let curve = spro_curve(
        &inputs.predictions,
        &inputs.layers,
        &args.thresholds,
        inputs.saturation.as_ref(),
    )
    .map_err(|e| e.to_string())?;
    for point in &curve {
        println!("{}\t{}", point.threshold, format_f64_6(point.spro));
    }

    // The report body describes the lowest threshold; the curve covers the rest.
    let first = curve
        .first()
        .map(|p| p.threshold)
        .ok_or_else(|| "empty threshold sweep".to_string())?;
    let metric = accumulate(first, &inputs)?;
    finish(&metric, Some(curve), args.input.out.as_deref())
}

fn load_inputs(args: &InputArgs) -> Result<LoadedInputs, String> {
    let predictions = load_predictions(&args.preds).map_err(|e| e.to_string())?;
    let layers = args
        .masks
        .iter()
        .map(|path| load_masks(path))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    let saturation = match &args.saturation_config {
        Some(path) => Some(load_saturation_config(path).map_err(|e| e.to_string())?),
        None => None,
    };
    Ok(LoadedInputs {
        predictions,
        layers,
        saturation,
    })
}

fn accumulate(threshold: f32, inputs: &LoadedInputs) -> Result<Spro, String> {
    let mut metric = Spro::new(threshold, inputs.saturation.clone()).map_err(|e| e.to_string())?;
    metric
        .update_layers(&inputs.predictions, &inputs.layers)
        .map_err(|e| e.to_string())?;
    Ok(metric)
}

fn finish(metric: &Spro, curve: Option<Vec<CurvePoint>>, out: Option<&Path>) -> Result<(), String> {
    let unused = metric.unused_saturation_ids();
    if !unused.is_empty() {
        kira_spro::warn!(
            "saturation config has rules for ids never seen in masks: {:?}",
            unused
        );
    }

    let Some(out_dir) = out else {
        return Ok(());
    };
    let report = SproReport::from_metric(metric, curve).map_err(|e| e.to_string())?;
    let [summary, text] = write_reports(&report, out_dir).map_err(|e| e.to_string())?;
    kira_spro::info!(
        "wrote reports: {}, {}",
        summary.display(),
        text.display()
    );
    Ok(())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
