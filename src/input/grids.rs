use serde_json::Value;

use crate::input::InputError;
use crate::model::grid::{Batch, MaskBatch, PredictionBatch};

/// Accepts `[N][H][W]` or a single `[H][W]` sample of numbers.
pub fn parse_predictions(value: &Value) -> Result<PredictionBatch, InputError> {
    parse_nested(value, |v| {
        if v.is_nan() {
            return Err("prediction is NaN".to_string());
        }
        Ok(v as f32)
    })
}

/// Accepts `[N][H][W]` or a single `[H][W]` sample of non-negative
/// integer labels. Integral floats such as `255.0` are accepted.
pub fn parse_masks(value: &Value) -> Result<MaskBatch, InputError> {
    parse_nested(value, |v| {
        if v < 0.0 || v.fract() != 0.0 || v > u32::MAX as f64 {
            return Err(format!("mask label {v} is not a non-negative integer"));
        }
        Ok(v as u32)
    })
}

fn parse_nested<T: Copy>(
    value: &Value,
    convert: impl Fn(f64) -> Result<T, String>,
) -> Result<Batch<T>, InputError> {
    let outer = as_array(value, "top level")?;
    let is_single = outer
        .first()
        .and_then(Value::as_array)
        .and_then(|row| row.first())
        .is_some_and(|cell| !cell.is_array());

    let samples = if is_single {
        vec![parse_sample(value, &convert, 0)?]
    } else {
        outer
            .iter()
            .enumerate()
            .map(|(idx, sample)| parse_sample(sample, &convert, idx))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(Batch::from_nested(samples)?)
}

fn parse_sample<T>(
    value: &Value,
    convert: &impl Fn(f64) -> Result<T, String>,
    idx: usize,
) -> Result<Vec<Vec<T>>, InputError> {
    let rows = as_array(value, "sample")?;
    let mut out = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        let cells = as_array(row, "row")?;
        let mut parsed = Vec::with_capacity(cells.len());
        for cell in cells {
            let number = cell.as_f64().ok_or_else(|| {
                InputError::InvalidInput(format!(
                    "sample {idx} row {row_idx}: expected a number, found {cell}"
                ))
            })?;
            let v = convert(number).map_err(|msg| {
                InputError::InvalidInput(format!("sample {idx} row {row_idx}: {msg}"))
            })?;
            parsed.push(v);
        }
        out.push(parsed);
    }
    Ok(out)
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, InputError> {
    value
        .as_array()
        .ok_or_else(|| InputError::InvalidInput(format!("{what} must be a JSON array")))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/grids.rs"]
mod tests;
