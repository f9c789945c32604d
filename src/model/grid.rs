use std::fmt;

use serde::Serialize;

use crate::error::SproError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    pub height: usize,
    pub width: usize,
}

impl Shape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn pixels(&self) -> usize {
        self.height * self.width
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// N samples of H×W values stored row-major, sample after sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    shape: Shape,
    n_samples: usize,
    data: Vec<T>,
}

pub type PredictionBatch = Batch<f32>;
pub type MaskBatch = Batch<u32>;

impl<T: Copy> Batch<T> {
    pub fn new(n_samples: usize, shape: Shape, data: Vec<T>) -> Result<Self, SproError> {
        let expected = n_samples
            .checked_mul(shape.pixels())
            .ok_or_else(|| SproError::InvalidGrid(format!("{n_samples} x {shape} overflows")))?;
        if data.len() != expected {
            return Err(SproError::InvalidGrid(format!(
                "expected {expected} values for {n_samples} samples of {shape}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            shape,
            n_samples,
            data,
        })
    }

    pub fn single(shape: Shape, data: Vec<T>) -> Result<Self, SproError> {
        Self::new(1, shape, data)
    }

    /// Builds a batch from `[sample][row][col]` nesting. Every row of every
    /// sample must have the same width, and every sample the same height.
    pub fn from_nested(samples: Vec<Vec<Vec<T>>>) -> Result<Self, SproError> {
        let n_samples = samples.len();
        let height = samples.first().map(|s| s.len()).unwrap_or(0);
        let width = samples
            .first()
            .and_then(|s| s.first())
            .map(|r| r.len())
            .unwrap_or(0);
        let shape = Shape::new(height, width);

        let mut data = Vec::with_capacity(n_samples * shape.pixels());
        for (idx, sample) in samples.into_iter().enumerate() {
            if sample.len() != height {
                return Err(SproError::InvalidGrid(format!(
                    "sample {idx} has {} rows, expected {height}",
                    sample.len()
                )));
            }
            for (row_idx, row) in sample.into_iter().enumerate() {
                if row.len() != width {
                    return Err(SproError::InvalidGrid(format!(
                        "sample {idx} row {row_idx} has {} columns, expected {width}",
                        row.len()
                    )));
                }
                data.extend(row);
            }
        }

        Self::new(n_samples, shape, data)
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn is_empty(&self) -> bool {
        self.n_samples == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn sample(&self, idx: usize) -> &[T] {
        let stride = self.shape.pixels();
        &self.data[idx * stride..(idx + 1) * stride]
    }

    pub fn samples(&self) -> impl Iterator<Item = &[T]> {
        (0..self.n_samples).map(move |idx| self.sample(idx))
    }

    /// Appends `other` along the batch axis.
    pub fn concat(&self, other: &Batch<T>) -> Result<Self, SproError> {
        if self.shape != other.shape {
            return Err(SproError::ShapeMismatch {
                context: "concatenated batch",
                expected: self.shape,
                found: other.shape,
            });
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Self::new(self.n_samples + other.n_samples, self.shape, data)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/grid.rs"]
mod tests;
