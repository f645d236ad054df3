//! Masked 2D fields.

use serde::{Deserialize, Serialize};

use crate::error::RasterError;

/// A row-major 2D field with a per-cell mask.
///
/// Masked cells always hold `fill_value` in `data`. Deserialization goes
/// through [`MaskedField::new`], so the same holds for parsed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMaskedField")]
pub struct MaskedField {
    data: Vec<f32>,
    mask: Vec<bool>,
    fill_value: f32,
    shape: (usize, usize),
}

#[derive(Deserialize)]
struct RawMaskedField {
    data: Vec<f32>,
    mask: Vec<bool>,
    fill_value: f32,
    shape: (usize, usize),
}

impl TryFrom<RawMaskedField> for MaskedField {
    type Error = RasterError;

    fn try_from(raw: RawMaskedField) -> Result<Self, Self::Error> {
        Self::new(raw.data, raw.mask, raw.fill_value, raw.shape)
    }
}

impl MaskedField {
    /// Apply `mask` to `values`, writing `fill_value` into masked cells.
    pub fn new(
        mut values: Vec<f32>,
        mask: Vec<bool>,
        fill_value: f32,
        shape: (usize, usize),
    ) -> Result<Self, RasterError> {
        let expected = shape.0 * shape.1;
        for (name, len) in [("values", values.len()), ("mask", mask.len())] {
            if len != expected {
                return Err(RasterError::ShapeMismatch {
                    name: name.to_string(),
                    expected,
                    actual: len,
                });
            }
        }

        for (value, &masked) in values.iter_mut().zip(&mask) {
            if masked {
                *value = fill_value;
            }
        }

        Ok(Self {
            data: values,
            mask,
            fill_value,
            shape,
        })
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn fill_value(&self) -> f32 {
        self.fill_value
    }

    /// Raw values, fill value at masked cells.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Value at `(row, col)`, `None` when masked or out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        let i = self.offset(row, col)?;
        (!self.mask[i]).then(|| self.data[i])
    }

    /// True when `(row, col)` is masked. Out-of-range cells count as masked.
    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.offset(row, col).map_or(true, |i| self.mask[i])
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    /// Unmasked values in row-major order.
    pub fn compressed(&self) -> Vec<f32> {
        self.data
            .iter()
            .zip(&self.mask)
            .filter(|(_, &masked)| !masked)
            .map(|(&v, _)| v)
            .collect()
    }

    fn offset(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.shape.0 && col < self.shape.1).then(|| row * self.shape.1 + col)
    }
}
