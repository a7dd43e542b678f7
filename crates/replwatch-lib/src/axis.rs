use crate::error::{BindError, BindResult};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisMode {
    /// One coordinate per sample.
    Direct,
    /// One more coordinate than samples: the axis holds bin edges.
    Histogram,
}

/// Coordinate axis chosen for a rank-1 or rank-2 data series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPlan {
    pub mode: AxisMode,
    /// Coordinates for a single row.
    pub x: Vec<f64>,
    /// Outer rows the axis is tiled over (1 for rank-1 data).
    pub rows: usize,
    /// Data shape the plan was computed for.
    pub shape: Vec<usize>,
}

impl AxisPlan {
    pub fn matches(&self, shape: &[usize]) -> bool {
        self.shape == shape
    }

    /// The row axis repeated once per outer row.
    pub fn tiled(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.x.len() * self.rows);
        for _ in 0..self.rows {
            out.extend_from_slice(&self.x);
        }
        out
    }

    /// Multiply the coordinates by a scalar or an element-wise factor.
    pub fn scaled(mut self, factor: &[f64]) -> BindResult<Self> {
        match factor.len() {
            1 => self.x.iter_mut().for_each(|v| *v *= factor[0]),
            n if n == self.x.len() => self
                .x
                .iter_mut()
                .zip(factor)
                .for_each(|(v, f)| *v *= f),
            n => {
                return Err(BindError::shape(format!(
                    "X axis multiplier length {n} needs to be 1 or equal to the window length {}",
                    self.x.len()
                )))
            }
        }
        Ok(self)
    }
}

/// Pick the axis for data of `shape`, optionally against an explicit axis.
///
/// Lengths are compared on the last dimension. An axis one element longer than
/// the data selects histogram mode; any other mismatch is fatal for the widget.
pub fn reconcile(shape: &[usize], axis: Option<&[f64]>) -> BindResult<AxisPlan> {
    let (rows, len) = match shape {
        [n] => (1, *n),
        [rows, n] => (*rows, *n),
        _ => {
            return Err(BindError::shape(format!(
                "Data to plot needs to be 1 or 2 dimensional, got shape {shape:?}"
            )))
        }
    };
    let (mode, x) = match axis {
        None => (AxisMode::Direct, (0..len).map(|i| i as f64).collect()),
        Some(axis) if axis.len() == len => (AxisMode::Direct, axis.to_vec()),
        Some(axis) if axis.len() == len + 1 => (AxisMode::Histogram, axis.to_vec()),
        Some(axis) => {
            return Err(BindError::shape(format!(
                "X axis length {} needs to be equal (or one larger for a histogram) to data length {len}",
                axis.len()
            )))
        }
    };
    Ok(AxisPlan {
        mode,
        x,
        rows,
        shape: shape.to_vec(),
    })
}
