use crate::foundation::{
    core::FrameIndex,
    error::{GazeloopError, GazeloopResult},
};

/// Dense per-view transition cost matrix: `cost(from, to)` is the perceptual cost of jumping
/// from frame `from` to frame `to` of the same segment.
///
/// Infinite costs mark forbidden jumps; NaN is rejected at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    frames: usize,
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Build from square rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> GazeloopResult<Self> {
        let frames = rows.len();
        if frames == 0 {
            return Err(GazeloopError::validation("cost matrix must have at least one row"));
        }
        let mut costs = Vec::with_capacity(frames * frames);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != frames {
                return Err(GazeloopError::validation(format!(
                    "cost matrix row {i} has {} entries, expected {frames}",
                    row.len()
                )));
            }
            if row.iter().any(|c| c.is_nan()) {
                return Err(GazeloopError::validation(format!(
                    "cost matrix row {i} contains NaN"
                )));
            }
            costs.extend(row);
        }
        Ok(Self { frames, costs })
    }

    /// Build a `frames × frames` matrix from a cost function.
    pub fn from_fn(
        frames: usize,
        mut f: impl FnMut(FrameIndex, FrameIndex) -> f64,
    ) -> GazeloopResult<Self> {
        let rows = (0..frames as u64)
            .map(|from| {
                (0..frames as u64)
                    .map(|to| f(FrameIndex(from), FrameIndex(to)))
                    .collect()
            })
            .collect();
        Self::from_rows(rows)
    }

    /// Number of frames covered (rows and columns).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Costs of every jump leaving `from`.
    pub fn row(&self, from: FrameIndex) -> Option<&[f64]> {
        let from = usize::try_from(from.0).ok()?;
        if from >= self.frames {
            return None;
        }
        Some(&self.costs[from * self.frames..(from + 1) * self.frames])
    }

    /// Cost of a single jump, `None` when either frame is out of range.
    pub fn cost(&self, from: FrameIndex, to: FrameIndex) -> Option<f64> {
        let to = usize::try_from(to.0).ok()?;
        self.row(from)?.get(to).copied()
    }

    /// True when the jump exists and its cost does not exceed `threshold`.
    pub fn can_jump_to(&self, from: FrameIndex, to: FrameIndex, threshold: f64) -> bool {
        self.cost(from, to).is_some_and(|c| c <= threshold)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jump/cost.rs"]
mod tests;
