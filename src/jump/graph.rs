use std::collections::BTreeMap;

use crate::{
    foundation::{
        core::{FrameIndex, FrameRange, Fps},
        error::{GazeloopError, GazeloopResult},
    },
    jump::{
        arc::{LoopArc, LoopArcHistory},
        cost::CostMatrix,
        cut::{CutBlock, CutTable},
    },
};

/// Cache key for best-backward-jump tables: the perceptual threshold in thousandths plus the
/// minimum loop length in frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BestJumpKey {
    /// `round(threshold * 1000)`.
    pub threshold_milli: i64,
    /// Minimum loop length in frames.
    pub min_loop_frames: u64,
}

impl BestJumpKey {
    /// Key for a threshold and minimum loop length.
    pub fn new(threshold: f64, min_loop_frames: u64) -> Self {
        Self {
            threshold_milli: (threshold * 1000.0).round() as i64,
            min_loop_frames,
        }
    }
}

/// Best qualifying backward jump for every frame: the source `c ≤ f - min_loop_frames` with
/// the lowest `cost[f][c] ≤ threshold`, ties going to the lowest `c`.
pub fn build_best_backward_jump(
    cost: &CostMatrix,
    threshold: f64,
    min_loop_frames: u64,
) -> Vec<Option<FrameIndex>> {
    let frames = cost.frames();
    let mut best = Vec::with_capacity(frames);
    for f in 0..frames as u64 {
        let mut chosen = None;
        let mut min_cost = f64::MAX;
        if let (Some(row), Some(last)) = (cost.row(FrameIndex(f)), f.checked_sub(min_loop_frames))
        {
            for (c, &v) in row.iter().enumerate().take(last as usize + 1) {
                if v < min_cost && v <= threshold {
                    min_cost = v;
                    chosen = Some(FrameIndex(c as u64));
                }
            }
        }
        best.push(chosen);
    }
    best
}

/// Condense frames with a qualifying backward jump into maximal contiguous blocks.
pub fn derive_valid_frame_blocks(best: &[Option<FrameIndex>]) -> Vec<FrameRange> {
    let mut blocks = Vec::new();
    let mut start: Option<u64> = None;
    for (f, b) in best.iter().enumerate() {
        let f = f as u64;
        match (b.is_some(), start) {
            (true, None) => start = Some(f),
            (false, Some(s)) => {
                blocks.push(FrameRange {
                    start: FrameIndex(s),
                    end: FrameIndex(f),
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        blocks.push(FrameRange {
            start: FrameIndex(s),
            end: FrameIndex(best.len() as u64),
        });
    }
    blocks
}

/// Jump data for a single view sector of a segment.
#[derive(Clone, Debug, Default)]
pub struct ViewGraph {
    cost: Option<CostMatrix>,
    cuts: CutTable,
    best_backward: BTreeMap<BestJumpKey, Vec<Option<FrameIndex>>>,
    arcs: LoopArcHistory,
}

impl ViewGraph {
    /// View with optional cost data and its cut table.
    pub fn new(cost: Option<CostMatrix>, cuts: CutTable) -> Self {
        Self {
            cost,
            cuts,
            best_backward: BTreeMap::new(),
            arcs: LoopArcHistory::default(),
        }
    }

    /// True when a cost matrix was supplied.
    pub fn has_cost_data(&self) -> bool {
        self.cost.is_some()
    }

    /// The cut table.
    pub fn cuts(&self) -> &CutTable {
        &self.cuts
    }

    /// Executed and authored arcs.
    pub fn arcs(&self) -> &LoopArcHistory {
        &self.arcs
    }

    /// Record an arc and make it current.
    pub fn record_arc(&mut self, arc: LoopArc) -> LoopArc {
        self.arcs.add(arc)
    }

    /// Pointwise cost check; false without cost data.
    pub fn can_jump_to(&self, from: FrameIndex, to: FrameIndex, threshold: f64) -> bool {
        self.cost
            .as_ref()
            .is_some_and(|c| c.can_jump_to(from, to, threshold))
    }

    /// Memoized best-backward-jump table, `None` without cost data.
    ///
    /// Tables for different keys coexist and are never invalidated.
    pub fn best_backward_jump(
        &mut self,
        threshold: f64,
        min_loop_frames: u64,
    ) -> Option<&[Option<FrameIndex>]> {
        let cost = self.cost.as_ref()?;
        let key = BestJumpKey::new(threshold, min_loop_frames);
        let table = self
            .best_backward
            .entry(key)
            .or_insert_with(|| build_best_backward_jump(cost, threshold, min_loop_frames));
        Some(table.as_slice())
    }

    /// Number of memoized tables.
    pub fn cached_tables(&self) -> usize {
        self.best_backward.len()
    }

    /// Valid-frame blocks for a key, `None` without cost data.
    pub fn valid_frame_blocks(
        &mut self,
        threshold: f64,
        min_loop_frames: u64,
    ) -> Option<Vec<FrameRange>> {
        self.best_backward_jump(threshold, min_loop_frames)
            .map(derive_valid_frame_blocks)
    }
}

/// Jump graph of one gated segment: a [`ViewGraph`] per view sector.
#[derive(Clone, Debug, Default)]
pub struct JumpGraph {
    views: Vec<ViewGraph>,
}

impl JumpGraph {
    /// Graph over the given per-view data.
    pub fn new(views: Vec<ViewGraph>) -> Self {
        Self { views }
    }

    /// Graph with `count` views and no data.
    pub fn empty(count: usize) -> Self {
        Self {
            views: (0..count).map(|_| ViewGraph::default()).collect(),
        }
    }

    /// Graph built from per-view cut tables only.
    pub fn from_cut_tables(cuts: Vec<CutTable>) -> Self {
        Self {
            views: cuts
                .into_iter()
                .map(|c| ViewGraph::new(None, c))
                .collect(),
        }
    }

    /// Number of views.
    pub fn num_views(&self) -> usize {
        self.views.len()
    }

    /// One view.
    pub fn view(&self, view: usize) -> Option<&ViewGraph> {
        self.views.get(view)
    }

    /// One view, mutably.
    pub fn view_mut(&mut self, view: usize) -> Option<&mut ViewGraph> {
        self.views.get_mut(view)
    }

    /// Replace a view's cost matrix, dropping its memoized tables.
    pub fn set_cost(&mut self, view: usize, cost: CostMatrix) -> GazeloopResult<()> {
        let slot = self
            .views
            .get_mut(view)
            .ok_or_else(|| GazeloopError::validation(format!("unknown view {view}")))?;
        slot.cost = Some(cost);
        slot.best_backward.clear();
        Ok(())
    }

    /// True when any view carries cut edges.
    pub fn has_cut_data(&self) -> bool {
        self.views.iter().any(|v| v.cuts.has_cut_data())
    }

    /// True when every view carries a cost matrix.
    pub fn has_cost_data(&self) -> bool {
        !self.views.is_empty() && self.views.iter().all(ViewGraph::has_cost_data)
    }

    /// Exact cut-frame match for `view`.
    pub fn reached_cut_frame(&self, view: usize, frame: FrameIndex) -> bool {
        self.view(view)
            .is_some_and(|v| v.cuts.reached_cut_frame(frame))
    }

    /// Same as [`JumpGraph::reached_cut_frame`]; used for mid-transition cancellation.
    pub fn is_cut_frame(&self, view: usize, frame: FrameIndex) -> bool {
        self.reached_cut_frame(view, frame)
    }

    /// Target of the cut edge at exactly `frame`.
    pub fn find_jump_to(&self, view: usize, frame: FrameIndex) -> Option<FrameIndex> {
        self.view(view).and_then(|v| v.cuts.find_jump_to(frame))
    }

    /// True when `frame` lies beyond the last cut frame of `view`.
    pub fn past_last_cut_frame(&self, view: usize, frame: FrameIndex) -> bool {
        self.view(view)
            .is_some_and(|v| v.cuts.past_last_cut_frame(frame))
    }

    /// Largest cut frame of `view`.
    pub fn last_cut_frame(&self, view: usize) -> Option<FrameIndex> {
        self.view(view).and_then(|v| v.cuts.last_cut_frame())
    }

    /// Pointwise cost check; false without cost data.
    pub fn can_jump_to(&self, view: usize, from: FrameIndex, to: FrameIndex, threshold: f64) -> bool {
        self.view(view)
            .is_some_and(|v| v.can_jump_to(from, to, threshold))
    }

    /// Valid-frame blocks of `view`; `None` without cost data for that view.
    pub fn valid_frame_blocks(
        &mut self,
        view: usize,
        threshold: f64,
        min_loop_frames: u64,
    ) -> Option<Vec<FrameRange>> {
        self.view_mut(view)?
            .valid_frame_blocks(threshold, min_loop_frames)
    }

    /// Cut-frame blocks of `view` for the timeline overlay.
    pub fn cut_blocks(&self, view: usize) -> Vec<CutBlock> {
        self.view(view)
            .map(|v| v.cuts.cut_blocks())
            .unwrap_or_default()
    }

    /// Record an executed jump for `view` and return it as the view's current arc.
    pub fn record_jump(&mut self, view: usize, arc: LoopArc) -> Option<LoopArc> {
        self.view_mut(view).map(|v| v.record_arc(arc))
    }

    /// Seed every view's arc history with its authored cut edges.
    pub fn populate_backward_arcs(&mut self, segment_start: f64, segment_end: f64, fps: Fps) {
        for v in &mut self.views {
            let arcs: Vec<LoopArc> = v
                .cuts
                .edges()
                .iter()
                .map(|e| {
                    LoopArc::new(
                        segment_start + fps.frame_to_secs(e.cut_frame),
                        segment_start + fps.frame_to_secs(e.target_frame),
                        segment_start,
                        segment_end,
                    )
                })
                .collect();
            for arc in arcs {
                v.arcs.add(arc);
            }
        }
    }

    /// Arc history of `view`, ordered by `from_time`.
    pub fn loop_arcs(&self, view: usize) -> Vec<LoopArc> {
        self.view(view)
            .map(|v| v.arcs.sorted())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jump/graph.rs"]
mod tests;
