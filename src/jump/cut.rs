use crate::foundation::{
    core::{FrameIndex, FrameRange},
    error::{GazeloopError, GazeloopResult},
};

/// Precomputed forward-safe jump: reaching `cut_frame` jumps to `target_frame`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CutEdge {
    /// Segment-relative source frame.
    pub cut_frame: FrameIndex,
    /// Segment-relative destination frame.
    pub target_frame: FrameIndex,
    /// The chosen target differs from the raw best arc (post-processing moved it).
    #[serde(default)]
    pub post_process_warning: bool,
    /// Post-processing added a positive extra cost to this edge.
    #[serde(default)]
    pub penalized: bool,
}

impl CutEdge {
    /// Unflagged edge.
    pub fn new(cut_frame: u64, target_frame: u64) -> Self {
        Self {
            cut_frame: FrameIndex(cut_frame),
            target_frame: FrameIndex(target_frame),
            post_process_warning: false,
            penalized: false,
        }
    }
}

/// One-frame timeline block covering a cut frame, with its edge flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CutBlock {
    /// `[cut_frame, cut_frame + 1)`.
    pub range: FrameRange,
    /// See [`CutEdge::post_process_warning`].
    pub post_process_warning: bool,
    /// See [`CutEdge::penalized`].
    pub penalized: bool,
}

/// Cut edges of one view, strictly increasing by `cut_frame`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CutTable {
    edges: Vec<CutEdge>,
}

impl CutTable {
    /// Build from edges already ordered by cut frame.
    pub fn new(edges: Vec<CutEdge>) -> GazeloopResult<Self> {
        for pair in edges.windows(2) {
            if pair[0].cut_frame >= pair[1].cut_frame {
                return Err(GazeloopError::validation(format!(
                    "cut frames must be strictly increasing (frame {} followed by {})",
                    pair[0].cut_frame.0, pair[1].cut_frame.0
                )));
            }
        }
        Ok(Self { edges })
    }

    /// Build from preprocessing output.
    ///
    /// `valid_targets[i]` and `extra_costs[i]` belong to `cut_frames[i]`; `all_arcs` is indexed
    /// by source frame and holds the raw best target before post-processing. An edge gets
    /// `post_process_warning` when its raw arc differs from the chosen target and `penalized`
    /// when its extra cost is positive.
    pub fn from_authored(
        cut_frames: &[u64],
        valid_targets: &[u64],
        all_arcs: &[u64],
        extra_costs: &[f64],
    ) -> GazeloopResult<Self> {
        if valid_targets.len() != cut_frames.len() {
            return Err(GazeloopError::validation(format!(
                "{} cut frames but {} valid targets",
                cut_frames.len(),
                valid_targets.len()
            )));
        }
        if !extra_costs.is_empty() && extra_costs.len() != cut_frames.len() {
            return Err(GazeloopError::validation(format!(
                "{} cut frames but {} extra costs",
                cut_frames.len(),
                extra_costs.len()
            )));
        }
        let edges = cut_frames
            .iter()
            .zip(valid_targets)
            .enumerate()
            .map(|(i, (&cut, &target))| {
                let raw = usize::try_from(cut).ok().and_then(|c| all_arcs.get(c));
                CutEdge {
                    cut_frame: FrameIndex(cut),
                    target_frame: FrameIndex(target),
                    post_process_warning: raw.is_some_and(|&r| r != target),
                    penalized: extra_costs.get(i).is_some_and(|&c| c > 0.0),
                }
            })
            .collect();
        Self::new(edges)
    }

    /// Distinguishes "no cut data" from "reached the end of the cut data".
    pub fn has_cut_data(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True when the table holds no edge.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All edges in cut-frame order.
    pub fn edges(&self) -> &[CutEdge] {
        &self.edges
    }

    fn edge_at(&self, frame: FrameIndex) -> Option<&CutEdge> {
        self.edges
            .binary_search_by_key(&frame, |e| e.cut_frame)
            .ok()
            .map(|i| &self.edges[i])
    }

    /// Exact match of `frame` against a cut frame.
    pub fn reached_cut_frame(&self, frame: FrameIndex) -> bool {
        self.edge_at(frame).is_some()
    }

    /// Target of the edge cut at exactly `frame`.
    pub fn find_jump_to(&self, frame: FrameIndex) -> Option<FrameIndex> {
        self.edge_at(frame).map(|e| e.target_frame)
    }

    /// Largest cut frame.
    pub fn last_cut_frame(&self) -> Option<FrameIndex> {
        self.edges.last().map(|e| e.cut_frame)
    }

    /// True when `frame` lies beyond the last cut frame; false without cut data.
    pub fn past_last_cut_frame(&self, frame: FrameIndex) -> bool {
        self.last_cut_frame().is_some_and(|last| frame > last)
    }

    /// One-frame blocks for the timeline overlay.
    pub fn cut_blocks(&self) -> Vec<CutBlock> {
        self.edges
            .iter()
            .map(|e| CutBlock {
                range: FrameRange::single(e.cut_frame),
                post_process_warning: e.post_process_warning,
                penalized: e.penalized,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jump/cut.rs"]
mod tests;
