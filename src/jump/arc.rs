use crate::foundation::math::approx_eq;

/// A concrete seamless jump executed (or authored) within a segment, in media seconds.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoopArc {
    /// Media time the jump leaves from.
    pub from_time: f64,
    /// Media time the jump lands on.
    pub to_time: f64,
    /// Start of the owning segment.
    pub segment_start: f64,
    /// End of the owning segment.
    pub segment_end: f64,
}

impl LoopArc {
    /// Arc inside the segment `[segment_start, segment_end]`.
    pub fn new(from_time: f64, to_time: f64, segment_start: f64, segment_end: f64) -> Self {
        Self {
            from_time,
            to_time,
            segment_start,
            segment_end,
        }
    }

    /// True for jumps that skip ahead rather than loop back.
    pub fn is_forward(&self) -> bool {
        self.to_time > self.from_time
    }

    /// `from_time - to_time`: how far the jumping backend leads the landing one.
    pub fn media_offset(&self) -> f64 {
        self.from_time - self.to_time
    }
}

// Arcs are equal when their endpoints match approximately; segment bounds are ignored.
impl PartialEq for LoopArc {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self.from_time, other.from_time) && approx_eq(self.to_time, other.to_time)
    }
}

/// Per-view record of executed arcs, deduplicated, with the most recent one tracked.
#[derive(Clone, Debug, Default)]
pub struct LoopArcHistory {
    arcs: Vec<LoopArc>,
    current: Option<usize>,
}

impl LoopArcHistory {
    /// Record `arc` (or re-select its existing duplicate) and make it current.
    pub fn add(&mut self, arc: LoopArc) -> LoopArc {
        let index = match self.arcs.iter().position(|a| *a == arc) {
            Some(i) => i,
            None => {
                self.arcs.push(arc);
                self.arcs.len() - 1
            }
        };
        self.current = Some(index);
        self.arcs[index]
    }

    /// The most recently added arc.
    pub fn current(&self) -> Option<&LoopArc> {
        self.current.and_then(|i| self.arcs.get(i))
    }

    /// Number of distinct arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// True when no arc was recorded.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Arcs ordered by `from_time`.
    pub fn sorted(&self) -> Vec<LoopArc> {
        let mut out = self.arcs.clone();
        out.sort_by(|a, b| a.from_time.total_cmp(&b.from_time));
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/jump/arc.rs"]
mod tests;
