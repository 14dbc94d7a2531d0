//! Render scheduler.
//!
//! Producers report what changed (`RenderDelta`) via `mark`; `consume` merges
//! everything queued since the last frame into one decision.
//!
//! Merge semantics:
//! - Precedence: `Relayout` > `Panes` > `StatusLine`.
//! - Multiple `Panes` deltas union their slot sets.
//! - `StatusLine` is folded into any pane or relayout repaint (both repaint
//!   the status row too).
//!
//! The effective strategy escalates `Panes` to `Relayout` once half or more
//! of the visible panes are dirty; repainting rows piecemeal stops paying off
//! well before that.
//!
//! Examples:
//! - `Panes{1} + Panes{3}` => `Panes{1,3}`.
//! - `StatusLine + Panes{0}` => `Panes{0}`.
//! - `Panes{2} + Relayout` => `Relayout`.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDelta {
    /// Layout name or tree shape changed, or the terminal resized.
    Relayout,
    /// Content of these slots changed (widget assignment, updating badge).
    Panes(BTreeSet<usize>),
    /// Only the status row changed.
    StatusLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub semantic: RenderDelta,
    pub effective: RenderDelta,
}

#[derive(Debug, Default)]
pub struct RenderDeltaMetrics {
    relayout: AtomicU64,
    panes: AtomicU64,
    status_line: AtomicU64,
    escalated: AtomicU64,
    semantic_frames: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDeltaMetricsSnapshot {
    pub relayout: u64,
    pub panes: u64,
    pub status_line: u64,
    pub escalated: u64,
    pub semantic_frames: u64,
}

impl RenderDeltaMetrics {
    pub fn snapshot(&self) -> RenderDeltaMetricsSnapshot {
        RenderDeltaMetricsSnapshot {
            relayout: self.relayout.load(Relaxed),
            panes: self.panes.load(Relaxed),
            status_line: self.status_line.load(Relaxed),
            escalated: self.escalated.load(Relaxed),
            semantic_frames: self.semantic_frames.load(Relaxed),
        }
    }

    fn incr_semantic(&self, delta: &RenderDelta) {
        let counter = match delta {
            RenderDelta::Relayout => &self.relayout,
            RenderDelta::Panes(_) => &self.panes,
            RenderDelta::StatusLine => &self.status_line,
        };
        counter.fetch_add(1, Relaxed);
        self.semantic_frames.fetch_add(1, Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct RenderScheduler {
    pending: Vec<RenderDelta>,
    metrics: RenderDeltaMetrics,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_snapshot(&self) -> RenderDeltaMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn mark(&mut self, delta: RenderDelta) {
        tracing::trace!(target: "render.scheduler", ?delta, "render_mark");
        self.pending.push(delta);
    }

    pub fn mark_pane(&mut self, slot_index: usize) {
        self.mark(RenderDelta::Panes(BTreeSet::from([slot_index])));
    }

    pub fn mark_status(&mut self) {
        self.mark(RenderDelta::StatusLine);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Collapse queued deltas into a decision for a frame showing
    /// `pane_count` panes. `None` when nothing was marked.
    pub fn consume(&mut self, pane_count: usize) -> Option<Decision> {
        if self.pending.is_empty() {
            return None;
        }
        let merged = self.collapse();
        tracing::trace!(target: "render.scheduler", ?merged, "render_delta_collapse");
        self.pending.clear();
        self.metrics.incr_semantic(&merged);
        let effective = match &merged {
            RenderDelta::Panes(slots) if slots.len() * 2 >= pane_count.max(1) => {
                self.metrics.escalated.fetch_add(1, Relaxed);
                RenderDelta::Relayout
            }
            other => other.clone(),
        };
        Some(Decision {
            semantic: merged,
            effective,
        })
    }

    fn collapse(&self) -> RenderDelta {
        if self.pending.iter().any(|d| matches!(d, RenderDelta::Relayout)) {
            return RenderDelta::Relayout;
        }
        let mut slots: Option<BTreeSet<usize>> = None;
        for d in &self.pending {
            if let RenderDelta::Panes(s) = d {
                slots.get_or_insert_with(BTreeSet::new).extend(s.iter().copied());
            }
        }
        match slots {
            Some(s) => RenderDelta::Panes(s),
            None => RenderDelta::StatusLine,
        }
    }
}
