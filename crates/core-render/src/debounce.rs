//! Per-group resize debouncing.
//!
//! Drag frames arrive at pointer-move frequency. Each one only replaces the
//! pending size map for its group and pushes that group's deadline out by the
//! quiet period; nothing reaches the store until a group has been quiet for
//! the full period. Groups are tracked independently: committing or
//! superseding one never touches another's pending write.
//!
//! The debouncer owns no timer. The runtime calls [`ResizeDebouncer::poll_expired`]
//! on every tick (and [`ResizeDebouncer::flush_all`] on shutdown) with the
//! current instant, which keeps the state machine deterministic under test.

use core_model::{LayoutNode, SizeMap};
use core_state::LayoutWriter;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Pending writes are keyed by layout name and group id so a group id reused
/// across layouts never shares a timer.
type GroupKey = (String, String);

#[derive(Debug, Clone, PartialEq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant, sizes: SizeMap },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebounceMetrics {
    pub recorded: u64,
    pub superseded: u64,
    pub committed: u64,
    pub dropped_stale: u64,
}

#[derive(Debug)]
pub struct ResizeDebouncer {
    quiet: Duration,
    groups: HashMap<GroupKey, DebounceState>,
    metrics: DebounceMetrics,
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            groups: HashMap::new(),
            metrics: DebounceMetrics::default(),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn metrics(&self) -> DebounceMetrics {
        self.metrics
    }

    /// Record the latest sizes for a group. Supersedes any pending value for
    /// the same group and restarts its quiet period.
    pub fn record(&mut self, now: Instant, layout_name: &str, group_id: &str, sizes: SizeMap) {
        let key = (layout_name.to_string(), group_id.to_string());
        let deadline = now + self.quiet;
        let prev = self.groups.insert(key, DebounceState::Pending { deadline, sizes });
        self.metrics.recorded += 1;
        if matches!(prev, Some(DebounceState::Pending { .. })) {
            self.metrics.superseded += 1;
        }
        trace!(target: "render.debounce", layout = layout_name, group = group_id, "resize_recorded");
    }

    pub fn state(&self, layout_name: &str, group_id: &str) -> DebounceState {
        self.groups
            .get(&(layout_name.to_string(), group_id.to_string()))
            .cloned()
            .unwrap_or(DebounceState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        self.groups
            .values()
            .any(|s| matches!(s, DebounceState::Pending { .. }))
    }

    /// Earliest pending deadline, if any group is waiting.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.groups
            .values()
            .filter_map(|s| match s {
                DebounceState::Pending { deadline, .. } => Some(*deadline),
                DebounceState::Idle => None,
            })
            .min()
    }

    /// Commit every group whose quiet period has elapsed at `now`. Returns the
    /// number of writes attempted.
    pub fn poll_expired<W: LayoutWriter + ?Sized>(&mut self, now: Instant, writer: &mut W) -> usize {
        self.commit_where(writer, |deadline| now >= deadline)
    }

    /// Commit every pending group regardless of deadline (shutdown path).
    pub fn flush_all<W: LayoutWriter + ?Sized>(&mut self, writer: &mut W) -> usize {
        self.commit_where(writer, |_| true)
    }

    fn commit_where<W, F>(&mut self, writer: &mut W, due: F) -> usize
    where
        W: LayoutWriter + ?Sized,
        F: Fn(Instant) -> bool,
    {
        let mut ready: Vec<(Instant, GroupKey, SizeMap)> = Vec::new();
        for (key, state) in self.groups.iter_mut() {
            let DebounceState::Pending { deadline, .. } = state else {
                continue;
            };
            if !due(*deadline) {
                continue;
            }
            let deadline = *deadline;
            if let DebounceState::Pending { sizes, .. } =
                std::mem::replace(state, DebounceState::Idle)
            {
                ready.push((deadline, key.clone(), sizes));
            }
        }
        ready.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        let count = ready.len();
        for (_, (layout, group), sizes) in ready {
            if writer.update_group_sizes(&layout, &group, &sizes) {
                self.metrics.committed += 1;
                debug!(target: "render.debounce", layout = %layout, group = %group, "resize_committed");
            } else {
                self.metrics.dropped_stale += 1;
                debug!(target: "render.debounce", layout = %layout, group = %group, "resize_dropped_stale_group");
            }
        }
        count
    }

    /// Drop every pending write for `layout_name` without committing it.
    /// Returns how many groups were discarded.
    pub fn discard_layout(&mut self, layout_name: &str) -> usize {
        let mut discarded = 0;
        for ((layout, _), state) in self.groups.iter_mut() {
            if layout == layout_name && matches!(state, DebounceState::Pending { .. }) {
                *state = DebounceState::Idle;
                discarded += 1;
            }
        }
        if discarded > 0 {
            debug!(target: "render.debounce", layout = layout_name, discarded, "resize_discarded");
        }
        discarded
    }

    /// `tree` with every pending size for `layout_name` applied. Pending
    /// values are render-only until committed.
    pub fn preview(&self, layout_name: &str, tree: &LayoutNode) -> LayoutNode {
        let mut out = tree.clone();
        for ((layout, group), state) in &self.groups {
            if layout != layout_name {
                continue;
            }
            if let DebounceState::Pending { sizes, .. } = state
                && let Some(next) = out.with_group_sizes(group, sizes)
            {
                out = next;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Vec<(String, String, SizeMap)>,
        reject: bool,
    }

    impl LayoutWriter for RecordingWriter {
        fn update_group_sizes(&mut self, layout_name: &str, group_id: &str, sizes: &SizeMap) -> bool {
            self.calls
                .push((layout_name.to_string(), group_id.to_string(), sizes.clone()));
            !self.reject
        }
    }

    fn sizes(a: f64) -> SizeMap {
        SizeMap::from([("g4-0".to_string(), a), ("g4-1".to_string(), 100.0 - a)])
    }

    #[test]
    fn burst_commits_once_with_final_value() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(300));
        let mut w = RecordingWriter::default();
        for i in 0..10u64 {
            let now = t0 + Duration::from_millis(i * 25);
            d.record(now, "grid-4", "g4-left-group", sizes(20.0 + i as f64));
            assert_eq!(d.poll_expired(now, &mut w), 0);
        }
        let last = t0 + Duration::from_millis(260);
        d.record(last, "grid-4", "g4-left-group", sizes(42.0));
        assert_eq!(d.poll_expired(last + Duration::from_millis(299), &mut w), 0);
        assert_eq!(d.poll_expired(last + Duration::from_millis(400), &mut w), 1);
        assert_eq!(w.calls.len(), 1);
        assert_eq!(w.calls[0].2, sizes(42.0));
        assert_eq!(d.state("grid-4", "g4-left-group"), DebounceState::Idle);
        let m = d.metrics();
        assert_eq!((m.recorded, m.superseded, m.committed), (11, 10, 1));
    }

    #[test]
    fn groups_are_independent() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(300));
        let mut w = RecordingWriter::default();
        d.record(t0, "grid-4", "g4-left-group", sizes(30.0));
        d.record(t0 + Duration::from_millis(200), "grid-4", "g4-right-group", sizes(60.0));
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_millis(300)));
        assert_eq!(d.poll_expired(t0 + Duration::from_millis(350), &mut w), 1);
        assert_eq!(w.calls[0].1, "g4-left-group");
        assert!(d.is_pending());
        assert_eq!(d.poll_expired(t0 + Duration::from_millis(500), &mut w), 1);
        assert_eq!(w.calls[1].1, "g4-right-group");
        assert!(!d.is_pending());
        assert_eq!(d.next_deadline(), None);
    }

    #[test]
    fn stale_group_is_counted_not_retried() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(10));
        let mut w = RecordingWriter {
            reject: true,
            ..Default::default()
        };
        d.record(t0, "grid-4", "gone", sizes(30.0));
        d.poll_expired(t0 + Duration::from_millis(20), &mut w);
        d.poll_expired(t0 + Duration::from_millis(40), &mut w);
        assert_eq!(w.calls.len(), 1);
        assert_eq!(d.metrics().dropped_stale, 1);
    }

    #[test]
    fn flush_all_ignores_deadlines() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_secs(60));
        let mut w = RecordingWriter::default();
        d.record(t0, "split-h", "sh-root", sizes(30.0));
        d.record(t0, "grid-4", "g4-root", sizes(30.0));
        assert_eq!(d.flush_all(&mut w), 2);
        assert_eq!(d.flush_all(&mut w), 0);
    }

    #[test]
    fn preview_applies_only_matching_layout() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(300));
        d.record(t0, "grid-4", "g4-left-group", sizes(25.0));
        d.record(t0, "split-h", "g4-left-group", sizes(90.0));
        let tree = core_model::LayoutTemplate::Grid4.tree();
        let shown = d.preview("grid-4", &tree);
        let left = shown.find_group("g4-left-group").unwrap();
        assert_eq!(left.children()[0].default_size(), Some(25.0));
        assert_eq!(left.children()[1].default_size(), Some(75.0));
        // the source tree is untouched
        assert_eq!(tree.find_group("g4-left-group").unwrap().children()[0].default_size(), Some(50.0));
    }

    #[test]
    fn discard_layout_leaves_other_layouts_pending() {
        let t0 = Instant::now();
        let mut d = ResizeDebouncer::new(Duration::from_millis(300));
        let mut w = RecordingWriter::default();
        d.record(t0, "grid-4", "g4-left-group", sizes(25.0));
        d.record(t0, "grid-4", "g4-right-group", sizes(35.0));
        d.record(t0, "split-h", "sh-root", sizes(40.0));
        assert_eq!(d.discard_layout("grid-4"), 2);
        assert_eq!(d.discard_layout("grid-4"), 0);
        assert_eq!(d.state("grid-4", "g4-left-group"), DebounceState::Idle);

        let tree = core_model::LayoutTemplate::Grid4.tree();
        assert_eq!(d.preview("grid-4", &tree), tree);
        assert_eq!(d.poll_expired(t0 + Duration::from_millis(400), &mut w), 1);
        assert_eq!(w.calls[0].0, "split-h");
        assert_eq!(d.metrics().committed, 1);
    }
}
