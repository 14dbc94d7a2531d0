//! Pointer drag on a split handle.
//!
//! A drag moves the boundary between the two children adjacent to the
//! grabbed handle. Every other child of the group keeps its size, and the
//! pair's combined share is preserved, so the group still sums to 100.

use crate::layout::HandleRegion;
use core_model::{Direction, SizeMap};

#[derive(Debug, Clone)]
pub struct DragSession {
    handle: HandleRegion,
    origin: u16,
    min_pane_percent: f64,
}

impl DragSession {
    /// Start dragging `handle` from pointer position `(column, row)`.
    pub fn begin(handle: HandleRegion, column: u16, row: u16, min_pane_percent: f64) -> Self {
        let origin = main_coord(handle.direction, column, row);
        tracing::trace!(target: "render.drag", group = %handle.group_id, index = handle.index, origin, "drag_begin");
        Self {
            handle,
            origin,
            min_pane_percent,
        }
    }

    pub fn layout_name(&self) -> &str {
        &self.handle.layout_name
    }

    pub fn group_id(&self) -> &str {
        &self.handle.group_id
    }

    pub fn handle(&self) -> &HandleRegion {
        &self.handle
    }

    /// Sizes for every child of the group with the pointer at
    /// `(column, row)`. Only the two children adjacent to the handle differ
    /// from the sizes captured when the drag began.
    pub fn sizes_at(&self, column: u16, row: u16) -> SizeMap {
        let h = &self.handle;
        let (a_idx, b_idx) = (h.index, h.index + 1);
        let a = h.child_sizes[a_idx];
        let b = h.child_sizes[b_idx];
        let pair = a + b;

        let cells: u32 = h.child_spans.iter().map(|c| u32::from(*c)).sum();
        let pct_per_cell = if cells == 0 { 0.0 } else { 100.0 / f64::from(cells) };
        let delta_cells =
            f64::from(main_coord(h.direction, column, row)) - f64::from(self.origin);

        let min = self.min_pane_percent.max(0.0);
        let new_a = if pair <= 2.0 * min {
            pair / 2.0
        } else {
            (a + delta_cells * pct_per_cell).clamp(min, pair - min)
        };
        let new_a = round2(new_a);
        let new_b = round2(pair - new_a);

        h.child_ids
            .iter()
            .zip(&h.child_sizes)
            .enumerate()
            .map(|(i, (id, size))| {
                let v = if i == a_idx {
                    new_a
                } else if i == b_idx {
                    new_b
                } else {
                    *size
                };
                (id.clone(), v)
            })
            .collect()
    }
}

fn main_coord(direction: Direction, column: u16, row: u16) -> u16 {
    match direction {
        Direction::Horizontal => column,
        Direction::Vertical => row,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
