//! Recursive layout pass: turns a `LayoutNode` tree into concrete pane and
//! drag-handle regions for one viewport.
//!
//! The layout name and minimum pane share are threaded through every call;
//! the pass reads nothing else and writes only into the supplied
//! [`LayoutFrame`].

use crate::sizes::{allocate_cells, normalize_sizes};
use core_model::{Direction, LayoutNode, Rect};

/// Widget slot placed at `rect`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaneRegion {
    pub slot_index: usize,
    pub node_id: String,
    pub rect: Rect,
}

/// One-cell gutter between children `index` and `index + 1` of a group.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRegion {
    pub layout_name: String,
    pub group_id: String,
    pub index: usize,
    pub direction: Direction,
    pub rect: Rect,
    pub group_rect: Rect,
    /// Ids of every child of the group, in order.
    pub child_ids: Vec<String>,
    /// Normalized child sizes (percent) used for this layout pass.
    pub child_sizes: Vec<f64>,
    /// Cells allocated to each child along the main axis.
    pub child_spans: Vec<u16>,
}

impl HandleRegion {
    /// Position of this handle along the group's main axis.
    pub fn main_position(&self) -> u16 {
        self.rect.main_start(self.direction)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayoutFrame {
    pub panes: Vec<PaneRegion>,
    pub handles: Vec<HandleRegion>,
}

impl LayoutFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.panes.clear();
        self.handles.clear();
    }

    pub fn pane_at(&self, column: u16, row: u16) -> Option<&PaneRegion> {
        self.panes.iter().find(|p| p.rect.contains(column, row))
    }

    pub fn handle_at(&self, column: u16, row: u16) -> Option<&HandleRegion> {
        self.handles.iter().find(|h| h.rect.contains(column, row))
    }

    pub fn pane_for_slot(&self, slot_index: usize) -> Option<&PaneRegion> {
        self.panes.iter().find(|p| p.slot_index == slot_index)
    }
}

/// Lay out `node` inside `area`.
///
/// A widget leaf becomes one pane. A group splits its area along
/// `direction`, reserving one gutter cell between consecutive children (none
/// before the first or after the last) and recursing into each child.
pub fn render_layout(
    node: &LayoutNode,
    layout_name: &str,
    area: Rect,
    min_pane_percent: f64,
    out: &mut LayoutFrame,
) {
    match node {
        LayoutNode::Widget { id, slot_index, .. } => out.panes.push(PaneRegion {
            slot_index: *slot_index,
            node_id: id.clone(),
            rect: area,
        }),
        LayoutNode::Group {
            id,
            direction,
            children,
            ..
        } => {
            if children.is_empty() {
                tracing::debug!(target: "render.layout", group = %id, "empty_group_skipped");
                return;
            }
            let gutters = (children.len() - 1) as u16;
            let available = area.main_len(*direction).saturating_sub(gutters);
            let sizes: Vec<Option<f64>> = children.iter().map(LayoutNode::default_size).collect();
            let pcts = normalize_sizes(&sizes, min_pane_percent);
            let spans = allocate_cells(&pcts, available);
            let child_ids: Vec<String> = children.iter().map(|c| c.id().to_string()).collect();

            let mut offset = 0u16;
            for (i, child) in children.iter().enumerate() {
                let child_area = area.slice(*direction, offset, spans[i]);
                render_layout(child, layout_name, child_area, min_pane_percent, out);
                offset = offset.saturating_add(spans[i]);
                if i + 1 < children.len() {
                    out.handles.push(HandleRegion {
                        layout_name: layout_name.to_string(),
                        group_id: id.clone(),
                        index: i,
                        direction: *direction,
                        rect: area.slice(*direction, offset, 1),
                        group_rect: area,
                        child_ids: child_ids.clone(),
                        child_sizes: pcts.clone(),
                        child_spans: spans.clone(),
                    });
                    offset = offset.saturating_add(1);
                }
            }
        }
    }
}
