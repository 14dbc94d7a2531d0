//! Pointer handling: pane focus on click and handle drags.
//!
//! A drag never touches the store. Each motion event records the group's
//! sizes into the `ResizeDebouncer`; the runtime commits them once the
//! group has been quiet for the configured period.

use core_events::{MouseButton, MouseEvent, MouseEventKind};
use core_render::{DragSession, LayoutFrame, ResizeDebouncer};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    None,
    Focus(usize),
    DragStarted,
    Dragged,
    DragEnded,
}

#[derive(Debug)]
pub struct PointerController {
    drag: Option<DragSession>,
    min_pane_percent: f64,
}

impl PointerController {
    pub fn new(min_pane_percent: f64) -> Self {
        Self {
            drag: None,
            min_pane_percent,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// `(group_id, handle index)` of the handle being dragged.
    pub fn active_handle(&self) -> Option<(&str, usize)> {
        self.drag
            .as_ref()
            .map(|d| (d.group_id(), d.handle().index))
    }

    /// Abandon the drag without recording anything further (layout switched
    /// underneath it).
    pub fn cancel(&mut self) -> bool {
        self.drag.take().is_some()
    }

    pub fn handle(
        &mut self,
        event: &MouseEvent,
        frame: &LayoutFrame,
        now: Instant,
        debouncer: &mut ResizeDebouncer,
    ) -> PointerOutcome {
        let (col, row) = (event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(handle) = frame.handle_at(col, row) {
                    debug!(target: "actions.pointer", group = %handle.group_id, index = handle.index, "drag_start");
                    self.drag = Some(DragSession::begin(handle.clone(), col, row, self.min_pane_percent));
                    return PointerOutcome::DragStarted;
                }
                match frame.pane_at(col, row) {
                    Some(pane) => PointerOutcome::Focus(pane.slot_index),
                    None => PointerOutcome::None,
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(drag) = &self.drag else {
                    return PointerOutcome::None;
                };
                debouncer.record(now, drag.layout_name(), drag.group_id(), drag.sizes_at(col, row));
                PointerOutcome::Dragged
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(drag) = self.drag.take() else {
                    return PointerOutcome::None;
                };
                debouncer.record(now, drag.layout_name(), drag.group_id(), drag.sizes_at(col, row));
                debug!(target: "actions.pointer", group = drag.group_id(), "drag_end");
                PointerOutcome::DragEnded
            }
            _ => PointerOutcome::None,
        }
    }
}
