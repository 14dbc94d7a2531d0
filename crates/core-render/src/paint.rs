//! Compose a cell `Frame` from a laid-out dashboard.
//!
//! Panes are boxed, titled with their slot number, and show either the
//! assigned widget's label or the empty-slot prompt. Handles are drawn as
//! double lines across the gutter. The last row holds the status line.

use crate::layout::{HandleRegion, LayoutFrame, PaneRegion};
use crate::status::{StatusContext, compose_status, format_status};
use crate::{CellFlags, Frame};
use core_model::{Direction, WidgetType};
use core_tasks::{TaskStatus, slot_is_updating};

pub const EMPTY_SLOT_PROMPT: &str = "+ select widget";
pub const UPDATING_BADGE: &str = "updating...";

pub struct PaintContext<'a> {
    pub widgets: &'a [Option<WidgetType>],
    pub statuses: &'a [TaskStatus],
    pub target: &'a str,
    pub focused_slot: Option<usize>,
    /// Handle being dragged, highlighted while the pointer is down.
    pub active_handle: Option<(&'a str, usize)>,
    pub status: StatusContext<'a>,
}

/// Paint a whole frame of `width` x `height`; the layout occupies every row
/// but the last.
pub fn paint(layout: &LayoutFrame, ctx: &PaintContext<'_>, width: u16, height: u16) -> Frame {
    let mut frame = Frame::new(width, height);
    for pane in &layout.panes {
        paint_pane(&mut frame, pane, ctx);
    }
    for handle in &layout.handles {
        paint_handle(&mut frame, handle, ctx);
    }
    paint_status(&mut frame, ctx);
    frame
}

pub fn paint_status(frame: &mut Frame, ctx: &PaintContext<'_>) {
    if frame.height == 0 {
        return;
    }
    let y = frame.height - 1;
    let line = format_status(&compose_status(&ctx.status), frame.width);
    frame.fill_row(y, CellFlags::REVERSE);
    frame.put_str(0, y, &line, frame.width, CellFlags::REVERSE);
}

pub fn paint_pane(frame: &mut Frame, pane: &PaneRegion, ctx: &PaintContext<'_>) {
    let r = pane.rect;
    if r.width == 0 || r.height == 0 {
        return;
    }
    let focused = ctx.focused_slot == Some(pane.slot_index);
    let border = if focused { CellFlags::BOLD } else { CellFlags::empty() };
    frame.fill_rect(r, ' ', CellFlags::empty());
    if r.width >= 2 && r.height >= 2 {
        let (x1, y1) = (r.x + r.width - 1, r.y + r.height - 1);
        for x in r.x + 1..x1 {
            frame.set_char(x, r.y, '─', border);
            frame.set_char(x, y1, '─', border);
        }
        for y in r.y + 1..y1 {
            frame.set_char(r.x, y, '│', border);
            frame.set_char(x1, y, '│', border);
        }
        frame.set_char(r.x, r.y, '┌', border);
        frame.set_char(x1, r.y, '┐', border);
        frame.set_char(r.x, y1, '└', border);
        frame.set_char(x1, y1, '┘', border);
        let title = format!(" {} ", pane.slot_index + 1);
        frame.put_str(r.x + 1, r.y, &title, r.width.saturating_sub(2), border);
    }

    let inner = r.inner();
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let widget = ctx.widgets.get(pane.slot_index).copied().flatten();
    match widget {
        Some(w) => {
            let updating = slot_is_updating(w, ctx.statuses, ctx.target);
            let body = if updating && w.dims_on_update() {
                CellFlags::DIM
            } else {
                CellFlags::BOLD
            };
            frame.put_str(inner.x, inner.y, w.label(), inner.width, body);
            if updating && inner.height >= 2 {
                frame.put_str(inner.x, inner.y + 1, UPDATING_BADGE, inner.width, CellFlags::REVERSE);
            }
        }
        None => {
            let y = inner.y + inner.height / 2;
            let len = EMPTY_SLOT_PROMPT.chars().count() as u16;
            let x = inner.x + inner.width.saturating_sub(len) / 2;
            frame.put_str(x, y, EMPTY_SLOT_PROMPT, inner.width, CellFlags::DIM);
        }
    }
}

fn paint_handle(frame: &mut Frame, handle: &HandleRegion, ctx: &PaintContext<'_>) {
    let active = ctx.active_handle == Some((handle.group_id.as_str(), handle.index));
    let flags = if active { CellFlags::REVERSE } else { CellFlags::empty() };
    let ch = match handle.direction {
        Direction::Horizontal => '║',
        Direction::Vertical => '═',
    };
    frame.fill_rect(handle.rect, ch, flags);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::render_layout;
    use core_model::{LayoutTemplate, Rect, TaskKind};
    use core_tasks::{TaskParams, TaskState};

    fn status<'a>() -> StatusContext<'a> {
        StatusContext {
            layout_label: "2 Columns (H)",
            layout_name: "split-h",
            customized: false,
            target: "ALL",
            pinned: None,
            message: None,
            resize_pending: false,
        }
    }

    fn frame_for(widgets: &[Option<WidgetType>], statuses: &[TaskStatus]) -> Frame {
        let mut layout = LayoutFrame::new();
        render_layout(&LayoutTemplate::SplitH.tree(), "split-h", Rect::viewport(41, 9), 10.0, &mut layout);
        let ctx = PaintContext {
            widgets,
            statuses,
            target: "ALL",
            focused_slot: Some(0),
            active_handle: None,
            status: status(),
        };
        paint(&layout, &ctx, 41, 10)
    }

    #[test]
    fn empty_and_assigned_slots() {
        let f = frame_for(&[Some(WidgetType::Analytics), None], &[]);
        let rows: Vec<String> = (0..10).map(|y| f.row_text(y)).collect();
        assert!(rows[1].contains(WidgetType::Analytics.label()));
        assert!(rows.iter().any(|r| r.contains(EMPTY_SLOT_PROMPT)));
        assert!(rows[0].starts_with("┌ 1 "));
        assert_eq!(rows[4].chars().nth(20), Some('║'));
        assert!(rows[9].contains("split-h"));
    }

    #[test]
    fn updating_badge_for_running_primary_task() {
        let running = TaskStatus {
            task_id: "t".into(),
            status: TaskState::Running,
            user: String::new(),
            progress: 0.0,
            message: String::new(),
            last_heartbeat: "2025-01-01T00:00:00".into(),
            params: TaskParams::new("ALL", TaskKind::Pricing),
        };
        let f = frame_for(&[Some(WidgetType::Analytics), Some(WidgetType::Settings)], &[running]);
        let row = f.row_text(2);
        assert_eq!(row.matches(UPDATING_BADGE).count(), 1);
    }
}
