//! Terminal writer.
//!
//! Translates frame rows into a flat command list (move, attribute change,
//! print) and flushes it in one go. Runs of cells sharing the same flags are
//! batched into a single `Print`.
//!
//! Invariants:
//! * Commands preserve ordering; no flushing mid-frame.
//! * Every emitted row starts with an explicit `MoveTo(0, y)`.
//! * Attributes are reset at the end of each row.

use crate::layout::LayoutFrame;
use crate::scheduler::RenderDelta;
use crate::{CellFlags, Frame};
use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Print, SetAttribute},
};
use std::collections::BTreeSet;
use std::io::{Write, stdout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MoveTo(u16, u16),
    Style(CellFlags),
    Print(String),
}

#[derive(Debug, Default)]
pub struct Writer {
    cmds: Vec<Command>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    /// Queue rows of `frame`.
    pub fn push_rows<I: IntoIterator<Item = u16>>(&mut self, frame: &Frame, rows: I) {
        for y in rows {
            if y >= frame.height {
                continue;
            }
            self.cmds.push(Command::MoveTo(0, y));
            let mut run = String::new();
            let mut run_flags = CellFlags::empty();
            self.cmds.push(Command::Style(run_flags));
            for x in 0..frame.width {
                let Some(cell) = frame.cell(x, y) else {
                    continue;
                };
                if cell.flags != run_flags {
                    if !run.is_empty() {
                        self.cmds.push(Command::Print(std::mem::take(&mut run)));
                    }
                    run_flags = cell.flags;
                    self.cmds.push(Command::Style(run_flags));
                }
                run.push(cell.ch);
            }
            if !run.is_empty() {
                self.cmds.push(Command::Print(run));
            }
            self.cmds.push(Command::Style(CellFlags::empty()));
        }
    }

    pub fn flush_to<W: Write>(self, out: &mut W) -> Result<()> {
        for c in self.cmds {
            match c {
                Command::MoveTo(x, y) => queue!(out, MoveTo(x, y))?,
                Command::Style(flags) => {
                    queue!(out, SetAttribute(Attribute::Reset))?;
                    if flags.contains(CellFlags::REVERSE) {
                        queue!(out, SetAttribute(Attribute::Reverse))?;
                    }
                    if flags.contains(CellFlags::BOLD) {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    if flags.contains(CellFlags::DIM) {
                        queue!(out, SetAttribute(Attribute::Dim))?;
                    }
                }
                Command::Print(s) => queue!(out, Print(s))?,
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn flush(self) -> Result<()> {
        let mut out = stdout();
        self.flush_to(&mut out)
    }
}

/// Rows that must be re-emitted for `delta`. Pane repaints include the status
/// row since its content may depend on the same change.
pub fn dirty_rows(delta: &RenderDelta, layout: &LayoutFrame, height: u16) -> BTreeSet<u16> {
    let status_row = height.saturating_sub(1);
    match delta {
        RenderDelta::Relayout => (0..height).collect(),
        RenderDelta::StatusLine => BTreeSet::from([status_row]),
        RenderDelta::Panes(slots) => {
            let mut rows = BTreeSet::from([status_row]);
            for pane in layout.panes.iter().filter(|p| slots.contains(&p.slot_index)) {
                rows.extend(pane.rect.y..pane.rect.y + pane.rect.height);
            }
            rows.retain(|r| *r < height);
            rows
        }
    }
}

/// Emit the rows `delta` requires. Returns the number of rows written.
pub fn emit<W: Write>(frame: &Frame, layout: &LayoutFrame, delta: &RenderDelta, out: &mut W) -> Result<usize> {
    let rows = dirty_rows(delta, layout, frame.height);
    let count = rows.len();
    let mut writer = Writer::new();
    writer.push_rows(frame, rows);
    writer.flush_to(out)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::Rect;

    #[test]
    fn runs_are_batched_by_flags() {
        let mut f = Frame::new(6, 1);
        f.put_str(0, 0, "ab", 6, CellFlags::empty());
        f.put_str(2, 0, "cd", 6, CellFlags::REVERSE);
        let mut w = Writer::new();
        w.push_rows(&f, [0]);
        let prints: Vec<&Command> = w
            .commands()
            .iter()
            .filter(|c| matches!(c, Command::Print(_)))
            .collect();
        assert_eq!(
            prints,
            vec![
                &Command::Print("ab".into()),
                &Command::Print("cd".into()),
                &Command::Print("  ".into())
            ]
        );
    }

    #[test]
    fn pane_delta_rows() {
        let mut layout = LayoutFrame::new();
        layout.panes.push(crate::layout::PaneRegion {
            slot_index: 1,
            node_id: "x".into(),
            rect: Rect::new(0, 2, 10, 3),
        });
        let rows = dirty_rows(&RenderDelta::Panes(BTreeSet::from([1])), &layout, 10);
        assert_eq!(rows.into_iter().collect::<Vec<_>>(), vec![2, 3, 4, 9]);
        assert_eq!(dirty_rows(&RenderDelta::Relayout, &layout, 3).len(), 3);
    }

    #[test]
    fn flush_writes_bytes() {
        let mut f = Frame::new(3, 1);
        f.put_str(0, 0, "hey", 3, CellFlags::BOLD);
        let mut buf: Vec<u8> = Vec::new();
        let n = emit(&f, &LayoutFrame::new(), &RenderDelta::Relayout, &mut buf).unwrap();
        assert_eq!(n, 1);
        assert!(String::from_utf8_lossy(&buf).contains("hey"));
    }
}
