//! Layout rendering for the dashboard grid.
//!
//! Pipeline per frame:
//! 1. `layout::render_layout` walks the resolved tree (with any debounced,
//!    not-yet-committed drag sizes overlaid by `debounce::ResizeDebouncer::preview`)
//!    and produces pane + handle regions for the viewport.
//! 2. `paint::paint` composes a cell `Frame` from those regions, the widget
//!    assignments, and the latest task statuses.
//! 3. `scheduler::RenderScheduler` decides which rows changed and
//!    `writer::emit` flushes only those.
//!
//! Relayout happens only when the `render_key::RenderKey` (layout name +
//! tree shape) or the viewport changes; widget assignment and status updates
//! repaint panes in place.
//!
//! Drag handling lives next to layout because it needs the handle geometry:
//! `drag::DragSession` converts pointer motion into a size map for one group,
//! which goes to the debouncer, never straight to the store.

use bitflags::bitflags;
use core_model::Rect;

pub mod debounce;
pub mod drag;
pub mod layout;
pub mod paint;
pub mod render_key;
pub mod scheduler;
pub mod sizes;
pub mod status;
pub mod writer;

pub use debounce::{DebounceState, ResizeDebouncer};
pub use drag::DragSession;
pub use layout::{HandleRegion, LayoutFrame, PaneRegion, render_layout};
pub use render_key::RenderKey;
pub use scheduler::{Decision, RenderDelta, RenderScheduler};
pub use sizes::{allocate_cells, normalize_sizes};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const REVERSE = 0b0000_0001;
        const BOLD    = 0b0000_0010;
        const DIM     = 0b0000_0100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub flags: CellFlags,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            flags: CellFlags::empty(),
        }
    }
}

/// Row-major grid of single-width cells.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn set_char(&mut self, x: u16, y: u16, ch: char, flags: CellFlags) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Cell { ch, flags };
        }
    }

    /// Write `s` starting at `(x, y)`, at most `max_width` cells, clipped to
    /// the frame. Returns the number of cells written.
    pub fn put_str(&mut self, x: u16, y: u16, s: &str, max_width: u16, flags: CellFlags) -> u16 {
        let mut written = 0u16;
        for ch in s.chars() {
            if written >= max_width {
                break;
            }
            let cx = x.saturating_add(written);
            if cx >= self.width {
                break;
            }
            self.set_char(cx, y, ch, flags);
            written += 1;
        }
        written
    }

    pub fn fill_rect(&mut self, rect: Rect, ch: char, flags: CellFlags) {
        for y in rect.y..rect.y.saturating_add(rect.height) {
            for x in rect.x..rect.x.saturating_add(rect.width) {
                self.set_char(x, y, ch, flags);
            }
        }
    }

    /// Blank a whole row with `flags`.
    pub fn fill_row(&mut self, y: u16, flags: CellFlags) {
        self.fill_rect(Rect::new(0, y, self.width, 1), ' ', flags);
    }

    /// Row content as a string (tests / diagnostics).
    pub fn row_text(&self, y: u16) -> String {
        (0..self.width)
            .filter_map(|x| self.cell(x, y).map(|c| c.ch))
            .collect()
    }
}
