//! Viewport geometry in terminal cell units.
//!
//! Invariants:
//! * Splits never produce a child extending past its parent.
//! * Zero-sized rects are legal (degenerate viewport) and contain no points.

use crate::node::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Full viewport rooted at the origin.
    pub fn viewport(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && row >= self.y
            && u32::from(column) < u32::from(self.x) + u32::from(self.width)
            && u32::from(row) < u32::from(self.y) + u32::from(self.height)
    }

    /// Extent along the main axis of `direction`.
    pub fn main_len(&self, direction: Direction) -> u16 {
        match direction {
            Direction::Horizontal => self.width,
            Direction::Vertical => self.height,
        }
    }

    /// Start coordinate along the main axis of `direction`.
    pub fn main_start(&self, direction: Direction) -> u16 {
        match direction {
            Direction::Horizontal => self.x,
            Direction::Vertical => self.y,
        }
    }

    /// Sub-rect spanning `[offset, offset + len)` along the main axis and the
    /// full cross axis. Clamped to `self`.
    pub fn slice(&self, direction: Direction, offset: u16, len: u16) -> Rect {
        let main = self.main_len(direction);
        let offset = offset.min(main);
        let len = len.min(main - offset);
        match direction {
            Direction::Horizontal => Rect::new(self.x + offset, self.y, len, self.height),
            Direction::Vertical => Rect::new(self.x, self.y + offset, self.width, len),
        }
    }

    /// Shrink by one cell on each side (box border). Collapses to empty when
    /// too small.
    pub fn inner(&self) -> Rect {
        if self.width < 2 || self.height < 2 {
            return Rect::new(self.x, self.y, 0, 0);
        }
        Rect::new(self.x + 1, self.y + 1, self.width - 2, self.height - 2)
    }
}
