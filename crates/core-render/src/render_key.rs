//! Identity of a laid-out dashboard.
//!
//! The pane geometry only has to be recomputed when the active layout name
//! or the resolved tree's shape (ids, directions, slots, sizes) changes.
//! Assigning a widget to a slot leaves the key untouched.

use ahash::AHasher;
use core_model::{Direction, LayoutNode};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderKey {
    layout_name: String,
    shape: u64,
}

impl RenderKey {
    pub fn of(layout_name: &str, tree: &LayoutNode) -> Self {
        let mut hasher = AHasher::default();
        hash_node(tree, &mut hasher);
        Self {
            layout_name: layout_name.to_string(),
            shape: hasher.finish(),
        }
    }

    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    pub fn shape(&self) -> u64 {
        self.shape
    }
}

fn hash_node(node: &LayoutNode, h: &mut AHasher) {
    node.id().hash(h);
    node.default_size().map(f64::to_bits).hash(h);
    match node {
        LayoutNode::Widget { slot_index, .. } => {
            0u8.hash(h);
            slot_index.hash(h);
        }
        LayoutNode::Group {
            direction,
            children,
            ..
        } => {
            1u8.hash(h);
            matches!(direction, Direction::Horizontal).hash(h);
            children.len().hash(h);
            for child in children {
                hash_node(child, h);
            }
        }
    }
}
