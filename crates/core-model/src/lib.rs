//! Layout model: the recursive split tree, the widget registry, and the
//! built-in template registry.
//!
//! A dashboard viewport is partitioned by a binary-or-wider tree of
//! [`LayoutNode`]s. Interior nodes (`Group`) split their area along one axis
//! between ordered children; leaves (`Widget`) are slots addressed by a flat
//! `slot_index` into the widget-assignment array owned by `core-state`.
//!
//! Core invariants (checked by [`LayoutNode::validate`], not by the type):
//! * Every `Group` has at least one child (two in practice).
//! * Leaf `slot_index` values are unique within one tree.
//! * Node ids are unique within one tree and stable across edits.
//! * The mapping from tree position to `slot_index` is fixed when a template
//!   is authored; nothing at runtime renumbers slots. A resized copy of a
//!   template therefore keeps every widget in the pane it was assigned to.
//!
//! Sibling `default_size` values are proportions, not percentages that must
//! sum to 100; the renderer normalizes them. The root's size is ignored.
//!
//! All tree algorithms here are pure. Mutation of a stored tree happens only
//! through `core-state::LayoutStore`, which replaces whole trees with the
//! output of [`LayoutNode::with_group_sizes`].

mod layout;
mod node;
mod templates;
mod widget;

pub use layout::Rect;
pub use node::{Direction, LayoutNode, SizeMap, TreeError};
pub use templates::{LayoutTemplate, resolve_template};
pub use widget::{PrimaryTask, TaskKind, WidgetType};
