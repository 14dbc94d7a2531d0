use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Proportional sizes keyed by child node id, as reported by one split
/// container for its immediate children.
pub type SizeMap = BTreeMap<String, f64>;

/// Main axis of a split group. `Horizontal` lays children out left to right,
/// `Vertical` top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

/// One node of a layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    /// Leaf slot holding at most one widget.
    #[serde(rename_all = "camelCase")]
    Widget {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_size: Option<f64>,
        slot_index: usize,
    },
    /// Oriented split between ordered children.
    #[serde(rename_all = "camelCase")]
    Group {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_size: Option<f64>,
        direction: Direction,
        #[serde(alias = "widgets")]
        children: Vec<LayoutNode>,
    },
}

/// Structural defects reported by [`LayoutNode::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("group `{0}` has no children")]
    EmptyGroup(String),
    #[error("slot index {slot} appears more than once (second at node `{node}`)")]
    DuplicateSlot { slot: usize, node: String },
    #[error("node id `{0}` appears more than once")]
    DuplicateId(String),
}

impl LayoutNode {
    pub fn widget(id: impl Into<String>, slot_index: usize, default_size: Option<f64>) -> Self {
        LayoutNode::Widget {
            id: id.into(),
            default_size,
            slot_index,
        }
    }

    pub fn group(
        id: impl Into<String>,
        direction: Direction,
        default_size: Option<f64>,
        children: Vec<LayoutNode>,
    ) -> Self {
        LayoutNode::Group {
            id: id.into(),
            default_size,
            direction,
            children,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LayoutNode::Widget { id, .. } | LayoutNode::Group { id, .. } => id,
        }
    }

    pub fn default_size(&self) -> Option<f64> {
        match self {
            LayoutNode::Widget { default_size, .. } | LayoutNode::Group { default_size, .. } => {
                *default_size
            }
        }
    }

    pub fn children(&self) -> &[LayoutNode] {
        match self {
            LayoutNode::Widget { .. } => &[],
            LayoutNode::Group { children, .. } => children,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LayoutNode::Group { .. })
    }

    /// Number of widget slots (leaves) in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            LayoutNode::Widget { .. } => 1,
            LayoutNode::Group { children, .. } => children.iter().map(Self::leaf_count).sum(),
        }
    }

    /// Leaf slot indices in depth-first, left-to-right order.
    pub fn slot_indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.leaf_count());
        self.collect_slots(&mut out);
        out
    }

    fn collect_slots(&self, out: &mut Vec<usize>) {
        match self {
            LayoutNode::Widget { slot_index, .. } => out.push(*slot_index),
            LayoutNode::Group { children, .. } => {
                for child in children {
                    child.collect_slots(out);
                }
            }
        }
    }

    /// Length the flat widget array needs so every slot of this tree is
    /// addressable. Equals `leaf_count()` for the built-in templates.
    pub fn slot_span(&self) -> usize {
        self.slot_indices()
            .into_iter()
            .max()
            .map_or(0, |max| max + 1)
            .max(self.leaf_count())
    }

    /// Locate the group whose id is `group_id`.
    pub fn find_group(&self, group_id: &str) -> Option<&LayoutNode> {
        match self {
            LayoutNode::Widget { .. } => None,
            LayoutNode::Group { id, children, .. } => {
                if id == group_id {
                    return Some(self);
                }
                children.iter().find_map(|c| c.find_group(group_id))
            }
        }
    }

    /// Return a copy of this tree in which the immediate children of group
    /// `group_id` take their `default_size` from `sizes`. Children missing
    /// from `sizes` keep their existing value; every other node is copied
    /// unchanged. Returns `None` when no group with that id exists.
    pub fn with_group_sizes(&self, group_id: &str, sizes: &SizeMap) -> Option<LayoutNode> {
        match self {
            LayoutNode::Widget { .. } => None,
            LayoutNode::Group {
                id,
                default_size,
                direction,
                children,
            } => {
                if id == group_id {
                    let children = children
                        .iter()
                        .map(|child| {
                            let mut child = child.clone();
                            let next = sizes.get(child.id()).copied().or(child.default_size());
                            child.set_default_size(next);
                            child
                        })
                        .collect();
                    return Some(LayoutNode::Group {
                        id: id.clone(),
                        default_size: *default_size,
                        direction: *direction,
                        children,
                    });
                }
                let (pos, replaced) = children
                    .iter()
                    .enumerate()
                    .find_map(|(i, c)| c.with_group_sizes(group_id, sizes).map(|n| (i, n)))?;
                let mut children = children.clone();
                children[pos] = replaced;
                Some(LayoutNode::Group {
                    id: id.clone(),
                    default_size: *default_size,
                    direction: *direction,
                    children,
                })
            }
        }
    }

    fn set_default_size(&mut self, size: Option<f64>) {
        match self {
            LayoutNode::Widget { default_size, .. } | LayoutNode::Group { default_size, .. } => {
                *default_size = size
            }
        }
    }

    /// Check the structural invariants documented at crate level.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut ids = HashSet::new();
        let mut slots = HashSet::new();
        self.validate_into(&mut ids, &mut slots)
    }

    fn validate_into<'a>(
        &'a self,
        ids: &mut HashSet<&'a str>,
        slots: &mut HashSet<usize>,
    ) -> Result<(), TreeError> {
        if !ids.insert(self.id()) {
            return Err(TreeError::DuplicateId(self.id().to_string()));
        }
        match self {
            LayoutNode::Widget { id, slot_index, .. } => {
                if !slots.insert(*slot_index) {
                    return Err(TreeError::DuplicateSlot {
                        slot: *slot_index,
                        node: id.clone(),
                    });
                }
                Ok(())
            }
            LayoutNode::Group { id, children, .. } => {
                if children.is_empty() {
                    return Err(TreeError::EmptyGroup(id.clone()));
                }
                children
                    .iter()
                    .try_for_each(|c| c.validate_into(ids, slots))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn nested() -> LayoutNode {
        LayoutNode::group(
            "root",
            Direction::Horizontal,
            None,
            vec![
                LayoutNode::group(
                    "left",
                    Direction::Vertical,
                    Some(60.0),
                    vec![
                        LayoutNode::widget("a", 0, Some(50.0)),
                        LayoutNode::widget("b", 1, Some(50.0)),
                    ],
                ),
                LayoutNode::widget("c", 2, Some(40.0)),
            ],
        )
    }

    #[test]
    fn leaf_count_and_slot_order() {
        let tree = nested();
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.slot_indices(), vec![0, 1, 2]);
        assert_eq!(tree.slot_span(), 3);
    }

    #[test]
    fn merge_touches_only_target_children() {
        let tree = nested();
        let sizes = SizeMap::from([("a".to_string(), 25.0)]);
        let merged = tree.with_group_sizes("left", &sizes).expect("group exists");
        let left = &merged.children()[0];
        assert_eq!(left.default_size(), Some(60.0));
        assert_eq!(left.children()[0].default_size(), Some(25.0));
        // absent from the map: keeps existing value
        assert_eq!(left.children()[1].default_size(), Some(50.0));
        assert_eq!(merged.children()[1], tree.children()[1]);
    }

    #[test]
    fn merge_on_root_group() {
        let tree = nested();
        let sizes = SizeMap::from([("left".to_string(), 70.0), ("c".to_string(), 30.0)]);
        let merged = tree.with_group_sizes("root", &sizes).unwrap();
        assert_eq!(merged.children()[0].default_size(), Some(70.0));
        assert_eq!(merged.children()[1].default_size(), Some(30.0));
        // nested subtree untouched
        assert_eq!(merged.children()[0].children(), tree.children()[0].children());
    }

    #[test]
    fn merge_unknown_group_is_none() {
        let tree = nested();
        assert!(tree.with_group_sizes("missing", &SizeMap::new()).is_none());
        // a leaf id is not a group
        assert!(tree.with_group_sizes("a", &SizeMap::new()).is_none());
    }

    #[test]
    fn validate_reports_duplicates() {
        let dup_slot = LayoutNode::group(
            "g",
            Direction::Vertical,
            None,
            vec![LayoutNode::widget("x", 0, None), LayoutNode::widget("y", 0, None)],
        );
        assert_eq!(
            dup_slot.validate(),
            Err(TreeError::DuplicateSlot {
                slot: 0,
                node: "y".into()
            })
        );
        let dup_id = LayoutNode::group(
            "g",
            Direction::Vertical,
            None,
            vec![LayoutNode::widget("x", 0, None), LayoutNode::widget("x", 1, None)],
        );
        assert_eq!(dup_id.validate(), Err(TreeError::DuplicateId("x".into())));
        let empty = LayoutNode::group("g", Direction::Vertical, None, vec![]);
        assert_eq!(empty.validate(), Err(TreeError::EmptyGroup("g".into())));
        assert!(nested().validate().is_ok());
    }

    #[test]
    fn serde_shape_matches_persisted_documents() {
        let json = r#"{
            "id": "sh-root", "type": "group", "direction": "horizontal",
            "widgets": [
                { "id": "h1", "type": "widget", "slotIndex": 0, "defaultSize": 50 },
                { "id": "h2", "type": "widget", "slotIndex": 1, "defaultSize": 50 }
            ]
        }"#;
        let node: LayoutNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.leaf_count(), 2);
        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["children"][1]["slotIndex"], 1);
        assert!(out.get("defaultSize").is_none());
    }
}
