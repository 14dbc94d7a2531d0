//! Built-in starter layouts.
//!
//! The registry is closed: [`LayoutTemplate`] enumerates every shipped shape
//! so lookups are exhaustive at compile time. Names used by the query
//! parameter and the persisted store map onto variants through
//! [`LayoutTemplate::from_name`]; unknown names fall back to `single`.
//!
//! ```text
//! single        split-h       split-v       t-shape
//! [ 0 ]         [ 0 | 1 ]     [ 0 ]         [   0   ]
//!                             [ 1 ]         [ 1 | 2 ]
//!
//! inv-t-shape   left-split    right-split   grid-4
//! [ 0 | 1 ]     [ 0 ] |       | [ 1 ]       [ 0 | 2 ]
//! [   2   ]     [ 1 ] | 2   0 | [ 2 ]       [ 1 | 3 ]
//! ```

use crate::node::{Direction, LayoutNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutTemplate {
    Single,
    SplitH,
    SplitV,
    TShape,
    InvTShape,
    LeftSplit,
    RightSplit,
    Grid4,
}

impl LayoutTemplate {
    /// Every template, in picker order.
    pub const ALL: [LayoutTemplate; 8] = [
        LayoutTemplate::Single,
        LayoutTemplate::SplitH,
        LayoutTemplate::SplitV,
        LayoutTemplate::TShape,
        LayoutTemplate::InvTShape,
        LayoutTemplate::LeftSplit,
        LayoutTemplate::RightSplit,
        LayoutTemplate::Grid4,
    ];

    /// Layout name used in query strings and persisted state.
    pub const fn name(self) -> &'static str {
        match self {
            LayoutTemplate::Single => "single",
            LayoutTemplate::SplitH => "split-h",
            LayoutTemplate::SplitV => "split-v",
            LayoutTemplate::TShape => "t-shape",
            LayoutTemplate::InvTShape => "inv-t-shape",
            LayoutTemplate::LeftSplit => "left-split",
            LayoutTemplate::RightSplit => "right-split",
            LayoutTemplate::Grid4 => "grid-4",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            LayoutTemplate::Single => "Single",
            LayoutTemplate::SplitH => "2 Columns (H)",
            LayoutTemplate::SplitV => "2 Rows (V)",
            LayoutTemplate::TShape => "Top Focus (3)",
            LayoutTemplate::InvTShape => "Bottom Focus (3)",
            LayoutTemplate::LeftSplit => "Left Focus (3)",
            LayoutTemplate::RightSplit => "Right Focus (3)",
            LayoutTemplate::Grid4 => "4 Grid",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// The template that follows `self` in picker order, wrapping around.
    pub fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Build a fresh copy of the template tree.
    pub fn tree(self) -> LayoutNode {
        use Direction::{Horizontal, Vertical};
        let w = |id: &str, slot: usize| LayoutNode::widget(id, slot, Some(50.0));
        let g = |id: &str, dir: Direction, size: Option<f64>, children: Vec<LayoutNode>| {
            LayoutNode::group(id, dir, size, children)
        };
        match self {
            LayoutTemplate::Single => LayoutNode::widget("s-root", 0, None),
            LayoutTemplate::SplitH => g("sh-root", Horizontal, None, vec![w("h1", 0), w("h2", 1)]),
            LayoutTemplate::SplitV => g("sv-root", Vertical, None, vec![w("v1", 0), w("v2", 1)]),
            LayoutTemplate::TShape => g(
                "t-root",
                Vertical,
                None,
                vec![
                    w("t-top", 0),
                    g(
                        "t-bottom-group",
                        Horizontal,
                        Some(50.0),
                        vec![w("t-b1", 1), w("t-b2", 2)],
                    ),
                ],
            ),
            LayoutTemplate::InvTShape => g(
                "it-root",
                Vertical,
                None,
                vec![
                    g(
                        "it-top-group",
                        Horizontal,
                        Some(50.0),
                        vec![w("it-t1", 0), w("it-t2", 1)],
                    ),
                    w("it-bottom", 2),
                ],
            ),
            LayoutTemplate::LeftSplit => g(
                "ls-root",
                Horizontal,
                None,
                vec![
                    g(
                        "ls-left-group",
                        Vertical,
                        Some(50.0),
                        vec![w("ls-l1", 0), w("ls-l2", 1)],
                    ),
                    w("ls-right", 2),
                ],
            ),
            LayoutTemplate::RightSplit => g(
                "rs-root",
                Horizontal,
                None,
                vec![
                    w("rs-left", 0),
                    g(
                        "rs-right-group",
                        Vertical,
                        Some(50.0),
                        vec![w("rs-r1", 1), w("rs-r2", 2)],
                    ),
                ],
            ),
            LayoutTemplate::Grid4 => g(
                "g4-root",
                Horizontal,
                None,
                vec![
                    g(
                        "g4-left-group",
                        Vertical,
                        Some(50.0),
                        vec![w("g4-0", 0), w("g4-1", 1)],
                    ),
                    g(
                        "g4-right-group",
                        Vertical,
                        Some(50.0),
                        vec![w("g4-2", 2), w("g4-3", 3)],
                    ),
                ],
            ),
        }
    }
}

/// Total lookup: the named template, or `single` for any unknown name.
pub fn resolve_template(name: &str) -> LayoutNode {
    LayoutTemplate::from_name(name)
        .unwrap_or(LayoutTemplate::Single)
        .tree()
}
