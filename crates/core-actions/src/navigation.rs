//! Active layout selection.
//!
//! One piece of state, the active layout name, with three transitions:
//! * initial: the query parameter wins; otherwise the persisted
//!   `lastLayoutId` when it is set and differs from the default; otherwise
//!   the default.
//! * select: an explicit user change writes the query parameter and mirrors
//!   the name into `lastLayoutId`.
//! * settle: whenever the active name settles, persist it if the stored
//!   value differs.

use crate::query::QueryParams;
use core_state::LayoutStore;
use tracing::{debug, info};

pub const DEFAULT_LAYOUT: &str = "single";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutSource {
    Query,
    LastUsed,
    Default,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    active: String,
    default_layout: String,
}

impl Navigator {
    pub fn initial(query: &QueryParams, store: &LayoutStore, default_layout: &str) -> (Self, LayoutSource) {
        let (active, source) = match (query.layout.as_deref(), store.last_layout_id()) {
            (Some(name), _) => (name.to_string(), LayoutSource::Query),
            (None, Some(last)) if last != default_layout => (last.to_string(), LayoutSource::LastUsed),
            _ => (default_layout.to_string(), LayoutSource::Default),
        };
        info!(target: "actions.nav", layout = %active, source = ?source, "initial_layout");
        (
            Self {
                active,
                default_layout: default_layout.to_string(),
            },
            source,
        )
    }

    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn default_layout(&self) -> &str {
        &self.default_layout
    }

    /// Explicit user change. The query parameter is authoritative and the
    /// store mirrors it.
    pub fn select(&mut self, name: &str, query: &mut QueryParams, store: &mut LayoutStore) {
        debug!(target: "actions.nav", from = %self.active, to = name, "layout_selected");
        self.active = name.to_string();
        query.layout = Some(name.to_string());
        store.set_last_layout_id(name);
    }

    /// Persist the active name if it differs from `lastLayoutId`. Returns
    /// whether a write happened.
    pub fn settle(&self, store: &mut LayoutStore) -> bool {
        if store.last_layout_id() == Some(self.active.as_str()) {
            return false;
        }
        store.set_last_layout_id(&self.active);
        true
    }
}
