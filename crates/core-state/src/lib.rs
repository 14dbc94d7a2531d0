//! Dashboard layout store: the single mutable owner of customized layout
//! trees, the flat widget-slot array, and the last active layout name.
//!
//! Lifecycle:
//! - Constructed once at startup by [`LayoutStore::hydrate`], which reads the
//!   persisted record from a [`StateStorage`]. Absent or corrupt data yields
//!   the empty state; hydration never fails.
//! - Passed by reference to the renderer and navigation layers. Nothing else
//!   mutates trees or the widget array; every change goes through a named
//!   operation below.
//! - Write-through: each operation that changes state serializes the whole
//!   record and saves it before returning. Save failures are logged under
//!   `state.store` and otherwise ignored so the UI keeps working on a
//!   read-only disk.
//!
//! Tree ownership: `layouts` holds only user customizations. A missing key
//! means "use the template unmodified". Stored trees are replaced wholesale
//! with the output of `LayoutNode::with_group_sizes`; they are never edited
//! in place, so a reference handed out by [`LayoutStore::resolve_active_tree`]
//! can never observe a half-applied write.
//!
//! Total operations: an unknown group id, an unknown layout name, or an
//! out-of-range slot are all defined behavior (no-op, template fallback,
//! growth respectively). Nothing here returns an error to the caller.

mod presets;
mod storage;

pub use presets::{DashboardPreset, PRESETS, preset};
pub use storage::{JsonFileStorage, MemoryStorage, STORAGE_KEY, StateStorage, StorageError};

use core_model::{LayoutNode, SizeMap, WidgetType, resolve_template};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

/// Persist-middleware envelope version written alongside the state.
pub const STATE_VERSION: u32 = 0;

/// The persisted record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub layouts: BTreeMap<String, LayoutNode>,
    #[serde(default)]
    pub active_widgets: Vec<Option<WidgetType>>,
    #[serde(default)]
    pub last_layout_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    state: PersistedState,
    #[serde(default)]
    version: u32,
}

impl PersistedState {
    /// Decode a persisted payload. Accepts the enveloped form and a bare
    /// state object; anything else is treated as empty. Customized trees that
    /// fail validation are dropped individually.
    pub fn decode(payload: &str) -> Self {
        let decoded = serde_json::from_str::<Envelope>(payload)
            .map(|env| env.state)
            .or_else(|_| serde_json::from_str::<PersistedState>(payload));
        let mut state = match decoded {
            Ok(state) => state,
            Err(e) => {
                warn!(target: "state.store", error = %e, "persisted_state_corrupt");
                return Self::default();
            }
        };
        state.layouts.retain(|name, tree| match tree.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "state.store", layout = name.as_str(), error = %e, "persisted_layout_dropped");
                false
            }
        });
        state
    }

    pub fn encode(&self) -> Result<String, StorageError> {
        let env = Envelope {
            state: self.clone(),
            version: STATE_VERSION,
        };
        Ok(serde_json::to_string(&env)?)
    }
}

/// Seam through which debounced resize commits reach the store.
pub trait LayoutWriter {
    /// Merge `sizes` into the children of `group_id` within the active tree
    /// of `layout_name`. Returns whether a write happened.
    fn update_group_sizes(&mut self, layout_name: &str, group_id: &str, sizes: &SizeMap) -> bool;
}

pub struct LayoutStore {
    state: PersistedState,
    storage: Box<dyn StateStorage>,
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("state", &self.state)
            .field("storage", &self.storage.describe())
            .finish()
    }
}

impl LayoutStore {
    /// Read the persisted record from `storage` and build the store.
    pub fn hydrate(storage: Box<dyn StateStorage>) -> Self {
        let state = match storage.load() {
            Ok(Some(payload)) => PersistedState::decode(&payload),
            Ok(None) => PersistedState::default(),
            Err(e) => {
                warn!(target: "state.store", error = %e, "persisted_state_unreadable");
                PersistedState::default()
            }
        };
        info!(
            target: "state.store",
            storage = storage.describe().as_str(),
            customized = state.layouts.len(),
            slots = state.active_widgets.len(),
            last_layout = state.last_layout_id.as_deref(),
            "store_hydrated"
        );
        Self { state, storage }
    }

    /// Empty store backed by throwaway memory storage.
    pub fn in_memory() -> Self {
        Self::hydrate(Box::new(MemoryStorage::new()))
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn layouts(&self) -> &BTreeMap<String, LayoutNode> {
        &self.state.layouts
    }

    pub fn is_customized(&self, layout_name: &str) -> bool {
        self.state.layouts.contains_key(layout_name)
    }

    pub fn active_widgets(&self) -> &[Option<WidgetType>] {
        &self.state.active_widgets
    }

    pub fn widget_at(&self, slot_index: usize) -> Option<WidgetType> {
        self.state.active_widgets.get(slot_index).copied().flatten()
    }

    pub fn last_layout_id(&self) -> Option<&str> {
        self.state.last_layout_id.as_deref()
    }

    /// The tree to render for `layout_name`: the customization if present,
    /// else the template (which itself falls back to `single`).
    pub fn resolve_active_tree(&self, layout_name: &str) -> LayoutNode {
        self.state
            .layouts
            .get(layout_name)
            .cloned()
            .unwrap_or_else(|| resolve_template(layout_name))
    }

    /// Copy-on-first-write merge of new child sizes into one group. Stale
    /// group ids are dropped silently; no entry is created for them.
    pub fn update_group_sizes(
        &mut self,
        layout_name: &str,
        group_id: &str,
        sizes: &SizeMap,
    ) -> bool {
        let merged = match self.state.layouts.get(layout_name) {
            Some(tree) => tree.with_group_sizes(group_id, sizes),
            None => resolve_template(layout_name).with_group_sizes(group_id, sizes),
        };
        let Some(merged) = merged else {
            debug!(target: "state.store", layout = layout_name, group = group_id, "group_sizes_stale_group");
            return false;
        };
        if self.state.layouts.get(layout_name) == Some(&merged) {
            trace!(target: "state.store", layout = layout_name, group = group_id, "group_sizes_unchanged");
            return true;
        }
        self.state.layouts.insert(layout_name.to_string(), merged);
        debug!(target: "state.store", layout = layout_name, group = group_id, children = sizes.len(), "group_sizes_updated");
        self.commit();
        true
    }

    /// Discard the customization for `layout_name`. Returns whether one
    /// existed.
    pub fn reset_layout(&mut self, layout_name: &str) -> bool {
        if self.state.layouts.remove(layout_name).is_none() {
            return false;
        }
        info!(target: "state.store", layout = layout_name, "layout_reset");
        self.commit();
        true
    }

    /// Set or clear the widget at `slot_index`, growing the array with empty
    /// slots first when needed.
    pub fn assign_widget(&mut self, slot_index: usize, widget: Option<WidgetType>) {
        let widgets = &mut self.state.active_widgets;
        if slot_index >= widgets.len() {
            widgets.resize(slot_index + 1, None);
        }
        widgets[slot_index] = widget;
        debug!(target: "state.store", slot = slot_index, widget = ?widget, "widget_assigned");
        self.commit();
    }

    /// Make the widget array exactly `count` long, keeping every existing
    /// value below `min(old_len, count)`.
    pub fn sync_slot_count(&mut self, count: usize) {
        let old = self.state.active_widgets.len();
        if old == count {
            return;
        }
        self.state.active_widgets.resize(count, None);
        debug!(target: "state.store", old, new = count, "slot_count_synced");
        self.commit();
    }

    pub fn set_last_layout_id(&mut self, layout_name: &str) {
        if self.state.last_layout_id.as_deref() == Some(layout_name) {
            return;
        }
        self.state.last_layout_id = Some(layout_name.to_string());
        trace!(target: "state.store", layout = layout_name, "last_layout_saved");
        self.commit();
    }

    /// Replace the widget array with the preset's slot assignments. The
    /// caller switches to the preset layout afterwards, which syncs the
    /// array length.
    pub fn apply_preset(&mut self, preset: &DashboardPreset) {
        self.state.active_widgets = preset.widgets.to_vec();
        info!(target: "state.store", preset = preset.id, layout = preset.layout.name(), "preset_applied");
        self.commit();
    }

    fn commit(&mut self) {
        let result = self
            .state
            .encode()
            .and_then(|payload| self.storage.save(&payload));
        if let Err(e) = result {
            warn!(target: "state.store", storage = self.storage.describe().as_str(), error = %e, "persist_failed");
        }
    }
}

impl LayoutWriter for LayoutStore {
    fn update_group_sizes(&mut self, layout_name: &str, group_id: &str, sizes: &SizeMap) -> bool {
        LayoutStore::update_group_sizes(self, layout_name, group_id, sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::LayoutTemplate;
    use pretty_assertions::assert_eq;

    fn sizes(pairs: &[(&str, f64)]) -> SizeMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn empty_store_resolves_templates() {
        let store = LayoutStore::in_memory();
        assert_eq!(store.resolve_active_tree("grid-4"), LayoutTemplate::Grid4.tree());
        assert_eq!(store.resolve_active_tree("bogus"), LayoutTemplate::Single.tree());
        assert!(store.active_widgets().is_empty());
        assert_eq!(store.last_layout_id(), None);
    }

    #[test]
    fn grid_scenario_assign_then_shrink() {
        let mut store = LayoutStore::in_memory();
        let tree = store.resolve_active_tree("grid-4");
        assert_eq!(tree.slot_indices(), vec![0, 1, 2, 3]);
        store.sync_slot_count(tree.leaf_count());
        assert_eq!(store.active_widgets(), &[None, None, None, None]);
        store.assign_widget(2, Some(WidgetType::Analytics));
        assert_eq!(
            store.active_widgets(),
            &[None, None, Some(WidgetType::Analytics), None]
        );

        let single = store.resolve_active_tree("single");
        assert_eq!(single.slot_indices(), vec![0]);
        store.sync_slot_count(single.leaf_count());
        assert_eq!(store.active_widgets(), &[None]);
    }

    #[test]
    fn nested_group_update_leaves_rest_at_defaults() {
        let mut store = LayoutStore::in_memory();
        assert!(store.update_group_sizes(
            "grid-4",
            "g4-left-group",
            &sizes(&[("g4-0", 30.0), ("g4-1", 70.0)])
        ));
        let tree = store.resolve_active_tree("grid-4");
        let template = LayoutTemplate::Grid4.tree();
        let left = &tree.children()[0];
        assert_eq!(left.children()[0].default_size(), Some(30.0));
        assert_eq!(left.children()[1].default_size(), Some(70.0));
        assert_eq!(tree.children()[1], template.children()[1]);
        assert_eq!(left.default_size(), template.children()[0].default_size());
        assert_eq!(tree.default_size(), template.default_size());
    }

    #[test]
    fn stale_group_is_a_silent_no_op() {
        let storage = MemoryStorage::new();
        let mut store = LayoutStore::hydrate(Box::new(storage.clone()));
        assert!(!store.update_group_sizes("grid-4", "nonexistent-id", &sizes(&[("g4-0", 10.0)])));
        assert!(!store.is_customized("grid-4"));
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn update_is_idempotent() {
        let mut store = LayoutStore::in_memory();
        let s = sizes(&[("h1", 20.0), ("h2", 80.0)]);
        store.update_group_sizes("split-h", "sh-root", &s);
        let once = store.resolve_active_tree("split-h");
        store.update_group_sizes("split-h", "sh-root", &s);
        assert_eq!(store.resolve_active_tree("split-h"), once);
    }

    #[test]
    fn update_does_not_touch_other_layouts() {
        let mut store = LayoutStore::in_memory();
        store.update_group_sizes("split-v", "sv-root", &sizes(&[("v1", 40.0)]));
        let before = store.resolve_active_tree("split-v");
        store.update_group_sizes("split-h", "sh-root", &sizes(&[("h1", 10.0)]));
        assert_eq!(store.resolve_active_tree("split-v"), before);
    }

    #[test]
    fn reset_reverts_to_template() {
        let mut store = LayoutStore::in_memory();
        store.update_group_sizes("t-shape", "t-bottom-group", &sizes(&[("t-b1", 15.0)]));
        assert!(store.is_customized("t-shape"));
        assert!(store.reset_layout("t-shape"));
        assert_eq!(store.resolve_active_tree("t-shape"), LayoutTemplate::TShape.tree());
        assert!(!store.reset_layout("t-shape"));
    }

    #[test]
    fn assign_grows_with_empty_gaps() {
        let mut store = LayoutStore::in_memory();
        store.assign_widget(3, Some(WidgetType::Calendar));
        assert_eq!(
            store.active_widgets(),
            &[None, None, None, Some(WidgetType::Calendar)]
        );
        store.assign_widget(3, None);
        assert_eq!(store.widget_at(3), None);
    }

    #[test]
    fn mutations_write_through_and_rehydrate() {
        let storage = MemoryStorage::new();
        {
            let mut store = LayoutStore::hydrate(Box::new(storage.clone()));
            store.sync_slot_count(2);
            store.assign_widget(1, Some(WidgetType::Logs));
            store.set_last_layout_id("split-h");
            store.update_group_sizes("split-h", "sh-root", &sizes(&[("h1", 35.0), ("h2", 65.0)]));
        }
        let payload = storage.payload().expect("written");
        assert!(payload.contains("\"activeWidgets\""));
        assert!(payload.contains("\"version\":0"));

        let store = LayoutStore::hydrate(Box::new(storage));
        assert_eq!(store.active_widgets(), &[None, Some(WidgetType::Logs)]);
        assert_eq!(store.last_layout_id(), Some("split-h"));
        assert_eq!(
            store.resolve_active_tree("split-h").children()[0].default_size(),
            Some(35.0)
        );
    }

    #[test]
    fn corrupt_payload_hydrates_empty() {
        let store = LayoutStore::hydrate(Box::new(MemoryStorage::with_payload("{not json")));
        assert_eq!(store.state(), &PersistedState::default());
    }

    #[test]
    fn bare_state_payload_is_accepted() {
        let payload = r#"{"layouts":{},"activeWidgets":["home",null],"lastLayoutId":"split-v"}"#;
        let store = LayoutStore::hydrate(Box::new(MemoryStorage::with_payload(payload)));
        assert_eq!(store.active_widgets(), &[Some(WidgetType::Home), None]);
        assert_eq!(store.last_layout_id(), Some("split-v"));
    }

    #[test]
    fn invalid_persisted_tree_is_dropped() {
        let payload = r#"{"state":{"layouts":{"split-h":{"id":"r","type":"group","direction":"horizontal","children":[
            {"id":"a","type":"widget","slotIndex":0},{"id":"b","type":"widget","slotIndex":0}]}}},"version":0}"#;
        let store = LayoutStore::hydrate(Box::new(MemoryStorage::with_payload(payload)));
        assert!(!store.is_customized("split-h"));
    }

    #[test]
    fn last_layout_write_skipped_when_unchanged() {
        let storage = MemoryStorage::new();
        let mut store = LayoutStore::hydrate(Box::new(storage.clone()));
        store.set_last_layout_id("grid-4");
        store.set_last_layout_id("grid-4");
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn preset_replaces_widgets() {
        let mut store = LayoutStore::in_memory();
        store.sync_slot_count(4);
        store.assign_widget(3, Some(WidgetType::Home));
        let p = preset("risk-monitor").unwrap();
        store.apply_preset(p);
        assert_eq!(
            store.active_widgets(),
            &[Some(WidgetType::Analytics), Some(WidgetType::Logs)]
        );
    }
}
