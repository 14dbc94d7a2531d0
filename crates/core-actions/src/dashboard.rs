//! The dashboard session: the store, the active layout selection, the query
//! parameters, and the little UI state the keyboard needs (focused slot,
//! preset cursor, ephemeral message).
//!
//! Every mutation of persisted state goes through `LayoutStore`'s named
//! operations from here; nothing else holds a mutable reference to it.

use crate::navigation::Navigator;
use crate::query::QueryParams;
use core_model::{LayoutNode, PrimaryTask, SizeMap, WidgetType};
use core_state::{LayoutStore, LayoutWriter, PRESETS, preset};
use core_tasks::TaskParams;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Dashboard {
    store: LayoutStore,
    nav: Navigator,
    query: QueryParams,
    slot_count: usize,
    focused_slot: usize,
    preset_cursor: Option<usize>,
    message: Option<String>,
}

impl Dashboard {
    /// Pick the initial layout and make the widget array match it before
    /// anything is drawn.
    pub fn open(store: LayoutStore, query: QueryParams, default_layout: &str) -> Self {
        let (nav, _source) = Navigator::initial(&query, &store, default_layout);
        let mut dash = Self {
            store,
            nav,
            query,
            slot_count: 0,
            focused_slot: 0,
            preset_cursor: None,
            message: None,
        };
        // settling mirrors a layout taken from the query into `lastLayoutId`
        dash.activate();
        dash
    }

    pub fn store(&self) -> &LayoutStore {
        &self.store
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn active_layout(&self) -> &str {
        self.nav.active()
    }

    pub fn target(&self) -> &str {
        &self.query.target
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    pub fn focused_slot(&self) -> usize {
        self.focused_slot
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn clear_message(&mut self) -> bool {
        self.message.take().is_some()
    }

    /// Resolved tree for the active layout.
    pub fn active_tree(&self) -> LayoutNode {
        self.store.resolve_active_tree(self.nav.active())
    }

    pub fn is_customized(&self) -> bool {
        self.store.is_customized(self.nav.active())
    }

    /// Switch the active layout. The new tree is resolved and the widget
    /// array resized to its leaf count before this returns.
    pub fn switch_layout(&mut self, name: &str) -> LayoutNode {
        self.nav.select(name, &mut self.query, &mut self.store);
        self.activate()
    }

    fn activate(&mut self) -> LayoutNode {
        let tree = self.active_tree();
        self.slot_count = tree.leaf_count();
        self.store.sync_slot_count(self.slot_count);
        self.nav.settle(&mut self.store);
        if self.focused_slot >= self.slot_count {
            self.focused_slot = 0;
        }
        info!(target: "actions.nav", layout = self.nav.active(), slots = self.slot_count, "layout_active");
        tree
    }

    pub fn assign_widget(&mut self, slot_index: usize, widget: Option<WidgetType>) {
        self.store.assign_widget(slot_index, widget);
    }

    pub fn clear_widget(&mut self, slot_index: usize) {
        self.store.assign_widget(slot_index, None);
    }

    /// Advance the widget at `slot_index` through the picker order (ending
    /// on empty). Returns the new value.
    pub fn cycle_widget(&mut self, slot_index: usize) -> Option<WidgetType> {
        let next = WidgetType::cycle(self.store.widget_at(slot_index));
        self.store.assign_widget(slot_index, next);
        next
    }

    /// Drop the customization for the active layout.
    pub fn reset_active_layout(&mut self) -> bool {
        let name = self.nav.active().to_string();
        self.store.reset_layout(&name)
    }

    /// Apply a preset by id: widgets first, then the layout switch (which
    /// syncs the array length), then the target.
    pub fn apply_preset(&mut self, id: &str) -> bool {
        let Some(p) = preset(id) else {
            debug!(target: "actions.dispatch", preset = id, "unknown_preset");
            return false;
        };
        self.store.apply_preset(p);
        self.switch_layout(p.layout.name());
        self.query.target = p.target.to_string();
        self.focused_slot = 0;
        self.message = Some(format!("preset: {}", p.title));
        true
    }

    /// Apply the preset after the last one applied, wrapping around.
    pub fn next_preset(&mut self) -> &'static str {
        let idx = self.preset_cursor.map_or(0, |i| (i + 1) % PRESETS.len());
        self.preset_cursor = Some(idx);
        let id = PRESETS[idx].id;
        self.apply_preset(id);
        id
    }

    pub fn focus_slot(&mut self, slot_index: usize) -> bool {
        if slot_index >= self.slot_count || slot_index == self.focused_slot {
            return false;
        }
        self.focused_slot = slot_index;
        true
    }

    pub fn focus_next(&mut self) -> usize {
        if self.slot_count > 0 {
            self.focused_slot = (self.focused_slot + 1) % self.slot_count;
        }
        self.focused_slot
    }

    pub fn focus_prev(&mut self) -> usize {
        if self.slot_count > 0 {
            self.focused_slot = (self.focused_slot + self.slot_count - 1) % self.slot_count;
        }
        self.focused_slot
    }

    /// Run request for the primary task of the widget in the focused slot.
    pub fn primary_run_request(&self) -> Option<TaskParams> {
        let widget = self.store.widget_at(self.focused_slot)?;
        match widget.primary_task() {
            PrimaryTask::Task(kind) => Some(TaskParams::new(self.query.target.clone(), kind)),
            PrimaryTask::Summary | PrimaryTask::None => None,
        }
    }

    /// Commit debounced sizes for one group.
    pub fn commit_resize(&mut self, layout_name: &str, group_id: &str, sizes: &SizeMap) -> bool {
        self.store.update_group_sizes(layout_name, group_id, sizes)
    }
}

impl LayoutWriter for Dashboard {
    fn update_group_sizes(&mut self, layout_name: &str, group_id: &str, sizes: &SizeMap) -> bool {
        self.commit_resize(layout_name, group_id, sizes)
    }
}
