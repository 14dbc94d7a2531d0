//! Layout switching, reset and presets.

use super::DispatchResult;
use crate::dashboard::Dashboard;
use core_model::LayoutTemplate;
use tracing::info;

pub(super) fn switch_to(name: &str, dash: &mut Dashboard) -> DispatchResult {
    if dash.active_layout() == name {
        return DispatchResult::clean();
    }
    dash.switch_layout(name);
    DispatchResult::relayout()
}

/// Unknown active names (a stale link) restart the cycle from the first
/// template.
pub(super) fn next_layout(dash: &mut Dashboard) -> DispatchResult {
    let next = LayoutTemplate::from_name(dash.active_layout())
        .map_or(LayoutTemplate::ALL[0], LayoutTemplate::next);
    switch_to(next.name(), dash)
}

pub(super) fn reset(dash: &mut Dashboard) -> DispatchResult {
    if !dash.reset_active_layout() {
        return DispatchResult::clean();
    }
    info!(target: "actions.dispatch", layout = dash.active_layout(), "layout_reset");
    dash.set_message("layout reset");
    DispatchResult::relayout()
}

pub(super) fn apply_preset(id: &str, dash: &mut Dashboard) -> DispatchResult {
    if dash.apply_preset(id) {
        DispatchResult::relayout()
    } else {
        DispatchResult::clean()
    }
}

pub(super) fn next_preset(dash: &mut Dashboard) -> DispatchResult {
    let id = dash.next_preset();
    info!(target: "actions.dispatch", preset = id, "preset_applied");
    DispatchResult::relayout()
}
