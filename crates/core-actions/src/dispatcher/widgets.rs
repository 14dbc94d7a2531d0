//! Focus, widget assignment and primary task runs.

use super::DispatchResult;
use crate::dashboard::Dashboard;
use core_model::WidgetType;
use tracing::{debug, info};

pub(super) fn focus_slot(slot_index: usize, dash: &mut Dashboard) -> DispatchResult {
    let before = dash.focused_slot();
    if !dash.focus_slot(slot_index) {
        return DispatchResult::clean();
    }
    DispatchResult::panes([before, slot_index])
}

pub(super) fn focus_step(dash: &mut Dashboard, forward: bool) -> DispatchResult {
    let before = dash.focused_slot();
    let after = if forward { dash.focus_next() } else { dash.focus_prev() };
    if before == after {
        return DispatchResult::clean();
    }
    DispatchResult::panes([before, after])
}

pub(super) fn cycle(dash: &mut Dashboard) -> DispatchResult {
    let slot = dash.focused_slot();
    let widget = dash.cycle_widget(slot);
    debug!(target: "actions.dispatch", slot, widget = ?widget, "widget_cycled");
    DispatchResult::panes([slot])
}

/// Assignments only target slots the active layout renders.
pub(super) fn assign(slot_index: usize, widget: WidgetType, dash: &mut Dashboard) -> DispatchResult {
    if slot_index >= dash.slot_count() {
        debug!(target: "actions.dispatch", slot_index, slots = dash.slot_count(), "assign_out_of_range");
        return DispatchResult::clean();
    }
    dash.assign_widget(slot_index, Some(widget));
    DispatchResult::panes([slot_index])
}

pub(super) fn clear(dash: &mut Dashboard) -> DispatchResult {
    let slot = dash.focused_slot();
    if dash.store().widget_at(slot).is_none() {
        return DispatchResult::clean();
    }
    dash.clear_widget(slot);
    DispatchResult::panes([slot])
}

pub(super) fn run_primary(dash: &mut Dashboard) -> DispatchResult {
    let Some(params) = dash.primary_run_request() else {
        dash.set_message("no task for this widget");
        return DispatchResult::status();
    };
    info!(
        target: "actions.dispatch",
        kind = params.task_type.as_str(),
        target_id = %params.target_id,
        "task_run_requested"
    );
    dash.set_message(format!("running {} for {}", params.task_type.as_str(), params.target_id));
    DispatchResult {
        run: Some(params),
        ..DispatchResult::status()
    }
}
