//! Dispatcher applying `Action` to the dashboard session.
//!
//! Sub-modules:
//! * `layout`  - layout switching, reset, presets
//! * `widgets` - focus, widget assignment, primary task runs
//!
//! Each handler reports what needs repainting as a `RenderDelta` so the
//! runtime can feed it straight into the render scheduler.

use crate::dashboard::Dashboard;
use crate::{Action, ActionObserver};
use core_render::RenderDelta;
use core_tasks::TaskParams;
use std::collections::BTreeSet;
use tracing::trace;

mod layout;
mod widgets;

/// Result of dispatching a single `Action`.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub render: Option<RenderDelta>,
    pub quit: bool,
    /// Task the runtime should hand to the backend.
    pub run: Option<TaskParams>,
}

impl DispatchResult {
    pub fn clean() -> Self {
        Self {
            render: None,
            quit: false,
            run: None,
        }
    }

    pub fn relayout() -> Self {
        Self::render(RenderDelta::Relayout)
    }

    pub fn status() -> Self {
        Self::render(RenderDelta::StatusLine)
    }

    pub fn panes(slots: impl IntoIterator<Item = usize>) -> Self {
        let set: BTreeSet<usize> = slots.into_iter().collect();
        if set.is_empty() {
            return Self::clean();
        }
        Self::render(RenderDelta::Panes(set))
    }

    pub fn quit() -> Self {
        Self {
            render: None,
            quit: true,
            run: None,
        }
    }

    fn render(delta: RenderDelta) -> Self {
        Self {
            render: Some(delta),
            quit: false,
            run: None,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.render.is_some()
    }
}

/// Apply an action to the dashboard.
pub fn dispatch(
    action: Action,
    dash: &mut Dashboard,
    observers: &[Box<dyn ActionObserver>],
) -> DispatchResult {
    for obs in observers {
        obs.on_action(&action);
    }
    trace!(target: "actions.dispatch", ?action, "dispatch");

    match action {
        Action::SwitchLayout(template) => layout::switch_to(template.name(), dash),
        Action::NextLayout => layout::next_layout(dash),
        Action::ResetLayout => layout::reset(dash),
        Action::ApplyPreset(id) => layout::apply_preset(id, dash),
        Action::NextPreset => layout::next_preset(dash),
        Action::FocusSlot(slot) => widgets::focus_slot(slot, dash),
        Action::FocusNext => widgets::focus_step(dash, true),
        Action::FocusPrev => widgets::focus_step(dash, false),
        Action::CycleWidget => widgets::cycle(dash),
        Action::AssignWidget { slot_index, widget } => widgets::assign(slot_index, widget, dash),
        Action::ClearWidget => widgets::clear(dash),
        Action::RunPrimaryTask => widgets::run_primary(dash),
        Action::Quit => DispatchResult::quit(),
    }
}
