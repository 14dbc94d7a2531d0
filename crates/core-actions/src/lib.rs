//! Dashboard actions: translation from input to `Action`, and the dispatcher
//! that applies them to the `Dashboard` session.
//!
//! Key presses go through `translate_key`; pointer events are stateful
//! (a drag spans many events) and go through `pointer::PointerController`,
//! which talks to the resize debouncer directly instead of producing
//! actions.

use core_model::{LayoutTemplate, WidgetType};

pub mod dashboard;
pub mod dispatcher;
pub mod key_translator;
pub mod navigation;
pub mod pointer;
pub mod query;

pub use dashboard::Dashboard;
pub use dispatcher::{DispatchResult, dispatch};
pub use key_translator::translate_key;
pub use navigation::{DEFAULT_LAYOUT, LayoutSource, Navigator};
pub use pointer::{PointerController, PointerOutcome};
pub use query::QueryParams;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SwitchLayout(LayoutTemplate),
    /// Cycle to the template after the active one.
    NextLayout,
    FocusSlot(usize),
    FocusNext,
    FocusPrev,
    /// Step the focused slot's widget through the picker order.
    CycleWidget,
    AssignWidget {
        slot_index: usize,
        widget: WidgetType,
    },
    ClearWidget,
    ResetLayout,
    ApplyPreset(&'static str),
    NextPreset,
    RunPrimaryTask,
    Quit,
}

/// Observer notified before each action is applied.
pub trait ActionObserver: Send + Sync {
    fn on_action(&self, action: &Action);
}
