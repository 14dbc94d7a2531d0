//! Event handling for one dashboard session, independent of the terminal and
//! the channel plumbing so it can be driven directly in tests.

use crate::view::{FrameInputs, View};
use anyhow::Result;
use core_actions::{
    Action, ActionObserver, Dashboard, DispatchResult, PointerController, PointerOutcome, dispatch,
    translate_key,
};
use core_events::{CommandEvent, Event, InputEvent, MouseEvent};
use core_model::{PrimaryTask, TaskKind};
use core_render::{Decision, RenderDelta, ResizeDebouncer};
use core_tasks::{StatusTracker, TaskParams, TaskStatus, TaskTransition};
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum LoopControl {
    Continue {
        /// Task the runtime should hand to the backend.
        run: Option<TaskParams>,
    },
    Break {
        reason: ShutdownReason,
    },
}

impl LoopControl {
    fn idle() -> Self {
        LoopControl::Continue { run: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    CommandQuit,
    ActionQuit,
    ShutdownEvent,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::CommandQuit => "command_quit",
            ShutdownReason::ActionQuit => "action_quit",
            ShutdownReason::ShutdownEvent => "shutdown_event",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts dispatched actions; reported once at shutdown. Clones share the
/// count.
#[derive(Debug, Clone, Default)]
pub struct ActionCounter {
    total: Arc<AtomicU64>,
}

impl ActionCounter {
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl ActionObserver for ActionCounter {
    fn on_action(&self, _action: &Action) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct App {
    dash: Dashboard,
    debouncer: ResizeDebouncer,
    pointer: PointerController,
    view: View,
    statuses: Vec<TaskStatus>,
    tracker: StatusTracker,
    observers: Vec<Box<dyn ActionObserver>>,
}

impl App {
    pub fn new(dash: Dashboard, debouncer: ResizeDebouncer, view: View, min_pane_percent: f64) -> Self {
        Self {
            dash,
            debouncer,
            pointer: PointerController::new(min_pane_percent),
            view,
            statuses: Vec::new(),
            tracker: StatusTracker::new(),
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ActionObserver>) {
        self.observers.push(observer);
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dash
    }

    pub fn debouncer(&self) -> &ResizeDebouncer {
        &self.debouncer
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn handle_event(&mut self, event: &Event, now: Instant) -> LoopControl {
        match event {
            Event::Input(InputEvent::Key(key)) => match translate_key(key) {
                Some(action) => self.apply(action),
                None => LoopControl::idle(),
            },
            Event::Input(InputEvent::CtrlC) => LoopControl::Break {
                reason: ShutdownReason::CtrlC,
            },
            Event::Input(InputEvent::Mouse(mouse)) => self.handle_mouse(mouse, now),
            Event::Input(InputEvent::Resize(w, h)) => {
                self.view.resize(*w, *h);
                LoopControl::idle()
            }
            Event::Command(CommandEvent::Quit) => LoopControl::Break {
                reason: ShutdownReason::CommandQuit,
            },
            Event::TaskStatuses(statuses) => {
                self.handle_statuses(statuses.clone());
                LoopControl::idle()
            }
            Event::Tick => {
                self.handle_tick(now);
                LoopControl::idle()
            }
            Event::RenderRequested => {
                self.view.mark(RenderDelta::Relayout);
                LoopControl::idle()
            }
            Event::Shutdown => LoopControl::Break {
                reason: ShutdownReason::ShutdownEvent,
            },
        }
    }

    pub fn apply(&mut self, action: Action) -> LoopControl {
        // pending writes for the active layout do not survive a reset
        if matches!(action, Action::ResetLayout) {
            self.discard_pending_resizes();
        }
        let DispatchResult { render, quit, run } = dispatch(action, &mut self.dash, &self.observers);
        if quit {
            return LoopControl::Break {
                reason: ShutdownReason::ActionQuit,
            };
        }
        if let Some(delta) = render {
            if delta == RenderDelta::Relayout && self.pointer.cancel() {
                debug!(target: "runtime", "drag_cancelled_by_relayout");
            }
            self.view.mark(delta);
        }
        LoopControl::Continue { run }
    }

    fn discard_pending_resizes(&mut self) {
        if self.pointer.cancel() {
            debug!(target: "runtime", "drag_cancelled_by_reset");
        }
        let layout = self.dash.active_layout().to_string();
        if self.debouncer.discard_layout(&layout) > 0 {
            // the preview no longer carries the dropped sizes
            self.view.mark(RenderDelta::Relayout);
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) -> LoopControl {
        let outcome = self
            .pointer
            .handle(mouse, self.view.layout(), now, &mut self.debouncer);
        match outcome {
            PointerOutcome::Focus(slot) => return self.apply(Action::FocusSlot(slot)),
            PointerOutcome::DragStarted | PointerOutcome::DragEnded => {
                self.view.mark(RenderDelta::Relayout)
            }
            // the preview tree changed; the render key catches the relayout
            PointerOutcome::Dragged => self.view.mark(RenderDelta::StatusLine),
            PointerOutcome::None => {}
        }
        LoopControl::idle()
    }

    fn handle_tick(&mut self, now: Instant) {
        if self.debouncer.poll_expired(now, &mut self.dash) > 0 {
            self.view.mark(RenderDelta::StatusLine);
        }
    }

    fn handle_statuses(&mut self, statuses: Vec<TaskStatus>) {
        let target = self.dash.target().to_string();
        let mut kinds: Vec<TaskKind> = Vec::new();
        let mut panes: BTreeSet<usize> = BTreeSet::new();
        for (slot, widget) in self.dash.store().active_widgets().iter().enumerate() {
            let Some(widget) = widget else { continue };
            panes.insert(slot);
            if let PrimaryTask::Task(kind) = widget.primary_task()
                && !kinds.contains(&kind)
            {
                kinds.push(kind);
            }
        }
        for kind in kinds {
            match self.tracker.observe(&statuses, &target, kind) {
                Some(TaskTransition::Completed { target, kind }) => {
                    self.dash
                        .set_message(format!("{} for {} completed", kind.as_str(), target));
                    self.view.mark(RenderDelta::StatusLine);
                }
                Some(TaskTransition::Failed {
                    target,
                    kind,
                    message,
                }) => {
                    self.dash
                        .set_message(format!("{} for {} failed: {}", kind.as_str(), target, message));
                    self.view.mark(RenderDelta::StatusLine);
                }
                None => {}
            }
        }
        if self.statuses != statuses {
            self.statuses = statuses;
            if !panes.is_empty() {
                self.view.mark(RenderDelta::Panes(panes));
            }
        }
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> Result<Option<Decision>> {
        let inputs = FrameInputs {
            dash: &self.dash,
            debouncer: &self.debouncer,
            pointer: &self.pointer,
            statuses: &self.statuses,
        };
        self.view.render(&inputs, out)
    }

    /// Commit every pending resize and hand back the dashboard.
    pub fn finish(mut self) -> Dashboard {
        let flushed = self.debouncer.flush_all(&mut self.dash);
        let metrics = self.debouncer.metrics();
        info!(
            target: "runtime.shutdown",
            flushed,
            recorded = metrics.recorded,
            superseded = metrics.superseded,
            committed = metrics.committed,
            dropped_stale = metrics.dropped_stale,
            frames = self.view.frames(),
            "session_finished"
        );
        self.dash
    }
}
