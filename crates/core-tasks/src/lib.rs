//! Contract with the external task/snapshot backend.
//!
//! The dashboard never runs data jobs itself. It polls a backend for the
//! status of long-running refresh tasks, asks it to start new ones, and reads
//! versioned snapshots the tasks produce. This crate holds only the wire
//! types, the [`TaskBackend`] trait, and the small amount of client-side
//! interpretation the slot chrome needs (which status is relevant to a
//! widget, and when a status flips to done/failed).

use chrono::{DateTime, NaiveDateTime};
use core_model::{PrimaryTask, WidgetType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use core_model::TaskKind;

/// Target id meaning "every instrument".
pub const ALL_TARGETS: &str = "ALL";

/// Snapshot version alias for the newest artifact.
pub const LATEST_VERSION: &str = "latest";

/// Snapshot data families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Prices,
    CalendarEvents,
    Guidelines,
}

impl DataKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            DataKind::Prices => "prices",
            DataKind::CalendarEvents => "calendar_events",
            DataKind::Guidelines => "guidelines",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParams {
    pub target_id: String,
    pub task_type: TaskKind,
    #[serde(default)]
    pub extra_params: serde_json::Map<String, serde_json::Value>,
}

impl TaskParams {
    pub fn new(target_id: impl Into<String>, task_type: TaskKind) -> Self {
        Self {
            target_id: target_id.into(),
            task_type,
            extra_params: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub status: TaskState,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    /// ISO-8601 timestamp, with or without offset.
    pub last_heartbeat: String,
    pub params: TaskParams,
}

impl TaskStatus {
    /// Parsed heartbeat in UTC; `None` when the backend sent something
    /// unparseable.
    pub fn heartbeat(&self) -> Option<NaiveDateTime> {
        DateTime::parse_from_rfc3339(&self.last_heartbeat)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(&self.last_heartbeat, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no task backend configured")]
    Unavailable,
    #[error("backend request failed: {0}")]
    Request(String),
    #[error("malformed backend payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Operations the dashboard consumes from the job service. Implementations
/// may block; callers run them off the UI loop.
pub trait TaskBackend: Send + Sync + 'static {
    /// Status of every in-flight or completed task.
    fn statuses(&self) -> Result<Vec<TaskStatus>, BackendError>;
    /// Content of one snapshot (`version` may be [`LATEST_VERSION`]).
    fn snapshot(
        &self,
        target: &str,
        data: DataKind,
        version: &str,
    ) -> Result<serde_json::Value, BackendError>;
    /// Available snapshot versions, newest first.
    fn snapshot_versions(&self, target: &str, data: DataKind) -> Result<Vec<String>, BackendError>;
    /// Submit a run request; returns the new task id.
    fn run(&self, params: &TaskParams) -> Result<String, BackendError>;
}

/// Backend used when none is configured: no tasks, no snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl TaskBackend for NullBackend {
    fn statuses(&self) -> Result<Vec<TaskStatus>, BackendError> {
        Ok(Vec::new())
    }

    fn snapshot(&self, _: &str, _: DataKind, _: &str) -> Result<serde_json::Value, BackendError> {
        Err(BackendError::Unavailable)
    }

    fn snapshot_versions(&self, _: &str, _: DataKind) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    fn run(&self, _: &TaskParams) -> Result<String, BackendError> {
        Err(BackendError::Unavailable)
    }
}

/// The status a widget showing `target` should reflect for `kind`.
///
/// A running task of that kind wins when it targets `target` or every
/// instrument. Otherwise the newest status for exactly `target` is used.
pub fn relevant_status<'a>(
    statuses: &'a [TaskStatus],
    target: &str,
    kind: TaskKind,
) -> Option<&'a TaskStatus> {
    let running = statuses.iter().find(|s| {
        s.params.task_type == kind
            && s.status == TaskState::Running
            && (s.params.target_id == target || s.params.target_id == ALL_TARGETS)
    });
    if running.is_some() {
        return running;
    }
    statuses
        .iter()
        .filter(|s| s.params.target_id == target && s.params.task_type == kind)
        .max_by_key(|s| s.heartbeat())
}

/// Whether the slot holding `widget` should show its "updating" badge.
pub fn slot_is_updating(widget: WidgetType, statuses: &[TaskStatus], target: &str) -> bool {
    match widget.primary_task() {
        PrimaryTask::Summary => statuses.iter().any(|s| s.status == TaskState::Running),
        PrimaryTask::Task(kind) => relevant_status(statuses, target, kind)
            .is_some_and(|s| s.status == TaskState::Running),
        PrimaryTask::None => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskTransition {
    Completed {
        target: String,
        kind: TaskKind,
    },
    Failed {
        target: String,
        kind: TaskKind,
        message: String,
    },
}

/// Remembers the last observed state per `(target, kind)` and reports
/// transitions into `Done` / `Failed`. The first observation of a key only
/// seeds the memory, so reopening the dashboard does not replay old results.
#[derive(Debug, Default)]
pub struct StatusTracker {
    last: HashMap<(String, TaskKind), TaskState>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, statuses: &[TaskStatus], target: &str, kind: TaskKind) -> Option<TaskTransition> {
        let status = relevant_status(statuses, target, kind)?;
        let key = (target.to_string(), kind);
        let prev = self.last.insert(key, status.status);
        let prev = prev?;
        if prev == status.status {
            return None;
        }
        debug!(target: "tasks.status", target_id = target, kind = kind.as_str(), from = ?prev, to = ?status.status, "task_state_changed");
        match status.status {
            TaskState::Done => {
                info!(target: "tasks.status", target_id = target, kind = kind.as_str(), "task_completed");
                Some(TaskTransition::Completed {
                    target: target.to_string(),
                    kind,
                })
            }
            TaskState::Failed => {
                warn!(target: "tasks.status", target_id = target, kind = kind.as_str(), "task_failed");
                Some(TaskTransition::Failed {
                    target: target.to_string(),
                    kind,
                    message: status.message.clone(),
                })
            }
            TaskState::Pending | TaskState::Running => None,
        }
    }
}
