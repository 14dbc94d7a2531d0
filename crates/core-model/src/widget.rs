//! Widget registry: the closed set of widget kinds a slot can hold and the
//! metadata the slot chrome needs (label, which backend task refreshes it).
//! Widget bodies themselves are opaque renderers outside this workspace.

use serde::{Deserialize, Serialize};

/// Backend job families whose status a widget may reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Pricing,
    Event,
    Guideline,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] = [TaskKind::Pricing, TaskKind::Event, TaskKind::Guideline];

    pub const fn as_str(self) -> &'static str {
        match self {
            TaskKind::Pricing => "pricing",
            TaskKind::Event => "event",
            TaskKind::Guideline => "guideline",
        }
    }
}

/// Which task drives a widget's "updating" badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryTask {
    /// Reflects any running task.
    Summary,
    Task(TaskKind),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetType {
    Home,
    Analytics,
    #[serde(alias = "userList")]
    Calendar,
    Logs,
    Settings,
}

impl WidgetType {
    pub const ALL: [WidgetType; 5] = [
        WidgetType::Home,
        WidgetType::Analytics,
        WidgetType::Calendar,
        WidgetType::Logs,
        WidgetType::Settings,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            WidgetType::Home => "Home",
            WidgetType::Analytics => "Analytics",
            WidgetType::Calendar => "Calendar",
            WidgetType::Logs => "Validation",
            WidgetType::Settings => "Settings",
        }
    }

    pub const fn primary_task(self) -> PrimaryTask {
        match self {
            WidgetType::Home => PrimaryTask::Summary,
            WidgetType::Analytics => PrimaryTask::Task(TaskKind::Pricing),
            WidgetType::Calendar => PrimaryTask::Task(TaskKind::Event),
            WidgetType::Logs => PrimaryTask::Task(TaskKind::Guideline),
            WidgetType::Settings => PrimaryTask::None,
        }
    }

    /// Whether the slot dims its content while the primary task runs. The
    /// home overview stays readable during refreshes.
    pub const fn dims_on_update(self) -> bool {
        !matches!(self, WidgetType::Home)
    }

    /// Picker cycling order: empty -> first kind -> ... -> last kind -> empty.
    pub fn cycle(current: Option<WidgetType>) -> Option<WidgetType> {
        match current {
            None => Some(Self::ALL[0]),
            Some(w) => {
                let pos = Self::ALL.iter().position(|x| *x == w).unwrap_or(0);
                Self::ALL.get(pos + 1).copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_visits_every_kind_then_empties() {
        let mut seen = Vec::new();
        let mut cur = WidgetType::cycle(None);
        while let Some(w) = cur {
            seen.push(w);
            cur = WidgetType::cycle(Some(w));
        }
        assert_eq!(seen, WidgetType::ALL.to_vec());
    }

    #[test]
    fn legacy_user_list_name_maps_to_calendar() {
        let w: WidgetType = serde_json::from_str("\"userList\"").unwrap();
        assert_eq!(w, WidgetType::Calendar);
        assert_eq!(serde_json::to_string(&w).unwrap(), "\"calendar\"");
    }

    #[test]
    fn primary_tasks() {
        assert_eq!(WidgetType::Home.primary_task(), PrimaryTask::Summary);
        assert_eq!(
            WidgetType::Analytics.primary_task(),
            PrimaryTask::Task(TaskKind::Pricing)
        );
        assert!(!WidgetType::Home.dims_on_update());
    }
}
