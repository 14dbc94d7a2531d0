//! Ready-made dashboards: a layout, the widgets for its slots, and the
//! instrument they should show.

use core_model::{LayoutTemplate, WidgetType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardPreset {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub layout: LayoutTemplate,
    /// Widget per slot index, in slot order.
    pub widgets: &'static [Option<WidgetType>],
    pub target: &'static str,
}

pub const PRESETS: &[DashboardPreset] = &[
    DashboardPreset {
        id: "home",
        title: "Home",
        description: "Overview of global markets, system health, and team activity.",
        layout: LayoutTemplate::Single,
        widgets: &[Some(WidgetType::Home)],
        target: "ALL",
    },
    DashboardPreset {
        id: "risk-monitor",
        title: "Risk & Analytics",
        description: "Deep dive into fund pricing and risk factors side-by-side.",
        layout: LayoutTemplate::SplitV,
        widgets: &[Some(WidgetType::Analytics), Some(WidgetType::Logs)],
        target: "AAPL",
    },
    DashboardPreset {
        id: "month-view",
        title: "Event Calendar",
        description: "Month view of upcoming events.",
        layout: LayoutTemplate::Single,
        widgets: &[Some(WidgetType::Calendar)],
        target: "ALL",
    },
    DashboardPreset {
        id: "compliance",
        title: "Compliance Dashboard",
        description: "Monitor guideline violations and upcoming corporate events.",
        layout: LayoutTemplate::SplitH,
        widgets: &[Some(WidgetType::Logs), Some(WidgetType::Calendar)],
        target: "ALL",
    },
];

pub fn preset(id: &str) -> Option<&'static DashboardPreset> {
    PRESETS.iter().find(|p| p.id == id)
}
