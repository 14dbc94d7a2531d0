//! Render state for one terminal: viewport, the last layout pass, its render
//! key, and the scheduler collecting deltas between frames.

use anyhow::Result;
use core_actions::{Dashboard, PointerController};
use core_model::{LayoutTemplate, Rect};
use core_render::paint::{PaintContext, paint};
use core_render::status::StatusContext;
use core_render::writer::emit;
use core_render::{
    Decision, LayoutFrame, RenderDelta, RenderKey, RenderScheduler, ResizeDebouncer, render_layout,
};
use core_tasks::TaskStatus;
use std::io::Write;
use tracing::{debug, trace};

/// Everything a frame reads besides the view itself.
pub struct FrameInputs<'a> {
    pub dash: &'a Dashboard,
    pub debouncer: &'a ResizeDebouncer,
    pub pointer: &'a PointerController,
    pub statuses: &'a [TaskStatus],
}

pub struct View {
    width: u16,
    height: u16,
    min_pane_percent: f64,
    layout: LayoutFrame,
    key: Option<RenderKey>,
    scheduler: RenderScheduler,
    frames: u64,
}

impl View {
    pub fn new(width: u16, height: u16, min_pane_percent: f64) -> Self {
        let mut scheduler = RenderScheduler::new();
        scheduler.mark(RenderDelta::Relayout);
        Self {
            width,
            height,
            min_pane_percent,
            layout: LayoutFrame::new(),
            key: None,
            scheduler,
            frames: 0,
        }
    }

    pub fn layout(&self) -> &LayoutFrame {
        &self.layout
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn mark(&mut self, delta: RenderDelta) {
        self.scheduler.mark(delta);
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        debug!(target: "render.view", width, height, "viewport_resized");
        self.width = width;
        self.height = height;
        self.key = None;
        self.scheduler.mark(RenderDelta::Relayout);
    }

    /// Re-run the layout pass if the render key or viewport changed. Pending
    /// drag sizes are overlaid here, so the frame follows the pointer while
    /// the store still holds the committed tree.
    pub fn refresh_layout(&mut self, inputs: &FrameInputs<'_>) -> bool {
        let name = inputs.dash.active_layout();
        let tree = inputs.debouncer.preview(name, &inputs.dash.active_tree());
        let key = RenderKey::of(name, &tree);
        if self.key.as_ref() == Some(&key) {
            return false;
        }
        self.layout.clear();
        let area = Rect::viewport(self.width, self.height.saturating_sub(1));
        render_layout(&tree, name, area, self.min_pane_percent, &mut self.layout);
        trace!(target: "render.view", layout = name, panes = self.layout.panes.len(), "relayout");
        self.key = Some(key);
        self.scheduler.mark(RenderDelta::Relayout);
        true
    }

    /// Paint and emit whatever is pending. Returns the decision that was
    /// applied, or `None` when nothing was marked.
    pub fn render<W: Write>(&mut self, inputs: &FrameInputs<'_>, out: &mut W) -> Result<Option<Decision>> {
        if !self.scheduler.has_pending() {
            return Ok(None);
        }
        self.refresh_layout(inputs);
        let Some(decision) = self.scheduler.consume(self.layout.panes.len()) else {
            return Ok(None);
        };

        let dash = inputs.dash;
        let name = dash.active_layout();
        let label = LayoutTemplate::from_name(name)
            .unwrap_or(LayoutTemplate::Single)
            .label();
        let pinned = dash.query().pinned_versions();
        let ctx = PaintContext {
            widgets: dash.store().active_widgets(),
            statuses: inputs.statuses,
            target: dash.target(),
            focused_slot: Some(dash.focused_slot()),
            active_handle: inputs.pointer.active_handle(),
            status: StatusContext {
                layout_label: label,
                layout_name: name,
                customized: dash.is_customized(),
                target: dash.target(),
                pinned: pinned.as_deref(),
                message: dash.message(),
                resize_pending: inputs.debouncer.is_pending(),
            },
        };
        let frame = paint(&self.layout, &ctx, self.width, self.height);
        let rows = emit(&frame, &self.layout, &decision.effective, out)?;
        self.frames += 1;
        trace!(
            target: "render.view",
            semantic = ?decision.semantic,
            effective = ?decision.effective,
            rows,
            "frame_emitted"
        );
        Ok(Some(decision))
    }
}
