//! Status line composition.
//!
//! Format: `<Label> [name][*] | target <id> | pinned <versions> | <message>`
//! followed by the key hints when there is room. `*` marks a layout whose
//! sizes differ from its template; the pinned segment appears only when a
//! snapshot version is pinned away from `latest`. Two stages:
//! `compose_status` yields ordered segments, `format_status` joins them and
//! truncates to the terminal width.

use std::borrow::Cow;

pub struct StatusContext<'a> {
    pub layout_label: &'a str,
    pub layout_name: &'a str,
    pub customized: bool,
    pub target: &'a str,
    /// Snapshot versions pinned by the query, if any.
    pub pinned: Option<&'a str>,
    /// Ephemeral message (task completion, preset applied).
    pub message: Option<&'a str>,
    /// A resize is waiting for its quiet period.
    pub resize_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSegment<'a> {
    Layout(Cow<'a, str>),
    Target(&'a str),
    Pinned(&'a str),
    ResizePending,
    Message(&'a str),
    Hints,
}

pub const KEY_HINTS: &str = "q quit  l/1-8 layout  Tab slot  w widget  x clear  r reset  p preset";

pub fn compose_status<'a>(ctx: &'a StatusContext<'a>) -> Vec<StatusSegment<'a>> {
    let star = if ctx.customized { "*" } else { "" };
    let mut out = vec![
        StatusSegment::Layout(format!("{} [{}]{}", ctx.layout_label, ctx.layout_name, star).into()),
        StatusSegment::Target(ctx.target),
    ];
    if let Some(pins) = ctx.pinned {
        out.push(StatusSegment::Pinned(pins));
    }
    if ctx.resize_pending {
        out.push(StatusSegment::ResizePending);
    }
    if let Some(msg) = ctx.message {
        out.push(StatusSegment::Message(msg));
    }
    out.push(StatusSegment::Hints);
    out
}

pub fn format_status(segments: &[StatusSegment<'_>], width: u16) -> String {
    let parts: Vec<Cow<'_, str>> = segments
        .iter()
        .map(|s| match s {
            StatusSegment::Layout(l) => l.clone(),
            StatusSegment::Target(t) => format!("target {t}").into(),
            StatusSegment::Pinned(p) => format!("pinned {p}").into(),
            StatusSegment::ResizePending => "resizing...".into(),
            StatusSegment::Message(m) => Cow::Borrowed(*m),
            StatusSegment::Hints => KEY_HINTS.into(),
        })
        .collect();
    let line = format!(" {}", parts.join(" | "));
    line.chars().take(width as usize).collect()
}
