//! Core event types and channel helpers for the dashboard runtime.
//!
//! Everything the main loop reacts to arrives as an [`Event`] on one bounded
//! mpsc channel: terminal input, periodic ticks that drive the resize
//! debouncer, and task status snapshots from the backend poller.

use core_tasks::{TaskBackend, TaskStatus};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

// -------------------------------------------------------------------------------------------------
// Channel Policy
// -------------------------------------------------------------------------------------------------
// Producers await `send` and park when the channel is full rather than dropping events. Mouse drag
// bursts are the largest producer; the debouncer downstream collapses them, so preserving every
// event keeps the final committed size exact.
// -------------------------------------------------------------------------------------------------
pub const EVENT_CHANNEL_CAP: usize = 4096;

// Telemetry: relaxed atomic counters inspected by tests and logged at shutdown.
pub static CHANNEL_SEND_FAILURES: AtomicU64 = AtomicU64::new(0);
pub static KEYPRESS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static MOUSE_EVENTS_TOTAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STARTS: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_SIGNAL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_CHANNEL: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_STREAM: AtomicU64 = AtomicU64::new(0);
pub static ASYNC_INPUT_STOP_ERROR: AtomicU64 = AtomicU64::new(0);
pub static STATUS_POLLS: AtomicU64 = AtomicU64::new(0);
pub static STATUS_POLL_FAILURES: AtomicU64 = AtomicU64::new(0);

/// Top-level event enum consumed by the central event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Input(InputEvent),
    Command(CommandEvent),
    /// Latest full status list from the task backend.
    TaskStatuses(Vec<TaskStatus>),
    RenderRequested,
    /// Periodic monotonic tick used to flush expired resize debounces.
    Tick,
    Shutdown,
}

/// Optional hooks that can observe events at the loop boundary. These should
/// not block.
pub trait EventHooks: Send + Sync + 'static {
    fn pre_handle(&self, _event: &Event) {}
    fn post_handle(&self, _event: &Event) {}
}

/// Default no-op hooks implementation.
pub struct NoopEventHooks;

impl EventHooks for NoopEventHooks {}

/// Trait implemented by any async event producer. Implementors usually hold
/// configuration and spawn one background task that pushes `Event`s into the
/// shared channel.
pub trait AsyncEventSource: Send + 'static {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task. Implementors stop when
    /// `tx.send(..).await` returns Err (channel closed).
    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()>;
}

/// Registry of event sources spawned together at startup.
pub struct EventSourceRegistry {
    sources: Vec<Box<dyn AsyncEventSource>>,
}

impl Default for EventSourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources, returning their JoinHandles. Each source
    /// receives its own `Sender` clone; during shutdown the caller drops its
    /// last clone before awaiting the handles so sources observe the closed
    /// channel and exit.
    pub fn spawn_all(&mut self, tx: &Sender<Event>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning_event_source");
            out.push(src.spawn(tx.clone()));
        }
        out
    }
}

/// Emits `Event::Tick` every configured interval.
pub struct TickEventSource {
    interval: Duration,
}

impl TickEventSource {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl AsyncEventSource for TickEventSource {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let dur = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(dur);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick).await.is_err() {
                    break;
                }
            }
        })
    }
}

/// Polls [`TaskBackend::statuses`] on a fixed interval and forwards each
/// successful result as `Event::TaskStatuses`. Backend calls may block, so
/// they run on the blocking pool. A failed poll is logged and skipped; the
/// next interval tries again.
pub struct StatusPollSource<B: TaskBackend> {
    backend: Arc<B>,
    interval: Duration,
}

impl<B: TaskBackend> StatusPollSource<B> {
    pub fn new(backend: Arc<B>, interval: Duration) -> Self {
        Self { backend, interval }
    }
}

impl<B: TaskBackend> AsyncEventSource for StatusPollSource<B> {
    fn name(&self) -> &'static str {
        "task_status_poll"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        let StatusPollSource { backend, interval } = *self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }
                let backend = Arc::clone(&backend);
                let polled = tokio::task::spawn_blocking(move || backend.statuses()).await;
                STATUS_POLLS.fetch_add(1, Ordering::Relaxed);
                let statuses = match polled {
                    Ok(Ok(statuses)) => statuses,
                    Ok(Err(e)) => {
                        STATUS_POLL_FAILURES.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(target: "tasks.poll", error = %e, "status_poll_failed");
                        continue;
                    }
                    Err(e) => {
                        STATUS_POLL_FAILURES.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(target: "tasks.poll", error = %e, "status_poll_join_failed");
                        continue;
                    }
                };
                if tx.send(Event::TaskStatuses(statuses)).await.is_err() {
                    CHANNEL_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
    Quit,
}

/// Normalized input events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    /// Terminal resize (columns, rows).
    Resize(u16, u16),
    /// Synthetic interrupt (Ctrl-C) surfaced distinctly from a plain key.
    CtrlC,
    Mouse(MouseEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub column: u16,
    pub row: u16,
    pub mods: KeyModifiers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    ScrollUp,
    ScrollDown,
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::empty(),
        }
    }
}

/// Normalized logical key representations consumed by higher layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const CTRL = 0b0000_0001;
        const ALT  = 0b0000_0010;
        const SHIFT= 0b0000_0100;
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{:?}", self.code, self.mods)
    }
}

pub type EventResult<T> = anyhow::Result<T>;
