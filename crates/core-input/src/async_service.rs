use crate::{map_key, map_mouse};
use core_events::{
    ASYNC_INPUT_STARTS, ASYNC_INPUT_STOP_CHANNEL, ASYNC_INPUT_STOP_ERROR, ASYNC_INPUT_STOP_SIGNAL,
    ASYNC_INPUT_STOP_STREAM, CHANNEL_SEND_FAILURES, Event, InputEvent, KEYPRESS_TOTAL,
    MOUSE_EVENTS_TOTAL,
};
use crossterm::event::{
    Event as CEvent, EventStream, KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyEventKind as CKind,
    MouseEvent as CMouseEvent,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::Ordering::Relaxed;
use tokio::sync::{Notify, mpsc::Sender};
use tokio::task;
use tokio_stream::StreamExt;
use tracing::{info, trace, warn};

#[derive(Clone, Debug)]
pub struct AsyncInputShutdown {
    notify: Arc<Notify>,
}

impl AsyncInputShutdown {
    pub fn signal(&self) {
        self.notify.notify_one();
    }
}

#[derive(Clone, Debug)]
struct ShutdownListener {
    notify: Arc<Notify>,
}

impl ShutdownListener {
    fn new_pair() -> (AsyncInputShutdown, Self) {
        let notify = Arc::new(Notify::new());
        (
            AsyncInputShutdown {
                notify: notify.clone(),
            },
            ShutdownListener { notify },
        )
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawn a Tokio task reading terminal events from `EventStream`.
pub(crate) fn spawn_async_event_task(
    sender: Sender<Event>,
) -> (task::JoinHandle<()>, AsyncInputShutdown) {
    let (shutdown, listener) = ShutdownListener::new_pair();
    let handle = task::spawn(async move {
        let span = tracing::debug_span!(target: "input.thread", "input_async_task");
        let _enter = span.enter();
        AsyncEventStreamTask::new(sender, EventStream::new(), listener)
            .run()
            .await;
    });
    (handle, shutdown)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    Running,
    ShutdownSignal,
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Running => "running",
            ExitReason::ShutdownSignal => "shutdown_signal",
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

struct AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    sender: Sender<Event>,
    stream: S,
    shutdown: ShutdownListener,
    exit_reason: ExitReason,
    stream_error: Option<io::ErrorKind>,
}

impl<S> AsyncEventStreamTask<S>
where
    S: tokio_stream::Stream<Item = io::Result<CEvent>> + Send + Unpin + 'static,
{
    fn new(sender: Sender<Event>, stream: S, shutdown: ShutdownListener) -> Self {
        Self {
            sender,
            stream,
            shutdown,
            exit_reason: ExitReason::Running,
            stream_error: None,
        }
    }

    async fn run(mut self) {
        info!(target: "input.thread", "async_input_task_started");
        ASYNC_INPUT_STARTS.fetch_add(1, Relaxed);
        self.exit_reason = ExitReason::StreamEnded;
        loop {
            let maybe_result = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    self.exit_reason = ExitReason::ShutdownSignal;
                    break;
                }
                result = self.stream.next() => result,
            };

            let Some(result) = maybe_result else {
                break;
            };

            let keep_going = match result {
                Ok(CEvent::Key(key)) => self.handle_key_event(key).await,
                Ok(CEvent::Mouse(mouse)) => self.handle_mouse_event(mouse).await,
                Ok(CEvent::Resize(w, h)) => {
                    trace!(target: "input.event", w, h, "resize");
                    self.send_event(Event::Input(InputEvent::Resize(w, h))).await
                }
                Ok(_) => true,
                Err(err) => {
                    self.exit_reason = ExitReason::StreamError;
                    self.stream_error = Some(err.kind());
                    false
                }
            };
            if !keep_going {
                break;
            }
        }

        let reason = match self.exit_reason {
            ExitReason::Running => ExitReason::StreamEnded,
            other => other,
        };

        match reason {
            ExitReason::ShutdownSignal => {
                ASYNC_INPUT_STOP_SIGNAL.fetch_add(1, Relaxed);
            }
            ExitReason::ChannelClosed => {
                ASYNC_INPUT_STOP_CHANNEL.fetch_add(1, Relaxed);
            }
            ExitReason::StreamEnded => {
                ASYNC_INPUT_STOP_STREAM.fetch_add(1, Relaxed);
            }
            ExitReason::StreamError => {
                ASYNC_INPUT_STOP_ERROR.fetch_add(1, Relaxed);
                warn!(target: "input.thread", error_kind = ?self.stream_error, "async_input_task_stream_error");
            }
            ExitReason::Running => {}
        }

        info!(target: "input.thread", reason = reason.as_str(), "async_input_task_stopped");
    }

    async fn handle_key_event(&mut self, key: CKeyEvent) -> bool {
        if !matches!(key.kind, CKind::Press | CKind::Repeat) {
            return true;
        }

        if matches!(key.code, CKeyCode::Char('c'))
            && key
                .modifiers
                .contains(crossterm::event::KeyModifiers::CONTROL)
        {
            return self.send_event(Event::Input(InputEvent::CtrlC)).await;
        }

        let Some(mapped) = map_key(&key) else {
            return true;
        };
        trace!(target: "input.event", kind = "keypress", code = ?mapped.code, mods = ?mapped.mods);
        let sent = self.send_event(Event::Input(InputEvent::Key(mapped))).await;
        if sent {
            KEYPRESS_TOTAL.fetch_add(1, Relaxed);
        }
        sent
    }

    async fn handle_mouse_event(&mut self, mouse: CMouseEvent) -> bool {
        let Some(mapped) = map_mouse(&mouse) else {
            return true;
        };
        trace!(target: "input.event", kind = "mouse", column = mapped.column, row = mapped.row);
        let sent = self.send_event(Event::Input(InputEvent::Mouse(mapped))).await;
        if sent {
            MOUSE_EVENTS_TOTAL.fetch_add(1, Relaxed);
        }
        sent
    }

    async fn send_event(&mut self, event: Event) -> bool {
        match self.sender.send(event).await {
            Ok(_) => true,
            Err(_) => {
                CHANNEL_SEND_FAILURES.fetch_add(1, Relaxed);
                if !matches!(self.exit_reason, ExitReason::ShutdownSignal) {
                    self.exit_reason = ExitReason::ChannelClosed;
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{KeyCode, KeyEvent, MouseButton, MouseEventKind};
    use crossterm::event::{KeyModifiers as CMods, MouseButton as CButton, MouseEventKind as CMouseKind};
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};
    use tokio::sync::{Mutex as TokioMutex, mpsc};
    use tokio::time::{Duration, timeout};
    use tokio_stream::wrappers::UnboundedReceiverStream;
    use tracing::field::{Field, Visit};
    use tracing::{Metadata, Subscriber, subscriber::Interest};
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    static LOG_CAPTURE_GUARD: TokioMutex<()> = TokioMutex::const_new(());

    #[derive(Clone, Default)]
    struct LogCapture {
        events: Arc<Mutex<Vec<CapturedLog>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedLog {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct LogVisitor {
        fields: Vec<(String, String)>,
    }

    impl Visit for LogVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for LogCapture
    where
        S: Subscriber,
    {
        fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
            Interest::always()
        }

        fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
            metadata.target().starts_with("input.")
        }

        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = LogVisitor::default();
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedLog {
                target: event.metadata().target().to_string(),
                fields: visitor.fields,
            });
        }
    }

    fn mouse(kind: CMouseKind) -> CEvent {
        CEvent::Mouse(CMouseEvent {
            kind,
            column: 7,
            row: 2,
            modifiers: CMods::NONE,
        })
    }

    #[tokio::test]
    async fn forwards_keys_and_counts_them() {
        let base_total = KEYPRESS_TOTAL.load(Ordering::Relaxed);
        let outputs = run_scenario(vec![
            CEvent::Key(CKeyEvent::new(CKeyCode::Char('l'), CMods::NONE)),
            CEvent::Key(CKeyEvent::new(CKeyCode::F(1), CMods::NONE)),
            CEvent::Key(CKeyEvent::new(CKeyCode::Tab, CMods::NONE)),
        ])
        .await;

        assert_eq!(
            outputs,
            vec![
                Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Char('l')))),
                Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Tab))),
            ]
        );
        assert!(KEYPRESS_TOTAL.load(Ordering::Relaxed) >= base_total + 2);
    }

    #[tokio::test]
    async fn key_release_is_ignored() {
        let mut release = CKeyEvent::new(CKeyCode::Char('q'), CMods::NONE);
        release.kind = CKind::Release;
        assert!(run_scenario(vec![CEvent::Key(release)]).await.is_empty());
    }

    #[tokio::test]
    async fn forwards_ctrl_c() {
        let outputs = run_scenario(vec![CEvent::Key(CKeyEvent::new(
            CKeyCode::Char('c'),
            CMods::CONTROL,
        ))])
        .await;
        assert!(matches!(outputs.as_slice(), [Event::Input(InputEvent::CtrlC)]));
    }

    #[tokio::test]
    async fn forwards_resize_event() {
        let outputs = run_scenario(vec![CEvent::Resize(120, 48)]).await;
        assert!(matches!(
            outputs.as_slice(),
            [Event::Input(InputEvent::Resize(120, 48))]
        ));
    }

    #[tokio::test]
    async fn forwards_button_mouse_events_only() {
        let base = MOUSE_EVENTS_TOTAL.load(Ordering::Relaxed);
        let outputs = run_scenario(vec![
            mouse(CMouseKind::Moved),
            mouse(CMouseKind::Down(CButton::Left)),
            mouse(CMouseKind::Drag(CButton::Left)),
            mouse(CMouseKind::Up(CButton::Left)),
        ])
        .await;
        let kinds: Vec<MouseEventKind> = outputs
            .iter()
            .filter_map(|e| match e {
                Event::Input(InputEvent::Mouse(m)) => Some(m.kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                MouseEventKind::Down(MouseButton::Left),
                MouseEventKind::Drag(MouseButton::Left),
                MouseEventKind::Up(MouseButton::Left),
            ]
        );
        assert!(MOUSE_EVENTS_TOTAL.load(Ordering::Relaxed) >= base + 3);
    }

    #[tokio::test]
    async fn stream_error_stops_task() {
        let base = ASYNC_INPUT_STOP_ERROR.load(Ordering::Relaxed);
        let (tx, mut rx) = mpsc::channel(8);
        let stream = tokio_stream::iter(vec![
            Err(io::Error::other("tty gone")),
            Ok(CEvent::Resize(1, 1)),
        ]);
        let (_shutdown, listener) = ShutdownListener::new_pair();
        AsyncEventStreamTask::new(tx, stream, listener).run().await;
        assert!(rx.recv().await.is_none());
        assert!(ASYNC_INPUT_STOP_ERROR.load(Ordering::Relaxed) > base);
    }

    #[tokio::test]
    async fn logs_startup_and_shutdown_reason_on_signal() {
        let _log_guard = LOG_CAPTURE_GUARD.lock().await;
        let capture = LogCapture::default();
        let events_handle = capture.events.clone();
        let subscriber = Registry::default().with(capture.with_filter(LevelFilter::TRACE));
        let dispatch = tracing::Dispatch::new(subscriber);
        let _guard = tracing::dispatcher::set_default(&dispatch);

        let base_signal = ASYNC_INPUT_STOP_SIGNAL.load(Ordering::Relaxed);

        let (tx, rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<io::Result<CEvent>>();
        let stream = UnboundedReceiverStream::new(event_rx);
        let (shutdown, listener) = ShutdownListener::new_pair();

        let notifier = shutdown.clone();
        let signal_task = tokio::spawn(async move {
            tokio::task::yield_now().await;
            notifier.signal();
        });

        let _keep_alive = event_tx;
        AsyncEventStreamTask::new(tx, stream, listener).run().await;
        signal_task.await.unwrap();
        drop(rx);

        let logged = events_handle.lock().unwrap();
        let stop_event = logged
            .iter()
            .find(|entry| {
                entry.target == "input.thread"
                    && entry
                        .fields
                        .iter()
                        .any(|(k, v)| k == "message" && v == "async_input_task_stopped")
            })
            .unwrap_or_else(|| panic!("missing async_input_task_stopped log: {:?}", *logged));
        let reason = stop_event
            .fields
            .iter()
            .find(|(k, _)| k == "reason")
            .map(|(_, v)| v.trim_matches('"'))
            .unwrap_or_default();
        assert_eq!(reason, "shutdown_signal");
        assert!(ASYNC_INPUT_STOP_SIGNAL.load(Ordering::Relaxed) > base_signal);
    }

    #[tokio::test]
    async fn channel_closed_increments_telemetry() {
        let base_channel = ASYNC_INPUT_STOP_CHANNEL.load(Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let stream = tokio_stream::iter(vec![Ok(CEvent::Resize(10, 10))]);
        let (_shutdown, listener) = ShutdownListener::new_pair();
        AsyncEventStreamTask::new(tx, stream, listener).run().await;
        assert!(ASYNC_INPUT_STOP_CHANNEL.load(Ordering::Relaxed) > base_channel);
    }

    #[tokio::test]
    async fn shutdown_signal_exits_immediately() {
        let (tx, mut rx) = mpsc::channel(1);
        let (event_tx, event_rx) = mpsc::unbounded_channel::<io::Result<CEvent>>();
        let stream = UnboundedReceiverStream::new(event_rx);
        let (shutdown, listener) = ShutdownListener::new_pair();

        let task = tokio::spawn(async move {
            let _keep_alive = event_tx;
            AsyncEventStreamTask::new(tx, stream, listener).run().await;
        });

        shutdown.signal();

        timeout(Duration::from_millis(50), task)
            .await
            .expect("shutdown should resolve promptly")
            .expect("task join failed");

        assert!(rx.recv().await.is_none());
    }

    async fn run_scenario(events: Vec<CEvent>) -> Vec<Event> {
        let (tx, mut rx) = mpsc::channel(64);
        let stream = tokio_stream::iter(events.into_iter().map(Ok));
        let (_shutdown, listener) = ShutdownListener::new_pair();
        AsyncEventStreamTask::new(tx, stream, listener).run().await;

        let mut outputs = Vec::new();
        while let Some(evt) = rx.recv().await {
            outputs.push(evt);
        }
        outputs
    }
}
