//! dashgrid binary entry point.
use anyhow::Result;
use clap::Parser;
use core_actions::{Dashboard, QueryParams};
use core_config::{Config, load_from};
use core_events::{EVENT_CHANNEL_CAP, Event, EventSourceRegistry, StatusPollSource, TickEventSource};
use core_render::ResizeDebouncer;
use core_state::{JsonFileStorage, LayoutStore, MemoryStorage, StateStorage};
use core_tasks::{NullBackend, TaskBackend, TaskParams};
use core_terminal::{CrosstermBackend, TerminalBackend};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod app;
mod view;

use app::{ActionCounter, App, LoopControl, ShutdownReason};
use view::View;

/// Tick cadence; bounds how late a debounced resize can be committed.
const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "dashgrid", version, about = "Resizable dashboard layouts in the terminal")]
struct Args {
    /// Optional configuration file path (overrides discovery of `dashgrid.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Query string as found in a shared link, e.g. `layout=grid-4&target=AAPL`.
    #[arg(long = "query", default_value = "")]
    pub query: String,
    /// Layout to open; takes precedence over `layout` in `--query`.
    #[arg(long = "layout")]
    pub layout: Option<String>,
    /// Persisted state file; `-` keeps state in memory for this session only.
    #[arg(long = "state")]
    pub state: Option<String>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

struct RuntimeContext<'a> {
    app: App,
    config: Config,
    counter: ActionCounter,
    terminal_guard: core_terminal::TerminalGuard<'a>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run<'a>(&'a mut self, args: &Args) -> Result<RuntimeContext<'a>> {
        self.configure_logging()?;
        Self::install_panic_hook();

        info!(target: "runtime", "startup");
        let mut config = load_from(args.config.clone())?;
        config.apply_context();
        let dash = Self::open_dashboard(args, &config);

        self.backend.set_title("dashgrid")?;
        let (width, height) = self.backend.size().unwrap_or((80, 24));
        let guard = self.backend.enter_guard()?;

        info!(
            target: "runtime.startup",
            layout = dash.active_layout(),
            target_id = dash.target(),
            slots = dash.slot_count(),
            config_override = args.config.is_some(),
            min_pane_percent = config.effective_min_pane_percent,
            width,
            height,
            "bootstrap_complete"
        );

        let min_pct = config.effective_min_pane_percent;
        let view = View::new(width, height, min_pct);
        let mut app = App::new(dash, ResizeDebouncer::new(config.debounce()), view, min_pct);
        let counter = ActionCounter::default();
        app.add_observer(Box::new(counter.clone()));

        Ok(RuntimeContext {
            app,
            config,
            counter,
            terminal_guard: guard,
        })
    }

    fn open_dashboard(args: &Args, config: &Config) -> Dashboard {
        let storage: Box<dyn StateStorage> = match args.state.as_deref() {
            Some("-") => Box::new(MemoryStorage::new()),
            Some(path) => Box::new(JsonFileStorage::new(path)),
            None => Box::new(JsonFileStorage::new(config.storage_path())),
        };
        let store = LayoutStore::hydrate(storage);
        let mut query = QueryParams::parse(&args.query);
        if let Some(layout) = &args.layout {
            query.layout = Some(layout.clone());
        }
        Dashboard::open(store, query, config.default_layout())
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join("dashgrid.log");
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, "dashgrid.log");
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

struct DashRuntime<'a, B: TaskBackend> {
    app: App,
    counter: ActionCounter,
    task_backend: Arc<B>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    source_handles: Vec<tokio::task::JoinHandle<()>>,
    input_task: Option<tokio::task::JoinHandle<()>>,
    input_shutdown: Option<core_input::AsyncInputShutdown>,
    _terminal_guard: core_terminal::TerminalGuard<'a>,
}

impl<'a, B: TaskBackend> DashRuntime<'a, B> {
    fn new(
        context: RuntimeContext<'a>,
        task_backend: Arc<B>,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        input_task: tokio::task::JoinHandle<()>,
        input_shutdown: core_input::AsyncInputShutdown,
        source_handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        let RuntimeContext {
            app,
            config: _,
            counter,
            terminal_guard,
        } = context;
        Self {
            app,
            counter,
            task_backend,
            rx,
            tx: Some(tx),
            source_handles,
            input_task: Some(input_task),
            input_shutdown: Some(input_shutdown),
            _terminal_guard: terminal_guard,
        }
    }

    /// Run until a quit. Returns the final query string.
    async fn run(mut self) -> Result<String> {
        self.render();

        let loop_span = tracing::debug_span!(target: "runtime", "event_loop");
        let _enter_loop = loop_span.enter();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        while let Some(event) = self.rx.recv().await {
            match self.app.handle_event(&event, Instant::now()) {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue { run } => {
                    if let Some(params) = run {
                        self.spawn_task_run(params);
                    }
                    self.render();
                }
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        let dash = self.app.finish();
        Ok(dash.query().to_query_string())
    }

    fn render(&mut self) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = self.app.render(&mut out) {
            error!(target: "render.view", ?e, "render_error");
        }
    }

    /// Backend calls may block; the result is only logged since the status
    /// poll reports progress.
    fn spawn_task_run(&self, params: TaskParams) {
        let backend = Arc::clone(&self.task_backend);
        tokio::spawn(async move {
            let kind = params.task_type.as_str();
            match tokio::task::spawn_blocking(move || backend.run(&params)).await {
                Ok(Ok(task_id)) => info!(target: "tasks.run", kind, task_id = %task_id, "task_started"),
                Ok(Err(e)) => warn!(target: "tasks.run", kind, error = %e, "task_run_failed"),
                Err(e) => warn!(target: "tasks.run", kind, error = %e, "task_run_join_failed"),
            }
        });
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "dropping_runtime_sender");
            drop(tx);
        }

        while let Some(handle) = self.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(target: "runtime.shutdown", reason = reason.as_str(), "event_source_task_stopped"),
                Ok(Err(err)) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", reason = reason.as_str(), "event_source_task_cancelled")
                }
                Ok(Err(err)) => {
                    error!(target: "runtime.shutdown", reason = reason.as_str(), ?err, "event_source_task_error")
                }
                Err(_) => warn!(target: "runtime.shutdown", reason = reason.as_str(), "event_source_task_timeout"),
            }
        }

        if let Some(shutdown) = self.input_shutdown.take() {
            trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_shutdown_signal");
            shutdown.signal();
        }

        if let Some(handle) = self.input_task.take() {
            match handle.await {
                Ok(_) => trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_joined"),
                Err(err) if err.is_cancelled() => {
                    trace!(target: "runtime.shutdown", reason = reason.as_str(), "input_task_cancelled")
                }
                Err(err) => error!(target: "runtime.shutdown", reason = reason.as_str(), ?err, "input_task_join_failed"),
            }
        }

        info!(target: "runtime.shutdown", actions = self.counter.total(), "action_totals");
        log_shutdown_stage(reason, "complete");
    }
}

fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let context = startup.run(&args)?;

    let (tx, rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let (input_task, input_shutdown) = core_input::spawn_async_input(tx.clone());
    let task_backend = Arc::new(NullBackend);
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(TICK_INTERVAL));
    if context.config.file.tasks.enabled {
        registry.register(StatusPollSource::new(
            Arc::clone(&task_backend),
            context.config.poll_interval(),
        ));
    }
    let source_handles = registry.spawn_all(&tx);

    let runtime = DashRuntime::new(
        context,
        task_backend,
        tx,
        rx,
        input_task,
        input_shutdown,
        source_handles,
    );
    // the terminal guard drops with the runtime, before the query is printed
    let query = runtime.run().await?;
    if !query.is_empty() {
        println!("?{query}");
    }
    Ok(())
}
