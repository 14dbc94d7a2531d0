//! Configuration loading and parsing.
//!
//! Parses `dashgrid.toml` (or an override path provided by the binary).
//! Every key is optional; a missing file or a file that fails to parse yields
//! the defaults so startup is never blocked by configuration. Unknown fields
//! are ignored to allow forward evolution.
//!
//! The raw `min_pane_percent` is retained and clamped into `[0, 50]` by
//! `Config::apply_context`: every split has at least two panes, so a minimum
//! above half the group would make any layout unsatisfiable.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};
use tracing::info;

/// Largest minimum pane share the renderer will honor.
pub const MAX_MIN_PANE_PERCENT: f64 = 50.0;

#[derive(Debug, Deserialize, Clone)]
pub struct ResizeConfig {
    #[serde(default = "ResizeConfig::default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "ResizeConfig::default_min_pane_percent")]
    pub min_pane_percent: f64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
            min_pane_percent: Self::default_min_pane_percent(),
        }
    }
}

impl ResizeConfig {
    const fn default_debounce_ms() -> u64 {
        300
    }
    const fn default_min_pane_percent() -> f64 {
        10.0
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_name", rename = "default")]
    pub default_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            default_name: Self::default_name(),
        }
    }
}

impl LayoutConfig {
    fn default_name() -> String {
        "single".to_string()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StorageConfig {
    /// Override location of the persisted dashboard record.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TasksConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "TasksConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}

impl TasksConfig {
    const fn default_poll_interval_ms() -> u64 {
        5000
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub resize: ResizeConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
    pub effective_min_pane_percent: f64,
}

impl Default for Config {
    fn default() -> Self {
        let file = ConfigFile::default();
        let effective_min_pane_percent = file.resize.min_pane_percent;
        Self {
            raw: None,
            file,
            effective_min_pane_percent,
        }
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    // Prefer a working-directory `dashgrid.toml` over the platform config dir.
    let local = PathBuf::from("dashgrid.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("dashgrid").join("dashgrid.toml");
    }
    PathBuf::from("dashgrid.toml")
}

/// Default location of the persisted record when `[storage] path` is unset.
pub fn default_storage_path() -> PathBuf {
    let file = format!("{}.json", core_state::STORAGE_KEY);
    match dirs::data_dir() {
        Some(dir) => dir.join("dashgrid").join(file),
        None => PathBuf::from(file),
    }
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            let effective_min_pane_percent = file.resize.min_pane_percent;
            Ok(Config {
                raw: Some(content),
                file,
                effective_min_pane_percent,
            })
        }
        Err(e) => {
            info!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

impl Config {
    /// Clamp the configured minimum pane share into `[0, MAX_MIN_PANE_PERCENT]`.
    /// Returns the effective value.
    pub fn apply_context(&mut self) -> f64 {
        let raw = self.file.resize.min_pane_percent;
        let clamped = if raw.is_finite() {
            raw.clamp(0.0, MAX_MIN_PANE_PERCENT)
        } else {
            ResizeConfig::default_min_pane_percent()
        };
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max = MAX_MIN_PANE_PERCENT,
                "min_pane_percent_clamped"
            );
        }
        self.effective_min_pane_percent = clamped;
        clamped
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.file.resize.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero interval would spin the poller.
        Duration::from_millis(self.file.tasks.poll_interval_ms.max(250))
    }

    pub fn storage_path(&self) -> PathBuf {
        self.file
            .storage
            .path
            .clone()
            .unwrap_or_else(default_storage_path)
    }

    pub fn default_layout(&self) -> &str {
        &self.file.layout.default_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file.resize.debounce_ms, 300);
        assert_eq!(cfg.file.resize.min_pane_percent, 10.0);
        assert_eq!(cfg.default_layout(), "single");
        assert!(!cfg.file.tasks.enabled);
        assert_eq!(cfg.file.tasks.poll_interval_ms, 5000);
    }

    #[test]
    fn parses_all_sections() {
        let tmp = write_config(
            "[resize]\ndebounce_ms = 120\nmin_pane_percent = 15.0\n\
             [layout]\ndefault = \"grid-4\"\n\
             [storage]\npath = \"/tmp/dash.json\"\n\
             [tasks]\nenabled = true\npoll_interval_ms = 1000\n",
        );
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.debounce(), Duration::from_millis(120));
        assert_eq!(cfg.apply_context(), 15.0);
        assert_eq!(cfg.default_layout(), "grid-4");
        assert_eq!(cfg.storage_path(), PathBuf::from("/tmp/dash.json"));
        assert!(cfg.file.tasks.enabled);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = write_config("[resize\ndebounce_ms = = 5");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.resize.debounce_ms, 300);
    }

    #[test]
    fn min_pane_percent_clamps_and_logs() {
        let tmp = write_config("[resize]\nmin_pane_percent = 80.0\n");
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        with_default(subscriber, || {
            cfg.apply_context();
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("min_pane_percent_clamped"));
        assert_eq!(cfg.effective_min_pane_percent, MAX_MIN_PANE_PERCENT);
    }

    #[test]
    fn negative_min_clamps_to_zero() {
        let tmp = write_config("[resize]\nmin_pane_percent = -5.0\n");
        let mut cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.apply_context(), 0.0);
    }

    #[test]
    fn poll_interval_has_floor() {
        let tmp = write_config("[tasks]\npoll_interval_ms = 0\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn default_storage_path_uses_namespace_key() {
        let p = default_storage_path();
        assert!(p.ends_with("dashboard-storage.json"));
    }
}
