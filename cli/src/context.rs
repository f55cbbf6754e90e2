use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use vcl_core::context::{AppConfig, AppConfigExt, Lookups, Monitor, SharedTracker};
use vcl_core::signal::SourceSignal;
use vcl_core::storage;

/// Holds all shared state for the CLI application.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<Mutex<AppConfig>>,
    pub monitor: Arc<Mutex<Monitor>>,
    pub lookups: Lookups,
}

impl CliContext {
    /// Load config and lookup tables. The receiver yields every tracker signal.
    pub fn new() -> Result<(Self, UnboundedReceiver<SourceSignal>), String> {
        let data_dir = storage::data_dir().map_err(|e| e.to_string())?;
        let lookups = Lookups::load(&data_dir);
        let (tx, rx) = mpsc::unbounded_channel();

        let monitor = Monitor::new(AppConfig::load(), lookups.clone(), data_dir)
            .persist_config(true)
            .with_signals(tx);
        let ctx = Self {
            config: monitor.config(),
            monitor: Arc::new(Mutex::new(monitor)),
            lookups,
        };
        Ok((ctx, rx))
    }

    /// `source`, or the configured current source.
    pub async fn source_name(&self, source: Option<&str>) -> String {
        match source {
            Some(name) => name.to_string(),
            None => self.config.lock().await.current_source.clone(),
        }
    }

    /// Tracker of a running source.
    pub async fn tracker(&self, source: Option<&str>) -> Result<(String, SharedTracker), String> {
        let name = self.source_name(source).await;
        let tracker = self
            .monitor
            .lock()
            .await
            .tracker(&name)
            .ok_or_else(|| format!("source {name} is not running (use `start`)"))?;
        Ok((name, tracker))
    }
}
