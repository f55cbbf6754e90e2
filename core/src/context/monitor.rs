use hashbrown::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::worker::{ConfigSink, SharedTracker, SourceWorker, WorkerTiming};
use super::{AppConfig, Lookups, MonitorError};
use crate::signal::{ChannelSink, SourceSignal};
use crate::stats::Reclassified;
use crate::tracker::{Tracker, TrackerStorage};

/// Registry of running sources. Every source gets its own tracker and
/// worker; the only state they share is the lookup tables.
pub struct Monitor {
    config: Arc<Mutex<AppConfig>>,
    persist_config: bool,
    lookups: Lookups,
    data_dir: PathBuf,
    timing: WorkerTiming,
    signals: Option<UnboundedSender<SourceSignal>>,
    workers: HashMap<String, SourceWorker>,
}

impl Monitor {
    /// Identity learned from logs is applied to `config` in memory only;
    /// see `persist_config`.
    pub fn new(config: AppConfig, lookups: Lookups, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            persist_config: false,
            lookups,
            data_dir: data_dir.into(),
            timing: WorkerTiming::default(),
            signals: None,
            workers: HashMap::new(),
        }
    }

    /// Save the config to disk whenever a worker updates it.
    pub fn persist_config(mut self, persist: bool) -> Self {
        self.persist_config = persist;
        self
    }

    pub fn with_timing(mut self, timing: WorkerTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Forward every tracker's signals, tagged with the source name.
    pub fn with_signals(mut self, tx: UnboundedSender<SourceSignal>) -> Self {
        self.signals = Some(tx);
        self
    }

    pub fn config(&self) -> Arc<Mutex<AppConfig>> {
        self.config.clone()
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn start_source(&mut self, name: &str) -> Result<SharedTracker, MonitorError> {
        if self.workers.contains_key(name) {
            return Err(MonitorError::AlreadyRunning {
                name: name.to_string(),
            });
        }
        let source = self
            .config
            .lock()
            .await
            .source(name)
            .cloned()
            .ok_or_else(|| MonitorError::UnknownSource {
                name: name.to_string(),
            })?;
        if source.log_path.is_empty() {
            return Err(MonitorError::NoLogPath {
                name: name.to_string(),
            });
        }

        tracing::info!(source = name, path = %source.log_path, "Starting source");
        let mut tracker = Tracker::new(
            name,
            source,
            TrackerStorage::in_dir(&self.data_dir, name),
            self.lookups.clone(),
        );
        if let Some(tx) = &self.signals {
            tracker.add_signal_handler(Box::new(ChannelSink::from_sender(tx.clone())));
        }

        let tracker = Arc::new(Mutex::new(tracker));
        let sink = ConfigSink {
            config: self.config.clone(),
            persist: self.persist_config,
        };
        let worker = SourceWorker::spawn(tracker.clone(), self.timing, sink);
        self.workers.insert(name.to_string(), worker);
        Ok(tracker)
    }

    pub async fn stop_source(&mut self, name: &str) -> Result<(), MonitorError> {
        let worker = self
            .workers
            .remove(name)
            .ok_or_else(|| MonitorError::UnknownSource {
                name: name.to_string(),
            })?;
        worker.stop().await;
        tracing::info!(source = name, "Stopped source");
        Ok(())
    }

    pub fn tracker(&self, name: &str) -> Option<SharedTracker> {
        self.workers.get(name).map(SourceWorker::tracker)
    }

    pub fn running(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Add an NPC pattern and reclassify every running source. `None` when
    /// the pattern was empty or already known.
    pub async fn add_npc_pattern(&self, pattern: &str) -> Option<Reclassified> {
        let added = self.lookups.npcs_mut().add_pattern(pattern);
        if !added {
            return None;
        }
        tracing::info!(pattern, "Added NPC pattern");
        Some(self.reclassify_all().await)
    }

    /// Removing a pattern cannot restore attributions dropped earlier; the
    /// pass still runs so every source sees the same pattern set.
    pub async fn remove_npc_pattern(&self, pattern: &str) -> Option<Reclassified> {
        let removed = self.lookups.npcs_mut().remove_pattern(pattern);
        if !removed {
            return None;
        }
        tracing::info!(pattern, "Removed NPC pattern");
        Some(self.reclassify_all().await)
    }

    /// Each tracker is locked for its whole pass, so its worker cannot
    /// observe half-reclassified stats.
    async fn reclassify_all(&self) -> Reclassified {
        let snapshot = self.lookups.npcs().clone();
        let mut total = Reclassified::default();
        for (name, worker) in &self.workers {
            let tracker = worker.tracker();
            let mut tracker = tracker.lock().await;
            let result = tracker.reclassify(&snapshot);
            tracing::debug!(source = %name, kills_moved = result.kills_moved, "Reclassified source");
            total += result;
        }
        total
    }

    pub async fn shutdown(&mut self) {
        for (name, worker) in self.workers.drain() {
            if worker.is_finished() {
                tracing::warn!(source = %name, "Worker had already exited");
            }
            worker.stop().await;
        }
        tracing::info!("Monitor shut down");
    }
}
