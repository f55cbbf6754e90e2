use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use super::{AppConfig, AppConfigExt};
use crate::combat_log::ReaderError;
use crate::tracker::{ScanOutcome, Tracker};

pub type SharedTracker = Arc<Mutex<Tracker>>;

pub const POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    pub poll: Duration,
    /// Sleep after a failed cycle.
    pub backoff: Duration,
}

impl Default for WorkerTiming {
    fn default() -> Self {
        Self {
            poll: POLL_INTERVAL,
            backoff: ERROR_BACKOFF,
        }
    }
}

/// Config handle the worker writes learned identity into.
#[derive(Clone)]
pub(crate) struct ConfigSink {
    pub config: Arc<Mutex<AppConfig>>,
    /// Write through to disk after each change.
    pub persist: bool,
}

/// Polling task for one source. Stopping is cooperative: the flag is checked
/// at the top of each cycle, and a sleeping worker is woken early.
pub struct SourceWorker {
    tracker: SharedTracker,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SourceWorker {
    pub(crate) fn spawn(tracker: SharedTracker, timing: WorkerTiming, config: ConfigSink) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(run(
            tracker.clone(),
            timing,
            config,
            stop.clone(),
            wake.clone(),
        ));
        Self {
            tracker,
            stop,
            wake,
            handle,
        }
    }

    pub fn tracker(&self) -> SharedTracker {
        self.tracker.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop and wait for the in-flight cycle to finish.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Source worker ended abnormally");
        }
    }
}

async fn run(
    tracker: SharedTracker,
    timing: WorkerTiming,
    config: ConfigSink,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    let mut scanned = false;

    while !stop.load(Ordering::SeqCst) {
        let (source, result, identity) = {
            let mut tracker = tracker.lock().await;
            let result = if scanned {
                poll_once(&mut tracker).await
            } else {
                tracker.initial_scan().await.map(|lines| {
                    tracing::info!(source = %tracker.source(), lines, "Initial scan complete");
                })
            };
            (tracker.source().to_string(), result, tracker.take_identity_change())
        };

        if let Some(identity) = identity {
            sync_identity(&config, &source, &identity).await;
        }

        let delay = match result {
            Ok(()) => {
                scanned = true;
                timing.poll
            }
            Err(e) => {
                tracing::debug!(source = %source, error = %e, "Poll failed, backing off");
                timing.backoff
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wake.notified() => {}
        }
    }
}

/// Server change first, so lines after a new server marker land in the
/// fresh session.
async fn poll_once(tracker: &mut Tracker) -> Result<(), ReaderError> {
    tracker.check_rollover().await?;
    if let ScanOutcome::Rotated { lines } = tracker.parse_new_increment().await? {
        tracing::info!(source = %tracker.source(), lines, "Rescanned rotated log");
    }
    Ok(())
}

async fn sync_identity(sink: &ConfigSink, source: &str, identity: &vcl_types::SourceConfig) {
    let mut config = sink.config.lock().await;
    match config.apply_identity(source, identity) {
        Ok(true) if sink.persist => {
            if let Err(e) = config.save() {
                tracing::warn!(source, error = %e, "Failed to save player identity");
            }
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(source, error = %e, "Identity for unknown source"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Lookups;
    use crate::identity::NpcClassifier;
    use crate::names::{NamesTable, VehicleNames, WeaponNames};
    use crate::tracker::TrackerStorage;
    use std::io::Write;
    use vcl_types::SourceConfig;

    const LOGIN: &str = "<2025-06-01T18:00:01.000Z> [Notice] <AccountLoginCharacterStatus_Character> Character: createdAt 1 - updatedAt 2 - geid 200146295001 - accountId 123 - name Pilot_Me - state STATE_CURRENT\n";

    fn server(id: &str) -> String {
        format!("<2025-06-01T18:00:05.000Z> [Notice] Joined Server ID: {id}\n")
    }

    fn kill(secs: u32) -> String {
        format!(
            "<2025-06-01T18:{secs:02}:00.000Z> [Notice] <Actor Death> CActor::Kill: 'Ace123' [200146295176] in zone 'space' killed by 'Pilot_Me' [200146295001] using 'behr_rifle_ballistic_01_7299497977400' [Class behr_rifle_ballistic_01] with damage type 'Bullet' from direction x: 0, y: 0, z: 0 [Team_ActorTech][Actor]\n"
        )
    }

    fn tracker(dir: &tempfile::TempDir, log: &std::path::Path) -> Tracker {
        let table = Arc::new(NamesTable::default());
        Tracker::new(
            "LIVE",
            SourceConfig::with_log_path(log.to_string_lossy()),
            TrackerStorage::in_dir(dir.path(), "LIVE"),
            Lookups::new(
                NpcClassifier::with_patterns(["_NPC_"]),
                WeaponNames::new(table.clone()),
                VehicleNames::new(table),
            ),
        )
    }

    #[tokio::test]
    async fn kill_after_server_change_counts_in_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("Game.log");
        std::fs::write(&log, [LOGIN.to_string(), server("aaaa-1111"), kill(10)].concat()).unwrap();

        let mut tracker = tracker(&dir, &log);
        tracker.initial_scan().await.unwrap();
        poll_once(&mut tracker).await.unwrap();
        assert_eq!(tracker.server_id(), Some("aaaa-1111"));
        assert_eq!(tracker.stats().session().pvp_kills, 1);

        let mut file = std::fs::OpenOptions::new().append(true).open(&log).unwrap();
        file.write_all([server("bbbb-2222"), kill(20)].concat().as_bytes())
            .unwrap();
        poll_once(&mut tracker).await.unwrap();

        assert_eq!(tracker.server_id(), Some("bbbb-2222"));
        assert_eq!(tracker.stats().session().pvp_kills, 1);
        assert_eq!(tracker.stats().lifetime().pvp_kills, 2);
    }
}
