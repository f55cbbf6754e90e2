//! Per-source log tracker.
//!
//! A `Tracker` owns everything derived from one log file: the read cursor,
//! session/lifetime stats, the player book and the recent-event timeline.
//! Lines are applied strictly in file order. Shared lookups are borrowed
//! briefly per line and never held while stats are written.

mod kills;
mod spawns;
mod vehicles;


pub use spawns::{RESPAWN_COOLDOWN_SECS, RespawnCooldowns};
pub use vehicles::{OWNERSHIP_TIMEOUT_MINUTES, OwnedVehicle, OwnedVehicles};

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::combat_log::{Batch, HEADER_LINES, LogLine, ParsedLine, Reader, ReaderError};
use crate::context::Lookups;
use crate::identity::NpcClassifier;
use crate::ledger::{CursorCheck, PositionLedger};
use crate::players::PlayerBook;
use crate::signal::{SignalHandler, TrackerSignal};
use crate::stats::{Reclassified, StatsSnapshot, StatsStore};
use crate::storage;
use crate::timeline::{EventKind, EventRecord, Timeline};
use vcl_types::SourceConfig;

/// Where a tracker keeps its per-source state. `None` entries stay in memory.
#[derive(Debug, Clone, Default)]
pub struct TrackerStorage {
    pub stats: Option<PathBuf>,
    pub position: Option<PathBuf>,
    pub players: Option<PathBuf>,
}

impl TrackerStorage {
    /// `stats_<source>.json`, `log_position_<source>.json` and
    /// `players_db_<source>.json` inside `dir`.
    pub fn in_dir(dir: &Path, source: &str) -> Self {
        Self {
            stats: Some(dir.join(storage::source_file("stats", source))),
            position: Some(dir.join(storage::source_file("log_position", source))),
            players: Some(dir.join(storage::source_file("players_db", source))),
        }
    }

    pub fn ephemeral() -> Self {
        Self::default()
    }
}

/// Result of one incremental poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// No complete new line since the last poll.
    Idle,
    Processed { lines: usize },
    /// The file shrank; it was rescanned from the start.
    Rotated { lines: usize },
}

pub struct Tracker {
    source: String,
    reader: Reader,
    identity: SourceConfig,
    identity_changed: bool,
    stats: StatsStore,
    players: PlayerBook,
    ledger: PositionLedger,
    lookups: Lookups,
    timeline: Timeline,
    handlers: Vec<Box<dyn SignalHandler>>,
    server_id: Option<String>,
    pending_session: Option<String>,
    current_vehicle: Option<String>,
    owned: OwnedVehicles,
    spawns: RespawnCooldowns,
    source_available: bool,
}

impl Tracker {
    pub fn new(source: &str, config: SourceConfig, storage: TrackerStorage, lookups: Lookups) -> Self {
        let stats = match &storage.stats {
            Some(path) => StatsStore::load(path),
            None => StatsStore::ephemeral(),
        };
        let mut players = match &storage.players {
            Some(path) => PlayerBook::load(path),
            None => PlayerBook::ephemeral(),
        };
        let ledger = match &storage.position {
            Some(path) => PositionLedger::load(path),
            None => PositionLedger::ephemeral(),
        };

        if !config.player_name.is_empty() && players.remove_player(&config.player_name) {
            tracing::info!(source, player = %config.player_name, "Removed own player from player book");
        }

        Self {
            source: source.to_string(),
            reader: Reader::new(&config.log_path),
            identity: config,
            identity_changed: false,
            stats,
            players,
            ledger,
            lookups,
            timeline: Timeline::default(),
            handlers: Vec::new(),
            server_id: None,
            pending_session: None,
            current_vehicle: None,
            owned: OwnedVehicles::default(),
            spawns: RespawnCooldowns::default(),
            source_available: true,
        }
    }

    pub fn add_signal_handler(&mut self, handler: Box<dyn SignalHandler>) {
        self.handlers.push(handler);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────────────────

    /// Scan the header window for identity markers, then either replay the
    /// whole file (no cursor or after rotation) or resume from the cursor.
    pub async fn initial_scan(&mut self) -> Result<usize, ReaderError> {
        let size = self.observe_size().await?;

        for parsed in self.reader.read_header(HEADER_LINES).await? {
            if parsed.line.is_header() {
                self.process_line(parsed);
            }
        }

        let lines = match self.ledger.validate(size) {
            CursorCheck::Resume(offset) if offset > 0 => {
                tracing::info!(source = %self.source, offset, "Resuming log scan");
                self.record(
                    EventRecord::new(EventKind::Info, format!("Resuming at byte {offset}"), Utc::now())
                        .key("events.session_resumed")
                        .param("offset", offset),
                );
                let batch = self.reader.read_from(offset).await?;
                self.apply_batch(batch)
            }
            check => {
                if check == CursorCheck::Rotated {
                    self.ledger.reset();
                }
                tracing::info!(source = %self.source, size, "Full log scan");
                self.record(
                    EventRecord::new(EventKind::Info, "Scanning full log", Utc::now())
                        .key("events.session_full_scan"),
                );
                let batch = self.reader.read_all()?;
                let lines = self.apply_batch(batch);
                self.record(
                    EventRecord::new(EventKind::Info, format!("Scanned {lines} lines"), Utc::now())
                        .key("events.initial_scan")
                        .param("line_count", lines),
                );
                lines
            }
        };

        self.emit(TrackerSignal::InitialScanComplete { lines });
        Ok(lines)
    }

    /// Apply every complete line appended since the cursor.
    pub async fn parse_new_increment(&mut self) -> Result<ScanOutcome, ReaderError> {
        let size = self.observe_size().await?;

        match self.ledger.validate(size) {
            CursorCheck::Rotated => {
                tracing::warn!(
                    source = %self.source,
                    size,
                    offset = self.ledger.offset(),
                    "Log shrank below cursor, rescanning"
                );
                self.ledger.reset();
                self.clear_transient();
                let lines = self.initial_scan().await?;
                Ok(ScanOutcome::Rotated { lines })
            }
            CursorCheck::Resume(offset) if offset == size => Ok(ScanOutcome::Idle),
            CursorCheck::Resume(offset) => {
                let batch = self.reader.read_from(offset).await?;
                match self.apply_batch(batch) {
                    0 => Ok(ScanOutcome::Idle),
                    lines => Ok(ScanOutcome::Processed { lines }),
                }
            }
        }
    }

    /// Compare the newest server id in the tail window with the last one
    /// seen. Returns true when the server changed and the session was rolled.
    pub async fn check_rollover(&mut self) -> Result<bool, ReaderError> {
        let Some(current) = self.reader.tail_server_id().await? else {
            return Ok(false);
        };

        let previous = match self.server_id.replace(current.clone()) {
            None => {
                tracing::debug!(source = %self.source, server = %current, "Server id recorded");
                return Ok(false);
            }
            Some(previous) if previous == current => return Ok(false),
            Some(previous) => previous,
        };

        tracing::info!(source = %self.source, from = %previous, to = %current, "Server swap detected");
        self.record(
            EventRecord::new(EventKind::Server, "Server swap detected", Utc::now())
                .key("events.server_swap")
                .param("old", &previous)
                .param("new", &current),
        );
        self.stats.reset_session(false);
        self.clear_transient();
        self.emit(TrackerSignal::RolloverDetected);
        self.emit(TrackerSignal::StatsUpdated);
        Ok(true)
    }

    async fn observe_size(&mut self) -> Result<u64, ReaderError> {
        match self.reader.size().await {
            Ok(size) => {
                if !self.source_available {
                    tracing::info!(source = %self.source, "Log file available again");
                    self.source_available = true;
                }
                Ok(size)
            }
            Err(e) => {
                if self.source_available {
                    self.source_available = false;
                    tracing::warn!(source = %self.source, error = %e, "Log file unavailable");
                    let path = e.path().display().to_string();
                    self.record(
                        EventRecord::new(EventKind::Error, format!("Log file not found: {path}"), Utc::now())
                            .key("events.log_not_found")
                            .param("path", path),
                    );
                }
                Err(e)
            }
        }
    }

    fn apply_batch(&mut self, batch: Batch) -> usize {
        let Batch {
            events,
            line_count,
            end_offset,
        } = batch;
        for parsed in events {
            self.process_line(parsed);
        }
        self.ledger.advance(end_offset);
        tracing::debug!(source = %self.source, lines = line_count, offset = end_offset, "Applied batch");
        line_count
    }

    fn process_line(&mut self, parsed: ParsedLine) {
        let at = parsed.timestamp.unwrap_or_else(Utc::now);
        match parsed.line {
            LogLine::Session(id) => self.apply_session(id, at),
            LogLine::GameVersion(version) => self.apply_game_version(version, at),
            LogLine::Login { name, id } => self.apply_login(name, id, at),
            LogLine::Kill(kill) => self.handle_kill(&kill, at),
            LogLine::VehicleDestroy(destroy) => self.handle_destroy(&destroy, at),
            LogLine::VehicleControl(control) => self.handle_control(&control, at),
            LogLine::Respawn(respawn) => self.handle_respawn(&respawn, at),
            LogLine::Corpse { player } => self.handle_corpse(&player, at),
            LogLine::ActorStall { player } => self.handle_sighting(&player, at),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Header markers
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_session(&mut self, id: String, at: DateTime<Utc>) {
        if self.stats.session_id() == id || self.pending_session.as_deref() == Some(id.as_str()) {
            return;
        }

        let stored = self.stats.session_id().to_string();
        if stored.is_empty() {
            self.stats.set_session_id(&id);
            self.record(
                EventRecord::new(EventKind::Info, format!("Session {id}"), at)
                    .key("events.session_started")
                    .param("session", &id),
            );
            return;
        }

        tracing::info!(source = %self.source, old = %stored, new = %id, "Session switch pending");
        self.record(
            EventRecord::new(EventKind::Info, format!("New session {id} detected"), at)
                .key("events.session_switch")
                .param("old", &stored)
                .param("new", &id),
        );
        self.pending_session = Some(id.clone());
        self.emit(TrackerSignal::SessionSwitchPending { old: stored, new: id });
    }

    fn apply_game_version(&mut self, version: String, at: DateTime<Utc>) {
        if self.identity.game_version == version {
            return;
        }
        tracing::info!(source = %self.source, version = %version, "Game version");
        self.record(
            EventRecord::new(EventKind::Info, format!("Game version {version}"), at)
                .key("events.game_version")
                .param("version", &version),
        );
        self.identity.game_version = version;
        self.identity_changed = true;
        self.emit(self.player_signal());
    }

    fn apply_login(&mut self, name: String, id: String, at: DateTime<Utc>) {
        if self.identity.player_name == name && self.identity.player_id == id {
            return;
        }
        tracing::info!(source = %self.source, player = %name, id = %id, "Player identified");
        self.players.remove_player(&name);
        self.record(
            EventRecord::new(EventKind::Player, format!("Player: {name} ({id})"), at)
                .key("events.player_identified")
                .param("name", &name)
                .param("id", &id),
        );
        self.identity.player_name = name;
        self.identity.player_id = id;
        self.identity_changed = true;
        self.emit(self.player_signal());
    }

    fn player_signal(&self) -> TrackerSignal {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        TrackerSignal::PlayerIdentified {
            name: non_empty(&self.identity.player_name),
            id: non_empty(&self.identity.player_id),
            game_version: non_empty(&self.identity.game_version),
            current_vehicle: self.current_vehicle.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Host operations
    // ─────────────────────────────────────────────────────────────────────────

    /// The newest `count` events, oldest first.
    pub fn get_recent_events(&self, count: usize) -> Vec<EventRecord> {
        self.timeline.recent(count)
    }

    pub fn get_all_stats(&self) -> StatsSnapshot {
        self.stats.snapshot(&*self.lookups.vehicles())
    }

    pub fn reset_session(&mut self, discard: bool) {
        self.stats.reset_session(discard);
        self.record(
            EventRecord::new(EventKind::Info, "Session reset", Utc::now())
                .key("events.session_reset")
                .param("discarded", discard),
        );
        self.emit(TrackerSignal::StatsUpdated);
    }

    pub fn set_session_id(&mut self, id: &str) {
        self.stats.set_session_id(id);
    }

    /// Answer a `SessionSwitchPending` signal. Keeping only swaps the id;
    /// otherwise the session restarts empty (lifetime is left alone).
    pub fn resolve_session_switch(&mut self, keep: bool, new_id: &str) {
        if !keep {
            self.stats.reset_session(false);
        }
        self.stats.set_session_id(new_id);
        self.pending_session = None;
        tracing::info!(source = %self.source, keep, session = new_id, "Session switch resolved");
        self.emit(TrackerSignal::StatsUpdated);
    }

    /// Re-evaluate stored names after the NPC patterns changed.
    pub fn reclassify(&mut self, npcs: &NpcClassifier) -> Reclassified {
        let result = self.stats.reclassify(npcs);
        self.players.remove_npcs(npcs);
        self.emit(TrackerSignal::StatsUpdated);
        result
    }

    /// Identity learned from the log since the last call, for the host to persist.
    pub fn take_identity_change(&mut self) -> Option<SourceConfig> {
        std::mem::take(&mut self.identity_changed).then(|| self.identity.clone())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn identity(&self) -> &SourceConfig {
        &self.identity
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn players(&self) -> &PlayerBook {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut PlayerBook {
        &mut self.players
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    pub fn offset(&self) -> u64 {
        self.ledger.offset()
    }

    pub fn server_id(&self) -> Option<&str> {
        self.server_id.as_deref()
    }

    pub fn pending_session(&self) -> Option<&str> {
        self.pending_session.as_deref()
    }

    pub fn current_vehicle(&self) -> Option<&str> {
        self.current_vehicle.as_deref()
    }

    pub fn owned_vehicles(&self) -> &OwnedVehicles {
        &self.owned
    }

    pub fn is_source_available(&self) -> bool {
        self.source_available
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn clear_transient(&mut self) {
        self.owned.clear();
        self.spawns.clear();
        self.current_vehicle = None;
    }

    fn record(&mut self, event: EventRecord) {
        self.timeline.push(event.clone());
        self.emit(TrackerSignal::EventRecorded(event));
    }

    fn emit(&mut self, signal: TrackerSignal) {
        for handler in &mut self.handlers {
            handler.handle_signal(&self.source, &signal);
        }
    }

    fn player_id(&self) -> Option<&str> {
        self.identity.has_player().then_some(self.identity.player_id.as_str())
    }
}
