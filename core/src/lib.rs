pub mod combat_log;
pub mod context;
pub mod identity;
pub mod ledger;
pub mod names;
pub mod players;
pub mod signal;
pub mod stats;
pub mod storage;
pub mod timeline;
pub mod tracker;

// Re-exports for convenience
pub use combat_log::{LogLine, LogParser, ParsedLine, Reader, ReaderError};
pub use context::{AppConfig, AppConfigExt, Lookups, Monitor, SharedTracker, SourceConfig};
pub use identity::{ActorKind, NpcClassifier};
pub use ledger::{CursorCheck, PositionLedger};
pub use names::{NamesTable, VehicleNames, VehicleParents, WeaponNames};
pub use players::{PlayerBook, PlayerSummary};
pub use signal::{ChannelSink, SignalHandler, SourceSignal, TrackerSignal};
pub use stats::{Reclassified, ScopeSummary, ScopedStats, StatsSnapshot, StatsStore};
pub use storage::StorageError;
pub use timeline::{EventKind, EventRecord, Timeline};
pub use tracker::{ScanOutcome, Tracker, TrackerStorage};
