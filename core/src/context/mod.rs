mod config;
mod error;
mod lookups;
mod monitor;
mod worker;

pub use config::{AppConfig, AppConfigExt, DEFAULT_SOURCES, SourceConfig};
pub use error::{ConfigError, MonitorError};
pub use lookups::{Lookups, NAMES_TABLE_FILE, NPC_FILE, VEHICLES_FILE, WEAPONS_FILE};
pub use monitor::Monitor;
pub use worker::{ERROR_BACKOFF, POLL_INTERVAL, SharedTracker, SourceWorker, WorkerTiming};
