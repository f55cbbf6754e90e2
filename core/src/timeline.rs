//! Bounded list of recent events shown to the user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

pub const MAX_EVENTS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "player")]
    Player,
    #[serde(rename = "pvp_kill")]
    PvpKill,
    #[serde(rename = "pve_kill")]
    PveKill,
    #[serde(rename = "death")]
    Death,
    #[serde(rename = "vehicle")]
    Vehicle,
    #[serde(rename = "vehicle-ownSD")]
    OwnVehicleSoftDead,
    #[serde(rename = "vehicle-ownFD")]
    OwnVehicleFullDead,
    #[serde(rename = "vehicle-mount")]
    VehicleMount,
    #[serde(rename = "spawn")]
    Spawn,
    #[serde(rename = "corpse")]
    Corpse,
    #[serde(rename = "player_spotted")]
    PlayerSpotted,
    #[serde(rename = "server")]
    Server,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Info => "info",
            EventKind::Error => "error",
            EventKind::Player => "player",
            EventKind::PvpKill => "pvp_kill",
            EventKind::PveKill => "pve_kill",
            EventKind::Death => "death",
            EventKind::Vehicle => "vehicle",
            EventKind::OwnVehicleSoftDead => "vehicle-ownSD",
            EventKind::OwnVehicleFullDead => "vehicle-ownFD",
            EventKind::VehicleMount => "vehicle-mount",
            EventKind::Spawn => "spawn",
            EventKind::Corpse => "corpse",
            EventKind::PlayerSpotted => "player_spotted",
            EventKind::Server => "server",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links an event to a running timer, e.g. time since a player respawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerLink {
    pub player: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub message: String,
    /// Localization key, e.g. `events.pvp_kill`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerLink>,
}

impl EventRecord {
    pub fn new(kind: EventKind, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            message_key: None,
            params: BTreeMap::new(),
            timestamp,
            timer: None,
        }
    }

    pub fn key(mut self, key: &str) -> Self {
        self.message_key = Some(key.to_string());
        self
    }

    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn timer(mut self, player: &str, started_at: DateTime<Utc>) -> Self {
        self.timer = Some(TimerLink {
            player: player.to_string(),
            started_at,
        });
        self
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%H:%M:%S"),
            self.kind,
            self.message
        )
    }
}

/// Oldest entries are evicted silently once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct Timeline {
    events: VecDeque<EventRecord>,
    capacity: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::with_capacity(MAX_EVENTS)
    }
}

impl Timeline {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: EventRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// The newest `count` events, oldest first.
    pub fn recent(&self, count: usize) -> Vec<EventRecord> {
        let skip = self.events.len().saturating_sub(count);
        self.events.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: usize) -> EventRecord {
        EventRecord::new(EventKind::Info, format!("event {n}"), Utc::now())
    }

    #[test]
    fn oldest_events_are_evicted() {
        let mut timeline = Timeline::with_capacity(3);
        for n in 0..5 {
            timeline.push(event(n));
        }
        assert_eq!(timeline.len(), 3);
        let messages: Vec<_> = timeline.recent(10).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["event 2", "event 3", "event 4"]);
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let mut timeline = Timeline::default();
        for n in 0..5 {
            timeline.push(event(n));
        }
        let messages: Vec<_> = timeline.recent(2).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["event 3", "event 4"]);
    }

    #[test]
    fn serializes_with_wire_names() {
        let record = EventRecord::new(EventKind::OwnVehicleSoftDead, "lost ship", Utc::now())
            .key("events.own_vehicle_softdead")
            .param("vehicle", "Anvil Arrow");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "vehicle-ownSD");
        assert_eq!(json["message_key"], "events.own_vehicle_softdead");
        assert_eq!(json["params"]["vehicle"], "Anvil Arrow");
        assert!(json.get("timer").is_none());
    }
}
