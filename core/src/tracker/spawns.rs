use chrono::{DateTime, TimeDelta, Utc};
use hashbrown::HashMap;

use super::Tracker;
use crate::combat_log::RespawnLine;
use crate::timeline::{EventKind, EventRecord};

/// Duplicate respawn lines for one player inside this window are dropped.
pub const RESPAWN_COOLDOWN_SECS: i64 = 30;

#[derive(Debug, Clone, Default)]
pub struct RespawnCooldowns {
    last: HashMap<String, DateTime<Utc>>,
}

impl RespawnCooldowns {
    /// True when the respawn should be shown. Only admitted respawns restart
    /// the window.
    pub fn admit(&mut self, player: &str, at: DateTime<Utc>) -> bool {
        if let Some(previous) = self.last.get(player)
            && at - *previous < TimeDelta::seconds(RESPAWN_COOLDOWN_SECS)
        {
            return false;
        }
        self.last.insert(player.to_string(), at);
        true
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }
}

impl Tracker {
    /// `player`, unless it is the tracked player or no own name is known yet.
    fn other_player<'a>(&self, player: &'a str) -> Option<&'a str> {
        let own = self.identity.player_name.as_str();
        (!own.is_empty() && player != own).then_some(player)
    }

    pub(super) fn handle_respawn(&mut self, respawn: &RespawnLine, at: DateTime<Utc>) {
        let Some(player) = self.other_player(&respawn.player) else {
            return;
        };
        if respawn.spawnpoint.eq_ignore_ascii_case("unknown") || !self.spawns.admit(player, at) {
            return;
        }
        self.record(
            EventRecord::new(
                EventKind::Spawn,
                format!("{player} respawned at {}", respawn.spawnpoint),
                at,
            )
            .key("events.player_respawn")
            .param("player", player)
            .param("location", &respawn.spawnpoint)
            .timer(player, at),
        );
    }

    pub(super) fn handle_corpse(&mut self, player: &str, at: DateTime<Utc>) {
        let Some(player) = self.other_player(player) else {
            return;
        };
        self.record(
            EventRecord::new(EventKind::Corpse, format!("{player}'s body is now a corpse"), at)
                .key("events.player_corpse")
                .param("player", player),
        );
    }

    pub(super) fn handle_sighting(&mut self, player: &str, at: DateTime<Utc>) {
        let Some(player) = self.other_player(player) else {
            return;
        };
        self.record(
            EventRecord::new(EventKind::PlayerSpotted, format!("{player} spotted nearby"), at)
                .key("events.player_spotted")
                .param("player", player),
        );
    }
}
