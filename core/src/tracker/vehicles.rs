use chrono::{DateTime, TimeDelta, Utc};
use hashbrown::HashMap;

use super::Tracker;
use crate::combat_log::{ControlAction, ControlLine, DestroyLine};
use crate::identity::ActorKind;
use crate::signal::TrackerSignal;
use crate::timeline::{EventKind, EventRecord};

/// Owned vehicles left alone this long after dismount are forgotten.
pub const OWNERSHIP_TIMEOUT_MINUTES: i64 = 45;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedVehicle {
    pub internal_name: String,
    pub last_exit: Option<DateTime<Utc>>,
    /// Set once the loss was counted at destroy level 1.
    pub softdead: bool,
}

/// Vehicles the tracked player has mounted this run, keyed by instance id.
#[derive(Debug, Clone, Default)]
pub struct OwnedVehicles {
    entries: HashMap<String, OwnedVehicle>,
}

impl OwnedVehicles {
    /// Register or refresh a vehicle. Stale entries are expired first.
    pub fn mount(&mut self, vehicle_id: &str, internal_name: &str, at: DateTime<Utc>) {
        self.expire(at);
        self.entries.insert(
            vehicle_id.to_string(),
            OwnedVehicle {
                internal_name: internal_name.to_string(),
                last_exit: None,
                softdead: false,
            },
        );
    }

    pub fn dismount(&mut self, vehicle_id: &str, at: DateTime<Utc>) -> bool {
        match self.entries.get_mut(vehicle_id) {
            Some(entry) => {
                entry.last_exit = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&OwnedVehicle> {
        self.entries.get(vehicle_id)
    }

    pub fn mark_softdead(&mut self, vehicle_id: &str) {
        if let Some(entry) = self.entries.get_mut(vehicle_id) {
            entry.softdead = true;
        }
    }

    pub fn remove(&mut self, vehicle_id: &str) -> Option<OwnedVehicle> {
        self.entries.remove(vehicle_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn expire(&mut self, now: DateTime<Utc>) {
        let timeout = TimeDelta::minutes(OWNERSHIP_TIMEOUT_MINUTES);
        self.entries.retain(|id, entry| match entry.last_exit {
            Some(exit) if now - exit > timeout => {
                tracing::debug!(vehicle_id = %id, vehicle = %entry.internal_name, "Ownership expired");
                false
            }
            _ => true,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DestroyOutcome {
    /// We brought someone else's vehicle to softdead.
    VehicleKill,
    OwnSoftDead,
    OtherSoftDead,
    /// Own vehicle went straight to fulldead.
    OwnFullDead,
    /// Own vehicle reached fulldead after an earlier softdead.
    OwnFullDeadFinal,
    OtherFullDead,
    Informational,
}

/// `owned` is the softdead flag of the matching owned entry, if there is one.
pub(crate) fn classify_destroy(to_level: u32, owned: Option<bool>, caused_by_self: bool) -> DestroyOutcome {
    match (to_level, owned) {
        (1, None) if caused_by_self => DestroyOutcome::VehicleKill,
        (1, Some(_)) => DestroyOutcome::OwnSoftDead,
        (1, None) => DestroyOutcome::OtherSoftDead,
        (2, Some(true)) => DestroyOutcome::OwnFullDeadFinal,
        (2, Some(false)) => DestroyOutcome::OwnFullDead,
        (2, None) => DestroyOutcome::OtherFullDead,
        _ => DestroyOutcome::Informational,
    }
}

fn destroy_status(to_level: u32) -> String {
    match to_level {
        1 => "Softdead".to_string(),
        2 => "Fulldead".to_string(),
        n => format!("Level {n}"),
    }
}

impl Tracker {
    pub(super) fn handle_destroy(&mut self, destroy: &DestroyLine, at: DateTime<Utc>) {
        let status = destroy_status(destroy.to_level);
        let (parent, vehicle_name) = {
            let mut vehicles = self.lookups.vehicles_mut();
            let internal = vehicles.normalize(&destroy.vehicle);
            let parent = vehicles.discover_parent(&internal);
            (parent, vehicles.display_name(&internal))
        };
        let causer_kind = self.lookups.npcs().actor_kind(&destroy.caused_by);
        let destroyer = match causer_kind {
            ActorKind::Pdc => "PDC".to_string(),
            ActorKind::Npc => "NPC".to_string(),
            ActorKind::Player => destroy.caused_by.clone(),
        };

        let caused_by_self = self.player_id() == Some(destroy.caused_by_id.as_str());
        let owned = self.owned.get(&destroy.vehicle_id).map(|entry| entry.softdead);
        let is_own = owned.is_some();

        match classify_destroy(destroy.to_level, owned, caused_by_self) {
            DestroyOutcome::VehicleKill => {
                self.stats.record_vehicle_kill(&parent);
                self.record(
                    EventRecord::new(EventKind::Vehicle, format!("{vehicle_name} destroyed"), at)
                        .key("events.vehicle_destroyed")
                        .param("vehicle", &vehicle_name),
                );
                self.emit(TrackerSignal::StatsUpdated);
            }
            DestroyOutcome::OwnSoftDead => {
                self.record(
                    EventRecord::new(
                        EventKind::OwnVehicleSoftDead,
                        format!("Own vehicle {vehicle_name} is softdead (by {destroyer})"),
                        at,
                    )
                    .key("events.own_vehicle_softdead")
                    .param("vehicle", &vehicle_name)
                    .param("destroyer", &destroyer),
                );
                if causer_kind == ActorKind::Player {
                    self.stats.record_vehicle_loss(&parent, &destroy.caused_by);
                    self.players
                        .add_vehicle_destroyed_by_them(&destroy.caused_by, &parent, at);
                    self.emit(TrackerSignal::StatsUpdated);
                }
                self.owned.mark_softdead(&destroy.vehicle_id);
            }
            DestroyOutcome::OtherSoftDead => {
                self.record(
                    EventRecord::new(
                        EventKind::Vehicle,
                        format!("{vehicle_name} is {status} (by {destroyer})"),
                        at,
                    )
                    .key("events.vehicle_softdead")
                    .param("vehicle", &vehicle_name)
                    .param("status", &status)
                    .param("destroyer", &destroyer),
                );
            }
            DestroyOutcome::OwnFullDead => {
                self.record(
                    EventRecord::new(
                        EventKind::OwnVehicleFullDead,
                        format!("Own vehicle {vehicle_name} destroyed (by {destroyer})"),
                        at,
                    )
                    .key("events.own_vehicle_fulldead")
                    .param("vehicle", &vehicle_name)
                    .param("destroyer", &destroyer),
                );
                self.owned.remove(&destroy.vehicle_id);
            }
            DestroyOutcome::OwnFullDeadFinal => {
                self.record(
                    EventRecord::new(EventKind::OwnVehicleFullDead, format!("{vehicle_name} is fulldead"), at)
                        .key("events.own_vehicle_fulldead_final")
                        .param("vehicle", &vehicle_name),
                );
                self.owned.remove(&destroy.vehicle_id);
            }
            DestroyOutcome::OtherFullDead => {
                self.record(
                    EventRecord::new(EventKind::Vehicle, format!("{vehicle_name} is fulldead"), at)
                        .key("events.vehicle_fulldead")
                        .param("vehicle", &vehicle_name),
                );
            }
            DestroyOutcome::Informational => {
                tracing::debug!(vehicle = %vehicle_name, level = destroy.to_level, "Destroy level change");
            }
        }

        self.emit(TrackerSignal::VehicleDestroyed {
            vehicle: vehicle_name,
            status,
            caused_by: destroy.caused_by.clone(),
            is_own,
        });
    }

    /// Mount and dismount lines for the tracked client only.
    pub(super) fn handle_control(&mut self, control: &ControlLine, at: DateTime<Utc>) {
        if self.player_id() != Some(control.client_id.as_str()) {
            return;
        }
        let (internal, display) = {
            let vehicles = self.lookups.vehicles();
            let internal = vehicles.normalize(&control.vehicle);
            let display = vehicles.display_name(&internal);
            (internal, display)
        };

        let event = match control.action {
            ControlAction::Mount => {
                self.owned.mount(&control.vehicle_id, &internal, at);
                self.current_vehicle = Some(display.clone());
                EventRecord::new(EventKind::VehicleMount, format!("Entered {display}"), at)
                    .key("events.vehicle_mount")
            }
            ControlAction::Dismount => {
                self.owned.dismount(&control.vehicle_id, at);
                self.current_vehicle = None;
                EventRecord::new(EventKind::VehicleMount, format!("Left {display}"), at)
                    .key("events.vehicle_dismount")
            }
        };
        self.record(event.param("vehicle", &display));
        self.emit(self.player_signal());
    }
}
