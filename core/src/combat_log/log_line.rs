use chrono::{DateTime, Utc};

/// `CActor::Kill` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillLine {
    pub victim: String,
    pub victim_id: String,
    pub killer: String,
    pub killer_id: String,
    pub weapon_full: String,
    pub weapon_class: String,
    pub damage_type: String,
}

/// `CVehicle::OnAdvanceDestroyLevel` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyLine {
    pub vehicle: String,
    pub vehicle_id: String,
    pub from_level: u32,
    pub to_level: u32,
    pub caused_by: String,
    pub caused_by_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Mount,
    Dismount,
}

/// Control token granted or released for the local client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlLine {
    pub action: ControlAction,
    pub client_id: String,
    pub vehicle: String,
    pub vehicle_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespawnLine {
    pub player: String,
    pub player_id: String,
    pub spawnpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    Session(String),
    /// Formatted as `4.3.2 (Build 10452200)`.
    GameVersion(String),
    Login { name: String, id: String },
    Kill(KillLine),
    VehicleDestroy(DestroyLine),
    VehicleControl(ControlLine),
    Respawn(RespawnLine),
    Corpse { player: String },
    ActorStall { player: String },
}

impl LogLine {
    /// Session, version and login markers.
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            LogLine::Session(_) | LogLine::GameVersion(_) | LogLine::Login { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub timestamp: Option<DateTime<Utc>>,
    pub line: LogLine,
}
