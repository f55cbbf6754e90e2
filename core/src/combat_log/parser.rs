use super::log_line::*;
use chrono::{DateTime, Utc};
use memchr::memmem;
use regex::{Captures, Regex, RegexBuilder};
use std::sync::LazyLock;


macro_rules! lazy_regex {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($re).ok());
    };
}

lazy_regex!(TIMESTAMP, r"^<(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)>");
lazy_regex!(SESSION, r"@session:\s+'([a-f0-9\-]+)'");
lazy_regex!(
    LOGIN,
    r"<AccountLoginCharacterStatus_Character>.*?geid (\d+).*?name ([^\s]+)"
);
lazy_regex!(ENV_SESSION, r"@env_session:\s+'[^-]+-[^-]+-alpha-(\d+)-(\d+)'");
lazy_regex!(
    KILL,
    r"CActor::Kill: '([^']+)' \[(\d+)\].*?killed by '([^']+)' \[(\d+)\].*?using '([^']+)' \[Class ([^\]]+)\].*?damage type '([^']+)'"
);
lazy_regex!(
    VEHICLE_DESTROY,
    r"CVehicle::OnAdvanceDestroyLevel: Vehicle '([^']+)' \[(\d+)\].*?advanced from destroy level (\d+) to (\d+) caused by '([^']+)' \[(\d+)\]"
);
lazy_regex!(
    VEHICLE_ENTER,
    r"CVehicle::Initialize::<lambda_1>::operator \(\): Local client node \[(\d+)\].*?granted control token for '([^']+)' \[(\d+)\]"
);
lazy_regex!(
    VEHICLE_EXIT,
    r"CVehicleMovementBase::ClearDriver: Local client node \[(\d+)\].*?releasing control token for '([^']+)' \[(\d+)\]"
);
lazy_regex!(
    RESPAWN,
    r"CSCPlayerPUSpawningComponent::UnregisterFromExternalSystems: Player '([^']+)' \[(\d+)\].*?lost reservation for spawnpoint ([^\s]+) \[(\d+)\]"
);
lazy_regex!(
    CORPSE,
    r"\[ACTOR STATE\]\[SSCActorStateCVars::LogCorpse\] Player '([^']+)' <remote client>: (IsCorpseEnabled: No\.|Running corpsify for corpse\.)"
);
lazy_regex!(
    ACTOR_STALL,
    r"<Actor stall> Actor stall detected, Player: ([^,]+), Type: downstream"
);

static SERVER_ID: LazyLock<Option<Regex>> = LazyLock::new(|| {
    RegexBuilder::new(r"Server.*?ID[:\s]+([a-f0-9\-]+)")
        .case_insensitive(true)
        .build()
        .ok()
});

/// Literal anchors checked with memmem before running the full pattern.
const MARKERS: &[(&str, Kind)] = &[
    ("CActor::Kill", Kind::Kill),
    ("OnAdvanceDestroyLevel", Kind::Destroy),
    ("granted control token", Kind::Mount),
    ("releasing control token", Kind::Dismount),
    ("lost reservation for spawnpoint", Kind::Respawn),
    ("LogCorpse", Kind::Corpse),
    ("<Actor stall>", Kind::ActorStall),
    ("@session:", Kind::Session),
    ("@env_session:", Kind::GameVersion),
    ("AccountLoginCharacterStatus_Character", Kind::Login),
];

#[derive(Debug, Clone, Copy)]
enum Kind {
    Kill,
    Destroy,
    Mount,
    Dismount,
    Respawn,
    Corpse,
    ActorStall,
    Session,
    GameVersion,
    Login,
}

fn captures<'a>(re: &LazyLock<Option<Regex>>, line: &'a str) -> Option<Captures<'a>> {
    re.as_ref()?.captures(line)
}

fn group(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Stateless line classifier. Lines that match no pattern yield `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogParser;

impl LogParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_line(&self, line: &str) -> Option<ParsedLine> {
        let bytes = line.as_bytes();
        let kind = MARKERS
            .iter()
            .find(|(marker, _)| memmem::find(bytes, marker.as_bytes()).is_some())
            .map(|(_, kind)| *kind)?;

        let line_kind = match kind {
            Kind::Kill => Self::parse_kill(line)?,
            Kind::Destroy => Self::parse_destroy(line)?,
            Kind::Mount => Self::parse_control(line, ControlAction::Mount)?,
            Kind::Dismount => Self::parse_control(line, ControlAction::Dismount)?,
            Kind::Respawn => {
                let caps = captures(&RESPAWN, line)?;
                LogLine::Respawn(RespawnLine {
                    player: group(&caps, 1),
                    player_id: group(&caps, 2),
                    spawnpoint: group(&caps, 3),
                })
            }
            Kind::Corpse => LogLine::Corpse {
                player: group(&captures(&CORPSE, line)?, 1),
            },
            Kind::ActorStall => LogLine::ActorStall {
                player: group(&captures(&ACTOR_STALL, line)?, 1).trim().to_string(),
            },
            Kind::Session => LogLine::Session(group(&captures(&SESSION, line)?, 1)),
            Kind::GameVersion => {
                let caps = captures(&ENV_SESSION, line)?;
                LogLine::GameVersion(format_game_version(
                    caps.get(1)?.as_str(),
                    caps.get(2)?.as_str(),
                ))
            }
            Kind::Login => {
                let caps = captures(&LOGIN, line)?;
                LogLine::Login {
                    id: group(&caps, 1),
                    name: group(&caps, 2),
                }
            }
        };

        Some(ParsedLine {
            timestamp: Self::parse_timestamp(line),
            line: line_kind,
        })
    }

    pub fn parse_timestamp(line: &str) -> Option<DateTime<Utc>> {
        let caps = captures(&TIMESTAMP, line)?;
        DateTime::parse_from_rfc3339(caps.get(1)?.as_str())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Server identifier marker, looked for in the tail window only.
    pub fn parse_server_id(line: &str) -> Option<String> {
        let caps = captures(&SERVER_ID, line)?;
        Some(group(&caps, 1))
    }

    fn parse_kill(line: &str) -> Option<LogLine> {
        let caps = captures(&KILL, line)?;
        Some(LogLine::Kill(KillLine {
            victim: group(&caps, 1),
            victim_id: group(&caps, 2),
            killer: group(&caps, 3),
            killer_id: group(&caps, 4),
            weapon_full: group(&caps, 5),
            weapon_class: group(&caps, 6),
            damage_type: group(&caps, 7),
        }))
    }

    fn parse_destroy(line: &str) -> Option<LogLine> {
        let caps = captures(&VEHICLE_DESTROY, line)?;
        Some(LogLine::VehicleDestroy(DestroyLine {
            vehicle: group(&caps, 1),
            vehicle_id: group(&caps, 2),
            from_level: caps.get(3)?.as_str().parse().ok()?,
            to_level: caps.get(4)?.as_str().parse().ok()?,
            caused_by: group(&caps, 5),
            caused_by_id: group(&caps, 6),
        }))
    }

    fn parse_control(line: &str, action: ControlAction) -> Option<LogLine> {
        let re = match action {
            ControlAction::Mount => &VEHICLE_ENTER,
            ControlAction::Dismount => &VEHICLE_EXIT,
        };
        let caps = captures(re, line)?;
        Some(LogLine::VehicleControl(ControlLine {
            action,
            client_id: group(&caps, 1),
            vehicle: group(&caps, 2),
            vehicle_id: group(&caps, 3),
        }))
    }
}

/// `432` + `10452200` -> `4.3.2 (Build 10452200)`.
fn format_game_version(digits: &str, build: &str) -> String {
    let version = if digits.len() >= 3 {
        let mut chars = digits.chars();
        let major = chars.next().unwrap_or_default();
        let minor = chars.next().unwrap_or_default();
        let patch = chars.next().unwrap_or_default();
        format!("{major}.{minor}.{patch}")
    } else {
        digits.to_string()
    };
    format!("{version} (Build {build})")
}
