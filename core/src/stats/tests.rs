use super::*;
use crate::names::VehicleParents;

/// Parents keyed by a fixed prefix, enough to exercise read-time aggregation.
struct PrefixParents;

impl VehicleParents for PrefixParents {
    fn parent_of(&self, vehicle: &str) -> String {
        match vehicle.strip_suffix("_QIG") {
            Some(base) => base.to_string(),
            None => vehicle.to_string(),
        }
    }
}

fn play_session(store: &mut StatsStore) {
    store.record_kill(true, "rifle", Some("Ace123"));
    store.record_kill(true, "rifle", Some("Ace123"));
    store.record_kill(false, "pistol", None);
    store.record_death("rifle", Some("Ace123"));
    store.record_death("hazard", None);
    store.record_vehicle_kill("ANVL_Arrow");
    store.record_vehicle_loss("DRAK_Cutlass_Black", "Ace123");
}

#[test]
fn mutations_hit_both_scopes() {
    let mut store = StatsStore::ephemeral();
    play_session(&mut store);

    assert_eq!(store.session(), store.lifetime());
    assert_eq!(store.session().pvp_kills, 2);
    assert_eq!(store.session().pve_kills, 1);
    assert_eq!(store.session().deaths, 2);
    assert_eq!(store.session().death_by_players["Ace123"], 1);
}

#[test]
fn discard_is_exact_inverse() {
    let mut store = StatsStore::ephemeral();
    play_session(&mut store);
    store.reset_session(false);
    let after_first = store.lifetime().clone();

    play_session(&mut store);
    store.record_kill(true, "knife", Some("Bob"));
    store.reset_session(true);

    assert_eq!(store.lifetime(), &after_first);
    assert_eq!(store.session(), &ScopedStats::default());
}

#[test]
fn reset_without_discard_keeps_lifetime() {
    let mut store = StatsStore::ephemeral();
    play_session(&mut store);
    store.reset_session(false);

    assert_eq!(store.session().total_kills(), 0);
    assert_eq!(store.lifetime().total_kills(), 3);
    assert!(store.session_id().is_empty());
}

#[test]
fn reclassify_moves_pvp_to_pve_and_is_one_directional() {
    let mut store = StatsStore::ephemeral();
    play_session(&mut store);
    let total_before = store.lifetime().total_kills();

    let mut npcs = NpcClassifier::with_patterns(Vec::<String>::new());
    npcs.add_pattern("Ace");
    let result = store.reclassify(&npcs);

    assert_eq!(result.kills_moved, 4);
    assert_eq!(store.lifetime().pvp_kills, 0);
    assert_eq!(store.lifetime().pve_kills, 3);
    assert_eq!(store.lifetime().total_kills(), total_before);
    assert!(store.lifetime().death_by_players.is_empty());
    assert!(store.lifetime().vehicle_losses_by_player.is_empty());
    // death count itself is untouched
    assert_eq!(store.lifetime().deaths, 2);

    npcs.remove_pattern("Ace");
    let result = store.reclassify(&npcs);
    assert!(result.is_empty());
    assert_eq!(store.lifetime().pvp_kills, 0);
}

#[test]
fn snapshot_derives_totals_and_aggregates_vehicles() {
    let mut store = StatsStore::ephemeral();
    store.record_vehicle_kill("ANVL_Arrow");
    store.record_vehicle_kill("ANVL_Arrow_QIG");
    store.record_vehicle_loss("ANVL_Arrow_QIG", "Ace123");
    store.record_vehicle_loss("ANVL_Arrow", "Ace123");
    store.record_kill(false, "rifle", None);
    store.record_death("rifle", Some("Ace123"));
    store.record_death("rifle", None);
    store.record_death("rifle", None);

    let snapshot = store.snapshot(&PrefixParents);
    let session = &snapshot.session;
    assert_eq!(session.vehicle_kills.len(), 1);
    assert_eq!(session.vehicle_kills["ANVL_Arrow"], 2);
    assert_eq!(session.vehicle_losses_by_player["Ace123"]["ANVL_Arrow"], 2);
    assert_eq!(session.total_kills, 1);
    assert_eq!(session.pvp_deaths, 1);
    assert_eq!(session.kd_ratio, 0.33);

    // raw storage keeps the variants apart
    assert_eq!(store.lifetime().vehicle_kills.len(), 2);
}

#[test]
fn store_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats_live.json");

    let mut store = StatsStore::load(&path);
    play_session(&mut store);
    store.set_session_id("abc-123");

    let reloaded = StatsStore::load(&path);
    assert_eq!(reloaded.session(), store.session());
    assert_eq!(reloaded.lifetime(), store.lifetime());
    assert_eq!(reloaded.session_id(), "abc-123");
    // lifetime scope never carries a session id
    assert!(reloaded.lifetime().session_id.is_empty());
}

#[test]
fn used_ids_cover_kills_deaths_and_losses() {
    let mut store = StatsStore::ephemeral();
    play_session(&mut store);
    assert_eq!(store.used_weapons(), vec!["hazard", "pistol", "rifle"]);
    assert_eq!(store.used_vehicles(), vec!["ANVL_Arrow", "DRAK_Cutlass_Black"]);
}
