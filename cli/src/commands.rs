use std::io::Write;
use vcl_core::context::AppConfigExt;
use vcl_core::players::PlayerSummary;
use vcl_core::signal::{SourceSignal, TrackerSignal};
use vcl_core::stats::{Reclassified, ScopeSummary};

use crate::CliContext;

pub async fn start(ctx: &CliContext, source: Option<&str>) -> Result<(), String> {
    let name = ctx.source_name(source).await;
    ctx.monitor
        .lock()
        .await
        .start_source(&name)
        .await
        .map_err(|e| e.to_string())?;
    println!("Tracking {name}");
    Ok(())
}

pub async fn stop(ctx: &CliContext, source: Option<&str>) -> Result<(), String> {
    let name = ctx.source_name(source).await;
    ctx.monitor
        .lock()
        .await
        .stop_source(&name)
        .await
        .map_err(|e| e.to_string())?;
    println!("Stopped {name}");
    Ok(())
}

pub async fn status(ctx: &CliContext) -> Result<(), String> {
    let running = ctx.monitor.lock().await.running();
    if running.is_empty() {
        println!("No sources running");
        return Ok(());
    }

    println!("{:<14} {:<20} {:>12} {:<24} Vehicle", "Source", "Player", "Offset", "Server");
    println!("{}", "-".repeat(84));
    for name in running {
        let (_, tracker) = ctx.tracker(Some(&name)).await?;
        let tracker = tracker.lock().await;
        let player = match tracker.identity().player_name.as_str() {
            "" => "?",
            name => name,
        };
        let available = if tracker.is_source_available() { "" } else { " (log missing)" };
        println!(
            "{:<14} {:<20} {:>12} {:<24} {}{available}",
            name,
            player,
            tracker.offset(),
            tracker.server_id().unwrap_or("-"),
            tracker.current_vehicle().unwrap_or("-"),
        );
        if let Some(pending) = tracker.pending_session() {
            println!("  session switch pending: {pending} (answer with `session keep|reset`)");
        }
    }
    Ok(())
}

pub async fn stats(ctx: &CliContext, source: Option<&str>) -> Result<(), String> {
    let (name, tracker) = ctx.tracker(source).await?;
    let snapshot = tracker.lock().await.get_all_stats();

    println!(
        "{name} session since {} ({})",
        snapshot.session_start.format("%Y-%m-%d %H:%M"),
        if snapshot.session_id.is_empty() { "-" } else { &snapshot.session_id }
    );
    print_scope(ctx, "Session", &snapshot.session);
    print_scope(ctx, "Lifetime", &snapshot.lifetime);
    Ok(())
}

fn print_scope(ctx: &CliContext, label: &str, scope: &ScopeSummary) {
    println!();
    println!("{label}");
    println!("{}", "-".repeat(40));
    println!(
        "Kills {} (PvP {}, PvE {})  Deaths {} (PvP {})  K/D {:.2}",
        scope.total_kills, scope.pvp_kills, scope.pve_kills, scope.deaths, scope.pvp_deaths, scope.kd_ratio
    );

    let mut weapons: Vec<(&String, &u64)> = scope.weapon_kills.iter().collect();
    weapons.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !weapons.is_empty() {
        let names = ctx.lookups.weapons();
        println!("Top weapons:");
        for (weapon, count) in weapons.into_iter().take(5) {
            println!("  {:<36} {count}", names.display_name(weapon));
        }
    }

    let mut vehicles: Vec<(&String, &u64)> = scope.vehicle_kills.iter().collect();
    vehicles.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !vehicles.is_empty() {
        let names = ctx.lookups.vehicles();
        println!("Vehicles destroyed:");
        for (vehicle, count) in vehicles.into_iter().take(5) {
            println!("  {:<36} {count}", names.display_name(vehicle));
        }
    }
}

pub async fn events(ctx: &CliContext, source: Option<&str>, count: usize) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    let events = tracker.lock().await.get_recent_events(count);
    if events.is_empty() {
        println!("No events yet");
    }
    for event in events {
        println!("{event}");
    }
    Ok(())
}

pub async fn reset_session(ctx: &CliContext, source: Option<&str>, discard: bool) -> Result<(), String> {
    let (name, tracker) = ctx.tracker(source).await?;
    tracker.lock().await.reset_session(discard);
    if discard {
        println!("{name}: session reset and removed from lifetime totals");
    } else {
        println!("{name}: session reset");
    }
    Ok(())
}

pub async fn resolve_session(ctx: &CliContext, source: Option<&str>, keep: bool) -> Result<(), String> {
    let (name, tracker) = ctx.tracker(source).await?;
    let mut tracker = tracker.lock().await;
    let pending = tracker
        .pending_session()
        .map(str::to_string)
        .ok_or_else(|| format!("{name}: no session switch pending"))?;
    tracker.resolve_session_switch(keep, &pending);
    println!("{name}: now on session {pending}");
    Ok(())
}

pub fn npc_list(ctx: &CliContext) {
    for pattern in ctx.lookups.npcs().patterns() {
        println!("{pattern}");
    }
}

pub async fn npc_add(ctx: &CliContext, pattern: &str) -> Result<(), String> {
    let result = ctx.monitor.lock().await.add_npc_pattern(pattern).await;
    report_reclassified(pattern, result, "already known or empty")
}

pub async fn npc_remove(ctx: &CliContext, pattern: &str) -> Result<(), String> {
    let result = ctx.monitor.lock().await.remove_npc_pattern(pattern).await;
    report_reclassified(pattern, result, "not found")
}

fn report_reclassified(pattern: &str, result: Option<Reclassified>, missing: &str) -> Result<(), String> {
    let result = result.ok_or_else(|| format!("pattern '{pattern}' {missing}"))?;
    println!(
        "Reclassified: {} kills moved to PvE, {} attributions dropped",
        result.kills_moved, result.attributions_dropped
    );
    Ok(())
}

fn print_players(players: &[PlayerSummary]) {
    if players.is_empty() {
        println!("No players recorded");
        return;
    }
    println!("{:<28} {:>6} {:>6} {:>6} {:>9}  Last seen", "Player", "Kills", "Deaths", "K/D", "Vehicles");
    println!("{}", "-".repeat(80));
    for p in players {
        println!(
            "{:<28} {:>6} {:>6} {:>6.2} {:>9}  {}",
            p.player_name,
            p.kills_by_me,
            p.deaths_by_them,
            p.kd_ratio,
            p.total_my_vehicles_destroyed_by_them,
            p.last_encounter.format("%Y-%m-%d %H:%M")
        );
    }
}

pub async fn top_killers(ctx: &CliContext, source: Option<&str>, limit: usize) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    print_players(&tracker.lock().await.players().top_killers(limit));
    Ok(())
}

pub async fn top_victims(ctx: &CliContext, source: Option<&str>, limit: usize) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    print_players(&tracker.lock().await.players().top_victims(limit));
    Ok(())
}

pub async fn rivals(ctx: &CliContext, source: Option<&str>, min: u64) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    print_players(&tracker.lock().await.players().rivalries(min));
    Ok(())
}

pub async fn show_player(ctx: &CliContext, source: Option<&str>, player: &str) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    let tracker = tracker.lock().await;
    let summary = tracker
        .players()
        .summary(player)
        .ok_or_else(|| format!("no record of {player}"))?;
    print_players(std::slice::from_ref(&summary));

    if let Some(record) = tracker.players().get(player) {
        let weapons = ctx.lookups.weapons();
        for (label, tally) in [("Killed with", &record.kills_by_me), ("Died to", &record.deaths_by_them)] {
            for (weapon, count) in &tally.weapons {
                println!("  {label} {}: {count}", weapons.display_name(weapon));
            }
        }
    }
    Ok(())
}

/// Known weapons plus any id the source has counted, with display names.
pub async fn weapon_list(ctx: &CliContext, source: Option<&str>) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    let tracker = tracker.lock().await;
    let weapons = ctx.lookups.weapons();
    for (internal, display) in weapons.all_weapons(tracker.stats().used_weapons()) {
        let flag = if weapons.is_blacklisted(&internal) { " (blacklisted)" } else { "" };
        println!("{internal:<44} {display}{flag}");
    }
    Ok(())
}

pub async fn vehicle_list(ctx: &CliContext, source: Option<&str>) -> Result<(), String> {
    let (_, tracker) = ctx.tracker(source).await?;
    let tracker = tracker.lock().await;
    let vehicles = ctx.lookups.vehicles();
    for (internal, display) in vehicles.all_vehicles(tracker.stats().used_vehicles()) {
        println!("{internal:<44} {display}");
    }
    Ok(())
}

pub fn weapon_blacklist(ctx: &CliContext, weapon: &str) {
    if ctx.lookups.weapons_mut().add_to_blacklist(weapon) {
        println!("Kills with {weapon} are now ignored");
    } else {
        println!("{weapon} is already blacklisted");
    }
}

pub fn weapon_unblacklist(ctx: &CliContext, weapon: &str) {
    if ctx.lookups.weapons_mut().remove_from_blacklist(weapon) {
        println!("{weapon} removed from blacklist");
    } else {
        println!("{weapon} was not blacklisted");
    }
}

pub fn weapon_name(ctx: &CliContext, weapon: &str, display: &str) {
    ctx.lookups.weapons_mut().set_custom_name(weapon, display);
    println!("{weapon} -> {display}");
}

pub fn vehicle_name(ctx: &CliContext, vehicle: &str, display: &str) {
    ctx.lookups.vehicles_mut().set_custom_name(vehicle, display);
    println!("{vehicle} -> {display}");
}

pub fn vehicle_parent(ctx: &CliContext, vehicle: &str, parent: Option<&str>) {
    let parent = ctx
        .lookups
        .vehicles_mut()
        .set_parent_vehicle(vehicle, parent.unwrap_or(""));
    println!("{vehicle} counts under {parent}");
}

pub async fn set_log_path(ctx: &CliContext, source: &str, path: &str) -> Result<(), String> {
    let mut config = ctx.config.lock().await;
    config.set_log_path(source, path).map_err(|e| e.to_string())?;
    config.save().map_err(|e| e.to_string())?;
    println!("{source}: {path} (restart the source to apply)");
    Ok(())
}

pub async fn use_source(ctx: &CliContext, source: &str) -> Result<(), String> {
    let mut config = ctx.config.lock().await;
    if !config.set_current_source(source) {
        return Err(format!("unknown source {source}"));
    }
    config.save().map_err(|e| e.to_string())?;
    println!("Current source: {source}");
    Ok(())
}

pub async fn show_config(ctx: &CliContext) {
    let config = ctx.config.lock().await;
    println!("Current source: {}  Language: {}", config.current_source, config.language);
    for (name, source) in &config.sources {
        let player = if source.has_player() {
            format!("{} [{}]", source.player_name, source.player_id)
        } else {
            "-".to_string()
        };
        println!("  {name:<14} {player:<32} {}", source.log_path);
        if !source.game_version.is_empty() {
            println!("  {:<14} version {}", "", source.game_version);
        }
    }
}

/// One line per signal worth showing while the REPL waits for input.
pub fn print_signal(signal: &SourceSignal) {
    match &signal.signal {
        TrackerSignal::EventRecorded(event) => println!("[{}] {event}", signal.source),
        TrackerSignal::SessionSwitchPending { old, new } => println!(
            "[{}] session changed {old} -> {new}; answer with `session keep` or `session reset`",
            signal.source
        ),
        TrackerSignal::RolloverDetected => println!("[{}] server changed, session restarted", signal.source),
        _ => {}
    }
}

pub async fn exit(ctx: &CliContext) {
    ctx.monitor.lock().await.shutdown().await;
    let _ = write!(std::io::stdout(), "quitting...");
    let _ = std::io::stdout().flush();
}
