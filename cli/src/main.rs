use clap::{Parser, Subcommand};
use std::io::Write;
use vcl_cli::CliContext;
use vcl_cli::commands;
use vcl_cli::logging;
use vcl_cli::readline;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();
    let (ctx, mut signals) = CliContext::new()?;

    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            commands::print_signal(&signal);
        }
    });

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                writeln!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "Star Citizen combat log tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a source
    Start { source: Option<String> },
    /// Stop tracking a source
    Stop { source: Option<String> },
    /// Running sources and their position
    Status,
    Stats {
        #[arg(short, long)]
        source: Option<String>,
    },
    Events {
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short = 'n', long, default_value_t = 20)]
        count: usize,
    },
    ResetSession {
        #[arg(short, long)]
        source: Option<String>,
        /// Also remove the session from lifetime totals
        #[arg(long)]
        discard: bool,
    },
    /// Answer a pending session switch
    Session {
        #[command(subcommand)]
        action: SessionAction,
        #[arg(short, long, global = true)]
        source: Option<String>,
    },
    Npc {
        #[command(subcommand)]
        action: NpcAction,
    },
    Players {
        #[command(subcommand)]
        action: PlayersAction,
        #[arg(short, long, global = true)]
        source: Option<String>,
    },
    Weapon {
        #[command(subcommand)]
        action: WeaponAction,
        #[arg(short, long, global = true)]
        source: Option<String>,
    },
    Vehicle {
        #[command(subcommand)]
        action: VehicleAction,
        #[arg(short, long, global = true)]
        source: Option<String>,
    },
    SetLogPath { source: String, path: String },
    /// Make a source the default for other commands
    Use { source: String },
    Config,
    Exit,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Keep stats and adopt the new session id
    Keep,
    /// Start a fresh session
    Reset,
}

#[derive(Subcommand)]
enum NpcAction {
    List,
    Add { pattern: String },
    Remove { pattern: String },
}

#[derive(Subcommand)]
enum PlayersAction {
    TopKillers {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    TopVictims {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    Rivals {
        #[arg(short, long, default_value_t = 3)]
        min: u64,
    },
    Show { player: String },
}

#[derive(Subcommand)]
enum WeaponAction {
    List,
    Blacklist { weapon: String },
    Unblacklist { weapon: String },
    Name { weapon: String, display: String },
}

#[derive(Subcommand)]
enum VehicleAction {
    List,
    Name { vehicle: String, display: String },
    /// Count a variant under another vehicle; omit the parent to undo
    Parent { vehicle: String, parent: Option<String> },
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "vcl".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Start { source }) => commands::start(ctx, source.as_deref()).await?,
        Some(Commands::Stop { source }) => commands::stop(ctx, source.as_deref()).await?,
        Some(Commands::Status) => commands::status(ctx).await?,
        Some(Commands::Stats { source }) => commands::stats(ctx, source.as_deref()).await?,
        Some(Commands::Events { source, count }) => {
            commands::events(ctx, source.as_deref(), *count).await?
        }
        Some(Commands::ResetSession { source, discard }) => {
            commands::reset_session(ctx, source.as_deref(), *discard).await?
        }
        Some(Commands::Session { action, source }) => {
            let keep = matches!(action, SessionAction::Keep);
            commands::resolve_session(ctx, source.as_deref(), keep).await?
        }
        Some(Commands::Npc { action }) => match action {
            NpcAction::List => commands::npc_list(ctx),
            NpcAction::Add { pattern } => commands::npc_add(ctx, pattern).await?,
            NpcAction::Remove { pattern } => commands::npc_remove(ctx, pattern).await?,
        },
        Some(Commands::Players { action, source }) => {
            let source = source.as_deref();
            match action {
                PlayersAction::TopKillers { limit } => commands::top_killers(ctx, source, *limit).await?,
                PlayersAction::TopVictims { limit } => commands::top_victims(ctx, source, *limit).await?,
                PlayersAction::Rivals { min } => commands::rivals(ctx, source, *min).await?,
                PlayersAction::Show { player } => commands::show_player(ctx, source, player).await?,
            }
        }
        Some(Commands::Weapon { action, source }) => match action {
            WeaponAction::List => commands::weapon_list(ctx, source.as_deref()).await?,
            WeaponAction::Blacklist { weapon } => commands::weapon_blacklist(ctx, weapon),
            WeaponAction::Unblacklist { weapon } => commands::weapon_unblacklist(ctx, weapon),
            WeaponAction::Name { weapon, display } => commands::weapon_name(ctx, weapon, display),
        },
        Some(Commands::Vehicle { action, source }) => match action {
            VehicleAction::List => commands::vehicle_list(ctx, source.as_deref()).await?,
            VehicleAction::Name { vehicle, display } => commands::vehicle_name(ctx, vehicle, display),
            VehicleAction::Parent { vehicle, parent } => {
                commands::vehicle_parent(ctx, vehicle, parent.as_deref())
            }
        },
        Some(Commands::SetLogPath { source, path }) => commands::set_log_path(ctx, source, path).await?,
        Some(Commands::Use { source }) => commands::use_source(ctx, source).await?,
        Some(Commands::Config) => commands::show_config(ctx).await,
        Some(Commands::Exit) => {
            commands::exit(ctx).await;
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
