//! Binary entrypoint for the mudforge CLI.
//!
//! Commands:
//! - `play [--name <who>] [--wizard] [--restore]` - run a single-player session
//! - `init` - create a starter `config.toml`
//! - `status` - print configuration and snapshot summary
//!
//! The session loop is the single mutation task: player input and timer
//! ticks are both handled here, one at a time, so commands never interleave
//! with a heartbeat sweep.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use mudforge::config::Config;
use mudforge::engine::queue::{CommandQueue, ConnectionId};
use mudforge::engine::{CommandResult, Engine};
use mudforge::scheduler::TickMethod;
use mudforge::snapshot;
use mudforge::world::types::LivingId;

#[derive(Parser)]
#[command(name = "mudforge")]
#[command(about = "A text-driven multiplayer world simulation engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo story on this terminal
    Play {
        /// Player name
        #[arg(short, long, default_value = "player")]
        name: String,

        /// Log in with the wizard privilege
        #[arg(short, long)]
        wizard: bool,

        /// Restore the world from the configured snapshot instead of
        /// seeding a fresh one
        #[arg(short, long)]
        restore: bool,
    },
    /// Write a starter configuration file
    Init,
    /// Show configuration and snapshot status
    Status,
}

fn init_logging(config_level: &str, verbose: u8) {
    let level = match verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            // Logging before the config exists falls back to the default
            // filter.
            init_logging("info", cli.verbose);
            if Path::new(&cli.config).exists() {
                anyhow::bail!("{} already exists, refusing to overwrite", cli.config);
            }
            Config::create_default(&cli.config).await?;
            println!("Wrote starter configuration to {}", cli.config);
            Ok(())
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config.logging.level, cli.verbose);
            print_status(&config);
            Ok(())
        }
        Commands::Play {
            name,
            wizard,
            restore,
        } => {
            let config = Config::load(&cli.config).await?;
            init_logging(&config.logging.level, cli.verbose);
            play(config, &name, wizard, restore).await
        }
    }
}

fn print_status(config: &Config) {
    println!("Story:    {} (by {})", config.story.name, config.story.author);
    println!(
        "Clock:    {:?} ticks, {}s per tick, ratio {}",
        config.server.tick_method, config.server.tick_seconds, config.story.gametime_ratio
    );
    let snapshot_path = Path::new(&config.server.snapshot_path);
    match snapshot_path.metadata() {
        Ok(meta) => println!(
            "Snapshot: {} ({} bytes)",
            snapshot_path.display(),
            meta.len()
        ),
        Err(_) => println!("Snapshot: {} (none)", snapshot_path.display()),
    }
}

fn build_engine(config: Config, restore: bool) -> Result<Engine> {
    if restore {
        let path = Path::new(&config.server.snapshot_path).to_path_buf();
        let snap = snapshot::load(&path)
            .with_context(|| format!("restoring snapshot from {}", path.display()))?;
        Engine::from_parts(config, snap.world, Some(snap.scheduler))
    } else {
        Engine::new(config)
    }
}

async fn play(config: Config, name: &str, wizard: bool, restore: bool) -> Result<()> {
    let tick_method = config.server.tick_method;
    let tick_seconds = config.server.tick_seconds;
    let snapshot_path = config.server.snapshot_path.clone();

    let mut engine = build_engine(config, restore)?;
    let conn = ConnectionId::new();
    let player = engine
        .login(conn, name, wizard)
        .map_err(|e| anyhow::anyhow!("login failed: {e}"))?;
    flush_output(&mut engine, player);

    // Reader task: stdin lines flow through a channel so the select below
    // stays the only place the world is touched.
    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let mut queue = CommandQueue::new();
    queue.ensure_connection(conn);
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs_f64(tick_seconds));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!("session started for '{name}'");
    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else {
                    info!("stdin closed, ending session");
                    break;
                };
                queue.push(conn, line);
                while let Some((active, line)) = queue.pop() {
                    let result = engine.on_command(active, &line)?;
                    flush_output(&mut engine, player);
                    if engine.take_save_request() {
                        save_world(&mut engine, &snapshot_path);
                    }
                    match result {
                        CommandResult::Continue => {}
                        CommandResult::Quit | CommandResult::StoryComplete => {
                            engine.on_disconnect(conn);
                            return Ok(());
                        }
                    }
                }
            }
            _ = ticker.tick(), if tick_method == TickMethod::Timer => {
                engine.tick();
                flush_output(&mut engine, player);
            }
        }
    }

    engine.on_disconnect(conn);
    Ok(())
}

fn save_world(engine: &mut Engine, path: &str) {
    let path = Path::new(path);
    if let Err(e) = snapshot::save(path, engine.world(), engine.scheduler()) {
        warn!("snapshot save failed: {e}");
    }
}

fn flush_output(engine: &mut Engine, player: LivingId) {
    for line in engine.drain_output(player) {
        println!("{line}");
    }
}
