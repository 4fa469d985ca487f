//! The engine: world, scheduler and command routing behind one facade.
//!
//! All world mutation funnels through [`Engine`], which the server drives
//! from a single task. Player reads and ticks never run concurrently with a
//! command, so no world lock exists anywhere.

pub mod commands;
pub mod dispatch;
pub mod queue;
pub mod wizard;

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::scheduler::{Scheduler, TickMethod};
use crate::world::errors::WorldError;
use crate::world::hints::HintJournal;
use crate::world::registry::World;
use crate::world::types::{EntityCore, LivingId, LivingKind, LivingRecord, PRIV_WIZARD};
use crate::world::{describe, notify, seed};

use dispatch::{CommandContext, CommandRegistry, DispatchOutcome, HelpEntry};
use queue::ConnectionId;

/// What the server should do after one command has been handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandResult {
    Continue,
    /// The player asked to leave.
    Quit,
    /// The player finished the story; the session ends after the final
    /// output is drained.
    StoryComplete,
}

pub struct Engine {
    world: World,
    scheduler: Scheduler,
    registry: CommandRegistry,
    help: Vec<HelpEntry>,
    config: Config,
    rng: StdRng,
    connections: BTreeMap<ConnectionId, LivingId>,
    save_requested: bool,
}

impl Engine {
    /// Build a fresh engine with the seeded demo world.
    pub fn new(config: Config) -> Result<Self> {
        let mut world = World::new();
        seed::build_demo_world(&mut world);
        Self::from_parts(config, world, None)
    }

    /// Build an engine around restored state. Heartbeat subscriptions ride
    /// along inside the scheduler, so nothing needs re-registering.
    pub fn from_parts(
        config: Config,
        world: World,
        scheduler: Option<Scheduler>,
    ) -> Result<Self> {
        config.validate()?;
        let scheduler = match scheduler {
            Some(s) => s,
            None => {
                let mut s = Scheduler::new(
                    config.story.epoch,
                    config.story.gametime_ratio,
                    config.server.tick_seconds,
                );
                for npc in world.heartbeat_npcs() {
                    s.subscribe(npc);
                }
                s
            }
        };

        let registry = CommandRegistry::standard().context("building command registry")?;
        let help = registry.help_entries();
        let rng = match config.server.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "engine ready: story '{}' by {}, tick {:?}",
            config.story.name, config.story.author, config.server.tick_method
        );
        Ok(Self {
            world,
            scheduler,
            registry,
            help,
            config,
            rng,
            connections: BTreeMap::new(),
            save_requested: false,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// True when a handler asked for a snapshot since the last call.
    pub fn take_save_request(&mut self) -> bool {
        std::mem::take(&mut self.save_requested)
    }

    /// Create a player for a new connection and put them at the configured
    /// start location.
    pub fn login(
        &mut self,
        conn: ConnectionId,
        name: &str,
        wizard: bool,
    ) -> Result<LivingId, WorldError> {
        let name = name.trim().to_lowercase();
        if name.is_empty() || self.world.find_player(&name).is_some() {
            return Err(WorldError::ActionRefused(format!(
                "The name '{name}' is not available."
            )));
        }

        let start_path = if wizard {
            &self.config.story.wizard_start_location
        } else {
            &self.config.story.start_location
        };
        let start = self
            .world
            .location_by_path(start_path)
            .ok_or_else(|| WorldError::NotFound(format!("start location '{start_path}'")))?;

        let mut privileges = BTreeSet::new();
        if wizard {
            privileges.insert(PRIV_WIZARD.to_string());
        }
        let mut hints = HintJournal::default();
        hints.init(seed::default_hints());

        let player = self.world.add_living(LivingRecord {
            id: LivingId(0),
            core: EntityCore::new(&name, &name).with_long_desc("A fellow adventurer."),
            location: start,
            inventory: Vec::new(),
            privileges,
            hints,
            wiretaps: Vec::new(),
            kind: LivingKind::Player {
                outbox: VecDeque::new(),
                story_completed: false,
            },
        });
        self.connections.insert(conn, player);
        info!("player '{name}' logged in as {player} ({conn})");

        let welcome = format!(
            "Welcome to {}, by {}.",
            self.config.story.name, self.config.story.author
        );
        notify::tell_living(&mut self.world, player, &welcome);
        if let Ok(text) = describe::look_around(&self.world, player) {
            notify::tell_living(&mut self.world, player, &text);
        }
        Ok(player)
    }

    pub fn player_for(&self, conn: ConnectionId) -> Option<LivingId> {
        self.connections.get(&conn).copied()
    }

    /// Tear a connection down; the player evaporates from the world, and
    /// anyone present sees them go.
    pub fn on_disconnect(&mut self, conn: ConnectionId) {
        if let Some(player) = self.connections.remove(&conn) {
            info!("{player} disconnected ({conn})");
            if let Ok(rec) = self.world.living(player) {
                let who = crate::world::capitalize(&rec.core.title);
                let location = rec.location;
                notify::tell_room(
                    &mut self.world,
                    location,
                    &format!("{who} suddenly shimmers and fades from sight."),
                    notify::TellOptions {
                        exclude: &[player],
                        ..Default::default()
                    },
                );
            }
            let _ = crate::world::movement::destroy_living(&mut self.world, player);
        }
    }

    /// Handle one raw input line for a connection's player.
    pub fn on_command(&mut self, conn: ConnectionId, line: &str) -> Result<CommandResult> {
        let player = self
            .connections
            .get(&conn)
            .copied()
            .ok_or_else(|| anyhow!("no player bound to {conn}"))?;

        let line = line.trim();
        if line.is_empty() {
            return Ok(CommandResult::Continue);
        }
        debug!("{player} input: {}", crate::logutil::escape_log(line));

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((v, r)) => (v.to_lowercase(), r.trim().to_string()),
            None => (line.to_lowercase(), String::new()),
        };

        let mut ctx = CommandContext {
            world: &mut self.world,
            scheduler: &mut self.scheduler,
            config: &self.config,
            help: &self.help,
            quit: false,
            save_requested: false,
        };

        let outcome = self.registry.dispatch(&mut ctx, player, &verb, &rest);
        let quit = ctx.quit;
        self.save_requested |= ctx.save_requested;

        let (result, accepted) = match outcome {
            DispatchOutcome::Handled => {
                let result = if quit {
                    CommandResult::Quit
                } else {
                    CommandResult::Continue
                };
                (result, true)
            }
            DispatchOutcome::StoryComplete => {
                self.complete_story(player);
                (CommandResult::StoryComplete, true)
            }
            DispatchOutcome::UnknownVerb => self.try_direction_shortcut(player, &verb)?,
        };

        // In command-driven mode the clock advances once per accepted input;
        // gibberish doesn't move time forward.
        if accepted && self.config.server.tick_method == TickMethod::Command {
            self.tick();
        }
        Ok(result)
    }

    /// A bare direction name works as a movement command. The second return
    /// value reports whether the input was accepted as a command at all.
    fn try_direction_shortcut(
        &mut self,
        player: LivingId,
        verb: &str,
    ) -> Result<(CommandResult, bool)> {
        let known_exit = commands::find_exit(&self.world, player, verb)
            .map_err(|e| anyhow!("direction lookup: {e}"))?
            .is_some();
        if !known_exit {
            notify::tell_living(&mut self.world, player, "Huh? Try 'help'.");
            return Ok((CommandResult::Continue, false));
        }

        let mut ctx = CommandContext {
            world: &mut self.world,
            scheduler: &mut self.scheduler,
            config: &self.config,
            help: &self.help,
            quit: false,
            save_requested: false,
        };
        match commands::go_direction(&mut ctx, player, verb) {
            Ok(()) => Ok((CommandResult::Continue, true)),
            Err(WorldError::StoryComplete) => {
                self.complete_story(player);
                Ok((CommandResult::StoryComplete, true))
            }
            Err(WorldError::Parse(msg)) | Err(WorldError::ActionRefused(msg)) => {
                notify::tell_living(&mut self.world, player, &msg);
                Ok((CommandResult::Continue, true))
            }
            Err(err) => Err(anyhow!("direction move failed: {err}")),
        }
    }

    fn complete_story(&mut self, player: LivingId) {
        let message = self.config.story.completion_message.clone();
        notify::tell_living(&mut self.world, player, &message);
        if let Ok(rec) = self.world.living_mut(player) {
            if let LivingKind::Player {
                story_completed, ..
            } = &mut rec.kind
            {
                *story_completed = true;
            }
        }
        info!("{player} completed the story");
    }

    /// Advance the game clock by one tick: run due deferred actions, then
    /// sweep heartbeats.
    pub fn tick(&mut self) {
        self.scheduler.tick(&mut self.world, &mut self.rng);
    }

    /// Drain a player's pending output lines.
    pub fn drain_output(&mut self, player: LivingId) -> Vec<String> {
        match self.world.living_mut(player) {
            Ok(rec) => rec.drain_output(),
            Err(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_engine() -> Engine {
        let mut config = Config::default();
        config.server.rng_seed = Some(42);
        Engine::new(config).expect("engine builds")
    }

    #[test]
    fn login_places_player_at_start() {
        let mut engine = test_engine();
        let conn = ConnectionId::new();
        let player = engine.login(conn, "mia", false).expect("login");
        let start = engine
            .world()
            .location_by_path(seed::START_LOCATION_PATH)
            .expect("start exists");
        assert_eq!(engine.world().living(player).expect("player").location, start);
        let output = engine.drain_output(player).join("\n");
        assert!(output.contains("Welcome"));
    }

    #[test]
    fn duplicate_player_name_is_refused() {
        let mut engine = test_engine();
        engine.login(ConnectionId::new(), "mia", false).expect("first login");
        assert!(engine.login(ConnectionId::new(), "Mia", false).is_err());
    }

    #[test]
    fn unknown_verb_gets_a_nudge() {
        let mut engine = test_engine();
        let conn = ConnectionId::new();
        let player = engine.login(conn, "mia", false).expect("login");
        engine.drain_output(player);
        let result = engine.on_command(conn, "frobnicate").expect("handled");
        assert_eq!(result, CommandResult::Continue);
        let output = engine.drain_output(player).join("\n");
        assert!(output.contains("Huh?"));
    }

    #[test]
    fn bare_direction_moves_the_player() {
        let mut engine = test_engine();
        let conn = ConnectionId::new();
        let player = engine.login(conn, "mia", false).expect("login");
        engine.drain_output(player);
        engine.on_command(conn, "north").expect("handled");
        let lane = engine
            .world()
            .location_by_path("town.lane")
            .expect("lane exists");
        assert_eq!(engine.world().living(player).expect("player").location, lane);
    }

    #[test]
    fn wizard_login_starts_in_the_tower() {
        let mut engine = test_engine();
        let conn = ConnectionId::new();
        let player = engine.login(conn, "merlin", true).expect("login");
        let hall = engine
            .world()
            .location_by_path(seed::WIZARD_START_LOCATION_PATH)
            .expect("hall exists");
        assert_eq!(engine.world().living(player).expect("player").location, hall);
        assert!(engine.world().living(player).expect("player").is_wizard());
    }

    #[test]
    fn disconnect_is_announced_to_the_room() {
        let mut engine = test_engine();
        let mia_conn = ConnectionId::new();
        engine.login(mia_conn, "mia", false).expect("login");
        let zoe = engine
            .login(ConnectionId::new(), "zoe", false)
            .expect("login");
        engine.drain_output(zoe);

        engine.on_disconnect(mia_conn);
        let heard = engine.drain_output(zoe).join("\n");
        assert!(heard.contains("Mia suddenly shimmers and fades from sight."));
    }

    #[test]
    fn unknown_verb_does_not_advance_the_clock() {
        let mut config = Config::default();
        config.server.rng_seed = Some(42);
        config.server.tick_method = TickMethod::Command;
        let mut engine = Engine::new(config).expect("engine builds");
        let conn = ConnectionId::new();
        engine.login(conn, "mia", false).expect("login");

        let before = engine.scheduler().game_time();
        engine.on_command(conn, "frobnicate").expect("handled");
        assert_eq!(engine.scheduler().game_time(), before);

        engine.on_command(conn, "look").expect("handled");
        assert!(engine.scheduler().game_time() > before);
    }

    #[test]
    fn nonwizard_is_refused_wizard_verbs() {
        let mut engine = test_engine();
        let conn = ConnectionId::new();
        let player = engine.login(conn, "mia", false).expect("login");
        engine.drain_output(player);
        engine.on_command(conn, "clone rat").expect("handled");
        let output = engine.drain_output(player).join("\n");
        assert!(output.contains("not allowed"));
    }
}
