//! Shared helpers for the integration tests: a deterministic engine over the
//! demo world, and direct world-level actors for tests that bypass the
//! command layer.
#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};

use mudforge::config::Config;
use mudforge::engine::queue::ConnectionId;
use mudforge::engine::Engine;
use mudforge::world::registry::World;
use mudforge::world::seed;
use mudforge::world::types::{
    EntityCore, LivingId, LivingKind, LivingRecord, LocationId, PRIV_WIZARD,
};

/// Engine over the demo world with a fixed RNG seed and timer ticks, so
/// nothing moves unless a test calls `tick()`.
pub fn engine() -> Engine {
    let mut config = Config::default();
    config.server.rng_seed = Some(7);
    Engine::new(config).unwrap()
}

pub fn login(engine: &mut Engine, name: &str, wizard: bool) -> (ConnectionId, LivingId) {
    let conn = ConnectionId::new();
    let player = engine.login(conn, name, wizard).unwrap();
    engine.drain_output(player);
    (conn, player)
}

/// Run one input line and return everything it printed to the player.
pub fn run(engine: &mut Engine, conn: ConnectionId, line: &str) -> String {
    let player = engine.player_for(conn).unwrap();
    engine.on_command(conn, line).unwrap();
    engine.drain_output(player).join("\n")
}

pub fn location_of(engine: &Engine, player: LivingId) -> LocationId {
    engine.world().living(player).unwrap().location
}

pub fn location(engine: &Engine, path: &str) -> LocationId {
    engine.world().location_by_path(path).unwrap()
}

/// Freshly seeded demo world without an engine on top.
pub fn demo_world() -> World {
    let mut world = World::new();
    seed::build_demo_world(&mut world);
    world
}

/// Add a bare player record directly to the graph, for world-level tests.
pub fn spawn_player(world: &mut World, name: &str, at: LocationId, wizard: bool) -> LivingId {
    let mut privileges = BTreeSet::new();
    if wizard {
        privileges.insert(PRIV_WIZARD.to_string());
    }
    world.add_living(LivingRecord {
        id: LivingId(0),
        core: EntityCore::new(name, name),
        location: at,
        inventory: Vec::new(),
        privileges,
        hints: Default::default(),
        wiretaps: Vec::new(),
        kind: LivingKind::Player {
            outbox: VecDeque::new(),
            story_completed: false,
        },
    })
}
