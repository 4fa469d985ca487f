//! Snapshot round-trips through a live engine: a mutated world survives
//! save/load byte-for-byte, and a restored engine picks up where the clock
//! left off.

mod common;

use common::{engine, location_of, login, run};
use mudforge::engine::Engine;
use mudforge::snapshot;

#[test]
fn mutated_world_survives_a_round_trip() {
    let mut engine = engine();
    let (conn, player) = login(&mut engine, "mia", false);

    // Leave some footprints: move, pick something up, open a door.
    run(&mut engine, conn, "south");
    run(&mut engine, conn, "take key");
    run(&mut engine, conn, "open door three");
    for _ in 0..5 {
        engine.tick();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.snapshot");
    snapshot::save(&path, engine.world(), engine.scheduler()).unwrap();

    let restored = snapshot::load(&path).unwrap();
    assert_eq!(&restored.world, engine.world());
    assert_eq!(&restored.scheduler, engine.scheduler());

    // The restored graph still knows where the player stands and what they
    // carry.
    let rec = restored.world.living(player).unwrap();
    assert_eq!(rec.location, location_of(&engine, player));
    assert_eq!(rec.inventory.len(), 1);
}

#[test]
fn restored_engine_keeps_clock_and_pending_work() {
    let mut first = engine();
    let (conn, _player) = login(&mut first, "mia", false);
    run(&mut first, conn, "south");
    run(&mut first, conn, "open door three");
    let pending = first.scheduler().pending_deferred();
    assert!(pending > 0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.snapshot");
    snapshot::save(&path, first.world(), first.scheduler()).unwrap();

    let snap = snapshot::load(&path).unwrap();
    let mut second = Engine::from_parts(
        first.config().clone(),
        snap.world,
        Some(snap.scheduler),
    )
    .unwrap();

    assert_eq!(second.scheduler().pending_deferred(), pending);
    assert_eq!(second.scheduler().game_time(), first.scheduler().game_time());

    // The pending door close still fires on the restored engine.
    for _ in 0..24 {
        second.tick();
    }
    assert_eq!(second.scheduler().pending_deferred(), 0);
}

#[test]
fn save_command_requests_a_snapshot() {
    let mut engine = engine();
    let (conn, _player) = login(&mut engine, "mia", false);
    let output = run(&mut engine, conn, "save");
    assert!(output.contains("Saving"));
    assert!(engine.take_save_request());
    assert!(!engine.take_save_request());
}
