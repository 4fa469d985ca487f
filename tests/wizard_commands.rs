//! The administrative verb set: cloning, destruction, teleportation,
//! wiretaps and the catalog listing, plus the privilege gate in front of
//! them all.

mod common;

use common::{engine, location, location_of, login, run};
use mudforge::world::registry::CatalogEntry;

#[test]
fn nonwizard_is_refused_with_no_side_effects() {
    let mut engine = engine();
    let (conn, player) = login(&mut engine, "mia", false);
    let square = location(&engine, "town.square");

    let livings_before = engine.world().location(square).unwrap().livings.len();
    let output = run(&mut engine, conn, "clone rat");
    assert!(output.contains("not allowed"));
    assert_eq!(
        engine.world().location(square).unwrap().livings.len(),
        livings_before
    );

    let output = run(&mut engine, conn, "teleport .town.alley");
    assert!(output.contains("not allowed"));
    assert_eq!(location_of(&engine, player), square);
}

#[test]
fn clone_npc_creates_an_active_independent_copy() {
    let mut engine = engine();
    let (conn, _wiz) = login(&mut engine, "merlin", true);
    run(&mut engine, conn, "teleport .town.square");

    let rat = match engine.world().catalog_get("town.npc.rat").unwrap() {
        CatalogEntry::Living(id) => id,
        other => panic!("unexpected catalog entry: {other:?}"),
    };
    let square = location(&engine, "town.square");
    let before = engine.world().location(square).unwrap().livings.clone();

    let output = run(&mut engine, conn, "clone rat");
    assert!(output.contains("summons"));

    let after = engine.world().location(square).unwrap().livings.clone();
    assert_eq!(after.len(), before.len() + 1);
    let copy = *after.last().unwrap();
    assert_ne!(copy, rat);

    // The copy heartbeats on its own; the original is untouched.
    assert!(engine.scheduler().is_subscribed(copy));
    assert!(engine.scheduler().is_subscribed(rat));
    let original = engine.world().living(rat).unwrap();
    assert_eq!(original.location, square);
    assert_eq!(original.core.name, "rat");
}

#[test]
fn clone_item_lands_in_the_wizard_pocket() {
    let mut engine = engine();
    let (conn, wiz) = login(&mut engine, "merlin", true);

    let output = run(&mut engine, conn, "clone .town.items.newspaper");
    assert!(output.contains("You now have a copy"));
    assert_eq!(engine.world().living(wiz).unwrap().inventory.len(), 1);

    // The original still lies on the square.
    let square = location(&engine, "town.square");
    let names: Vec<String> = engine
        .world()
        .location(square)
        .unwrap()
        .items
        .iter()
        .map(|i| engine.world().item(*i).unwrap().core.name.clone())
        .collect();
    assert!(names.contains(&"newspaper".to_string()));
}

#[test]
fn destroy_removes_creature_and_inventory() {
    let mut engine = engine();
    let (conn, _wiz) = login(&mut engine, "merlin", true);
    run(&mut engine, conn, "teleport .town.square");

    let rat = match engine.world().catalog_get("town.npc.rat").unwrap() {
        CatalogEntry::Living(id) => id,
        other => panic!("unexpected catalog entry: {other:?}"),
    };

    let output = run(&mut engine, conn, "destroy rat");
    assert!(output.contains("black hole"));
    assert!(engine.world().living(rat).is_err());
    assert!(!engine.scheduler().is_subscribed(rat));

    let square = location(&engine, "town.square");
    assert!(!engine.world().location(square).unwrap().livings.contains(&rat));
}

#[test]
fn self_destruction_is_refused() {
    let mut engine = engine();
    let (conn, wiz) = login(&mut engine, "merlin", true);
    let output = run(&mut engine, conn, "destroy merlin");
    assert!(output.contains("insane"));
    assert!(engine.world().living(wiz).is_ok());
}

#[test]
fn teleport_targets_paths_creatures_and_start() {
    let mut engine = engine();
    let (conn, wiz) = login(&mut engine, "merlin", true);

    run(&mut engine, conn, "teleport .town.alley");
    assert_eq!(location_of(&engine, wiz), location(&engine, "town.alley"));

    // "to <creature>" jumps to wherever they are.
    run(&mut engine, conn, "teleport to rat");
    assert_eq!(location_of(&engine, wiz), location(&engine, "town.square"));

    let output = run(&mut engine, conn, "teleport @start");
    // Already at the start location: refused, by way of the cheap check.
    assert!(output.contains("already there"));

    run(&mut engine, conn, "teleport .wizardtower.hall");
    assert_eq!(
        location_of(&engine, wiz),
        location(&engine, "wizardtower.hall")
    );
}

#[test]
fn teleport_without_to_summons_the_target() {
    let mut engine = engine();
    let (wiz_conn, wiz) = login(&mut engine, "merlin", true);
    let (_mia_conn, mia) = login(&mut engine, "mia", false);
    let (_bob_conn, bob) = login(&mut engine, "bob", false);
    engine.drain_output(mia);
    engine.drain_output(bob);

    let wiz_saw = run(&mut engine, wiz_conn, "teleport mia");
    assert_eq!(location_of(&engine, mia), location_of(&engine, wiz));
    assert!(wiz_saw.contains("Mia tumbles out of it"));

    // The summoned player feels the pull personally; bystanders watch it
    // happen.
    let felt = engine.drain_output(mia).join("\n");
    assert!(felt.contains("You are sucked into it!"));
    assert!(felt.contains("[Tower hall]"));
    let watched = engine.drain_output(bob).join("\n");
    assert!(watched.contains("a shimmering portal opens"));
    assert!(watched.contains("Mia is sucked into it"));
    assert!(!watched.contains("You are sucked into it"));
}

#[test]
fn summoning_works_on_creatures_too() {
    let mut engine = engine();
    let (conn, wiz) = login(&mut engine, "merlin", true);

    let rat = match engine.world().catalog_get("town.npc.rat").unwrap() {
        CatalogEntry::Living(id) => id,
        other => panic!("unexpected catalog entry: {other:?}"),
    };
    run(&mut engine, conn, "teleport rat");
    assert_eq!(location_of(&engine, rat), location_of(&engine, wiz));
}

#[test]
fn destroying_an_item_is_announced_to_the_room() {
    let mut engine = engine();
    let (wiz_conn, _wiz) = login(&mut engine, "merlin", true);
    let (_mia_conn, mia) = login(&mut engine, "mia", false);
    run(&mut engine, wiz_conn, "teleport .town.square");
    engine.drain_output(mia);

    let output = run(&mut engine, wiz_conn, "destroy newspaper");
    assert!(output.contains("black hole"));
    let seen = engine.drain_output(mia).join("\n");
    assert!(seen.contains("Merlin makes a newspaper disappear in a tiny black hole."));
}

#[test]
fn wiretap_mirrors_room_traffic_to_the_listener() {
    let mut engine = engine();
    let (wiz_conn, wiz) = login(&mut engine, "merlin", true);
    let (mia_conn, _mia) = login(&mut engine, "mia", false);

    // Tap the square from the tower, then listen to what happens there.
    let output = run(&mut engine, wiz_conn, "wiretap .town.square");
    assert!(output.contains("listen closely"));

    run(&mut engine, mia_conn, "say hello there");
    let heard = engine.drain_output(wiz).join("\n");
    assert!(heard.contains("wiretap on"));
    assert!(heard.contains("hello there"));

    run(&mut engine, wiz_conn, "wiretap -clear");
    engine.drain_output(wiz);
    run(&mut engine, mia_conn, "say anyone?");
    assert!(engine.drain_output(wiz).is_empty());
}

#[test]
fn wiretapping_yourself_is_refused() {
    let mut engine = engine();
    let (conn, _wiz) = login(&mut engine, "merlin", true);
    let output = run(&mut engine, conn, "wiretap merlin");
    assert!(output.contains("can't wiretap yourself"));
}

#[test]
fn catalog_lists_registered_paths() {
    let mut engine = engine();
    let (conn, _wiz) = login(&mut engine, "merlin", true);
    let output = run(&mut engine, conn, "catalog");
    assert!(output.contains("town.square"));
    assert!(output.contains("town.npc.rat"));
    assert!(output.contains("town.items.key"));
    assert!(output.contains("wizardtower.hall"));
}
