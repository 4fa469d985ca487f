//! The demo town that ships as a reference world.
//!
//! Only the start locations named by the configuration are required; the
//! rest is instructional set dressing exercising every engine feature:
//! policy-hooked containers, a cursed item, privilege-gated passage, an
//! alley of self-referential doors with a live status panel, and a locked
//! exit door whose key ends the story.

use std::collections::BTreeSet;

use crate::world::hints::Hint;
use crate::world::registry::{CatalogEntry, World};
use crate::world::types::{
    ArrivalEffect, ContainerPolicy, ContainerState, DoorState, DynamicDesc, EntityCore,
    ExitAccess, HintNudge, HoldPolicy, ItemId, ItemOwner, ItemRecord, LivingId, LivingKind,
    LivingRecord, LocationId, NpcBehavior, PRIV_WIZARD,
};

/// Catalog path of the player start location.
pub const START_LOCATION_PATH: &str = "town.square";

/// Catalog path of the wizard start location.
pub const WIZARD_START_LOCATION_PATH: &str = "wizardtower.hall";

/// Credential code shared by the Game Over door and its key.
pub const END_DOOR_CODE: u32 = 999;

fn plain_item(world: &mut World, core: EntityCore) -> ItemId {
    world.add_item(ItemRecord {
        id: ItemId(0),
        core,
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: None,
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    })
}

fn place_item(world: &mut World, item: ItemId, location: LocationId) {
    if let Ok(loc) = world.location_mut(location) {
        loc.items.push(item);
    }
    if let Ok(rec) = world.item_mut(item) {
        rec.owner = ItemOwner::Location(location);
    }
}

fn put_in_container(world: &mut World, item: ItemId, container: ItemId) {
    if let Ok(rec) = world.item_mut(container) {
        if let Some(state) = rec.container.as_mut() {
            state.contents.push(item);
        }
    }
    if let Ok(rec) = world.item_mut(item) {
        rec.owner = ItemOwner::Container(container);
    }
}

fn npc(
    world: &mut World,
    location: LocationId,
    core: EntityCore,
    heartbeat: bool,
    behavior: NpcBehavior,
) -> LivingId {
    world.add_living(LivingRecord {
        id: LivingId(0),
        core,
        location,
        inventory: Vec::new(),
        privileges: BTreeSet::new(),
        hints: Default::default(),
        wiretaps: Vec::new(),
        kind: LivingKind::Npc { heartbeat, behavior },
    })
}

/// Build the demo town into `world` and register its catalog entries.
pub fn build_demo_world(world: &mut World) {
    // ----- locations -------------------------------------------------------

    let square = world.add_location(
        EntityCore::new("Essglen Town square", "the town square").with_long_desc(
            "The old town square of Essglen. It is not much really, and narrow \
streets quickly lead away from the small fountain in the center.",
        ),
    );
    let lane = world.add_location(
        EntityCore::new("Lane of Magicks", "the lane").with_long_desc(
            "A long straight road leading to the horizon. Apart from a nearby small \
tower, you can't see any houses or other landmarks. The road seems to go on \
forever though.",
        ),
    );
    let alley = world.add_location(
        EntityCore::new("Alley of doors", "the alley")
            .with_long_desc("An alley filled with doors."),
    );
    if let Ok(loc) = world.location_mut(alley) {
        loc.arrival = ArrivalEffect::EchoOnReentry {
            message: "Weird. That door seemed to go back to the same place you came from."
                .to_string(),
        };
    }
    let game_end = world.add_location(
        EntityCore::new("Game End", "the end of the game")
            .with_long_desc("It seems like it is game over!"),
    );
    if let Ok(loc) = world.location_mut(game_end) {
        loc.arrival = ArrivalEffect::EndStory;
    }
    let tower_hall = world.add_location(
        EntityCore::new("Tower hall", "the wizard's tower hall").with_long_desc(
            "The echoing entrance hall of the wizard's tower. Arcane glyphs drift \
lazily across the walls.",
        ),
    );

    // ----- exits and doors -------------------------------------------------

    let north = world.add_exit(
        square,
        lane,
        "north",
        "A long straight lane leads north towards the horizon.",
    );
    world.alias_exit(square, "lane", north);
    world.add_exit(lane, square, "south", "The town square lies to the south.");

    let tower_entry = world.add_exit(
        lane,
        tower_hall,
        "west",
        "To the west is the wizard's tower. It seems to be protected by a force-field.",
    );
    if let Ok(exit) = world.exit_mut(tower_entry) {
        exit.access = ExitAccess::RequirePrivilege {
            privilege: PRIV_WIZARD.to_string(),
            refusal: "You can't go that way, the force-field is impenetrable.".to_string(),
            pass_message: Some("You pass through the force-field.".to_string()),
        };
    }
    world.add_exit(tower_hall, lane, "east", "The lane lies east, beyond the force-field.");

    let to_alley = world.add_exit(
        square,
        alley,
        "south",
        "There's an alley to the south. It looks like a very small alley, but you can walk through it.",
    );
    world.alias_exit(square, "alley", to_alley);
    world.add_exit(
        alley,
        square,
        "north",
        "You can go north which brings you back to the square.",
    );

    // Four doors that lead right back into the alley, wired to the panel
    // below.
    let alley_doors = [
        ("door one", "first door", false, true),
        ("door two", "second door", true, false),
        ("door three", "third door", false, false),
        ("door four", "fourth door", true, false),
    ];
    for (name, alias, locked, opened) in alley_doors {
        let exit = world.add_exit(
            alley,
            alley,
            name,
            &format!("There's a door marked '{name}'."),
        );
        if let Ok(rec) = world.exit_mut(exit) {
            rec.door = Some(DoorState::new(locked, opened));
        }
        world.alias_exit(alley, alias, exit);
    }

    // The exit door out of the game, and its independently-stateful mirror on
    // the far side. They share only the credential code.
    let end_door = world.add_exit(
        lane,
        game_end,
        "east",
        "To the east is a door with a sign 'Game Over' on it.",
    );
    world.alias_exit(lane, "door", end_door);
    let end_door_mirror = world.add_exit(game_end, lane, "west", "A door leads back west.");
    if let Ok(rec) = world.exit_mut(end_door) {
        rec.door = Some(DoorState {
            locked: true,
            opened: false,
            code: Some(END_DOOR_CODE),
            mirror: Some(end_door_mirror),
            unlock_hint: Some(HintNudge {
                state: "unlocked_enddoor".to_string(),
                notice: "The way to freedom lies before you!".to_string(),
            }),
        });
    }
    if let Ok(rec) = world.exit_mut(end_door_mirror) {
        rec.door = Some(DoorState {
            locked: true,
            opened: false,
            code: Some(END_DOOR_CODE),
            mirror: Some(end_door),
            unlock_hint: None,
        });
    }

    // ----- items ------------------------------------------------------------

    let cursed_gem = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("black gem", "a black gem").with_alias("gem"),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Cursed {
            refusal: "The gem is cursed! It sticks to your hand, you can't get rid of it!"
                .to_string(),
        },
        container: None,
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    });
    place_item(world, cursed_gem, square);

    let blue_gem = plain_item(
        world,
        EntityCore::new("blue gem", "a blue gem").with_alias("gem"),
    );
    place_item(world, blue_gem, square);

    let paper = plain_item(
        world,
        EntityCore::new("newspaper", "a newspaper")
            .with_alias("paper")
            .with_short_desc("Last day's newspaper lies on the floor."),
    );
    place_item(world, paper, square);

    let trashcan = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("trashcan", "a dented trashcan"),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: Some(ContainerState::open()),
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    });
    place_item(world, trashcan, square);

    let insert_only_box = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("box1", "box1 (a black box)").with_alias("black box"),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: Some(ContainerState {
            policy: ContainerPolicy::InsertOnly {
                refusal: "The box is cursed! You can't take anything out of it!".to_string(),
            },
            contents: Vec::new(),
        }),
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    });
    place_item(world, insert_only_box, square);

    let remove_only_box = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("box2", "box2 (a white box)").with_alias("white box"),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: Some(ContainerState {
            policy: ContainerPolicy::RemoveOnly {
                refusal: "No matter how hard you try, you can't fit that in the box.".to_string(),
            },
            contents: Vec::new(),
        }),
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    });
    place_item(world, remove_only_box, square);
    let boxed_gem = plain_item(
        world,
        EntityCore::new("white gem", "a white gem").with_alias("gem"),
    );
    put_in_container(world, boxed_gem, remove_only_box);

    let pouch = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("pouch", "a small leather pouch"),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: Some(ContainerState::open()),
        key_code: None,
        on_taken: None,
        dynamic_desc: None,
    });
    place_item(world, pouch, square);

    let clock = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("clock", "a clock")
            .with_short_desc("On the pavement lies a clock, it seems to be working still."),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: None,
        key_code: None,
        on_taken: None,
        dynamic_desc: Some(DynamicDesc::GameClock),
    });
    place_item(world, clock, square);

    let computer = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("computer", "a computer")
            .with_alias("keyboard")
            .with_alias("screen")
            .with_alias("wires")
            .with_short_desc("A computer is connected to the doors via a couple of wires.")
            .with_long_desc(
                "It seems to be connected to the four doors. There's also a small keyboard \
to type commands. On the side of the screen there's a large sticker with 'say hello' \
written on it.",
            ),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Fixed {
            refusal: "You can't move the computer.".to_string(),
        },
        container: None,
        key_code: None,
        on_taken: None,
        dynamic_desc: Some(DynamicDesc::DoorPanel {
            exits: vec![
                "door one".to_string(),
                "door two".to_string(),
                "door three".to_string(),
                "door four".to_string(),
            ],
        }),
    });
    place_item(world, computer, alley);

    let door_key = world.add_item(ItemRecord {
        id: ItemId(0),
        core: EntityCore::new("key", "a key")
            .with_long_desc("A key with a little label marked 'Game Over'."),
        owner: ItemOwner::Nowhere,
        hold: HoldPolicy::Portable,
        container: None,
        key_code: Some(END_DOOR_CODE),
        on_taken: Some(HintNudge {
            state: "got_doorkey".to_string(),
            notice: "You've found something that might open the exit.".to_string(),
        }),
        dynamic_desc: None,
    });
    place_item(world, door_key, alley);

    // ----- NPCs -------------------------------------------------------------

    let crier = npc(
        world,
        square,
        EntityCore::new("laish", "Laish the town crier")
            .with_alias("crier")
            .with_alias("town crier")
            .with_long_desc(
                "The town crier of Essglen is awfully quiet today. She seems rather \
preoccupied with something.",
            ),
        true,
        NpcBehavior::Chatter {
            lines: vec![
                "Laish the town crier shouts: 'Hear ye, hear ye!'".to_string(),
                "Laish the town crier looks around for an audience.".to_string(),
            ],
            chance_percent: 20,
            next_line: 0,
        },
    );

    let idiot = npc(
        world,
        square,
        EntityCore::new("idiot", "the blubbering idiot").with_long_desc(
            "This person's engine is running but there is nobody behind the wheel. \
Anyway you get the idea: it's an idiot.",
        ),
        true,
        NpcBehavior::Chatter {
            lines: vec![
                "The blubbering idiot drools on his shirt.".to_string(),
                "The blubbering idiot giggles at nothing in particular.".to_string(),
            ],
            chance_percent: 30,
            next_line: 0,
        },
    );

    let rat = npc(
        world,
        square,
        EntityCore::new("rat", "a filthy rat").with_long_desc(
            "A filthy looking rat. Its whiskers tremble slightly as it peers back at you.",
        ),
        true,
        NpcBehavior::Wander { chance_percent: 25 },
    );

    let ant = npc(
        world,
        square,
        EntityCore::new("ant", "a single ant")
            .with_short_desc("A single ant seems to have lost its way."),
        false,
        NpcBehavior::Passive,
    );

    // ----- catalog ----------------------------------------------------------

    world.register(START_LOCATION_PATH, CatalogEntry::Location(square));
    world.register("town.lane", CatalogEntry::Location(lane));
    world.register("town.alley", CatalogEntry::Location(alley));
    world.register("town.game_end", CatalogEntry::Location(game_end));
    world.register(WIZARD_START_LOCATION_PATH, CatalogEntry::Location(tower_hall));
    world.register("town.npc.laish", CatalogEntry::Living(crier));
    world.register("town.npc.idiot", CatalogEntry::Living(idiot));
    world.register("town.npc.rat", CatalogEntry::Living(rat));
    world.register("town.npc.ant", CatalogEntry::Living(ant));
    world.register("town.items.computer", CatalogEntry::Item(computer));
    world.register("town.items.key", CatalogEntry::Item(door_key));
    world.register("town.items.newspaper", CatalogEntry::Item(paper));
    world.register("town.items.black_gem", CatalogEntry::Item(cursed_gem));
    world.register("town.items.blue_gem", CatalogEntry::Item(blue_gem));
    world.register("town.items.white_gem", CatalogEntry::Item(boxed_gem));
    world.register("town.items.trashcan", CatalogEntry::Item(trashcan));
    world.register("town.items.box1", CatalogEntry::Item(insert_only_box));
    world.register("town.items.box2", CatalogEntry::Item(remove_only_box));
    world.register("town.items.pouch", CatalogEntry::Item(pouch));
    world.register("town.items.clock", CatalogEntry::Item(clock));
}

/// Hints installed on every new player.
pub fn default_hints() -> Vec<Hint> {
    vec![
        Hint::new(
            None,
            "Find a way to open the door that leads to the exit of the game.",
        ),
        Hint::new(
            Some("got_doorkey"),
            "That key looks like it fits the door out on the lane.",
        ),
        Hint::new(
            Some("unlocked_enddoor"),
            "Step out through the door into the freedom!",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_world_registers_required_locations() {
        let mut world = World::new();
        build_demo_world(&mut world);
        assert!(world.location_by_path(START_LOCATION_PATH).is_some());
        assert!(world.location_by_path(WIZARD_START_LOCATION_PATH).is_some());
        assert!(world.location_by_path("town.alley").is_some());
        assert!(world.location_by_path("town.game_end").is_some());
    }

    #[test]
    fn square_items_are_cataloged() {
        let mut world = World::new();
        build_demo_world(&mut world);
        for path in [
            "town.items.newspaper",
            "town.items.black_gem",
            "town.items.blue_gem",
            "town.items.trashcan",
            "town.items.box1",
            "town.items.box2",
            "town.items.pouch",
            "town.items.clock",
            "town.items.computer",
            "town.items.key",
        ] {
            assert!(
                matches!(world.catalog_get(path), Some(CatalogEntry::Item(_))),
                "{path} missing from the catalog"
            );
        }
    }

    #[test]
    fn end_door_and_mirror_share_only_the_code() {
        let mut world = World::new();
        build_demo_world(&mut world);
        let lane = world.location_by_path("town.lane").unwrap();
        let game_end = world.location_by_path("town.game_end").unwrap();

        let end_exit = *world.location(lane).unwrap().exits.get("east").unwrap();
        let mirror_exit = *world.location(game_end).unwrap().exits.get("west").unwrap();
        let door = world.exit(end_exit).unwrap().door.clone().unwrap();
        let mirror = world.exit(mirror_exit).unwrap().door.clone().unwrap();

        assert_eq!(door.code, Some(END_DOOR_CODE));
        assert_eq!(mirror.code, Some(END_DOOR_CODE));
        assert_eq!(door.mirror, Some(mirror_exit));
        assert_eq!(mirror.mirror, Some(end_exit));
    }

    #[test]
    fn alley_doors_cover_the_state_space() {
        let mut world = World::new();
        build_demo_world(&mut world);
        let alley = world.location_by_path("town.alley").unwrap();
        let loc = world.location(alley).unwrap();
        let states: Vec<(bool, bool)> = ["door one", "door two", "door three", "door four"]
            .iter()
            .map(|name| {
                let exit = loc.exits.get(*name).unwrap();
                let door = world.exit(*exit).unwrap().door.clone().unwrap();
                (door.locked, door.opened)
            })
            .collect();
        assert_eq!(
            states,
            vec![(false, true), (true, false), (false, false), (true, false)]
        );
    }
}
