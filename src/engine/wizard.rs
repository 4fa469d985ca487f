//! Administrative verbs, all gated on the wizard privilege.
//!
//! Targets are named the same way everywhere: a leading `.` selects a
//! catalog path (`.town.npc.rat`), anything else is matched against the
//! actor's surroundings and the player roster. The graph invariants hold for
//! wizards too; only the checks that are explicitly privilege-aware (cursed
//! removal, access hooks, door credentials) treat them specially.

use log::info;

use crate::world::capitalize;
use crate::world::errors::WorldError;
use crate::world::movement::{self, ItemDest};
use crate::world::notify::{self, TellOptions};
use crate::world::registry::{CatalogEntry, World};
use crate::world::types::{LivingId, LocationId, WiretapTarget, PRIV_WIZARD};

use super::dispatch::{CommandContext, CommandSpec};

const WIZARD_ONLY: &[&str] = &[PRIV_WIZARD];

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            verb: "clone",
            required_privileges: WIZARD_ONLY,
            help: "Clone an item or creature: clone rat, clone .town.items.newspaper.",
            handler: cmd_clone,
        },
        CommandSpec {
            verb: "destroy",
            required_privileges: WIZARD_ONLY,
            help: "Destroy an item or creature, contents and all.",
            handler: cmd_destroy,
        },
        CommandSpec {
            verb: "teleport",
            required_privileges: WIZARD_ONLY,
            help: "Teleport to a place or creature (teleport to rat, teleport .town.square), \
or summon a creature to you (teleport rat).",
            handler: cmd_teleport,
        },
        CommandSpec {
            verb: "wiretap",
            required_privileges: WIZARD_ONLY,
            help: "Listen in on a location or creature: wiretap rat, wiretap ., wiretap -clear.",
            handler: cmd_wiretap,
        },
        CommandSpec {
            verb: "catalog",
            required_privileges: WIZARD_ONLY,
            help: "List every registered world object by its catalog path.",
            handler: cmd_catalog,
        },
    ]
}

/// Resolve a wizard target name: catalog path, carried/nearby item, nearby
/// creature, or any player by name.
fn resolve_target(
    world: &World,
    actor: LivingId,
    name: &str,
) -> Result<CatalogEntry, WorldError> {
    let name = name.trim();
    if let Some(path) = name.strip_prefix('.') {
        return world.catalog_get(path).ok_or_else(|| {
            WorldError::ActionRefused(format!("There's nothing registered as '{path}'."))
        });
    }
    if let Some(item) = world.resolve_item(actor, name) {
        return Ok(CatalogEntry::Item(item));
    }
    let location = world.living(actor)?.location;
    if let Some(living) = world.find_living_at(location, name) {
        return Ok(CatalogEntry::Living(living));
    }
    // Wizard sight reaches the whole world, not just the current room.
    if let Some(living) = world
        .livings
        .values()
        .find(|l| l.core.answers_to(name))
        .map(|l| l.id)
    {
        return Ok(CatalogEntry::Living(living));
    }
    Err(WorldError::ActionRefused(format!(
        "You don't see any {name} here."
    )))
}

fn cmd_clone(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = rest.trim();
    if name.is_empty() {
        return Err(WorldError::Parse("Clone what?".to_string()));
    }

    let who = capitalize(&ctx.world.living(actor)?.core.title);
    let location = ctx.world.living(actor)?.location;

    match resolve_target(ctx.world, actor, name)? {
        CatalogEntry::Item(source) => {
            let copy = movement::clone_item(ctx.world, source, ItemDest::Living(actor))?;
            let title = ctx.world.item(copy)?.core.title.clone();
            info!("{actor} cloned item {source} -> {copy}");
            notify::tell_living(ctx.world, actor, &format!("You now have a copy: {title}."));
            notify::tell_room(
                ctx.world,
                location,
                &format!("{who} conjures up {title}, and quickly pockets it."),
                TellOptions {
                    exclude: &[actor],
                    ..Default::default()
                },
            );
        }
        CatalogEntry::Living(source) => {
            let copy = movement::clone_npc(ctx.world, source)?;
            // Fresh clones get their own heartbeat registration.
            ctx.scheduler.subscribe(copy);
            let title = ctx.world.living(copy)?.core.title.clone();
            info!("{actor} cloned creature {source} -> {copy}");
            notify::tell_room(
                ctx.world,
                location,
                &format!("{who} summons {title}."),
                TellOptions::default(),
            );
        }
        CatalogEntry::Location(_) => {
            return Err(WorldError::ActionRefused(
                "You can't clone a whole location.".to_string(),
            ));
        }
    }
    Ok(())
}

fn cmd_destroy(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = rest.trim();
    if name.is_empty() {
        return Err(WorldError::Parse("Destroy what?".to_string()));
    }

    let who = capitalize(&ctx.world.living(actor)?.core.title);
    let location = ctx.world.living(actor)?.location;

    match resolve_target(ctx.world, actor, name)? {
        CatalogEntry::Item(item) => {
            let title = ctx.world.item(item)?.core.title.clone();
            movement::destroy_item(ctx.world, item)?;
            info!("{actor} destroyed item {item}");
            notify::tell_living(
                ctx.world,
                actor,
                &format!("The {title} disappears in a tiny black hole."),
            );
            notify::tell_room(
                ctx.world,
                location,
                &format!("{who} makes {title} disappear in a tiny black hole."),
                TellOptions {
                    exclude: &[actor],
                    ..Default::default()
                },
            );
        }
        CatalogEntry::Living(victim) => {
            if victim == actor {
                return Err(WorldError::ActionRefused(
                    "You can't destroy yourself, are you insane?!".to_string(),
                ));
            }
            let title = ctx.world.living(victim)?.core.title.clone();
            let victim_location = ctx.world.living(victim)?.location;
            notify::tell_living(
                ctx.world,
                victim,
                &format!("{who} unmakes you with a wave of the hand."),
            );
            movement::destroy_living(ctx.world, victim)?;
            ctx.scheduler.unsubscribe(victim);
            info!("{actor} destroyed creature {victim}");
            notify::tell_room(
                ctx.world,
                victim_location,
                &format!("{title} disappears in a tiny black hole."),
                TellOptions::default(),
            );
        }
        CatalogEntry::Location(_) => {
            return Err(WorldError::ActionRefused(
                "Destroying whole locations is not supported.".to_string(),
            ));
        }
    }
    Ok(())
}

fn cmd_teleport(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let mut name = rest.trim();
    // "teleport to X" moves the wizard; "teleport X" summons X instead.
    let mut go_there = false;
    if let Some(stripped) = name.strip_prefix("to ") {
        go_there = true;
        name = stripped.trim();
    }
    if name.is_empty() {
        return Err(WorldError::Parse(
            "Teleport where? Use a .path, a creature's name, or @start.".to_string(),
        ));
    }

    let target = if name == "@start" {
        let loc = ctx
            .world
            .location_by_path(&ctx.config.story.start_location)
            .ok_or_else(|| {
                WorldError::NotFound(format!(
                    "start location '{}' is not registered",
                    ctx.config.story.start_location
                ))
            })?;
        CatalogEntry::Location(loc)
    } else {
        resolve_target(ctx.world, actor, name)?
    };

    match target {
        // A location can only be traveled to, never summoned.
        CatalogEntry::Location(dest) => teleport_self(ctx, actor, dest),
        CatalogEntry::Living(other) if go_there => {
            let dest = ctx.world.living(other)?.location;
            teleport_self(ctx, actor, dest)
        }
        CatalogEntry::Living(other) => {
            if other == actor {
                return Err(WorldError::ActionRefused(
                    "You're already there.".to_string(),
                ));
            }
            summon(ctx, actor, other)
        }
        CatalogEntry::Item(_) => Err(WorldError::ActionRefused(
            "You can't teleport into an item.".to_string(),
        )),
    }
}

fn teleport_self(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    dest: LocationId,
) -> Result<(), WorldError> {
    let who = capitalize(&ctx.world.living(actor)?.core.title);
    let source = ctx.world.living(actor)?.location;
    if source == dest {
        return Err(WorldError::ActionRefused(
            "You're already there.".to_string(),
        ));
    }

    notify::tell_room(
        ctx.world,
        source,
        &format!("{who} makes some gestures and a portal suddenly opens."),
        TellOptions::default(),
    );
    // Access hooks and doors are deliberately bypassed; the portal goes
    // where a wizard wills it.
    movement::move_living(ctx.world, actor, dest)?;
    info!("{actor} teleported to {dest}");
    notify::tell_room(
        ctx.world,
        dest,
        &format!("Suddenly, a shimmering portal opens and {who} steps out of it."),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );

    let text = crate::world::describe::look_around(ctx.world, actor)?;
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

/// Pull someone through a portal to the wizard's side, access hooks
/// bypassed.
fn summon(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    victim: LivingId,
) -> Result<(), WorldError> {
    let here = ctx.world.living(actor)?.location;
    let there = ctx.world.living(victim)?.location;
    if there == here {
        return Err(WorldError::ActionRefused(
            "They're already here.".to_string(),
        ));
    }

    let who = capitalize(&ctx.world.living(actor)?.core.title);
    let victim_title = capitalize(&ctx.world.living(victim)?.core.title);
    notify::tell_room(
        ctx.world,
        there,
        "Suddenly, a shimmering portal opens!",
        TellOptions::default(),
    );
    notify::tell_room(
        ctx.world,
        there,
        &format!("{victim_title} is sucked into it, and the portal quickly closes again."),
        TellOptions {
            specific_targets: &[victim],
            specific_message: Some("You are sucked into it!"),
            ..Default::default()
        },
    );
    movement::move_living(ctx.world, victim, here)?;
    info!("{actor} summoned {victim} to {here}");
    notify::tell_room(
        ctx.world,
        here,
        &format!("{who} makes some gestures and a portal suddenly opens."),
        TellOptions {
            exclude: &[victim],
            ..Default::default()
        },
    );
    notify::tell_room(
        ctx.world,
        here,
        &format!("{victim_title} tumbles out of it, and the portal quickly closes again."),
        TellOptions {
            exclude: &[victim],
            ..Default::default()
        },
    );
    if let Ok(text) = crate::world::describe::look_around(ctx.world, victim) {
        notify::tell_living(ctx.world, victim, &text);
    }
    Ok(())
}

fn cmd_wiretap(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = rest.trim();
    if name.is_empty() {
        let taps = ctx.world.living(actor)?.wiretaps.len();
        let text = if taps == 0 {
            "You aren't tapping anything. Use: wiretap <creature>, wiretap . (this room), \
             wiretap -clear."
                .to_string()
        } else {
            format!("You have {taps} wiretap(s) active. Use 'wiretap -clear' to remove them.")
        };
        notify::tell_living(ctx.world, actor, &text);
        return Ok(());
    }

    if name == "-clear" {
        ctx.world.living_mut(actor)?.wiretaps.clear();
        notify::tell_living(ctx.world, actor, "All wiretaps removed.");
        return Ok(());
    }

    let target = if name == "." {
        WiretapTarget::Location(ctx.world.living(actor)?.location)
    } else {
        match resolve_target(ctx.world, actor, name)? {
            CatalogEntry::Location(loc) => WiretapTarget::Location(loc),
            CatalogEntry::Living(living) => {
                if living == actor {
                    return Err(WorldError::ActionRefused(
                        "You can't wiretap yourself.".to_string(),
                    ));
                }
                WiretapTarget::Living(living)
            }
            CatalogEntry::Item(_) => {
                return Err(WorldError::ActionRefused(
                    "Items don't hear anything.".to_string(),
                ));
            }
        }
    };

    let taps = &mut ctx.world.living_mut(actor)?.wiretaps;
    if !taps.contains(&target) {
        taps.push(target);
    }
    info!("{actor} installed wiretap on {target:?}");
    notify::tell_living(ctx.world, actor, "You install a wiretap and listen closely.");
    Ok(())
}

fn cmd_catalog(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let mut locations = Vec::new();
    let mut items = Vec::new();
    let mut livings = Vec::new();
    for (path, entry) in ctx.world.catalog_iter() {
        match entry {
            CatalogEntry::Location(id) => locations.push(format!("  {path} ({id})")),
            CatalogEntry::Item(id) => items.push(format!("  {path} ({id})")),
            CatalogEntry::Living(id) => livings.push(format!("  {path} ({id})")),
        }
    }

    let mut lines = Vec::new();
    lines.push("Locations:".to_string());
    lines.extend(locations);
    lines.push("Items:".to_string());
    lines.extend(items);
    lines.push("Creatures:".to_string());
    lines.extend(livings);
    let text = lines.join("\n");
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}
