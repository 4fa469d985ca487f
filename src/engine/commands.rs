//! The standard player verbs.
//!
//! Every handler follows the same shape: parse the rest of the line, run the
//! checks-before-effects world operations, then tell the involved parties.
//! Refusals surface as [`WorldError`] variants and are translated by the
//! dispatcher; a handler never prints a refusal itself.

use crate::world::capitalize;
use crate::world::describe;
use crate::world::errors::WorldError;
use crate::world::movement::{self, ItemDest};
use crate::world::notify::{self, TellOptions};
use crate::world::passage;
use crate::world::registry::World;
use crate::world::types::{DynamicDesc, ExitId, ItemId, LivingId, LocationId};

use super::dispatch::{CommandContext, CommandSpec};

/// How long an opened door stays open before the world pulls it shut, in
/// game seconds.
const DOOR_AUTOCLOSE_GAME_SECS: u64 = 120;

pub fn specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            verb: "look",
            required_privileges: &[],
            help: "Look around the room.",
            handler: cmd_look,
        },
        CommandSpec {
            verb: "examine",
            required_privileges: &[],
            help: "Examine an item or creature closely.",
            handler: cmd_examine,
        },
        CommandSpec {
            verb: "go",
            required_privileges: &[],
            help: "Go in some direction (you can also type the direction itself).",
            handler: cmd_go,
        },
        CommandSpec {
            verb: "take",
            required_privileges: &[],
            help: "Take an item, optionally out of a container: take gem from box.",
            handler: cmd_take,
        },
        CommandSpec {
            verb: "drop",
            required_privileges: &[],
            help: "Drop an item you are carrying.",
            handler: cmd_drop,
        },
        CommandSpec {
            verb: "put",
            required_privileges: &[],
            help: "Put an item in a container: put gem in box.",
            handler: cmd_put,
        },
        CommandSpec {
            verb: "inventory",
            required_privileges: &[],
            help: "List what you are carrying.",
            handler: cmd_inventory,
        },
        CommandSpec {
            verb: "open",
            required_privileges: &[],
            help: "Open a door.",
            handler: cmd_open,
        },
        CommandSpec {
            verb: "close",
            required_privileges: &[],
            help: "Close a door.",
            handler: cmd_close,
        },
        CommandSpec {
            verb: "unlock",
            required_privileges: &[],
            help: "Unlock a door, with a key if you have the right one.",
            handler: cmd_unlock,
        },
        CommandSpec {
            verb: "lock",
            required_privileges: &[],
            help: "Lock a door.",
            handler: cmd_lock,
        },
        CommandSpec {
            verb: "type",
            required_privileges: &[],
            help: "Type a command on a machine: type unlock door two.",
            handler: cmd_type,
        },
        CommandSpec {
            verb: "enter",
            required_privileges: &[],
            help: "Enter a command on a machine (same as type).",
            handler: cmd_type,
        },
        CommandSpec {
            verb: "hack",
            required_privileges: &[],
            help: "Attempt to hack an electronic device.",
            handler: cmd_hack,
        },
        CommandSpec {
            verb: "say",
            required_privileges: &[],
            help: "Say something out loud.",
            handler: cmd_say,
        },
        CommandSpec {
            verb: "hint",
            required_privileges: &[],
            help: "Ask for a hint on how to proceed.",
            handler: cmd_hint,
        },
        CommandSpec {
            verb: "time",
            required_privileges: &[],
            help: "Show the current in-story date and time.",
            handler: cmd_time,
        },
        CommandSpec {
            verb: "who",
            required_privileges: &[],
            help: "List who is playing.",
            handler: cmd_who,
        },
        CommandSpec {
            verb: "help",
            required_privileges: &[],
            help: "Show this list.",
            handler: cmd_help,
        },
        CommandSpec {
            verb: "save",
            required_privileges: &[],
            help: "Save the world state.",
            handler: cmd_save,
        },
        CommandSpec {
            verb: "quit",
            required_privileges: &[],
            help: "Leave the game.",
            handler: cmd_quit,
        },
    ]
}

fn require_arg(rest: &str, usage: &str) -> Result<String, WorldError> {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        return Err(WorldError::Parse(usage.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Split `"gem from box"` style phrases on a keyword, if present.
fn split_on_keyword(rest: &str, keyword: &str) -> (String, Option<String>) {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    match tokens.iter().position(|t| t.eq_ignore_ascii_case(keyword)) {
        Some(pos) if pos > 0 && pos + 1 < tokens.len() => {
            (tokens[..pos].join(" "), Some(tokens[pos + 1..].join(" ")))
        }
        _ => (rest.trim().to_string(), None),
    }
}

/// Find an exit by direction name or alias in the actor's location.
pub(super) fn find_exit(
    world: &World,
    actor: LivingId,
    name: &str,
) -> Result<Option<ExitId>, WorldError> {
    let location = world.living(actor)?.location;
    let query = name.trim().to_lowercase();
    let found = world
        .location(location)?
        .exits
        .iter()
        .find(|(dir, _)| dir.to_lowercase() == query)
        .map(|(_, id)| *id);
    Ok(found)
}

fn find_door(world: &World, actor: LivingId, name: &str) -> Result<ExitId, WorldError> {
    let exit = find_exit(world, actor, name)?
        .ok_or_else(|| WorldError::ActionRefused(format!("There's no {} here.", name.trim())))?;
    if !world.exit(exit)?.is_door() {
        return Err(WorldError::ActionRefused("There's no door there.".to_string()));
    }
    Ok(exit)
}

fn item_title(world: &World, item: ItemId) -> Result<String, WorldError> {
    Ok(world.item(item)?.core.title.clone())
}

fn actor_title(world: &World, actor: LivingId) -> Result<String, WorldError> {
    Ok(capitalize(&world.living(actor)?.core.title))
}

fn cmd_look(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let text = describe::look_around(ctx.world, actor)?;
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_examine(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = require_arg(rest, "Examine what?")?;
    if let Some(item) = ctx.world.resolve_item(actor, &name) {
        let text = describe::examine_item(ctx.world, item, ctx.scheduler.game_time())?;
        notify::tell_living(ctx.world, actor, &text);
        return Ok(());
    }
    let location = ctx.world.living(actor)?.location;
    if let Some(other) = ctx.world.find_living_at(location, &name) {
        let rec = ctx.world.living(other)?;
        let mut text = format!("This is {}.", rec.core.title);
        if !rec.core.long_desc.is_empty() {
            text.push(' ');
            text.push_str(&rec.core.long_desc);
        }
        notify::tell_living(ctx.world, actor, &text);
        return Ok(());
    }
    Err(WorldError::ActionRefused(format!(
        "You don't see any {name} here."
    )))
}

fn cmd_go(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let direction = require_arg(rest, "Go where?")?;
    go_direction(ctx, actor, &direction)
}

/// Shared by `go <dir>` and the bare-direction shortcut.
pub(super) fn go_direction(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    direction: &str,
) -> Result<(), WorldError> {
    let exit = find_exit(ctx.world, actor, direction)?
        .ok_or_else(|| WorldError::ActionRefused("You can't go there.".to_string()))?;
    passage::traverse(ctx.world, actor, exit)?;
    let text = describe::look_around(ctx.world, actor)?;
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_take(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let args = require_arg(rest, "Take what?")?;
    let (what, from) = split_on_keyword(&args, "from");

    let item = match &from {
        Some(container_name) => {
            let container = ctx
                .world
                .resolve_item(actor, container_name)
                .ok_or_else(|| {
                    WorldError::ActionRefused(format!(
                        "You don't see any {container_name} here."
                    ))
                })?;
            ctx.world
                .find_in_container(container, &what)
                .ok_or_else(|| {
                    WorldError::ActionRefused(format!("There's no {what} in there."))
                })?
        }
        None => {
            let location = ctx.world.living(actor)?.location;
            ctx.world.find_item_at(location, &what).ok_or_else(|| {
                WorldError::ActionRefused(format!("You don't see any {what} here."))
            })?
        }
    };

    movement::move_item(ctx.world, item, ItemDest::Living(actor), actor)?;

    let title = item_title(ctx.world, item)?;
    notify::tell_living(ctx.world, actor, &format!("You take the {title}."));
    let who = actor_title(ctx.world, actor)?;
    let location = ctx.world.living(actor)?.location;
    notify::tell_room(
        ctx.world,
        location,
        &format!("{who} takes the {title}."),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );
    Ok(())
}

fn cmd_drop(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let what = require_arg(rest, "Drop what?")?;
    let item = ctx
        .world
        .find_in_inventory(actor, &what)
        .ok_or_else(|| WorldError::ActionRefused(format!("You don't have a {what}.")))?;
    let location = ctx.world.living(actor)?.location;
    movement::move_item(ctx.world, item, ItemDest::Location(location), actor)?;

    let title = item_title(ctx.world, item)?;
    notify::tell_living(ctx.world, actor, &format!("You drop the {title}."));
    let who = actor_title(ctx.world, actor)?;
    notify::tell_room(
        ctx.world,
        location,
        &format!("{who} drops the {title}."),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );
    Ok(())
}

fn cmd_put(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let args = require_arg(rest, "Put what where? Try: put gem in box.")?;
    let (what, dest) = split_on_keyword(&args, "in");
    let dest = dest.ok_or_else(|| {
        WorldError::Parse("Put what where? Try: put gem in box.".to_string())
    })?;

    let item = ctx
        .world
        .resolve_item(actor, &what)
        .ok_or_else(|| WorldError::ActionRefused(format!("You don't see any {what} here.")))?;
    let container = ctx
        .world
        .resolve_item(actor, &dest)
        .ok_or_else(|| WorldError::ActionRefused(format!("You don't see any {dest} here.")))?;
    if item == container {
        return Err(WorldError::ActionRefused(
            "You can't put something inside itself.".to_string(),
        ));
    }

    movement::move_item(ctx.world, item, ItemDest::Container(container), actor)?;

    let item_t = item_title(ctx.world, item)?;
    let container_t = item_title(ctx.world, container)?;
    notify::tell_living(
        ctx.world,
        actor,
        &format!("You put the {item_t} in the {container_t}."),
    );
    Ok(())
}

fn cmd_inventory(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let text = describe::inventory_listing(ctx.world, actor)?;
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_open(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = require_arg(rest, "Open what?")?;
    let exit = find_door(ctx.world, actor, &name)?;
    passage::open_door(ctx.world, exit, actor)?;
    notify::tell_living(ctx.world, actor, "You open it.");

    // The world pulls doors shut again after a while.
    ctx.scheduler.defer(
        DOOR_AUTOCLOSE_GAME_SECS,
        crate::scheduler::DeferredAction::CloseDoor { exit },
    );
    Ok(())
}

fn cmd_close(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = require_arg(rest, "Close what?")?;
    let exit = find_door(ctx.world, actor, &name)?;
    passage::close_door(ctx.world, exit, actor)?;
    notify::tell_living(ctx.world, actor, "You close it.");
    Ok(())
}

/// Pick the credential to present to a door: a named key from the actor's
/// inventory, or the best-matching carried key when none is named.
fn select_credential(
    world: &World,
    actor: LivingId,
    exit: ExitId,
    key_name: Option<&str>,
) -> Result<Option<u32>, WorldError> {
    if let Some(name) = key_name {
        let key = world
            .find_in_inventory(actor, name)
            .ok_or_else(|| WorldError::ActionRefused(format!("You don't have a {name}.")))?;
        return Ok(world.item(key)?.key_code);
    }

    let door_code = world.exit(exit)?.door.as_ref().and_then(|d| d.code);
    let mut carried: Vec<u32> = Vec::new();
    for item in &world.living(actor)?.inventory {
        if let Some(code) = world.item(*item)?.key_code {
            carried.push(code);
        }
    }
    match door_code {
        Some(code) if carried.contains(&code) => Ok(Some(code)),
        _ => Ok(carried.first().copied()),
    }
}

fn cmd_unlock(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let args = require_arg(rest, "Unlock what?")?;
    let (name, key_name) = split_on_keyword(&args, "with");
    let exit = find_door(ctx.world, actor, &name)?;
    let credential = select_credential(ctx.world, actor, exit, key_name.as_deref())?;
    passage::unlock_door(ctx.world, exit, actor, credential)?;
    notify::tell_living(ctx.world, actor, "You unlock it.");
    Ok(())
}

fn cmd_lock(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let args = require_arg(rest, "Lock what?")?;
    let (name, key_name) = split_on_keyword(&args, "with");
    let exit = find_door(ctx.world, actor, &name)?;
    let credential = select_credential(ctx.world, actor, exit, key_name.as_deref())?;
    passage::lock_door(ctx.world, exit, actor, credential)?;
    notify::tell_living(ctx.world, actor, "You lock it.");
    Ok(())
}

/// The control panel present in a location, with the exits it is wired to.
fn panel_in_room(world: &World, location: LocationId) -> Option<(ItemId, Vec<String>)> {
    let loc = world.locations.get(&location)?;
    loc.items.iter().find_map(|id| {
        let item = world.items.get(id)?;
        match &item.dynamic_desc {
            Some(DynamicDesc::DoorPanel { exits }) => Some((*id, exits.clone())),
            _ => None,
        }
    })
}

fn panel_beep(world: &mut World, actor: LivingId, panel: &str, message: &str) {
    notify::tell_living(
        world,
        actor,
        &format!("The {panel} beeps quietly. The screen shows: \"{message}\""),
    );
}

fn cmd_type(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let location = ctx.world.living(actor)?.location;
    let (panel, wired) = panel_in_room(ctx.world, location).ok_or_else(|| {
        WorldError::ActionRefused("There's nothing here you can type on.".to_string())
    })?;
    let panel_name = ctx.world.item(panel)?.core.name.clone();

    let args = require_arg(rest, "Type what?")?;
    // "type unlock door two on computer" addresses the machine explicitly.
    let (input, target) = split_on_keyword(&args, "on");
    if let Some(target) = target {
        if !ctx.world.item(panel)?.core.answers_to(&target) {
            return Err(WorldError::ActionRefused(format!(
                "You need to type it on the {panel_name}."
            )));
        }
    }

    let (command, arg) = match input.split_once(char::is_whitespace) {
        Some((c, a)) => (c.to_lowercase(), a.trim().to_lowercase()),
        None => (input.to_lowercase(), String::new()),
    };
    let message = match command.as_str() {
        "help" => "KNOWN COMMANDS: LOCK, UNLOCK".to_string(),
        "hi" | "hello" => "GREETINGS, PROFESSOR FALKEN.".to_string(),
        "lock" | "unlock" => {
            let known = wired.iter().any(|w| w.eq_ignore_ascii_case(&arg));
            let exit = find_exit(ctx.world, actor, &arg)?;
            let wired_door = match exit {
                Some(exit) => known && ctx.world.exit(exit)?.is_door(),
                None => false,
            };
            match exit {
                Some(exit) if wired_door => {
                    passage::set_door_locked(ctx.world, exit, command == "lock")?;
                    format!("{} {}ED", arg.to_uppercase(), command.to_uppercase())
                }
                _ => "UNKNOWN DOOR".to_string(),
            }
        }
        _ => "INVALID COMMAND".to_string(),
    };
    panel_beep(ctx.world, actor, &panel_name, &message);
    Ok(())
}

fn cmd_hack(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let name = rest.trim();
    if name.is_empty() {
        return Err(WorldError::Parse("What do you want to hack?".to_string()));
    }
    let location = ctx.world.living(actor)?.location;
    match panel_in_room(ctx.world, location) {
        Some((panel, _)) if ctx.world.item(panel)?.core.answers_to(name) => {
            notify::tell_living(
                ctx.world,
                actor,
                "It doesn't need to be hacked, you can just type commands on it.",
            );
            Ok(())
        }
        _ => Err(WorldError::ActionRefused("You can't hack that.".to_string())),
    }
}

fn cmd_say(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    rest: &str,
) -> Result<(), WorldError> {
    let text = require_arg(rest, "Say what?")?;
    let who = actor_title(ctx.world, actor)?;
    let location = ctx.world.living(actor)?.location;
    notify::tell_living(ctx.world, actor, &format!("You say: {text}"));
    notify::tell_room(
        ctx.world,
        location,
        &format!("{who} says: {text}"),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );

    // Machinery in the room listens along, after a fashion.
    if let Some((panel, _)) = panel_in_room(ctx.world, location) {
        let panel_name = ctx.world.item(panel)?.core.name.clone();
        let greeted = text
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .any(|w| w == "hi" || w == "hello");
        if greeted {
            panel_beep(ctx.world, actor, &panel_name, "GREETINGS, PROFESSOR FALKEN.");
        } else {
            notify::tell_living(
                ctx.world,
                actor,
                &format!(
                    "The {panel_name} beeps quietly. The screen shows: \"I CAN'T HEAR YOU. \
PLEASE TYPE COMMANDS INSTEAD OF SPEAKING.\" How odd."
                ),
            );
        }
    }
    Ok(())
}

fn cmd_hint(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let hint = ctx
        .world
        .living(actor)?
        .hints
        .current()
        .map(str::to_string)
        .unwrap_or_else(|| "You're on your own for now.".to_string());
    notify::tell_living(ctx.world, actor, &hint);
    Ok(())
}

fn cmd_time(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let now = ctx.scheduler.game_time();
    let text = format!("The time is {}.", now.format("%A, %B %-d, %Y %H:%M:%S"));
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_who(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let names: Vec<String> = ctx
        .world
        .players()
        .map(|p| capitalize(&p.core.name))
        .collect();
    let text = if names.is_empty() {
        "Nobody is playing.".to_string()
    } else {
        format!("Players: {}.", names.join(", "))
    };
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_help(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    let is_wizard = ctx.world.living(actor)?.is_wizard();
    let mut lines = vec!["Available commands:".to_string()];
    for entry in ctx.help {
        let gated = !entry.required_privileges.is_empty();
        if gated && !is_wizard {
            continue;
        }
        let marker = if gated { " (wizard)" } else { "" };
        lines.push(format!("  {:<10}{} - {}", entry.verb, marker, entry.help));
    }
    let text = lines.join("\n");
    notify::tell_living(ctx.world, actor, &text);
    Ok(())
}

fn cmd_save(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    ctx.save_requested = true;
    notify::tell_living(ctx.world, actor, "Saving the world...");
    Ok(())
}

fn cmd_quit(
    ctx: &mut CommandContext<'_>,
    actor: LivingId,
    _verb: &str,
    _rest: &str,
) -> Result<(), WorldError> {
    ctx.quit = true;
    notify::tell_living(ctx.world, actor, "Goodbye! We hope to see you again soon.");
    Ok(())
}
