//! Passage control: the door state machine and the exit traversal sequence.
//!
//! A door has four reachable combined states, {locked, unlocked} x {opened,
//! closed}. Locking is gated by a credential code (or wizard override);
//! opening and closing are independent of the lock except that a locked door
//! refuses to open. A mirror door on the far side shares only the code --
//! its state never changes in sympathy.

use log::debug;

use crate::world::capitalize;
use crate::world::errors::WorldError;
use crate::world::movement;
use crate::world::notify::{self, TellOptions};
use crate::world::registry::World;
use crate::world::types::{ArrivalEffect, DoorState, ExitAccess, ExitId, LivingId, LocationId};

fn door_of(world: &World, exit: ExitId) -> Result<&DoorState, WorldError> {
    world
        .exit(exit)?
        .door
        .as_ref()
        .ok_or_else(|| WorldError::ActionRefused("There's no door there.".to_string()))
}

fn door_of_mut(world: &mut World, exit: ExitId) -> Result<&mut DoorState, WorldError> {
    world
        .exit_mut(exit)?
        .door
        .as_mut()
        .ok_or_else(|| WorldError::ActionRefused("There's no door there.".to_string()))
}

/// Open a door. Refused while locked.
pub fn open_door(world: &mut World, exit: ExitId, _actor: LivingId) -> Result<(), WorldError> {
    let door = door_of(world, exit)?;
    if door.opened {
        return Err(WorldError::ActionRefused("It's already open.".to_string()));
    }
    if door.locked {
        return Err(WorldError::ActionRefused(
            "You try to open it, but it seems to be locked.".to_string(),
        ));
    }
    door_of_mut(world, exit)?.opened = true;
    Ok(())
}

pub fn close_door(world: &mut World, exit: ExitId, _actor: LivingId) -> Result<(), WorldError> {
    let door = door_of(world, exit)?;
    if !door.opened {
        return Err(WorldError::ActionRefused(
            "It's already closed.".to_string(),
        ));
    }
    door_of_mut(world, exit)?.opened = false;
    Ok(())
}

fn credential_accepted(
    world: &World,
    door: &DoorState,
    actor: LivingId,
    credential: Option<u32>,
) -> Result<(), WorldError> {
    if world.living(actor)?.is_wizard() {
        return Ok(());
    }
    match (door.code, credential) {
        (Some(code), Some(presented)) if code == presented => Ok(()),
        (Some(_), Some(_)) => Err(WorldError::ActionRefused(
            "The key doesn't fit.".to_string(),
        )),
        (Some(_), None) => Err(WorldError::ActionRefused(
            "You don't have the right key.".to_string(),
        )),
        (None, _) => Err(WorldError::ActionRefused(
            "It has no visible lock mechanism.".to_string(),
        )),
    }
}

/// Unlock a door with a presented credential (or wizard override). On
/// success, a configured unlock hint is fired for the actor. The mirror
/// door, if any, is deliberately left untouched.
pub fn unlock_door(
    world: &mut World,
    exit: ExitId,
    actor: LivingId,
    credential: Option<u32>,
) -> Result<(), WorldError> {
    let door = door_of(world, exit)?;
    if !door.locked {
        return Err(WorldError::ActionRefused("It isn't locked.".to_string()));
    }
    credential_accepted(world, door, actor, credential)?;

    let door = door_of_mut(world, exit)?;
    door.locked = false;
    let nudge = door.unlock_hint.clone();
    debug!("door {exit} unlocked by {actor}");

    if let Some(nudge) = nudge {
        let living = world.living_mut(actor)?;
        if living.is_player() && living.hints.checkpoint(&nudge.state) {
            living.push_output(&nudge.notice);
        }
    }
    Ok(())
}

/// Set a door's lock state directly, bypassing credentials. Used by
/// machinery wired to the door (the alley control panel), not by actors.
pub fn set_door_locked(world: &mut World, exit: ExitId, locked: bool) -> Result<(), WorldError> {
    door_of_mut(world, exit)?.locked = locked;
    debug!("door {exit} lock forced to {locked}");
    Ok(())
}

/// Lock a door. Same credential rules as unlocking.
pub fn lock_door(
    world: &mut World,
    exit: ExitId,
    actor: LivingId,
    credential: Option<u32>,
) -> Result<(), WorldError> {
    let door = door_of(world, exit)?;
    if door.locked {
        return Err(WorldError::ActionRefused(
            "It's already locked.".to_string(),
        ));
    }
    credential_accepted(world, door, actor, credential)?;
    door_of_mut(world, exit)?.locked = true;
    debug!("door {exit} locked by {actor}");
    Ok(())
}

/// Move `actor` through `exit`.
///
/// Sequence: access hook, door gating, departure notification, livings-set
/// transfer with back-reference update, arrival notification, arrival
/// effect. A locked door always refuses before any membership changes. An
/// unlocked-but-closed door is pushed open in passing. The end-of-story
/// arrival effect records the arrival first, then raises
/// [`WorldError::StoryComplete`] for players.
pub fn traverse(world: &mut World, actor: LivingId, exit: ExitId) -> Result<LocationId, WorldError> {
    let (dest, direction, access, door) = {
        let rec = world.exit(exit)?;
        (rec.to, rec.direction.clone(), rec.access.clone(), rec.door.clone())
    };

    if let ExitAccess::RequirePrivilege {
        privilege,
        refusal,
        pass_message,
    } = access
    {
        if !world.living(actor)?.privileges.contains(&privilege) {
            return Err(WorldError::ActionRefused(refusal));
        }
        if let Some(msg) = pass_message {
            world.living_mut(actor)?.push_output(&msg);
        }
    }

    if let Some(door) = door {
        if door.locked {
            return Err(WorldError::ActionRefused(
                "The door is locked.".to_string(),
            ));
        }
        if !door.opened {
            door_of_mut(world, exit)?.opened = true;
            world
                .living_mut(actor)?
                .push_output("You open the door and pass through.");
        }
    }

    let title = capitalize(&world.living(actor)?.core.title);
    let source = world.living(actor)?.location;
    notify::tell_room(
        world,
        source,
        &format!("{title} leaves towards {direction}."),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );

    let previous = movement::move_living(world, actor, dest)?;

    notify::tell_room(
        world,
        dest,
        &format!("{title} arrives."),
        TellOptions {
            exclude: &[actor],
            ..Default::default()
        },
    );

    match world.location(dest)?.arrival.clone() {
        ArrivalEffect::None => {}
        ArrivalEffect::EchoOnReentry { message } => {
            if previous == dest {
                world.living_mut(actor)?.push_output(&message);
            }
        }
        ArrivalEffect::EndStory => {
            // The actor has already been recorded as arrived; the dispatcher
            // transfers control to end-of-game handling from here.
            if world.living(actor)?.is_player() {
                return Err(WorldError::StoryComplete);
            }
        }
    }
    Ok(dest)
}
