//! Containment and movement.
//!
//! This module is the sole authority for the ownership-exclusivity invariant:
//! every item belongs to exactly one of {a location, a container, a living,
//! nowhere} and every change of owner goes through [`move_item`]. All
//! fallibility checks run before the first mutation, so a refused move leaves
//! both ends exactly as they were.

use log::{debug, info};

use crate::world::errors::WorldError;
use crate::world::registry::World;
use crate::world::types::{
    ContainerPolicy, HoldPolicy, ItemId, ItemOwner, ItemRecord, LivingId, LivingKind,
    LivingRecord, LocationId, NpcBehavior,
};

/// Destination of an item move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemDest {
    Location(LocationId),
    Container(ItemId),
    Living(LivingId),
}

/// Relocate `item` into `dest` on behalf of `actor`.
///
/// Checks, in order: the item's hold policy, the cursed-removal rule, the
/// source container's remove policy, the destination's existence and insert
/// policy, and containment cycles. Only after every check passes is the item
/// detached and re-attached.
pub fn move_item(
    world: &mut World,
    item: ItemId,
    dest: ItemDest,
    actor: LivingId,
) -> Result<(), WorldError> {
    let (owner, hold) = {
        let rec = world.item(item)?;
        (rec.owner, rec.hold.clone())
    };

    match &hold {
        HoldPolicy::Fixed { refusal } => {
            return Err(WorldError::ActionRefused(refusal.clone()));
        }
        HoldPolicy::Cursed { refusal } => {
            // Sticks to whoever holds it unless a wizard intervenes.
            if matches!(owner, ItemOwner::Living(_)) && !world.living(actor)?.is_wizard() {
                return Err(WorldError::ActionRefused(refusal.clone()));
            }
        }
        HoldPolicy::Portable => {}
    }

    if let ItemOwner::Container(source) = owner {
        let state = world
            .item(source)?
            .container
            .as_ref()
            .ok_or_else(|| WorldError::NotFound(format!("container state of {source}")))?;
        if let ContainerPolicy::InsertOnly { refusal } = &state.policy {
            return Err(WorldError::ActionRefused(refusal.clone()));
        }
    }

    match dest {
        ItemDest::Location(loc) => {
            world.location(loc)?;
        }
        ItemDest::Living(l) => {
            world.living(l)?;
        }
        ItemDest::Container(c) => {
            let target = world.item(c)?;
            let state = target.container.as_ref().ok_or_else(|| {
                WorldError::ActionRefused(format!("{} can't hold things.", target.core.title))
            })?;
            if let ContainerPolicy::RemoveOnly { refusal } = &state.policy {
                return Err(WorldError::ActionRefused(refusal.clone()));
            }
            if would_create_cycle(world, item, c)? {
                return Err(WorldError::ActionRefused(
                    "You can't put something inside itself.".to_string(),
                ));
            }
        }
    }

    // All checks passed; mutate both ends.
    detach(world, item, owner)?;
    attach(world, item, dest)?;
    debug!("moved {item} to {dest:?} (actor {actor})");

    // Acquisition hooks fire once the item has settled in a player's hands.
    if let ItemDest::Living(holder) = dest {
        fire_taken_hint(world, item, holder)?;
    }
    Ok(())
}

/// True if putting `item` into `container` would close a containment loop.
fn would_create_cycle(world: &World, item: ItemId, container: ItemId) -> Result<bool, WorldError> {
    let mut cursor = container;
    loop {
        if cursor == item {
            return Ok(true);
        }
        match world.item(cursor)?.owner {
            ItemOwner::Container(parent) => cursor = parent,
            _ => return Ok(false),
        }
    }
}

fn detach(world: &mut World, item: ItemId, owner: ItemOwner) -> Result<(), WorldError> {
    match owner {
        ItemOwner::Location(loc) => {
            world.location_mut(loc)?.items.retain(|i| *i != item);
        }
        ItemOwner::Container(c) => {
            if let Some(state) = world.item_mut(c)?.container.as_mut() {
                state.contents.retain(|i| *i != item);
            }
        }
        ItemOwner::Living(l) => {
            world.living_mut(l)?.inventory.retain(|i| *i != item);
        }
        ItemOwner::Nowhere => {}
    }
    Ok(())
}

fn attach(world: &mut World, item: ItemId, dest: ItemDest) -> Result<(), WorldError> {
    let new_owner = match dest {
        ItemDest::Location(loc) => {
            world.location_mut(loc)?.items.push(item);
            ItemOwner::Location(loc)
        }
        ItemDest::Container(c) => {
            if let Some(state) = world.item_mut(c)?.container.as_mut() {
                state.contents.push(item);
            }
            ItemOwner::Container(c)
        }
        ItemDest::Living(l) => {
            world.living_mut(l)?.inventory.push(item);
            ItemOwner::Living(l)
        }
    };
    world.item_mut(item)?.owner = new_owner;
    Ok(())
}

fn fire_taken_hint(world: &mut World, item: ItemId, holder: LivingId) -> Result<(), WorldError> {
    let Some(nudge) = world.item(item)?.on_taken.clone() else {
        return Ok(());
    };
    let living = world.living_mut(holder)?;
    if living.is_player() && living.hints.checkpoint(&nudge.state) {
        living.push_output(&nudge.notice);
    }
    Ok(())
}

/// Move a living between locations: livings-set transfer plus back-reference
/// update. Access checking belongs to the passage module; teleport-style
/// commands call this directly on purpose. Returns the previous location.
pub fn move_living(
    world: &mut World,
    living: LivingId,
    dest: LocationId,
) -> Result<LocationId, WorldError> {
    world.location(dest)?;
    let previous = world.living(living)?.location;
    world.location_mut(previous)?.livings.retain(|l| *l != living);
    world.location_mut(dest)?.livings.push(living);
    world.living_mut(living)?.location = dest;
    debug!("living {living} moved {previous} -> {dest}");
    Ok(previous)
}

/// Deep-copy an item, including everything inside it, placing the copy
/// directly into `dest` without policy checks (cloning is a privileged
/// operation). Every field is duplicated; only the id is fresh.
pub fn clone_item(world: &mut World, source: ItemId, dest: ItemDest) -> Result<ItemId, WorldError> {
    let template = world.item(source)?.clone();
    let contents: Vec<ItemId> = template
        .container
        .as_ref()
        .map(|s| s.contents.clone())
        .unwrap_or_default();

    let mut copy = ItemRecord {
        owner: ItemOwner::Nowhere,
        ..template
    };
    if let Some(state) = copy.container.as_mut() {
        state.contents.clear();
    }
    let new_id = world.add_item(copy);
    attach(world, new_id, dest)?;

    for inner in contents {
        clone_item(world, inner, ItemDest::Container(new_id))?;
    }
    info!("cloned {source} -> {new_id}");
    Ok(new_id)
}

/// Clone an NPC into its own location.
///
/// Duplicated: identity, privileges, behavior, hint journal, inventory (deep).
/// Reset rather than copied: the heartbeat subscription (scheduler
/// registration is not an entity attribute, so the clone always starts
/// active) and installed wiretaps (tap registrations belong to the original
/// listener). Players cannot be cloned.
pub fn clone_npc(world: &mut World, source: LivingId) -> Result<LivingId, WorldError> {
    let template = world.living(source)?.clone();
    let mut behavior = match &template.kind {
        LivingKind::Npc { behavior, .. } => behavior.clone(),
        LivingKind::Player { .. } => {
            return Err(WorldError::ActionRefused(
                "You can't clone a player.".to_string(),
            ));
        }
    };
    reset_behavior_state(&mut behavior);
    let inventory = template.inventory.clone();

    let copy = LivingRecord {
        inventory: Vec::new(),
        wiretaps: Vec::new(),
        kind: LivingKind::Npc {
            heartbeat: true,
            behavior,
        },
        ..template
    };
    // add_living appends the clone to its location's livings set.
    let new_id = world.add_living(copy);
    for item in inventory {
        clone_item(world, item, ItemDest::Living(new_id))?;
    }
    info!("cloned npc {source} -> {new_id}");
    Ok(new_id)
}

/// Destroy an item and everything inside it: detach from its owner, then
/// drop it from the arena. Pending deferred callbacks naming it are skipped
/// by the scheduler's liveness check.
pub fn destroy_item(world: &mut World, item: ItemId) -> Result<(), WorldError> {
    let rec = world.item(item)?;
    let owner = rec.owner;
    let contents: Vec<ItemId> = rec
        .container
        .as_ref()
        .map(|s| s.contents.clone())
        .unwrap_or_default();
    for inner in contents {
        destroy_item(world, inner)?;
    }
    detach(world, item, owner)?;
    world.remove_item(item);
    info!("destroyed {item}");
    Ok(())
}

/// Destroy a living and its carried inventory. The caller is responsible for
/// farewell notifications and for unsubscribing any heartbeat registration.
pub fn destroy_living(world: &mut World, living: LivingId) -> Result<(), WorldError> {
    let rec = world.living(living)?;
    let location = rec.location;
    let inventory = rec.inventory.clone();
    for item in inventory {
        destroy_item(world, item)?;
    }
    world.location_mut(location)?.livings.retain(|l| *l != living);
    world.remove_living(living);
    info!("destroyed {living}");
    Ok(())
}

/// Reset a wandering NPC's chatter cursor and similar per-instance state.
/// Currently only chatter NPCs carry any.
pub fn reset_behavior_state(behavior: &mut NpcBehavior) {
    if let NpcBehavior::Chatter { next_line, .. } = behavior {
        *next_line = 0;
    }
}
