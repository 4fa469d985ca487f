//! Rendering of locations, items and livings into player-facing text.
//!
//! Everything here is a pure query over current world state. Dynamic
//! descriptions (the alley door panel) are recomputed on every call and
//! never cached.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::world::capitalize;
use crate::world::errors::WorldError;
use crate::world::registry::World;
use crate::world::types::{DynamicDesc, ItemId, ItemOwner, LivingId, LocationId};

/// Full room view: title, long description, exits, items and livings
/// present.
pub fn look_around(world: &World, actor: LivingId) -> Result<String, WorldError> {
    let location = world.living(actor)?.location;
    let loc = world.location(location)?;

    let mut out = String::new();
    out.push_str(&format!("[{}]\n", loc.core.name));
    if !loc.core.long_desc.is_empty() {
        out.push_str(loc.core.long_desc.trim());
        out.push('\n');
    }

    // The same exit may be bound under several direction names; describe it
    // once.
    let mut seen = BTreeSet::new();
    for exit_id in loc.exits.values() {
        if !seen.insert(*exit_id) {
            continue;
        }
        if let Ok(exit) = world.exit(*exit_id) {
            out.push_str(&exit.description);
            out.push('\n');
        }
    }

    for item_id in &loc.items {
        if let Ok(item) = world.item(*item_id) {
            if item.core.short_desc.is_empty() {
                out.push_str(&format!("There's {} here.\n", item.core.title));
            } else {
                out.push_str(&item.core.short_desc);
                out.push('\n');
            }
        }
    }

    let others: Vec<String> = loc
        .livings
        .iter()
        .filter(|l| **l != actor)
        .filter_map(|l| world.livings.get(l))
        .map(|l| l.core.title.clone())
        .collect();
    if !others.is_empty() {
        out.push_str(&format!("Present: {}.\n", others.join(", ")));
    }
    Ok(out.trim_end().to_string())
}

/// Examine one item in detail. `now` feeds the dynamic descriptions that
/// read the game clock.
pub fn examine_item(
    world: &World,
    item: ItemId,
    now: DateTime<Utc>,
) -> Result<String, WorldError> {
    let rec = world.item(item)?;
    let mut out = String::new();
    out.push_str(&format!("{}.", capitalize(&rec.core.title)));
    if !rec.core.long_desc.is_empty() {
        out.push(' ');
        out.push_str(rec.core.long_desc.trim());
    }
    if let Some(dynamic) = &rec.dynamic_desc {
        out.push(' ');
        out.push_str(&render_dynamic(world, rec.owner, dynamic, now));
    }
    if let Some(state) = &rec.container {
        if state.contents.is_empty() {
            out.push_str(" It is empty.");
        } else {
            let names: Vec<String> = state
                .contents
                .iter()
                .filter_map(|i| world.items.get(i))
                .map(|i| i.core.title.clone())
                .collect();
            out.push_str(&format!(" It contains: {}.", names.join(", ")));
        }
    }
    Ok(out)
}

fn render_dynamic(
    world: &World,
    owner: ItemOwner,
    dynamic: &DynamicDesc,
    now: DateTime<Utc>,
) -> String {
    match dynamic {
        DynamicDesc::DoorPanel { exits } => {
            let Some(location) = owning_location(world, owner) else {
                return "The screen is dark.".to_string();
            };
            door_panel_text(world, location, exits)
        }
        DynamicDesc::GameClock => {
            format!("It reads: {}.", now.format("%A, %B %-d, %Y %H:%M:%S"))
        }
    }
}

/// Live lock-state readout for the named exits of `location`.
pub fn door_panel_text(world: &World, location: LocationId, exits: &[String]) -> String {
    let mut out = String::from("The screen reads: \"");
    let Ok(loc) = world.location(location) else {
        return "The screen is dark.".to_string();
    };
    for name in exits {
        let state = loc
            .exits
            .get(name)
            .and_then(|id| world.exits.get(id))
            .and_then(|e| e.door.as_ref())
            .map(|d| if d.locked { "LOCKED" } else { "UNLOCKED" })
            .unwrap_or("OFFLINE");
        out.push_str(&format!("{}: {}. ", name.to_uppercase(), state));
    }
    out.push_str("AWAITING COMMAND.\"");
    out
}

/// Walk an item's owner chain up to the location it physically sits in.
fn owning_location(world: &World, mut owner: ItemOwner) -> Option<LocationId> {
    loop {
        match owner {
            ItemOwner::Location(loc) => return Some(loc),
            ItemOwner::Living(l) => return world.livings.get(&l).map(|l| l.location),
            ItemOwner::Container(c) => owner = world.items.get(&c)?.owner,
            ItemOwner::Nowhere => return None,
        }
    }
}

/// One-line inventory listing.
pub fn inventory_listing(world: &World, actor: LivingId) -> Result<String, WorldError> {
    let rec = world.living(actor)?;
    if rec.inventory.is_empty() {
        return Ok("You are carrying nothing.".to_string());
    }
    let names: Vec<String> = rec
        .inventory
        .iter()
        .filter_map(|i| world.items.get(i))
        .map(|i| i.core.title.clone())
        .collect();
    Ok(format!("You are carrying: {}.", names.join(", ")))
}
