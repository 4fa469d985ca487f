//! Notification fan-out.
//!
//! Message delivery to the livings present in a location, with optional
//! exclusion and per-target substitution, mirrored to any wiretaps installed
//! on the location or on a recipient. Deliveries are outbox pushes: they
//! never block, never fail, and a mirrored copy is never itself mirrored.

use crate::world::registry::World;
use crate::world::types::{LivingId, LocationId, WiretapTarget};

/// Delivery options for [`tell_room`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TellOptions<'a> {
    /// Livings that must not receive the message at all.
    pub exclude: &'a [LivingId],
    /// Livings that receive `specific_message` instead of the general one.
    pub specific_targets: &'a [LivingId],
    pub specific_message: Option<&'a str>,
}

/// Deliver `message` to every living present in `location`, honoring
/// exclusions and specific targets, then mirror to wiretaps.
pub fn tell_room(world: &mut World, location: LocationId, message: &str, opts: TellOptions<'_>) {
    let occupants: Vec<LivingId> = match world.locations.get(&location) {
        Some(loc) => loc.livings.clone(),
        None => return,
    };

    for living in occupants {
        if opts.exclude.contains(&living) {
            continue;
        }
        let text = if opts.specific_targets.contains(&living) {
            match opts.specific_message {
                Some(m) => m,
                None => continue,
            }
        } else {
            message
        };
        deliver(world, living, text);
        mirror(world, WiretapTarget::Living(living), text);
    }

    // Room taps hear the general message once, whether or not anyone was
    // present to receive it.
    mirror(world, WiretapTarget::Location(location), message);
}

/// Deliver a message to one living directly, mirroring to taps on that
/// living.
pub fn tell_living(world: &mut World, target: LivingId, message: &str) {
    deliver(world, target, message);
    mirror(world, WiretapTarget::Living(target), message);
}

/// Primary delivery: a fire-and-forget outbox push.
fn deliver(world: &mut World, living: LivingId, text: &str) {
    if let Some(rec) = world.livings.get_mut(&living) {
        rec.push_output(text);
    }
}

/// Mirror a delivery to every listener tapping `target`. The mirrored copy
/// carries a distinguishing wrapper and is pushed directly: tap deliveries
/// are never re-tapped, so there is no recursion.
fn mirror(world: &mut World, target: WiretapTarget, text: &str) {
    let label = match target {
        WiretapTarget::Location(loc) => world
            .locations
            .get(&loc)
            .map(|l| l.core.name.clone())
            .unwrap_or_else(|| loc.to_string()),
        WiretapTarget::Living(l) => world
            .livings
            .get(&l)
            .map(|l| l.core.name.clone())
            .unwrap_or_else(|| l.to_string()),
    };

    let listeners: Vec<LivingId> = world
        .livings
        .values()
        .filter(|l| l.wiretaps.contains(&target))
        .map(|l| l.id)
        .collect();
    for listener in listeners {
        let wrapped = format!("[wiretap on '{label}': {text}]");
        deliver(world, listener, &wrapped);
    }
}
