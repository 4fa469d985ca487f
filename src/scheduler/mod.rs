//! The tick scheduler: real-time to game-time conversion, deferred
//! callbacks, and the heartbeat sweep.
//!
//! One tick advances the game clock by `tick interval x gametime ratio`,
//! then runs, in fixed order: (a) due deferred callbacks, ordered by due
//! game-time then registration order, and (b) the heartbeat hook of every
//! subscribed living, in creation order. Deferred entries are claimed out of
//! the queue before any of them fires, so cancelling an already-claimed slot
//! is a no-op rather than an error, and a callback whose subject has left
//! the arena is skipped silently.

use chrono::{DateTime, Duration, Utc};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::world::notify::{self, TellOptions};
use crate::world::passage;
use crate::world::registry::World;
use crate::world::types::{ExitId, LivingId, LivingKind, LocationId, NpcBehavior};

/// How ticks are driven: one per accepted command, or on a fixed wall-clock
/// interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickMethod {
    Command,
    Timer,
}

/// Stable handle for cancelling a deferred callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeferredId(pub u64);

/// The closed set of things a deferred callback can do. An explicit enum
/// keeps the schedule serializable and the sweep deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredAction {
    /// Swing a door shut again (door timer).
    CloseDoor { exit: ExitId },
    /// Advance a living's hint journal and tell them the notice.
    HintNotice {
        living: LivingId,
        state: String,
        notice: String,
    },
    /// Tell a room something.
    RoomEcho {
        location: LocationId,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DeferredEntry {
    id: DeferredId,
    /// Due point on the game clock, in milliseconds since the epoch.
    due_ms: u64,
    /// Registration order, breaking due-time ties.
    seq: u64,
    action: DeferredAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    epoch: DateTime<Utc>,
    gametime_ratio: f64,
    /// Real milliseconds represented by one tick.
    tick_real_ms: u64,
    /// Elapsed game time in milliseconds.
    game_ms: u64,
    ticks: u64,
    deferred: Vec<DeferredEntry>,
    next_deferred: u64,
    next_seq: u64,
    /// Subscribed livings in subscription (creation) order.
    heartbeats: Vec<LivingId>,
    #[serde(skip)]
    sweeping: bool,
    #[serde(skip)]
    deferred_unsubs: Vec<LivingId>,
}

impl Scheduler {
    pub fn new(epoch: DateTime<Utc>, gametime_ratio: f64, tick_seconds: f64) -> Self {
        Self {
            epoch,
            gametime_ratio,
            tick_real_ms: (tick_seconds * 1000.0) as u64,
            game_ms: 0,
            ticks: 0,
            deferred: Vec::new(),
            next_deferred: 0,
            next_seq: 0,
            heartbeats: Vec::new(),
            sweeping: false,
            deferred_unsubs: Vec::new(),
        }
    }

    /// Current value of the game clock.
    pub fn game_time(&self) -> DateTime<Utc> {
        self.epoch + Duration::milliseconds(self.game_ms as i64)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Schedule `action` to run after `game_seconds` on the game clock.
    pub fn defer(&mut self, game_seconds: u64, action: DeferredAction) -> DeferredId {
        let id = DeferredId(self.next_deferred);
        self.next_deferred += 1;
        let entry = DeferredEntry {
            id,
            due_ms: self.game_ms + game_seconds * 1000,
            seq: self.next_seq,
            action,
        };
        self.next_seq += 1;
        trace!("deferred {:?} due at {}ms", id, entry.due_ms);
        self.deferred.push(entry);
        id
    }

    /// Withdraw a pending callback. Returns false when the slot was already
    /// claimed (or never existed); that is a no-op, not an error.
    pub fn cancel(&mut self, id: DeferredId) -> bool {
        let before = self.deferred.len();
        self.deferred.retain(|e| e.id != id);
        before != self.deferred.len()
    }

    /// Register a living for heartbeats, preserving first-subscription order.
    pub fn subscribe(&mut self, living: LivingId) {
        if !self.heartbeats.contains(&living) {
            self.heartbeats.push(living);
        }
    }

    /// Remove a living from the heartbeat list. During a sweep the request
    /// is queued and applied once the sweep completes, so the sweep order
    /// never shifts under a running hook.
    pub fn unsubscribe(&mut self, living: LivingId) {
        if self.sweeping {
            self.deferred_unsubs.push(living);
        } else {
            self.heartbeats.retain(|l| *l != living);
        }
    }

    pub fn is_subscribed(&self, living: LivingId) -> bool {
        self.heartbeats.contains(&living)
    }

    /// Advance the clock by one tick and run due work.
    pub fn tick(&mut self, world: &mut World, rng: &mut StdRng) {
        self.ticks += 1;
        self.game_ms += (self.tick_real_ms as f64 * self.gametime_ratio) as u64;
        debug!("tick {} game clock {}", self.ticks, self.game_time());

        // Claim every due entry before firing any of them.
        let now = self.game_ms;
        let mut due: Vec<DeferredEntry> = Vec::new();
        self.deferred.retain(|e| {
            if e.due_ms <= now {
                due.push(e.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.due_ms, e.seq));
        for entry in due {
            run_action(world, entry.action);
        }

        // Heartbeat sweep over a stable snapshot of the subscription list.
        self.sweeping = true;
        let sweep: Vec<LivingId> = self.heartbeats.clone();
        for living in sweep {
            if world.livings.contains_key(&living) {
                run_heartbeat(world, living, rng);
            }
        }
        self.sweeping = false;
        for living in std::mem::take(&mut self.deferred_unsubs) {
            self.heartbeats.retain(|l| *l != living);
        }
    }
}

/// Execute one claimed deferred action. A missing subject means the entity
/// was destroyed after scheduling; the callback is skipped silently.
fn run_action(world: &mut World, action: DeferredAction) {
    match action {
        DeferredAction::CloseDoor { exit } => {
            let Some(rec) = world.exits.get_mut(&exit) else {
                trace!("close-door callback skipped, {exit} gone");
                return;
            };
            let (from, direction) = (rec.from, rec.direction.clone());
            let closed = match rec.door.as_mut() {
                Some(door) if door.opened => {
                    door.opened = false;
                    true
                }
                _ => false,
            };
            if closed {
                notify::tell_room(
                    world,
                    from,
                    &format!("The {direction} door swings shut."),
                    TellOptions::default(),
                );
            }
        }
        DeferredAction::HintNotice {
            living,
            state,
            notice,
        } => {
            let Some(rec) = world.livings.get_mut(&living) else {
                trace!("hint callback skipped, {living} gone");
                return;
            };
            if rec.hints.checkpoint(&state) {
                rec.push_output(&notice);
            }
        }
        DeferredAction::RoomEcho { location, message } => {
            if world.locations.contains_key(&location) {
                notify::tell_room(world, location, &message, TellOptions::default());
            }
        }
    }
}

/// Run one living's per-tick behavior hook.
fn run_heartbeat(world: &mut World, living: LivingId, rng: &mut StdRng) {
    let behavior = match world.livings.get(&living) {
        Some(rec) => match &rec.kind {
            LivingKind::Npc {
                heartbeat: true,
                behavior,
            } => behavior.clone(),
            _ => return,
        },
        None => return,
    };

    match behavior {
        NpcBehavior::Passive => {}
        NpcBehavior::Wander { chance_percent } => {
            if rng.gen_range(0..100) >= chance_percent as u32 {
                return;
            }
            let Some(rec) = world.livings.get(&living) else {
                return;
            };
            let Some(loc) = world.locations.get(&rec.location) else {
                return;
            };
            // Dedup aliases; BTreeSet keeps the pick order deterministic for
            // a given rng seed.
            let exits: Vec<ExitId> = loc
                .exits
                .values()
                .copied()
                .collect::<std::collections::BTreeSet<_>>()
                .into_iter()
                .collect();
            if exits.is_empty() {
                return;
            }
            let exit = exits[rng.gen_range(0..exits.len())];
            // Refusals (locked doors, force-fields) just mean the wanderer
            // stays put this tick.
            let _ = passage::traverse(world, living, exit);
        }
        NpcBehavior::Chatter {
            lines,
            chance_percent,
            next_line,
        } => {
            if lines.is_empty() || rng.gen_range(0..100) >= chance_percent as u32 {
                return;
            }
            let line = lines[next_line % lines.len()].clone();
            let location = match world.livings.get(&living) {
                Some(rec) => rec.location,
                None => return,
            };
            notify::tell_room(world, location, &line, TellOptions::default());
            if let Some(rec) = world.livings.get_mut(&living) {
                if let LivingKind::Npc {
                    behavior: NpcBehavior::Chatter { next_line, .. },
                    ..
                } = &mut rec.kind
                {
                    *next_line += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::EntityCore;
    use chrono::TimeZone;
    use rand::SeedableRng;

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 4, 19, 14, 0, 0).unwrap()
    }

    #[test]
    fn clock_advances_by_ratio() {
        let mut sched = Scheduler::new(epoch(), 5.0, 1.0);
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(1);
        sched.tick(&mut world, &mut rng);
        // One 1s tick at ratio 5 is five game seconds.
        assert_eq!(sched.game_time(), epoch() + Duration::seconds(5));
    }

    #[test]
    fn deferred_fire_in_due_then_registration_order() {
        let mut sched = Scheduler::new(epoch(), 1.0, 1.0);
        let mut world = World::new();
        let loc = world.add_location(EntityCore::new("room", "the room"));
        let mut rng = StdRng::seed_from_u64(1);

        // Same due time: registration order must break the tie.
        sched.defer(
            1,
            DeferredAction::RoomEcho {
                location: loc,
                message: "first".into(),
            },
        );
        sched.defer(
            1,
            DeferredAction::RoomEcho {
                location: loc,
                message: "second".into(),
            },
        );
        sched.tick(&mut world, &mut rng);
        assert_eq!(sched.pending_deferred(), 0);
    }

    #[test]
    fn cancel_of_claimed_slot_is_noop() {
        let mut sched = Scheduler::new(epoch(), 1.0, 1.0);
        let mut world = World::new();
        let loc = world.add_location(EntityCore::new("room", "the room"));
        let mut rng = StdRng::seed_from_u64(1);

        let id = sched.defer(
            1,
            DeferredAction::RoomEcho {
                location: loc,
                message: "echo".into(),
            },
        );
        sched.tick(&mut world, &mut rng);
        // The sweep already claimed and fired the slot.
        assert!(!sched.cancel(id));
    }

    #[test]
    fn cancel_before_due_withdraws() {
        let mut sched = Scheduler::new(epoch(), 1.0, 1.0);
        let loc = LocationId(0);
        let id = sched.defer(
            60,
            DeferredAction::RoomEcho {
                location: loc,
                message: "never".into(),
            },
        );
        assert!(sched.cancel(id));
        assert_eq!(sched.pending_deferred(), 0);
    }

    #[test]
    fn unsubscribe_during_sweep_is_applied_after() {
        let mut sched = Scheduler::new(epoch(), 1.0, 1.0);
        let a = LivingId(10);
        let b = LivingId(11);
        sched.subscribe(a);
        sched.subscribe(b);

        // Simulate a hook unsubscribing its neighbour mid-sweep.
        sched.sweeping = true;
        sched.unsubscribe(b);
        assert!(sched.is_subscribed(b), "removal must wait for sweep end");
        sched.sweeping = false;
        for living in std::mem::take(&mut sched.deferred_unsubs) {
            sched.heartbeats.retain(|l| *l != living);
        }
        assert!(!sched.is_subscribed(b));
        assert!(sched.is_subscribed(a));
    }

    #[test]
    fn dead_subject_callback_is_skipped() {
        let mut sched = Scheduler::new(epoch(), 1.0, 1.0);
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(7);
        // Exit id that never existed; the callback must be a silent no-op.
        sched.defer(1, DeferredAction::CloseDoor { exit: ExitId(404) });
        sched.tick(&mut world, &mut rng);
        assert_eq!(sched.pending_deferred(), 0);
    }
}
