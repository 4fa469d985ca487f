use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident, $prefix:expr) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a [`LocationRecord`]. Allocated from a monotone counter
    /// and never reused, so a stale id can be detected by registry lookup.
    LocationId,
    "loc#"
);
id_newtype!(
    /// Identifier of an [`ItemRecord`]. Never reused.
    ItemId,
    "item#"
);
id_newtype!(
    /// Identifier of a [`LivingRecord`]. Never reused.
    LivingId,
    "living#"
);
id_newtype!(
    /// Identifier of an [`ExitRecord`]. Never reused.
    ExitId,
    "exit#"
);

/// Base identity shared by every kind of entity: name, aliases, title and
/// descriptions. All cross-entity links live outside this struct, expressed
/// as ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCore {
    pub name: String,
    pub aliases: BTreeSet<String>,
    pub title: String,
    pub short_desc: String,
    pub long_desc: String,
}

impl EntityCore {
    pub fn new(name: &str, title: &str) -> Self {
        Self {
            name: name.to_string(),
            aliases: BTreeSet::new(),
            title: title.to_string(),
            short_desc: String::new(),
            long_desc: String::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.insert(alias.to_string());
        self
    }

    pub fn with_short_desc(mut self, desc: &str) -> Self {
        self.short_desc = desc.to_string();
        self
    }

    pub fn with_long_desc(mut self, desc: &str) -> Self {
        self.long_desc = desc.to_string();
        self
    }

    /// True when `query` names this entity (by name or alias,
    /// case-insensitive).
    pub fn answers_to(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        self.name.to_lowercase() == q || self.aliases.iter().any(|a| a.to_lowercase() == q)
    }
}

/// Effect invoked after a living has been recorded as arrived at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalEffect {
    None,
    /// Tell the arriving living `message` if they arrived from this very
    /// location (the alley-of-doors trick).
    EchoOnReentry { message: String },
    /// Raise the story-completion signal for arriving players. The arrival
    /// itself is still recorded first.
    EndStory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: LocationId,
    pub core: EntityCore,
    /// Direction name (or alias) to exit. A single exit may be reachable
    /// under several names.
    pub exits: BTreeMap<String, ExitId>,
    pub items: Vec<ItemId>,
    /// Livings present, in arrival order.
    pub livings: Vec<LivingId>,
    pub arrival: ArrivalEffect,
}

/// The single owner of an item. Exclusivity is enforced by the movement
/// module, which is the only code allowed to change this field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOwner {
    Location(LocationId),
    Container(ItemId),
    Living(LivingId),
    /// Destroyed or not yet placed.
    Nowhere,
}

/// Whether an item can be picked up or pried loose at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldPolicy {
    Portable,
    /// The item never moves; `refusal` is shown for any attempt.
    Fixed { refusal: String },
    /// Once held by a living, only a wizard can get rid of it.
    Cursed { refusal: String },
}

/// Insert/remove policy hook for containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerPolicy {
    Open,
    /// Accepts items but refuses to give them back.
    InsertOnly { refusal: String },
    /// Gives items up but refuses new ones.
    RemoveOnly { refusal: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerState {
    pub policy: ContainerPolicy,
    pub contents: Vec<ItemId>,
}

impl ContainerState {
    pub fn open() -> Self {
        Self {
            policy: ContainerPolicy::Open,
            contents: Vec::new(),
        }
    }
}

/// A hint-journal transition fired by interacting with an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintNudge {
    /// Journal state to advance to.
    pub state: String,
    /// Text told to the actor when the transition fires.
    pub notice: String,
}

/// Description text computed from live world state at query time, never
/// cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicDesc {
    /// A control panel reporting the lock state of named exits in the item's
    /// current location (the alley door computer). The same exits are the
    /// ones its typed commands operate on.
    DoorPanel { exits: Vec<String> },
    /// A clock face showing the current in-story date and time.
    GameClock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: ItemId,
    pub core: EntityCore,
    pub owner: ItemOwner,
    pub hold: HoldPolicy,
    /// Present when the item is a container.
    pub container: Option<ContainerState>,
    /// Credential this item presents to doors.
    pub key_code: Option<u32>,
    /// Hint transition fired when a player ends up holding the item.
    pub on_taken: Option<HintNudge>,
    pub dynamic_desc: Option<DynamicDesc>,
}

/// Access hook for an exit. The default permits everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitAccess {
    Everyone,
    /// Only actors holding `privilege` may pass; others get `refusal`.
    RequirePrivilege {
        privilege: String,
        refusal: String,
        /// Told to a passing actor (the force-field shimmer).
        pass_message: Option<String>,
    },
}

/// Lock/open state and credential of a door. A mirror door on the far side
/// shares only the credential code; its state is deliberately independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorState {
    pub locked: bool,
    pub opened: bool,
    pub code: Option<u32>,
    pub mirror: Option<ExitId>,
    /// Hint transition fired on a successful unlock.
    pub unlock_hint: Option<HintNudge>,
}

impl DoorState {
    pub fn new(locked: bool, opened: bool) -> Self {
        Self {
            locked,
            opened,
            code: None,
            mirror: None,
            unlock_hint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRecord {
    pub id: ExitId,
    pub from: LocationId,
    pub to: LocationId,
    /// Primary direction name; locations may map additional aliases to the
    /// same exit.
    pub direction: String,
    /// Passage description shown when looking around.
    pub description: String,
    pub access: ExitAccess,
    pub door: Option<DoorState>,
}

impl ExitRecord {
    pub fn is_door(&self) -> bool {
        self.door.is_some()
    }
}

/// Autonomous per-tick behavior of an NPC, run by the heartbeat sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcBehavior {
    Passive,
    /// Each heartbeat, `chance_percent` chance to walk through a random exit.
    Wander { chance_percent: u8 },
    /// Each heartbeat, `chance_percent` chance to say the next line.
    Chatter {
        lines: Vec<String>,
        chance_percent: u8,
        #[serde(default)]
        next_line: usize,
    },
}

/// What a living taps: every message told to the target is mirrored to the
/// listener.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WiretapTarget {
    Location(LocationId),
    Living(LivingId),
}

/// Player- or NPC-specific parts of a living.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivingKind {
    Player {
        /// Fire-and-forget output channel, drained by the transport after the
        /// graph is left consistent.
        outbox: VecDeque<String>,
        story_completed: bool,
    },
    Npc {
        /// Entity-level subscription flag; scheduler registration is tracked
        /// separately and reset (not copied) on clone.
        heartbeat: bool,
        behavior: NpcBehavior,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivingRecord {
    pub id: LivingId,
    pub core: EntityCore,
    /// Non-owning back-reference; the location's `livings` set is the owner.
    pub location: LocationId,
    pub inventory: Vec<ItemId>,
    pub privileges: BTreeSet<String>,
    pub hints: crate::world::hints::HintJournal,
    pub wiretaps: Vec<WiretapTarget>,
    pub kind: LivingKind,
}

impl LivingRecord {
    pub fn is_player(&self) -> bool {
        matches!(self.kind, LivingKind::Player { .. })
    }

    pub fn is_wizard(&self) -> bool {
        self.privileges.contains(PRIV_WIZARD)
    }

    /// Queue a line on a player's outbox. NPCs silently ignore output.
    pub fn push_output(&mut self, text: &str) {
        if let LivingKind::Player { outbox, .. } = &mut self.kind {
            outbox.push_back(text.to_string());
        }
    }

    pub fn drain_output(&mut self) -> Vec<String> {
        match &mut self.kind {
            LivingKind::Player { outbox, .. } => outbox.drain(..).collect(),
            LivingKind::Npc { .. } => Vec::new(),
        }
    }
}

/// The privilege that gates administrative verbs and overrides access hooks.
pub const PRIV_WIZARD: &str = "wizard";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_to_matches_name_and_aliases() {
        let core = EntityCore::new("black gem", "a black gem").with_alias("gem");
        assert!(core.answers_to("gem"));
        assert!(core.answers_to("Black Gem"));
        assert!(!core.answers_to("sword"));
    }

    #[test]
    fn npc_output_is_discarded() {
        let mut npc = LivingRecord {
            id: LivingId(1),
            core: EntityCore::new("ant", "an ant"),
            location: LocationId(0),
            inventory: Vec::new(),
            privileges: BTreeSet::new(),
            hints: Default::default(),
            wiretaps: Vec::new(),
            kind: LivingKind::Npc {
                heartbeat: false,
                behavior: NpcBehavior::Passive,
            },
        };
        npc.push_output("hello");
        assert!(npc.drain_output().is_empty());
    }
}
