//! Central entity registry.
//!
//! Every entity lives in one arena map keyed by its id; all cross-entity
//! links (exits, back-references, inventories, wiretaps) are plain ids looked
//! up here, never owned pointers. Ids come from monotone counters and are
//! never reused, so "is this id still in the map" is a sound liveness check.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::world::errors::WorldError;
use crate::world::types::{
    ArrivalEffect, EntityCore, ExitAccess, ExitId, ExitRecord, ItemId, ItemRecord, LivingId,
    LivingKind, LivingRecord, LocationId, LocationRecord,
};

/// An entry in the administrative catalog: world-load code registers
/// interesting entities under stable path-like ids (`town.square`) so
/// privileged commands can address them without any reflection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntry {
    Location(LocationId),
    Item(ItemId),
    Living(LivingId),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    next_location: u64,
    next_item: u64,
    next_living: u64,
    next_exit: u64,
    pub locations: BTreeMap<LocationId, LocationRecord>,
    pub items: BTreeMap<ItemId, ItemRecord>,
    pub livings: BTreeMap<LivingId, LivingRecord>,
    pub exits: BTreeMap<ExitId, ExitRecord>,
    catalog: BTreeMap<String, CatalogEntry>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- allocation ------------------------------------------------------

    pub fn add_location(&mut self, core: EntityCore) -> LocationId {
        let id = LocationId(self.next_location);
        self.next_location += 1;
        self.locations.insert(
            id,
            LocationRecord {
                id,
                core,
                exits: BTreeMap::new(),
                items: Vec::new(),
                livings: Vec::new(),
                arrival: ArrivalEffect::None,
            },
        );
        id
    }

    pub fn add_item(&mut self, mut record: ItemRecord) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        record.id = id;
        self.items.insert(id, record);
        id
    }

    pub fn add_living(&mut self, mut record: LivingRecord) -> LivingId {
        let id = LivingId(self.next_living);
        self.next_living += 1;
        record.id = id;
        let location = record.location;
        self.livings.insert(id, record);
        if let Some(loc) = self.locations.get_mut(&location) {
            loc.livings.push(id);
        }
        id
    }

    /// Create an exit and bind it to its source location under `direction`.
    pub fn add_exit(
        &mut self,
        from: LocationId,
        to: LocationId,
        direction: &str,
        description: &str,
    ) -> ExitId {
        let id = ExitId(self.next_exit);
        self.next_exit += 1;
        self.exits.insert(
            id,
            ExitRecord {
                id,
                from,
                to,
                direction: direction.to_string(),
                description: description.to_string(),
                access: ExitAccess::Everyone,
                door: None,
            },
        );
        if let Some(loc) = self.locations.get_mut(&from) {
            loc.exits.insert(direction.to_string(), id);
        }
        id
    }

    /// Register an extra direction name for an existing exit ("lane" for the
    /// north exit).
    pub fn alias_exit(&mut self, location: LocationId, alias: &str, exit: ExitId) {
        if let Some(loc) = self.locations.get_mut(&location) {
            loc.exits.insert(alias.to_string(), exit);
        }
    }

    // ----- lookups ---------------------------------------------------------

    pub fn location(&self, id: LocationId) -> Result<&LocationRecord, WorldError> {
        self.locations
            .get(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn location_mut(&mut self, id: LocationId) -> Result<&mut LocationRecord, WorldError> {
        self.locations
            .get_mut(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn item(&self, id: ItemId) -> Result<&ItemRecord, WorldError> {
        self.items
            .get(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn item_mut(&mut self, id: ItemId) -> Result<&mut ItemRecord, WorldError> {
        self.items
            .get_mut(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn living(&self, id: LivingId) -> Result<&LivingRecord, WorldError> {
        self.livings
            .get(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn living_mut(&mut self, id: LivingId) -> Result<&mut LivingRecord, WorldError> {
        self.livings
            .get_mut(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn exit(&self, id: ExitId) -> Result<&ExitRecord, WorldError> {
        self.exits
            .get(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    pub fn exit_mut(&mut self, id: ExitId) -> Result<&mut ExitRecord, WorldError> {
        self.exits
            .get_mut(&id)
            .ok_or_else(|| WorldError::NotFound(format!("{id}")))
    }

    // ----- catalog ---------------------------------------------------------

    pub fn register(&mut self, path: &str, entry: CatalogEntry) {
        self.catalog.insert(path.to_string(), entry);
    }

    pub fn catalog_get(&self, path: &str) -> Option<CatalogEntry> {
        self.catalog.get(path).copied()
    }

    pub fn catalog_iter(&self) -> impl Iterator<Item = (&str, CatalogEntry)> {
        self.catalog.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Look up a location by its catalog path.
    pub fn location_by_path(&self, path: &str) -> Option<LocationId> {
        match self.catalog_get(path) {
            Some(CatalogEntry::Location(id)) => Some(id),
            _ => None,
        }
    }

    // ----- name resolution -------------------------------------------------

    /// Find an item in a living's inventory by name or alias.
    pub fn find_in_inventory(&self, living: LivingId, name: &str) -> Option<ItemId> {
        let living = self.livings.get(&living)?;
        living
            .inventory
            .iter()
            .copied()
            .find(|id| self.items.get(id).is_some_and(|i| i.core.answers_to(name)))
    }

    /// Find an item lying in a location by name or alias.
    pub fn find_item_at(&self, location: LocationId, name: &str) -> Option<ItemId> {
        let loc = self.locations.get(&location)?;
        loc.items
            .iter()
            .copied()
            .find(|id| self.items.get(id).is_some_and(|i| i.core.answers_to(name)))
    }

    /// Find an item inside a container by name or alias.
    pub fn find_in_container(&self, container: ItemId, name: &str) -> Option<ItemId> {
        let state = self.items.get(&container)?.container.as_ref()?;
        state
            .contents
            .iter()
            .copied()
            .find(|id| self.items.get(id).is_some_and(|i| i.core.answers_to(name)))
    }

    /// Find a living present in a location by name or alias.
    pub fn find_living_at(&self, location: LocationId, name: &str) -> Option<LivingId> {
        let loc = self.locations.get(&location)?;
        loc.livings.iter().copied().find(|id| {
            self.livings
                .get(id)
                .is_some_and(|l| l.core.answers_to(name))
        })
    }

    /// Resolve an item the actor can reach: own inventory first, then the
    /// current location. This is the standard handler search order.
    pub fn resolve_item(&self, actor: LivingId, name: &str) -> Option<ItemId> {
        let location = self.livings.get(&actor)?.location;
        self.find_in_inventory(actor, name)
            .or_else(|| self.find_item_at(location, name))
    }

    /// Find any connected player by name (administrative lookup).
    pub fn find_player(&self, name: &str) -> Option<LivingId> {
        self.livings
            .values()
            .find(|l| l.is_player() && l.core.answers_to(name))
            .map(|l| l.id)
    }

    /// All connected players, in creation order.
    pub fn players(&self) -> impl Iterator<Item = &LivingRecord> {
        self.livings.values().filter(|l| l.is_player())
    }

    /// Remove a living from the arena. Callers (the movement module) are
    /// responsible for detaching it from its location first.
    pub(crate) fn remove_living(&mut self, id: LivingId) -> Option<LivingRecord> {
        self.livings.remove(&id)
    }

    pub(crate) fn remove_item(&mut self, id: ItemId) -> Option<ItemRecord> {
        self.items.remove(&id)
    }

    /// NPCs whose entity-level heartbeat flag is set, in creation order.
    pub fn heartbeat_npcs(&self) -> Vec<LivingId> {
        self.livings
            .values()
            .filter(|l| matches!(l.kind, LivingKind::Npc { heartbeat: true, .. }))
            .map(|l| l.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::{HoldPolicy, ItemOwner, LivingKind, NpcBehavior};
    use std::collections::{BTreeSet, VecDeque};

    fn bare_item(name: &str) -> ItemRecord {
        ItemRecord {
            id: ItemId(0),
            core: EntityCore::new(name, name),
            owner: ItemOwner::Nowhere,
            hold: HoldPolicy::Portable,
            container: None,
            key_code: None,
            on_taken: None,
            dynamic_desc: None,
        }
    }

    fn bare_living(name: &str, location: LocationId, kind: LivingKind) -> LivingRecord {
        LivingRecord {
            id: LivingId(0),
            core: EntityCore::new(name, name),
            location,
            inventory: Vec::new(),
            privileges: BTreeSet::new(),
            hints: Default::default(),
            wiretaps: Vec::new(),
            kind,
        }
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = World::new();
        let a = world.add_item(bare_item("gem"));
        world.remove_item(a);
        let b = world.add_item(bare_item("gem"));
        assert_ne!(a, b);
        assert!(world.item(a).is_err());
        assert!(world.item(b).is_ok());
    }

    #[test]
    fn catalog_lookup_by_path() {
        let mut world = World::new();
        let square = world.add_location(EntityCore::new("Town square", "the town square"));
        world.register("town.square", CatalogEntry::Location(square));
        assert_eq!(world.location_by_path("town.square"), Some(square));
        assert_eq!(world.location_by_path("town.missing"), None);
    }

    #[test]
    fn resolve_item_prefers_inventory() {
        let mut world = World::new();
        let square = world.add_location(EntityCore::new("square", "the square"));
        let held = world.add_item(bare_item("gem"));
        let floor = world.add_item(bare_item("gem"));
        let actor = world.add_living(bare_living(
            "alice",
            square,
            LivingKind::Player {
                outbox: VecDeque::new(),
                story_completed: false,
            },
        ));
        world.livings.get_mut(&actor).unwrap().inventory.push(held);
        world.items.get_mut(&held).unwrap().owner = ItemOwner::Living(actor);
        world.locations.get_mut(&square).unwrap().items.push(floor);
        world.items.get_mut(&floor).unwrap().owner = ItemOwner::Location(square);

        assert_eq!(world.resolve_item(actor, "gem"), Some(held));
    }

    #[test]
    fn heartbeat_listing_is_creation_order() {
        let mut world = World::new();
        let square = world.add_location(EntityCore::new("square", "the square"));
        let rat = world.add_living(bare_living(
            "rat",
            square,
            LivingKind::Npc {
                heartbeat: true,
                behavior: NpcBehavior::Passive,
            },
        ));
        let ant = world.add_living(bare_living(
            "ant",
            square,
            LivingKind::Npc {
                heartbeat: false,
                behavior: NpcBehavior::Passive,
            },
        ));
        let crier = world.add_living(bare_living(
            "crier",
            square,
            LivingKind::Npc {
                heartbeat: true,
                behavior: NpcBehavior::Passive,
            },
        ));
        let _ = ant;
        assert_eq!(world.heartbeat_npcs(), vec![rat, crier]);
    }
}
