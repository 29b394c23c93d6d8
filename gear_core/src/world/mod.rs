//! World - the simulated map the runtime reads signals from and applies effects to
//!
//! The host keeps actor signals (mood, pain, placement, apparel, ...) up to
//! date; the core mutates the world only through ability payloads,
//! transformation swaps and gear assignment.

mod actor;
mod item;
mod map;

pub use actor::{Actor, CharacterTrait, Injury, MentalState, StatusEffect};
pub use item::{Item, ItemDef};
pub use map::{AreaEffect, CreatureDef, Faction, FactionRelation, Grid, Thing, ThingDef};

use crate::types::{ActorId, AreaEffectId, CastTarget, CellPos, FactionId, ItemId, ThingId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Complete world state for one map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    /// Current absolute tick
    pub tick: u64,
    pub grid: Grid,
    pub biome: String,
    pub player_faction: Option<FactionId>,
    factions: HashMap<FactionId, Faction>,
    actors: BTreeMap<ActorId, Actor>,
    things: BTreeMap<ThingId, Thing>,
    area_effects: BTreeMap<AreaEffectId, AreaEffect>,
    /// Items lying on the ground
    pub ground_items: Vec<(CellPos, Item)>,
    next_actor: u32,
    next_item: u64,
    next_thing: u32,
    next_area: u32,
}

impl World {
    pub fn new(width: i32, height: i32) -> Self {
        World {
            tick: 0,
            grid: Grid::new(width, height),
            biome: "temperate_forest".to_string(),
            player_faction: None,
            factions: HashMap::new(),
            actors: BTreeMap::new(),
            things: BTreeMap::new(),
            area_effects: BTreeMap::new(),
            ground_items: Vec::new(),
            next_actor: 1,
            next_item: 1,
            next_thing: 1,
            next_area: 1,
        }
    }

    // === Factions ===

    pub fn add_faction(&mut self, name: impl Into<String>) -> FactionId {
        let id = FactionId(self.factions.len() as u32 + 1);
        self.factions.insert(
            id,
            Faction {
                id,
                name: name.into(),
                hostile_to: Default::default(),
                allied_with: Default::default(),
                ideology: Vec::new(),
            },
        );
        id
    }

    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Option<&mut Faction> {
        self.factions.get_mut(&id)
    }

    /// Declare two factions mutually hostile
    pub fn set_hostile(&mut self, a: FactionId, b: FactionId) {
        if let Some(f) = self.factions.get_mut(&a) {
            f.hostile_to.insert(b);
        }
        if let Some(f) = self.factions.get_mut(&b) {
            f.hostile_to.insert(a);
        }
    }

    pub fn set_allied(&mut self, a: FactionId, b: FactionId) {
        if let Some(f) = self.factions.get_mut(&a) {
            f.allied_with.insert(b);
        }
        if let Some(f) = self.factions.get_mut(&b) {
            f.allied_with.insert(a);
        }
    }

    pub fn relation(&self, a: Option<FactionId>, b: Option<FactionId>) -> FactionRelation {
        let (Some(a), Some(b)) = (a, b) else {
            return FactionRelation::Unaffiliated;
        };
        if a == b {
            return FactionRelation::Same;
        }
        let Some(fa) = self.factions.get(&a) else {
            return FactionRelation::Neutral;
        };
        if fa.hostile_to.contains(&b) {
            FactionRelation::Hostile
        } else if fa.allied_with.contains(&b) {
            FactionRelation::Ally
        } else {
            FactionRelation::Neutral
        }
    }

    /// Whether an actor's faction is hostile to the player faction
    pub fn is_hostile_to_player(&self, actor: &Actor) -> bool {
        self.relation(actor.faction, self.player_faction) == FactionRelation::Hostile
    }

    pub fn ideology_of(&self, faction: Option<FactionId>) -> &[String] {
        faction
            .and_then(|f| self.factions.get(&f))
            .map(|f| f.ideology.as_slice())
            .unwrap_or(&[])
    }

    // === Actors ===

    /// Add an actor, assigning it a fresh id
    pub fn add_actor(&mut self, mut actor: Actor) -> ActorId {
        let id = ActorId(self.next_actor);
        self.next_actor += 1;
        actor.id = id;
        self.actors.insert(id, actor);
        id
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.actors.remove(&id)
    }

    /// Actors in id order
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Living placed actor standing on a cell
    pub fn actor_at(&self, cell: CellPos) -> Option<ActorId> {
        self.actors
            .values()
            .find(|a| a.is_alive() && a.position == Some(cell))
            .map(|a| a.id)
    }

    /// Living placed actors within `radius` of `center`, in id order
    pub fn actors_within(&self, center: CellPos, radius: f32) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|a| a.is_alive() && a.position.is_some_and(|p| p.within(center, radius)))
            .map(|a| a.id)
            .collect()
    }

    // === Cells ===

    pub fn light_at(&self, cell: CellPos) -> f32 {
        self.grid.light_at(cell)
    }

    /// In bounds, not blocked terrain, no impassable thing
    pub fn is_passable(&self, cell: CellPos) -> bool {
        self.grid.in_bounds(cell)
            && !self.grid.blocked.contains(&cell)
            && !self.things.values().any(|t| !t.passable && t.position == cell)
    }

    /// Cell a cast target occupies
    pub fn target_cell(&self, target: CastTarget) -> Option<CellPos> {
        match target {
            CastTarget::Cell(cell) => Some(cell),
            CastTarget::Actor(id) => self.actor(id).and_then(|a| a.position),
            CastTarget::Thing(id) => self.thing(id).map(|t| t.position),
        }
    }

    /// Passable and not occupied by a living actor
    pub fn is_standable(&self, cell: CellPos) -> bool {
        self.is_passable(cell) && self.actor_at(cell).is_none()
    }

    // === Items ===

    pub fn next_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item += 1;
        id
    }

    /// Make sure freshly allocated item ids never collide with restored ones
    pub fn reserve_item_id(&mut self, id: ItemId) {
        if id.0 >= self.next_item {
            self.next_item = id.0 + 1;
        }
    }

    /// Put an item on the ground near a cell (origin when unknown)
    pub fn drop_item(&mut self, item: Item, near: Option<CellPos>) {
        let cell = near.unwrap_or_default();
        tracing::debug!(item = %item.id, def = %item.def, %cell, "dropping item");
        self.ground_items.push((cell, item));
    }

    // === Things ===

    pub fn spawn_thing(&mut self, def: &ThingDef, position: CellPos, faction: Option<FactionId>) -> ThingId {
        let id = ThingId(self.next_thing);
        self.next_thing += 1;
        self.things.insert(
            id,
            Thing {
                id,
                def: def.name.clone(),
                position,
                faction,
                passable: def.passable,
            },
        );
        id
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.things.get(&id)
    }

    pub fn things(&self) -> impl Iterator<Item = &Thing> {
        self.things.values()
    }

    pub fn despawn_thing(&mut self, id: ThingId) -> bool {
        self.things.remove(&id).is_some()
    }

    // === Area effects ===

    pub fn add_area_effect(&mut self, def: impl Into<String>, center: CellPos, radius: f32) -> AreaEffectId {
        let id = AreaEffectId(self.next_area);
        self.next_area += 1;
        self.area_effects.insert(
            id,
            AreaEffect {
                id,
                def: def.into(),
                center,
                radius,
            },
        );
        id
    }

    pub fn area_effect(&self, id: AreaEffectId) -> Option<&AreaEffect> {
        self.area_effects.get(&id)
    }

    pub fn area_effects(&self) -> impl Iterator<Item = &AreaEffect> {
        self.area_effects.values()
    }

    pub fn remove_area_effect(&mut self, id: AreaEffectId) -> bool {
        self.area_effects.remove(&id).is_some()
    }
}
