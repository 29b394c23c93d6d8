//! Runtime - owns the world and every gear service, driven by the host
//!
//! The host calls [`Runtime::tick`] once per simulation tick and forwards
//! discrete events through the `on_*` hooks. Services (gear registry,
//! temporary registry, selection engine, warn-once set, render probe cache)
//! are constructed once here and handed by reference to the code that needs
//! them.

use crate::ability::{self, CastDenied, EffectContext};
use crate::config::ContentLibrary;
use crate::gear::{GearInstance, GearRegistry, GearSave, SaveError};
use crate::selection::{SelectionEngine, SelectionRunState, TriggerEvent};
use crate::temporary::TemporaryRegistry;
use crate::transform::{self, RenderProbeCache};
use crate::types::{AbilityId, ActorId, CastTarget, GearDefId, GearInstanceId};
use crate::warn_once::WarnOnce;
use crate::world::{Item, World};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a runtime call naming something that does not exist, or a denied cast
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("unknown actor {0}")]
    UnknownActor(ActorId),
    #[error("unknown gear instance {0}")]
    UnknownGear(GearInstanceId),
    #[error("unknown gear definition {0}")]
    UnknownDefinition(GearDefId),
    #[error("unknown ability {0}")]
    UnknownAbility(AbilityId),
    #[error("cast denied: {0}")]
    Denied(#[from] CastDenied),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Everything needed to resume a runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSave {
    pub world: World,
    pub gear: Vec<GearSave>,
    pub temporaries: TemporaryRegistry,
    pub selections: BTreeMap<String, SelectionRunState>,
}

impl RuntimeSave {
    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub struct Runtime<R: Rng> {
    world: World,
    library: Arc<ContentLibrary>,
    gear: GearRegistry,
    temporaries: TemporaryRegistry,
    selections: SelectionEngine,
    warn_once: WarnOnce,
    probes: RenderProbeCache,
    rng: R,
}

impl<R: Rng> Runtime<R> {
    pub fn new(world: World, library: Arc<ContentLibrary>, rng: R) -> Self {
        Runtime {
            world,
            library,
            gear: GearRegistry::new(),
            temporaries: TemporaryRegistry::new(),
            selections: SelectionEngine::new(),
            warn_once: WarnOnce::new(),
            probes: RenderProbeCache::new(),
            rng,
        }
    }

    // === Accessors ===

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Host-side signal updates go through here
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    pub fn gear(&self) -> &GearRegistry {
        &self.gear
    }

    pub fn gear_instance(&self, id: GearInstanceId) -> Result<&GearInstance, RuntimeError> {
        self.gear.get(id).ok_or(RuntimeError::UnknownGear(id))
    }

    pub fn temporaries(&self) -> &TemporaryRegistry {
        &self.temporaries
    }

    /// For registering custom scoring conditions
    pub fn selections_mut(&mut self) -> &mut SelectionEngine {
        &mut self.selections
    }

    pub fn selections(&self) -> &SelectionEngine {
        &self.selections
    }

    pub fn now(&self) -> u64 {
        self.world.tick
    }

    // === Tick ===

    /// Advance one raw tick: charge, transformations, expiry sweep and periodic selections
    pub fn tick(&mut self) -> Vec<GearInstanceId> {
        self.world.tick += 1;
        let now = self.world.tick;
        let library = Arc::clone(&self.library);
        let tunables = library.tunables();

        for id in self.gear.ids() {
            let Some(gear) = self.gear.get_mut(id) else {
                continue;
            };
            let Some(def) = library.gear(gear.def) else {
                let key = format!("gear-def:{}", gear.def);
                self.warn_once.warn(&key, format!("{} has no definition", gear.def));
                continue;
            };
            gear.tick(def, &self.world, tunables);
            transform::update(gear, def, &mut self.world, &library, &mut self.probes, now, tunables);
        }

        if now % tunables.sweep_cadence_ticks.max(1) == 0 {
            self.temporaries.sweep(now, &mut self.world);
            self.probes.prune(now);
        }
        if now % tunables.periodic_check_ticks.max(1) == 0 {
            return self.fire(TriggerEvent::Periodic);
        }
        Vec::new()
    }

    // === Triggers ===

    /// Evaluate every selection listening for `event`. Returns the gear equipped as a result.
    pub fn fire(&mut self, event: TriggerEvent) -> Vec<GearInstanceId> {
        let now = self.world.tick;
        let library = Arc::clone(&self.library);
        let window = library.tunables().periodic_check_ticks;
        let mut equipped = Vec::new();

        for def in library.selections() {
            if !def.triggers.iter().any(|t| t.matches(&event, now, window)) {
                continue;
            }
            if !self.selections.can_run(def, self.gear.active_count(def.gear_id)) {
                continue;
            }
            let registry = &self.gear;
            let winner = self.selections.evaluate(
                def,
                &event,
                &self.world,
                |actor| registry.is_wearing(actor, def.gear_id),
                &mut self.rng,
                now,
            );
            let assigned = match winner {
                Some(actor) => match self.equip(actor, def.gear_id) {
                    Ok(id) => {
                        tracing::info!(selection = %def.name, %actor, gear = %id, "gear assigned");
                        equipped.push(id);
                        true
                    }
                    Err(err) => {
                        tracing::warn!(selection = %def.name, %actor, %err, "assignment failed");
                        false
                    }
                },
                None => false,
            };
            self.selections.record_run(def, assigned);
        }
        equipped
    }

    pub fn on_actor_joined(&mut self, actor: ActorId) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::ActorJoined(actor))
    }

    pub fn on_actor_spawned(&mut self, actor: ActorId) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::ActorSpawned(actor))
    }

    pub fn on_actor_downed(&mut self, actor: ActorId) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::ActorDowned(actor))
    }

    pub fn on_mental_state_started(&mut self, actor: ActorId, state: impl Into<String>) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::MentalStateStarted {
            actor,
            state: state.into(),
        })
    }

    pub fn on_actor_killed(&mut self, killer: ActorId, victim: ActorId) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::ActorKilled { killer, victim })
    }

    pub fn on_status_added(&mut self, actor: ActorId, status: impl Into<String>) -> Vec<GearInstanceId> {
        self.fire(TriggerEvent::StatusAdded {
            actor,
            status: status.into(),
        })
    }

    // === Equip / unequip ===

    /// Create the gear item, put it on `actor` and start a full-charge instance
    pub fn equip(&mut self, actor: ActorId, def: GearDefId) -> Result<GearInstanceId, RuntimeError> {
        let library = Arc::clone(&self.library);
        let gear_def = library.gear(def).ok_or(RuntimeError::UnknownDefinition(def))?;
        if self.world.actor(actor).is_none() {
            return Err(RuntimeError::UnknownActor(actor));
        }

        let item_id = self.world.next_item_id();
        let mut item = Item::new(item_id, gear_def.item.clone());
        if let Some(item_def) = library.item_def(&gear_def.item) {
            item.hit_points = item_def.hit_points;
        }
        let wearer = self.world.actor_mut(actor).ok_or(RuntimeError::UnknownActor(actor))?;
        wearer.apparel.push(item);

        let id = self.gear.allocate_id();
        let mut gear = GearInstance::new(id, gear_def, item_id, actor);
        let now = self.world.tick;
        transform::update(
            &mut gear,
            gear_def,
            &mut self.world,
            &library,
            &mut self.probes,
            now,
            library.tunables(),
        );
        self.gear.insert(gear);
        tracing::debug!(gear = %id, def = %gear_def.name, %actor, "equipped");
        Ok(id)
    }

    /// Tear an instance down: revert its costume, return stored items and take off the gear item
    pub fn unequip(&mut self, id: GearInstanceId) -> Result<Option<Item>, RuntimeError> {
        let mut gear = self.gear.remove(id).ok_or(RuntimeError::UnknownGear(id))?;
        if gear.transform.applied || !gear.transform.stored.is_empty() || gear.transform.body_shape_overridden {
            transform::revert(&mut gear, &mut self.world, &self.library);
        }
        let item = self.world.actor_mut(gear.wearer).and_then(|wearer| {
            let index = wearer.apparel.iter().position(|i| i.id == gear.item)?;
            Some(wearer.apparel.remove(index))
        });
        tracing::debug!(gear = %id, wearer = %gear.wearer, "unequipped");
        Ok(item)
    }

    // === Casting ===

    fn granted(&self, id: GearInstanceId, ability: AbilityId) -> Result<(), RuntimeError> {
        let gear = self.gear_instance(id)?;
        let def = self.library.gear(gear.def).ok_or(RuntimeError::UnknownDefinition(gear.def))?;
        if !def.ability_ids.contains(&ability) {
            return Err(CastDenied::AbilityNotGranted.into());
        }
        Ok(())
    }

    /// Run the gates without changing anything
    pub fn check_cast(&self, id: GearInstanceId, ability: AbilityId, target: CastTarget) -> Result<(), RuntimeError> {
        self.granted(id, ability)?;
        let gear = self.gear_instance(id)?;
        let def = self.library.ability(ability).ok_or(RuntimeError::UnknownAbility(ability))?;
        ability::check_cast(gear, def, &self.world, target, self.world.tick, self.library.tunables())?;
        Ok(())
    }

    pub fn cast(&mut self, id: GearInstanceId, ability: AbilityId, target: CastTarget) -> Result<(), RuntimeError> {
        self.granted(id, ability)?;
        let library = Arc::clone(&self.library);
        let def = library.ability(ability).ok_or(RuntimeError::UnknownAbility(ability))?;
        let now = self.world.tick;
        let gear = self.gear.get_mut(id).ok_or(RuntimeError::UnknownGear(id))?;
        let mut ctx = EffectContext {
            world: &mut self.world,
            temporaries: &mut self.temporaries,
            library: &library,
            warn_once: &mut self.warn_once,
            rng: &mut self.rng,
            caster: gear.wearer,
            now,
        };
        ability::cast(gear, def, target, &mut ctx, library.tunables())?;
        Ok(())
    }

    // === Toggles ===

    pub fn engage_stealth(&mut self, id: GearInstanceId) -> Result<(), RuntimeError> {
        let gear = self.gear.get_mut(id).ok_or(RuntimeError::UnknownGear(id))?;
        let def = self.library.gear(gear.def).ok_or(RuntimeError::UnknownDefinition(gear.def))?;
        let wearer = self.world.actor(gear.wearer).ok_or(RuntimeError::UnknownActor(gear.wearer))?;
        gear.try_engage_stealth(def, wearer)?;
        tracing::info!(gear = %id, wearer = %gear.wearer, "stealth engaged");
        Ok(())
    }

    pub fn disengage_stealth(&mut self, id: GearInstanceId) -> Result<(), RuntimeError> {
        self.gear.get_mut(id).ok_or(RuntimeError::UnknownGear(id))?.disengage_stealth();
        Ok(())
    }

    /// Offer an incoming hit on `actor` to each worn gear in id order. `true` when one negated it.
    pub fn try_evade_hit(&mut self, actor: ActorId) -> bool {
        let now = self.world.tick;
        let Some(wearer) = self.world.actor(actor) else {
            return false;
        };
        let worn: Vec<GearInstanceId> = self.gear.worn_by(actor).map(|g| g.id).collect();
        for id in worn {
            let Some(gear) = self.gear.get_mut(id) else {
                continue;
            };
            let Some(def) = self.library.gear(gear.def) else {
                continue;
            };
            if gear.try_reactive_evade(def, wearer, now, self.library.tunables()) {
                return true;
            }
        }
        false
    }

    pub fn set_manual_toggle(&mut self, id: GearInstanceId, enabled: bool) -> Result<(), RuntimeError> {
        let library = Arc::clone(&self.library);
        let now = self.world.tick;
        let gear = self.gear.get_mut(id).ok_or(RuntimeError::UnknownGear(id))?;
        let def = library.gear(gear.def).ok_or(RuntimeError::UnknownDefinition(gear.def))?;
        transform::set_manual_toggle(
            gear,
            def,
            enabled,
            &mut self.world,
            &library,
            &mut self.probes,
            now,
            library.tunables(),
        );
        Ok(())
    }

    // === Persistence ===

    pub fn save(&self) -> Result<RuntimeSave, RuntimeError> {
        let gear = self
            .gear
            .iter()
            .map(|g| GearSave::capture(g, &self.library))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuntimeSave {
            world: self.world.clone(),
            gear,
            temporaries: self.temporaries.clone(),
            selections: self.selections.run_states().clone(),
        })
    }

    /// Resume from a save. Custom scoring conditions must be registered again.
    pub fn load(save: RuntimeSave, library: Arc<ContentLibrary>, rng: R) -> Result<Self, RuntimeError> {
        let mut runtime = Runtime::new(save.world, library, rng);
        for entry in &save.gear {
            let gear = entry.restore(&runtime.library)?;
            runtime.gear.insert(gear);
        }
        runtime.temporaries = save.temporaries;
        runtime.selections.restore_run_states(save.selections);
        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDefinition, AbilityEffect, ChargeCost, Heal};
    use crate::gear::GearDefinition;
    use crate::types::CellPos;
    use crate::world::{Actor, Injury};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn runtime() -> (Runtime<ChaCha8Rng>, ActorId) {
        let mut library = ContentLibrary::default();
        library.add_ability(
            AbilityDefinition::new("mend")
                .with_effect(AbilityEffect::Cost(ChargeCost {
                    cost: 0.2,
                    required: None,
                }))
                .with_effect(AbilityEffect::Heal(Heal {
                    amount: 10.0,
                    radius: None,
                    include_hostile: false,
                })),
        );
        let mut def = GearDefinition::new("amulet", "amulet");
        def.abilities = vec!["mend".into()];
        library.add_gear(def);

        let mut world = World::new(10, 10);
        let colony = world.add_faction("colony");
        world.player_faction = Some(colony);
        let actor = world.add_actor(Actor::humanlike("Wearer", Some(colony)).at(CellPos::new(2, 2)));
        (Runtime::new(world, Arc::new(library), ChaCha8Rng::seed_from_u64(42)), actor)
    }

    #[test]
    fn test_equip_cast_unequip() {
        let (mut rt, actor) = runtime();
        let def = rt.library().gear_id("amulet").unwrap();
        let mend = rt.library().ability_id("mend").unwrap();
        let id = rt.equip(actor, def).unwrap();
        rt.world_mut().actor_mut(actor).unwrap().injuries.push(Injury {
            label: "cut".into(),
            severity: 6.0,
        });

        rt.cast(id, mend, CastTarget::Actor(actor)).unwrap();
        assert!(rt.world().actor(actor).unwrap().injuries.is_empty());
        assert!((rt.gear_instance(id).unwrap().charge() - 80.0).abs() < 1e-9);

        let item = rt.unequip(id).unwrap().unwrap();
        assert_eq!(item.def, "amulet");
        assert!(rt.world().actor(actor).unwrap().apparel.is_empty());
        assert!(matches!(rt.unequip(id), Err(RuntimeError::UnknownGear(_))));
    }

    #[test]
    fn test_ungranted_ability_is_denied() {
        let (mut rt, actor) = runtime();
        let def = rt.library().gear_id("amulet").unwrap();
        let id = rt.equip(actor, def).unwrap();
        let err = rt.cast(id, AbilityId(99), CastTarget::Actor(actor)).unwrap_err();
        assert!(matches!(err, RuntimeError::Denied(CastDenied::AbilityNotGranted)));
    }

    #[test]
    fn test_save_and_load() {
        let (mut rt, actor) = runtime();
        let def = rt.library().gear_id("amulet").unwrap();
        let id = rt.equip(actor, def).unwrap();
        let mend = rt.library().ability_id("mend").unwrap();
        rt.cast(id, mend, CastTarget::Actor(actor)).unwrap();

        let json = rt.save().unwrap().to_json().unwrap();
        let library = Arc::new(ContentLibrary::default());
        assert!(Runtime::load(RuntimeSave::from_json(&json).unwrap(), library, ChaCha8Rng::seed_from_u64(1)).is_err());

        let mut library = ContentLibrary::default();
        library.add_ability(AbilityDefinition::new("mend"));
        let mut amulet = GearDefinition::new("amulet", "amulet");
        amulet.abilities = vec!["mend".into()];
        library.add_gear(amulet);
        let restored = Runtime::load(
            RuntimeSave::from_json(&json).unwrap(),
            Arc::new(library),
            ChaCha8Rng::seed_from_u64(1),
        )
        .unwrap();
        assert!((restored.gear_instance(id).unwrap().charge() - 80.0).abs() < 1e-9);
        assert!(restored.world().actor(actor).unwrap().is_wearing(rt.gear_instance(id).unwrap().item));
    }
}
