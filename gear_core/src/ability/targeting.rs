//! Target classification and the target-rule gate

use super::CastDenied;
use crate::types::{ActorId, CastTarget, FactionId, TargetClass};
use crate::world::{Actor, FactionRelation, World};
use serde::{Deserialize, Serialize};

/// Which target classes an ability may be aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRule {
    pub allow_self: bool,
    pub allow_allies: bool,
    pub allow_neutral: bool,
    pub allow_hostile: bool,
    pub allow_no_faction: bool,
}

impl Default for TargetRule {
    fn default() -> Self {
        TargetRule {
            allow_self: true,
            allow_allies: true,
            allow_neutral: true,
            allow_hostile: true,
            allow_no_faction: true,
        }
    }
}

impl TargetRule {
    /// Only hostile targets
    pub fn hostile_only() -> Self {
        TargetRule {
            allow_self: false,
            allow_allies: false,
            allow_neutral: false,
            allow_hostile: true,
            allow_no_faction: false,
        }
    }

    /// Self and allies
    pub fn friendly_only() -> Self {
        TargetRule {
            allow_self: true,
            allow_allies: true,
            allow_neutral: false,
            allow_hostile: false,
            allow_no_faction: false,
        }
    }

    pub fn allows(&self, class: TargetClass) -> bool {
        match class {
            TargetClass::Caster => self.allow_self,
            TargetClass::Allied => self.allow_allies,
            TargetClass::Neutral => self.allow_neutral,
            TargetClass::Hostile => self.allow_hostile,
            TargetClass::NoFaction => self.allow_no_faction,
        }
    }

    /// Gate check against a concrete target
    pub fn check(&self, world: &World, caster: &Actor, target: CastTarget) -> Result<(), CastDenied> {
        match classify_target(world, caster, target)? {
            None => Ok(()),
            Some(class) if self.allows(class) => Ok(()),
            Some(class) => Err(CastDenied::TargetNotAllowed { class }),
        }
    }
}

/// Classify a target relative to the caster.
///
/// Returns `Ok(None)` for a bare cell, which every rule allows.
pub fn classify_target(world: &World, caster: &Actor, target: CastTarget) -> Result<Option<TargetClass>, CastDenied> {
    match target {
        CastTarget::Cell(_) => Ok(None),
        CastTarget::Actor(id) => {
            let actor = world.actor(id).ok_or(CastDenied::InvalidTarget)?;
            Ok(Some(classify_actor(world, caster, actor)))
        }
        CastTarget::Thing(id) => {
            let thing = world.thing(id).ok_or(CastDenied::InvalidTarget)?;
            Ok(Some(classify_faction(world, caster.faction, thing.faction)))
        }
    }
}

pub fn classify_actor(world: &World, caster: &Actor, target: &Actor) -> TargetClass {
    if target.id == caster.id {
        return TargetClass::Caster;
    }
    // Aggressive mental states (manhunters, berserkers) are hostile regardless of faction
    if target.mental_state.as_ref().is_some_and(|m| m.aggressive) {
        return TargetClass::Hostile;
    }
    classify_faction(world, caster.faction, target.faction)
}

fn classify_faction(world: &World, caster: Option<FactionId>, target: Option<FactionId>) -> TargetClass {
    if target.is_none() {
        return TargetClass::NoFaction;
    }
    match world.relation(caster, target) {
        FactionRelation::Same | FactionRelation::Ally => TargetClass::Allied,
        FactionRelation::Hostile => TargetClass::Hostile,
        FactionRelation::Neutral | FactionRelation::Unaffiliated => TargetClass::Neutral,
    }
}

/// Whether `other` should be spared by an area effect cast by `caster`
pub(crate) fn is_friendly(world: &World, caster: ActorId, other: ActorId) -> bool {
    let (Some(c), Some(o)) = (world.actor(caster), world.actor(other)) else {
        return false;
    };
    matches!(classify_actor(world, c, o), TargetClass::Caster | TargetClass::Allied)
}
