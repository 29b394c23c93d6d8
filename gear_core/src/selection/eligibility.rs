//! Eligibility filters applied before scoring

use crate::types::{ActorKind, ActorRole};
use crate::world::{Actor, World};
use serde::{Deserialize, Serialize};

/// Who may be considered at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eligibility {
    pub allow_colonists: bool,
    pub allow_prisoners: bool,
    pub allow_slaves: bool,
    pub allow_guests: bool,
    pub allow_animals: bool,
    pub allow_mechanoids: bool,
    pub allow_hostile: bool,
    pub allow_dead: bool,
    pub allow_downed: bool,
    pub require_violence_capable: bool,
    /// Skip actors already wearing this gear
    pub exclude_wearers: bool,
}

impl Default for Eligibility {
    fn default() -> Self {
        Eligibility {
            allow_colonists: true,
            allow_prisoners: false,
            allow_slaves: false,
            allow_guests: false,
            allow_animals: false,
            allow_mechanoids: false,
            allow_hostile: false,
            allow_dead: false,
            allow_downed: false,
            require_violence_capable: false,
            exclude_wearers: true,
        }
    }
}

impl Eligibility {
    fn category_allowed(&self, actor: &Actor, world: &World) -> bool {
        let hostile = world.is_hostile_to_player(actor) || actor.mental_state.as_ref().is_some_and(|m| m.aggressive);
        if hostile && !self.allow_hostile {
            return false;
        }
        match actor.kind {
            ActorKind::Animal => self.allow_animals,
            ActorKind::Mechanoid => self.allow_mechanoids,
            ActorKind::Anomaly => false,
            ActorKind::Humanlike => match actor.role {
                ActorRole::Colonist => self.allow_colonists,
                ActorRole::Prisoner => self.allow_prisoners,
                ActorRole::Slave => self.allow_slaves,
                ActorRole::Guest => self.allow_guests,
                ActorRole::Outsider if hostile => self.allow_hostile,
                ActorRole::Outsider => self.allow_guests,
            },
        }
    }

    /// `already_wearing` reports whether the actor wears this selection's gear
    pub fn admits(&self, actor: &Actor, world: &World, already_wearing: bool) -> bool {
        if actor.dead && !self.allow_dead {
            return false;
        }
        if actor.downed && !self.allow_downed {
            return false;
        }
        if self.require_violence_capable && !actor.violence_capable {
            return false;
        }
        if self.exclude_wearers && already_wearing {
            return false;
        }
        self.category_allowed(actor, world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellPos;

    #[test]
    fn test_default_admits_only_colonists() {
        let mut world = World::new(10, 10);
        let colony = world.add_faction("colony");
        let pirates = world.add_faction("pirates");
        world.set_hostile(colony, pirates);
        world.player_faction = Some(colony);

        let colonist = world.add_actor(Actor::humanlike("Col", Some(colony)).at(CellPos::new(1, 1)));
        let raider = world.add_actor({
            let mut a = Actor::humanlike("Raider", Some(pirates));
            a.role = ActorRole::Outsider;
            a
        });
        let dog = world.add_actor(Actor::animal("Dog", Some(colony)));

        let rules = Eligibility::default();
        let admits = |id| rules.admits(world.actor(id).unwrap(), &world, false);
        assert!(admits(colonist));
        assert!(!admits(raider));
        assert!(!admits(dog));
        assert!(!rules.admits(world.actor(colonist).unwrap(), &world, true));
    }

    #[test]
    fn test_downed_dead_and_pacifists() {
        let world = World::new(10, 10);
        let rules = Eligibility {
            require_violence_capable: true,
            ..Eligibility::default()
        };
        let mut actor = Actor::humanlike("Pat", None);
        assert!(rules.admits(&actor, &world, false));
        actor.violence_capable = false;
        assert!(!rules.admits(&actor, &world, false));
        actor.violence_capable = true;
        actor.downed = true;
        assert!(!rules.admits(&actor, &world, false));
        let lenient = Eligibility {
            allow_downed: true,
            allow_dead: true,
            ..Eligibility::default()
        };
        assert!(lenient.admits(&actor, &world, false));
        actor.dead = true;
        assert!(lenient.admits(&actor, &world, false));
    }
}
