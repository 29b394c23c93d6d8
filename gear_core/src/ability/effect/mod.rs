//! Payload effects - what a cast actually does once every gate has passed

mod displace;
mod heal;
mod outcome;
mod spawn;
mod status;
mod stun;
mod teleport;

pub use displace::{step_toward, Displace, DisplaceDirection};
pub use heal::Heal;
pub use outcome::{CategoryOutcome, Outcome};
pub use spawn::{SpawnPattern, SpawnThing, Summon};
pub use status::{ApplyStatus, RemoveStatus};
pub use stun::Stun;
pub use teleport::{AreaSpec, Teleport};

use super::AbilityEffect;
use crate::config::ContentLibrary;
use crate::temporary::TemporaryRegistry;
use crate::types::{ActorId, CastTarget, CellPos};
use crate::warn_once::WarnOnce;
use crate::world::World;
use rand::Rng;

/// Everything a payload may read or mutate while it runs
pub struct EffectContext<'a, R: Rng> {
    pub world: &'a mut World,
    pub temporaries: &'a mut TemporaryRegistry,
    pub library: &'a ContentLibrary,
    pub warn_once: &'a mut WarnOnce,
    pub rng: &'a mut R,
    pub caster: ActorId,
    pub now: u64,
}

impl<R: Rng> EffectContext<'_, R> {
    pub fn caster_cell(&self) -> Option<CellPos> {
        self.world.actor(self.caster).and_then(|a| a.position)
    }

    /// Cell the target occupies
    pub fn target_cell(&self, target: CastTarget) -> Option<CellPos> {
        self.world.target_cell(target)
    }

    /// Living actor the target refers to; a cell resolves to whoever stands on it
    pub fn target_actor(&self, target: CastTarget) -> Option<ActorId> {
        match target {
            CastTarget::Actor(id) => self.world.actor(id).filter(|a| a.is_alive()).map(|a| a.id),
            CastTarget::Cell(cell) => self.world.actor_at(cell),
            CastTarget::Thing(_) => None,
        }
    }
}

/// A payload strategy
pub trait Payload {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget);
}

/// Run one payload. Gate strategies are no-ops here.
pub fn apply_payload<R: Rng>(effect: &AbilityEffect, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
    match effect {
        AbilityEffect::Cost(_) | AbilityEffect::Limit(_) | AbilityEffect::TargetRule(_) => {}
        AbilityEffect::Heal(p) => p.apply(ctx, target),
        AbilityEffect::Stun(p) => p.apply(ctx, target),
        AbilityEffect::ApplyStatus(p) => p.apply(ctx, target),
        AbilityEffect::RemoveStatus(p) => p.apply(ctx, target),
        AbilityEffect::SpawnThing(p) => p.apply(ctx, target),
        AbilityEffect::Summon(p) => p.apply(ctx, target),
        AbilityEffect::Displace(p) => p.apply(ctx, target),
        AbilityEffect::Teleport(p) => p.apply(ctx, target),
        AbilityEffect::CategoryOutcome(p) => p.apply(ctx, target),
    }
}

/// Actors affected by a single-target or radius payload.
///
/// With a radius every living actor around the target cell is returned;
/// otherwise just the targeted actor.
pub(crate) fn affected_actors<R: Rng>(
    ctx: &EffectContext<'_, R>,
    target: CastTarget,
    radius: Option<f32>,
) -> Vec<ActorId> {
    match radius {
        Some(r) => ctx
            .target_cell(target)
            .map(|cell| ctx.world.actors_within(cell, r))
            .unwrap_or_default(),
        None => ctx.target_actor(target).into_iter().collect(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixture for payload tests

    use super::*;
    use crate::types::FactionId;
    use crate::world::Actor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub struct Harness {
        pub world: World,
        pub temporaries: TemporaryRegistry,
        pub library: ContentLibrary,
        pub warn_once: WarnOnce,
        pub rng: ChaCha8Rng,
        pub caster: ActorId,
        pub colony: FactionId,
        pub pirates: FactionId,
    }

    impl Harness {
        pub fn new() -> Self {
            let mut world = World::new(20, 20);
            let colony = world.add_faction("colony");
            let pirates = world.add_faction("pirates");
            world.set_hostile(colony, pirates);
            world.player_faction = Some(colony);
            let caster = world.add_actor(Actor::humanlike("Caster", Some(colony)).at(CellPos::new(5, 5)));
            Harness {
                world,
                temporaries: TemporaryRegistry::new(),
                library: ContentLibrary::default(),
                warn_once: WarnOnce::new(),
                rng: ChaCha8Rng::seed_from_u64(42),
                caster,
                colony,
                pirates,
            }
        }

        pub fn spawn(&mut self, name: &str, faction: FactionId, pos: CellPos) -> ActorId {
            self.world.add_actor(Actor::humanlike(name, Some(faction)).at(pos))
        }

        pub fn ctx(&mut self, now: u64) -> EffectContext<'_, ChaCha8Rng> {
            EffectContext {
                world: &mut self.world,
                temporaries: &mut self.temporaries,
                library: &self.library,
                warn_once: &mut self.warn_once,
                rng: &mut self.rng,
                caster: self.caster,
                now,
            }
        }
    }
}
