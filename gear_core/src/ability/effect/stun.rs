use super::{affected_actors, EffectContext, Payload};
use crate::ability::targeting::is_friendly;
use crate::types::CastTarget;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Timed incapacitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stun {
    pub duration_ticks: u64,
    #[serde(default)]
    pub radius: Option<f32>,
    /// Area stuns spare the caster and allies unless set
    #[serde(default)]
    pub include_allies: bool,
}

impl Payload for Stun {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        let mut victims = affected_actors(ctx, target, self.radius);
        if self.radius.is_some() && !self.include_allies {
            victims.retain(|id| !is_friendly(ctx.world, ctx.caster, *id));
        }

        let until = ctx.now + self.duration_ticks;
        for id in victims {
            if let Some(actor) = ctx.world.actor_mut(id) {
                actor.stunned_until = Some(actor.stunned_until.map_or(until, |u| u.max(until)));
                tracing::debug!(actor = %id, until, "stunned");
            }
        }
    }
}
