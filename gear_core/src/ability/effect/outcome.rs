use super::{EffectContext, Payload};
use crate::types::{CastTarget, TargetCategory};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Nothing,
    Incapacitate,
    Destroy,
}

/// Pick an outcome by the target's coarse category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryOutcome {
    pub organic: Outcome,
    pub mechanical: Outcome,
    pub anomalous: Outcome,
    pub other: Outcome,
}

impl CategoryOutcome {
    pub fn outcome_for(&self, category: TargetCategory) -> Outcome {
        match category {
            TargetCategory::Organic => self.organic,
            TargetCategory::Mechanical => self.mechanical,
            TargetCategory::Anomalous => self.anomalous,
            TargetCategory::Other => self.other,
        }
    }
}

impl Payload for CategoryOutcome {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        if let Some(id) = ctx.target_actor(target) {
            let Some(actor) = ctx.world.actor_mut(id) else {
                return;
            };
            let outcome = self.outcome_for(actor.kind.into());
            match outcome {
                Outcome::Nothing => {}
                Outcome::Incapacitate => actor.downed = true,
                Outcome::Destroy => {
                    actor.dead = true;
                    actor.position = None;
                }
            }
            tracing::debug!(actor = %id, ?outcome, "category outcome");
            return;
        }

        // Things have no health to take away; only destruction applies
        if let CastTarget::Thing(id) = target {
            if self.other == Outcome::Destroy && ctx.world.despawn_thing(id) {
                tracing::debug!(thing = %id, "destroyed");
            }
        }
    }
}
