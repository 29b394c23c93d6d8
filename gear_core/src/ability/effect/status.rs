use super::{affected_actors, EffectContext, Payload};
use crate::temporary::TemporaryKey;
use crate::types::CastTarget;
use rand::Rng;
use serde::{Deserialize, Serialize};

fn default_severity() -> f32 {
    1.0
}

/// Add (or raise) a named status effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyStatus {
    pub status: String,
    #[serde(default = "default_severity")]
    pub severity: f32,
    /// Add to an existing severity instead of keeping the larger one
    #[serde(default)]
    pub stack: bool,
    #[serde(default)]
    pub max_severity: Option<f32>,
    /// Remove the status again after this many ticks
    #[serde(default)]
    pub duration_ticks: Option<u64>,
    #[serde(default)]
    pub radius: Option<f32>,
}

impl Payload for ApplyStatus {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        for id in affected_actors(ctx, target, self.radius) {
            let Some(actor) = ctx.world.actor_mut(id) else {
                continue;
            };
            let severity = actor.add_status(&self.status, self.severity, self.stack, self.max_severity);
            tracing::debug!(actor = %id, status = %self.status, severity, "status applied");

            if let Some(duration) = self.duration_ticks {
                ctx.temporaries.register(
                    TemporaryKey::Status {
                        actor: id,
                        status: self.status.clone(),
                    },
                    ctx.now + duration,
                );
            }
        }
    }
}

/// Remove a named status effect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveStatus {
    pub status: String,
    #[serde(default)]
    pub radius: Option<f32>,
}

impl Payload for RemoveStatus {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        for id in affected_actors(ctx, target, self.radius) {
            if ctx.world.actor_mut(id).is_some_and(|a| a.remove_status(&self.status)) {
                ctx.temporaries.forget(&TemporaryKey::Status {
                    actor: id,
                    status: self.status.clone(),
                });
                tracing::debug!(actor = %id, status = %self.status, "status removed");
            }
        }
    }
}
