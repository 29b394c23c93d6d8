use super::{EffectContext, Payload};
use crate::ability::CastDenied;
use crate::temporary::TemporaryKey;
use crate::types::{CastTarget, CellPos};
use crate::world::{Actor, World};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lingering area effect left behind by a teleport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaSpec {
    pub def: String,
    pub radius: f32,
    pub duration_ticks: u64,
}

/// Move the caster to the target cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Teleport {
    #[serde(default)]
    pub origin_effect: Option<AreaSpec>,
    #[serde(default)]
    pub destination_effect: Option<AreaSpec>,
}

impl Teleport {
    /// Gate: the destination must be a cell the caster can stand on
    pub fn check(world: &World, caster: &Actor, target: CastTarget) -> Result<(), CastDenied> {
        let dest = world.target_cell(target).ok_or(CastDenied::InvalidTarget)?;
        if caster.position != Some(dest) && !world.is_standable(dest) {
            return Err(CastDenied::InvalidTarget);
        }
        Ok(())
    }

    fn leave<R: Rng>(spec: &AreaSpec, ctx: &mut EffectContext<'_, R>, at: CellPos) {
        let id = ctx.world.add_area_effect(spec.def.clone(), at, spec.radius);
        ctx.temporaries.register(TemporaryKey::Area(id), ctx.now + spec.duration_ticks);
    }
}

impl Payload for Teleport {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        let (Some(origin), Some(dest)) = (ctx.caster_cell(), ctx.target_cell(target)) else {
            return;
        };
        if dest != origin && !ctx.world.is_standable(dest) {
            tracing::debug!(caster = %ctx.caster, %dest, "teleport destination blocked");
            return;
        }

        if let Some(actor) = ctx.world.actor_mut(ctx.caster) {
            actor.position = Some(dest);
        }
        if let Some(spec) = &self.origin_effect {
            Self::leave(spec, ctx, origin);
        }
        if let Some(spec) = &self.destination_effect {
            Self::leave(spec, ctx, dest);
        }
        tracing::debug!(caster = %ctx.caster, from = %origin, to = %dest, "teleported");
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;

    fn smoky() -> Teleport {
        Teleport {
            origin_effect: Some(AreaSpec {
                def: "smoke".into(),
                radius: 2.0,
                duration_ticks: 300,
            }),
            destination_effect: Some(AreaSpec {
                def: "fog".into(),
                radius: 1.5,
                duration_ticks: 120,
            }),
        }
    }

    #[test]
    fn test_teleport_leaves_timed_clouds() {
        let mut h = Harness::new();
        smoky().apply(&mut h.ctx(0), CastTarget::Cell(CellPos::new(12, 12)));
        assert_eq!(h.world.actor(h.caster).unwrap().position, Some(CellPos::new(12, 12)));
        assert_eq!(h.world.area_effects().count(), 2);

        h.temporaries.sweep(120, &mut h.world);
        let left: Vec<_> = h.world.area_effects().map(|a| a.def.clone()).collect();
        assert_eq!(left, vec!["smoke".to_string()]);

        h.temporaries.sweep(300, &mut h.world);
        assert_eq!(h.world.area_effects().count(), 0);
    }

    #[test]
    fn test_blocked_destination_is_noop() {
        let mut h = Harness::new();
        h.world.grid.block(CellPos::new(12, 12));
        smoky().apply(&mut h.ctx(0), CastTarget::Cell(CellPos::new(12, 12)));
        assert_eq!(h.world.actor(h.caster).unwrap().position, Some(CellPos::new(5, 5)));
        assert_eq!(h.world.area_effects().count(), 0);
    }
}
