use super::{EffectContext, Payload};
use crate::types::{CastTarget, CellPos};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaceDirection {
    #[default]
    Away,
    Toward,
}

/// Push or pull the target along the nearest 8-way direction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Displace {
    pub distance: u32,
    #[serde(default)]
    pub direction: DisplaceDirection,
}

/// Unit step of the 8-way direction closest to `from -> to`.
///
/// A component counts when it is at least half the dominant one, which
/// splits the circle into eight equal-ish sectors. `(0, 0)` when the cells
/// coincide.
pub fn step_toward(from: CellPos, to: CellPos) -> (i32, i32) {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    let (ax, az) = (dx.abs(), dz.abs());
    let sx = if ax * 2 >= az { dx.signum() } else { 0 };
    let sz = if az * 2 >= ax { dz.signum() } else { 0 };
    (sx, sz)
}

impl Displace {
    /// Move the target and return how many cells it travelled
    pub fn displace<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) -> u32 {
        let Some(victim) = ctx.target_actor(target) else {
            return 0;
        };
        let (Some(origin), Some(caster_cell)) = (ctx.world.actor(victim).and_then(|a| a.position), ctx.caster_cell())
        else {
            return 0;
        };

        let (mut dx, mut dz) = step_toward(caster_cell, origin);
        if self.direction == DisplaceDirection::Toward {
            dx = -dx;
            dz = -dz;
        }
        if (dx, dz) == (0, 0) {
            return 0;
        }

        let mut pos = origin;
        let mut moved = 0;
        while moved < self.distance {
            let next = pos.offset(dx, dz);
            if !ctx.world.is_standable(next) {
                break;
            }
            pos = next;
            moved += 1;
        }

        if let Some(actor) = ctx.world.actor_mut(victim) {
            actor.position = Some(pos);
        }
        tracing::debug!(actor = %victim, from = %origin, to = %pos, moved, "displaced");
        moved
    }
}

impl Payload for Displace {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        self.displace(ctx, target);
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;

    #[test]
    fn test_step_directions() {
        let o = CellPos::new(0, 0);
        assert_eq!(step_toward(o, CellPos::new(5, 1)), (1, 0));
        assert_eq!(step_toward(o, CellPos::new(3, 2)), (1, 1));
        assert_eq!(step_toward(o, CellPos::new(-1, -6)), (0, -1));
        assert_eq!(step_toward(o, CellPos::new(-4, 4)), (-1, 1));
        assert_eq!(step_toward(o, o), (0, 0));
    }

    #[test]
    fn test_push_stops_before_wall() {
        let mut h = Harness::new();
        // caster at (5, 5)
        let raider = h.spawn("Raider", h.pirates, CellPos::new(6, 5));
        h.world.grid.block(CellPos::new(9, 5));

        let push = Displace {
            distance: 5,
            direction: DisplaceDirection::Away,
        };
        let moved = push.displace(&mut h.ctx(0), CastTarget::Actor(raider));
        assert_eq!(moved, 2);
        assert_eq!(h.world.actor(raider).unwrap().position, Some(CellPos::new(8, 5)));
    }

    #[test]
    fn test_pull_stops_before_caster() {
        let mut h = Harness::new();
        let raider = h.spawn("Raider", h.pirates, CellPos::new(5, 10));
        let pull = Displace {
            distance: 10,
            direction: DisplaceDirection::Toward,
        };
        let moved = pull.displace(&mut h.ctx(0), CastTarget::Actor(raider));
        assert_eq!(moved, 4);
        assert_eq!(h.world.actor(raider).unwrap().position, Some(CellPos::new(5, 6)));
    }

    #[test]
    fn test_occupied_cell_blocks() {
        let mut h = Harness::new();
        let raider = h.spawn("Raider", h.pirates, CellPos::new(6, 6));
        h.spawn("Bystander", h.colony, CellPos::new(7, 7));
        let push = Displace {
            distance: 3,
            direction: DisplaceDirection::Away,
        };
        assert_eq!(push.displace(&mut h.ctx(0), CastTarget::Actor(raider)), 0);
    }
}
