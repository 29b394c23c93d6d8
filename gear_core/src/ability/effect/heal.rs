use super::{affected_actors, EffectContext, Payload};
use crate::ability::targeting::classify_actor;
use crate::types::{CastTarget, TargetClass};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Heal a budget of injury severity, most damaged injury first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heal {
    pub amount: f32,
    /// Heal everyone around the target instead of the target alone
    #[serde(default)]
    pub radius: Option<f32>,
    /// Area heals skip hostiles unless set
    #[serde(default)]
    pub include_hostile: bool,
}

impl Payload for Heal {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        let mut patients = affected_actors(ctx, target, self.radius);
        if self.radius.is_some() && !self.include_hostile {
            if let Some(caster) = ctx.world.actor(ctx.caster) {
                patients.retain(|id| {
                    ctx.world
                        .actor(*id)
                        .is_some_and(|a| classify_actor(ctx.world, caster, a) != TargetClass::Hostile)
                });
            }
        }

        // (patient, injury index, severity), pooled across every patient
        let mut wounds: Vec<_> = patients
            .iter()
            .filter_map(|id| ctx.world.actor(*id))
            .flat_map(|a| a.injuries.iter().enumerate().map(move |(i, inj)| (a.id, i, inj.severity)))
            .collect();
        wounds.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

        let mut remaining = self.amount.max(0.0);
        for (id, index, severity) in wounds {
            if remaining <= 0.0 {
                break;
            }
            let healed = severity.min(remaining);
            if let Some(injury) = ctx.world.actor_mut(id).and_then(|a| a.injuries.get_mut(index)) {
                injury.severity -= healed;
                remaining -= healed;
            }
        }

        for id in &patients {
            if let Some(actor) = ctx.world.actor_mut(*id) {
                actor.injuries.retain(|i| i.severity > f32::EPSILON);
            }
        }
        tracing::debug!(caster = %ctx.caster, healed = self.amount.max(0.0) - remaining, "heal");
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;
    use crate::types::CellPos;
    use crate::world::Injury;

    fn wound(label: &str, severity: f32) -> Injury {
        Injury {
            label: label.into(),
            severity,
        }
    }

    #[test]
    fn test_single_target_heal() {
        let mut h = Harness::new();
        let patient = h.spawn("Patient", h.colony, CellPos::new(6, 5));
        h.world.actor_mut(patient).unwrap().injuries = vec![wound("cut", 3.0), wound("burn", 6.0)];

        let heal = Heal {
            amount: 7.0,
            radius: None,
            include_hostile: false,
        };
        heal.apply(&mut h.ctx(0), CastTarget::Actor(patient));

        let injuries = &h.world.actor(patient).unwrap().injuries;
        assert_eq!(injuries.len(), 1);
        assert_eq!(injuries[0].label, "cut");
        assert!((injuries[0].severity - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_area_heal_pools_budget_and_skips_hostiles() {
        let mut h = Harness::new();
        let a = h.spawn("A", h.colony, CellPos::new(6, 5));
        let b = h.spawn("B", h.colony, CellPos::new(7, 5));
        let raider = h.spawn("Raider", h.pirates, CellPos::new(6, 6));
        h.world.actor_mut(a).unwrap().injuries = vec![wound("scratch", 1.0)];
        h.world.actor_mut(b).unwrap().injuries = vec![wound("gunshot", 5.0)];
        h.world.actor_mut(raider).unwrap().injuries = vec![wound("stab", 9.0)];

        let heal = Heal {
            amount: 5.5,
            radius: Some(3.0),
            include_hostile: false,
        };
        heal.apply(&mut h.ctx(0), CastTarget::Cell(CellPos::new(6, 5)));

        // gunshot healed first, remainder goes to the scratch
        assert!(h.world.actor(b).unwrap().injuries.is_empty());
        assert!((h.world.actor(a).unwrap().injuries[0].severity - 0.5).abs() < 1e-5);
        assert!((h.world.actor(raider).unwrap().injuries[0].severity - 9.0).abs() < 1e-5);
    }
}
