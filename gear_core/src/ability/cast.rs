//! Gate checks and the apply sequence of a single cast

use super::effect::{apply_payload, EffectContext, Teleport};
use super::{AbilityDefinition, AbilityEffect, CastDenied, ChargeCost};
use crate::config::Tunables;
use crate::gear::GearInstance;
use crate::types::CastTarget;
use crate::world::World;
use rand::Rng;

/// Combined charge requirement of an ability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostSpec {
    /// Fraction of max consumed by a cast
    pub cost: f64,
    /// Fraction of max that must be present
    pub required: f64,
}

impl From<ChargeCost> for CostSpec {
    fn from(c: ChargeCost) -> Self {
        CostSpec {
            cost: c.cost,
            required: c.required.unwrap_or(c.cost),
        }
    }
}

impl CostSpec {
    /// Costs add up; the strictest requirement wins
    pub fn merge(self, other: CostSpec) -> CostSpec {
        CostSpec {
            cost: self.cost + other.cost,
            required: self.required.max(other.required),
        }
    }

    /// Fraction of max the gate demands, before the cost multiplier
    pub fn gate_fraction(&self) -> f64 {
        self.cost.max(self.required)
    }
}

/// Run every gate in the fixed order charge, limiter, target, payload. Never mutates.
pub fn check_cast(
    gear: &GearInstance,
    ability: &AbilityDefinition,
    world: &World,
    target: CastTarget,
    now: u64,
    tunables: &Tunables,
) -> Result<(), CastDenied> {
    let caster = world
        .actor(gear.wearer)
        .filter(|a| a.is_alive())
        .ok_or(CastDenied::InvalidCaster)?;

    if let Some(cost) = ability.cost_spec() {
        if !GearInstance::wearer_active(caster) {
            return Err(CastDenied::Inactive);
        }
        let required = cost.gate_fraction() * tunables.cost_multiplier;
        let percent = gear.charge_percent();
        if percent + GearInstance::CHARGE_EPSILON < required {
            return Err(CastDenied::InsufficientCharge {
                percent: percent * 100.0,
                required: required * 100.0,
            });
        }
    }

    ability.limiter().check(gear.cast_record(ability.id), now, tunables)?;

    // A target that vanished is invalid even when no rule is attached
    super::classify_target(world, caster, target)?;
    for rule in ability.target_rules() {
        rule.check(world, caster, target)?;
    }
    if ability.payloads().any(|e| matches!(e, AbilityEffect::Teleport(_))) {
        Teleport::check(world, caster, target)?;
    }

    Ok(())
}

/// Check the gates, then consume cost, commit the cast record and run payloads in order
pub fn cast<R: Rng>(
    gear: &mut GearInstance,
    ability: &AbilityDefinition,
    target: CastTarget,
    ctx: &mut EffectContext<'_, R>,
    tunables: &Tunables,
) -> Result<(), CastDenied> {
    check_cast(gear, ability, ctx.world, target, ctx.now, tunables)?;

    if let Some(cost) = ability.cost_spec() {
        let caster = ctx.world.actor(gear.wearer).ok_or(CastDenied::InvalidCaster)?;
        if cost.cost > 0.0 && !gear.try_consume_charge(cost.cost, caster, tunables) {
            return Err(CastDenied::InsufficientCharge {
                percent: gear.charge_percent() * 100.0,
                required: cost.gate_fraction() * tunables.cost_multiplier * 100.0,
            });
        }
    }

    let limiter = ability.limiter();
    if !limiter.is_noop() {
        limiter.commit(gear.cast_record_mut(ability.id), ctx.now, tunables);
    }

    tracing::debug!(gear = %gear.id, ability = %ability.name, ?target, "cast");
    for payload in ability.payloads() {
        apply_payload(payload, ctx, target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::effect::testing::Harness;
    use super::super::{AbilityEffect, CastLimit, Heal, TargetRule};
    use super::*;
    use crate::gear::GearDefinition;
    use crate::types::{AbilityId, CellPos, GearInstanceId, ItemId};
    use crate::world::Injury;

    fn healing_light() -> AbilityDefinition {
        let mut ability = AbilityDefinition::new("healing_light")
            .with_effect(AbilityEffect::Heal(Heal {
                amount: 5.0,
                radius: None,
                include_hostile: false,
            }))
            .with_effect(AbilityEffect::Cost(ChargeCost {
                cost: 0.05,
                required: None,
            }))
            .with_effect(AbilityEffect::Limit(CastLimit {
                cooldown_ticks: 60,
                max_per_day: 0,
            }))
            .with_effect(AbilityEffect::TargetRule(TargetRule::friendly_only()));
        ability.id = AbilityId(1);
        ability
    }

    fn gear_for(h: &Harness) -> GearInstance {
        let def = GearDefinition::new("brooch", "brooch_item");
        GearInstance::new(GearInstanceId(1), &def, ItemId(1), h.caster)
    }

    #[test]
    fn test_cost_gate_denies_without_mutation() {
        let h = Harness::new();
        let mut gear = gear_for(&h);
        gear.set_charge(4.0);
        let ability = healing_light();
        let t = Tunables::default();

        let result = check_cast(&gear, &ability, &h.world, CastTarget::Actor(h.caster), 0, &t);
        assert!(matches!(result, Err(CastDenied::InsufficientCharge { .. })));
        assert!((gear.charge() - 4.0).abs() < 1e-9);
        assert!(gear.cast_record(ability.id).is_none());
    }

    #[test]
    fn test_cast_consumes_then_commits_then_heals() {
        let mut h = Harness::new();
        h.world.actor_mut(h.caster).unwrap().injuries = vec![Injury {
            label: "cut".into(),
            severity: 3.0,
        }];
        let mut gear = gear_for(&h);
        let ability = healing_light();
        let t = Tunables::default();

        cast(&mut gear, &ability, CastTarget::Actor(h.caster), &mut h.ctx(1000), &t).unwrap();
        assert!((gear.charge() - 95.0).abs() < 1e-9);
        assert_eq!(gear.cast_record(ability.id).unwrap().next_allowed_tick, 1060);
        assert!(h.world.actor(h.caster).unwrap().injuries.is_empty());

        let again = cast(&mut gear, &ability, CastTarget::Actor(h.caster), &mut h.ctx(1059), &t);
        assert!(matches!(again, Err(CastDenied::Cooldown { .. })));
        assert!((gear.charge() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_charge_gate_runs_before_target_gate() {
        let mut h = Harness::new();
        let raider = h.spawn("Raider", h.pirates, CellPos::new(6, 5));
        let mut gear = gear_for(&h);
        gear.set_charge(0.0);
        let ability = healing_light();
        let result = check_cast(&gear, &ability, &h.world, CastTarget::Actor(raider), 0, &Tunables::default());
        assert!(matches!(result, Err(CastDenied::InsufficientCharge { .. })));

        gear.set_charge(100.0);
        let result = check_cast(&gear, &ability, &h.world, CastTarget::Actor(raider), 0, &Tunables::default());
        assert!(matches!(result, Err(CastDenied::TargetNotAllowed { .. })));
    }

    #[test]
    fn test_cost_multiplier_scales_gate() {
        let h = Harness::new();
        let mut gear = gear_for(&h);
        gear.set_charge(8.0);
        let ability = healing_light();
        let t = Tunables {
            cost_multiplier: 2.0,
            ..Tunables::default()
        };
        let result = check_cast(&gear, &ability, &h.world, CastTarget::Actor(h.caster), 0, &t);
        assert!(matches!(result, Err(CastDenied::InsufficientCharge { .. })));
    }

    #[test]
    fn test_blocked_teleport_spends_nothing() {
        let mut h = Harness::new();
        h.world.grid.block(CellPos::new(8, 8));
        let mut gear = gear_for(&h);
        let mut step = AbilityDefinition::new("step")
            .with_effect(AbilityEffect::Cost(ChargeCost {
                cost: 0.05,
                required: None,
            }))
            .with_effect(AbilityEffect::Limit(CastLimit {
                cooldown_ticks: 600,
                max_per_day: 0,
            }))
            .with_effect(AbilityEffect::Teleport(Teleport::default()));
        step.id = AbilityId(2);
        let t = Tunables::default();

        let blocked = cast(&mut gear, &step, CastTarget::Cell(CellPos::new(8, 8)), &mut h.ctx(100), &t);
        assert_eq!(blocked, Err(CastDenied::InvalidTarget));
        assert!((gear.charge() - 100.0).abs() < 1e-9);
        assert!(gear.cast_record(step.id).is_none());
        assert_eq!(h.world.actor(h.caster).unwrap().position, Some(CellPos::new(5, 5)));

        cast(&mut gear, &step, CastTarget::Cell(CellPos::new(9, 8)), &mut h.ctx(101), &t).unwrap();
        assert!((gear.charge() - 95.0).abs() < 1e-9);
        assert_eq!(h.world.actor(h.caster).unwrap().position, Some(CellPos::new(9, 8)));
    }

    #[test]
    fn test_inactive_wearer_fails_charge_gate() {
        let mut h = Harness::new();
        h.world.actor_mut(h.caster).unwrap().position = None;
        let gear = gear_for(&h);
        let result = check_cast(
            &gear,
            &healing_light(),
            &h.world,
            CastTarget::Actor(h.caster),
            0,
            &Tunables::default(),
        );
        assert_eq!(result, Err(CastDenied::Inactive));
    }
}
