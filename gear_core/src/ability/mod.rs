//! Ability effect pipeline
//!
//! An ability is an ordered list of effect strategies. Gate strategies
//! (cost, limit, target rule) are checked in a fixed order before anything is
//! mutated; payload strategies run afterwards in attachment order.

mod cast;
pub mod effect;
mod limiter;
mod targeting;

pub use cast::{cast, check_cast, CostSpec};
pub use effect::{
    AreaSpec, CategoryOutcome, DisplaceDirection, Displace, EffectContext, Heal, Outcome, RemoveStatus,
    ApplyStatus, SpawnPattern, SpawnThing, Stun, Summon, Teleport,
};
pub use limiter::{CastRecord, LimiterSpec};
pub use targeting::{classify_actor, classify_target, TargetRule};

use crate::gear::definition::{sanitize_fraction, sanitize_rate};
use crate::types::{AbilityId, TargetClass};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a cast was refused. These are expected outcomes, not faults.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastDenied {
    #[error("not enough charge: {percent:.1}% available, {required:.1}% required")]
    InsufficientCharge { percent: f64, required: f64 },
    #[error("gear is inactive")]
    Inactive,
    #[error("on cooldown: {seconds:.1}s remaining")]
    Cooldown { seconds: f64 },
    #[error("daily limit reached ({max_per_day} per day)")]
    DailyLimit { max_per_day: u32 },
    #[error("cannot target {class} targets")]
    TargetNotAllowed { class: TargetClass },
    #[error("target no longer exists")]
    InvalidTarget,
    #[error("caster is missing or dead")]
    InvalidCaster,
    #[error("gear does not grant this ability")]
    AbilityNotGranted,
}

/// Charge cost of a cast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeCost {
    /// Fraction of max charge consumed
    pub cost: f64,
    /// Fraction of max charge that must be present (defaults to `cost`)
    #[serde(default)]
    pub required: Option<f64>,
}

/// Cooldown and daily cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastLimit {
    #[serde(default)]
    pub cooldown_ticks: u64,
    /// 0 = unlimited
    #[serde(default)]
    pub max_per_day: u32,
}

/// One strategy attached to an ability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityEffect {
    Cost(ChargeCost),
    Limit(CastLimit),
    TargetRule(TargetRule),
    Heal(Heal),
    Stun(Stun),
    ApplyStatus(ApplyStatus),
    RemoveStatus(RemoveStatus),
    SpawnThing(SpawnThing),
    Summon(Summon),
    Displace(Displace),
    Teleport(Teleport),
    CategoryOutcome(CategoryOutcome),
}

impl AbilityEffect {
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            AbilityEffect::Cost(_) | AbilityEffect::Limit(_) | AbilityEffect::TargetRule(_)
        )
    }
}

/// Static definition of an ability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityDefinition {
    pub name: String,
    /// Assigned by the content library
    #[serde(skip)]
    pub id: AbilityId,
    #[serde(default)]
    pub effects: Vec<AbilityEffect>,
}

impl AbilityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        AbilityDefinition {
            name: name.into(),
            id: AbilityId::default(),
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: AbilityEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Combined cost of every cost strategy
    pub fn cost_spec(&self) -> Option<CostSpec> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                AbilityEffect::Cost(c) => Some(CostSpec::from(*c)),
                _ => None,
            })
            .reduce(CostSpec::merge)
    }

    /// Combined limiter of every limit strategy
    pub fn limiter(&self) -> LimiterSpec {
        self.effects
            .iter()
            .filter_map(|e| match e {
                AbilityEffect::Limit(l) => Some(LimiterSpec {
                    cooldown_ticks: l.cooldown_ticks,
                    max_per_day: l.max_per_day,
                }),
                _ => None,
            })
            .fold(LimiterSpec::default(), LimiterSpec::merge)
    }

    pub fn target_rules(&self) -> impl Iterator<Item = &TargetRule> {
        self.effects.iter().filter_map(|e| match e {
            AbilityEffect::TargetRule(r) => Some(r),
            _ => None,
        })
    }

    pub fn payloads(&self) -> impl Iterator<Item = &AbilityEffect> {
        self.effects.iter().filter(|e| !e.is_gate())
    }

    /// Replace invalid values with safe defaults, returning one message per fix
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (i, effect) in self.effects.iter_mut().enumerate() {
            match effect {
                AbilityEffect::Cost(c) => {
                    sanitize_fraction(&format!("effects[{i}].cost"), &mut c.cost, &mut warnings);
                    if let Some(required) = &mut c.required {
                        sanitize_fraction(&format!("effects[{i}].required"), required, &mut warnings);
                    }
                }
                AbilityEffect::Heal(h) => {
                    let mut amount = h.amount as f64;
                    sanitize_rate(&format!("effects[{i}].amount"), &mut amount, &mut warnings);
                    h.amount = amount as f32;
                }
                AbilityEffect::SpawnThing(s) if s.count == 0 => {
                    warnings.push(format!("effects[{i}] spawns nothing (count = 0)"));
                }
                AbilityEffect::Summon(s) if s.count == 0 => {
                    warnings.push(format!("effects[{i}] summons nothing (count = 0)"));
                }
                _ => {}
            }
        }
        if self.payloads().next().is_none() {
            warnings.push("ability has no payload effects".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ability() {
        let toml = r#"
name = "lunar_heal"

[[effects]]
type = "cost"
cost = 0.05

[[effects]]
type = "limit"
cooldown_ticks = 600
max_per_day = 3

[[effects]]
type = "target_rule"
allow_hostile = false

[[effects]]
type = "heal"
amount = 12.0
radius = 3.0
"#;
        let ability: AbilityDefinition = toml::from_str(toml).unwrap();
        assert_eq!(ability.effects.len(), 4);

        let cost = ability.cost_spec().unwrap();
        assert!((cost.cost - 0.05).abs() < f64::EPSILON);
        assert!((cost.required - 0.05).abs() < f64::EPSILON);

        let limiter = ability.limiter();
        assert_eq!(limiter.cooldown_ticks, 600);
        assert_eq!(limiter.max_per_day, 3);

        let rule = ability.target_rules().next().unwrap();
        assert!(!rule.allow_hostile);
        assert!(rule.allow_allies);

        assert_eq!(ability.payloads().count(), 1);
    }

    #[test]
    fn test_sanitize_ability() {
        let mut ability = AbilityDefinition::new("broken").with_effect(AbilityEffect::Cost(ChargeCost {
            cost: 1.5,
            required: None,
        }));
        let warnings = ability.sanitize();
        // out of range cost + missing payload
        assert_eq!(warnings.len(), 2);
        assert!((ability.cost_spec().unwrap().cost - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_denied_reasons_are_distinct() {
        let cooldown = CastDenied::Cooldown { seconds: 2.5 }.to_string();
        let daily = CastDenied::DailyLimit { max_per_day: 3 }.to_string();
        assert_eq!(cooldown, "on cooldown: 2.5s remaining");
        assert_eq!(daily, "daily limit reached (3 per day)");
    }
}
