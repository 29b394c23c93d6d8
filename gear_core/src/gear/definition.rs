//! GearDefinition - authored parameters for one kind of gear

use crate::types::{AbilityId, BodyShape, Gender, GearDefId};
use serde::{Deserialize, Serialize};

/// Smallest max charge a definition may carry
pub const MIN_MAX_CHARGE: f64 = 0.001;

/// Actor signal a conditional regen rule reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorSignal {
    Mood,
    Pain,
    /// Light level at the wearer's cell
    Light,
    Psyfocus,
    /// Living, non-downed same-faction actors within a radius
    NearbyAllies,
}

/// Regen that applies while an actor signal meets a threshold
///
/// Rates are fractions of max charge per simulated day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenRule {
    pub signal: ActorSignal,
    /// Signal value (or ally count) at which the rule starts applying
    #[serde(default)]
    pub threshold: f64,
    pub rate: f64,
    /// Scale linearly from 0 at the threshold to 1 at the signal maximum
    #[serde(default)]
    pub scaled: bool,
    /// Search radius for `nearby_allies`
    #[serde(default = "default_ally_radius")]
    pub radius: f32,
    /// Cap on counted allies for `nearby_allies`
    #[serde(default = "default_ally_cap")]
    pub max_count: u32,
}

fn default_ally_radius() -> f32 {
    10.0
}

fn default_ally_cap() -> u32 {
    5
}

impl RegenRule {
    pub fn new(signal: ActorSignal, threshold: f64, rate: f64) -> Self {
        RegenRule {
            signal,
            threshold,
            rate,
            scaled: false,
            radius: default_ally_radius(),
            max_count: default_ally_cap(),
        }
    }

    pub fn scaled(mut self) -> Self {
        self.scaled = true;
        self
    }
}

/// What to do with a costume piece that conflicts with worn apparel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Move conflicting apparel into the gear's storage
    #[default]
    Store,
    /// Leave worn apparel alone and do not equip the conflicting piece
    Skip,
}

/// Costume configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformationConfig {
    /// Apparel definitions equipped while transformed
    pub costume: Vec<String>,
    /// Allowed genders (empty = all)
    #[serde(default)]
    pub genders: Vec<Gender>,
    /// Allowed body shapes (empty = all)
    #[serde(default)]
    pub body_shapes_allowed: Vec<BodyShape>,
    #[serde(default)]
    pub body_shapes_denied: Vec<BodyShape>,
    #[serde(default)]
    pub require_drafted: bool,
    /// Whether the wearer can switch the costume off by hand
    #[serde(default)]
    pub manual_toggle: bool,
    #[serde(default)]
    pub conflicts: ConflictPolicy,
    /// Do not transform when a costume piece has no graphic for the body shape
    #[serde(default)]
    pub skip_unrenderable: bool,
    #[serde(default)]
    pub force_body_shape: Option<BodyShape>,
    /// Only force the body shape when the costume would not render otherwise
    #[serde(default)]
    pub force_only_if_missing: bool,
}

/// Charge-gated stealth toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StealthConfig {
    /// Charge fraction required to engage
    #[serde(default)]
    pub min_charge_to_engage: f64,
    /// Extra drain per day while engaged
    pub drain_per_day: f64,
}

/// Spend charge to negate an incoming hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactiveEvadeConfig {
    pub cost: f64,
    #[serde(default)]
    pub cooldown_ticks: u64,
}

/// Immutable parameters for one kind of gear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GearDefinition {
    pub name: String,
    /// Assigned by the content library
    #[serde(skip)]
    pub id: GearDefId,
    /// Apparel definition of the gear item itself
    pub item: String,
    #[serde(default = "default_max_charge")]
    pub max_charge: f64,
    /// Passive regen as a fraction of max per day
    #[serde(default)]
    pub passive_regen: f64,
    /// Passive drain as a fraction of max per day
    #[serde(default)]
    pub passive_drain: f64,
    #[serde(default)]
    pub regen_rules: Vec<RegenRule>,
    /// Granted ability names
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Resolved ability handles, filled by the content library
    #[serde(skip)]
    pub ability_ids: Vec<AbilityId>,
    #[serde(default)]
    pub transformation: Option<TransformationConfig>,
    #[serde(default)]
    pub stealth: Option<StealthConfig>,
    #[serde(default)]
    pub reactive_evade: Option<ReactiveEvadeConfig>,
}

fn default_max_charge() -> f64 {
    100.0
}

impl GearDefinition {
    pub fn new(name: impl Into<String>, item: impl Into<String>) -> Self {
        GearDefinition {
            name: name.into(),
            id: GearDefId::default(),
            item: item.into(),
            max_charge: default_max_charge(),
            passive_regen: 0.0,
            passive_drain: 0.0,
            regen_rules: Vec::new(),
            abilities: Vec::new(),
            ability_ids: Vec::new(),
            transformation: None,
            stealth: None,
            reactive_evade: None,
        }
    }

    /// Replace invalid values with safe defaults, returning one message per fix
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.max_charge.is_finite() || self.max_charge <= 0.0 {
            warnings.push(format!(
                "max_charge = {} must be positive, clamped to {MIN_MAX_CHARGE}",
                self.max_charge
            ));
            self.max_charge = MIN_MAX_CHARGE;
        }

        sanitize_rate("passive_regen", &mut self.passive_regen, &mut warnings);
        sanitize_rate("passive_drain", &mut self.passive_drain, &mut warnings);

        for (i, rule) in self.regen_rules.iter_mut().enumerate() {
            sanitize_rate(&format!("regen_rules[{i}].rate"), &mut rule.rate, &mut warnings);
            if !rule.threshold.is_finite() || rule.threshold < 0.0 {
                warnings.push(format!("regen_rules[{i}].threshold = {} is invalid, using 0", rule.threshold));
                rule.threshold = 0.0;
            }
            if rule.signal != ActorSignal::NearbyAllies && rule.threshold > 1.0 {
                warnings.push(format!("regen_rules[{i}].threshold = {} exceeds 1, clamped", rule.threshold));
                rule.threshold = 1.0;
            }
        }

        if let Some(stealth) = &mut self.stealth {
            sanitize_rate("stealth.drain_per_day", &mut stealth.drain_per_day, &mut warnings);
            sanitize_fraction("stealth.min_charge_to_engage", &mut stealth.min_charge_to_engage, &mut warnings);
        }
        if let Some(evade) = &mut self.reactive_evade {
            sanitize_fraction("reactive_evade.cost", &mut evade.cost, &mut warnings);
        }
        if let Some(transform) = &self.transformation {
            if transform.costume.is_empty() {
                warnings.push("transformation has an empty costume".to_string());
            }
        }

        warnings
    }
}

pub(crate) fn sanitize_rate(name: &str, value: &mut f64, warnings: &mut Vec<String>) {
    if !value.is_finite() || *value < 0.0 {
        warnings.push(format!("{name} = {value} is invalid, treated as 0"));
        *value = 0.0;
    }
}

pub(crate) fn sanitize_fraction(name: &str, value: &mut f64, warnings: &mut Vec<String>) {
    let v = *value;
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        let fixed = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        warnings.push(format!("{name} = {v} is outside 0..1, using {fixed}"));
        *value = fixed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_max_charge() {
        let mut def = GearDefinition::new("band", "band_item");
        def.max_charge = 0.0;
        let warnings = def.sanitize();
        assert_eq!(warnings.len(), 1);
        assert!((def.max_charge - MIN_MAX_CHARGE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sanitize_rejects_bad_rates() {
        let mut def = GearDefinition::new("band", "band_item");
        def.passive_regen = f64::NAN;
        def.passive_drain = -0.2;
        def.regen_rules.push(RegenRule::new(ActorSignal::Mood, 0.8, -1.0));
        let warnings = def.sanitize();
        assert_eq!(warnings.len(), 3);
        assert_eq!(def.passive_regen, 0.0);
        assert_eq!(def.passive_drain, 0.0);
        assert_eq!(def.regen_rules[0].rate, 0.0);
    }

    #[test]
    fn test_valid_definition_has_no_warnings() {
        let mut def = GearDefinition::new("band", "band_item");
        def.passive_regen = 0.1;
        def.regen_rules.push(RegenRule::new(ActorSignal::NearbyAllies, 2.0, 0.01));
        assert!(def.sanitize().is_empty());
    }

    #[test]
    fn test_parse_gear_definition() {
        let toml = r#"
name = "sailor_brooch"
item = "brooch"
max_charge = 50
passive_regen = 0.1

[[regen_rules]]
signal = "mood"
threshold = 0.8
rate = 0.1
scaled = true

[transformation]
costume = ["sailor_uniform", "sailor_skirt"]
genders = ["female"]
conflicts = "skip"
force_body_shape = "thin"
"#;
        let def: GearDefinition = toml::from_str(toml).unwrap();
        assert_eq!(def.name, "sailor_brooch");
        assert!((def.max_charge - 50.0).abs() < f64::EPSILON);
        assert_eq!(def.regen_rules[0].signal, ActorSignal::Mood);
        assert!(def.regen_rules[0].scaled);
        let t = def.transformation.unwrap();
        assert_eq!(t.conflicts, ConflictPolicy::Skip);
        assert_eq!(t.force_body_shape, Some(BodyShape::Thin));
        assert_eq!(t.genders, vec![Gender::Female]);
    }
}
