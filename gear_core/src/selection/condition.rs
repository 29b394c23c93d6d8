//! Scoring conditions
//!
//! Each condition maps an actor to a non-negative score; a candidate's total
//! is the plain sum. Built-in conditions are authored in TOML through
//! [`ConditionConfig`]; hosts can add their own by implementing
//! [`ScoringCondition`].

use crate::types::Gender;
use crate::world::{Actor, World};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only view handed to conditions
pub struct ScoringContext<'a> {
    pub world: &'a World,
    pub now: u64,
}

/// A pluggable additive scoring term
pub trait ScoringCondition: fmt::Debug {
    /// Raw score. Negative results are treated as 0 by the engine.
    fn score(&self, actor: &Actor, ctx: &ScoringContext<'_>) -> f64;
}

/// Score of a condition with the non-negative invariant enforced
pub fn clamped_score(condition: &dyn ScoringCondition, actor: &Actor, ctx: &ScoringContext<'_>) -> f64 {
    let score = condition.score(actor, ctx);
    if score.is_finite() {
        score.max(0.0)
    } else {
        0.0
    }
}

fn default_weight() -> f64 {
    1.0
}

fn default_stat_max() -> f64 {
    1.0
}

fn default_skill_span() -> u32 {
    20
}

/// Built-in conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionConfig {
    /// Has a trait (optionally of a specific degree)
    Trait {
        name: String,
        #[serde(default)]
        degree: Option<i32>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Stat normalized into `min..max`
    Stat {
        stat: String,
        #[serde(default)]
        min: f64,
        #[serde(default = "default_stat_max")]
        max: f64,
        #[serde(default)]
        lower_is_better: bool,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Nothing below `floor`, then linear up to `max_level`
    Skill {
        skill: String,
        #[serde(default)]
        floor: u32,
        #[serde(default = "default_skill_span")]
        max_level: u32,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Mood at or above `threshold`, scaled by the mood itself
    Mood {
        #[serde(default)]
        threshold: f32,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Need level at or above `threshold`, scaled by the level
    Need {
        need: String,
        #[serde(default)]
        threshold: f32,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Age inside `[min, max]`
    Age {
        #[serde(default)]
        min: f32,
        #[serde(default)]
        max: Option<f32>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    Gender {
        gender: Gender,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Status effect present with at least `min_severity`
    Status {
        status: String,
        #[serde(default)]
        min_severity: f32,
        #[serde(default)]
        scale_by_severity: bool,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    Thought {
        thought: String,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Record value as a fraction of `max`
    Record {
        record: String,
        max: f64,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    Drafted {
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Current map biome is one of `biomes`
    Biome {
        biomes: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// The actor's faction carries an ideology marker
    Ideology {
        marker: String,
        #[serde(default = "default_weight")]
        weight: f64,
    },
}

fn when(hit: bool, weight: f64) -> f64 {
    if hit {
        weight
    } else {
        0.0
    }
}

impl ScoringCondition for ConditionConfig {
    fn score(&self, actor: &Actor, ctx: &ScoringContext<'_>) -> f64 {
        match self {
            ConditionConfig::Trait { name, degree, weight } => when(actor.has_trait(name, *degree), *weight),
            ConditionConfig::Stat {
                stat,
                min,
                max,
                lower_is_better,
                weight,
            } => {
                let Some(&value) = actor.stats.get(stat) else {
                    return 0.0;
                };
                let span = max - min;
                let mut normalized = if span.abs() < f64::EPSILON {
                    when(f64::from(value) >= *min, 1.0)
                } else {
                    ((f64::from(value) - min) / span).clamp(0.0, 1.0)
                };
                if *lower_is_better {
                    normalized = 1.0 - normalized;
                }
                normalized * weight
            }
            ConditionConfig::Skill {
                skill,
                floor,
                max_level,
                weight,
            } => {
                let level = actor.skills.get(skill).copied().unwrap_or(0);
                if level < *floor {
                    return 0.0;
                }
                let fraction = f64::from(level) / f64::from((*max_level).max(1));
                fraction.min(1.0) * weight
            }
            ConditionConfig::Mood { threshold, weight } => {
                when(actor.mood >= *threshold, f64::from(actor.mood) * weight)
            }
            ConditionConfig::Need { need, threshold, weight } => match actor.needs.get(need) {
                Some(&level) if level >= *threshold => f64::from(level) * weight,
                _ => 0.0,
            },
            ConditionConfig::Age { min, max, weight } => {
                let within = actor.age >= *min && max.map_or(true, |m| actor.age <= m);
                when(within, *weight)
            }
            ConditionConfig::Gender { gender, weight } => when(actor.gender == *gender, *weight),
            ConditionConfig::Status {
                status,
                min_severity,
                scale_by_severity,
                weight,
            } => match actor.status(status) {
                Some(s) if s.severity >= *min_severity => {
                    if *scale_by_severity {
                        f64::from(s.severity) * weight
                    } else {
                        *weight
                    }
                }
                _ => 0.0,
            },
            ConditionConfig::Thought { thought, weight } => when(actor.thoughts.contains(thought), *weight),
            ConditionConfig::Record { record, max, weight } => {
                let value = actor.records.get(record).copied().unwrap_or(0.0);
                if *max <= 0.0 {
                    return 0.0;
                }
                (f64::from(value) / max).clamp(0.0, 1.0) * weight
            }
            ConditionConfig::Drafted { weight } => when(actor.drafted, *weight),
            ConditionConfig::Biome { biomes, weight } => when(biomes.contains(&ctx.world.biome), *weight),
            ConditionConfig::Ideology { marker, weight } => {
                when(ctx.world.ideology_of(actor.faction).contains(marker), *weight)
            }
        }
    }
}
