//! Actor - the signals the host writes and the effects the core applies

use super::item::Item;
use crate::types::{ActorId, ActorKind, ActorRole, BodyShape, CellPos, FactionId, Gender};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An involuntary abnormal state (mental break)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalState {
    pub name: String,
    /// Aggressive states (berserk) keep gear active; passive ones suspend it
    pub aggressive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injury {
    pub label: String,
    pub severity: f32,
}

/// A named status effect (hediff) with a severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub name: String,
    pub severity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterTrait {
    pub name: String,
    #[serde(default)]
    pub degree: i32,
}

/// Simulation-side view of a pawn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub kind: ActorKind,
    pub role: ActorRole,
    pub faction: Option<FactionId>,
    pub gender: Gender,
    pub body_shape: BodyShape,
    pub age: f32,

    // === Placement & state ===
    /// `None` when the actor is not placed on the map
    pub position: Option<CellPos>,
    pub dead: bool,
    pub downed: bool,
    pub drafted: bool,
    pub violence_capable: bool,
    /// Whether the actor has an apparel system at all
    pub wears_apparel: bool,
    pub mental_state: Option<MentalState>,
    pub stunned_until: Option<u64>,

    // === Signals (0..1) ===
    pub mood: f32,
    pub pain: f32,
    pub psyfocus: f32,

    // === Health ===
    pub injuries: Vec<Injury>,
    pub status_effects: Vec<StatusEffect>,

    // === Equipment ===
    /// Worn apparel in wear order
    pub apparel: Vec<Item>,

    // === Scoring inputs ===
    pub traits: Vec<CharacterTrait>,
    pub stats: HashMap<String, f32>,
    pub skills: HashMap<String, u32>,
    pub needs: HashMap<String, f32>,
    pub thoughts: Vec<String>,
    pub records: HashMap<String, f32>,
}

impl Actor {
    /// A healthy adult humanlike colonist with neutral signals
    pub fn humanlike(name: impl Into<String>, faction: Option<FactionId>) -> Self {
        Actor {
            name: name.into(),
            kind: ActorKind::Humanlike,
            role: ActorRole::Colonist,
            faction,
            age: 30.0,
            violence_capable: true,
            wears_apparel: true,
            mood: 0.5,
            ..Default::default()
        }
    }

    /// A wild or tamed animal
    pub fn animal(name: impl Into<String>, faction: Option<FactionId>) -> Self {
        Actor {
            name: name.into(),
            kind: ActorKind::Animal,
            role: if faction.is_some() {
                ActorRole::Colonist
            } else {
                ActorRole::Outsider
            },
            faction,
            age: 3.0,
            violence_capable: true,
            mood: 0.5,
            ..Default::default()
        }
    }

    pub fn at(mut self, pos: CellPos) -> Self {
        self.position = Some(pos);
        self
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_stunned(&self, now: u64) -> bool {
        self.stunned_until.is_some_and(|until| now < until)
    }

    /// In a mental state that is not aggressive
    pub fn in_passive_mental_state(&self) -> bool {
        self.mental_state.as_ref().is_some_and(|m| !m.aggressive)
    }

    /// Sum of injury severities
    pub fn total_injury(&self) -> f32 {
        self.injuries.iter().map(|i| i.severity).sum()
    }

    pub fn status(&self, name: &str) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|s| s.name == name)
    }

    pub fn has_trait(&self, name: &str, degree: Option<i32>) -> bool {
        self.traits
            .iter()
            .any(|t| t.name == name && degree.map_or(true, |d| d == t.degree))
    }

    pub fn is_wearing(&self, id: crate::types::ItemId) -> bool {
        self.apparel.iter().any(|i| i.id == id)
    }

    /// Add a status effect or raise an existing one.
    ///
    /// With `stack` the severity adds up to `max_severity`; without it the
    /// existing severity is replaced by the larger of the two.
    pub fn add_status(&mut self, name: &str, severity: f32, stack: bool, max_severity: Option<f32>) -> f32 {
        let cap = max_severity.unwrap_or(f32::MAX);
        if let Some(existing) = self.status_effects.iter_mut().find(|s| s.name == name) {
            existing.severity = if stack {
                (existing.severity + severity).min(cap)
            } else {
                existing.severity.max(severity).min(cap)
            };
            existing.severity
        } else {
            let severity = severity.min(cap);
            self.status_effects.push(StatusEffect {
                name: name.to_string(),
                severity,
            });
            severity
        }
    }

    /// Remove a status effect, returning whether it was present
    pub fn remove_status(&mut self, name: &str) -> bool {
        let before = self.status_effects.len();
        self.status_effects.retain(|s| s.name != name);
        self.status_effects.len() != before
    }

    /// Heal injuries most-severe first. Returns the amount actually healed.
    pub fn heal(&mut self, budget: f32) -> f32 {
        let mut remaining = budget.max(0.0);
        self.injuries
            .sort_by(|a, b| b.severity.partial_cmp(&a.severity).unwrap_or(std::cmp::Ordering::Equal));
        for injury in &mut self.injuries {
            if remaining <= 0.0 {
                break;
            }
            let healed = injury.severity.min(remaining);
            injury.severity -= healed;
            remaining -= healed;
        }
        self.injuries.retain(|i| i.severity > f32::EPSILON);
        budget.max(0.0) - remaining
    }
}
