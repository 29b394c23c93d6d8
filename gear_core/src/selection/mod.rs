//! Selection engine - pick the best eligible actor to receive a piece of gear
//!
//! A selection is evaluated when one of its triggers fires. Event triggers
//! only consider the event's subject; periodic checks consider every actor in
//! id order. Candidates pass the eligibility filters, are scored by summing
//! their conditions and the winner is chosen by the selection mode. The
//! caller equips the gear and reports back so run limits can be tracked.

mod condition;
mod eligibility;
mod trigger;

pub use condition::{clamped_score, ConditionConfig, ScoringCondition, ScoringContext};
pub use eligibility::Eligibility;
pub use trigger::{Trigger, TriggerEvent};

use crate::types::{ActorId, GearDefId};
use crate::world::World;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How the winner is chosen among scored candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Highest score; the first enumerated candidate wins ties
    #[default]
    HighestScore,
    /// Proportional to score among candidates scoring at least `min_score`
    WeightedRandom,
    /// Uniform among candidates scoring above `min_score`
    RandomAboveThreshold,
}

/// Caps on how often a selection may assign gear
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLimits {
    /// Finish after the first evaluation, successful or not
    pub once_only: bool,
    /// Finish after the first assignment
    pub stop_after_success: bool,
    pub max_assigned_total: Option<u32>,
    /// Cap on live instances of the gear at once
    pub max_active: Option<u32>,
}

/// Authored selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionDefinition {
    pub name: String,
    /// Gear definition assigned to the winner
    pub gear: String,
    #[serde(skip)]
    pub gear_id: GearDefId,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default)]
    pub conditions: Vec<ConditionConfig>,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub limits: RunLimits,
}

impl SelectionDefinition {
    pub fn new(name: impl Into<String>, gear: impl Into<String>) -> Self {
        SelectionDefinition {
            name: name.into(),
            gear: gear.into(),
            gear_id: GearDefId::default(),
            triggers: Vec::new(),
            eligibility: Eligibility::default(),
            conditions: Vec::new(),
            mode: SelectionMode::default(),
            min_score: 0.0,
            limits: RunLimits::default(),
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_condition(mut self, condition: ConditionConfig) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_mode(mut self, mode: SelectionMode, min_score: f64) -> Self {
        self.mode = mode;
        self.min_score = min_score;
        self
    }

    /// Replace invalid values with safe defaults, returning one message per fix.
    ///
    /// Periodic intervals shorter than `check_window` (the raw ticks between
    /// periodic checks) are raised to it.
    pub fn sanitize(&mut self, check_window: u64) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.min_score.is_finite() {
            warnings.push(format!("min_score = {} is invalid, using 0", self.min_score));
            self.min_score = 0.0;
        }
        let before = self.triggers.len();
        self.triggers
            .retain(|t| !matches!(t, Trigger::Periodic { interval_ticks: 0 }));
        if self.triggers.len() != before {
            warnings.push("periodic trigger with interval 0 dropped".to_string());
        }
        let window = check_window.max(1);
        for trigger in &mut self.triggers {
            if let Trigger::Periodic { interval_ticks } = trigger {
                if *interval_ticks < window {
                    warnings.push(format!(
                        "periodic interval {interval_ticks} is shorter than the check window, using {window}"
                    ));
                    *interval_ticks = window;
                }
            }
        }
        if self.triggers.is_empty() {
            warnings.push("no triggers, selection never runs".to_string());
        }
        warnings
    }
}

/// Persistent run counters of one selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRunState {
    pub runs: u32,
    pub successes: u32,
    pub assigned_total: u32,
    pub finished: bool,
}

/// Run-limit bookkeeping plus host-supplied extra conditions
#[derive(Debug, Default)]
pub struct SelectionEngine {
    runs: BTreeMap<String, SelectionRunState>,
    custom: HashMap<String, Vec<Box<dyn ScoringCondition>>>,
}

impl SelectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scoring term to a selection on top of its authored conditions
    pub fn add_condition(&mut self, selection: impl Into<String>, condition: Box<dyn ScoringCondition>) {
        self.custom.entry(selection.into()).or_default().push(condition);
    }

    pub fn run_state(&self, selection: &str) -> SelectionRunState {
        self.runs.get(selection).copied().unwrap_or_default()
    }

    pub fn run_states(&self) -> &BTreeMap<String, SelectionRunState> {
        &self.runs
    }

    pub fn restore_run_states(&mut self, runs: BTreeMap<String, SelectionRunState>) {
        self.runs = runs;
    }

    /// Whether run limits still allow an evaluation
    pub fn can_run(&self, def: &SelectionDefinition, active_instances: usize) -> bool {
        let state = self.run_state(&def.name);
        if state.finished {
            return false;
        }
        if def.limits.max_assigned_total.is_some_and(|max| state.assigned_total >= max) {
            return false;
        }
        if def.limits.max_active.is_some_and(|max| active_instances >= max as usize) {
            return false;
        }
        true
    }

    /// Sum of every condition, each clamped at 0
    pub fn score(&self, def: &SelectionDefinition, actor: &crate::world::Actor, ctx: &ScoringContext<'_>) -> f64 {
        let authored: f64 = def
            .conditions
            .iter()
            .map(|c| clamped_score(c, actor, ctx))
            .sum();
        let extra: f64 = self
            .custom
            .get(&def.name)
            .map(|list| list.iter().map(|c| clamped_score(c.as_ref(), actor, ctx)).sum())
            .unwrap_or(0.0);
        authored + extra
    }

    /// Eligible candidates with their scores, in enumeration order
    pub fn candidates(
        &self,
        def: &SelectionDefinition,
        event: &TriggerEvent,
        world: &World,
        already_wearing: impl Fn(ActorId) -> bool,
        now: u64,
    ) -> Vec<(ActorId, f64)> {
        let pool: Vec<ActorId> = match event.subject() {
            Some(subject) => vec![subject],
            None => world.actor_ids(),
        };
        let ctx = ScoringContext { world, now };
        pool.into_iter()
            .filter_map(|id| world.actor(id))
            .filter(|actor| def.eligibility.admits(actor, world, already_wearing(actor.id)))
            .map(|actor| (actor.id, self.score(def, actor, &ctx)))
            .collect()
    }

    /// Choose a winner according to the selection mode
    pub fn pick<R: Rng>(&self, def: &SelectionDefinition, candidates: &[(ActorId, f64)], rng: &mut R) -> Option<ActorId> {
        match def.mode {
            SelectionMode::HighestScore => {
                let mut best: Option<(ActorId, f64)> = None;
                for &(id, score) in candidates.iter().filter(|(_, s)| *s >= def.min_score) {
                    if best.map_or(true, |(_, b)| score > b) {
                        best = Some((id, score));
                    }
                }
                best.map(|(id, _)| id)
            }
            SelectionMode::WeightedRandom => {
                let pool: Vec<_> = candidates.iter().filter(|(_, s)| *s >= def.min_score).collect();
                if pool.is_empty() {
                    return None;
                }
                match WeightedIndex::new(pool.iter().map(|(_, s)| *s)) {
                    Ok(dist) => Some(pool[dist.sample(rng)].0),
                    // every weight is zero
                    Err(_) => pool.choose(rng).map(|(id, _)| *id),
                }
            }
            SelectionMode::RandomAboveThreshold => {
                let pool: Vec<_> = candidates.iter().filter(|(_, s)| *s > def.min_score).collect();
                pool.choose(rng).map(|(id, _)| *id)
            }
        }
    }

    /// Candidates plus pick in one step
    pub fn evaluate<R: Rng>(
        &self,
        def: &SelectionDefinition,
        event: &TriggerEvent,
        world: &World,
        already_wearing: impl Fn(ActorId) -> bool,
        rng: &mut R,
        now: u64,
    ) -> Option<ActorId> {
        let candidates = self.candidates(def, event, world, already_wearing, now);
        let winner = self.pick(def, &candidates, rng);
        tracing::debug!(
            selection = %def.name,
            candidates = candidates.len(),
            winner = ?winner,
            "selection evaluated"
        );
        winner
    }

    /// Update run counters after an evaluation
    pub fn record_run(&mut self, def: &SelectionDefinition, assigned: bool) {
        let state = self.runs.entry(def.name.clone()).or_default();
        state.runs += 1;
        if assigned {
            state.successes += 1;
            state.assigned_total += 1;
        }
        let capped = def
            .limits
            .max_assigned_total
            .is_some_and(|max| state.assigned_total >= max);
        if def.limits.once_only || (def.limits.stop_after_success && assigned) || capped {
            state.finished = true;
        }
    }
}
