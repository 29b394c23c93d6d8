//! GearInstance - live state of one equipped gear item

use super::definition::{GearDefinition, MIN_MAX_CHARGE};
use super::regen;
use crate::ability::{CastDenied, CastRecord};
use crate::config::Tunables;
use crate::transform::TransformState;
use crate::types::{AbilityId, ActorId, GearDefId, GearInstanceId, ItemId};
use crate::world::{Actor, World};
use std::collections::HashMap;

/// Mutable state of one worn gear item
#[derive(Debug, Clone)]
pub struct GearInstance {
    pub id: GearInstanceId,
    pub def: GearDefId,
    /// The gear item itself, worn by `wearer`
    pub item: ItemId,
    pub wearer: ActorId,
    charge: f64,
    max_charge: f64,
    /// Raw ticks accumulated toward the next charge batch
    batch_ticks: u32,
    pub transform: TransformState,
    cast_records: HashMap<AbilityId, CastRecord>,
    pub stealth_engaged: bool,
    /// Tick at which reactive evade is available again
    pub evade_ready_at: u64,
}

impl GearInstance {
    /// Slack for comparing charge against fractional costs
    pub const CHARGE_EPSILON: f64 = 1e-9;

    /// A freshly equipped instance starts full
    pub fn new(id: GearInstanceId, def: &GearDefinition, item: ItemId, wearer: ActorId) -> Self {
        let max_charge = def.max_charge.max(MIN_MAX_CHARGE);
        GearInstance {
            id,
            def: def.id,
            item,
            wearer,
            charge: max_charge,
            max_charge,
            batch_ticks: 0,
            transform: TransformState::default(),
            cast_records: HashMap::new(),
            stealth_engaged: false,
            evade_ready_at: 0,
        }
    }

    // === Charge ===

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn max_charge(&self) -> f64 {
        self.max_charge
    }

    /// Charge as a fraction of max
    pub fn charge_percent(&self) -> f64 {
        self.charge / self.max_charge
    }

    /// Set the absolute charge, clamped to `[0, max]`
    pub fn set_charge(&mut self, charge: f64) {
        self.charge = if charge.is_finite() {
            charge.clamp(0.0, self.max_charge)
        } else {
            0.0
        };
    }

    /// Alive, placed and not in a passive mental state
    pub fn wearer_active(wearer: &Actor) -> bool {
        wearer.is_alive() && wearer.is_placed() && !wearer.in_passive_mental_state()
    }

    /// Spend `fraction` of max (scaled by the cost multiplier).
    ///
    /// Either the whole amount is taken or nothing changes.
    pub fn try_consume_charge(&mut self, fraction: f64, wearer: &Actor, tunables: &Tunables) -> bool {
        if !Self::wearer_active(wearer) {
            return false;
        }
        let amount = fraction.max(0.0) * tunables.cost_multiplier * self.max_charge;
        if self.charge + Self::CHARGE_EPSILON * self.max_charge < amount {
            return false;
        }
        self.charge = (self.charge - amount).max(0.0);
        true
    }

    /// Advance one raw tick. Charge only moves once per batch.
    ///
    /// Returns the applied delta when a batch completed for an active wearer.
    pub fn tick(&mut self, def: &GearDefinition, world: &World, tunables: &Tunables) -> Option<f64> {
        self.batch_ticks += 1;
        if self.batch_ticks < tunables.charge_cadence_ticks {
            return None;
        }
        let elapsed = u64::from(std::mem::take(&mut self.batch_ticks));

        let wearer = world.actor(self.wearer)?;
        if !Self::wearer_active(wearer) {
            return None;
        }

        let mut per_day = regen::delta_per_day(def, wearer, world, tunables);
        if self.stealth_engaged {
            if let Some(stealth) = &def.stealth {
                per_day -= stealth.drain_per_day * tunables.drain_multiplier;
            }
        }

        let before = self.charge;
        self.set_charge(self.charge + per_day * self.max_charge * tunables.ticks_to_days(elapsed));

        if self.stealth_engaged && self.charge <= 0.0 {
            self.stealth_engaged = false;
            tracing::info!(gear = %self.id, wearer = %self.wearer, "stealth dropped: out of charge");
        }
        Some(self.charge - before)
    }

    // === Cast records ===

    pub fn cast_record(&self, ability: AbilityId) -> Option<&CastRecord> {
        self.cast_records.get(&ability)
    }

    pub fn cast_record_mut(&mut self, ability: AbilityId) -> &mut CastRecord {
        self.cast_records.entry(ability).or_default()
    }

    pub fn cast_records(&self) -> impl Iterator<Item = (AbilityId, &CastRecord)> {
        self.cast_records.iter().map(|(id, r)| (*id, r))
    }

    // === Charge-gated toggles ===

    /// Engage stealth if the definition offers it and enough charge is present
    pub fn try_engage_stealth(&mut self, def: &GearDefinition, wearer: &Actor) -> Result<(), CastDenied> {
        let stealth = def.stealth.as_ref().ok_or(CastDenied::AbilityNotGranted)?;
        if !Self::wearer_active(wearer) {
            return Err(CastDenied::Inactive);
        }
        let percent = self.charge_percent();
        if self.charge <= 0.0 || percent + Self::CHARGE_EPSILON < stealth.min_charge_to_engage {
            return Err(CastDenied::InsufficientCharge {
                percent: percent * 100.0,
                required: stealth.min_charge_to_engage * 100.0,
            });
        }
        self.stealth_engaged = true;
        Ok(())
    }

    pub fn disengage_stealth(&mut self) {
        self.stealth_engaged = false;
    }

    /// Spend charge to negate an incoming hit. `true` when the hit is evaded.
    pub fn try_reactive_evade(&mut self, def: &GearDefinition, wearer: &Actor, now: u64, tunables: &Tunables) -> bool {
        let Some(evade) = &def.reactive_evade else {
            return false;
        };
        if now < self.evade_ready_at || !self.try_consume_charge(evade.cost, wearer, tunables) {
            return false;
        }
        self.evade_ready_at = now + evade.cooldown_ticks;
        tracing::debug!(gear = %self.id, wearer = %self.wearer, "reactive evade");
        true
    }

    // === Restore helpers ===

    pub(crate) fn restore_cast_record(&mut self, ability: AbilityId, record: CastRecord) {
        self.cast_records.insert(ability, record);
    }
}
