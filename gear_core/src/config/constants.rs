//! Process-wide tunables

use serde::{Deserialize, Serialize};

/// Tunable simulation constants
///
/// The multipliers scale the charge model uniformly; they never change which
/// sources contribute. The cadences are raw-tick batch sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Multiplier on every ability cost
    pub cost_multiplier: f64,
    /// Multiplier on passive and conditional regeneration
    pub regen_multiplier: f64,
    /// Multiplier on passive drain
    pub drain_multiplier: f64,
    pub ticks_per_second: u64,
    pub ticks_per_day: u64,
    pub days_per_year: u64,
    /// Raw ticks per charge batch
    pub charge_cadence_ticks: u32,
    /// Raw ticks between temporary-effect sweeps
    pub sweep_cadence_ticks: u64,
    /// Raw ticks between periodic selection checks
    pub periodic_check_ticks: u64,
    /// How long a costume render probe stays cached
    pub render_probe_ttl_ticks: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            cost_multiplier: 1.0,
            regen_multiplier: 1.0,
            drain_multiplier: 1.0,
            ticks_per_second: 60,
            ticks_per_day: 60_000,
            days_per_year: 60,
            charge_cadence_ticks: 60,
            sweep_cadence_ticks: 60,
            periodic_check_ticks: 250,
            render_probe_ttl_ticks: 250,
        }
    }
}

impl Tunables {
    /// Simulated day-of-year for an absolute tick
    pub fn day_of_year(&self, tick: u64) -> u32 {
        let day = tick / self.ticks_per_day.max(1);
        (day % self.days_per_year.max(1)) as u32
    }

    /// Convert a tick count to simulated days
    pub fn ticks_to_days(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_day.max(1) as f64
    }

    /// Convert a tick count to real-time seconds
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 / self.ticks_per_second.max(1) as f64
    }

    /// Multipliers must be finite and non-negative; anything else falls back to 1
    pub(crate) fn sanitized(mut self) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        for (name, value) in [
            ("cost_multiplier", &mut self.cost_multiplier),
            ("regen_multiplier", &mut self.regen_multiplier),
            ("drain_multiplier", &mut self.drain_multiplier),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warnings.push(format!("{name} = {value} is invalid, using 1.0"));
                *value = 1.0;
            }
        }
        if self.charge_cadence_ticks == 0 {
            warnings.push("charge_cadence_ticks = 0 is invalid, using 60".to_string());
            self.charge_cadence_ticks = 60;
        }
        (self, warnings)
    }
}
