//! Gear - equippable items carrying a charge pool, abilities and a costume
//!
//! Definitions are authored data, instances are the live per-item state and
//! the registry owns every instance by id.

pub mod definition;
mod instance;
mod regen;
mod registry;
mod save;

pub use definition::{
    ActorSignal, ConflictPolicy, GearDefinition, ReactiveEvadeConfig, RegenRule, StealthConfig, TransformationConfig,
    MIN_MAX_CHARGE,
};
pub use instance::GearInstance;
pub use regen::{delta_per_day, nearby_allies, read_signal};
pub use registry::GearRegistry;
pub use save::{GearSave, SaveError, SAVE_VERSION};
