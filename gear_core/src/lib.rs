//! gear_core - Resource-gated equippable gear for a colony simulation
//!
//! This library provides:
//! - GearInstance: A charge pool with passive and conditional regeneration
//! - Abilities: Gate strategies (cost, limit, target rule) and payload effects
//! - Transformation: A conditional costume swap that restores the original outfit
//! - Selection: Trigger-driven, score-based assignment of gear to actors
//! - Runtime: The tick loop owning the world and every service

pub mod ability;
pub mod config;
pub mod gear;
pub mod prelude;
pub mod runtime;
pub mod selection;
pub mod temporary;
pub mod transform;
pub mod types;
mod warn_once;
pub mod world;

// Re-export core types for convenience
pub use ability::{AbilityDefinition, AbilityEffect, CastDenied};
pub use config::{default_content, load_content, parse_content, ConfigError, ContentLibrary, Tunables};
pub use gear::{GearDefinition, GearInstance, GearRegistry, GearSave, SaveError};
pub use runtime::{Runtime, RuntimeError, RuntimeSave};
pub use selection::{ScoringCondition, ScoringContext, SelectionDefinition, SelectionEngine, Trigger, TriggerEvent};
pub use temporary::{TemporaryKey, TemporaryRegistry};
pub use types::{AbilityId, ActorId, CastTarget, CellPos, GearDefId, GearInstanceId, ItemId};
pub use warn_once::WarnOnce;
pub use world::{Actor, World};
