//! Prelude module for convenient imports
//!
//! ```rust
//! use gear_core::prelude::*;
//! ```

// Core types
pub use crate::types::{AbilityId, ActorId, CastTarget, CellPos, FactionId, GearDefId, GearInstanceId, ItemId};

// World model
pub use crate::world::{Actor, Injury, Item, ItemDef, MentalState, World};

// Gear
pub use crate::gear::{GearDefinition, GearInstance, GearRegistry, GearSave};

// Abilities
pub use crate::ability::{AbilityDefinition, AbilityEffect, CastDenied};

// Selection
pub use crate::selection::{ConditionConfig, ScoringCondition, ScoringContext, SelectionDefinition, SelectionMode, Trigger};

// Runtime
pub use crate::runtime::{Runtime, RuntimeError, RuntimeSave};

// Config
pub use crate::config::{default_content, ContentLibrary, Tunables};
