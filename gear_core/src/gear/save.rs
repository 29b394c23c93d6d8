//! Persisted form of a gear instance
//!
//! Cast records are keyed by ability name on disk so saves survive content
//! reordering. Schema version 1 stored charge as a 0..1 fraction of max;
//! restoring such a save migrates it to an absolute value.

use super::GearInstance;
use crate::ability::CastRecord;
use crate::config::ContentLibrary;
use crate::transform::{StoredItem, TransformState};
use crate::types::{AbilityId, ActorId, BodyShape, CellPos, GearInstanceId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Current schema version written by [`GearSave::capture`]
pub const SAVE_VERSION: u32 = 2;

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("unknown gear definition '{0}'")]
    UnknownGear(String),
    #[error("unknown ability handle {0}")]
    UnknownAbility(AbilityId),
    #[error("unsupported save version {0}")]
    UnsupportedVersion(u32),
    #[error("save JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn legacy_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearSave {
    /// Missing in saves written before versioning
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub id: GearInstanceId,
    /// Gear definition name
    pub gear: String,
    pub item: ItemId,
    pub wearer: ActorId,
    pub charge: f64,
    #[serde(default)]
    pub transformation_applied: bool,
    #[serde(default)]
    pub stored_items: Vec<StoredItem>,
    #[serde(default)]
    pub original_body_shape: Option<BodyShape>,
    #[serde(default)]
    pub body_shape_overridden: bool,
    #[serde(default = "default_true")]
    pub manual_toggle_enabled: bool,
    /// Where stored items go if the wearer is gone when the costume comes off
    #[serde(default)]
    pub last_wearer_cell: Option<CellPos>,
    #[serde(default)]
    pub cast_records: BTreeMap<String, CastRecord>,
    #[serde(default)]
    pub stealth_engaged: bool,
    #[serde(default)]
    pub evade_ready_at: u64,
}

impl GearSave {
    /// Snapshot an instance at the current schema version
    pub fn capture(gear: &GearInstance, library: &ContentLibrary) -> Result<Self, SaveError> {
        let def = library
            .gear(gear.def)
            .ok_or_else(|| SaveError::UnknownGear(gear.def.to_string()))?;
        let mut cast_records = BTreeMap::new();
        for (id, record) in gear.cast_records() {
            let ability = library.ability(id).ok_or(SaveError::UnknownAbility(id))?;
            cast_records.insert(ability.name.clone(), *record);
        }
        Ok(GearSave {
            version: SAVE_VERSION,
            id: gear.id,
            gear: def.name.clone(),
            item: gear.item,
            wearer: gear.wearer,
            charge: gear.charge(),
            transformation_applied: gear.transform.applied,
            stored_items: gear.transform.stored.clone(),
            original_body_shape: gear.transform.original_body_shape,
            body_shape_overridden: gear.transform.body_shape_overridden,
            manual_toggle_enabled: gear.transform.manual_toggle_enabled,
            last_wearer_cell: gear.transform.last_wearer_cell,
            cast_records,
            stealth_engaged: gear.stealth_engaged,
            evade_ready_at: gear.evade_ready_at,
        })
    }

    /// Rebuild the live instance. Records of abilities that no longer exist are dropped.
    pub fn restore(&self, library: &ContentLibrary) -> Result<GearInstance, SaveError> {
        if self.version == 0 || self.version > SAVE_VERSION {
            return Err(SaveError::UnsupportedVersion(self.version));
        }
        let def = library
            .gear_id(&self.gear)
            .and_then(|id| library.gear(id))
            .ok_or_else(|| SaveError::UnknownGear(self.gear.clone()))?;

        let mut gear = GearInstance::new(self.id, def, self.item, self.wearer);
        let charge = if self.version == 1 {
            self.charge * gear.max_charge()
        } else {
            self.charge
        };
        gear.set_charge(charge);

        gear.transform = TransformState {
            applied: self.transformation_applied,
            stored: self.stored_items.clone(),
            original_body_shape: self.original_body_shape,
            body_shape_overridden: self.body_shape_overridden,
            manual_toggle_enabled: self.manual_toggle_enabled,
            last_wearer_cell: self.last_wearer_cell,
        };
        for (name, record) in &self.cast_records {
            match library.ability_id(name) {
                Some(id) => gear.restore_cast_record(id, *record),
                None => tracing::warn!(gear = %self.gear, ability = %name, "dropping cast record of unknown ability"),
            }
        }
        gear.stealth_engaged = self.stealth_engaged && def.stealth.is_some();
        gear.evade_ready_at = self.evade_ready_at;
        Ok(gear)
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        Ok(serde_json::from_str(json)?)
    }
}
