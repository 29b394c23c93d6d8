//! Map grid, placed things, area effects and factions

use crate::types::{ActorKind, AreaEffectId, CellPos, FactionId, ThingId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Walkability and light over a rectangular map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    /// Impassable terrain (walls, deep water)
    pub blocked: HashSet<CellPos>,
    /// Per-cell light overrides in 0..1
    pub lit: HashMap<CellPos, f32>,
    pub ambient_light: f32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Grid {
            width,
            height,
            blocked: HashSet::new(),
            lit: HashMap::new(),
            ambient_light: 0.5,
        }
    }

    pub fn in_bounds(&self, cell: CellPos) -> bool {
        cell.x >= 0 && cell.z >= 0 && cell.x < self.width && cell.z < self.height
    }

    pub fn block(&mut self, cell: CellPos) {
        self.blocked.insert(cell);
    }

    pub fn light_at(&self, cell: CellPos) -> f32 {
        self.lit.get(&cell).copied().unwrap_or(self.ambient_light)
    }
}

/// Definition of a spawnable thing (building, construct, smoke source)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThingDef {
    pub name: String,
    /// Whether actors can walk through it
    #[serde(default = "default_true")]
    pub passable: bool,
}

fn default_true() -> bool {
    true
}

impl ThingDef {
    pub fn new(name: impl Into<String>) -> Self {
        ThingDef {
            name: name.into(),
            passable: true,
        }
    }

    pub fn impassable(mut self) -> Self {
        self.passable = false;
        self
    }
}

/// Definition of a summonable creature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatureDef {
    pub name: String,
    #[serde(default)]
    pub kind: ActorKind,
    #[serde(default = "default_true")]
    pub violence_capable: bool,
}

impl CreatureDef {
    pub fn new(name: impl Into<String>, kind: ActorKind) -> Self {
        CreatureDef {
            name: name.into(),
            kind,
            violence_capable: true,
        }
    }
}

/// A non-actor thing placed on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    pub id: ThingId,
    pub def: String,
    pub position: CellPos,
    pub faction: Option<FactionId>,
    pub passable: bool,
}

/// A lingering area effect (smoke, fog)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaEffect {
    pub id: AreaEffectId,
    pub def: String,
    pub center: CellPos,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    #[serde(default)]
    pub hostile_to: HashSet<FactionId>,
    #[serde(default)]
    pub allied_with: HashSet<FactionId>,
    /// Ideology markers (precepts, memes) carried by members
    #[serde(default)]
    pub ideology: Vec<String>,
}

/// Relationship between two (optional) factions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactionRelation {
    Same,
    Ally,
    Neutral,
    Hostile,
    /// One side has no faction
    Unaffiliated,
}
