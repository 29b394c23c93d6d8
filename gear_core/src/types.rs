//! Core types shared by every subsystem

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

id_type!(
    /// Actor (pawn) identifier
    ActorId(u32)
);
id_type!(
    /// Identifier of a concrete item (apparel, costume piece, gear item)
    ItemId(u64)
);
id_type!(
    /// Identifier of a non-actor thing placed on the map
    ThingId(u32)
);
id_type!(
    /// Identifier of an area effect (smoke, fog) on the map
    AreaEffectId(u32)
);
id_type!(
    /// Identifier of a live gear instance
    GearInstanceId(u32)
);
id_type!(
    /// Handle assigned to an ability definition at load time
    AbilityId(u32)
);
id_type!(
    /// Handle assigned to a gear definition at load time
    GearDefId(u32)
);
id_type!(
    /// Faction identifier
    FactionId(u32)
);

/// Integer map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub z: i32,
}

impl CellPos {
    pub const fn new(x: i32, z: i32) -> Self {
        CellPos { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        CellPos::new(self.x + dx, self.z + dz)
    }

    /// Euclidean distance between cell centres
    pub fn distance(self, other: CellPos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    pub fn within(self, other: CellPos, radius: f32) -> bool {
        self.distance(other) <= radius
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    None,
    Male,
    Female,
}

/// Body shape used to pick apparel graphics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyShape {
    #[default]
    Male,
    Female,
    Thin,
    Hulk,
    Fat,
    Child,
}

/// Body regions an apparel item covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Head,
    Eyes,
    Torso,
    Arms,
    Hands,
    Waist,
    Legs,
    Feet,
}

/// Layers an apparel item occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApparelLayer {
    Skin,
    Middle,
    Shell,
    Belt,
    Overhead,
    EyeCover,
}

/// What kind of creature an actor is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    #[default]
    Humanlike,
    Animal,
    Mechanoid,
    Anomaly,
}

/// Social role of an actor relative to the player colony
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    #[default]
    Colonist,
    Prisoner,
    Slave,
    Guest,
    /// Not attached to the colony (wild animals, raiders, visitors)
    Outsider,
}

/// Coarse category used by category outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    Organic,
    Mechanical,
    Anomalous,
    Other,
}

impl From<ActorKind> for TargetCategory {
    fn from(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Humanlike | ActorKind::Animal => TargetCategory::Organic,
            ActorKind::Mechanoid => TargetCategory::Mechanical,
            ActorKind::Anomaly => TargetCategory::Anomalous,
        }
    }
}

/// Relationship class of a cast target relative to the caster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetClass {
    Caster,
    Allied,
    Neutral,
    Hostile,
    NoFaction,
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetClass::Caster => "self",
            TargetClass::Allied => "allied",
            TargetClass::Neutral => "neutral",
            TargetClass::Hostile => "hostile",
            TargetClass::NoFaction => "no faction",
        };
        f.write_str(s)
    }
}

/// Where an ability is aimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastTarget {
    Cell(CellPos),
    Actor(ActorId),
    Thing(ThingId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_distance() {
        let a = CellPos::new(0, 0);
        let b = CellPos::new(3, 4);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
        assert!(a.within(b, 5.0));
        assert!(!a.within(b, 4.9));
    }

    #[test]
    fn test_category_from_kind() {
        assert_eq!(TargetCategory::from(ActorKind::Animal), TargetCategory::Organic);
        assert_eq!(TargetCategory::from(ActorKind::Mechanoid), TargetCategory::Mechanical);
        assert_eq!(TargetCategory::from(ActorKind::Anomaly), TargetCategory::Anomalous);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let json = serde_json::to_string(&AbilityId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
