//! Apparel items and their definitions

use crate::types::{ApparelLayer, BodyRegion, BodyShape, GearInstanceId, ItemId};
use serde::{Deserialize, Serialize};

/// A concrete item. Identity and condition survive storage and saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Name of the apparel definition
    pub def: String,
    pub hit_points: u32,
    #[serde(default)]
    pub quality: u8,
    /// Set when the item was created as a costume piece by a gear instance
    #[serde(default)]
    pub costume_of: Option<GearInstanceId>,
}

impl Item {
    pub fn new(id: ItemId, def: impl Into<String>) -> Self {
        Item {
            id,
            def: def.into(),
            hit_points: 100,
            quality: 0,
            costume_of: None,
        }
    }
}

/// Apparel definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: String,
    #[serde(default)]
    pub covers: Vec<BodyRegion>,
    #[serde(default)]
    pub layers: Vec<ApparelLayer>,
    /// Body shapes this item has graphics for (empty = every shape)
    #[serde(default)]
    pub body_shapes: Vec<BodyShape>,
    #[serde(default = "default_hit_points")]
    pub hit_points: u32,
}

fn default_hit_points() -> u32 {
    100
}

impl ItemDef {
    pub fn new(name: impl Into<String>) -> Self {
        ItemDef {
            name: name.into(),
            covers: Vec::new(),
            layers: Vec::new(),
            body_shapes: Vec::new(),
            hit_points: default_hit_points(),
        }
    }

    pub fn with_cover(mut self, region: BodyRegion, layer: ApparelLayer) -> Self {
        if !self.covers.contains(&region) {
            self.covers.push(region);
        }
        if !self.layers.contains(&layer) {
            self.layers.push(layer);
        }
        self
    }

    pub fn with_body_shapes(mut self, shapes: &[BodyShape]) -> Self {
        self.body_shapes = shapes.to_vec();
        self
    }

    /// Two items cannot be worn together when they share a layer on a shared region
    pub fn conflicts_with(&self, other: &ItemDef) -> bool {
        let shares_layer = self.layers.iter().any(|l| other.layers.contains(l));
        let shares_region = self.covers.iter().any(|r| other.covers.contains(r));
        shares_layer && shares_region
    }

    /// Whether the item has a graphic for the given body shape
    pub fn renders_for(&self, shape: BodyShape) -> bool {
        self.body_shapes.is_empty() || self.body_shapes.contains(&shape)
    }
}
