//! Transformation - conditional costume swap for a gear's wearer
//!
//! Each tick the desired state is recomputed from the wearer and the gear's
//! [`TransformationConfig`]; `apply` and `revert` converge the wearer's
//! apparel toward it. Worn items displaced by the costume are held in the
//! gear's storage and put back in their original order on revert.

mod probe;

pub use probe::RenderProbeCache;

use crate::config::{ContentLibrary, Tunables};
use crate::gear::{ConflictPolicy, GearDefinition, GearInstance, TransformationConfig};
use crate::types::{BodyShape, CellPos};
use crate::world::{Actor, Item, World};
use serde::{Deserialize, Serialize};

/// A worn item held while the costume is on, with the apparel index it was taken from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub item: Item,
    pub index: usize,
}

/// Transformation bookkeeping carried by a gear instance
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub applied: bool,
    /// Removal log; replayed back to front on revert
    pub stored: Vec<StoredItem>,
    /// Body shape before the override, recorded once
    pub original_body_shape: Option<BodyShape>,
    pub body_shape_overridden: bool,
    pub manual_toggle_enabled: bool,
    /// Wearer's cell as of the last update
    pub last_wearer_cell: Option<CellPos>,
}

impl Default for TransformState {
    fn default() -> Self {
        TransformState {
            applied: false,
            stored: Vec::new(),
            original_body_shape: None,
            body_shape_overridden: false,
            manual_toggle_enabled: true,
            last_wearer_cell: None,
        }
    }
}

/// Body shape the wearer has without our override
fn natural_shape(state: &TransformState, wearer: &Actor) -> BodyShape {
    match (state.body_shape_overridden, state.original_body_shape) {
        (true, Some(shape)) => shape,
        _ => wearer.body_shape,
    }
}

fn costume_renders(config: &TransformationConfig, library: &ContentLibrary, shape: BodyShape) -> bool {
    config
        .costume
        .iter()
        .filter_map(|name| library.item_def(name))
        .all(|def| def.renders_for(shape))
}

/// Whether the costume should currently be on. An inactive wearer (dead,
/// unplaced or in a passive mental state) never keeps it.
pub fn should_apply(
    gear: &GearInstance,
    config: &TransformationConfig,
    wearer: &Actor,
    library: &ContentLibrary,
    probes: &mut RenderProbeCache,
    now: u64,
    tunables: &Tunables,
) -> bool {
    let state = &gear.transform;
    if !GearInstance::wearer_active(wearer) || !wearer.wears_apparel {
        return false;
    }
    if config.manual_toggle && !state.manual_toggle_enabled {
        return false;
    }
    if config.require_drafted && !wearer.drafted {
        return false;
    }
    if !config.genders.is_empty() && !config.genders.contains(&wearer.gender) {
        return false;
    }

    let shape = natural_shape(state, wearer);
    if !config.body_shapes_allowed.is_empty() && !config.body_shapes_allowed.contains(&shape) {
        return false;
    }
    if config.body_shapes_denied.contains(&shape) {
        return false;
    }

    if config.skip_unrenderable && config.force_body_shape.is_none() {
        let key = (wearer.id, shape, gear.def);
        return probes.get_or_probe(key, now, tunables.render_probe_ttl_ticks, || {
            costume_renders(config, library, shape)
        });
    }
    true
}

fn costume_complete(gear: &GearInstance, config: &TransformationConfig, wearer: &Actor, library: &ContentLibrary) -> bool {
    config
        .costume
        .iter()
        .filter(|name| library.item_def(name).is_some())
        .all(|name| {
            wearer
                .apparel
                .iter()
                .any(|i| i.costume_of == Some(gear.id) && &i.def == name)
        })
}

/// Put the costume on. Safe to call repeatedly; pieces already worn are left alone.
pub fn apply(gear: &mut GearInstance, config: &TransformationConfig, world: &mut World, library: &ContentLibrary) {
    let wearer_id = gear.wearer;
    let Some(wearer) = world.actor_mut(wearer_id) else {
        return;
    };
    let state = &mut gear.transform;

    if let Some(forced) = config.force_body_shape {
        let current = wearer.body_shape;
        let keep = config.force_only_if_missing && costume_renders(config, library, current);
        if !keep && current != forced {
            if state.original_body_shape.is_none() {
                state.original_body_shape = Some(current);
            }
            wearer.body_shape = forced;
            state.body_shape_overridden = true;
        }
    }

    for name in &config.costume {
        let Some(piece) = library.item_def(name) else {
            tracing::debug!(item = %name, "unknown costume item, skipped");
            continue;
        };
        let Some(wearer) = world.actor_mut(wearer_id) else {
            return;
        };
        if wearer.apparel.iter().any(|i| i.costume_of == Some(gear.id) && &i.def == name) {
            continue;
        }

        let overlaps = |item: &Item| {
            item.id != gear.item && library.item_def(&item.def).is_some_and(|d| d.conflicts_with(piece))
        };
        // Costume pieces are never stored, ours or another gear's
        if wearer.apparel.iter().any(|i| i.costume_of.is_some() && overlaps(i)) {
            continue;
        }
        let clashes = |item: &Item| item.costume_of.is_none() && overlaps(item);
        let has_conflicts = wearer.apparel.iter().any(|i| clashes(i));
        if has_conflicts && config.conflicts == ConflictPolicy::Skip {
            continue;
        }

        while let Some(index) = wearer.apparel.iter().position(|i| clashes(i)) {
            let item = wearer.apparel.remove(index);
            if state.stored.iter().any(|s| s.item.id == item.id) {
                tracing::warn!(gear = %gear.id, item = %item.id, "item already stored, duplicate discarded");
                continue;
            }
            tracing::debug!(gear = %gear.id, item = %item.def, index, "storing conflicting apparel");
            state.stored.push(StoredItem { item, index });
        }

        let id = world.next_item_id();
        let mut item = Item::new(id, name.clone());
        item.hit_points = piece.hit_points;
        item.costume_of = Some(gear.id);
        if let Some(wearer) = world.actor_mut(wearer_id) {
            wearer.apparel.push(item);
        }
    }

    if !state.applied {
        tracing::info!(gear = %gear.id, wearer = %wearer_id, "transformation applied");
    }
    state.applied = true;
}

/// Take the costume off, restore the body shape and return every stored item.
///
/// Stored items that no longer fit are dropped next to the wearer. Storage
/// is always empty afterwards.
pub fn revert(gear: &mut GearInstance, world: &mut World, library: &ContentLibrary) {
    let state = &mut gear.transform;
    let Some(wearer) = world.actor_mut(gear.wearer) else {
        if state.last_wearer_cell.is_none() && !state.stored.is_empty() {
            tracing::warn!(gear = %gear.id, wearer = %gear.wearer, "wearer never placed, dropping stored items at origin");
        }
        for stored in state.stored.drain(..).rev() {
            world.drop_item(stored.item, state.last_wearer_cell);
        }
        state.applied = false;
        return;
    };

    wearer.apparel.retain(|i| i.costume_of != Some(gear.id));
    if state.body_shape_overridden {
        if let Some(shape) = state.original_body_shape.take() {
            wearer.body_shape = shape;
        }
        state.body_shape_overridden = false;
    }

    let position = wearer.position.or(state.last_wearer_cell);
    let mut dropped = Vec::new();
    while let Some(StoredItem { item, index }) = state.stored.pop() {
        let fits = library.item_def(&item.def).map_or(true, |def| {
            !wearer
                .apparel
                .iter()
                .filter(|worn| worn.id != gear.item)
                .filter_map(|worn| library.item_def(&worn.def))
                .any(|worn| worn.conflicts_with(def))
        });
        if fits && !wearer.is_wearing(item.id) {
            let at = index.min(wearer.apparel.len());
            wearer.apparel.insert(at, item);
        } else if !wearer.is_wearing(item.id) {
            dropped.push(item);
        }
    }
    for item in dropped {
        world.drop_item(item, position);
    }

    if state.applied {
        tracing::info!(gear = %gear.id, wearer = %gear.wearer, "transformation reverted");
    }
    state.applied = false;
}

/// Converge toward the desired state for this tick
pub fn update(
    gear: &mut GearInstance,
    def: &GearDefinition,
    world: &mut World,
    library: &ContentLibrary,
    probes: &mut RenderProbeCache,
    now: u64,
    tunables: &Tunables,
) {
    let Some(config) = &def.transformation else {
        return;
    };
    let Some(wearer) = world.actor(gear.wearer) else {
        if gear.transform.applied || !gear.transform.stored.is_empty() {
            revert(gear, world, library);
        }
        return;
    };
    if wearer.position.is_some() {
        gear.transform.last_wearer_cell = wearer.position;
    }

    if should_apply(gear, config, wearer, library, probes, now, tunables) {
        if !gear.transform.applied || !costume_complete(gear, config, wearer, library) {
            apply(gear, config, world, library);
        }
    } else if gear.transform.applied {
        revert(gear, world, library);
    }
}

/// Flip the manual toggle. Disabling reverts at once; enabling re-evaluates at once.
#[allow(clippy::too_many_arguments)]
pub fn set_manual_toggle(
    gear: &mut GearInstance,
    def: &GearDefinition,
    enabled: bool,
    world: &mut World,
    library: &ContentLibrary,
    probes: &mut RenderProbeCache,
    now: u64,
    tunables: &Tunables,
) {
    gear.transform.manual_toggle_enabled = enabled;
    if !enabled {
        if gear.transform.applied {
            revert(gear, world, library);
        }
        return;
    }
    update(gear, def, world, library, probes, now, tunables);
}
