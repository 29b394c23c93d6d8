//! GearRegistry - owns every live gear instance

use super::GearInstance;
use crate::types::{ActorId, GearDefId, GearInstanceId};
use std::collections::BTreeMap;

/// Live instances keyed by id; iteration is in id order
#[derive(Debug, Default)]
pub struct GearRegistry {
    instances: BTreeMap<GearInstanceId, GearInstance>,
    next_id: u32,
}

impl GearRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out an id that has never been used in this registry
    pub fn allocate_id(&mut self) -> GearInstanceId {
        self.next_id = self.next_id.max(1);
        let id = GearInstanceId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert an instance under its own id, replacing any previous one
    pub fn insert(&mut self, gear: GearInstance) {
        if gear.id.0 >= self.next_id {
            self.next_id = gear.id.0 + 1;
        }
        self.instances.insert(gear.id, gear);
    }

    pub fn get(&self, id: GearInstanceId) -> Option<&GearInstance> {
        self.instances.get(&id)
    }

    pub fn get_mut(&mut self, id: GearInstanceId) -> Option<&mut GearInstance> {
        self.instances.get_mut(&id)
    }

    pub fn remove(&mut self, id: GearInstanceId) -> Option<GearInstance> {
        self.instances.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GearInstance> {
        self.instances.values()
    }

    pub fn ids(&self) -> Vec<GearInstanceId> {
        self.instances.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances worn by an actor
    pub fn worn_by(&self, actor: ActorId) -> impl Iterator<Item = &GearInstance> {
        self.instances.values().filter(move |g| g.wearer == actor)
    }

    pub fn is_wearing(&self, actor: ActorId, def: GearDefId) -> bool {
        self.worn_by(actor).any(|g| g.def == def)
    }

    /// Number of live instances of a definition
    pub fn active_count(&self, def: GearDefId) -> usize {
        self.instances.values().filter(|g| g.def == def).count()
    }
}
