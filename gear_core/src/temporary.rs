//! TemporaryRegistry - expiry tracking for time-bounded side effects
//!
//! Payloads register anything that must be undone later (summons, spawned
//! things, timed statuses, area clouds). The runtime sweeps on a fixed
//! cadence and reverts whatever has expired.

use crate::types::{ActorId, AreaEffectId, ThingId};
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a temporary entry undoes when it expires
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporaryKey {
    Thing(ThingId),
    Actor(ActorId),
    Status { actor: ActorId, status: String },
    Area(AreaEffectId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporaryRegistry {
    entries: BTreeMap<TemporaryKey, u64>,
}

impl TemporaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key` until `expires_at`. Re-registering only ever extends the expiry.
    pub fn register(&mut self, key: TemporaryKey, expires_at: u64) {
        self.entries
            .entry(key)
            .and_modify(|e| *e = (*e).max(expires_at))
            .or_insert(expires_at);
    }

    /// Stop tracking without reverting
    pub fn forget(&mut self, key: &TemporaryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn expiry(&self, key: &TemporaryKey) -> Option<u64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Revert and drop every entry with `expires_at <= now`, returning the expired keys
    pub fn sweep(&mut self, now: u64, world: &mut World) -> Vec<TemporaryKey> {
        let expired: Vec<TemporaryKey> = self
            .entries
            .iter()
            .filter(|(_, &at)| at <= now)
            .map(|(k, _)| k.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            let reverted = match key {
                TemporaryKey::Thing(id) => world.despawn_thing(*id),
                TemporaryKey::Actor(id) => world.remove_actor(*id).is_some(),
                TemporaryKey::Status { actor, status } => {
                    world.actor_mut(*actor).is_some_and(|a| a.remove_status(status))
                }
                TemporaryKey::Area(id) => world.remove_area_effect(*id),
            };
            tracing::debug!(?key, reverted, "temporary effect expired");
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellPos;
    use crate::world::{Actor, ThingDef};

    #[test]
    fn test_register_extends_only() {
        let mut reg = TemporaryRegistry::new();
        let key = TemporaryKey::Thing(ThingId(1));
        reg.register(key.clone(), 500);
        reg.register(key.clone(), 300);
        assert_eq!(reg.expiry(&key), Some(500));
        reg.register(key.clone(), 800);
        assert_eq!(reg.expiry(&key), Some(800));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_sweep_reverts_expired() {
        let mut world = World::new(10, 10);
        let wall = world.spawn_thing(&ThingDef::new("wall"), CellPos::new(1, 1), None);
        let wolf = world.add_actor(Actor::animal("wolf", None).at(CellPos::new(2, 2)));
        let mut reg = TemporaryRegistry::new();
        reg.register(TemporaryKey::Thing(wall), 100);
        reg.register(TemporaryKey::Actor(wolf), 200);

        assert!(reg.sweep(99, &mut world).is_empty());
        assert_eq!(reg.sweep(150, &mut world), vec![TemporaryKey::Thing(wall)]);
        assert!(world.thing(wall).is_none());
        assert!(world.actor(wolf).is_some());

        reg.sweep(200, &mut world);
        assert!(world.actor(wolf).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_already_gone_entity_is_dropped() {
        let mut world = World::new(10, 10);
        let mut reg = TemporaryRegistry::new();
        reg.register(TemporaryKey::Area(AreaEffectId(42)), 10);
        assert_eq!(reg.sweep(10, &mut world).len(), 1);
        assert!(reg.is_empty());
    }
}
