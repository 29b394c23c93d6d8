//! Cached costume render probes

use crate::types::{ActorId, BodyShape, GearDefId};
use std::collections::HashMap;

type ProbeKey = (ActorId, BodyShape, GearDefId);

/// Remembers whether a gear's costume renders for an actor's body shape
#[derive(Debug, Default)]
pub struct RenderProbeCache {
    entries: HashMap<ProbeKey, (bool, u64)>,
}

impl RenderProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result, or run `probe` and cache it for `ttl` ticks
    pub fn get_or_probe(&mut self, key: ProbeKey, now: u64, ttl: u64, probe: impl FnOnce() -> bool) -> bool {
        if let Some(&(renders, expires_at)) = self.entries.get(&key) {
            if now < expires_at {
                return renders;
            }
        }
        let renders = probe();
        self.entries.insert(key, (renders, now + ttl));
        renders
    }

    /// Drop expired entries
    pub fn prune(&mut self, now: u64) {
        self.entries.retain(|_, (_, expires_at)| now < *expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_probe_is_cached_until_expiry() {
        let mut cache = RenderProbeCache::new();
        let calls = Cell::new(0);
        let key = (ActorId(1), BodyShape::Thin, GearDefId(1));
        let probe = || {
            calls.set(calls.get() + 1);
            true
        };

        assert!(cache.get_or_probe(key, 0, 250, probe));
        assert!(cache.get_or_probe(key, 249, 250, probe));
        assert_eq!(calls.get(), 1);
        assert!(cache.get_or_probe(key, 250, 250, probe));
        assert_eq!(calls.get(), 2);

        cache.prune(1000);
        assert!(cache.is_empty());
    }
}
