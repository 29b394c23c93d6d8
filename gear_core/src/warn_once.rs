//! WarnOnce - log a recurring runtime problem a single time

use std::collections::HashSet;
use std::fmt::Display;

#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: HashSet<String>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `message` as a warning the first time `key` is seen. Returns whether it was emitted.
    pub fn warn(&mut self, key: &str, message: impl Display) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string());
        tracing::warn!("{message}");
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warns_once_per_key() {
        let mut once = WarnOnce::new();
        assert!(once.warn("thing:wall", "unknown thing 'wall'"));
        assert!(!once.warn("thing:wall", "unknown thing 'wall'"));
        assert!(once.warn("thing:door", "unknown thing 'door'"));
        assert_eq!(once.len(), 2);
    }
}
