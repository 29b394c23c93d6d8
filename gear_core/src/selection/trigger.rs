//! Selection triggers and the events that fire them

use crate::types::ActorId;
use serde::{Deserialize, Serialize};

/// When a selection is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Due when `now % interval_ticks < window`, `window` being the periodic check cadence
    Periodic { interval_ticks: u64 },
    ActorJoined,
    ActorSpawned,
    ActorDowned,
    /// Empty list = any mental state
    MentalStateStarted {
        #[serde(default)]
        states: Vec<String>,
    },
    /// The killer is the candidate
    ActorKilled,
    /// Empty list = any status
    StatusAdded {
        #[serde(default)]
        statuses: Vec<String>,
    },
}

/// Something that happened, delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    Periodic,
    ActorJoined(ActorId),
    ActorSpawned(ActorId),
    ActorDowned(ActorId),
    MentalStateStarted { actor: ActorId, state: String },
    ActorKilled { killer: ActorId, victim: ActorId },
    StatusAdded { actor: ActorId, status: String },
}

impl TriggerEvent {
    /// The only candidate of an event trigger; `None` for periodic checks
    pub fn subject(&self) -> Option<ActorId> {
        match self {
            TriggerEvent::Periodic => None,
            TriggerEvent::ActorJoined(a) | TriggerEvent::ActorSpawned(a) | TriggerEvent::ActorDowned(a) => Some(*a),
            TriggerEvent::MentalStateStarted { actor, .. } | TriggerEvent::StatusAdded { actor, .. } => Some(*actor),
            TriggerEvent::ActorKilled { killer, .. } => Some(*killer),
        }
    }
}

fn listed(allow: &[String], value: &str) -> bool {
    allow.is_empty() || allow.iter().any(|s| s == value)
}

impl Trigger {
    pub fn matches(&self, event: &TriggerEvent, now: u64, window: u64) -> bool {
        match (self, event) {
            (Trigger::Periodic { interval_ticks }, TriggerEvent::Periodic) => {
                *interval_ticks > 0 && now % interval_ticks < window.max(1)
            }
            (Trigger::ActorJoined, TriggerEvent::ActorJoined(_)) => true,
            (Trigger::ActorSpawned, TriggerEvent::ActorSpawned(_)) => true,
            (Trigger::ActorDowned, TriggerEvent::ActorDowned(_)) => true,
            (Trigger::MentalStateStarted { states }, TriggerEvent::MentalStateStarted { state, .. }) => {
                listed(states, state)
            }
            (Trigger::ActorKilled, TriggerEvent::ActorKilled { .. }) => true,
            (Trigger::StatusAdded { statuses }, TriggerEvent::StatusAdded { status, .. }) => listed(statuses, status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_window() {
        let trigger = Trigger::Periodic { interval_ticks: 1000 };
        let window = 250;
        assert!(trigger.matches(&TriggerEvent::Periodic, 2000, window));
        assert!(trigger.matches(&TriggerEvent::Periodic, 2249, window));
        assert!(!trigger.matches(&TriggerEvent::Periodic, 2250, window));
        assert!(!trigger.matches(&TriggerEvent::ActorJoined(ActorId(1)), 2000, window));
    }

    #[test]
    fn test_allow_lists() {
        let any = Trigger::MentalStateStarted { states: vec![] };
        let only_berserk = Trigger::MentalStateStarted {
            states: vec!["berserk".into()],
        };
        let event = TriggerEvent::MentalStateStarted {
            actor: ActorId(1),
            state: "sad_wander".into(),
        };
        assert!(any.matches(&event, 0, 1));
        assert!(!only_berserk.matches(&event, 0, 1));
    }

    #[test]
    fn test_killer_is_subject() {
        let event = TriggerEvent::ActorKilled {
            killer: ActorId(3),
            victim: ActorId(9),
        };
        assert_eq!(event.subject(), Some(ActorId(3)));
        assert_eq!(TriggerEvent::Periodic.subject(), None);
    }
}
