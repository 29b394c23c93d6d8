//! Regeneration sources - passive rates plus conditional rules read from actor signals

use super::definition::{ActorSignal, GearDefinition, RegenRule};
use crate::config::Tunables;
use crate::world::{Actor, World};

/// Current value of a 0..1 actor signal
pub fn read_signal(signal: ActorSignal, wearer: &Actor, world: &World) -> f64 {
    let value = match signal {
        ActorSignal::Mood => wearer.mood,
        ActorSignal::Pain => wearer.pain,
        ActorSignal::Light => wearer.position.map_or(0.0, |p| world.light_at(p)),
        ActorSignal::Psyfocus => wearer.psyfocus,
        ActorSignal::NearbyAllies => return nearby_allies(wearer, world, f32::MAX, u32::MAX) as f64,
    };
    value as f64
}

/// Living, non-downed actors of the wearer's faction within `radius`, capped at `max_count`
pub fn nearby_allies(wearer: &Actor, world: &World, radius: f32, max_count: u32) -> u32 {
    let (Some(faction), Some(center)) = (wearer.faction, wearer.position) else {
        return 0;
    };
    let count = world
        .actors_within(center, radius)
        .into_iter()
        .filter_map(|id| world.actor(id))
        .filter(|a| a.id != wearer.id && !a.downed && a.faction == Some(faction))
        .count();
    (count as u32).min(max_count)
}

/// Contribution of one conditional rule, before the regen multiplier
fn rule_contribution(rule: &RegenRule, wearer: &Actor, world: &World) -> f64 {
    if rule.signal == ActorSignal::NearbyAllies {
        let count = nearby_allies(wearer, world, rule.radius, rule.max_count);
        if count == 0 || (count as f64) < rule.threshold {
            return 0.0;
        }
        return rule.rate * count as f64;
    }

    let value = read_signal(rule.signal, wearer, world);
    if value < rule.threshold {
        return 0.0;
    }
    let scale = if rule.scaled && rule.threshold < 1.0 {
        ((value - rule.threshold) / (1.0 - rule.threshold)).clamp(0.0, 1.0)
    } else {
        1.0
    };
    rule.rate * scale
}

/// Net charge change per simulated day, as a fraction of max
pub fn delta_per_day(def: &GearDefinition, wearer: &Actor, world: &World, tunables: &Tunables) -> f64 {
    let passive = def.passive_regen * tunables.regen_multiplier - def.passive_drain * tunables.drain_multiplier;
    let conditional: f64 = def
        .regen_rules
        .iter()
        .map(|rule| rule_contribution(rule, wearer, world))
        .sum();
    passive + conditional * tunables.regen_multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellPos;

    fn setup() -> (World, Actor) {
        let mut world = World::new(30, 30);
        let colony = world.add_faction("colony");
        let id = world.add_actor(Actor::humanlike("Wearer", Some(colony)).at(CellPos::new(10, 10)));
        let wearer = world.actor(id).cloned().unwrap();
        (world, wearer)
    }

    #[test]
    fn test_passive_and_scaled_mood() {
        let (world, mut wearer) = setup();
        let mut def = GearDefinition::new("brooch", "brooch_item");
        def.passive_regen = 0.1;
        def.regen_rules.push(RegenRule::new(ActorSignal::Mood, 0.5, 0.05).scaled());

        wearer.mood = 1.0;
        let t = Tunables::default();
        assert!((delta_per_day(&def, &wearer, &world, &t) - 0.15).abs() < 1e-9);

        wearer.mood = 0.75;
        assert!((delta_per_day(&def, &wearer, &world, &t) - 0.125).abs() < 1e-9);

        wearer.mood = 0.4;
        assert!((delta_per_day(&def, &wearer, &world, &t) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_multipliers() {
        let (world, wearer) = setup();
        let mut def = GearDefinition::new("brooch", "brooch_item");
        def.passive_regen = 0.2;
        def.passive_drain = 0.1;
        let t = Tunables {
            regen_multiplier: 2.0,
            drain_multiplier: 3.0,
            ..Tunables::default()
        };
        assert!((delta_per_day(&def, &wearer, &world, &t) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_nearby_allies_rule() {
        let (mut world, wearer) = setup();
        let colony = wearer.faction;
        for x in 11..15 {
            world.add_actor(Actor::humanlike("Friend", colony).at(CellPos::new(x, 10)));
        }
        let downed = world.add_actor(Actor::humanlike("Downed", colony).at(CellPos::new(10, 11)));
        world.actor_mut(downed).unwrap().downed = true;
        world.add_actor(Actor::humanlike("Stranger", None).at(CellPos::new(10, 12)));
        world.add_actor(Actor::humanlike("Far", colony).at(CellPos::new(25, 25)));

        let mut rule = RegenRule::new(ActorSignal::NearbyAllies, 2.0, 0.01);
        rule.radius = 5.0;
        rule.max_count = 3;
        assert_eq!(nearby_allies(&wearer, &world, 5.0, 10), 4);
        assert!((rule_contribution(&rule, &wearer, &world) - 0.03).abs() < 1e-9);

        rule.threshold = 5.0;
        assert_eq!(rule_contribution(&rule, &wearer, &world), 0.0);
    }

    #[test]
    fn test_light_signal() {
        let (mut world, wearer) = setup();
        world.grid.lit.insert(CellPos::new(10, 10), 0.9);
        assert!((read_signal(ActorSignal::Light, &wearer, &world) - 0.9).abs() < 1e-6);
    }
}
