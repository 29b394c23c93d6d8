//! End-to-end checks of the charge gate, cooldown, regen and displacement behavior

use gear_core::ability::effect::apply_payload;
use gear_core::ability::{
    self, AbilityDefinition, AbilityEffect, CastDenied, CastLimit, ChargeCost, Displace, DisplaceDirection,
    EffectContext, Heal,
};
use gear_core::gear::{ActorSignal, GearDefinition, GearInstance, RegenRule};
use gear_core::types::{AbilityId, CastTarget, CellPos, GearInstanceId, ItemId};
use gear_core::{ActorId, ContentLibrary, TemporaryRegistry, Tunables, WarnOnce, World};
use gear_core::world::Actor;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn one_wearer() -> (World, ActorId) {
    let mut world = World::new(20, 20);
    let colony = world.add_faction("colony");
    world.player_faction = Some(colony);
    let wearer = world.add_actor(Actor::humanlike("Minako", Some(colony)).at(CellPos::new(5, 5)));
    (world, wearer)
}

fn brooch(wearer: ActorId) -> (GearDefinition, GearInstance) {
    let def = GearDefinition::new("brooch", "brooch");
    let gear = GearInstance::new(GearInstanceId(1), &def, ItemId(1), wearer);
    (def, gear)
}

#[test]
fn test_cost_gate_denies_without_mutation() {
    let (world, wearer) = one_wearer();
    let (_, mut gear) = brooch(wearer);
    gear.set_charge(4.0);

    let mut spell = AbilityDefinition::new("heal").with_effect(AbilityEffect::Cost(ChargeCost {
        cost: 0.05,
        required: None,
    }));
    spell.id = AbilityId(1);

    let denied = ability::check_cast(&gear, &spell, &world, CastTarget::Actor(wearer), 0, &Tunables::default());
    assert!(matches!(denied, Err(CastDenied::InsufficientCharge { .. })));
    assert!((gear.charge() - 4.0).abs() < 1e-12);
}

#[test]
fn test_cooldown_window() {
    let (mut world, wearer) = one_wearer();
    let (_, mut gear) = brooch(wearer);
    let tunables = Tunables::default();
    let library = ContentLibrary::default();
    let mut temporaries = TemporaryRegistry::new();
    let mut warn_once = WarnOnce::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut spell = AbilityDefinition::new("pulse")
        .with_effect(AbilityEffect::Limit(CastLimit {
            cooldown_ticks: 60,
            max_per_day: 0,
        }))
        .with_effect(AbilityEffect::Heal(Heal {
            amount: 1.0,
            radius: None,
            include_hostile: false,
        }));
    spell.id = AbilityId(1);
    let target = CastTarget::Actor(wearer);

    let mut ctx = EffectContext {
        world: &mut world,
        temporaries: &mut temporaries,
        library: &library,
        warn_once: &mut warn_once,
        rng: &mut rng,
        caster: wearer,
        now: 1000,
    };
    ability::cast(&mut gear, &spell, target, &mut ctx, &tunables).unwrap();

    let denied = ability::check_cast(&gear, &spell, &world, target, 1059, &tunables);
    assert!(matches!(denied, Err(CastDenied::Cooldown { .. })));
    assert!(ability::check_cast(&gear, &spell, &world, target, 1060, &tunables).is_ok());
}

#[test]
fn test_regen_composition_over_one_day() {
    let (mut world, wearer) = one_wearer();
    world.actor_mut(wearer).unwrap().mood = 1.0;
    let (mut def, _) = brooch(wearer);
    def.passive_regen = 0.1;
    def.regen_rules.push(RegenRule::new(ActorSignal::Mood, 0.5, 0.05).scaled());
    let mut gear = GearInstance::new(GearInstanceId(1), &def, ItemId(1), wearer);
    gear.set_charge(50.0);

    let tunables = Tunables::default();
    for _ in 0..tunables.ticks_per_day {
        gear.tick(&def, &world, &tunables);
    }
    assert!((gear.charge() - 65.0).abs() < 1e-6, "charge = {}", gear.charge());
}

#[test]
fn test_scaled_mood_rule_over_one_day() {
    let (mut world, wearer) = one_wearer();
    world.actor_mut(wearer).unwrap().mood = 0.9;
    let (mut def, _) = brooch(wearer);
    def.passive_regen = 0.1;
    def.regen_rules.push(RegenRule::new(ActorSignal::Mood, 0.8, 0.1).scaled());
    let mut gear = GearInstance::new(GearInstanceId(1), &def, ItemId(1), wearer);
    gear.set_charge(50.0);

    let tunables = Tunables::default();
    for _ in 0..tunables.ticks_per_day {
        gear.tick(&def, &world, &tunables);
    }
    // mood is an f32 signal, so 0.9 is not exact
    assert!((gear.charge() - 65.0).abs() < 1e-5, "charge = {}", gear.charge());
}

#[test]
fn test_displacement_stops_at_obstacle() {
    let (mut world, caster) = one_wearer();
    let victim = world.add_actor(Actor::humanlike("Raider", None).at(CellPos::new(6, 5)));
    world.grid.block(CellPos::new(9, 5));

    let library = ContentLibrary::default();
    let mut temporaries = TemporaryRegistry::new();
    let mut warn_once = WarnOnce::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ctx = EffectContext {
        world: &mut world,
        temporaries: &mut temporaries,
        library: &library,
        warn_once: &mut warn_once,
        rng: &mut rng,
        caster,
        now: 0,
    };
    let push = AbilityEffect::Displace(Displace {
        distance: 5,
        direction: DisplaceDirection::Away,
    });
    apply_payload(&push, &mut ctx, CastTarget::Actor(victim));

    assert_eq!(world.actor(victim).unwrap().position, Some(CellPos::new(8, 5)));
}
