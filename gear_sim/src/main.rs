//! Gear Sim - a headless scripted colony demonstrating gear_core
//!
//! The script:
//! - Colonists join and the best candidate receives the moon brooch
//! - A raid arrives; drafting the wearer triggers the transformation
//! - The wearer stuns and heals, a berserk raider picks up the veil pendant
//! - The raid ends, the costume comes off and the state is saved
//!
//! Usage: `gear_sim [content.toml] [ticks]`

use gear_core::types::{ActorRole, CastTarget, CellPos, FactionId};
use gear_core::world::{Actor, CharacterTrait, Injury, MentalState};
use gear_core::{default_content, load_content, ActorId, ContentLibrary, GearInstanceId, Runtime, RuntimeError, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use std::sync::Arc;

const DEFAULT_TICKS: u64 = 6000;
const RAID_AT: u64 = 500;
const BERSERK_AT: u64 = 900;
const RAID_ENDS_AT: u64 = 3000;

struct Cast {
    colony: Vec<ActorId>,
    raiders: Vec<ActorId>,
}

fn colonist(name: &str, faction: FactionId, pos: CellPos, age: f32, mood: f32, kind: bool) -> Actor {
    let mut actor = Actor::humanlike(name, Some(faction)).at(pos);
    actor.age = age;
    actor.mood = mood;
    if kind {
        actor.traits.push(CharacterTrait {
            name: "kind".into(),
            degree: 0,
        });
    }
    actor
}

fn build_world() -> (World, Cast) {
    let mut world = World::new(40, 40);
    let colony = world.add_faction("colony");
    let pirates = world.add_faction("pirates");
    world.set_hostile(colony, pirates);
    world.player_faction = Some(colony);

    let colonists = [
        colonist("Usagi", colony, CellPos::new(10, 10), 16.0, 0.9, true),
        colonist("Ami", colony, CellPos::new(11, 10), 16.0, 0.6, true),
        colonist("Haruka", colony, CellPos::new(12, 11), 18.0, 0.4, false),
        colonist("Setsuna", colony, CellPos::new(9, 12), 42.0, 0.7, true),
    ];
    let colony_ids = colonists.into_iter().map(|a| world.add_actor(a)).collect();

    let mut raiders = Vec::new();
    for (i, melee) in [8u32, 14].into_iter().enumerate() {
        let mut raider = Actor::humanlike(format!("Raider {}", i + 1), Some(pirates));
        raider.role = ActorRole::Outsider;
        raider.skills.insert("melee".into(), melee);
        raiders.push(world.add_actor(raider));
    }

    (
        world,
        Cast {
            colony: colony_ids,
            raiders,
        },
    )
}

fn load_library(path: Option<&String>) -> Result<ContentLibrary, gear_core::ConfigError> {
    match path {
        Some(path) => load_content(Path::new(path)),
        None => default_content(),
    }
}

fn report(rt: &Runtime<ChaCha8Rng>) {
    for gear in rt.gear().iter() {
        let def = rt.library().gear(gear.def).map_or("?", |d| d.name.as_str());
        let wearer = rt.world().actor(gear.wearer).map_or("?", |a| a.name.as_str());
        tracing::info!(
            gear = %gear.id,
            def,
            wearer,
            charge = %format!("{:.1}/{:.0}", gear.charge(), gear.max_charge()),
            transformed = gear.transform.applied,
            stealth = gear.stealth_engaged,
            "gear status"
        );
    }
}

fn set_drafted(rt: &mut Runtime<ChaCha8Rng>, actor: Option<ActorId>, drafted: bool) {
    let Some(id) = actor else {
        return;
    };
    if let Some(actor) = rt.world_mut().actor_mut(id) {
        actor.drafted = drafted;
    }
}

fn try_cast(rt: &mut Runtime<ChaCha8Rng>, gear: GearInstanceId, ability: &str, target: CastTarget) {
    let Some(id) = rt.library().ability_id(ability) else {
        tracing::warn!(ability, "ability not in content");
        return;
    };
    match rt.cast(gear, id, target) {
        Ok(()) => tracing::info!(%gear, ability, ?target, "cast"),
        Err(RuntimeError::Denied(reason)) => tracing::info!(%gear, ability, %reason, "cast denied"),
        Err(err) => tracing::warn!(%gear, ability, %err, "cast failed"),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let library = load_library(args.get(1))?;
    let ticks = args.get(2).and_then(|t| t.parse().ok()).unwrap_or(DEFAULT_TICKS);
    tracing::info!(
        gear = library.gears().count(),
        abilities = library.abilities().count(),
        selections = library.selections().len(),
        warnings = library.warnings().len(),
        "content loaded"
    );

    let (world, cast) = build_world();
    let mut rt = Runtime::new(world, Arc::new(library), ChaCha8Rng::seed_from_u64(42));

    let mut brooch = None;
    for &id in &cast.colony {
        if let Some(&gear) = rt.on_actor_joined(id).first() {
            brooch = brooch.or(Some(gear));
        }
    }
    let wearer = brooch.and_then(|g| rt.gear_instance(g).ok()).map(|g| g.wearer);
    let mut veil = None;

    for _ in 0..ticks {
        for gear in rt.tick() {
            tracing::info!(%gear, tick = rt.now(), "assigned by periodic check");
            brooch = brooch.or(Some(gear));
        }
        let now = rt.now();

        if now == RAID_AT {
            tracing::info!(tick = now, "raid arrives");
            for (i, &raider) in cast.raiders.iter().enumerate() {
                if let Some(actor) = rt.world_mut().actor_mut(raider) {
                    actor.position = Some(CellPos::new(20 + i as i32, 10));
                }
                rt.on_actor_spawned(raider);
            }
            set_drafted(&mut rt, wearer, true);
        }

        if let (Some(gear), Some(caster)) = (brooch, wearer) {
            if now == RAID_AT + 60 {
                try_cast(&mut rt, gear, "lunar_stun", CastTarget::Actor(cast.raiders[0]));
                try_cast(&mut rt, gear, "crescent_barrier", CastTarget::Cell(CellPos::new(15, 10)));
            }
            if now == RAID_AT + 120 {
                for &id in &cast.colony {
                    if let Some(actor) = rt.world_mut().actor_mut(id) {
                        actor.injuries.push(Injury {
                            label: "gunshot".into(),
                            severity: 4.0,
                        });
                    }
                }
                try_cast(&mut rt, gear, "moon_healing", CastTarget::Actor(caster));
                // still on cooldown
                try_cast(&mut rt, gear, "moon_healing", CastTarget::Actor(caster));
                try_cast(&mut rt, gear, "star_familiars", CastTarget::Cell(CellPos::new(14, 12)));
            }
        }

        if now == BERSERK_AT {
            let raider = cast.raiders[1];
            if let Some(actor) = rt.world_mut().actor_mut(raider) {
                actor.mental_state = Some(MentalState {
                    name: "berserk".into(),
                    aggressive: true,
                });
            }
            veil = rt.on_mental_state_started(raider, "berserk").first().copied();
            if let Some(gear) = veil {
                if let Err(err) = rt.engage_stealth(gear) {
                    tracing::info!(%gear, %err, "stealth refused");
                }
            }
        }
        if now > BERSERK_AT && now % 400 == 0 && now < RAID_ENDS_AT {
            let evaded = rt.try_evade_hit(cast.raiders[1]);
            tracing::info!(tick = now, evaded, "raider takes a hit");
        }

        if now == RAID_ENDS_AT {
            tracing::info!(tick = now, "raid over");
            for &raider in &cast.raiders {
                if let Some(actor) = rt.world_mut().actor_mut(raider) {
                    actor.dead = true;
                }
            }
            set_drafted(&mut rt, wearer, false);
            if let Some(gear) = veil.take() {
                if let Some(item) = rt.unequip(gear)? {
                    tracing::info!(item = %item.id, def = %item.def, "veil pendant recovered");
                }
            }
        }

        if now % 1000 == 0 {
            report(&rt);
        }
    }

    let save = rt.save()?;
    tracing::info!(
        gear = save.gear.len(),
        temporaries = save.temporaries.len(),
        bytes = save.to_json()?.len(),
        "state saved"
    );
    Ok(())
}
