use super::displace::step_toward;
use super::{EffectContext, Payload};
use crate::temporary::TemporaryKey;
use crate::types::{ActorKind, ActorRole, CastTarget, CellPos};
use crate::world::Actor;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Spatial layout of spawned entities
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SpawnPattern {
    /// Exactly the target cell
    #[default]
    Single,
    /// `count` random cells within `radius` of the target
    Scatter { radius: f32 },
    /// `length` cells starting at the target, heading away from the caster
    Line { length: u32 },
    /// `count` random cells whose distance to the target is within `inner..=outer`
    Ring { inner: f32, outer: f32 },
}

impl SpawnPattern {
    /// Candidate cells for this pattern; `valid` filters unusable cells
    pub fn cells(
        &self,
        origin: CellPos,
        heading: (i32, i32),
        count: u32,
        valid: impl Fn(CellPos) -> bool,
        rng: &mut impl Rng,
    ) -> Vec<CellPos> {
        match *self {
            SpawnPattern::Single => [origin].into_iter().filter(|c| valid(*c)).collect(),
            SpawnPattern::Line { length } => {
                let (dx, dz) = if heading == (0, 0) { (1, 0) } else { heading };
                (0..length as i32)
                    .map(|i| origin.offset(dx * i, dz * i))
                    .filter(|c| valid(*c))
                    .collect()
            }
            SpawnPattern::Scatter { radius } => pick_in_band(origin, 0.0, radius, count, valid, rng),
            SpawnPattern::Ring { inner, outer } => pick_in_band(origin, inner, outer, count, valid, rng),
        }
    }
}

fn pick_in_band(
    origin: CellPos,
    inner: f32,
    outer: f32,
    count: u32,
    valid: impl Fn(CellPos) -> bool,
    rng: &mut impl Rng,
) -> Vec<CellPos> {
    let reach = outer.max(0.0).ceil() as i32;
    let mut candidates: Vec<CellPos> = (-reach..=reach)
        .flat_map(|dx| (-reach..=reach).map(move |dz| origin.offset(dx, dz)))
        .filter(|c| {
            let d = c.distance(origin);
            d >= inner && d <= outer && valid(*c)
        })
        .collect();
    candidates.shuffle(rng);
    candidates.truncate(count as usize);
    candidates
}

fn one() -> u32 {
    1
}

/// Spawn non-actor things
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnThing {
    pub thing: String,
    #[serde(default)]
    pub pattern: SpawnPattern,
    #[serde(default = "one")]
    pub count: u32,
    /// Despawn after this many ticks
    #[serde(default)]
    pub lifetime_ticks: Option<u64>,
}

impl Payload for SpawnThing {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        let library = ctx.library;
        let Some(def) = library.thing_def(&self.thing) else {
            ctx.warn_once
                .warn(&format!("thing:{}", self.thing), format_args!("unknown thing '{}', spawn skipped", self.thing));
            return;
        };
        let Some(origin) = ctx.target_cell(target) else {
            return;
        };
        let heading = ctx.caster_cell().map_or((0, 0), |from| step_toward(from, origin));
        let faction = ctx.world.actor(ctx.caster).and_then(|a| a.faction);

        let world = &*ctx.world;
        let cells = self
            .pattern
            .cells(origin, heading, self.count, |c| world.is_passable(c), &mut *ctx.rng);
        for cell in cells {
            let id = ctx.world.spawn_thing(def, cell, faction);
            if let Some(lifetime) = self.lifetime_ticks {
                ctx.temporaries.register(TemporaryKey::Thing(id), ctx.now + lifetime);
            }
            tracing::debug!(thing = %id, def = %def.name, %cell, "spawned thing");
        }
    }
}

/// Summon actors on the caster's side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summon {
    pub creature: String,
    #[serde(default)]
    pub pattern: SpawnPattern,
    #[serde(default = "one")]
    pub count: u32,
    #[serde(default)]
    pub lifetime_ticks: Option<u64>,
}

impl Payload for Summon {
    fn apply<R: Rng>(&self, ctx: &mut EffectContext<'_, R>, target: CastTarget) {
        let library = ctx.library;
        let Some(def) = library.creature_def(&self.creature) else {
            ctx.warn_once.warn(
                &format!("creature:{}", self.creature),
                format_args!("unknown creature '{}', summon skipped", self.creature),
            );
            return;
        };
        let Some(origin) = ctx.target_cell(target) else {
            return;
        };
        let heading = ctx.caster_cell().map_or((0, 0), |from| step_toward(from, origin));
        let faction = ctx.world.actor(ctx.caster).and_then(|a| a.faction);
        let role = if faction.is_some() && faction == ctx.world.player_faction {
            ActorRole::Colonist
        } else {
            ActorRole::Outsider
        };

        let world = &*ctx.world;
        let cells = self
            .pattern
            .cells(origin, heading, self.count, |c| world.is_standable(c), &mut *ctx.rng);
        for cell in cells {
            let actor = Actor {
                name: def.name.clone(),
                kind: def.kind,
                role,
                faction,
                violence_capable: def.violence_capable,
                wears_apparel: def.kind == ActorKind::Humanlike,
                mood: 0.5,
                position: Some(cell),
                ..Default::default()
            };
            let id = ctx.world.add_actor(actor);
            if let Some(lifetime) = self.lifetime_ticks {
                ctx.temporaries.register(TemporaryKey::Actor(id), ctx.now + lifetime);
            }
            tracing::debug!(actor = %id, creature = %def.name, %cell, "summoned");
        }
    }
}
