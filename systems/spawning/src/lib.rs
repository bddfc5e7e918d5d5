#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for ambient waves, spawner
//! structures and boss reinforcements.

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{
    CellCoord, Command, EnemyKind, EntityId, EntityKind, EntityView, Event, LevelId,
    SceneTuning, TileCode, TileGridView,
};
use tracing::{debug, info};

/// Ambient roster; daytime rolls only draw from the first two entries.
const AMBIENT_KINDS: [EnemyKind; 4] = [
    EnemyKind::Unicorn,
    EnemyKind::Cow,
    EnemyKind::Chaser,
    EnemyKind::AxisLock,
];
const HOSTILE_KINDS: [EnemyKind; 2] = [EnemyKind::Chaser, EnemyKind::AxisLock];
const NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const PLACEMENT_ATTEMPTS: usize = 64;
const SPAWNER_BASE_TICKS: u32 = 300;
const SPAWNER_JITTER_TICKS: u32 = 200;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    tuning: SceneTuning,
    boss_level: LevelId,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from the scene tuning, the level that
    /// suppresses ambient waves and the random seed.
    #[must_use]
    pub const fn new(tuning: SceneTuning, boss_level: LevelId, rng_seed: u64) -> Self {
        Self {
            tuning,
            boss_level,
            rng_seed,
        }
    }
}

/// Read-only world state the spawning system inspects each frame.
#[derive(Clone, Copy, Debug)]
pub struct SpawnFrame<'a> {
    /// Level currently entered, if any.
    pub level: Option<LevelId>,
    /// Whether the in-game clock shows night.
    pub night: bool,
    /// Active entities, used to drive spawner structures.
    pub entities: &'a EntityView,
    /// Tiles of the current level.
    pub grid: TileGridView<'a>,
    /// Boss waiting for reinforcements, if any.
    pub summon_request: Option<EntityId>,
    /// Minions placed for the boss so far.
    pub summoned: u32,
    /// Kills counted so far.
    pub kills: u32,
}

/// Observable state of a spawner structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpawnerPhase {
    /// Counting towards the next spawn.
    #[default]
    Idle,
    /// Holding after a spawn.
    Spawn,
}

#[derive(Clone, Copy, Debug, Default)]
struct SpawnerState {
    phase: SpawnerPhase,
    counter: u32,
    threshold: Option<u32>,
}

/// Pure system that deterministically emits spawn commands.
#[derive(Debug)]
pub struct Spawning {
    tuning: SceneTuning,
    boss_level: LevelId,
    spawn_interval: Duration,
    growth_interval: Duration,
    accumulator: Duration,
    growth: Duration,
    multiplier: u32,
    rng: ChaCha8Rng,
    spawners: BTreeMap<EntityId, SpawnerState>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let seconds = |value: f32| Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO);
        Self {
            tuning: config.tuning,
            boss_level: config.boss_level,
            spawn_interval: seconds(config.tuning.spawn_interval),
            growth_interval: seconds(config.tuning.spawner_growth_interval),
            accumulator: Duration::ZERO,
            growth: Duration::ZERO,
            multiplier: 0,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            spawners: BTreeMap::new(),
        }
    }

    /// Ticks subtracted from every freshly rolled spawner threshold.
    #[must_use]
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Current phase of the provided spawner.
    #[must_use]
    pub fn spawner_phase(&self, spawner: EntityId) -> Option<SpawnerPhase> {
        self.spawners.get(&spawner).map(|state| state.phase)
    }

    /// Consumes events and immutable views to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], frame: SpawnFrame<'_>, out: &mut Vec<Command>) {
        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }
        if accumulated.is_zero() {
            return;
        }

        self.grow(accumulated);
        self.ambient(accumulated, &frame, out);
        self.run_spawners(&frame, out);
        self.fulfil_summon(&frame, out);
    }

    fn grow(&mut self, dt: Duration) {
        if self.growth_interval.is_zero() {
            return;
        }
        self.growth = self.growth.saturating_add(dt);
        while self.growth >= self.growth_interval {
            self.growth -= self.growth_interval;
            let grown = self
                .multiplier
                .saturating_add(self.tuning.spawner_growth_step)
                .min(self.tuning.spawner_growth_cap);
            if grown != self.multiplier {
                self.multiplier = grown;
                debug!(multiplier = grown, "spawner_multiplier_grown");
            }
        }
    }

    fn ambient(&mut self, dt: Duration, frame: &SpawnFrame<'_>, out: &mut Vec<Command>) {
        let Some(level) = frame.level.filter(|level| *level != self.boss_level) else {
            self.accumulator = Duration::ZERO;
            return;
        };
        if self.spawn_interval.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut waves = 0;
        while self.accumulator >= self.spawn_interval {
            self.accumulator -= self.spawn_interval;
            waves += 1;
        }

        let roster = if frame.night {
            &AMBIENT_KINDS[..]
        } else {
            &AMBIENT_KINDS[..2]
        };
        for _ in 0..waves {
            for _ in 0..self.tuning.spawns_per_wave {
                let Some(cell) = random_empty_cell(&mut self.rng, &frame.grid) else {
                    debug!(level = level.get(), "ambient_spawn_skipped");
                    continue;
                };
                let kind = roster[self.rng.gen_range(0..roster.len())];
                out.push(Command::SpawnEnemy { kind, cell });
            }
        }
    }

    fn run_spawners(&mut self, frame: &SpawnFrame<'_>, out: &mut Vec<Command>) {
        self.spawners
            .retain(|id, _| frame.entities.get(*id).is_some());

        let Self {
            tuning,
            multiplier,
            rng,
            spawners,
            ..
        } = self;

        for snapshot in frame.entities.of_kind(EntityKind::Spawner) {
            let state = spawners.entry(snapshot.id).or_default();
            match state.phase {
                SpawnerPhase::Idle => {
                    let threshold = *state.threshold.get_or_insert_with(|| {
                        (rng.gen_range(0..SPAWNER_JITTER_TICKS) + SPAWNER_BASE_TICKS)
                            .saturating_sub(*multiplier)
                    });
                    if state.counter > threshold {
                        state.phase = SpawnerPhase::Spawn;
                        state.counter = 0;
                        let home = snapshot.position.tile();
                        let kind = HOSTILE_KINDS[rng.gen_range(0..HOSTILE_KINDS.len())];
                        let start = rng.gen_range(0..NEIGHBOURS.len());
                        let free = (0..NEIGHBOURS.len())
                            .map(|step| NEIGHBOURS[(start + step) % NEIGHBOURS.len()])
                            .map(|(dx, dy)| home.offset(dx, dy))
                            .find(|cell| frame.grid.get(*cell) == Some(TileCode::EMPTY));
                        match free {
                            Some(cell) => out.push(Command::SpawnEnemy { kind, cell }),
                            None => debug!(spawner = ?snapshot.id, "spawner_surrounded"),
                        }
                    }
                    state.counter += 1;
                }
                SpawnerPhase::Spawn => {
                    if state.counter > tuning.spawner_hold_ticks {
                        state.phase = SpawnerPhase::Idle;
                        state.counter = 0;
                        state.threshold = None;
                    }
                    state.counter += 1;
                }
            }
        }
    }

    fn fulfil_summon(&mut self, frame: &SpawnFrame<'_>, out: &mut Vec<Command>) {
        let Some(boss) = frame.summon_request else {
            return;
        };
        let mut placed = false;
        if frame.summoned <= frame.kills {
            if let Some(cell) = random_empty_cell(&mut self.rng, &frame.grid) {
                let kind = HOSTILE_KINDS[self.rng.gen_range(0..HOSTILE_KINDS.len())];
                out.push(Command::SpawnEnemy { kind, cell });
                placed = true;
            }
        }
        info!(?boss, placed, "summon_fulfilled");
        out.push(Command::CompleteSummon { placed });
    }
}

/// Draws random cells until an empty one turns up, giving up after a bounded
/// number of attempts.
fn random_empty_cell<R: Rng>(rng: &mut R, grid: &TileGridView<'_>) -> Option<CellCoord> {
    if grid.columns() <= 0 || grid.rows() <= 0 {
        return None;
    }
    (0..PLACEMENT_ATTEMPTS)
        .map(|_| {
            CellCoord::new(
                rng.gen_range(0..grid.columns()),
                rng.gen_range(0..grid.rows()),
            )
        })
        .find(|cell| grid.get(*cell) == Some(TileCode::EMPTY))
}
