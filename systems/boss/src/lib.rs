#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss attack cycle: idles, then pulses projectile volleys, erupts the
//! ground, teleports or calls for reinforcements.

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{
    BossTuning, CellCoord, Command, EntityId, EntityKind, EntityView, Event, Faction,
    TileCode, TileGridView, TilePoint,
};
use tracing::debug;

/// Half extent in tiles of the box in which touching the player interrupts an attack.
const CONTACT_HALF_EXTENT: f32 = 0.5;

/// Observable attack phase of a boss.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BossPhase {
    /// Counting towards the next attack.
    #[default]
    Idle,
    /// Firing timed projectile volleys.
    Pulse,
    /// Marking, igniting and clearing a patch of hazardous ground.
    Erupt,
    /// Waiting to jump to a random empty cell.
    Teleport,
    /// Waiting for a requested minion.
    Summon,
}

/// Pure system driving every boss on the current level.
#[derive(Debug)]
pub struct BossAi {
    tuning: BossTuning,
    rng: ChaCha8Rng,
    brains: BTreeMap<EntityId, BossBrain>,
}

impl BossAi {
    /// Creates the system with the provided tuning and random seed.
    #[must_use]
    pub fn new(tuning: BossTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            brains: BTreeMap::new(),
        }
    }

    /// Current phase of the provided boss.
    #[must_use]
    pub fn phase(&self, boss: EntityId) -> Option<BossPhase> {
        self.brains.get(&boss).map(|brain| brain.phase)
    }

    /// Consumes world events and immutable views to emit boss commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        grid: &TileGridView<'_>,
        out: &mut Vec<Command>,
    ) {
        let Some(dt) = elapsed(events) else {
            return;
        };

        let vanished: Vec<EntityId> = self
            .brains
            .keys()
            .filter(|id| entities.get(**id).is_none())
            .copied()
            .collect();
        for id in vanished {
            if let Some(brain) = self.brains.remove(&id) {
                clear_leftovers(&brain.eruption, grid, out);
            }
        }

        let settings = grid.settings();
        let summon_done = events
            .iter()
            .any(|event| matches!(event, Event::SummonCompleted { .. }));
        let player = entities
            .player()
            .map(|snapshot| snapshot.position.point(&settings));
        let Self {
            tuning,
            rng,
            brains,
        } = self;

        for snapshot in entities.of_kind(EntityKind::Boss) {
            let brain = brains.entry(snapshot.id).or_default();
            let senses = BossSenses {
                boss: snapshot.id,
                me: snapshot.position.tile(),
                here: snapshot.position.point(&settings),
                hp: snapshot.hp,
                player,
                dt: dt.as_secs_f32(),
                summon_done,
                grid,
            };
            let before = brain.phase;
            brain.think(&senses, tuning, rng, out);
            if before != brain.phase {
                debug!(boss = ?snapshot.id, ?before, after = ?brain.phase, "boss_phase_changed");
            }
        }
    }
}

impl Default for BossAi {
    fn default() -> Self {
        Self::new(BossTuning::default(), 0)
    }
}

struct BossSenses<'a, 'g> {
    boss: EntityId,
    me: CellCoord,
    here: TilePoint,
    hp: i32,
    player: Option<TilePoint>,
    dt: f32,
    summon_done: bool,
    grid: &'a TileGridView<'g>,
}

#[derive(Clone, Debug, Default)]
struct BossBrain {
    phase: BossPhase,
    counter: u32,
    timer: f32,
    volleys: u32,
    eruption: Vec<CellCoord>,
    marked: bool,
    requested: bool,
}

impl BossBrain {
    fn think<R: Rng>(
        &mut self,
        senses: &BossSenses<'_, '_>,
        tuning: &BossTuning,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        match self.phase {
            BossPhase::Idle => self.idle(senses, tuning, rng),
            BossPhase::Pulse => self.pulse(senses, tuning, rng, out),
            BossPhase::Erupt => self.erupt(senses, tuning, rng, out),
            BossPhase::Teleport => self.teleport(senses, tuning, rng, out),
            BossPhase::Summon => self.summon(senses, out),
        }

        let touching = senses
            .player
            .map_or(false, |player| player.within_box(senses.here, CONTACT_HALF_EXTENT));
        if touching {
            for cell in self.eruption.drain(..) {
                out.push(Command::SetTile {
                    cell,
                    code: TileCode::EMPTY,
                });
            }
            self.phase = BossPhase::Idle;
            self.counter = 0;
        }
    }

    fn enter(&mut self, phase: BossPhase) {
        self.phase = phase;
        self.timer = 0.0;
        self.volleys = 0;
        self.marked = false;
        self.requested = false;
    }

    fn idle<R: Rng>(&mut self, senses: &BossSenses<'_, '_>, tuning: &BossTuning, rng: &mut R) {
        if self.counter > tuning.idle_limit {
            self.counter = 0;
            let choices = if senses.hp <= tuning.critical_hp { 4 } else { 3 };
            let next = match rng.gen_range(0..choices) {
                0 => BossPhase::Pulse,
                1 => BossPhase::Erupt,
                2 => BossPhase::Teleport,
                _ => BossPhase::Summon,
            };
            self.enter(next);
        }
        self.counter += 1;
    }

    fn pulse<R: Rng>(
        &mut self,
        senses: &BossSenses<'_, '_>,
        tuning: &BossTuning,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        self.timer += senses.dt;
        if self.timer >= tuning.pulse_interval {
            self.timer = 0.0;
            self.volleys += 1;

            // 0: plus, 1: cross, 2: both
            let pattern = rng.gen_range(0..3);
            let mut targets = Vec::with_capacity(8);
            if pattern != 1 {
                targets.extend(plus_targets(senses.me));
            }
            if pattern != 0 {
                targets.extend(corner_targets(senses.grid));
            }
            for target in targets {
                out.push(Command::LaunchProjectile {
                    origin: senses.me,
                    target,
                    owner: Faction::Boss,
                    damage: tuning.projectile_damage,
                });
            }
        }
        if self.volleys >= tuning.pulse_volleys {
            self.phase = BossPhase::Idle;
        }
    }

    fn erupt<R: Rng>(
        &mut self,
        senses: &BossSenses<'_, '_>,
        tuning: &BossTuning,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        if !self.marked {
            self.marked = true;
            let (columns, rows) = (senses.grid.columns(), senses.grid.rows());
            if columns < 5 || rows < 5 {
                self.phase = BossPhase::Idle;
                return;
            }
            let center = CellCoord::new(rng.gen_range(2..columns - 2), rng.gen_range(2..rows - 2));
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let cell = center.offset(dx, dy);
                    if senses.grid.get(cell) == Some(TileCode::EMPTY) {
                        out.push(Command::SetTile {
                            cell,
                            code: TileCode::ERUPT_WARNING,
                        });
                        self.eruption.push(cell);
                    }
                }
            }
            return;
        }

        let before = self.timer;
        self.timer += senses.dt;
        if self.timer >= tuning.erupt_end {
            for cell in self.eruption.drain(..) {
                out.push(Command::SetTile {
                    cell,
                    code: TileCode::EMPTY,
                });
            }
            self.phase = BossPhase::Idle;
        } else if before < tuning.erupt_warning && self.timer >= tuning.erupt_warning {
            for cell in &self.eruption {
                out.push(Command::SetTile {
                    cell: *cell,
                    code: TileCode::ERUPT_ACTIVE,
                });
            }
        }
    }

    fn teleport<R: Rng>(
        &mut self,
        senses: &BossSenses<'_, '_>,
        tuning: &BossTuning,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) {
        self.timer += senses.dt;
        if self.timer < tuning.teleport_delay {
            return;
        }
        let (columns, rows) = (senses.grid.columns(), senses.grid.rows());
        if columns <= 0 || rows <= 0 {
            self.phase = BossPhase::Idle;
            return;
        }
        // Occupied picks retry on the next tick.
        let cell = CellCoord::new(rng.gen_range(0..columns), rng.gen_range(0..rows));
        if senses.grid.get(cell) == Some(TileCode::EMPTY) {
            out.push(Command::Teleport {
                entity: senses.boss,
                cell,
            });
            self.phase = BossPhase::Idle;
        }
    }

    fn summon(&mut self, senses: &BossSenses<'_, '_>, out: &mut Vec<Command>) {
        if !self.requested {
            self.requested = true;
            out.push(Command::RequestSummon { boss: senses.boss });
        } else if senses.summon_done {
            self.phase = BossPhase::Idle;
        }
    }
}

fn plus_targets(me: CellCoord) -> [CellCoord; 4] {
    [
        me.offset(1, 0),
        me.offset(-1, 0),
        me.offset(0, 1),
        me.offset(0, -1),
    ]
}

fn corner_targets(grid: &TileGridView<'_>) -> [CellCoord; 4] {
    let (right, top) = (grid.columns() - 1, grid.rows() - 1);
    [
        CellCoord::new(0, 0),
        CellCoord::new(right, 0),
        CellCoord::new(right, top),
        CellCoord::new(0, top),
    ]
}

/// Clears eruption tiles a vanished boss left behind on the current level.
fn clear_leftovers(eruption: &[CellCoord], grid: &TileGridView<'_>, out: &mut Vec<Command>) {
    for cell in eruption {
        if matches!(
            grid.get(*cell),
            Some(TileCode::ERUPT_WARNING | TileCode::ERUPT_ACTIVE)
        ) {
            out.push(Command::SetTile {
                cell: *cell,
                code: TileCode::EMPTY,
            });
        }
    }
}

fn elapsed(events: &[Event]) -> Option<Duration> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .reduce(Duration::saturating_add)
}
