//! Per-entity state machines deciding enemy and ally intents.

use rand::Rng;
use scrapfield_core::{
    AxisIntent, CellCoord, EnemyKind, EnemyTuning, EntityKind, TileGridView, TilePoint,
};
use scrapfield_world::navigation::{find_path, shortcut_destination, PathQuery};

/// Distance in tiles beyond which an ally starts following the player.
const FOLLOW_DISTANCE: f32 = 2.0;

/// Observable state of a brain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BrainMode {
    /// Waiting for the player to come close.
    Idle,
    /// Chasing the player along the shortcut destination.
    Hunt,
    /// Lining up with the player's column.
    TargetX,
    /// Lining up with the player's row.
    TargetY,
    /// Ambling in random directions.
    Wander,
    /// Following the player.
    Follow,
}

/// What a brain perceives during one tick.
pub(crate) struct Senses<'a, 'g> {
    pub(crate) me: CellCoord,
    pub(crate) here: TilePoint,
    pub(crate) player: Option<(CellCoord, TilePoint)>,
    pub(crate) dt: f32,
    pub(crate) grid: &'a TileGridView<'g>,
}

impl Senses<'_, '_> {
    /// Player cell when the player stands within the Chebyshev radius.
    fn spotted(&self, radius: f32) -> Option<CellCoord> {
        self.player
            .filter(|(_, point)| chebyshev(self.here, *point) <= radius)
            .map(|(cell, _)| cell)
    }
}

/// Outcome of one tick of thinking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) intent: Option<AxisIntent>,
    pub(crate) fire_at: Option<CellCoord>,
}

impl Decision {
    fn moving(intent: Option<AxisIntent>) -> Self {
        Self {
            intent: intent.filter(|intent| !intent.is_none()),
            fire_at: None,
        }
    }
}

/// State machine attached to one entity.
#[derive(Clone, Debug)]
pub(crate) enum Brain {
    Chaser(Chaser),
    AxisLock(AxisLock),
    Wanderer(Wanderer),
    Ally(Ally),
}

impl Brain {
    /// Brain driving the provided entity kind, if it has one.
    pub(crate) fn for_kind(kind: EntityKind) -> Option<Self> {
        match kind {
            EntityKind::Enemy(EnemyKind::Chaser) => Some(Self::Chaser(Chaser::default())),
            EntityKind::Enemy(EnemyKind::AxisLock) => Some(Self::AxisLock(AxisLock::default())),
            EntityKind::Enemy(EnemyKind::Cow | EnemyKind::Unicorn) => {
                Some(Self::Wanderer(Wanderer::default()))
            }
            EntityKind::Ally => Some(Self::Ally(Ally::default())),
            _ => None,
        }
    }

    pub(crate) fn mode(&self) -> BrainMode {
        match self {
            Self::Chaser(chaser) => chaser.mode,
            Self::AxisLock(axis_lock) => axis_lock.mode,
            Self::Wanderer(_) => BrainMode::Wander,
            Self::Ally(ally) => {
                if ally.route.destination.is_some() {
                    BrainMode::Follow
                } else {
                    BrainMode::Idle
                }
            }
        }
    }

    pub(crate) fn think<R: Rng>(
        &mut self,
        senses: &Senses<'_, '_>,
        tuning: &EnemyTuning,
        rng: &mut R,
    ) -> Decision {
        match self {
            Self::Chaser(chaser) => chaser.think(senses, tuning),
            Self::AxisLock(axis_lock) => axis_lock.think(senses, tuning, rng),
            Self::Wanderer(wanderer) => wanderer.think(senses, tuning, rng),
            Self::Ally(ally) => ally.think(senses),
        }
    }
}

/// Last shortcut destination computed toward a goal.
#[derive(Clone, Copy, Debug, Default)]
struct Route {
    destination: Option<CellCoord>,
}

impl Route {
    /// Replans toward the goal; an empty path keeps the previous destination.
    fn replan(&mut self, senses: &Senses<'_, '_>, goal: CellCoord) {
        let path = find_path(senses.grid, senses.me, goal, PathQuery::HUNTER);
        if let Some((destination, _)) = shortcut_destination(senses.me, &path) {
            self.destination = Some(destination);
        }
    }

    fn intent(&self, me: CellCoord) -> Option<AxisIntent> {
        self.destination
            .map(|destination| AxisIntent::toward(me, destination))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Chaser {
    mode: BrainMode,
    counter: u32,
    route: Route,
}

impl Default for Chaser {
    fn default() -> Self {
        Self {
            mode: BrainMode::Idle,
            counter: 0,
            route: Route::default(),
        }
    }
}

impl Chaser {
    fn think(&mut self, senses: &Senses<'_, '_>, tuning: &EnemyTuning) -> Decision {
        let spotted = senses.spotted(tuning.chase_radius);
        if spotted.is_some() {
            self.mode = BrainMode::Hunt;
            self.counter = 0;
        } else {
            self.counter = self.counter.saturating_add(1);
            if self.mode == BrainMode::Idle && self.counter > tuning.idle_limit {
                self.counter = 0;
            }
        }
        if self.mode != BrainMode::Hunt {
            return Decision::default();
        }

        let Some((player, _)) = senses.player else {
            return Decision::default();
        };
        self.route.replan(senses, player);
        Decision::moving(self.route.intent(senses.me))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct AxisLock {
    mode: BrainMode,
    counter: u32,
    locked: bool,
    fire_timer: f32,
    route: Route,
}

impl Default for AxisLock {
    fn default() -> Self {
        Self {
            mode: BrainMode::Idle,
            counter: 0,
            locked: false,
            fire_timer: 0.0,
            route: Route::default(),
        }
    }
}

impl AxisLock {
    fn think<R: Rng>(
        &mut self,
        senses: &Senses<'_, '_>,
        tuning: &EnemyTuning,
        rng: &mut R,
    ) -> Decision {
        let spotted = senses.spotted(tuning.chase_radius);
        match (self.mode, spotted) {
            (BrainMode::Idle, Some(_)) => {
                self.mode = if rng.gen_range(0..2) == 0 {
                    BrainMode::TargetX
                } else {
                    BrainMode::TargetY
                };
                self.counter = 0;
                self.locked = false;
                self.fire_timer = 0.0;
            }
            (BrainMode::Idle, None) => {
                self.counter = self.counter.saturating_add(1);
                if self.counter > tuning.idle_limit {
                    self.counter = 0;
                }
                return Decision::default();
            }
            (_, Some(_)) => self.counter = 0,
            (_, None) => {
                self.counter = self.counter.saturating_add(1);
                if self.counter > tuning.idle_limit {
                    *self = Self::default();
                    return Decision::default();
                }
            }
        }

        let Some((player, _)) = senses.player else {
            return Decision::default();
        };
        let me = senses.me;
        let (goal, locked, restrict): (CellCoord, bool, fn(AxisIntent) -> AxisIntent) =
            if self.mode == BrainMode::TargetX {
                (
                    CellCoord::new(player.column(), me.row()),
                    me.column() == player.column(),
                    AxisIntent::horizontal,
                )
            } else {
                (
                    CellCoord::new(me.column(), player.row()),
                    me.row() == player.row(),
                    AxisIntent::vertical,
                )
            };
        self.locked = locked;

        if self.locked {
            self.fire_timer += senses.dt;
            if self.fire_timer >= tuning.fire_interval {
                self.fire_timer = 0.0;
                return Decision {
                    intent: None,
                    fire_at: Some(player),
                };
            }
            return Decision::default();
        }

        self.fire_timer = 0.0;
        self.route.replan(senses, goal);
        Decision::moving(self.route.intent(me).map(restrict))
    }
}

/// Takes one step in a random direction each time the walk timer expires.
#[derive(Clone, Debug, Default)]
pub(crate) struct Wanderer {
    timer: f32,
}

impl Wanderer {
    fn think<R: Rng>(
        &mut self,
        senses: &Senses<'_, '_>,
        tuning: &EnemyTuning,
        rng: &mut R,
    ) -> Decision {
        self.timer += senses.dt;
        if self.timer <= tuning.walk_interval {
            return Decision::default();
        }
        self.timer = 0.0;
        Decision::moving(Some(heading_for(rng.gen_range(0..4))))
    }
}

/// Maps a wander roll onto a unit heading.
pub(crate) fn heading_for(roll: u32) -> AxisIntent {
    match roll {
        1 => AxisIntent::UP,
        2 => AxisIntent::RIGHT,
        3 => AxisIntent::DOWN,
        _ => AxisIntent::LEFT,
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Ally {
    route: Route,
}

impl Ally {
    fn think(&mut self, senses: &Senses<'_, '_>) -> Decision {
        let Some((player, point)) = senses.player else {
            self.route = Route::default();
            return Decision::default();
        };
        if senses.here.distance(point) <= FOLLOW_DISTANCE {
            self.route = Route::default();
            return Decision::default();
        }
        self.route.replan(senses, player);
        Decision::moving(self.route.intent(senses.me))
    }
}

fn chebyshev(a: TilePoint, b: TilePoint) -> f32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}
