//! Sub-tile mover shared by every grid-walking entity.
//!
//! A step advances the microstep on each axis with a non-zero intent, carries
//! overflow into the tile index, constrains the result to the grid and finally
//! probes the tile map. What happens when the probe fails depends on the
//! entity's [`MovePolicy`].

use scrapfield_core::{AxisIntent, CellCoord, Direction, Microstep, Position, TileGridView};

/// How the tile index is restored when a step is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Revert {
    /// Keep the index reached by the step.
    Keep,
    /// Restore the index on the moving axis only.
    Axis,
    /// Restore the index on both axes.
    Whole,
}

/// Reaction to a rejected step in one direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockResponse {
    /// Index restoration rule.
    pub revert: Revert,
    /// Whether the microstep of the non-moving axis is cleared as well.
    pub zero_other_axis: bool,
    /// Whether the entity is deactivated instead of stopped.
    pub deactivate: bool,
}

impl BlockResponse {
    const fn stop(revert: Revert, zero_other_axis: bool) -> Self {
        Self {
            revert,
            zero_other_axis,
            deactivate: false,
        }
    }

    const DEACTIVATE: Self = Self {
        revert: Revert::Keep,
        zero_other_axis: false,
        deactivate: true,
    };
}

/// What happens when a step leaves the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bounds {
    /// Clamp to the outermost cell and clear the microstep.
    Clamp,
    /// Deactivate the entity.
    Deactivate,
}

/// Per-kind parameters of the mover.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePolicy {
    /// Reaction to a blocked step toward lower columns.
    pub left: BlockResponse,
    /// Reaction to a blocked step toward higher columns.
    pub right: BlockResponse,
    /// Reaction to a blocked step toward higher rows.
    pub up: BlockResponse,
    /// Reaction to a blocked step toward lower rows.
    pub down: BlockResponse,
    /// Directions whose probe also covers the straddled row or column,
    /// indexed as left, right, up, down.
    pub straddle: [bool; 4],
    /// Whether downward steps are probed while standing on the bottom row.
    pub probe_floor: bool,
    /// Boundary handling.
    pub bounds: Bounds,
}

impl MovePolicy {
    /// Player rules: lower-side rejections revert the moving axis, upper-side
    /// rejections only clear the microstep, and only leftward probes look at
    /// the straddled row.
    pub const PLAYER: Self = Self {
        left: BlockResponse::stop(Revert::Axis, false),
        right: BlockResponse::stop(Revert::Keep, false),
        up: BlockResponse::stop(Revert::Keep, false),
        down: BlockResponse::stop(Revert::Axis, false),
        straddle: [true, false, false, false],
        probe_floor: true,
        bounds: Bounds::Clamp,
    };

    /// Rules shared by enemies, the boss and allies.
    pub const WALKER: Self = Self {
        left: BlockResponse::stop(Revert::Whole, true),
        right: BlockResponse::stop(Revert::Keep, true),
        up: BlockResponse::stop(Revert::Keep, true),
        down: BlockResponse::stop(Revert::Whole, true),
        straddle: [true, true, true, true],
        probe_floor: false,
        bounds: Bounds::Clamp,
    };

    /// Projectiles die on any obstacle or boundary.
    pub const PROJECTILE: Self = Self {
        left: BlockResponse::DEACTIVATE,
        right: BlockResponse::DEACTIVATE,
        up: BlockResponse::DEACTIVATE,
        down: BlockResponse::DEACTIVATE,
        straddle: [true, true, true, true],
        probe_floor: true,
        bounds: Bounds::Deactivate,
    };

    fn response(&self, direction: Direction) -> BlockResponse {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    fn straddles(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.straddle[0],
            Direction::Right => self.straddle[1],
            Direction::Up => self.straddle[2],
            Direction::Down => self.straddle[3],
        }
    }
}

/// Result of a single mover step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    /// Position after the step.
    pub position: Position,
    /// Directions whose probe rejected the step, horizontal first.
    pub blocked: [Option<Direction>; 2],
    /// Whether the policy asked for the entity to be deactivated.
    pub deactivated: bool,
}

impl StepOutcome {
    /// Iterator over the rejected directions.
    pub fn blocked(&self) -> impl Iterator<Item = Direction> + '_ {
        self.blocked.iter().flatten().copied()
    }
}

/// Moves a position by `speed` microsteps along each non-zero intent axis.
#[must_use]
pub fn step(
    position: Position,
    intent: AxisIntent,
    speed: i32,
    policy: &MovePolicy,
    grid: &TileGridView<'_>,
) -> StepOutcome {
    let mut mover = Mover {
        tile: position.tile(),
        micro: position.microstep(),
        old: position.tile(),
        policy,
        grid,
    };
    let mut outcome = StepOutcome {
        position,
        blocked: [None, None],
        deactivated: false,
    };

    let horizontal = match intent.x() {
        x if x < 0 => Some(Direction::Left),
        x if x > 0 => Some(Direction::Right),
        _ => None,
    };
    let vertical = match intent.y() {
        y if y > 0 => Some(Direction::Up),
        y if y < 0 => Some(Direction::Down),
        _ => None,
    };

    for (slot, direction) in [horizontal, vertical].into_iter().enumerate() {
        let Some(direction) = direction else {
            continue;
        };
        match mover.advance(direction, speed) {
            AxisResult::Moved => {}
            AxisResult::Blocked => {
                outcome.blocked[slot] = Some(direction);
                if policy.response(direction).deactivate {
                    outcome.deactivated = true;
                }
            }
            AxisResult::OutOfBounds => {
                outcome.deactivated = true;
            }
        }
        if outcome.deactivated {
            break;
        }
    }

    outcome.position = Position::new(mover.tile, mover.micro);
    outcome
}

/// Reports whether the cell blocks movement; cells beyond the grid never do.
#[must_use]
pub(crate) fn blocked_at(grid: &TileGridView<'_>, cell: CellCoord) -> bool {
    grid.get(cell).map_or(false, |code| code.is_blocked())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AxisResult {
    Moved,
    Blocked,
    OutOfBounds,
}

struct Mover<'a, 'g> {
    tile: CellCoord,
    micro: Microstep,
    old: CellCoord,
    policy: &'a MovePolicy,
    grid: &'a TileGridView<'g>,
}

impl Mover<'_, '_> {
    fn advance(&mut self, direction: Direction, speed: i32) -> AxisResult {
        self.carry(direction, speed);

        if !self.constrain(direction) {
            return AxisResult::OutOfBounds;
        }

        if self.probe(direction) {
            return AxisResult::Moved;
        }

        let response = self.policy.response(direction);
        let horizontal = matches!(direction, Direction::Left | Direction::Right);
        match response.revert {
            Revert::Keep => {}
            Revert::Axis if horizontal => {
                self.tile = CellCoord::new(self.old.column(), self.tile.row());
            }
            Revert::Axis => {
                self.tile = CellCoord::new(self.tile.column(), self.old.row());
            }
            Revert::Whole => self.tile = self.old,
        }
        if horizontal {
            self.micro.x = 0;
            if response.zero_other_axis {
                self.micro.y = 0;
            }
        } else {
            self.micro.y = 0;
            if response.zero_other_axis {
                self.micro.x = 0;
            }
        }
        AxisResult::Blocked
    }

    fn carry(&mut self, direction: Direction, speed: i32) {
        let settings = self.grid.settings();
        let (column, row) = (self.tile.column(), self.tile.row());
        match direction {
            Direction::Left | Direction::Right => {
                let delta = if direction == Direction::Left { -speed } else { speed };
                let raw = self.micro.x + delta;
                self.micro.x = raw.rem_euclid(settings.steps_x);
                self.tile = CellCoord::new(column + raw.div_euclid(settings.steps_x), row);
            }
            Direction::Up | Direction::Down => {
                let delta = if direction == Direction::Down { -speed } else { speed };
                let raw = self.micro.y + delta;
                self.micro.y = raw.rem_euclid(settings.steps_y);
                self.tile = CellCoord::new(column, row + raw.div_euclid(settings.steps_y));
            }
        }
    }

    /// Applies the boundary rule, returning `false` when the entity left the
    /// grid under [`Bounds::Deactivate`].
    fn constrain(&mut self, direction: Direction) -> bool {
        let settings = self.grid.settings();
        let (column, row) = (self.tile.column(), self.tile.row());
        if self.policy.bounds == Bounds::Deactivate {
            return settings.contains(self.tile);
        }
        match direction {
            Direction::Left if column < 0 => {
                self.tile = CellCoord::new(0, row);
                self.micro.x = 0;
            }
            Direction::Right if column >= settings.columns - 1 => {
                self.tile = CellCoord::new(settings.columns - 1, row);
                self.micro.x = 0;
            }
            Direction::Up if row >= settings.rows - 1 => {
                self.tile = CellCoord::new(column, settings.rows - 1);
                self.micro.y = 0;
            }
            Direction::Down if row < 0 => {
                self.tile = CellCoord::new(column, 0);
                self.micro.y = 0;
            }
            _ => {}
        }
        true
    }

    /// Returns `true` when the cells covered after the step are passable.
    ///
    /// Clamped movers treat the outermost column and row as always passable.
    fn probe(&mut self, direction: Direction) -> bool {
        let settings = self.grid.settings();
        let straddle = self.policy.straddles(direction);
        let clamped = self.policy.bounds == Bounds::Clamp;
        let tile = self.tile;
        let blocked = |cell: CellCoord| blocked_at(self.grid, cell);
        match direction {
            Direction::Left => {
                !(blocked(tile) || (straddle && self.micro.y != 0 && blocked(tile.offset(0, 1))))
            }
            Direction::Right => {
                if clamped && tile.column() >= settings.columns - 1 {
                    self.micro.x = 0;
                    return true;
                }
                !(blocked(tile.offset(1, 0))
                    || (straddle && self.micro.y != 0 && blocked(tile.offset(1, 1))))
            }
            Direction::Up => {
                if clamped && tile.row() >= settings.rows - 1 {
                    self.micro.y = 0;
                    return true;
                }
                !(blocked(tile.offset(0, 1))
                    || (straddle && self.micro.x != 0 && blocked(tile.offset(1, 1))))
            }
            Direction::Down => {
                if !self.policy.probe_floor && tile.row() == 0 {
                    return true;
                }
                !(blocked(tile) || (straddle && self.micro.x != 0 && blocked(tile.offset(1, 0))))
            }
        }
    }
}
