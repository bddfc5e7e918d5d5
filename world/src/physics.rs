//! Vertical jump and fall integration.

use scrapfield_core::{CellCoord, GridSettings, PhysicsState, Position, TileGridView};

use crate::kinematics::blocked_at;

/// Gravitational acceleration along the vertical axis, in screen units per
/// second squared.
pub(crate) const GRAVITY: f32 = -9.8;

/// Constant-acceleration body tracking vertical velocity between updates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct PhysicsBody {
    state: PhysicsState,
    velocity: f32,
    displacement: f32,
}

impl PhysicsBody {
    pub(crate) fn state(&self) -> PhysicsState {
        self.state
    }

    /// Enters the provided state; leaving flight drops the carried velocity.
    pub(crate) fn set_state(&mut self, state: PhysicsState) {
        self.state = state;
        if state != PhysicsState::Jump {
            self.velocity = 0.0;
        }
    }

    /// Starts a jump with the provided initial upward velocity.
    pub(crate) fn launch(&mut self, velocity: f32) {
        self.state = PhysicsState::Jump;
        self.velocity = velocity;
    }

    /// Integrates one update and returns the vertical displacement.
    ///
    /// Final velocity becomes the initial velocity of the next update.
    pub(crate) fn integrate(&mut self, seconds: f32) -> f32 {
        let final_velocity = self.velocity + GRAVITY * seconds;
        self.displacement = self.velocity * seconds + 0.5 * GRAVITY * seconds * seconds;
        self.velocity = final_velocity;
        self.displacement
    }
}

/// Advances an airborne position by one physics update.
///
/// Returns the new position; the body's state reflects any transition.
pub(crate) fn step_vertical(
    body: &mut PhysicsBody,
    position: Position,
    seconds: f32,
    grid: &TileGridView<'_>,
) -> Position {
    match body.state() {
        PhysicsState::Idle => position,
        PhysicsState::Jump => rise(body, position, seconds, grid),
        PhysicsState::Fall => fall(body, position, seconds, grid),
    }
}

fn microsteps_for(displacement: f32, settings: &GridSettings) -> i32 {
    (displacement / settings.micro_step_height()) as i32
}

fn rise(
    body: &mut PhysicsBody,
    position: Position,
    seconds: f32,
    grid: &TileGridView<'_>,
) -> Position {
    let settings = grid.settings();
    let displacement = body.integrate(seconds);
    let column = position.tile().column();
    let old_row = position.tile().row();
    let mut micro = position.microstep();

    let raw = micro.y + microsteps_for(displacement, &settings).max(0);
    micro.y = raw.rem_euclid(settings.steps_y);
    let mut row = old_row + raw.div_euclid(settings.steps_y);
    if row >= settings.rows - 1 {
        row = settings.rows - 1;
        micro.y = 0;
    }

    let mut reached = old_row;
    for candidate in old_row..=row {
        reached = candidate;
        let ceiling = CellCoord::new(column, candidate + 1);
        if candidate < settings.rows - 1 && blocked_at(grid, ceiling) {
            micro.y = 0;
            body.set_state(PhysicsState::Fall);
            break;
        }
    }

    if body.state() == PhysicsState::Jump && displacement <= 0.0 {
        body.set_state(PhysicsState::Fall);
    }

    Position::new(CellCoord::new(column, reached), micro)
}

fn fall(
    body: &mut PhysicsBody,
    position: Position,
    seconds: f32,
    grid: &TileGridView<'_>,
) -> Position {
    let settings = grid.settings();
    let displacement = body.integrate(seconds);
    let column = position.tile().column();
    let old_row = position.tile().row();
    let mut micro = position.microstep();

    let raw = micro.y - microsteps_for(displacement, &settings).abs();
    micro.y = raw.rem_euclid(settings.steps_y);
    let mut row = old_row + raw.div_euclid(settings.steps_y);
    if row < 0 {
        row = 0;
        micro.y = 0;
    }

    let mut reached = row;
    for candidate in (row..=old_row).rev() {
        if blocked_at(grid, CellCoord::new(column, candidate)) {
            reached = if candidate == old_row {
                old_row
            } else {
                candidate + 1
            };
            micro.y = 0;
            body.set_state(PhysicsState::Idle);
            break;
        }
    }

    if body.state() == PhysicsState::Fall && reached == 0 && micro.y == 0 {
        body.set_state(PhysicsState::Idle);
    }

    Position::new(CellCoord::new(column, reached), micro)
}
