#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure player-control system translating frame input into player commands.

use std::time::Duration;

use scrapfield_core::{
    AxisIntent, CellCoord, Command, EntitySnapshot, Event, Faction, InputSnapshot, Key,
    MouseButton, PhysicsState, PlayerTuning, TileCode, TileGridView, WeaponProfile, HOTBAR_SLOTS,
};
use scrapfield_world::Inventory;
use tracing::debug;

/// Movement keys in priority order; the first held key wins.
const MOVE_KEYS: [(Key, AxisIntent); 4] = [
    (Key::Left, AxisIntent::LEFT),
    (Key::Right, AxisIntent::RIGHT),
    (Key::Up, AxisIntent::UP),
    (Key::Down, AxisIntent::DOWN),
];

/// Read-only state the player-control system inspects each frame.
#[derive(Clone, Copy, Debug)]
pub struct PlayerFrame<'a> {
    /// Input sampled by the adapter for this frame.
    pub input: &'a InputSnapshot,
    /// Snapshot of the player, absent before a level is entered.
    pub player: Option<&'a EntitySnapshot>,
    /// Inventory backing slot-dependent actions.
    pub inventory: &'a Inventory,
    /// Tiles of the current level.
    pub grid: TileGridView<'a>,
}

/// Player-control system that owns block-breaking and firing timers.
#[derive(Debug, Clone)]
pub struct PlayerControl {
    tuning: PlayerTuning,
    breaking: Option<BreakProgress>,
    fire_cooldown: f32,
    secondary_held: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct BreakProgress {
    cell: CellCoord,
    held: f32,
}

impl Default for PlayerControl {
    fn default() -> Self {
        Self::new(PlayerTuning::default())
    }
}

impl PlayerControl {
    /// Creates a new player-control system using the provided tuning.
    #[must_use]
    pub fn new(tuning: PlayerTuning) -> Self {
        Self {
            tuning,
            breaking: None,
            fire_cooldown: 0.0,
            secondary_held: false,
        }
    }

    /// Seconds the primary button has been held on the current block.
    #[must_use]
    pub fn break_progress(&self) -> f32 {
        self.breaking.map_or(0.0, |progress| progress.held)
    }

    /// Consumes world events and the frame input to emit player commands.
    pub fn handle(&mut self, events: &[Event], frame: PlayerFrame<'_>, out: &mut Vec<Command>) {
        let dt = elapsed(events).as_secs_f32();
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);

        let Some(player) = frame.player else {
            self.breaking = None;
            self.secondary_held = false;
            return;
        };
        let input = frame.input;

        if let Some(intent) = MOVE_KEYS
            .iter()
            .find(|(key, _)| input.is_key_down(*key))
            .map(|(_, intent)| *intent)
        {
            out.push(Command::MoveEntity {
                entity: player.id,
                intent,
            });
        }

        if input.is_key_pressed(Key::Jump) && player.physics == PhysicsState::Idle {
            out.push(Command::Jump { entity: player.id });
        }

        self.select_slot(input, frame.inventory, out);

        if input.is_key_pressed(Key::Drop) {
            out.push(Command::DropSelected);
        }

        let origin = player.position.tile();
        let reachable = input
            .mouse_cell()
            .filter(|cell| cell.point().distance(origin.point()) <= self.tuning.reach);
        let weapon = WeaponProfile::for_item(frame.inventory.selected_slot().id());
        let primary = input.mouse_button_down(MouseButton::Primary);

        if primary && weapon.is_ranged() {
            self.breaking = None;
            self.fire(origin, input.mouse_cell(), weapon, out);
        } else {
            let block = reachable
                .filter(|cell| primary && frame.grid.get(*cell) == Some(TileCode::WOODEN_BLOCK));
            self.update_break(block, dt, out);
        }

        let secondary = input.mouse_button_down(MouseButton::Secondary);
        if secondary && !self.secondary_held {
            let holds_block = frame
                .inventory
                .selected_slot()
                .name()
                .to_lowercase()
                .contains("block");
            if let Some(cell) = reachable {
                if holds_block && frame.grid.get(cell) == Some(TileCode::EMPTY) {
                    out.push(Command::PlaceBlock { cell });
                }
            }
        }
        self.secondary_held = secondary;
    }

    fn select_slot(&self, input: &InputSnapshot, inventory: &Inventory, out: &mut Vec<Command>) {
        let pressed = (1..=HOTBAR_SLOTS).find(|slot| {
            u8::try_from(*slot).map_or(false, |key| input.is_key_pressed(Key::Hotbar(key)))
        });
        if let Some(slot) = pressed {
            out.push(Command::SelectSlot { slot: slot - 1 });
            return;
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            let step = if scroll > 0.0 { 1 } else { HOTBAR_SLOTS - 1 };
            out.push(Command::SelectSlot {
                slot: (inventory.selected() + step) % HOTBAR_SLOTS,
            });
        }
    }

    fn fire(
        &mut self,
        origin: CellCoord,
        target: Option<CellCoord>,
        weapon: WeaponProfile,
        out: &mut Vec<Command>,
    ) {
        if self.fire_cooldown > 0.0 {
            return;
        }
        let Some(target) = target.filter(|target| *target != origin) else {
            return;
        };
        out.push(Command::LaunchProjectile {
            origin,
            target,
            owner: Faction::Player,
            damage: weapon.damage,
        });
        self.fire_cooldown = weapon.cooldown.unwrap_or(0.0);
    }

    fn update_break(&mut self, block: Option<CellCoord>, dt: f32, out: &mut Vec<Command>) {
        let Some(cell) = block else {
            self.breaking = None;
            return;
        };
        let held = match self.breaking {
            Some(progress) if progress.cell == cell => progress.held + dt,
            _ => dt,
        };
        if held >= self.tuning.break_seconds {
            debug!(column = cell.column(), row = cell.row(), "block_broken");
            out.push(Command::BreakTile { cell });
            self.breaking = None;
        } else {
            self.breaking = Some(BreakProgress { cell, held });
        }
    }
}

fn elapsed(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapfield_core::{EntityId, EntityKind, GridSettings, Position, TilePoint};

    fn player_at(cell: CellCoord) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(0, 0),
            kind: EntityKind::Player,
            position: Position::at(cell),
            hp: 100,
            physics: PhysicsState::Idle,
        }
    }

    fn tick(millis: u64) -> Vec<Event> {
        vec![Event::TimeAdvanced {
            dt: Duration::from_millis(millis),
        }]
    }

    #[test]
    fn first_held_direction_wins() {
        let mut system = PlayerControl::default();
        let cells = vec![TileCode::EMPTY; GridSettings::DEFAULT.cell_count()];
        let world = scrapfield_world::World::new();
        let inventory = scrapfield_world::query::inventory(&world);
        let player = player_at(CellCoord::new(3, 3));
        let input = InputSnapshot::new()
            .with_key_down(Key::Down)
            .with_key_down(Key::Right);
        let mut out = Vec::new();

        system.handle(
            &tick(16),
            PlayerFrame {
                input: &input,
                player: Some(&player),
                inventory,
                grid: TileGridView::new(GridSettings::DEFAULT, &cells),
            },
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::MoveEntity {
                entity: player.id,
                intent: AxisIntent::RIGHT,
            }]
        );
    }

    #[test]
    fn releasing_the_button_resets_break_progress() {
        let mut system = PlayerControl::default();
        let settings = GridSettings::DEFAULT;
        let mut cells = vec![TileCode::EMPTY; settings.cell_count()];
        let block = CellCoord::new(5, 3);
        cells[(block.row() * settings.columns + block.column()) as usize] = TileCode::WOODEN_BLOCK;
        let world = scrapfield_world::World::new();
        let inventory = scrapfield_world::query::inventory(&world);
        let player = player_at(CellCoord::new(3, 3));
        let holding = InputSnapshot::new()
            .with_mouse(TilePoint::new(5.5, 3.5))
            .with_button_down(MouseButton::Primary);
        let released = InputSnapshot::new().with_mouse(TilePoint::new(5.5, 3.5));
        let mut out = Vec::new();

        for input in [&holding, &holding, &released] {
            system.handle(
                &tick(500),
                PlayerFrame {
                    input,
                    player: Some(&player),
                    inventory,
                    grid: TileGridView::new(settings, &cells),
                },
                &mut out,
            );
            if input == &holding {
                assert!(system.break_progress() > 0.0);
            }
        }

        assert_eq!(system.break_progress(), 0.0);
        assert!(out.is_empty());
    }
}
