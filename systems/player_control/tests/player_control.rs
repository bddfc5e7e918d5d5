use std::time::Duration;

use scrapfield_core::{
    CellCoord, Command, Event, Faction, GridSettings, InputSnapshot, ItemGrant, ItemId, Key,
    LevelId, MouseButton, TileCode, TilePoint,
};
use scrapfield_system_player_control::{PlayerControl, PlayerFrame};
use scrapfield_world::{self as world, query, World, WOODEN_BLOCK};

const PLAYER: CellCoord = CellCoord::new(4, 4);

fn world_with(extra: &[(CellCoord, TileCode)]) -> World {
    let settings = GridSettings::DEFAULT;
    let mut tiles = vec![TileCode::EMPTY; settings.cell_count()];
    for (cell, code) in [(PLAYER, TileCode::PLAYER_START)].iter().chain(extra) {
        tiles[(cell.row() * settings.columns + cell.column()) as usize] = *code;
    }

    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::LoadLevel {
            level: LevelId::new(1),
            tiles,
        },
        &mut events,
    );
    world::apply(
        &mut world,
        Command::EnterLevel {
            level: LevelId::new(1),
            arrival: None,
        },
        &mut events,
    );
    world
}

/// Runs one frame: a tick followed by the player-control commands.
fn frame(world: &mut World, system: &mut PlayerControl, input: &InputSnapshot) -> Vec<Command> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(500),
        },
        &mut events,
    );

    let view = query::entity_view(world);
    let mut commands = Vec::new();
    system.handle(
        &events,
        PlayerFrame {
            input,
            player: view.player(),
            inventory: query::inventory(world),
            grid: query::tile_grid(world),
        },
        &mut commands,
    );

    for command in commands.clone() {
        let mut generated = Vec::new();
        world::apply(world, command, &mut generated);
    }
    commands
}

#[test]
fn holding_primary_for_two_seconds_breaks_the_block() {
    let block = CellCoord::new(6, 4);
    let mut world = world_with(&[(block, TileCode::WOODEN_BLOCK)]);
    let mut system = PlayerControl::default();
    let input = InputSnapshot::new()
        .with_mouse(TilePoint::new(6.5, 4.5))
        .with_button_down(MouseButton::Primary);

    let mut issued = Vec::new();
    for _ in 0..4 {
        issued.extend(frame(&mut world, &mut system, &input));
    }

    assert_eq!(issued, vec![Command::BreakTile { cell: block }]);
    assert_eq!(query::tile(&world, block), Some(TileCode::EMPTY));
    assert_eq!(query::inventory(&world).count(WOODEN_BLOCK), 1);
}

#[test]
fn blocks_out_of_reach_are_ignored() {
    let block = CellCoord::new(9, 4);
    let mut world = world_with(&[(block, TileCode::WOODEN_BLOCK)]);
    let mut system = PlayerControl::default();
    let input = InputSnapshot::new()
        .with_mouse(TilePoint::new(9.5, 4.5))
        .with_button_down(MouseButton::Primary);

    for _ in 0..6 {
        assert!(frame(&mut world, &mut system, &input).is_empty());
    }
    assert_eq!(query::tile(&world, block), Some(TileCode::WOODEN_BLOCK));
}

#[test]
fn placing_requires_a_fresh_secondary_press() {
    let mut world = world_with(&[]);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::GrantItem {
            grant: ItemGrant::new(WOODEN_BLOCK, ItemId::new(100), 3, 999),
        },
        &mut events,
    );
    let mut system = PlayerControl::default();
    let input = InputSnapshot::new()
        .with_mouse(TilePoint::new(5.5, 4.5))
        .with_button_down(MouseButton::Secondary);

    let first = frame(&mut world, &mut system, &input);
    let held = frame(&mut world, &mut system, &input);

    assert_eq!(
        first,
        vec![Command::PlaceBlock {
            cell: CellCoord::new(5, 4)
        }]
    );
    assert!(held.is_empty());
    assert_eq!(
        query::tile(&world, CellCoord::new(5, 4)),
        Some(TileCode::WOODEN_BLOCK)
    );
    assert_eq!(query::inventory(&world).count(WOODEN_BLOCK), 2);
}

#[test]
fn equipped_pistol_fires_with_cooldown() {
    let mut world = world_with(&[]);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::GrantItem {
            grant: ItemGrant::new("pistol mark1 (weapon)", ItemId::new(880), 1, 1),
        },
        &mut events,
    );
    let mut system = PlayerControl::default();
    let input = InputSnapshot::new()
        .with_mouse(TilePoint::new(12.5, 4.5))
        .with_button_down(MouseButton::Primary);

    let shots: Vec<usize> = (0..4)
        .map(|_| frame(&mut world, &mut system, &input).len())
        .collect();

    assert_eq!(shots, vec![1, 1, 1, 1]);
    assert_eq!(query::pending_projectiles(&world), 4);

    let mut fast = PlayerControl::default();
    let mut commands = Vec::new();
    let view = query::entity_view(&world);
    for _ in 0..2 {
        fast.handle(
            &[],
            PlayerFrame {
                input: &input,
                player: view.player(),
                inventory: query::inventory(&world),
                grid: query::tile_grid(&world),
            },
            &mut commands,
        );
    }
    assert_eq!(
        commands,
        vec![Command::LaunchProjectile {
            origin: PLAYER,
            target: CellCoord::new(12, 4),
            owner: Faction::Player,
            damage: 15,
        }]
    );
}

#[test]
fn hotbar_keys_select_slots() {
    let mut world = world_with(&[]);
    let mut system = PlayerControl::default();
    let input = InputSnapshot::new()
        .with_key_pressed(Key::Hotbar(3))
        .with_key_pressed(Key::Hotbar(5));

    let commands = frame(&mut world, &mut system, &input);

    assert_eq!(commands, vec![Command::SelectSlot { slot: 2 }]);
    assert_eq!(query::inventory(&world).selected(), 2);
}
