use std::time::Duration;

use scrapfield_core::{
    CellCoord, Command, EntityKind, Event, GridSettings, InputSnapshot, ItemGrant, ItemId, Key,
    LevelId, TileCode,
};
use scrapfield_system_scene::Scene;
use scrapfield_world::{self as world, query, World, HEALTH};

const FRAME: Duration = Duration::from_millis(16);

fn layout(markers: &[(CellCoord, TileCode)]) -> Vec<TileCode> {
    let settings = GridSettings::DEFAULT;
    let mut tiles = vec![TileCode::EMPTY; settings.cell_count()];
    for (cell, code) in markers {
        tiles[(cell.row() * settings.columns + cell.column()) as usize] = *code;
    }
    tiles
}

fn world_with(levels: Vec<(LevelId, Vec<TileCode>)>, start: LevelId) -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    for (level, tiles) in levels {
        world::apply(&mut world, Command::LoadLevel { level, tiles }, &mut events);
    }
    world::apply(
        &mut world,
        Command::EnterLevel {
            level: start,
            arrival: None,
        },
        &mut events,
    );
    world
}

#[test]
fn walking_off_the_right_edge_enters_the_next_level() {
    let first = layout(&[
        (CellCoord::new(29, 4), TileCode::PLAYER_START),
        (CellCoord::new(10, 12), TileCode::COW_START),
    ]);
    let second = layout(&[]);
    let world = world_with(
        vec![(LevelId::new(1), first), (LevelId::new(2), second)],
        LevelId::new(1),
    );
    let mut scene = Scene::new(world, 5);
    let input = InputSnapshot::new().with_key_down(Key::Right);

    let mut entered = false;
    for _ in 0..40 {
        let events = scene.step(&input, FRAME);
        if events
            .iter()
            .any(|event| matches!(event, Event::LevelEntered { .. }))
        {
            entered = true;
            break;
        }
    }

    assert!(entered, "the player should have crossed into level 2");
    let world = scene.world();
    assert_eq!(query::current_level(world), Some(LevelId::new(2)));
    let view = query::entity_view(world);
    let player = view.player().expect("player survives the switch");
    assert_eq!(player.position.tile(), CellCoord::new(1, 4));
    assert!(view.enemies().next().is_none(), "level 1 wildlife stays behind");
}

#[test]
fn missing_neighbour_keeps_the_player_on_the_edge() {
    let tiles = layout(&[(CellCoord::new(29, 4), TileCode::PLAYER_START)]);
    let world = world_with(vec![(LevelId::new(1), tiles)], LevelId::new(1));
    let mut scene = Scene::new(world, 5);
    let input = InputSnapshot::new().with_key_down(Key::Right);

    for _ in 0..40 {
        let events = scene.step(&input, FRAME);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::LevelRejected { .. })));
    }

    let world = scene.world();
    assert_eq!(query::current_level(world), Some(LevelId::new(1)));
    let player = query::entity_view(world);
    let player = player.player().expect("player");
    assert_eq!(player.position.tile(), CellCoord::new(31, 4));
}

#[test]
fn chaser_contact_is_gated_by_invulnerability() {
    let tiles = layout(&[
        (CellCoord::new(4, 4), TileCode::PLAYER_START),
        (CellCoord::new(5, 4), TileCode::CHASER_START),
    ]);
    let world = world_with(vec![(LevelId::new(1), tiles)], LevelId::new(1));
    let mut scene = Scene::new(world, 2);

    let _ = scene.step(&InputSnapshot::new(), FRAME);
    assert_eq!(query::inventory(scene.world()).count(HEALTH), 90);

    let _ = scene.step(&InputSnapshot::new(), FRAME);
    assert_eq!(query::inventory(scene.world()).count(HEALTH), 90);
}

#[test]
fn submitted_commands_apply_between_frames() {
    let tiles = layout(&[(CellCoord::new(4, 4), TileCode::PLAYER_START)]);
    let world = world_with(vec![(LevelId::new(1), tiles)], LevelId::new(1));
    let mut scene = Scene::new(world, 0);

    scene.submit(Command::GrantItem {
        grant: ItemGrant::new("rustedwood", ItemId::new(11), 3, 64),
    });
    assert!(scene
        .frame_events()
        .iter()
        .any(|event| matches!(event, Event::ItemAdded { amount: 3, .. })));

    let _ = scene.step(&InputSnapshot::new(), FRAME);
    assert_eq!(scene.inventory().count("rustedwood"), 3);
}

#[test]
fn scenes_replay_deterministically() {
    let replay = |seed: u64| {
        let tiles = layout(&[
            (CellCoord::new(4, 4), TileCode::PLAYER_START),
            (CellCoord::new(14, 4), TileCode::AXIS_LOCK_START),
            (CellCoord::new(20, 9), TileCode::COW_START),
            (CellCoord::new(25, 15), TileCode::SPAWNER),
        ]);
        let world = world_with(vec![(LevelId::new(1), tiles)], LevelId::new(1));
        let mut scene = Scene::new(world, seed);
        let mut log = Vec::new();
        for frame in 0..900_u32 {
            let input = if frame % 120 < 60 {
                InputSnapshot::new().with_key_down(Key::Right)
            } else {
                InputSnapshot::new().with_key_down(Key::Left)
            };
            log.extend(scene.step(&input, FRAME).iter().cloned());
        }
        let entities: Vec<(EntityKind, CellCoord)> = query::entity_view(scene.world())
            .iter()
            .map(|snapshot| (snapshot.kind, snapshot.position.tile()))
            .collect();
        (log, entities)
    };

    let first = replay(17);
    assert_eq!(first, replay(17), "replay diverged between runs");
    assert!(first
        .0
        .iter()
        .any(|event| matches!(event, Event::EntitySpawned { .. })));
}
