use std::time::Duration;

use scrapfield_core::{
    CellCoord, Command, EnemyKind, EntityId, EntityKind, Event, GridSettings, LevelId,
    SceneTuning, TileCode,
};
use scrapfield_system_spawning::{Config, SpawnFrame, Spawning, SpawnerPhase};
use scrapfield_world::{self as world, query, World};

const BOSS_LEVEL: LevelId = LevelId::new(10);

fn world_with(level: LevelId, extra: &[(CellCoord, TileCode)]) -> World {
    let settings = GridSettings::DEFAULT;
    let mut tiles = vec![TileCode::EMPTY; settings.cell_count()];
    for (cell, code) in [(CellCoord::new(2, 2), TileCode::PLAYER_START)]
        .iter()
        .chain(extra)
    {
        tiles[(cell.row() * settings.columns + cell.column()) as usize] = *code;
    }
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(&mut world, Command::LoadLevel { level, tiles }, &mut events);
    world::apply(
        &mut world,
        Command::EnterLevel {
            level,
            arrival: None,
        },
        &mut events,
    );
    world
}

fn spawning(seed: u64) -> Spawning {
    Spawning::new(Config::new(SceneTuning::default(), BOSS_LEVEL, seed))
}

fn elapse(seconds: u64) -> [Event; 1] {
    [Event::TimeAdvanced {
        dt: Duration::from_secs(seconds),
    }]
}

/// Runs the system against the current world state with an explicit clock.
fn handle(
    world: &World,
    spawning: &mut Spawning,
    events: &[Event],
    night: bool,
) -> Vec<Command> {
    let view = query::entity_view(world);
    let mut commands = Vec::new();
    spawning.handle(
        events,
        SpawnFrame {
            level: query::current_level(world),
            night,
            entities: &view,
            grid: query::tile_grid(world),
            summon_request: query::summon_request(world),
            summoned: query::summoned(world),
            kills: query::kills(world),
        },
        &mut commands,
    );
    commands
}

fn spawned_kinds(commands: &[Command]) -> Vec<EnemyKind> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnEnemy { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn daytime_waves_only_bring_wildlife() {
    let world = world_with(LevelId::new(1), &[]);
    let mut spawning = spawning(3);

    let commands = handle(&world, &mut spawning, &elapse(50), false);

    let kinds = spawned_kinds(&commands);
    assert_eq!(kinds.len(), 10, "five waves of two");
    assert!(kinds
        .iter()
        .all(|kind| matches!(kind, EnemyKind::Cow | EnemyKind::Unicorn)));
    for command in &commands {
        if let Command::SpawnEnemy { cell, .. } = command {
            assert_eq!(query::tile(&world, *cell), Some(TileCode::EMPTY));
        }
    }
}

#[test]
fn night_waves_bring_hostiles() {
    let world = world_with(LevelId::new(1), &[]);
    let mut spawning = spawning(3);

    let kinds = spawned_kinds(&handle(&world, &mut spawning, &elapse(200), true));

    assert_eq!(kinds.len(), 40);
    assert!(kinds
        .iter()
        .any(|kind| matches!(kind, EnemyKind::Chaser | EnemyKind::AxisLock)));
}

#[test]
fn boss_level_suppresses_and_resets_waves() {
    let arena = world_with(BOSS_LEVEL, &[]);
    let field = world_with(LevelId::new(1), &[]);
    let mut spawning = spawning(9);

    assert!(handle(&arena, &mut spawning, &elapse(9), false).is_empty());
    assert!(handle(&arena, &mut spawning, &elapse(30), false).is_empty());
    assert!(
        handle(&field, &mut spawning, &elapse(5), false).is_empty(),
        "time spent in the arena does not carry over"
    );
    assert_eq!(
        spawned_kinds(&handle(&field, &mut spawning, &elapse(5), false)).len(),
        2
    );
}

#[test]
fn spawner_releases_one_hostile_next_to_itself() {
    let home = CellCoord::new(10, 10);
    let mut world = world_with(LevelId::new(1), &[(home, TileCode::SPAWNER)]);
    let spawner = query::entity_view(&world)
        .of_kind(EntityKind::Spawner)
        .next()
        .expect("spawner entity")
        .id;
    let mut spawning = Spawning::new(Config::new(
        SceneTuning {
            spawn_interval: 0.0,
            ..SceneTuning::default()
        },
        BOSS_LEVEL,
        11,
    ));

    let mut released = Vec::new();
    let mut spawned_at = None;
    for tick in 0..520 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        for command in handle(&world, &mut spawning, &events, false) {
            if let Command::SpawnEnemy { kind, cell } = command {
                released.push((kind, cell));
                spawned_at.get_or_insert(tick);
            }
            world::apply(&mut world, command, &mut events);
        }
    }

    assert_eq!(released.len(), 1);
    let (kind, cell) = released[0];
    assert!(matches!(kind, EnemyKind::Chaser | EnemyKind::AxisLock));
    assert_eq!(cell.manhattan_distance(home), 1);
    let spawned_at = spawned_at.expect("spawn tick");
    assert!((300..=501).contains(&spawned_at), "spawned at {spawned_at}");
    let phase = spawning.spawner_phase(spawner);
    if 520 - spawned_at <= 100 {
        assert_eq!(phase, Some(SpawnerPhase::Spawn));
    } else {
        assert!(phase.is_some());
    }
}

#[test]
fn summons_are_placed_only_while_kills_keep_up() {
    let mut world = world_with(BOSS_LEVEL, &[]);
    let boss = EntityId::new(7, 0);
    let mut spawning = spawning(5);
    let mut events = Vec::new();

    world::apply(&mut world, Command::RequestSummon { boss }, &mut events);
    let first = handle(&world, &mut spawning, &elapse(1), false);
    assert_eq!(spawned_kinds(&first).len(), 1);
    assert_eq!(first.last(), Some(&Command::CompleteSummon { placed: true }));
    for command in first {
        world::apply(&mut world, command, &mut events);
    }
    assert_eq!(query::summoned(&world), 1);
    assert_eq!(query::summon_request(&world), None);

    world::apply(&mut world, Command::RequestSummon { boss }, &mut events);
    let second = handle(&world, &mut spawning, &elapse(1), false);
    assert_eq!(second, vec![Command::CompleteSummon { placed: false }]);
}

#[test]
fn replay_is_deterministic() {
    let replay = |seed: u64| {
        let mut world = world_with(LevelId::new(1), &[(CellCoord::new(20, 5), TileCode::SPAWNER)]);
        let mut spawning = spawning(seed);
        let mut log = Vec::new();
        for _ in 0..900 {
            let mut events = Vec::new();
            world::apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_millis(50),
                },
                &mut events,
            );
            let night = query::is_night(&world);
            for command in handle(&world, &mut spawning, &events, night) {
                log.push(command.clone());
                world::apply(&mut world, command, &mut events);
            }
        }
        log
    };

    let first = replay(21);
    assert!(!first.is_empty());
    assert_eq!(first, replay(21), "replay diverged between runs");
}
