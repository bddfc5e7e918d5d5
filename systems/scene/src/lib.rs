#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame driver that owns the world together with every gameplay system and
//! steps them in a fixed order.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{
    CellCoord, Command, EntityId, Event, GridSettings, InputSnapshot, LevelId, WeaponProfile,
};
use scrapfield_system_boss::BossAi;
use scrapfield_system_combat::{Combat, CombatFrame};
use scrapfield_system_enemy_ai::EnemyAi;
use scrapfield_system_player_control::{PlayerControl, PlayerFrame};
use scrapfield_system_spawning::{Config, SpawnFrame, Spawning};
use scrapfield_world::{self as world, query, Inventory, World};
use tracing::info;

/// Level offset applied when the player leaves through the top edge.
const VERTICAL_LEVEL_STRIDE: i32 = 3;

/// Owns the authoritative world and drives the systems frame by frame.
#[derive(Debug)]
pub struct Scene {
    world: World,
    seed: u64,
    player: PlayerControl,
    enemies: EnemyAi,
    boss: BossAi,
    spawning: Spawning,
    combat: Combat,
    carried: Vec<Event>,
    frame_events: Vec<Event>,
}

impl Scene {
    /// Wraps a prepared world, seeding every stochastic system from `seed`.
    #[must_use]
    pub fn new(world: World, seed: u64) -> Self {
        let tuning = query::tuning(&world).clone();
        let mut seeds = ChaCha8Rng::seed_from_u64(seed);
        let enemies = EnemyAi::new(tuning.enemy, seeds.gen());
        let boss = BossAi::new(tuning.boss, seeds.gen());
        let spawning = Spawning::new(Config::new(
            tuning.scene,
            LevelId::new(tuning.boss.level),
            seeds.gen(),
        ));
        let combat = Combat::new(&tuning, seeds.gen());

        Self {
            world,
            seed,
            player: PlayerControl::new(tuning.player),
            enemies,
            boss,
            spawning,
            combat,
            carried: Vec::new(),
            frame_events: Vec::new(),
        }
    }

    /// Seed the scene was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Entity id of the player, if one has been spawned.
    #[must_use]
    pub fn player(&self) -> Option<EntityId> {
        query::player(&self.world)
    }

    /// Banner adapters may show before the first frame.
    #[must_use]
    pub fn welcome_banner(&self) -> &'static str {
        query::welcome_banner(&self.world)
    }

    /// Inventory of the player.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        query::inventory(&self.world)
    }

    /// Seconds the primary button has been held on the block under the cursor.
    #[must_use]
    pub fn break_progress(&self) -> f32 {
        self.player.break_progress()
    }

    /// Events produced by the most recent [`Scene::step`].
    #[must_use]
    pub fn frame_events(&self) -> &[Event] {
        &self.frame_events
    }

    /// Applies a command issued outside the frame loop, such as a crafting
    /// request from a menu. Resulting events reach the systems next frame.
    pub fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        self.frame_events.extend(events.iter().cloned());
        self.carried.extend(events);
    }

    /// Advances the simulation by one frame.
    ///
    /// Systems run as player, map, enemies and boss, spawning, projectiles
    /// and combat, pickups, then physics. Events raised after the enemy step
    /// are carried into the next frame so that earlier systems observe them.
    pub fn step(&mut self, input: &InputSnapshot, dt: Duration) -> &[Event] {
        self.frame_events.clear();
        let mut events = std::mem::take(&mut self.carried);
        let mut commands = Vec::new();
        self.apply(Command::Tick { dt }, &mut events);

        let view = query::entity_view(&self.world);
        self.player.handle(
            &events,
            PlayerFrame {
                input,
                player: view.player(),
                inventory: query::inventory(&self.world),
                grid: query::tile_grid(&self.world),
            },
            &mut commands,
        );
        self.flush(&mut commands, &mut events);

        if let Some((level, arrival)) = self.level_exit() {
            self.apply(
                Command::EnterLevel {
                    level,
                    arrival: Some(arrival),
                },
                &mut events,
            );
        }

        let view = query::entity_view(&self.world);
        let grid = query::tile_grid(&self.world);
        self.enemies.handle(&events, &view, &grid, &mut commands);
        self.boss.handle(&events, &view, &grid, &mut commands);
        self.flush(&mut commands, &mut events);

        let mut later = Vec::new();
        let view = query::entity_view(&self.world);
        self.spawning.handle(
            &events,
            SpawnFrame {
                level: query::current_level(&self.world),
                night: query::is_night(&self.world),
                entities: &view,
                grid: query::tile_grid(&self.world),
                summon_request: query::summon_request(&self.world),
                summoned: query::summoned(&self.world),
                kills: query::kills(&self.world),
            },
            &mut commands,
        );
        self.flush(&mut commands, &mut later);

        self.apply(Command::StepProjectiles, &mut later);
        let view = query::entity_view(&self.world);
        let projectiles = query::projectile_view(&self.world);
        self.combat.handle(
            &events,
            CombatFrame {
                entities: &view,
                projectiles: &projectiles,
                grid: query::tile_grid(&self.world),
                input,
                weapon: WeaponProfile::for_item(query::inventory(&self.world).selected_slot().id()),
                player_invulnerable: query::player_invulnerable(&self.world),
            },
            &mut commands,
        );
        self.flush(&mut commands, &mut later);

        self.apply(Command::CollectPickups, &mut later);
        self.apply(Command::StepPhysics { dt }, &mut later);
        self.apply(Command::CollectGarbage, &mut later);

        self.carried = later;
        &self.frame_events
    }

    fn apply(&mut self, command: Command, events: &mut Vec<Event>) {
        let start = events.len();
        world::apply(&mut self.world, command, events);
        self.frame_events.extend(events[start..].iter().cloned());
    }

    fn flush(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            self.apply(command, events);
        }
    }

    /// Level and arrival cell when the player stands on a map edge leading
    /// to a loaded level.
    fn level_exit(&self) -> Option<(LevelId, CellCoord)> {
        let current = query::current_level(&self.world)?;
        let player = query::player(&self.world)?;
        let cell = query::entity_view(&self.world).get(player)?.position.tile();
        let (delta, arrival) = exit_through(cell, query::grid_settings(&self.world))?;
        let level = current.offset(delta)?;
        if !query::level_loaded(&self.world, level) {
            return None;
        }
        info!(from = current.get(), to = level.get(), "level_switch");
        Some((level, arrival))
    }
}

/// Level offset and arrival cell for a player standing on an edge cell.
fn exit_through(cell: CellCoord, settings: GridSettings) -> Option<(i32, CellCoord)> {
    let last_column = settings.columns - 1;
    let last_row = settings.rows - 1;
    if cell.column() >= last_column {
        Some((1, CellCoord::new(1, cell.row())))
    } else if cell.column() <= 0 {
        Some((-1, CellCoord::new(last_column - 1, cell.row())))
    } else if cell.row() >= last_row {
        Some((-VERTICAL_LEVEL_STRIDE, CellCoord::new(cell.column(), 1)))
    } else if cell.row() <= 0 {
        Some((VERTICAL_LEVEL_STRIDE, CellCoord::new(cell.column(), last_row - 1)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_map_to_neighbouring_levels() {
        let settings = GridSettings::DEFAULT;
        assert_eq!(
            exit_through(CellCoord::new(31, 7), settings),
            Some((1, CellCoord::new(1, 7)))
        );
        assert_eq!(
            exit_through(CellCoord::new(0, 7), settings),
            Some((-1, CellCoord::new(30, 7)))
        );
        assert_eq!(
            exit_through(CellCoord::new(5, 23), settings),
            Some((-3, CellCoord::new(5, 1)))
        );
        assert_eq!(
            exit_through(CellCoord::new(5, 0), settings),
            Some((3, CellCoord::new(5, 22)))
        );
        assert_eq!(exit_through(CellCoord::new(5, 5), settings), None);
    }

    #[test]
    fn empty_world_steps_without_a_level() {
        let mut scene = Scene::new(World::new(), 1);
        let events = scene.step(&InputSnapshot::new(), Duration::from_millis(16));
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. })));
        assert_eq!(scene.player(), None);
    }
}
