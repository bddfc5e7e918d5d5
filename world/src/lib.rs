#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Scrapfield.
//!
//! The world owns the tile map of every level, the entity arena, the player's
//! inventory and the day clock. All mutation flows through [`apply`]; systems
//! observe the results through the emitted events and the [`query`] module.

mod crafting;
mod entities;
mod inventory;
pub mod kinematics;
mod map;
pub mod navigation;
mod physics;

use std::time::Duration;

use scrapfield_core::{
    AxisIntent, CellCoord, Command, EntityId, EntityKind, Event, Faction, InitializationError,
    ItemGrant, ItemId, LevelId, PhysicsState, PlacementError, Position, SoundId, TileCode, Tuning,
    WELCOME_BANNER,
};
use tracing::{debug, info, warn};

pub use crafting::{Recipe, RecipeBook};
pub use inventory::{
    Counter, Inventory, InventoryError, InventorySlot, FOOD, HEALTH, LIVES, WOODEN_BLOCK,
};

use entities::{Entity, EntityArena, Flight, Payload};
use kinematics::MovePolicy;
use map::LevelMap;

/// Seconds a freshly dropped pickup ignores the player.
const PICKUP_DELAY: f32 = 1.0;
/// Hit points of entities that cannot be hurt in practice.
const STRUCTURE_HP: i32 = 1;

/// Represents the authoritative Scrapfield world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tuning: Tuning,
    map: LevelMap,
    entities: EntityArena,
    player: Option<EntityId>,
    inventory: Inventory,
    recipes: RecipeBook,
    pending_shots: Vec<PendingShot>,
    clock: DayClock,
    kills: u32,
    summoned: u32,
    summon_request: Option<EntityId>,
    tick_index: u64,
}

#[derive(Clone, Copy, Debug)]
struct PendingShot {
    origin: CellCoord,
    target: CellCoord,
    owner: Faction,
    damage: i32,
    previous: TileCode,
}

#[derive(Clone, Copy, Debug)]
struct DayClock {
    hour: u32,
    elapsed: f32,
}

impl World {
    /// Creates a world using the shipped tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    /// Creates a world using the provided tuning.
    #[must_use]
    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            banner: WELCOME_BANNER,
            map: LevelMap::new(tuning.grid),
            entities: EntityArena::default(),
            player: None,
            inventory: Inventory::starting(),
            recipes: RecipeBook::standard(),
            pending_shots: Vec::new(),
            clock: DayClock {
                hour: tuning.scene.starting_hour % 24,
                elapsed: 0.0,
            },
            kills: 0,
            summoned: 0,
            summon_request: None,
            tick_index: 0,
            tuning,
        }
    }

    fn player_cell(&self) -> Option<CellCoord> {
        self.player
            .and_then(|id| self.entities.get(id))
            .filter(|entity| entity.active)
            .map(|entity| entity.position.tile())
    }

    fn spawn(&mut self, entity: Entity, out_events: &mut Vec<Event>) -> EntityId {
        let kind = entity.kind;
        let cell = entity.position.tile();
        let id = self.entities.insert(entity);
        debug!(?kind, column = cell.column(), row = cell.row(), "entity_spawned");
        out_events.push(Event::EntitySpawned {
            entity: id,
            kind,
            cell,
        });
        id
    }

    fn spawn_pickup(&mut self, cell: CellCoord, grant: ItemGrant, out_events: &mut Vec<Event>) {
        let pickup = Entity::new(EntityKind::Pickup, cell, STRUCTURE_HP, 0)
            .with_payload(Payload::Pickup(grant))
            .with_cooldown(PICKUP_DELAY);
        let _ = self.spawn(pickup, out_events);
    }

    fn deactivate(&mut self, id: EntityId, out_events: &mut Vec<Event>) {
        if let Some(entity) = self.entities.get_mut(id) {
            if entity.active {
                entity.active = false;
                out_events.push(Event::EntityDeactivated { entity: id });
            }
        }
    }

    fn relocate(&mut self, id: EntityId, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Some(entity) = self.entities.get_mut(id) {
            let from = entity.position;
            entity.position = Position::at(cell);
            entity.body.set_state(PhysicsState::Idle);
            if from != entity.position {
                out_events.push(Event::EntityMoved {
                    entity: id,
                    from,
                    to: entity.position,
                });
            }
        }
    }

    fn enter_level(
        &mut self,
        level: LevelId,
        arrival: Option<CellCoord>,
        out_events: &mut Vec<Event>,
    ) -> Result<EntityId, InitializationError> {
        let view = self
            .map
            .view_of(level)
            .ok_or(InitializationError::UnknownLevel { level: level.get() })?;
        let marker = view.find_first(TileCode::PLAYER_START);
        let start = arrival
            .or(marker)
            .ok_or(InitializationError::MissingPlayerStart { level: level.get() })?;
        self.map.enter(level)?;

        for id in self.entities.ids_where(|entity| entity.kind.is_level_bound()) {
            self.deactivate(id, out_events);
        }
        self.pending_shots.clear();
        if let Some(cell) = marker {
            let _ = self.map.set(cell, TileCode::EMPTY);
        }

        let existing = self
            .player
            .filter(|id| self.entities.get(*id).map_or(false, |entity| entity.active));
        let player = match existing {
            Some(id) => {
                self.relocate(id, start, out_events);
                id
            }
            None => {
                let hp = self.inventory.count(HEALTH) as i32;
                let speed = self.tuning.player.speed;
                self.spawn(Entity::new(EntityKind::Player, start, hp, speed), out_events)
            }
        };
        self.player = Some(player);

        for ally in self.entities.ids_where(|entity| entity.kind == EntityKind::Ally) {
            self.relocate(ally, start, out_events);
        }

        let speed = self.tuning.enemy.speed;
        for cell in self.map.cells_with(TileCode::BOSS_START) {
            let _ = self.map.set(cell, TileCode::EMPTY);
            let hp = self.tuning.boss.hp;
            let _ = self.spawn(Entity::new(EntityKind::Boss, cell, hp, speed), out_events);
        }
        for kind in scrapfield_core::EnemyKind::ALL {
            for cell in self.map.cells_with(kind.marker()) {
                let _ = self.map.set(cell, TileCode::EMPTY);
                let hp = self.tuning.enemy.hp;
                let entity = Entity::new(EntityKind::Enemy(kind), cell, hp, speed);
                let _ = self.spawn(entity, out_events);
            }
        }
        for cell in self.map.cells_with(TileCode::SPAWNER) {
            let _ = self.map.set(cell, TileCode::EMPTY);
            let spawner = Entity::new(EntityKind::Spawner, cell, STRUCTURE_HP, 0);
            let _ = self.spawn(spawner, out_events);
        }

        info!(level = level.get(), "level_entered");
        out_events.push(Event::LevelEntered { level, player });
        Ok(player)
    }

    fn move_entity(&mut self, id: EntityId, intent: AxisIntent, out_events: &mut Vec<Event>) {
        let grid = self.map.view();
        let Some(entity) = self.entities.get_mut(id).filter(|entity| entity.active) else {
            return;
        };
        let policy = match entity.kind {
            EntityKind::Player => MovePolicy::PLAYER,
            EntityKind::Projectile(_) => MovePolicy::PROJECTILE,
            _ => MovePolicy::WALKER,
        };

        let from = entity.position;
        let outcome = kinematics::step(from, intent, entity.speed, &policy, &grid);
        entity.position = outcome.position;
        if from != outcome.position {
            out_events.push(Event::EntityMoved {
                entity: id,
                from,
                to: outcome.position,
            });
        }
        for direction in outcome.blocked() {
            out_events.push(Event::MoveBlocked {
                entity: id,
                direction,
            });
        }
        if outcome.deactivated {
            entity.active = false;
            out_events.push(Event::EntityDeactivated { entity: id });
        }
    }

    fn step_physics(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        let grid = self.map.view();
        let airborne = self
            .entities
            .ids_where(|entity| entity.body.state() != PhysicsState::Idle);
        for id in airborne {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let from = entity.position;
            let before = entity.body.state();
            entity.position = physics::step_vertical(&mut entity.body, from, seconds, &grid);
            if from != entity.position {
                out_events.push(Event::EntityMoved {
                    entity: id,
                    from,
                    to: entity.position,
                });
            }
            let after = entity.body.state();
            if before != after {
                out_events.push(Event::PhysicsChanged {
                    entity: id,
                    state: after,
                });
            }
        }
    }

    fn grant(&mut self, grant: &ItemGrant, out_events: &mut Vec<Event>) {
        let outcome = self.inventory.add_item(grant);
        if outcome.stored > 0 {
            out_events.push(Event::ItemAdded {
                name: grant.name.clone(),
                amount: outcome.stored,
            });
        }
        if outcome.overflow > 0 {
            debug!(item = %grant.name, amount = outcome.overflow, "inventory_overflow");
            out_events.push(Event::ItemOverflowed {
                name: grant.name.clone(),
                amount: outcome.overflow,
            });
            if let Some(cell) = self.player_cell() {
                let dropped = ItemGrant::new(grant.name.clone(), grant.id, outcome.overflow, grant.max);
                self.spawn_pickup(cell, dropped, out_events);
            }
        }
    }

    fn damage(
        &mut self,
        target: EntityId,
        amount: i32,
        source: Faction,
        out_events: &mut Vec<Event>,
    ) {
        let Some(entity) = self.entities.get_mut(target).filter(|entity| entity.active) else {
            return;
        };
        if !source.opposes(entity.kind.faction()) {
            return;
        }
        if entity.kind == EntityKind::Player {
            self.damage_player(amount, true, out_events);
            return;
        }

        entity.hp -= amount;
        out_events.push(Event::EntityDamaged {
            entity: target,
            amount,
            remaining: entity.hp,
        });
        out_events.push(Event::SoundTriggered { sound: SoundId::Hit });
        if entity.hp > 0 {
            return;
        }

        entity.active = false;
        let kind = entity.kind;
        let cell = entity.position.tile();
        if let EntityKind::Enemy(enemy) = kind {
            if enemy.counts_as_kill() {
                self.kills += 1;
            }
        }
        info!(?kind, kills = self.kills, "entity_killed");
        out_events.push(Event::EntityKilled {
            entity: target,
            kind,
            cell,
            by: source,
        });
        out_events.push(Event::EntityDeactivated { entity: target });
        out_events.push(Event::SoundTriggered {
            sound: SoundId::EnemyDeath,
        });
    }

    /// Removes health from the player; gated damage respects and restarts
    /// the invulnerability window.
    fn damage_player(&mut self, amount: i32, gated: bool, out_events: &mut Vec<Event>) {
        let Some(id) = self.player else {
            return;
        };
        let Some(entity) = self.entities.get_mut(id).filter(|entity| entity.active) else {
            return;
        };
        if gated {
            if entity.cooldown > 0.0 {
                out_events.push(Event::DamageIgnored { entity: id });
                return;
            }
            entity.cooldown = self.tuning.player.iframe_seconds;
        }

        let remaining = self.inventory.adjust_counter(HEALTH, -i64::from(amount)) as i32;
        entity.hp = remaining;
        out_events.push(Event::EntityDamaged {
            entity: id,
            amount,
            remaining,
        });
        out_events.push(Event::SoundTriggered {
            sound: SoundId::PlayerHurt,
        });
        if remaining > 0 {
            return;
        }

        let lives = self.inventory.adjust_counter(LIVES, -1);
        out_events.push(Event::PlayerLifeLost { lives });
        if lives == 0 {
            warn!("player_defeated");
            out_events.push(Event::PlayerDefeated);
            return;
        }
        let restored = self
            .inventory
            .counter(HEALTH)
            .map_or(0, |counter| counter.max());
        self.inventory.set_counter(HEALTH, restored, restored);
        entity.hp = restored as i32;
        info!(lives, "player_life_lost");
    }

    fn advance_clock(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let per_hour = self.tuning.scene.seconds_per_hour;
        if per_hour <= 0.0 {
            return;
        }
        self.clock.elapsed += seconds;
        while self.clock.elapsed >= per_hour {
            self.clock.elapsed -= per_hour;
            self.clock.hour = (self.clock.hour + 1) % 24;
            out_events.push(Event::HourElapsed {
                hour: self.clock.hour,
            });

            if self.inventory.count(FOOD) > 0 {
                let _ = self.inventory.adjust_counter(FOOD, -1);
                out_events.push(Event::ItemRemoved {
                    name: FOOD.to_owned(),
                    amount: 1,
                });
            } else {
                let damage = self.tuning.player.starvation_damage;
                self.damage_player(damage, false, out_events);
            }
        }
    }

    fn queue_shot(&mut self, shot: PendingShot, out_events: &mut Vec<Event>) {
        let existing = self
            .pending_shots
            .iter()
            .find(|pending| pending.origin == shot.origin)
            .map(|pending| pending.previous);
        let Some(replaced) = self.map.set(shot.origin, TileCode::PROJECTILE_MARKER) else {
            return;
        };
        let previous = existing.unwrap_or(replaced);
        if replaced != TileCode::PROJECTILE_MARKER {
            out_events.push(Event::TileChanged {
                cell: shot.origin,
                previous: replaced,
                code: TileCode::PROJECTILE_MARKER,
            });
        }
        self.pending_shots.push(PendingShot { previous, ..shot });
    }

    fn step_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let shots: Vec<PendingShot> = self.pending_shots.drain(..).collect();
        for shot in shots {
            if self.map.get(shot.origin) == Some(TileCode::PROJECTILE_MARKER) {
                let _ = self.map.set(shot.origin, shot.previous);
                out_events.push(Event::TileChanged {
                    cell: shot.origin,
                    previous: TileCode::PROJECTILE_MARKER,
                    code: shot.previous,
                });
            }
            let flight = Flight::aimed(
                shot.origin,
                shot.target,
                self.tuning.projectile.speed,
                shot.damage,
            );
            if flight.is_stationary() {
                continue;
            }
            let projectile = Entity::new(EntityKind::Projectile(shot.owner), shot.origin, STRUCTURE_HP, 0)
                .with_payload(Payload::Projectile(flight));
            let id = self.entities.insert(projectile);
            out_events.push(Event::ProjectileLaunched {
                entity: id,
                owner: shot.owner,
                origin: shot.origin,
                target: shot.target,
            });
            out_events.push(Event::SoundTriggered {
                sound: SoundId::Shoot,
            });
        }

        let grid = self.map.view();
        let flying = self
            .entities
            .ids_where(|entity| matches!(entity.kind, EntityKind::Projectile(_)));
        for id in flying {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let Payload::Projectile(flight) = &mut entity.payload else {
                continue;
            };
            let (dx, dy) = flight.advance();

            let from = entity.position;
            let mut position = from;
            let mut spent = false;
            for (intent, speed) in [
                (AxisIntent::new(dx, 0), dx.abs()),
                (AxisIntent::new(0, dy), dy.abs()),
            ] {
                if speed == 0 {
                    continue;
                }
                let outcome =
                    kinematics::step(position, intent, speed, &MovePolicy::PROJECTILE, &grid);
                position = outcome.position;
                if outcome.deactivated {
                    spent = true;
                    break;
                }
            }

            entity.position = position;
            if from != position {
                out_events.push(Event::EntityMoved {
                    entity: id,
                    from,
                    to: position,
                });
            }
            if spent {
                entity.active = false;
                out_events.push(Event::EntityDeactivated { entity: id });
            }
        }
    }

    fn place_block(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let reject = |reason| Event::PlacementRejected { cell, reason };
        if !self.map.settings().contains(cell) {
            out_events.push(reject(PlacementError::OutOfBounds));
            return;
        }
        if self.map.get(cell) != Some(TileCode::EMPTY) {
            out_events.push(reject(PlacementError::Occupied));
            return;
        }
        let slot = self.inventory.selected_slot();
        if slot.is_empty() || !slot.name().to_lowercase().contains("block") {
            out_events.push(reject(PlacementError::NotABlock));
            return;
        }

        let code = slot.id().as_tile();
        let selected = self.inventory.selected();
        let Ok(placed) = self.inventory.remove_from_slot(selected, 1) else {
            return;
        };
        if let Some(previous) = self.map.set(cell, code) {
            out_events.push(Event::TileChanged {
                cell,
                previous,
                code,
            });
        }
        out_events.push(Event::ItemRemoved {
            name: placed.name,
            amount: placed.amount,
        });
        out_events.push(Event::SoundTriggered {
            sound: SoundId::BlockPlaced,
        });
    }

    fn break_tile(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.map.get(cell) != Some(TileCode::WOODEN_BLOCK) {
            return;
        }
        if let Some(previous) = self.map.set(cell, TileCode::EMPTY) {
            out_events.push(Event::TileChanged {
                cell,
                previous,
                code: TileCode::EMPTY,
            });
        }
        out_events.push(Event::SoundTriggered {
            sound: SoundId::BlockBroken,
        });
        let block = ItemGrant::new(WOODEN_BLOCK, ItemId::new(100), 1, 999);
        self.grant(&block, out_events);
    }

    fn drop_selected(&mut self, out_events: &mut Vec<Event>) {
        let Some(cell) = self.player_cell() else {
            return;
        };
        let selected = self.inventory.selected();
        match self.inventory.remove_from_slot(selected, 1) {
            Ok(dropped) => {
                out_events.push(Event::ItemRemoved {
                    name: dropped.name.clone(),
                    amount: dropped.amount,
                });
                self.spawn_pickup(cell, dropped, out_events);
            }
            Err(error) => debug!(%error, "drop_ignored"),
        }
    }

    fn craft(&mut self, recipe: scrapfield_core::RecipeId, out_events: &mut Vec<Event>) {
        let consumed: Vec<(String, u32)> = self
            .recipes
            .get(recipe)
            .map(|entry| entry.ingredients().to_vec())
            .unwrap_or_default();
        match self.recipes.craft(&mut self.inventory, recipe) {
            Ok((item, outcome)) => {
                for (name, amount) in consumed {
                    out_events.push(Event::ItemRemoved { name, amount });
                }
                info!(item = %item.name, "crafted");
                out_events.push(Event::Crafted {
                    recipe,
                    item: item.name.clone(),
                });
                if outcome.stored > 0 {
                    out_events.push(Event::ItemAdded {
                        name: item.name.clone(),
                        amount: outcome.stored,
                    });
                }
                if outcome.overflow > 0 {
                    out_events.push(Event::ItemOverflowed {
                        name: item.name.clone(),
                        amount: outcome.overflow,
                    });
                    if let Some(cell) = self.player_cell() {
                        let dropped = ItemGrant { amount: outcome.overflow, ..item };
                        self.spawn_pickup(cell, dropped, out_events);
                    }
                }
                out_events.push(Event::SoundTriggered {
                    sound: SoundId::Craft,
                });
            }
            Err(error) => {
                debug!(%error, "craft_rejected");
                out_events.push(Event::CraftRejected { recipe, error });
            }
        }
    }

    fn collect_pickups(&mut self, out_events: &mut Vec<Event>) {
        let Some(cell) = self.player_cell() else {
            return;
        };
        let ready = self.entities.ids_where(|entity| {
            entity.kind == EntityKind::Pickup
                && entity.cooldown <= 0.0
                && entity.position.tile() == cell
        });
        for id in ready {
            let grant = match self.entities.get(id).map(|entity| &entity.payload) {
                Some(Payload::Pickup(grant)) => grant.clone(),
                _ => continue,
            };
            if !self.inventory.has_room_for(&grant) {
                continue;
            }
            self.grant(&grant, out_events);
            self.deactivate(id, out_events);
            out_events.push(Event::PickupCollected {
                entity: id,
                item: grant.name,
            });
            out_events.push(Event::SoundTriggered {
                sound: SoundId::Pickup,
            });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { settings } => {
            world.tuning.grid = settings;
            world.map = LevelMap::new(settings);
            world.entities = EntityArena::default();
            world.player = None;
            world.pending_shots.clear();
            out_events.push(Event::GridConfigured { settings });
        }
        Command::LoadLevel { level, tiles } => match world.map.load(level, tiles) {
            Ok(()) => out_events.push(Event::LevelLoaded { level }),
            Err(error) => {
                warn!(level = level.get(), %error, "level_rejected");
                out_events.push(Event::LevelRejected { level, error });
            }
        },
        Command::EnterLevel { level, arrival } => {
            if let Err(error) = world.enter_level(level, arrival, out_events) {
                warn!(level = level.get(), %error, "level_rejected");
                out_events.push(Event::LevelRejected { level, error });
            }
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            let seconds = dt.as_secs_f32();
            for entity in world.entities.iter_mut() {
                entity.cooldown = (entity.cooldown - seconds).max(0.0);
            }
            world.advance_clock(seconds, out_events);
        }
        Command::MoveEntity { entity, intent } => world.move_entity(entity, intent, out_events),
        Command::Jump { entity } => {
            let velocity = world.tuning.player.jump_velocity;
            if let Some(body) = world
                .entities
                .get_mut(entity)
                .filter(|candidate| candidate.active)
                .map(|candidate| &mut candidate.body)
            {
                if body.state() == PhysicsState::Idle {
                    body.launch(velocity);
                    out_events.push(Event::PhysicsChanged {
                        entity,
                        state: PhysicsState::Jump,
                    });
                }
            }
        }
        Command::StepPhysics { dt } => world.step_physics(dt, out_events),
        Command::SetTile { cell, code } => {
            if let Some(previous) = world.map.set(cell, code) {
                if previous != code {
                    out_events.push(Event::TileChanged {
                        cell,
                        previous,
                        code,
                    });
                }
            }
        }
        Command::BreakTile { cell } => world.break_tile(cell, out_events),
        Command::PlaceBlock { cell } => world.place_block(cell, out_events),
        Command::SelectSlot { slot } => match world.inventory.select_slot(slot) {
            Ok(()) => out_events.push(Event::SlotSelected { slot }),
            Err(error) => debug!(%error, "slot_selection_ignored"),
        },
        Command::SwapSlots { first, second } => {
            if let Err(error) = world.inventory.swap_slots(first, second) {
                debug!(%error, "slot_swap_ignored");
            }
        }
        Command::DropSelected => world.drop_selected(out_events),
        Command::GrantItem { grant } => world.grant(&grant, out_events),
        Command::Craft { recipe } => world.craft(recipe, out_events),
        Command::SpawnEnemy { kind, cell } => {
            if world.map.settings().contains(cell) {
                let hp = world.tuning.enemy.hp;
                let speed = world.tuning.enemy.speed;
                let entity = Entity::new(EntityKind::Enemy(kind), cell, hp, speed);
                let _ = world.spawn(entity, out_events);
            }
        }
        Command::SpawnAlly { cell } => {
            if world.map.settings().contains(cell) {
                let speed = world.tuning.enemy.speed;
                let hp = world.tuning.enemy.hp;
                let _ = world.spawn(Entity::new(EntityKind::Ally, cell, hp, speed), out_events);
            }
        }
        Command::SpawnPickup { cell, grant } => {
            if world.map.settings().contains(cell) {
                world.spawn_pickup(cell, grant, out_events);
            }
        }
        Command::LaunchProjectile {
            origin,
            target,
            owner,
            damage,
        } => world.queue_shot(
            PendingShot {
                origin,
                target,
                owner,
                damage,
                previous: TileCode::EMPTY,
            },
            out_events,
        ),
        Command::StepProjectiles => world.step_projectiles(out_events),
        Command::Damage {
            target,
            amount,
            source,
        } => world.damage(target, amount, source, out_events),
        Command::DeactivateEntity { entity } => world.deactivate(entity, out_events),
        Command::Teleport { entity, cell } => {
            if world.map.settings().contains(cell) {
                world.relocate(entity, cell, out_events);
            }
        }
        Command::RequestSummon { boss } => {
            if world.summon_request.is_none() {
                world.summon_request = Some(boss);
                out_events.push(Event::SummonRequested { boss });
            }
        }
        Command::CompleteSummon { placed } => {
            if world.summon_request.take().is_some() {
                if placed {
                    world.summoned += 1;
                }
                out_events.push(Event::SummonCompleted { placed });
            }
        }
        Command::CollectPickups => world.collect_pickups(out_events),
        Command::CollectGarbage => {
            let freed = world.entities.collect_garbage();
            if freed > 0 {
                debug!(freed, "entities_collected");
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use scrapfield_core::{
        CellCoord, CraftError, EntitySnapshot, EntityView, GridSettings, LevelId,
        ProjectileSnapshot, RecipeId, TileCode, TileGridView, Tuning,
    };

    use super::{EntityId, EntityKind, Inventory, Payload, RecipeBook, World, HEALTH};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Grid dimensions shared by every level.
    #[must_use]
    pub fn grid_settings(world: &World) -> GridSettings {
        world.map.settings()
    }

    /// Level the player currently occupies.
    #[must_use]
    pub fn current_level(world: &World) -> Option<LevelId> {
        world.map.current()
    }

    /// Reports whether a layout has been loaded for the level.
    #[must_use]
    pub fn level_loaded(world: &World, level: LevelId) -> bool {
        world.map.view_of(level).is_some()
    }

    /// Read-only view over the tiles of the current level.
    #[must_use]
    pub fn tile_grid(world: &World) -> TileGridView<'_> {
        world.map.view()
    }

    /// Code stored at the cell of the current level.
    #[must_use]
    pub fn tile(world: &World, cell: CellCoord) -> Option<TileCode> {
        world.map.get(cell)
    }

    /// Captures a read-only view of every active entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        let health = world.inventory.count(HEALTH) as i32;
        let snapshots = world
            .entities
            .iter()
            .map(|(id, entity)| EntitySnapshot {
                id,
                kind: entity.kind,
                position: entity.position,
                hp: if entity.kind == EntityKind::Player {
                    health
                } else {
                    entity.hp
                },
                physics: entity.body.state(),
            })
            .collect();
        EntityView::from_snapshots(snapshots)
    }

    /// Identifier of the player entity, once a level has been entered.
    #[must_use]
    pub fn player(world: &World) -> Option<EntityId> {
        world.player
    }

    /// Reports whether the player is currently invulnerable.
    #[must_use]
    pub fn player_invulnerable(world: &World) -> bool {
        world
            .player
            .and_then(|id| world.entities.get(id))
            .map_or(false, |entity| entity.cooldown > 0.0)
    }

    /// Snapshots of every projectile in flight, ordered by handle.
    #[must_use]
    pub fn projectile_view(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .entities
            .iter()
            .filter_map(|(id, entity)| match (&entity.kind, &entity.payload) {
                (EntityKind::Projectile(owner), Payload::Projectile(flight)) => {
                    Some(ProjectileSnapshot {
                        id,
                        owner: *owner,
                        position: entity.position,
                        origin: flight.origin,
                        target: flight.target,
                        damage: flight.damage,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Number of projectile launches awaiting the next projectile pass.
    #[must_use]
    pub fn pending_projectiles(world: &World) -> usize {
        world.pending_shots.len()
    }

    /// Read-only access to the player's inventory.
    #[must_use]
    pub fn inventory(world: &World) -> &Inventory {
        &world.inventory
    }

    /// Recipes available for crafting.
    #[must_use]
    pub fn recipes(world: &World) -> &RecipeBook {
        &world.recipes
    }

    /// Checks whether the recipe can be crafted right now.
    pub fn craftable(world: &World, recipe: RecipeId) -> Result<(), CraftError> {
        world
            .recipes
            .craftable(&world.inventory, recipe)
            .map(|_| ())
    }

    /// Hour of the in-game day in `0..24`.
    #[must_use]
    pub fn hour(world: &World) -> u32 {
        world.clock.hour
    }

    /// Reports whether the in-game clock shows night.
    #[must_use]
    pub fn is_night(world: &World) -> bool {
        let hour = world.clock.hour;
        hour >= 18 || hour <= 6
    }

    /// Enemies killed that count toward the tally.
    #[must_use]
    pub fn kills(world: &World) -> u32 {
        world.kills
    }

    /// Minions placed in answer to summon requests.
    #[must_use]
    pub fn summoned(world: &World) -> u32 {
        world.summoned
    }

    /// Boss waiting for its summon request to be acknowledged.
    #[must_use]
    pub fn summon_request(world: &World) -> Option<EntityId> {
        world.summon_request
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
