//! Generational arena storing every simulated entity.

use glam::Vec2;
use scrapfield_core::{CellCoord, EntityId, EntityKind, ItemGrant, Position};

use crate::physics::PhysicsBody;

/// Flight state of a projectile.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Flight {
    pub(crate) origin: CellCoord,
    pub(crate) target: CellCoord,
    /// Microsteps travelled per tick along each axis.
    pub(crate) velocity: Vec2,
    /// Fractional microsteps not yet handed to the mover.
    pub(crate) carry: Vec2,
    pub(crate) damage: i32,
}

impl Flight {
    /// Creates a flight aimed from `origin` at `target`; the direction is
    /// fixed at launch.
    pub(crate) fn aimed(origin: CellCoord, target: CellCoord, speed: f32, damage: i32) -> Self {
        let delta = Vec2::new(
            (target.column() - origin.column()) as f32,
            (target.row() - origin.row()) as f32,
        );
        Self {
            origin,
            target,
            velocity: delta.normalize_or_zero() * speed,
            carry: Vec2::ZERO,
            damage,
        }
    }

    pub(crate) fn is_stationary(&self) -> bool {
        self.velocity == Vec2::ZERO
    }

    /// Accumulates one tick of travel and returns the whole microsteps to
    /// apply on each axis.
    pub(crate) fn advance(&mut self) -> (i32, i32) {
        self.carry += self.velocity;
        let whole = self.carry.trunc();
        self.carry -= whole;
        (whole.x as i32, whole.y as i32)
    }
}

/// Kind-specific data carried by an entity.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Payload {
    None,
    Projectile(Flight),
    Pickup(ItemGrant),
}

/// Authoritative state of a single entity.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) kind: EntityKind,
    pub(crate) position: Position,
    pub(crate) hp: i32,
    pub(crate) speed: i32,
    pub(crate) active: bool,
    /// Seconds of remaining invulnerability, or of collection delay for
    /// pickups.
    pub(crate) cooldown: f32,
    pub(crate) body: PhysicsBody,
    pub(crate) payload: Payload,
}

impl Entity {
    pub(crate) fn new(kind: EntityKind, cell: CellCoord, hp: i32, speed: i32) -> Self {
        Self {
            kind,
            position: Position::at(cell),
            hp,
            speed,
            active: true,
            cooldown: 0.0,
            body: PhysicsBody::default(),
            payload: Payload::None,
        }
    }

    pub(crate) fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub(crate) fn with_cooldown(mut self, seconds: f32) -> Self {
        self.cooldown = seconds;
        self
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    entity: Option<Entity>,
}

/// Slot map handing out generational identifiers.
#[derive(Clone, Debug, Default)]
pub(crate) struct EntityArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl EntityArena {
    /// Stores the entity in the lowest free slot.
    pub(crate) fn insert(&mut self, entity: Entity) -> EntityId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entity = Some(entity);
            return EntityId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entity: Some(entity),
        });
        EntityId::new(index, 0)
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entity.as_mut())
    }

    /// Active entities in slot order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entity
                .as_ref()
                .filter(|entity| entity.active)
                .map(|entity| (EntityId::new(index as u32, slot.generation), entity))
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.entity.as_mut())
            .filter(|entity| entity.active)
    }

    /// Identifiers of active entities matching the predicate.
    pub(crate) fn ids_where<F>(&self, mut predicate: F) -> Vec<EntityId>
    where
        F: FnMut(&Entity) -> bool,
    {
        self.iter()
            .filter(|(_, entity)| predicate(entity))
            .map(|(id, _)| id)
            .collect()
    }

    /// Frees every inactive slot, bumping its generation so stale handles
    /// stop resolving. Returns the number of freed slots.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let mut freed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            let inactive = slot.entity.as_ref().map_or(false, |entity| !entity.active);
            if inactive {
                slot.entity = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                freed += 1;
            }
        }
        self.free.sort_unstable_by(|a, b| b.cmp(a));
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapfield_core::EnemyKind;

    fn enemy(column: i32) -> Entity {
        Entity::new(
            EntityKind::Enemy(EnemyKind::Chaser),
            CellCoord::new(column, 0),
            100,
            1,
        )
    }

    #[test]
    fn stale_handles_stop_resolving_after_collection() {
        let mut arena = EntityArena::default();
        let first = arena.insert(enemy(1));
        let _second = arena.insert(enemy(2));

        arena.get_mut(first).expect("first").active = false;
        assert_eq!(arena.collect_garbage(), 1);
        let reused = arena.insert(enemy(3));

        assert_eq!(reused.index(), first.index());
        assert_ne!(reused.generation(), first.generation());
        assert!(arena.get(first).is_none());
        assert_eq!(
            arena.get(reused).map(|entity| entity.position.tile()),
            Some(CellCoord::new(3, 0))
        );
    }

    #[test]
    fn inactive_entities_are_hidden_from_iteration() {
        let mut arena = EntityArena::default();
        let first = arena.insert(enemy(1));
        let second = arena.insert(enemy(2));
        arena.get_mut(first).expect("first").active = false;

        let ids: Vec<EntityId> = arena.iter().map(|(id, _)| id).collect();

        assert_eq!(ids, vec![second]);
    }

    #[test]
    fn freed_slots_are_reused_lowest_first() {
        let mut arena = EntityArena::default();
        let ids: Vec<EntityId> = (0..4).map(|column| arena.insert(enemy(column))).collect();
        for id in &ids[1..3] {
            arena.get_mut(*id).expect("entity").active = false;
        }
        let _ = arena.collect_garbage();

        assert_eq!(arena.insert(enemy(9)).index(), 1);
        assert_eq!(arena.insert(enemy(9)).index(), 2);
        assert_eq!(arena.insert(enemy(9)).index(), 4);
    }

    #[test]
    fn flight_releases_whole_microsteps() {
        let mut flight = Flight::aimed(CellCoord::new(0, 0), CellCoord::new(0, 4), 2.5, 10);
        let mut total = (0, 0);
        for _ in 0..10 {
            let (x, y) = flight.advance();
            total = (total.0 + x, total.1 + y);
        }

        assert_eq!(total, (0, 25));
        assert_eq!(flight.carry, Vec2::ZERO);
    }
}
