#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic enemy and ally AI that turns per-entity state machines into
//! movement and firing commands.

mod brains;

use std::{collections::BTreeMap, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{Command, EnemyTuning, EntityId, EntityView, Event, Faction, TileGridView};
use tracing::debug;

pub use brains::BrainMode;
use brains::{Brain, Senses};

/// Pure system driving chasers, axis-lock enemies, wanderers and allies.
#[derive(Debug)]
pub struct EnemyAi {
    tuning: EnemyTuning,
    rng: ChaCha8Rng,
    brains: BTreeMap<EntityId, Brain>,
}

impl EnemyAi {
    /// Creates the system with the provided tuning and random seed.
    #[must_use]
    pub fn new(tuning: EnemyTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            brains: BTreeMap::new(),
        }
    }

    /// Current state of the brain attached to the entity.
    #[must_use]
    pub fn mode(&self, entity: EntityId) -> Option<BrainMode> {
        self.brains.get(&entity).map(Brain::mode)
    }

    /// Consumes world events and immutable views to emit movement and firing
    /// commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        grid: &TileGridView<'_>,
        out: &mut Vec<Command>,
    ) {
        let Some(dt) = elapsed(events) else {
            return;
        };

        self.brains.retain(|id, _| entities.get(*id).is_some());

        let settings = grid.settings();
        let player = entities
            .player()
            .map(|snapshot| (snapshot.position.tile(), snapshot.position.point(&settings)));
        let Self {
            tuning,
            rng,
            brains,
        } = self;

        for snapshot in entities.iter() {
            if !brains.contains_key(&snapshot.id) {
                let Some(brain) = Brain::for_kind(snapshot.kind) else {
                    continue;
                };
                let _ = brains.insert(snapshot.id, brain);
            }
            let Some(brain) = brains.get_mut(&snapshot.id) else {
                continue;
            };

            let senses = Senses {
                me: snapshot.position.tile(),
                here: snapshot.position.point(&settings),
                player,
                dt: dt.as_secs_f32(),
                grid,
            };
            let before = brain.mode();
            let decision = brain.think(&senses, tuning, rng);
            let after = brain.mode();
            if before != after {
                debug!(entity = ?snapshot.id, ?before, ?after, "brain_mode_changed");
            }

            if let Some(intent) = decision.intent {
                out.push(Command::MoveEntity {
                    entity: snapshot.id,
                    intent,
                });
            }
            if let Some(target) = decision.fire_at {
                out.push(Command::LaunchProjectile {
                    origin: senses.me,
                    target,
                    owner: Faction::Enemy,
                    damage: tuning.projectile_damage,
                });
            }
        }
    }
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self::new(EnemyTuning::default(), 0)
    }
}

/// Total simulated time in the batch, or `None` when no tick happened.
fn elapsed(events: &[Event]) -> Option<Duration> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .reduce(Duration::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapfield_core::{
        CellCoord, EnemyKind, EntityKind, EntitySnapshot, GridSettings, PhysicsState, Position,
        TileCode,
    };

    fn snapshot(index: u32, kind: EntityKind, cell: CellCoord) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(index, 0),
            kind,
            position: Position::at(cell),
            hp: 100,
            physics: PhysicsState::Idle,
        }
    }

    #[test]
    fn ignores_batches_without_ticks() {
        let cells = vec![TileCode::EMPTY; GridSettings::DEFAULT.cell_count()];
        let grid = TileGridView::new(GridSettings::DEFAULT, &cells);
        let view = EntityView::from_snapshots(vec![
            snapshot(0, EntityKind::Player, CellCoord::new(4, 4)),
            snapshot(1, EntityKind::Enemy(EnemyKind::Chaser), CellCoord::new(6, 4)),
        ]);
        let mut system = EnemyAi::default();
        let mut out = Vec::new();

        system.handle(&[], &view, &grid, &mut out);

        assert!(out.is_empty());
        assert_eq!(system.mode(EntityId::new(1, 0)), None);
    }

    #[test]
    fn forgets_brains_of_vanished_entities() {
        let cells = vec![TileCode::EMPTY; GridSettings::DEFAULT.cell_count()];
        let grid = TileGridView::new(GridSettings::DEFAULT, &cells);
        let tick = [Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        }];
        let chaser = snapshot(1, EntityKind::Enemy(EnemyKind::Chaser), CellCoord::new(6, 4));
        let player = snapshot(0, EntityKind::Player, CellCoord::new(4, 4));
        let mut system = EnemyAi::default();
        let mut out = Vec::new();

        system.handle(
            &tick,
            &EntityView::from_snapshots(vec![player, chaser]),
            &grid,
            &mut out,
        );
        assert_eq!(system.mode(chaser.id), Some(BrainMode::Hunt));

        system.handle(&tick, &EntityView::from_snapshots(vec![player]), &grid, &mut out);
        assert_eq!(system.mode(chaser.id), None);
    }
}
