#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that resolves projectile hits, melee strikes, hazards, contact
//! damage and loot drops.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{
    Command, EnemyKind, EnemyTuning, EntityId, EntityKind, EntitySnapshot, EntityView, Event,
    Faction, GridSettings, InputSnapshot, ItemGrant, ItemId, MouseButton, PlayerTuning,
    ProjectileSnapshot, ProjectileTuning, TileCode, TileGridView, TilePoint, Tuning,
    WeaponProfile,
};
use tracing::{debug, info};

/// Distance in tiles that bounds both the cursor offset and the strike box of a melee swing.
const MELEE_REACH: f32 = 2.0;

/// Read-only state the combat system inspects each frame.
#[derive(Clone, Copy, Debug)]
pub struct CombatFrame<'a> {
    /// Active entities.
    pub entities: &'a EntityView,
    /// Projectiles in flight.
    pub projectiles: &'a [ProjectileSnapshot],
    /// Tiles of the current level.
    pub grid: TileGridView<'a>,
    /// Input sampled by the adapter for this frame.
    pub input: &'a InputSnapshot,
    /// Profile of the item in the selected hotbar slot.
    pub weapon: WeaponProfile,
    /// Whether the player is inside the invulnerability window.
    pub player_invulnerable: bool,
}

/// Combat system that turns proximity and input into damage and loot commands.
#[derive(Debug)]
pub struct Combat {
    projectile: ProjectileTuning,
    enemy: EnemyTuning,
    player: PlayerTuning,
    rng: ChaCha8Rng,
    primary_held: bool,
    scratch: Vec<Command>,
}

impl Combat {
    /// Creates a new combat system with the provided tuning and loot seed.
    #[must_use]
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        Self {
            projectile: tuning.projectile,
            enemy: tuning.enemy,
            player: tuning.player,
            rng: ChaCha8Rng::seed_from_u64(seed),
            primary_held: false,
            scratch: Vec::new(),
        }
    }

    /// Emits damage, deactivation and item grant commands for the frame.
    pub fn handle(&mut self, events: &[Event], frame: CombatFrame<'_>, out: &mut Vec<Command>) {
        self.scratch.clear();
        let settings = frame.grid.settings();

        self.drop_loot(events);
        self.resolve_hits(&frame, &settings);

        let primary = frame.input.mouse_button_down(MouseButton::Primary);
        let swung = primary && !self.primary_held;
        self.primary_held = primary;

        if let Some(player) = frame.entities.player() {
            let here = player.position.point(&settings);
            if swung && !frame.weapon.is_ranged() {
                self.melee(here, &frame, &settings);
            }
            self.hazard(player, &frame);
            if !frame.player_invulnerable {
                self.contact(player.id, here, &frame, &settings);
            }
        }

        if self.scratch.is_empty() {
            return;
        }
        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }

    fn drop_loot(&mut self, events: &[Event]) {
        for event in events {
            let Event::EntityKilled { entity, kind, .. } = event else {
                continue;
            };
            if let Some(grant) = loot_for(*kind, &mut self.rng) {
                info!(?entity, item = %grant.name, amount = grant.amount, "loot_dropped");
                self.scratch.push(Command::GrantItem { grant });
            }
        }
    }

    fn resolve_hits(&mut self, frame: &CombatFrame<'_>, settings: &GridSettings) {
        let targets: Vec<(EntityId, Faction, TilePoint)> = frame
            .entities
            .iter()
            .filter(|snapshot| is_hittable(snapshot.kind))
            .map(|snapshot| {
                (
                    snapshot.id,
                    snapshot.kind.faction(),
                    snapshot.position.point(settings),
                )
            })
            .collect();

        for projectile in frame.projectiles {
            let here = projectile.position.point(settings);
            let hit = targets.iter().find(|(_, faction, point)| {
                projectile.owner.opposes(*faction)
                    && here.within_box(*point, self.projectile.hit_half_extent)
            });
            if let Some((target, ..)) = hit {
                debug!(projectile = ?projectile.id, target = ?target, "projectile_hit");
                self.scratch.push(Command::Damage {
                    target: *target,
                    amount: projectile.damage,
                    source: projectile.owner,
                });
                self.scratch.push(Command::DeactivateEntity {
                    entity: projectile.id,
                });
            }
        }
    }

    fn melee(&mut self, player: TilePoint, frame: &CombatFrame<'_>, settings: &GridSettings) {
        let Some(cursor) = frame.input.mouse_position() else {
            return;
        };
        if cursor.distance(player) > MELEE_REACH {
            return;
        }
        for snapshot in frame.entities.iter() {
            if !matches!(snapshot.kind, EntityKind::Enemy(_) | EntityKind::Boss) {
                continue;
            }
            if snapshot.position.point(settings).within_box(cursor, MELEE_REACH) {
                self.scratch.push(Command::Damage {
                    target: snapshot.id,
                    amount: frame.weapon.damage,
                    source: Faction::Player,
                });
            }
        }
    }

    fn hazard(&mut self, player: &EntitySnapshot, frame: &CombatFrame<'_>) {
        if frame.grid.get(player.position.tile()) == Some(TileCode::ERUPT_ACTIVE) {
            self.scratch.push(Command::Damage {
                target: player.id,
                amount: self.player.hazard_damage,
                source: Faction::Environment,
            });
        }
    }

    fn contact(
        &mut self,
        player: EntityId,
        here: TilePoint,
        frame: &CombatFrame<'_>,
        settings: &GridSettings,
    ) {
        let touching = frame.entities.enemies().any(|(kind, snapshot)| {
            kind == EnemyKind::Chaser
                && snapshot
                    .position
                    .point(settings)
                    .within_box(here, self.enemy.contact_radius)
        });
        if touching {
            self.scratch.push(Command::Damage {
                target: player,
                amount: self.enemy.contact_damage,
                source: Faction::Enemy,
            });
        }
    }
}

fn is_hittable(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Player | EntityKind::Ally | EntityKind::Enemy(_) | EntityKind::Boss
    )
}

/// Items handed to the player when an entity of the provided kind dies.
fn loot_for<R: Rng>(kind: EntityKind, rng: &mut R) -> Option<ItemGrant> {
    let (name, id, amount, max) = match kind {
        EntityKind::Enemy(EnemyKind::Chaser) => ("metalparts", 13, rng.gen_range(1..=2), 10),
        EntityKind::Enemy(EnemyKind::AxisLock) => ("firepowder", 12, rng.gen_range(1..=2), 10),
        EntityKind::Enemy(EnemyKind::Cow) => ("oilcan", 15, 1, 1),
        EntityKind::Enemy(EnemyKind::Unicorn) => ("ironhorn", 14, 1, 10),
        EntityKind::Boss => ("ghensheart", 20, 1, 1),
        _ => return None,
    };
    Some(ItemGrant::new(name, ItemId::new(id), amount, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrapfield_core::{CellCoord, PhysicsState, Position};

    const PLAYER: EntityId = EntityId::new(0, 0);

    fn snapshot(index: u32, kind: EntityKind, cell: CellCoord) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId::new(index, 0),
            kind,
            position: Position::at(cell),
            hp: 100,
            physics: PhysicsState::Idle,
        }
    }

    fn projectile(index: u32, owner: Faction, cell: CellCoord) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: EntityId::new(index, 0),
            owner,
            position: Position::at(cell),
            origin: cell,
            target: cell.offset(5, 0),
            damage: 15,
        }
    }

    struct Scene {
        cells: Vec<TileCode>,
        view: EntityView,
        projectiles: Vec<ProjectileSnapshot>,
        input: InputSnapshot,
        weapon: WeaponProfile,
    }

    impl Scene {
        fn new(snapshots: Vec<EntitySnapshot>) -> Self {
            Self {
                cells: vec![TileCode::EMPTY; GridSettings::DEFAULT.cell_count()],
                view: EntityView::from_snapshots(snapshots),
                projectiles: Vec::new(),
                input: InputSnapshot::new(),
                weapon: WeaponProfile::for_item(ItemId::new(0)),
            }
        }

        fn run(&self, system: &mut Combat, events: &[Event], invulnerable: bool) -> Vec<Command> {
            let mut out = Vec::new();
            system.handle(
                events,
                CombatFrame {
                    entities: &self.view,
                    projectiles: &self.projectiles,
                    grid: TileGridView::new(GridSettings::DEFAULT, &self.cells),
                    input: &self.input,
                    weapon: self.weapon,
                    player_invulnerable: invulnerable,
                },
                &mut out,
            );
            out
        }
    }

    fn combat() -> Combat {
        Combat::new(&Tuning::default(), 1)
    }

    #[test]
    fn projectiles_only_hit_opposing_factions() {
        let mut scene = Scene::new(vec![
            snapshot(0, EntityKind::Player, CellCoord::new(2, 2)),
            snapshot(1, EntityKind::Enemy(EnemyKind::AxisLock), CellCoord::new(10, 10)),
        ]);
        scene.projectiles = vec![
            projectile(5, Faction::Enemy, CellCoord::new(10, 10)),
            projectile(6, Faction::Player, CellCoord::new(10, 10)),
        ];

        let out = scene.run(&mut combat(), &[], false);

        assert_eq!(
            out,
            vec![
                Command::Damage {
                    target: EntityId::new(1, 0),
                    amount: 15,
                    source: Faction::Player,
                },
                Command::DeactivateEntity {
                    entity: EntityId::new(6, 0),
                },
            ]
        );
    }

    #[test]
    fn melee_needs_a_fresh_click_near_the_player() {
        let target = EntityId::new(1, 0);
        let mut scene = Scene::new(vec![
            snapshot(0, EntityKind::Player, CellCoord::new(4, 4)),
            snapshot(1, EntityKind::Enemy(EnemyKind::Cow), CellCoord::new(6, 4)),
        ]);
        scene.weapon = WeaponProfile::for_item(ItemId::new(872));
        scene.input = InputSnapshot::new()
            .with_mouse(TilePoint::new(5.5, 4.5))
            .with_button_down(MouseButton::Primary);
        let mut system = combat();

        let first = scene.run(&mut system, &[], false);
        let held = scene.run(&mut system, &[], false);

        assert_eq!(
            first,
            vec![Command::Damage {
                target,
                amount: 20,
                source: Faction::Player,
            }]
        );
        assert!(held.is_empty());

        scene.input = InputSnapshot::new()
            .with_mouse(TilePoint::new(9.5, 4.5))
            .with_button_down(MouseButton::Primary);
        let mut distant = combat();
        assert!(scene.run(&mut distant, &[], false).is_empty());
    }

    #[test]
    fn ranged_weapons_do_not_swing() {
        let mut scene = Scene::new(vec![
            snapshot(0, EntityKind::Player, CellCoord::new(4, 4)),
            snapshot(1, EntityKind::Enemy(EnemyKind::Cow), CellCoord::new(5, 4)),
        ]);
        scene.weapon = WeaponProfile::for_item(ItemId::new(880));
        scene.input = InputSnapshot::new()
            .with_mouse(TilePoint::new(5.5, 4.5))
            .with_button_down(MouseButton::Primary);

        assert!(scene.run(&mut combat(), &[], false).is_empty());
    }

    #[test]
    fn chaser_contact_respects_invulnerability() {
        let scene = Scene::new(vec![
            snapshot(0, EntityKind::Player, CellCoord::new(4, 4)),
            snapshot(1, EntityKind::Enemy(EnemyKind::Chaser), CellCoord::new(6, 5)),
            snapshot(2, EntityKind::Enemy(EnemyKind::Cow), CellCoord::new(4, 5)),
        ]);
        let mut system = combat();

        assert_eq!(
            scene.run(&mut system, &[], false),
            vec![Command::Damage {
                target: PLAYER,
                amount: 10,
                source: Faction::Enemy,
            }]
        );
        assert!(scene.run(&mut system, &[], true).is_empty());
    }

    #[test]
    fn erupting_ground_burns_the_player() {
        let settings = GridSettings::DEFAULT;
        let cell = CellCoord::new(4, 4);
        let mut scene = Scene::new(vec![snapshot(0, EntityKind::Player, cell)]);
        scene.cells[(cell.row() * settings.columns + cell.column()) as usize] =
            TileCode::ERUPT_ACTIVE;

        assert_eq!(
            scene.run(&mut combat(), &[], false),
            vec![Command::Damage {
                target: PLAYER,
                amount: 10,
                source: Faction::Environment,
            }]
        );
    }

    #[test]
    fn kills_drop_their_loot() {
        let scene = Scene::new(Vec::new());
        let killed = |kind| Event::EntityKilled {
            entity: EntityId::new(3, 0),
            kind,
            cell: CellCoord::new(1, 1),
            by: Faction::Player,
        };
        let events = [
            killed(EntityKind::Enemy(EnemyKind::Chaser)),
            killed(EntityKind::Enemy(EnemyKind::Cow)),
            killed(EntityKind::Boss),
            killed(EntityKind::Spawner),
        ];

        let out = scene.run(&mut combat(), &events, false);

        let grants: Vec<(String, u32, u32)> = out
            .into_iter()
            .map(|command| match command {
                Command::GrantItem { grant } => (grant.name, grant.amount, grant.max),
                other => panic!("unexpected command {other:?}"),
            })
            .collect();
        assert_eq!(grants.len(), 3);
        assert_eq!(grants[0].0, "metalparts");
        assert!((1..=2).contains(&grants[0].1));
        assert_eq!(grants[1], ("oilcan".to_owned(), 1, 1));
        assert_eq!(grants[2], ("ghensheart".to_owned(), 1, 1));
    }
}
