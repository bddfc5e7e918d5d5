#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Scrapfield simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod tuning;

pub use tuning::{
    BossTuning, EnemyTuning, PlayerTuning, ProjectileTuning, SceneTuning, Tuning,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Scrapfield.";

/// Number of hotbar slots directly selectable with the number keys.
pub const HOTBAR_SLOTS: usize = 9;

/// Total number of inventory slots including extended storage.
pub const INVENTORY_SLOTS: usize = 27;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the grid dimensions and discards every loaded level.
    ConfigureGrid {
        /// Dimensions and microstep resolution applied to all levels.
        settings: GridSettings,
    },
    /// Registers the tile layout of a level.
    LoadLevel {
        /// Identifier under which the layout is stored.
        level: LevelId,
        /// Row-major tile codes, row zero at the bottom of the map.
        tiles: Vec<TileCode>,
    },
    /// Makes the provided level current and instantiates its markers.
    EnterLevel {
        /// Level that should become current.
        level: LevelId,
        /// Cell the player arrives at when crossing from a neighbouring level.
        arrival: Option<CellCoord>,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an entity take one mover step along the provided intent.
    MoveEntity {
        /// Entity attempting to move.
        entity: EntityId,
        /// Intended direction for each axis.
        intent: AxisIntent,
    },
    /// Requests that a grounded entity start a jump.
    Jump {
        /// Entity that should leave the ground.
        entity: EntityId,
    },
    /// Integrates vertical physics for every airborne entity.
    StepPhysics {
        /// Duration of simulated time to integrate.
        dt: Duration,
    },
    /// Overwrites a tile in the current level.
    SetTile {
        /// Cell that receives the new code.
        cell: CellCoord,
        /// Code written into the cell.
        code: TileCode,
    },
    /// Breaks a breakable block and credits the player with it.
    BreakTile {
        /// Cell holding the block.
        cell: CellCoord,
    },
    /// Places the block held in the selected hotbar slot.
    PlaceBlock {
        /// Empty cell that receives the block.
        cell: CellCoord,
    },
    /// Selects the hotbar slot at the provided zero-based index.
    SelectSlot {
        /// Zero-based hotbar index.
        slot: usize,
    },
    /// Exchanges the contents of two inventory slots.
    SwapSlots {
        /// First slot index.
        first: usize,
        /// Second slot index.
        second: usize,
    },
    /// Drops one unit of the selected slot at the player's cell.
    DropSelected,
    /// Adds items to the player's inventory.
    GrantItem {
        /// Items being granted.
        grant: ItemGrant,
    },
    /// Consumes recipe ingredients to produce one result unit.
    Craft {
        /// Recipe to craft.
        recipe: RecipeId,
    },
    /// Creates an enemy at the provided cell.
    SpawnEnemy {
        /// Behaviour family of the enemy.
        kind: EnemyKind,
        /// Cell the enemy occupies after spawning.
        cell: CellCoord,
    },
    /// Creates a companion that follows the player.
    SpawnAlly {
        /// Cell the ally occupies after spawning.
        cell: CellCoord,
    },
    /// Creates a pickup carrying the provided items.
    SpawnPickup {
        /// Cell the pickup rests on.
        cell: CellCoord,
        /// Items handed over when collected.
        grant: ItemGrant,
    },
    /// Marks the origin cell so the next projectile pass launches a shot.
    LaunchProjectile {
        /// Cell the projectile starts from.
        origin: CellCoord,
        /// Cell the projectile is aimed at.
        target: CellCoord,
        /// Side that fired the projectile.
        owner: Faction,
        /// Damage dealt on impact.
        damage: i32,
    },
    /// Materialises marked projectiles and advances every active one.
    StepProjectiles,
    /// Applies damage to an entity.
    Damage {
        /// Entity receiving the damage.
        target: EntityId,
        /// Hit points removed.
        amount: i32,
        /// Side responsible for the damage.
        source: Faction,
    },
    /// Soft-deletes an entity.
    DeactivateEntity {
        /// Entity to deactivate.
        entity: EntityId,
    },
    /// Relocates an entity to the provided cell.
    Teleport {
        /// Entity to relocate.
        entity: EntityId,
        /// Destination cell.
        cell: CellCoord,
    },
    /// Raises the boss summon request.
    RequestSummon {
        /// Boss issuing the request.
        boss: EntityId,
    },
    /// Acknowledges the pending summon request.
    CompleteSummon {
        /// Indicates whether a minion was actually placed.
        placed: bool,
    },
    /// Hands every pickup sharing the player's cell to the inventory.
    CollectPickups,
    /// Frees the slots of inactive entities.
    CollectGarbage,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that one in-game hour elapsed.
    HourElapsed {
        /// Hour of the day after advancing, in `0..24`.
        hour: u32,
    },
    /// Confirms that the grid dimensions changed.
    GridConfigured {
        /// Settings now in effect.
        settings: GridSettings,
    },
    /// Confirms that a level layout was stored.
    LevelLoaded {
        /// Identifier of the stored level.
        level: LevelId,
    },
    /// Reports that a level could not be loaded or entered.
    LevelRejected {
        /// Level named by the failing command.
        level: LevelId,
        /// Reason for the failure.
        error: InitializationError,
    },
    /// Announces that a level became current.
    LevelEntered {
        /// Level that became current.
        level: LevelId,
        /// Identifier of the player entity.
        player: EntityId,
    },
    /// Confirms that an entity was created.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Cell the entity occupies after spawning.
        cell: CellCoord,
    },
    /// Confirms that an entity changed position.
    EntityMoved {
        /// Entity that moved.
        entity: EntityId,
        /// Position before the move.
        from: Position,
        /// Position after the move.
        to: Position,
    },
    /// Reports that a mover step was rejected by the tile map.
    MoveBlocked {
        /// Entity whose step was rejected.
        entity: EntityId,
        /// Direction that was rejected.
        direction: Direction,
    },
    /// Reports a vertical physics state transition.
    PhysicsChanged {
        /// Entity whose physics state changed.
        entity: EntityId,
        /// State entered.
        state: PhysicsState,
    },
    /// Confirms that a tile changed in the current level.
    TileChanged {
        /// Cell that changed.
        cell: CellCoord,
        /// Code before the change.
        previous: TileCode,
        /// Code after the change.
        code: TileCode,
    },
    /// Reports that a block placement was refused.
    PlacementRejected {
        /// Cell named by the placement request.
        cell: CellCoord,
        /// Reason for the refusal.
        reason: PlacementError,
    },
    /// Confirms that an entity lost hit points.
    EntityDamaged {
        /// Entity that was damaged.
        entity: EntityId,
        /// Hit points removed.
        amount: i32,
        /// Hit points remaining.
        remaining: i32,
    },
    /// Reports that damage was absorbed by invincibility frames.
    DamageIgnored {
        /// Entity that ignored the damage.
        entity: EntityId,
    },
    /// Announces that an entity's hit points were exhausted.
    EntityKilled {
        /// Entity that died.
        entity: EntityId,
        /// Kind of the entity.
        kind: EntityKind,
        /// Cell the entity occupied when it died.
        cell: CellCoord,
        /// Side responsible for the final blow.
        by: Faction,
    },
    /// Confirms that an entity was soft-deleted.
    EntityDeactivated {
        /// Entity that became inactive.
        entity: EntityId,
    },
    /// Announces that the player lost a life.
    PlayerLifeLost {
        /// Lives remaining.
        lives: u32,
    },
    /// Announces that the player has no lives left.
    PlayerDefeated,
    /// Confirms that a hotbar slot became selected.
    SlotSelected {
        /// Zero-based hotbar index.
        slot: usize,
    },
    /// Confirms that items entered the inventory.
    ItemAdded {
        /// Item name.
        name: String,
        /// Units stored.
        amount: u32,
    },
    /// Reports that items did not fit and were dropped into the world.
    ItemOverflowed {
        /// Item name.
        name: String,
        /// Units dropped.
        amount: u32,
    },
    /// Confirms that items left the inventory.
    ItemRemoved {
        /// Item name.
        name: String,
        /// Units removed.
        amount: u32,
    },
    /// Confirms that a recipe was crafted.
    Crafted {
        /// Recipe that was crafted.
        recipe: RecipeId,
        /// Name of the produced item.
        item: String,
    },
    /// Reports that a recipe could not be crafted.
    CraftRejected {
        /// Recipe that was requested.
        recipe: RecipeId,
        /// Reason for the refusal.
        error: CraftError,
    },
    /// Confirms that a marked projectile entered flight.
    ProjectileLaunched {
        /// Identifier assigned to the projectile.
        entity: EntityId,
        /// Side that fired the projectile.
        owner: Faction,
        /// Cell the projectile started from.
        origin: CellCoord,
        /// Cell the projectile was aimed at.
        target: CellCoord,
    },
    /// Confirms that a pickup was collected.
    PickupCollected {
        /// Pickup that was collected.
        entity: EntityId,
        /// Name of the collected item.
        item: String,
    },
    /// Announces that the boss requested reinforcements.
    SummonRequested {
        /// Boss that issued the request.
        boss: EntityId,
    },
    /// Announces that the pending summon request was acknowledged.
    SummonCompleted {
        /// Indicates whether a minion was placed.
        placed: bool,
    },
    /// Requests that the sound sink play a sound.
    SoundTriggered {
        /// Sound to play.
        sound: SoundId,
    },
}

/// Dimensions of every level and the microstep resolution of movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Number of tile columns.
    pub columns: i32,
    /// Number of tile rows.
    pub rows: i32,
    /// Microsteps subdividing a tile horizontally.
    pub steps_x: i32,
    /// Microsteps subdividing a tile vertically.
    pub steps_y: i32,
}

impl GridSettings {
    /// Grid layout used by every shipped level.
    pub const DEFAULT: Self = Self {
        columns: 32,
        rows: 24,
        steps_x: 8,
        steps_y: 8,
    };

    /// Creates settings with explicit dimensions.
    #[must_use]
    pub const fn new(columns: i32, rows: i32, steps_x: i32, steps_y: i32) -> Self {
        Self {
            columns,
            rows,
            steps_x,
            steps_y,
        }
    }

    /// Number of cells in one level.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::try_from(self.columns.max(0)).unwrap_or(0)
            * usize::try_from(self.rows.max(0)).unwrap_or(0)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column >= 0 && cell.row >= 0 && cell.column < self.columns && cell.row < self.rows
    }

    /// Height of a single microstep in normalised screen units.
    ///
    /// The screen spans two units vertically, so a tile is `2 / rows` tall.
    #[must_use]
    pub fn micro_step_height(&self) -> f32 {
        (2.0 / self.rows as f32) / self.steps_y as f32
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Integer code stored in a grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCode(i32);

impl TileCode {
    /// Empty, walkable ground.
    pub const EMPTY: Self = Self(0);
    /// Ground about to erupt.
    pub const ERUPT_WARNING: Self = Self(6);
    /// Erupting ground that hurts the player.
    pub const ERUPT_ACTIVE: Self = Self(9);
    /// Marker for an enemy spawner.
    pub const SPAWNER: Self = Self(99);
    /// Lowest code that blocks grid-walking entities.
    pub const BLOCKING_THRESHOLD: Self = Self(100);
    /// Breakable wooden block.
    pub const WOODEN_BLOCK: Self = Self(100);
    /// Marker for the player's start cell.
    pub const PLAYER_START: Self = Self(200);
    /// Marker for the boss start cell.
    pub const BOSS_START: Self = Self(300);
    /// Marker for an axis-lock enemy.
    pub const AXIS_LOCK_START: Self = Self(301);
    /// Marker for a chaser enemy.
    pub const CHASER_START: Self = Self(302);
    /// Transient marker left where a projectile is about to launch.
    pub const PROJECTILE_MARKER: Self = Self(372);
    /// Marker for a cow.
    pub const COW_START: Self = Self(400);
    /// Marker for a unicorn.
    pub const UNICORN_START: Self = Self(401);

    /// Creates a tile code from its numeric value.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value of the code.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }

    /// Reports whether grid-walking entities are barred from the cell.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.0 >= Self::BLOCKING_THRESHOLD.0
    }

    /// Reports whether the cell holds nothing at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Identifier of a level layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a level identifier from its numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Offsets the identifier, returning `None` below zero.
    #[must_use]
    pub fn offset(self, delta: i32) -> Option<Self> {
        let value = i64::from(self.0) + i64::from(delta);
        u32::try_from(value).ok().map(Self)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Row zero is the bottom of the map; moving up increases the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i32,
    row: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the cell displaced by the provided column and row deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(self.column + columns, self.row + rows)
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Centre-less point located at the cell's index.
    #[must_use]
    pub fn point(self) -> TilePoint {
        TilePoint::new(self.column as f32, self.row as f32)
    }
}

/// Continuous location measured in tiles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TilePoint {
    /// Horizontal coordinate in tiles.
    pub x: f32,
    /// Vertical coordinate in tiles.
    pub y: f32,
}

impl TilePoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Cell containing the point.
    #[must_use]
    pub fn cell(self) -> CellCoord {
        CellCoord::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: TilePoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether both axis separations are within `half_extent`.
    #[must_use]
    pub fn within_box(self, other: TilePoint, half_extent: f32) -> bool {
        (self.x - other.x).abs() <= half_extent && (self.y - other.y).abs() <= half_extent
    }
}

/// Sub-tile offset accumulated by the mover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Microstep {
    /// Horizontal offset in `[0, steps_x)`.
    pub x: i32,
    /// Vertical offset in `[0, steps_y)`.
    pub y: i32,
}

impl Microstep {
    /// Offset of zero on both axes.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates a new offset.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Grid index plus sub-tile offset of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    tile: CellCoord,
    microstep: Microstep,
}

impl Position {
    /// Creates a position from a tile and a sub-tile offset.
    #[must_use]
    pub const fn new(tile: CellCoord, microstep: Microstep) -> Self {
        Self { tile, microstep }
    }

    /// Position resting exactly on the provided tile.
    #[must_use]
    pub const fn at(tile: CellCoord) -> Self {
        Self::new(tile, Microstep::ZERO)
    }

    /// Tile index of the position.
    #[must_use]
    pub const fn tile(&self) -> CellCoord {
        self.tile
    }

    /// Sub-tile offset of the position.
    #[must_use]
    pub const fn microstep(&self) -> Microstep {
        self.microstep
    }

    /// Continuous location of the position measured in tiles.
    #[must_use]
    pub fn point(&self, settings: &GridSettings) -> TilePoint {
        TilePoint::new(
            self.tile.column as f32 + self.microstep.x as f32 / settings.steps_x as f32,
            self.tile.row as f32 + self.microstep.y as f32 / settings.steps_y as f32,
        )
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing column indices.
    Left,
    /// Movement toward increasing column indices.
    Right,
    /// Movement toward increasing row indices.
    Up,
    /// Movement toward decreasing row indices.
    Down,
}

/// Intended direction per axis, each component in `{-1, 0, 1}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisIntent {
    x: i32,
    y: i32,
}

impl AxisIntent {
    /// No movement on either axis.
    pub const NONE: Self = Self { x: 0, y: 0 };
    /// One step toward lower columns.
    pub const LEFT: Self = Self { x: -1, y: 0 };
    /// One step toward higher columns.
    pub const RIGHT: Self = Self { x: 1, y: 0 };
    /// One step toward higher rows.
    pub const UP: Self = Self { x: 0, y: 1 };
    /// One step toward lower rows.
    pub const DOWN: Self = Self { x: 0, y: -1 };

    /// Creates an intent, reducing each component to its sign.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            x: x.signum(),
            y: y.signum(),
        }
    }

    /// Intent pointing from `from` toward `to`.
    #[must_use]
    pub const fn toward(from: CellCoord, to: CellCoord) -> Self {
        Self::new(to.column - from.column, to.row - from.row)
    }

    /// Horizontal component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Reports whether the intent moves on neither axis.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Intent restricted to the horizontal axis.
    #[must_use]
    pub const fn horizontal(self) -> Self {
        Self { x: self.x, y: 0 }
    }

    /// Intent restricted to the vertical axis.
    #[must_use]
    pub const fn vertical(self) -> Self {
        Self { x: 0, y: self.y }
    }
}

/// Handle into the world's entity arena.
///
/// The generation distinguishes reused slots, so stale handles never alias a
/// newer entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// Creates a handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of the handle.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Behaviour families of regular enemies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Hunts the player along A* shortcuts.
    Chaser,
    /// Locks onto one axis and shoots when aligned.
    AxisLock,
    /// Docile wanderer.
    Cow,
    /// Wanderer found at night.
    Unicorn,
}

impl EnemyKind {
    /// Every enemy kind in marker order.
    pub const ALL: [Self; 4] = [Self::Chaser, Self::AxisLock, Self::Cow, Self::Unicorn];

    /// Resolves the enemy kind announced by a map marker.
    #[must_use]
    pub const fn from_marker(code: TileCode) -> Option<Self> {
        match code.get() {
            302 => Some(Self::Chaser),
            301 => Some(Self::AxisLock),
            400 => Some(Self::Cow),
            401 => Some(Self::Unicorn),
            _ => None,
        }
    }

    /// Map marker announcing the enemy kind.
    #[must_use]
    pub const fn marker(&self) -> TileCode {
        match self {
            Self::Chaser => TileCode::CHASER_START,
            Self::AxisLock => TileCode::AXIS_LOCK_START,
            Self::Cow => TileCode::COW_START,
            Self::Unicorn => TileCode::UNICORN_START,
        }
    }

    /// Reports whether the enemy ambles randomly instead of hunting.
    #[must_use]
    pub const fn is_wanderer(&self) -> bool {
        matches!(self, Self::Cow | Self::Unicorn)
    }

    /// Reports whether killing the enemy counts toward the kill tally.
    #[must_use]
    pub const fn counts_as_kill(&self) -> bool {
        !matches!(self, Self::Unicorn)
    }
}

/// Side that owns a projectile or deals damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player and allies.
    Player,
    /// Regular enemies.
    Enemy,
    /// The boss.
    Boss,
    /// Map hazards and hunger.
    Environment,
}

impl Faction {
    /// Reports whether damage from this side may hurt the provided side.
    #[must_use]
    pub const fn opposes(&self, other: Faction) -> bool {
        match (self, other) {
            (Self::Player, Self::Player) => false,
            (Self::Player, _) | (_, Self::Player) => true,
            _ => false,
        }
    }
}

/// Kinds of entities stored in the world arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player character.
    Player,
    /// A regular enemy.
    Enemy(EnemyKind),
    /// The boss.
    Boss,
    /// A projectile fired by the provided side.
    Projectile(Faction),
    /// An item lying on the ground.
    Pickup,
    /// A periodic enemy spawner.
    Spawner,
    /// A companion following the player.
    Ally,
}

impl EntityKind {
    /// Side the entity belongs to.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        match self {
            Self::Player | Self::Ally => Faction::Player,
            Self::Enemy(_) | Self::Spawner => Faction::Enemy,
            Self::Boss => Faction::Boss,
            Self::Projectile(owner) => *owner,
            Self::Pickup => Faction::Environment,
        }
    }

    /// Reports whether the entity is removed when the player changes level.
    #[must_use]
    pub const fn is_level_bound(&self) -> bool {
        !matches!(self, Self::Player | Self::Ally)
    }
}

/// Vertical physics states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsState {
    /// Resting on the ground.
    #[default]
    Idle,
    /// Rising after a jump.
    Jump,
    /// Falling under gravity.
    Fall,
}

/// Identifier of an item type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Identifier stored in empty slots.
    pub const NONE: Self = Self(0);

    /// Creates an item identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Tile code written when the item is placed as a block.
    #[must_use]
    pub const fn as_tile(&self) -> TileCode {
        TileCode::new(self.0 as i32)
    }
}

/// Attack profile of the item held in the selected slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeaponProfile {
    /// Damage dealt per hit.
    pub damage: i32,
    /// Seconds between shots for ranged weapons, `None` for melee.
    pub cooldown: Option<f32>,
}

impl WeaponProfile {
    /// Bare-handed melee.
    pub const UNARMED: Self = Self {
        damage: 5,
        cooldown: None,
    };

    /// Profile of the provided item; anything that is not a weapon fights
    /// like bare hands.
    #[must_use]
    pub const fn for_item(item: ItemId) -> Self {
        match item.get() {
            872 => Self::melee(20),
            873 => Self::melee(30),
            874 => Self::melee(50),
            880 => Self::ranged(15, 0.5),
            881 => Self::ranged(25, 0.5),
            882 => Self::ranged(40, 0.25),
            _ => Self::UNARMED,
        }
    }

    const fn melee(damage: i32) -> Self {
        Self {
            damage,
            cooldown: None,
        }
    }

    const fn ranged(damage: i32, cooldown: f32) -> Self {
        Self {
            damage,
            cooldown: Some(cooldown),
        }
    }

    /// Reports whether the weapon fires projectiles.
    #[must_use]
    pub const fn is_ranged(&self) -> bool {
        self.cooldown.is_some()
    }
}

/// A quantity of a named item together with its stack limit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemGrant {
    /// Item name used as the counter key.
    pub name: String,
    /// Item identifier stored in slots.
    pub id: ItemId,
    /// Units granted.
    pub amount: u32,
    /// Maximum units held per slot and per counter.
    pub max: u32,
}

impl ItemGrant {
    /// Creates a new grant.
    #[must_use]
    pub fn new(name: impl Into<String>, id: ItemId, amount: u32, max: u32) -> Self {
        Self {
            name: name.into(),
            id,
            amount,
            max,
        }
    }
}

/// Index into the recipe book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipeId(u32);

impl RecipeId {
    /// Creates a recipe identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric value of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Sounds the simulation asks the sound sink to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundId {
    /// A projectile left its origin.
    Shoot,
    /// An entity took damage.
    Hit,
    /// A block was broken.
    BlockBroken,
    /// A block was placed.
    BlockPlaced,
    /// A pickup was collected.
    Pickup,
    /// A recipe was crafted.
    Craft,
    /// An enemy died.
    EnemyDeath,
    /// The player took damage.
    PlayerHurt,
}

/// Keyboard keys the simulation reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Move toward lower columns.
    Left,
    /// Move toward higher columns.
    Right,
    /// Move toward higher rows.
    Up,
    /// Move toward lower rows.
    Down,
    /// Start a jump.
    Jump,
    /// Drop one unit of the selected slot.
    Drop,
    /// Select the hotbar slot with the provided one-based number.
    Hotbar(u8),
}

/// Mouse buttons the simulation reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Break, fire and melee.
    Primary,
    /// Place blocks.
    Secondary,
}

/// Input state sampled once per frame by the adapter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    keys_down: Vec<Key>,
    keys_pressed: Vec<Key>,
    mouse: Option<TilePoint>,
    primary_down: bool,
    secondary_down: bool,
    scroll: f32,
}

impl InputSnapshot {
    /// Creates an input snapshot with nothing held.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the key as held this frame.
    #[must_use]
    pub fn with_key_down(mut self, key: Key) -> Self {
        self.keys_down.push(key);
        self
    }

    /// Marks the key as pressed on this frame's edge.
    #[must_use]
    pub fn with_key_pressed(mut self, key: Key) -> Self {
        self.keys_pressed.push(key);
        self
    }

    /// Places the mouse cursor at the provided grid position.
    #[must_use]
    pub fn with_mouse(mut self, position: TilePoint) -> Self {
        self.mouse = Some(position);
        self
    }

    /// Marks the mouse button as held.
    #[must_use]
    pub fn with_button_down(mut self, button: MouseButton) -> Self {
        match button {
            MouseButton::Primary => self.primary_down = true,
            MouseButton::Secondary => self.secondary_down = true,
        }
        self
    }

    /// Records the scroll wheel delta.
    #[must_use]
    pub fn with_scroll(mut self, delta: f32) -> Self {
        self.scroll = delta;
        self
    }

    /// Reports whether the key is held.
    #[must_use]
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Reports whether the key went down this frame.
    #[must_use]
    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Cursor position projected onto the grid.
    #[must_use]
    pub fn mouse_position(&self) -> Option<TilePoint> {
        self.mouse
    }

    /// Cell under the cursor.
    #[must_use]
    pub fn mouse_cell(&self) -> Option<CellCoord> {
        self.mouse.map(TilePoint::cell)
    }

    /// Reports whether the mouse button is held.
    #[must_use]
    pub fn mouse_button_down(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Primary => self.primary_down,
            MouseButton::Secondary => self.secondary_down,
        }
    }

    /// Scroll wheel movement since the previous frame.
    #[must_use]
    pub fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}

/// Reasons a level could not be loaded or entered.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InitializationError {
    /// The level layout was never loaded.
    #[error("level {level} is not loaded")]
    UnknownLevel {
        /// Requested level.
        level: u32,
    },
    /// No player start marker exists and no arrival cell was given.
    #[error("level {level} has no player start marker")]
    MissingPlayerStart {
        /// Requested level.
        level: u32,
    },
    /// The layout does not match the configured grid.
    #[error("layout holds {actual} tiles but the grid expects {expected}")]
    LayoutSizeMismatch {
        /// Tiles required by the grid settings.
        expected: usize,
        /// Tiles provided by the layout.
        actual: usize,
    },
}

/// Reasons a recipe could not be crafted.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CraftError {
    /// The recipe book holds no recipe with the identifier.
    #[error("recipe {recipe} does not exist")]
    UnknownRecipe {
        /// Requested recipe index.
        recipe: u32,
    },
    /// An ingredient count is below the required amount.
    #[error("need {required} {ingredient} but only {available} held")]
    Shortfall {
        /// Ingredient that is short.
        ingredient: String,
        /// Units the recipe consumes.
        required: u32,
        /// Units currently held.
        available: u32,
    },
}

/// Reasons a block placement was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The target cell is outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The target cell is not empty.
    #[error("cell is occupied")]
    Occupied,
    /// The selected slot does not hold a block.
    #[error("selected item is not a block")]
    NotABlock,
}

/// Immutable representation of a single entity used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Handle of the entity.
    pub id: EntityId,
    /// Kind of the entity.
    pub kind: EntityKind,
    /// Current position.
    pub position: Position,
    /// Remaining hit points.
    pub hp: i32,
    /// Vertical physics state.
    pub physics: PhysicsState,
}

/// Read-only snapshot describing all active entities.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a view from the provided snapshots, ordering them by handle.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of the provided entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Snapshot of the player, if present.
    #[must_use]
    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.kind == EntityKind::Player)
    }

    /// Iterator over the regular enemies.
    pub fn enemies(&self) -> impl Iterator<Item = (EnemyKind, &EntitySnapshot)> {
        self.snapshots.iter().filter_map(|snapshot| match snapshot.kind {
            EntityKind::Enemy(kind) => Some((kind, snapshot)),
            _ => None,
        })
    }

    /// Iterator over entities of the provided kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.kind == kind)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of an active projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Handle of the projectile.
    pub id: EntityId,
    /// Side that fired the projectile.
    pub owner: Faction,
    /// Current position.
    pub position: Position,
    /// Cell the projectile was launched from.
    pub origin: CellCoord,
    /// Cell the projectile was aimed at.
    pub target: CellCoord,
    /// Damage dealt on impact.
    pub damage: i32,
}

/// Read-only view over the tiles of the current level.
#[derive(Clone, Copy, Debug)]
pub struct TileGridView<'a> {
    settings: GridSettings,
    cells: &'a [TileCode],
}

impl<'a> TileGridView<'a> {
    /// Wraps row-major tile storage.
    #[must_use]
    pub const fn new(settings: GridSettings, cells: &'a [TileCode]) -> Self {
        Self { settings, cells }
    }

    /// Grid dimensions of the view.
    #[must_use]
    pub const fn settings(&self) -> GridSettings {
        self.settings
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.settings.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.settings.rows
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        self.settings.contains(cell)
    }

    /// Code stored at the cell, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<TileCode> {
        self.index(cell)
            .and_then(|index| self.cells.get(index))
            .copied()
    }

    /// Reports whether the cell blocks movement; cells outside the grid block.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        self.get(cell).map_or(true, |code| code.is_blocked())
    }

    /// First cell holding the code in row-major order.
    #[must_use]
    pub fn find_first(&self, code: TileCode) -> Option<CellCoord> {
        let width = usize::try_from(self.settings.columns).ok()?;
        if width == 0 {
            return None;
        }
        let index = self.cells.iter().position(|cell| *cell == code)?;
        let column = i32::try_from(index % width).ok()?;
        let row = i32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Row-major tile storage.
    #[must_use]
    pub fn cells(&self) -> &'a [TileCode] {
        self.cells
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row).ok()?;
        let column = usize::try_from(cell.column).ok()?;
        let width = usize::try_from(self.settings.columns).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AxisIntent, CellCoord, EnemyKind, Faction, GridSettings, InputSnapshot, ItemId, Key,
        MouseButton, TileCode, TileGridView, TilePoint, WeaponProfile,
    };

    #[test]
    fn blocking_starts_at_one_hundred() {
        for value in -5..1000 {
            let code = TileCode::new(value);
            assert_eq!(code.is_blocked(), value >= 100, "code {value}");
        }
    }

    #[test]
    fn intent_reduces_to_signs() {
        let intent = AxisIntent::new(7, -3);
        assert_eq!(intent.x(), 1);
        assert_eq!(intent.y(), -1);
        assert_eq!(
            AxisIntent::toward(CellCoord::new(4, 4), CellCoord::new(4, 9)),
            AxisIntent::UP
        );
    }

    #[test]
    fn markers_map_to_enemy_kinds() {
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_marker(kind.marker()), Some(kind));
        }
        assert_eq!(EnemyKind::from_marker(TileCode::BOSS_START), None);
    }

    #[test]
    fn factions_only_oppose_across_the_player_line() {
        assert!(Faction::Player.opposes(Faction::Enemy));
        assert!(Faction::Boss.opposes(Faction::Player));
        assert!(!Faction::Enemy.opposes(Faction::Boss));
        assert!(!Faction::Player.opposes(Faction::Player));
    }

    #[test]
    fn grid_view_finds_first_code_in_row_major_order() {
        let settings = GridSettings::new(3, 2, 8, 8);
        let mut cells = vec![TileCode::EMPTY; 6];
        cells[4] = TileCode::PLAYER_START;
        cells[5] = TileCode::PLAYER_START;
        let view = TileGridView::new(settings, &cells);

        assert_eq!(
            view.find_first(TileCode::PLAYER_START),
            Some(CellCoord::new(1, 1))
        );
        assert_eq!(view.find_first(TileCode::BOSS_START), None);
        assert!(view.is_blocked(CellCoord::new(-1, 0)));
        assert!(!view.is_blocked(CellCoord::new(0, 0)));
    }

    #[test]
    fn guns_fire_and_swords_do_not() {
        assert!(WeaponProfile::for_item(ItemId::new(880)).is_ranged());
        assert!(!WeaponProfile::for_item(ItemId::new(874)).is_ranged());
        assert_eq!(WeaponProfile::for_item(ItemId::NONE), WeaponProfile::UNARMED);
        assert!(
            WeaponProfile::for_item(ItemId::new(882)).damage
                > WeaponProfile::for_item(ItemId::new(881)).damage
        );
    }

    #[test]
    fn input_snapshot_reports_mouse_cell() {
        let input = InputSnapshot::new()
            .with_key_down(Key::Left)
            .with_mouse(TilePoint::new(3.7, 2.2))
            .with_button_down(MouseButton::Secondary);

        assert!(input.is_key_down(Key::Left));
        assert!(!input.is_key_pressed(Key::Left));
        assert_eq!(input.mouse_cell(), Some(CellCoord::new(3, 2)));
        assert!(input.mouse_button_down(MouseButton::Secondary));
        assert!(!input.mouse_button_down(MouseButton::Primary));
    }

    #[test]
    fn recorded_input_survives_bincode() {
        let input = InputSnapshot::new()
            .with_key_pressed(Key::Hotbar(4))
            .with_mouse(TilePoint::new(1.5, 9.0))
            .with_scroll(-1.0);

        let bytes = bincode::serialize(&input).expect("serialize");
        let restored: InputSnapshot = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, input);
    }
}
