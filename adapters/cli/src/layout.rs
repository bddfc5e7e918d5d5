//! Procedurally generated level layouts for the headless runner.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scrapfield_core::{CellCoord, GridSettings, LevelId, TileCode};
use thiserror::Error;

/// Level the player starts on.
pub(crate) const STARTING_LEVEL: LevelId = LevelId::new(1);

/// Unbreakable terrain filling the ground below the surface layer.
const STONE: TileCode = TileCode::new(150);
const FIELD_LEVELS: u32 = 9;
/// Level offset between vertically adjacent levels.
const LEVEL_STRIDE: u32 = 3;
const MAX_GROUND: i32 = 4;
const MIN_COLUMNS: i32 = 12;
const MIN_ROWS: i32 = 8;
const FLAT_EDGE: i32 = 3;
const PIT_WIDTH: i32 = 2;

/// Errors raised while generating level layouts.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LayoutError {
    /// The grid cannot hold generated terrain.
    #[error("grid of {columns}x{rows} tiles is too small for generated levels")]
    GridTooSmall {
        /// Configured column count.
        columns: i32,
        /// Configured row count.
        rows: i32,
    },
    /// Every column was full when placing a marker.
    #[error("level {level} has no free surface cell for marker {marker}")]
    NoRoomForMarker {
        /// Level being generated.
        level: u32,
        /// Marker code that could not be placed.
        marker: i32,
    },
}

/// Generates the field levels and the boss arena, seeded per level so that
/// the same seed always yields the same world.
pub(crate) fn build_levels(
    settings: GridSettings,
    boss_level: LevelId,
    seed: u64,
) -> Result<Vec<(LevelId, Vec<TileCode>)>, LayoutError> {
    if settings.columns < MIN_COLUMNS || settings.rows < MIN_ROWS {
        return Err(LayoutError::GridTooSmall {
            columns: settings.columns,
            rows: settings.rows,
        });
    }

    let mut levels: BTreeSet<LevelId> = (1..=FIELD_LEVELS).map(LevelId::new).collect();
    let _ = levels.insert(boss_level);

    levels
        .iter()
        .map(|level| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ u64::from(level.get()).rotate_left(32));
            let tiles = if *level == boss_level {
                arena(settings)
            } else {
                let below = level
                    .offset(LEVEL_STRIDE as i32)
                    .map_or(false, |next| levels.contains(&next));
                field(*level, settings, below, &mut rng)?
            };
            Ok((*level, tiles))
        })
        .collect()
}

struct Layout {
    settings: GridSettings,
    tiles: Vec<TileCode>,
}

impl Layout {
    fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            tiles: vec![TileCode::EMPTY; settings.cell_count()],
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.settings
            .contains(cell)
            .then(|| (cell.row() * self.settings.columns + cell.column()) as usize)
    }

    fn get(&self, cell: CellCoord) -> Option<TileCode> {
        self.index(cell).map(|index| self.tiles[index])
    }

    fn set(&mut self, cell: CellCoord, code: TileCode) {
        if let Some(index) = self.index(cell) {
            self.tiles[index] = code;
        }
    }

    /// First empty cell resting directly on terrain.
    fn surface(&self, column: i32) -> Option<CellCoord> {
        (1..self.settings.rows)
            .map(|row| CellCoord::new(column, row))
            .find(|cell| {
                self.get(*cell) == Some(TileCode::EMPTY)
                    && self
                        .get(cell.offset(0, -1))
                        .map_or(false, |below| below == STONE || below == TileCode::WOODEN_BLOCK)
            })
    }

    /// Places the marker on the surface of the first free column, scanning
    /// from `start`.
    fn place(&mut self, level: LevelId, start: i32, marker: TileCode) -> Result<(), LayoutError> {
        let columns = self.settings.columns;
        let cell = (0..columns)
            .map(|step| (start + step).rem_euclid(columns))
            .find_map(|column| self.surface(column))
            .ok_or(LayoutError::NoRoomForMarker {
                level: level.get(),
                marker: marker.get(),
            })?;
        self.set(cell, marker);
        Ok(())
    }
}

fn field(
    level: LevelId,
    settings: GridSettings,
    below: bool,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<TileCode>, LayoutError> {
    let mut layout = Layout::new(settings);
    let columns = settings.columns;
    let pit = below.then(|| rng.gen_range(FLAT_EDGE + 1..columns - FLAT_EDGE - PIT_WIDTH));

    let mut height = 1;
    for column in 0..columns {
        if pit.map_or(false, |start| (start..start + PIT_WIDTH).contains(&column)) {
            continue;
        }
        height = if column < FLAT_EDGE || column >= columns - FLAT_EDGE {
            1
        } else {
            (height + rng.gen_range(-1..=1)).clamp(1, MAX_GROUND)
        };
        for row in 0..height {
            let code = if row + 1 == height {
                TileCode::WOODEN_BLOCK
            } else {
                STONE
            };
            layout.set(CellCoord::new(column, row), code);
        }
    }

    if level == STARTING_LEVEL {
        layout.place(level, FLAT_EDGE - 1, TileCode::PLAYER_START)?;
    }
    let mut markers = vec![TileCode::COW_START, TileCode::UNICORN_START];
    if level.get() >= 4 {
        markers.push(TileCode::CHASER_START);
    }
    if level.get() >= 7 {
        markers.push(TileCode::AXIS_LOCK_START);
    }
    if level.get() > 1 && level.get() % 4 == 1 {
        markers.push(TileCode::SPAWNER);
    }
    for marker in markers {
        let start = rng.gen_range(FLAT_EDGE..columns - FLAT_EDGE);
        layout.place(level, start, marker)?;
    }

    Ok(layout.tiles)
}

fn arena(settings: GridSettings) -> Vec<TileCode> {
    let mut layout = Layout::new(settings);
    for column in 0..settings.columns {
        layout.set(CellCoord::new(column, 0), STONE);
    }
    layout.set(
        CellCoord::new(settings.columns / 2, settings.rows / 2),
        TileCode::BOSS_START,
    );
    layout.tiles
}
