#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering and audio contracts for Scrapfield adapters.
//!
//! The simulation never draws anything itself. Adapters capture a [`Frame`]
//! from the world after each step and replay it onto whatever
//! [`RenderSurface`] and [`SoundSink`] they own.

use anyhow::Result as AnyResult;
use glam::{Affine2, Vec2};
use scrapfield_core::{
    CellCoord, EnemyKind, EntityKind, EntitySnapshot, Event, Faction, GridSettings, InputSnapshot,
    SoundId, TileCode, TilePoint, HOTBAR_SLOTS,
};
use scrapfield_world::{query, World, FOOD, HEALTH, LIVES};
use std::{error::Error, fmt, time::Duration};
use tracing::info;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

const DAY_SKY: Color = Color::from_rgb_u8(122, 168, 204);
const NIGHT_SKY: Color = Color::from_rgb_u8(18, 22, 44);

/// Texture a quad should be drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sprite {
    /// Tile texture keyed by its code.
    Tile(TileCode),
    /// The player character.
    Player,
    /// A companion.
    Ally,
    /// A regular enemy.
    Enemy(EnemyKind),
    /// The boss.
    Boss,
    /// A projectile fired by the provided side.
    Projectile(Faction),
    /// An item lying on the ground.
    Pickup,
    /// A spawner structure.
    Spawner,
}

impl Sprite {
    /// Sprite used for entities of the provided kind.
    #[must_use]
    pub const fn for_entity(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Self::Player,
            EntityKind::Ally => Self::Ally,
            EntityKind::Enemy(kind) => Self::Enemy(kind),
            EntityKind::Boss => Self::Boss,
            EntityKind::Projectile(owner) => Self::Projectile(owner),
            EntityKind::Pickup => Self::Pickup,
            EntityKind::Spawner => Self::Spawner,
        }
    }

    /// Flat tint used when the adapter has no texture for the sprite.
    #[must_use]
    pub fn tint(&self) -> Color {
        match self {
            Self::Tile(code) => tile_tint(*code),
            Self::Player => Color::from_rgb_u8(236, 236, 236),
            Self::Ally => Color::from_rgb_u8(120, 200, 255),
            Self::Enemy(EnemyKind::Chaser) => Color::from_rgb_u8(200, 60, 60),
            Self::Enemy(EnemyKind::AxisLock) => Color::from_rgb_u8(220, 140, 40),
            Self::Enemy(EnemyKind::Cow) => Color::from_rgb_u8(160, 120, 90),
            Self::Enemy(EnemyKind::Unicorn) => Color::from_rgb_u8(230, 170, 230),
            Self::Boss => Color::from_rgb_u8(120, 20, 120),
            Self::Projectile(Faction::Player) => Color::from_rgb_u8(250, 240, 120),
            Self::Projectile(_) => Color::from_rgb_u8(255, 90, 40),
            Self::Pickup => Color::from_rgb_u8(90, 220, 120),
            Self::Spawner => Color::from_rgb_u8(80, 40, 110),
        }
    }
}

fn tile_tint(code: TileCode) -> Color {
    match code {
        TileCode::ERUPT_WARNING => Color::from_rgb_u8(240, 170, 60),
        TileCode::ERUPT_ACTIVE => Color::from_rgb_u8(230, 50, 20),
        TileCode::SPAWNER => Color::from_rgb_u8(80, 40, 110),
        TileCode::WOODEN_BLOCK => Color::from_rgb_u8(120, 84, 48),
        code if code.is_blocked() => Color::from_rgb_u8(96, 96, 104),
        _ => Color::from_rgb_u8(70, 140, 70),
    }
}

/// Single textured quad queued for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    /// Maps the unit square onto screen space.
    pub transform: Affine2,
    /// Color multiplied with the texture.
    pub tint: Color,
    /// Texture to sample.
    pub sprite: Sprite,
}

/// Surface able to draw textured quads.
pub trait RenderSurface {
    /// Draws the unit square transformed into screen space.
    fn draw_quad(&mut self, transform: Affine2, tint: Color, sprite: Sprite);
}

impl RenderSurface for Vec<Quad> {
    fn draw_quad(&mut self, transform: Affine2, tint: Color, sprite: Sprite) {
        self.push(Quad {
            transform,
            tint,
            sprite,
        });
    }
}

/// Fire-and-forget sound output.
pub trait SoundSink {
    /// Starts playing the sound.
    fn play_sound(&mut self, sound: SoundId);
}

impl SoundSink for Vec<SoundId> {
    fn play_sound(&mut self, sound: SoundId) {
        self.push(sound);
    }
}

/// Maps tile space onto a screen whose origin is the top-left corner.
///
/// Row zero of the grid is the bottom of the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl Viewport {
    /// Creates a viewport for the grid drawn with the provided tile length.
    ///
    /// Returns an error when the grid has no area or the tile length is not
    /// positive.
    pub fn new(settings: GridSettings, tile_length: f32) -> Result<Self, RenderingError> {
        let columns = u32::try_from(settings.columns).unwrap_or(0);
        let rows = u32::try_from(settings.rows).unwrap_or(0);
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid {
                columns: settings.columns,
                rows: settings.rows,
            });
        }
        if tile_length.is_nan() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
        })
    }

    /// Side length of a tile in screen units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Width of the whole grid in screen units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Height of the whole grid in screen units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Transform placing a one-tile quad whose lower-left corner sits at the
    /// point.
    #[must_use]
    pub fn tile_transform(&self, point: TilePoint) -> Affine2 {
        let top_left = Vec2::new(
            point.x * self.tile_length,
            self.height() - (point.y + 1.0) * self.tile_length,
        );
        Affine2::from_scale_angle_translation(Vec2::splat(self.tile_length), 0.0, top_left)
    }
}

/// Player status shown alongside the map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hud {
    /// Remaining health.
    pub health: u32,
    /// Remaining food.
    pub food: u32,
    /// Remaining lives.
    pub lives: u32,
    /// In-game hour.
    pub hour: u32,
    /// Index of the selected hotbar slot.
    pub selected: usize,
    /// Name and quantity of each hotbar slot.
    pub hotbar: Vec<(String, u32)>,
}

/// Everything an adapter needs to present one simulated frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Solid color used to clear the screen.
    pub clear_color: Color,
    /// Quads in drawing order: tiles first, then entities.
    pub quads: Vec<Quad>,
    /// Sounds raised during the frame.
    pub sounds: Vec<SoundId>,
    /// Player status.
    pub hud: Hud,
}

impl Frame {
    /// Captures the current level, its inhabitants and the sounds among the
    /// provided frame events.
    #[must_use]
    pub fn capture(world: &World, viewport: &Viewport, events: &[Event]) -> Self {
        let settings = query::grid_settings(world);
        let grid = query::tile_grid(world);
        let mut quads: Vec<Quad> = Vec::new();

        for row in 0..settings.rows {
            for column in 0..settings.columns {
                let cell = CellCoord::new(column, row);
                let Some(code) = grid.get(cell).filter(|code| !code.is_empty()) else {
                    continue;
                };
                let sprite = Sprite::Tile(code);
                quads.draw_quad(viewport.tile_transform(cell.point()), sprite.tint(), sprite);
            }
        }

        let invulnerable = query::player_invulnerable(world);
        for snapshot in query::entity_view(world).iter() {
            let sprite = Sprite::for_entity(snapshot.kind);
            quads.draw_quad(
                viewport.tile_transform(snapshot.position.point(&settings)),
                entity_tint(snapshot, sprite, invulnerable),
                sprite,
            );
        }

        let sounds = events
            .iter()
            .filter_map(|event| match event {
                Event::SoundTriggered { sound } => Some(*sound),
                _ => None,
            })
            .collect();

        let inventory = query::inventory(world);
        let hud = Hud {
            health: inventory.count(HEALTH),
            food: inventory.count(FOOD),
            lives: inventory.count(LIVES),
            hour: query::hour(world),
            selected: inventory.selected(),
            hotbar: inventory
                .slots()
                .iter()
                .take(HOTBAR_SLOTS)
                .map(|slot| (slot.name().to_owned(), slot.quantity()))
                .collect(),
        };

        Self {
            clear_color: if query::is_night(world) {
                NIGHT_SKY
            } else {
                DAY_SKY
            },
            quads,
            sounds,
            hud,
        }
    }

    /// Replays the frame onto the surface and the sound sink.
    pub fn present<S, A>(&self, surface: &mut S, sink: &mut A)
    where
        S: RenderSurface + ?Sized,
        A: SoundSink + ?Sized,
    {
        for quad in &self.quads {
            surface.draw_quad(quad.transform, quad.tint, quad.sprite);
        }
        for sound in &self.sounds {
            sink.play_sound(*sound);
        }
    }
}

fn entity_tint(snapshot: &EntitySnapshot, sprite: Sprite, invulnerable: bool) -> Color {
    let tint = sprite.tint();
    if snapshot.kind == EntityKind::Player && invulnerable {
        tint.lighten(0.5)
    } else {
        tint
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Mapping between tile space and the screen.
    pub viewport: Viewport,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, viewport: Viewport) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            viewport,
        }
    }
}

/// Rendering backend capable of presenting Scrapfield frames.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_frame` closure receives the simulated frame delta
    /// and the input captured by the adapter, and returns the frame to
    /// present. Returning `None` ends the run.
    fn run<F>(self, presentation: Presentation, update_frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, InputSnapshot) -> Option<Frame> + 'static;
}

/// Backend that presents frames into memory without opening a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessBackend {
    frames: u64,
    dt: Duration,
}

impl HeadlessBackend {
    /// Creates a backend that runs at most `frames` fixed-length frames.
    ///
    /// Returns an error when the frame length is zero.
    pub fn new(frames: u64, dt: Duration) -> Result<Self, RenderingError> {
        if dt.is_zero() {
            return Err(RenderingError::ZeroFrameDuration);
        }
        Ok(Self { frames, dt })
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, InputSnapshot) -> Option<Frame> + 'static,
    {
        let mut surface: Vec<Quad> = Vec::new();
        let mut sounds: Vec<SoundId> = Vec::new();
        let mut presented = 0_u64;
        for _ in 0..self.frames {
            let Some(frame) = update_frame(self.dt, InputSnapshot::new()) else {
                break;
            };
            surface.clear();
            sounds.clear();
            frame.present(&mut surface, &mut sounds);
            presented += 1;
        }
        info!(
            title = %presentation.window_title,
            frames = presented,
            "headless_run_finished"
        );
        Ok(())
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The grid must contain at least one cell.
    EmptyGrid {
        /// Provided column count.
        columns: i32,
        /// Provided row count.
        rows: i32,
    },
    /// Tiles must have a positive side length.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
    /// Headless runs need a positive frame length.
    ZeroFrameDuration,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must not be empty (received {columns}x{rows})")
            }
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
            Self::ZeroFrameDuration => write!(f, "frame duration must be positive"),
        }
    }
}

impl Error for RenderingError {}
