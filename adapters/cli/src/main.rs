#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Scrapfield simulation headlessly.

mod config;
mod layout;

use std::{cell::RefCell, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use scrapfield_core::{Command, Event, LevelId};
use scrapfield_rendering::{Frame, HeadlessBackend, Presentation, RenderingBackend, Viewport};
use scrapfield_system_scene::Scene;
use scrapfield_world::{self as world, query, World, HEALTH, LIVES};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Side length of a tile in the headless viewport.
const TILE_LENGTH: f32 = 16.0;

/// Runs a deterministic headless session of Scrapfield.
#[derive(Debug, Parser)]
#[command(name = "scrapfield", version, about)]
struct Args {
    /// Seed shared by level generation and every stochastic system.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u64,
    /// TOML file overriding the default tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
}

/// Entry point for the Scrapfield command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let tuning = config::load_tuning(args.config.as_deref())?;
    let settings = tuning.grid;
    let boss_level = LevelId::new(tuning.boss.level);
    let mut world = World::with_tuning(tuning);
    let mut events = Vec::new();
    for (level, tiles) in layout::build_levels(settings, boss_level, args.seed)? {
        world::apply(&mut world, Command::LoadLevel { level, tiles }, &mut events);
    }
    world::apply(
        &mut world,
        Command::EnterLevel {
            level: layout::STARTING_LEVEL,
            arrival: None,
        },
        &mut events,
    );
    if let Some((level, error)) = events.into_iter().find_map(|event| match event {
        Event::LevelRejected { level, error } => Some((level, error)),
        _ => None,
    }) {
        return Err(error).with_context(|| format!("level {} could not be prepared", level.get()));
    }

    let scene = Scene::new(world, args.seed);
    println!("{}", scene.welcome_banner());

    let viewport = Viewport::new(settings, TILE_LENGTH)?;
    let backend = HeadlessBackend::new(args.ticks, Duration::from_millis(args.dt_ms))?;
    let scene = Rc::new(RefCell::new(scene));
    let driver = Rc::clone(&scene);
    backend.run(
        Presentation::new("Scrapfield", viewport),
        move |dt, input| {
            let mut scene = driver.borrow_mut();
            let defeated = scene
                .step(&input, dt)
                .iter()
                .any(|event| matches!(event, Event::PlayerDefeated));
            if defeated {
                info!("player_defeated");
                return None;
            }
            Some(Frame::capture(scene.world(), &viewport, scene.frame_events()))
        },
    )?;

    let scene = scene.borrow();
    let world = scene.world();
    let level = query::current_level(world).map_or(0, |level| level.get());
    let inventory = query::inventory(world);
    println!(
        "tick {} level {} hour {} kills {} health {} lives {}",
        query::tick_index(world),
        level,
        query::hour(world),
        query::kills(world),
        inventory.count(HEALTH),
        inventory.count(LIVES),
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
