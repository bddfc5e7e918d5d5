//! Gameplay tuning loaded from TOML files.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use scrapfield_core::Tuning;

/// Loads the tuning stored at `path`, falling back to the shipped defaults
/// when no file is given.
pub(crate) fn load_tuning(path: Option<&Path>) -> Result<Tuning> {
    let Some(path) = path else {
        return Ok(Tuning::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read tuning file at {}", path.display()))?;
    parse_tuning(&contents).with_context(|| format!("invalid tuning file at {}", path.display()))
}

fn parse_tuning(contents: &str) -> Result<Tuning> {
    toml::from_str(contents).context("failed to parse tuning toml contents")
}
