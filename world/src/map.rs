//! Per-level tile storage.

use std::collections::BTreeMap;

use scrapfield_core::{CellCoord, GridSettings, InitializationError, LevelId, TileCode, TileGridView};

/// Tile layouts of every loaded level plus the current level selection.
///
/// Edits persist per level, so leaving and re-entering a level keeps broken
/// and placed blocks.
#[derive(Clone, Debug)]
pub(crate) struct LevelMap {
    settings: GridSettings,
    levels: BTreeMap<LevelId, Vec<TileCode>>,
    current: Option<LevelId>,
}

impl LevelMap {
    pub(crate) fn new(settings: GridSettings) -> Self {
        Self {
            settings,
            levels: BTreeMap::new(),
            current: None,
        }
    }

    pub(crate) fn settings(&self) -> GridSettings {
        self.settings
    }

    pub(crate) fn current(&self) -> Option<LevelId> {
        self.current
    }

    /// Stores a layout, replacing any previous layout for the level.
    pub(crate) fn load(
        &mut self,
        level: LevelId,
        tiles: Vec<TileCode>,
    ) -> Result<(), InitializationError> {
        let expected = self.settings.cell_count();
        if tiles.len() != expected {
            return Err(InitializationError::LayoutSizeMismatch {
                expected,
                actual: tiles.len(),
            });
        }
        let _ = self.levels.insert(level, tiles);
        Ok(())
    }

    /// Makes a loaded level current.
    pub(crate) fn enter(&mut self, level: LevelId) -> Result<(), InitializationError> {
        if !self.levels.contains_key(&level) {
            return Err(InitializationError::UnknownLevel { level: level.get() });
        }
        self.current = Some(level);
        Ok(())
    }

    /// Read-only view of the current level; empty when no level is current.
    pub(crate) fn view(&self) -> TileGridView<'_> {
        let cells = self
            .current
            .and_then(|level| self.levels.get(&level))
            .map_or(&[][..], Vec::as_slice);
        TileGridView::new(self.settings, cells)
    }

    /// Read-only view of a loaded level regardless of the current selection.
    pub(crate) fn view_of(&self, level: LevelId) -> Option<TileGridView<'_>> {
        self.levels
            .get(&level)
            .map(|cells| TileGridView::new(self.settings, cells))
    }

    pub(crate) fn get(&self, cell: CellCoord) -> Option<TileCode> {
        self.view().get(cell)
    }

    /// Writes a code into the current level and returns the previous code.
    pub(crate) fn set(&mut self, cell: CellCoord, code: TileCode) -> Option<TileCode> {
        if !self.settings.contains(cell) {
            return None;
        }
        let index = usize::try_from(cell.row() * self.settings.columns + cell.column()).ok()?;
        let level = self.current?;
        let slot = self.levels.get_mut(&level)?.get_mut(index)?;
        Some(std::mem::replace(slot, code))
    }

    /// Row-major cells of the current level that hold the provided code.
    pub(crate) fn cells_with(&self, code: TileCode) -> Vec<CellCoord> {
        let view = self.view();
        let columns = self.settings.columns.max(1);
        view.cells()
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == code)
            .map(|(index, _)| {
                let index = index as i32;
                CellCoord::new(index % columns, index / columns)
            })
            .collect()
    }
}
