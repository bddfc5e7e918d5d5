//! A* search over the tile grid and the shortcut consumer used by hunters.

use std::{cmp::Reverse, collections::BinaryHeap};

use scrapfield_core::{AxisIntent, CellCoord, TileGridView};

/// Cost of a cardinal step, scaled so diagonals stay integral.
const CARDINAL_COST: u32 = 10;
/// Cost of a diagonal step, approximately `CARDINAL_COST * sqrt(2)`.
const DIAGONAL_COST: u32 = 14;

const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Distance estimate guiding the search toward the goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heuristic {
    /// Sum of the axis separations.
    Manhattan,
    /// Straight-line distance.
    Euclidean,
}

impl Heuristic {
    /// Estimated cost between two cells, in step-cost units.
    #[must_use]
    pub fn estimate(self, from: CellCoord, to: CellCoord) -> u32 {
        let dx = from.column().abs_diff(to.column());
        let dy = from.row().abs_diff(to.row());
        match self {
            Self::Manhattan => (dx + dy).saturating_mul(CARDINAL_COST),
            Self::Euclidean => {
                let length = f64::from(dx).hypot(f64::from(dy));
                (length * f64::from(CARDINAL_COST)) as u32
            }
        }
    }
}

/// Parameters of a path search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathQuery {
    /// Distance estimate.
    pub heuristic: Heuristic,
    /// Multiplier applied to the estimate; values above one trade optimality
    /// for speed.
    pub weight: u32,
    /// Whether diagonal neighbours are expanded.
    pub diagonal: bool,
}

impl PathQuery {
    /// Query used by hunting enemies.
    pub const HUNTER: Self = Self {
        heuristic: Heuristic::Euclidean,
        weight: 10,
        diagonal: false,
    };
}

impl Default for PathQuery {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::Manhattan,
            weight: 1,
            diagonal: false,
        }
    }
}

/// Open-set entry ordered by f, then h, then insertion order.
type OpenEntry = Reverse<(u32, u32, u64, usize)>;

/// Computes a path from `start` to `goal`.
///
/// The returned cells exclude `start` and end with `goal`. An empty vector
/// means the goal is unreachable, blocked, outside the grid or equal to the
/// start.
#[must_use]
pub fn find_path(
    grid: &TileGridView<'_>,
    start: CellCoord,
    goal: CellCoord,
    query: PathQuery,
) -> Vec<CellCoord> {
    let Some(start_index) = index_of(grid, start) else {
        return Vec::new();
    };
    let Some(goal_index) = index_of(grid, goal) else {
        return Vec::new();
    };
    if start == goal || grid.is_blocked(goal) {
        return Vec::new();
    }

    let node_count = grid.cells().len();
    let mut closed = vec![false; node_count];
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent = vec![None::<usize>; node_count];
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut next_insertion = 0u64;

    let start_h = weighted(query, start, goal);
    open.push(Reverse((start_h, start_h, next_insertion, start_index)));
    next_insertion += 1;
    best_g[start_index] = 0;

    while let Some(Reverse((_, _, _, current))) = open.pop() {
        // Superseded entries stay queued until popped.
        if closed[current] {
            continue;
        }
        closed[current] = true;

        if current == goal_index {
            return reconstruct(grid, &parent, start_index, goal_index);
        }

        let cell = cell_of(grid, current);
        let current_g = best_g[current];
        let diagonals: &[(i32, i32)] = if query.diagonal {
            &DIAGONAL_OFFSETS[..]
        } else {
            &[]
        };
        let neighbours = CARDINAL_OFFSETS
            .iter()
            .map(|offset| (offset, CARDINAL_COST))
            .chain(diagonals.iter().map(|offset| (offset, DIAGONAL_COST)));

        for (&(dx, dy), cost) in neighbours {
            let neighbour = cell.offset(dx, dy);
            let Some(neighbour_index) = index_of(grid, neighbour) else {
                continue;
            };
            if closed[neighbour_index] || grid.is_blocked(neighbour) {
                continue;
            }

            let tentative_g = current_g.saturating_add(cost);
            if tentative_g >= best_g[neighbour_index] {
                continue;
            }

            best_g[neighbour_index] = tentative_g;
            parent[neighbour_index] = Some(current);
            let h_cost = weighted(query, neighbour, goal);
            let f_cost = tentative_g.saturating_add(h_cost);
            open.push(Reverse((f_cost, h_cost, next_insertion, neighbour_index)));
            next_insertion += 1;
        }
    }

    Vec::new()
}

/// Destination reached by following the first straight run of a path.
///
/// Returns the last cell of that run together with the unit direction of the
/// run, or `None` for an empty path.
#[must_use]
pub fn shortcut_destination(
    start: CellCoord,
    path: &[CellCoord],
) -> Option<(CellCoord, AxisIntent)> {
    let (&first, rest) = path.split_first()?;
    let step = (first.column() - start.column(), first.row() - start.row());
    let mut destination = first;
    for &cell in rest {
        let delta = (
            cell.column() - destination.column(),
            cell.row() - destination.row(),
        );
        if delta != step {
            break;
        }
        destination = cell;
    }
    Some((destination, AxisIntent::new(step.0, step.1)))
}

fn weighted(query: PathQuery, from: CellCoord, to: CellCoord) -> u32 {
    query
        .heuristic
        .estimate(from, to)
        .saturating_mul(query.weight)
}

fn reconstruct(
    grid: &TileGridView<'_>,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Vec<CellCoord> {
    let mut cursor = goal_index;
    let mut cells = Vec::new();
    while cursor != start_index {
        cells.push(cell_of(grid, cursor));
        match parent.get(cursor).copied().flatten() {
            Some(next) => cursor = next,
            None => return Vec::new(),
        }
    }
    cells.reverse();
    cells
}

fn index_of(grid: &TileGridView<'_>, cell: CellCoord) -> Option<usize> {
    if !grid.contains(cell) {
        return None;
    }
    let width = usize::try_from(grid.columns()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    Some(row * width + column)
}

fn cell_of(grid: &TileGridView<'_>, index: usize) -> CellCoord {
    let width = usize::try_from(grid.columns()).unwrap_or(1).max(1);
    CellCoord::new((index % width) as i32, (index / width) as i32)
}
