//! This module implements code for turning a parsed grid and word list into the slot/constraint
//! model consumed by the search engine, independent of the search algorithm itself.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde_derive::{Deserialize, Serialize};

use crate::grid::{Grid, GridCoord};
use crate::types::WordId;
use crate::word_list::WordList;

/// An identifier for a given slot, based on its index in the `GridConfig`'s `slot_configs` field.
pub type SlotId = usize;

/// An identifier for the intersection constraint between two slots, based on its index in the
/// `GridConfig`'s `constraints` field.
pub type ConstraintId = usize;

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Across,
    Down,
}

/// A struct representing the aspects of a slot in the grid that are static during solving.
#[derive(Debug, Clone)]
pub struct SlotConfig {
    pub id: SlotId,

    /// The crossword number printed in this slot's starting cell, if any.
    pub number: Option<u32>,

    /// A stable identity string: the printed number plus an `a`/`d` suffix when numbered, else
    /// derived from the starting coordinates, so across and down slots sharing a start cell stay
    /// distinct.
    pub name: String,

    pub start_cell: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl SlotConfig {
    /// Generate the coords for each cell of this slot.
    #[must_use]
    pub fn cell_coords(&self) -> Vec<GridCoord> {
        (0..self.length)
            .map(|cell_idx| match self.direction {
                Direction::Across => (self.start_cell.0, self.start_cell.1 + cell_idx),
                Direction::Down => (self.start_cell.0 + cell_idx, self.start_cell.1),
            })
            .collect()
    }
}

/// An equality constraint between two slots that share a grid cell: any pair of words assigned to
/// `slot_a` and `slot_b` simultaneously must agree at the given positions. Constraints are derived
/// once from the grid and are immutable; slots are referenced by id rather than owned.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: ConstraintId,
    pub slot_a: SlotId,
    /// 0-based index of the shared cell within `slot_a`'s word.
    pub cell_a: usize,
    pub slot_b: SlotId,
    /// 0-based index of the shared cell within `slot_b`'s word.
    pub cell_b: usize,
}

impl Constraint {
    /// The slot on the far side of this constraint from `slot_id`, as
    /// (other slot, cell index within the other's word, cell index within our own word).
    #[must_use]
    pub fn other_end(&self, slot_id: SlotId) -> (SlotId, usize, usize) {
        if slot_id == self.slot_a {
            (self.slot_b, self.cell_b, self.cell_a)
        } else {
            (self.slot_a, self.cell_a, self.cell_b)
        }
    }
}

fn slot_name(number: Option<u32>, start_cell: GridCoord, direction: Direction) -> String {
    let suffix = match direction {
        Direction::Across => 'a',
        Direction::Down => 'd',
    };

    match number {
        Some(number) => format!("{number}{suffix}"),
        None => format!("r{}c{}{}", start_cell.0, start_cell.1, suffix),
    }
}

/// Scan the grid for slots: every maximal run of open cells with length > 1 is one slot. Across
/// slots are produced first (in row order), then down slots (in column order); ids follow this
/// extraction order. Single-cell runs yield no slot for that direction.
#[must_use]
pub fn generate_slot_configs(grid: &Grid) -> Vec<SlotConfig> {
    let mut runs: Vec<(GridCoord, Direction, usize)> = vec![];

    for row in 0..grid.height() {
        let mut run_start: Option<usize> = None;

        // The extra iteration past the last column closes any run touching the edge.
        for col in 0..=grid.width() {
            let open = col < grid.width() && grid.cell((row, col)).is_open();

            match (open, run_start) {
                (true, None) => run_start = Some(col),
                (false, Some(start)) => {
                    if col - start > 1 {
                        runs.push(((row, start), Direction::Across, col - start));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    for col in 0..grid.width() {
        let mut run_start: Option<usize> = None;

        for row in 0..=grid.height() {
            let open = row < grid.height() && grid.cell((row, col)).is_open();

            match (open, run_start) {
                (true, None) => run_start = Some(row),
                (false, Some(start)) => {
                    if row - start > 1 {
                        runs.push(((start, col), Direction::Down, row - start));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    runs.into_iter()
        .enumerate()
        .map(|(id, (start_cell, direction, length))| {
            let number = grid.cell(start_cell).number();

            SlotConfig {
                id,
                number,
                name: slot_name(number, start_cell, direction),
                start_cell,
                direction,
                length,
            }
        })
        .collect()
}

/// Find every grid cell covered by two or more slots and emit one equality constraint per
/// unordered pair of slots meeting there, plus an adjacency index from each slot to the
/// constraints touching it. In the crossword topology each shared cell is exactly one
/// across/down pair, but the pair enumeration doesn't rely on that.
#[must_use]
pub fn generate_constraints(
    slot_configs: &[SlotConfig],
) -> (Vec<Constraint>, Vec<Vec<ConstraintId>>) {
    let mut coverage: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();

    for slot in slot_configs {
        for (cell_idx, coord) in slot.cell_coords().into_iter().enumerate() {
            coverage.entry(coord).or_default().push((slot.id, cell_idx));
        }
    }

    // Emit constraints in row-major cell order so constraint ids are deterministic.
    let mut shared: Vec<(GridCoord, Vec<(SlotId, usize)>)> = coverage
        .into_iter()
        .filter(|(_, entries)| entries.len() > 1)
        .collect();
    shared.sort_by_key(|&(coord, _)| coord);

    let mut constraints: Vec<Constraint> = vec![];
    let mut adjacency: Vec<Vec<ConstraintId>> = vec![vec![]; slot_configs.len()];

    for (_, entries) in shared {
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let id = constraints.len();
                let (slot_a, cell_a) = entries[i];
                let (slot_b, cell_b) = entries[j];

                constraints.push(Constraint {
                    id,
                    slot_a,
                    cell_a,
                    slot_b,
                    cell_b,
                });
                adjacency[slot_a].push(id);
                adjacency[slot_b].push(id);
            }
        }
    }

    (constraints, adjacency)
}

/// Generate the candidate domain for each slot: every word of the slot's length. Buckets are
/// sorted at load time, so ascending word ids are already in lexicographic order.
#[must_use]
pub fn generate_slot_options(
    word_list: &WordList,
    slot_configs: &[SlotConfig],
) -> Vec<Vec<WordId>> {
    slot_configs
        .iter()
        .map(|slot| (0..word_list.bucket(slot.length).len()).collect())
        .collect()
}

/// Slot ids sorted into puzzle order: ascending by printed number, across before down at equal
/// number. Slots without a number sort after all numbered ones, by position.
#[must_use]
pub fn puzzle_order(slot_configs: &[SlotConfig]) -> Vec<SlotId> {
    let mut order: Vec<SlotId> = (0..slot_configs.len()).collect();

    order.sort_by_key(|&id| {
        let slot = &slot_configs[id];
        (
            slot.number.unwrap_or(u32::MAX),
            slot.start_cell,
            slot.direction,
        )
    });

    order
}

/// A struct holding all of the information needed as input to a solve: the grid, the word list,
/// and the slot/constraint model derived from them. Built once per solve and read-only during
/// search.
pub struct GridConfig {
    pub word_list: WordList,
    pub grid: Grid,
    pub slot_configs: Vec<SlotConfig>,
    pub constraints: Vec<Constraint>,

    /// For each slot, the ids of the constraints it participates in.
    pub adjacency: Vec<Vec<ConstraintId>>,

    /// For each slot, the candidate words from the word list, in lexicographic order.
    pub slot_options: Vec<Vec<WordId>>,
}

/// Build a `GridConfig` by deriving the slot/constraint model from the given grid and word list.
#[must_use]
pub fn generate_grid_config(word_list: WordList, grid: Grid) -> GridConfig {
    let slot_configs = generate_slot_configs(&grid);
    let (constraints, adjacency) = generate_constraints(&slot_configs);
    let slot_options = generate_slot_options(&word_list, &slot_configs);

    GridConfig {
        word_list,
        grid,
        slot_configs,
        constraints,
        adjacency,
        slot_options,
    }
}

/// A struct recording a slot assignment made during a solve.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// Turn the given grid config and choices into a rendered string: blocked cells as `#`, unfilled
/// open cells as `.`, filled cells as their letter.
#[must_use]
pub fn render_grid(config: &GridConfig, choices: &[Choice]) -> String {
    let width = config.grid.width();
    let mut letters: Vec<Option<char>> = vec![None; width * config.grid.height()];

    for &Choice { slot_id, word_id } in choices {
        let slot = &config.slot_configs[slot_id];
        let word = config.word_list.word(slot.length, word_id);

        for (coord, &glyph) in slot.cell_coords().iter().zip(&word.glyphs) {
            letters[coord.0 * width + coord.1] = Some(config.word_list.glyphs[glyph]);
        }
    }

    letters
        .chunks(width)
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, letter)| match letter {
                    Some(letter) => *letter,
                    None if config.grid.cell((row, col)).is_open() => '.',
                    None => '#',
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
