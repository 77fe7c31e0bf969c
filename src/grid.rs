//! This module implements parsing and representation of the puzzle grid, which defines the input
//! contract for slot extraction.

use std::fmt;

/// Zero-indexed (row, col) coords for a cell in the grid, where row = 0 at the top.
pub type GridCoord = (usize, usize);

/// One grid position, as parsed from the puzzle file. Immutable after parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// A block that no entry may pass through.
    Blocked,
    /// An open cell with no printed number.
    Open,
    /// An open cell carrying a crossword number.
    Numbered(u32),
}

impl Cell {
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, Cell::Blocked)
    }

    /// The crossword number printed in this cell, if any.
    #[must_use]
    pub fn number(self) -> Option<u32> {
        match self {
            Cell::Numbered(label) => Some(label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    MissingHeader,
    InvalidHeader(String),
    RowCountMismatch { declared: usize, actual: usize },
    RowLengthMismatch { row: usize, declared: usize, actual: usize },
    InvalidToken { row: usize, col: usize, token: String },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::MissingHeader => write!(f, "Grid file has no header line"),
            GridError::InvalidHeader(header) => {
                write!(f, "Grid header must be two positive integers: “{header}”")
            }
            GridError::RowCountMismatch { declared, actual } => {
                write!(f, "Grid declares {declared} rows but has {actual}")
            }
            GridError::RowLengthMismatch {
                row,
                declared,
                actual,
            } => {
                write!(
                    f,
                    "Row {row} has {actual} cells but the grid declares {declared} columns"
                )
            }
            GridError::InvalidToken { row, col, token } => {
                write!(f, "Invalid cell token “{token}” at row {row}, column {col}")
            }
        }
    }
}

/// A parsed rectangular grid of cells, stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    height: usize,
    width: usize,
}

fn parse_cell(token: &str) -> Option<Cell> {
    match token {
        "#" => Some(Cell::Blocked),
        "." => Some(Cell::Open),
        _ => token.parse::<u32>().ok().map(Cell::Numbered),
    }
}

impl Grid {
    /// Parse a grid from its textual form: a header line declaring "rows cols", followed by that
    /// many lines of whitespace-separated cell tokens (`#` block, `.` open, integer = numbered
    /// open cell). Blank lines are skipped. Any mismatch with the declared dimensions is a fatal
    /// parse error.
    pub fn parse(input: &str) -> Result<Grid, GridError> {
        let mut lines = input.lines().map(str::trim).filter(|line| !line.is_empty());

        let header = lines.next().ok_or(GridError::MissingHeader)?;
        let dims: Vec<&str> = header.split_whitespace().collect();
        let (height, width) = match dims.as_slice() {
            [rows, cols] => match (rows.parse::<usize>(), cols.parse::<usize>()) {
                (Ok(rows), Ok(cols)) if rows > 0 && cols > 0 => (rows, cols),
                _ => return Err(GridError::InvalidHeader(header.to_string())),
            },
            _ => return Err(GridError::InvalidHeader(header.to_string())),
        };

        let mut cells: Vec<Cell> = Vec::with_capacity(height * width);
        let mut actual_rows = 0;

        for (row, line) in lines.enumerate() {
            actual_rows += 1;
            if actual_rows > height {
                continue; // keep counting so the mismatch error reports the real row count
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != width {
                return Err(GridError::RowLengthMismatch {
                    row,
                    declared: width,
                    actual: tokens.len(),
                });
            }

            for (col, token) in tokens.iter().enumerate() {
                let cell = parse_cell(token).ok_or_else(|| GridError::InvalidToken {
                    row,
                    col,
                    token: (*token).to_string(),
                })?;
                cells.push(cell);
            }
        }

        if actual_rows != height {
            return Err(GridError::RowCountMismatch {
                declared: height,
                actual: actual_rows,
            });
        }

        Ok(Grid {
            cells,
            height,
            width,
        })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cell(&self, coord: GridCoord) -> Cell {
        self.cells[coord.0 * self.width + coord.1]
    }
}
