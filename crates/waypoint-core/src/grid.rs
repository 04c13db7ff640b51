//! Rectangular obstacle map with linear row-major indexing.
//!
//! Loads the MAPF benchmark `.map` format: a header of `type`, `height H`,
//! `width W`, and `map` lines followed by `H` rows of cell characters, where
//! `.`, `G`, and `S` are traversable and everything else is an obstacle.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::types::{CellIndex, Orientation};

/// Map loading errors.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed map file: {0}")]
    Malformed(String),
}

/// Obstacle map. `map[row * cols + col]` is true for blocked cells.
#[derive(Debug, Clone)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub map: Vec<bool>,
    pub map_name: String,
}

impl Grid {
    /// Load a grid from a benchmark `.map` file.
    pub fn load(path: &Path) -> Result<Self, GridError> {
        let content = fs::read_to_string(path)?;
        let map_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&content, map_name)
    }

    /// Parse map file content.
    pub fn parse(content: &str, map_name: String) -> Result<Self, GridError> {
        let mut rows = None;
        let mut cols = None;
        let mut lines = content.lines();

        for line in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("type") {
                continue;
            }
            if let Some(value) = line.strip_prefix("height") {
                rows = Some(parse_dimension("height", value)?);
            } else if let Some(value) = line.strip_prefix("width") {
                cols = Some(parse_dimension("width", value)?);
            } else if line == "map" {
                break;
            } else {
                return Err(GridError::Malformed(format!(
                    "unexpected header line '{line}'"
                )));
            }
        }

        let rows = rows.ok_or_else(|| GridError::Malformed("missing height".to_string()))?;
        let cols = cols.ok_or_else(|| GridError::Malformed("missing width".to_string()))?;
        if rows == 0 || cols == 0 {
            return Err(GridError::Malformed(format!(
                "degenerate map dimensions {rows}x{cols}"
            )));
        }

        let mut map = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            let line = lines
                .next()
                .ok_or_else(|| GridError::Malformed(format!("missing map row {row}")))?;
            let cells: Vec<char> = line.trim_end().chars().collect();
            if cells.len() < cols {
                return Err(GridError::Malformed(format!(
                    "map row {row} has {} cells, expected {cols}",
                    cells.len()
                )));
            }
            for &cell in cells.iter().take(cols) {
                map.push(!matches!(cell, '.' | 'G' | 'S'));
            }
        }

        Ok(Self {
            rows,
            cols,
            map,
            map_name,
        })
    }

    /// An unobstructed grid, mainly for tests and demos.
    pub fn unobstructed(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            map: vec![false; rows * cols],
            map_name: String::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.rows * self.cols
    }

    pub fn in_bounds(&self, location: CellIndex) -> bool {
        location < self.size()
    }

    pub fn is_obstacle(&self, location: CellIndex) -> bool {
        self.map[location]
    }

    /// In bounds and not an obstacle.
    pub fn is_traversable(&self, location: CellIndex) -> bool {
        self.in_bounds(location) && !self.map[location]
    }

    pub fn row_of(&self, location: CellIndex) -> usize {
        location / self.cols
    }

    pub fn col_of(&self, location: CellIndex) -> usize {
        location % self.cols
    }

    pub fn linearize(&self, row: usize, col: usize) -> CellIndex {
        row * self.cols + col
    }

    /// The cell one step ahead along `orientation`, or `None` at the map edge.
    pub fn step(&self, location: CellIndex, orientation: Orientation) -> Option<CellIndex> {
        let row = self.row_of(location);
        let col = self.col_of(location);
        match orientation {
            Orientation::East => (col + 1 < self.cols).then(|| location + 1),
            Orientation::South => (row + 1 < self.rows).then(|| location + self.cols),
            Orientation::West => (col > 0).then(|| location - 1),
            Orientation::North => (row > 0).then(|| location - self.cols),
        }
    }
}

fn parse_dimension(name: &str, value: &str) -> Result<usize, GridError> {
    value
        .trim()
        .parse()
        .map_err(|_| GridError::Malformed(format!("invalid {name} '{}'", value.trim())))
}
