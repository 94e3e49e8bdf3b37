use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A cell address on the grid.
///
/// `x` is the column, counting rightwards from 0 on the left edge.
/// `y` is the row, counting downwards from 0 on the top edge.
/// Moving `Up` decreases `y` and moving `Left` decreases `x`. Cells are stored, scanned and
/// serialized in row-major order, `index = y * width + x`.
#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd, Serialize, Deserialize)]
pub struct GridCoordinate {
    pub x: u32,
    pub y: u32,
}

impl GridCoordinate {
    pub fn new(x: u32, y: u32) -> GridCoordinate {
        GridCoordinate { x, y }
    }

    /// Convert a row-major index into a coordinate for a grid `row_length` cells wide.
    #[inline]
    pub fn from_row_major_index(index: usize, row_length: usize) -> GridCoordinate {
        let x = index % row_length;
        let y = index / row_length;
        GridCoordinate::new(x as u32, y as u32)
    }
}

impl From<(u32, u32)> for GridCoordinate {
    fn from(x_y_pair: (u32, u32)) -> GridCoordinate {
        GridCoordinate::new(x_y_pair.0, x_y_pair.1)
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
