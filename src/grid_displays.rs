use itertools::Itertools;
use std::fmt;

use crate::cells::Direction;
use crate::coordinates::GridCoordinate;
use crate::grid::Grid;

impl Grid {
    /// Render the maze as a block of text, one line for the top boundary and one line per row.
    ///
    /// Each cell takes two characters, see `Cell::glyph`, after a leading `|` (or a space when the
    /// left boundary of that row is open). A cursor coordinate outside the grid marks nothing.
    ///
    /// ```text
    ///  _ _ _
    /// |_  | |
    /// |  _ _|
    /// ```
    pub fn render_text(&self, cursor: Option<GridCoordinate>) -> String {
        let mut lines = Vec::with_capacity(self.height() + 1);

        let top: String = (0..self.width())
            .map(|x| {
                let coord = GridCoordinate::new(x as u32, 0);
                if self.wall_closed(coord, Direction::Up) { " _" } else { "  " }
            })
            .collect();
        lines.push(top);

        for y in 0..self.height() {
            let row_start = GridCoordinate::new(0, y as u32);
            let mut row = String::with_capacity(self.width() * 2 + 1);
            row.push(if self.wall_closed(row_start, Direction::Left) { '|' } else { ' ' });

            for x in 0..self.width() {
                let coord = GridCoordinate::new(x as u32, y as u32);
                if let Ok(cell) = self.cell(coord) {
                    row.push_str(&cell.glyph(cursor == Some(coord)));
                }
            }
            lines.push(row);
        }

        lines.iter().join("\n")
    }

    fn wall_closed(&self, coord: GridCoordinate, direction: Direction) -> bool {
        self.wall_status(coord, direction).unwrap_or(true)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render_text(None))
    }
}
