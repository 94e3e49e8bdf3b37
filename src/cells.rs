use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::coordinates::GridCoordinate;

pub type Directions = SmallVec<[Direction; 4]>;

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Every direction, in the order neighbour maps and wall listings are produced.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// The coordinate one step away in this direction.
    /// Returns None if the coordinate is not representable, the grid bounds are not checked here.
    pub fn offset(self, coord: GridCoordinate) -> Option<GridCoordinate> {
        let (x, y) = (coord.x, coord.y);
        match self {
            Direction::Left => x.checked_sub(1).map(|x| GridCoordinate::new(x, y)),
            Direction::Right => x.checked_add(1).map(|x| GridCoordinate::new(x, y)),
            Direction::Up => y.checked_sub(1).map(|y| GridCoordinate::new(x, y)),
            Direction::Down => y.checked_add(1).map(|y| GridCoordinate::new(x, y)),
        }
    }
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
struct Walls {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

/// One grid unit: a closed/open flag per side plus the generator's visited mark.
///
/// A `Cell` knows nothing about its neighbours. Keeping the wall between two cells consistent on
/// both sides is the job of `Grid`.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct Cell {
    walls: Walls,
    visited: bool,
}

/// Structured form of a cell used by the JSON dump and for structural equality in tests.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub visited: bool,
}

impl Default for Cell {
    fn default() -> Cell {
        Cell::new()
    }
}

impl Cell {
    /// All four walls closed, not visited.
    pub fn new() -> Cell {
        Cell {
            walls: Walls {
                left: true,
                right: true,
                up: true,
                down: true,
            },
            visited: false,
        }
    }

    /// Is the wall on this side closed?
    #[inline]
    pub fn wall(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.walls.left,
            Direction::Right => self.walls.right,
            Direction::Up => self.walls.up,
            Direction::Down => self.walls.down,
        }
    }

    pub fn remove_wall(&mut self, direction: Direction) {
        self.set_wall(direction, false);
    }

    pub fn add_wall(&mut self, direction: Direction) {
        self.set_wall(direction, true);
    }

    #[inline]
    pub fn visited(&self) -> bool {
        self.visited
    }

    pub fn set_visited(&mut self, visited: bool) {
        self.visited = visited;
    }

    /// The closed sides, in `Direction::ALL` order.
    pub fn walls(&self) -> Directions {
        Direction::ALL.iter().cloned().filter(|&dir| self.wall(dir)).collect()
    }

    /// The open sides, in `Direction::ALL` order.
    pub fn open_sides(&self) -> Directions {
        Direction::ALL.iter().cloned().filter(|&dir| !self.wall(dir)).collect()
    }

    pub fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            left: self.walls.left,
            right: self.walls.right,
            up: self.walls.up,
            down: self.walls.down,
            visited: self.visited,
        }
    }

    pub fn from_snapshot(snapshot: &CellSnapshot) -> Cell {
        Cell {
            walls: Walls {
                left: snapshot.left,
                right: snapshot.right,
                up: snapshot.up,
                down: snapshot.down,
            },
            visited: snapshot.visited,
        }
    }

    /// Two character text form of the cell: the floor then the right hand wall.
    ///
    /// The floor is `_` when the down wall is closed. A cursor cell shows `Ξ` over a closed floor
    /// and `=` over an open one.
    pub fn glyph(&self, cursor: bool) -> String {
        let floor = match (cursor, self.walls.down) {
            (false, true) => '_',
            (false, false) => ' ',
            (true, true) => 'Ξ',
            (true, false) => '=',
        };
        let right = if self.walls.right { '|' } else { ' ' };

        let mut glyph = String::with_capacity(4);
        glyph.push(floor);
        glyph.push(right);
        glyph
    }

    fn set_wall(&mut self, direction: Direction, closed: bool) {
        match direction {
            Direction::Left => self.walls.left = closed,
            Direction::Right => self.walls.right = closed,
            Direction::Up => self.walls.up = closed,
            Direction::Down => self.walls.down = closed,
        }
    }
}
