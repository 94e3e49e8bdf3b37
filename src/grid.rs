use error_chain::bail;
use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::mem;
use std::slice;

use crate::cells::{Cell, CellSnapshot, Direction, Directions};
use crate::coordinates::GridCoordinate;
use crate::errors::*;
use crate::units::{Height, Width};

pub type CoordinateSmallVec = SmallVec<[GridCoordinate; 4]>;

/// A rectangular maze: `width * height` cells plus a fixed entrance and exit on the boundary.
///
/// Every wall mutation goes through the grid so that the wall between two adjacent cells is always
/// open on both sides or closed on both sides.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Grid {
    cells: Vec<Cell>,
    width: usize,
    height: usize,
    entrance: GridCoordinate,
    exit: GridCoordinate,
    entrance_side: Option<Direction>,
    exit_side: Option<Direction>,
    visited_count: usize,
}

/// Partial mapping from a direction to the in-bounds cell lying that way.
/// Entries are kept in `Direction::ALL` order.
#[derive(Eq, PartialEq, Clone, Debug, Default)]
pub struct Neighbours {
    entries: SmallVec<[(Direction, GridCoordinate); 4]>,
}

impl Neighbours {
    pub fn get(&self, direction: Direction) -> Option<GridCoordinate> {
        self.entries
            .iter()
            .find(|&&(dir, _)| dir == direction)
            .map(|&(_, coord)| coord)
    }

    pub fn directions(&self) -> Directions {
        self.entries.iter().map(|&(dir, _)| dir).collect()
    }

    pub fn coordinates(&self) -> CoordinateSmallVec {
        self.entries.iter().map(|&(_, coord)| coord).collect()
    }

    pub fn iter(&self) -> slice::Iter<(Direction, GridCoordinate)> {
        self.entries.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[(Direction, GridCoordinate)] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn retain<F: FnMut(GridCoordinate) -> bool>(mut self, mut keep: F) -> Neighbours {
        self.entries.retain(|entry| keep(entry.1));
        self
    }
}

/// The JSON shape of a grid: `cells[y][x]`.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: usize,
    pub height: usize,
    pub entrance: GridCoordinate,
    pub exit: GridCoordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_side: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_side: Option<Direction>,
    pub cells: Vec<Vec<CellSnapshot>>,
}

impl Grid {
    /// An unvisited grid with every wall closed.
    ///
    /// Fails with `InvalidDimensions` before allocating anything if either side is zero or the
    /// grid is too large to address or allocate, and with `OutOfBounds`/`NotOnBoundary` if the
    /// entrance or exit is not a boundary cell of the grid.
    pub fn new(width: Width,
               height: Height,
               entrance: GridCoordinate,
               exit: GridCoordinate)
               -> Result<Grid> {
        let (mut grid, cells_count) = Grid::unallocated(width, height, entrance, exit)?;

        let mut cells = Vec::new();
        if cells.try_reserve_exact(cells_count).is_err() {
            bail!(ErrorKind::InvalidDimensions(grid.width, grid.height));
        }
        cells.resize(cells_count, Cell::new());
        grid.cells = cells;
        Ok(grid)
    }

    // A checked grid header with no cells yet, and the number of cells it needs.
    fn unallocated(width: Width,
                   height: Height,
                   entrance: GridCoordinate,
                   exit: GridCoordinate)
                   -> Result<(Grid, usize)> {
        let (Width(w), Height(h)) = (width, height);
        let cells_count = validate_dimensions(w, h)?;

        let grid = Grid {
            cells: Vec::new(),
            width: w,
            height: h,
            entrance,
            exit,
            entrance_side: None,
            exit_side: None,
            visited_count: 0,
        };
        grid.check_boundary_coordinate(entrance)?;
        grid.check_boundary_coordinate(exit)?;
        Ok((grid, cells_count))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn entrance(&self) -> GridCoordinate {
        self.entrance
    }

    #[inline]
    pub fn exit(&self) -> GridCoordinate {
        self.exit
    }

    #[inline]
    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    /// Is the grid coordinate valid for this grid - within the grid's dimensions
    #[inline]
    pub fn is_valid_coordinate(&self, coord: GridCoordinate) -> bool {
        (coord.x as usize) < self.width && (coord.y as usize) < self.height
    }

    /// Convert a grid coordinate to a one dimensional row-major index in the range 0..grid.size().
    pub fn grid_coordinate_to_index(&self, coord: GridCoordinate) -> Result<usize> {
        if self.is_valid_coordinate(coord) {
            Ok(coord.y as usize * self.width + coord.x as usize)
        } else {
            Err(ErrorKind::OutOfBounds(coord).into())
        }
    }

    pub fn cell(&self, coord: GridCoordinate) -> Result<&Cell> {
        let index = self.grid_coordinate_to_index(coord)?;
        Ok(&self.cells[index])
    }

    /// Is the wall on the `direction` side of the cell closed?
    pub fn wall_status(&self, coord: GridCoordinate, direction: Direction) -> Result<bool> {
        Ok(self.cell(coord)?.wall(direction))
    }

    pub fn is_cell_visited(&self, coord: GridCoordinate) -> Result<bool> {
        Ok(self.cell(coord)?.visited())
    }

    /// Mark a cell visited. Visiting a visited cell changes nothing.
    pub fn visit_cell(&mut self, coord: GridCoordinate) -> Result<()> {
        let index = self.grid_coordinate_to_index(coord)?;
        let cell = &mut self.cells[index];
        if !cell.visited() {
            cell.set_visited(true);
            self.visited_count += 1;
        }
        Ok(())
    }

    /// The in-bounds cell one step away in `direction`, if any.
    pub fn neighbour_at_direction(&self,
                                  coord: GridCoordinate,
                                  direction: Direction)
                                  -> Option<GridCoordinate> {
        direction.offset(coord).filter(|&neighbour| self.is_valid_coordinate(neighbour))
    }

    /// Cells that are to the left, right, above or below a cell, but not necessarily reachable
    /// through an open wall. Edge and corner cells leave out the directions that leave the grid.
    pub fn neighbour_coordinates(&self, coord: GridCoordinate) -> Result<Neighbours> {
        let _ = self.grid_coordinate_to_index(coord)?;
        let entries = Direction::ALL
            .iter()
            .filter_map(|&dir| self.neighbour_at_direction(coord, dir).map(|n| (dir, n)))
            .collect();
        Ok(Neighbours { entries })
    }

    pub fn visited_neighbours(&self, coord: GridCoordinate) -> Result<Neighbours> {
        Ok(self.neighbour_coordinates(coord)?.retain(|n| self.is_visited_unchecked(n)))
    }

    pub fn unvisited_neighbours(&self, coord: GridCoordinate) -> Result<Neighbours> {
        Ok(self.neighbour_coordinates(coord)?.retain(|n| !self.is_visited_unchecked(n)))
    }

    /// Every unvisited cell in row-major order.
    pub fn unvisited_cells(&self) -> Vec<GridCoordinate> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, cell)| !cell.visited())
            .map(|(index, _)| GridCoordinate::from_row_major_index(index, self.width))
            .collect()
    }

    /// Open the wall on the `direction` side of a cell and, when that side faces another cell,
    /// the matching wall of the neighbour.
    pub fn remove_wall(&mut self, coord: GridCoordinate, direction: Direction) -> Result<()> {
        self.set_wall(coord, direction, false)
    }

    /// Close the wall on the `direction` side of a cell and the matching wall of the neighbour.
    pub fn add_wall(&mut self, coord: GridCoordinate, direction: Direction) -> Result<()> {
        self.set_wall(coord, direction, true)
    }

    /// The sides of a cell that face out of the grid.
    pub fn boundary_sides(&self, coord: GridCoordinate) -> Result<Directions> {
        let _ = self.grid_coordinate_to_index(coord)?;
        Ok(Direction::ALL
            .iter()
            .cloned()
            .filter(|&dir| self.neighbour_at_direction(coord, dir).is_none())
            .collect())
    }

    /// The boundary sides the entrance and exit will be opened on, if chosen.
    pub fn opening_sides(&self) -> (Option<Direction>, Option<Direction>) {
        (self.entrance_side, self.exit_side)
    }

    /// Choose which boundary side `open_entrance_and_exit` opens at the entrance and at the exit.
    /// `None` leaves the choice to the default order. A side that does not face out of the grid
    /// fails with `NotOnBoundary`.
    pub fn set_opening_sides(&mut self,
                             entrance_side: Option<Direction>,
                             exit_side: Option<Direction>)
                             -> Result<()> {
        for &(coord, side) in &[(self.entrance, entrance_side), (self.exit, exit_side)] {
            if let Some(side) = side {
                if !self.boundary_sides(coord)?.contains(&side) {
                    bail!(ErrorKind::NotOnBoundary(coord));
                }
            }
        }
        self.entrance_side = entrance_side;
        self.exit_side = exit_side;
        Ok(())
    }

    /// Open one boundary wall at the entrance and one at the exit.
    ///
    /// Each uses its chosen side (see `set_opening_sides`), otherwise its first boundary side in
    /// `Direction::ALL` order. Without a chosen side, an exit on the entrance cell takes the next
    /// boundary side that is still closed. A cell with a single boundary side can only have one
    /// opening, so an entrance and exit on such a cell share it.
    pub fn open_entrance_and_exit(&mut self) -> Result<()> {
        let (entrance, exit) = (self.entrance, self.exit);

        let entrance_side = match self.entrance_side {
            Some(side) => side,
            None => {
                *self.boundary_sides(entrance)?
                    .first()
                    .ok_or_else(|| Error::from(ErrorKind::NotOnBoundary(entrance)))?
            }
        };
        self.remove_wall(entrance, entrance_side)?;
        if let Some(side) = self.exit_side {
            return self.remove_wall(exit, side);
        }

        let exit_sides = self.boundary_sides(exit)?;
        let closed_side = exit_sides.iter()
            .cloned()
            .find(|&dir| self.cells[self.index_unchecked(exit)].wall(dir));
        let exit_side = closed_side.or_else(|| exit_sides.first().cloned())
            .ok_or_else(|| Error::from(ErrorKind::NotOnBoundary(exit)))?;
        self.remove_wall(exit, exit_side)
    }

    /// Where a step from `coord` in `direction` lands, if the wall that way is open and the step
    /// stays on the grid.
    pub fn can_move(&self,
                    coord: GridCoordinate,
                    direction: Direction)
                    -> Result<Option<GridCoordinate>> {
        if self.wall_status(coord, direction)? {
            Ok(None)
        } else {
            Ok(self.neighbour_at_direction(coord, direction))
        }
    }

    /// Row-major iterator over every coordinate of the grid.
    pub fn iter(&self) -> CellIter {
        CellIter {
            current_cell_number: 0,
            row_length: self.width,
            cells_count: self.cells.len(),
        }
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let cells = self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(Cell::snapshot).collect())
            .collect();
        GridSnapshot {
            width: self.width,
            height: self.height,
            entrance: self.entrance,
            exit: self.exit,
            entrance_side: self.entrance_side,
            exit_side: self.exit_side,
            cells,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&self.snapshot())?)
    }

    /// Rebuild a grid from its snapshot.
    ///
    /// Rows of the wrong length or a wall that is open on one side only fail with
    /// `InconsistentState`.
    pub fn from_snapshot(snapshot: &GridSnapshot) -> Result<Grid> {
        // Rows are matched against the header before anything is sized from it.
        if snapshot.cells.len() != snapshot.height {
            bail!(ErrorKind::InconsistentState(format!("expected {} rows, found {}",
                                                       snapshot.height,
                                                       snapshot.cells.len())));
        }
        for (y, row) in snapshot.cells.iter().enumerate() {
            if row.len() != snapshot.width {
                bail!(ErrorKind::InconsistentState(format!("row {} has {} cells, expected {}",
                                                           y,
                                                           row.len(),
                                                           snapshot.width)));
            }
        }

        let (mut grid, _) = Grid::unallocated(Width(snapshot.width),
                                              Height(snapshot.height),
                                              snapshot.entrance,
                                              snapshot.exit)?;
        grid.set_opening_sides(snapshot.entrance_side, snapshot.exit_side)?;

        grid.cells = snapshot.cells
            .iter()
            .flat_map(|row| row.iter().map(Cell::from_snapshot))
            .collect();
        grid.visited_count = grid.cells.iter().filter(|cell| cell.visited()).count();

        for coord in grid.iter() {
            for &dir in &[Direction::Right, Direction::Down] {
                if let Some(neighbour) = grid.neighbour_at_direction(coord, dir) {
                    let here = grid.cells[grid.index_unchecked(coord)].wall(dir);
                    let there = grid.cells[grid.index_unchecked(neighbour)].wall(dir.opposite());
                    if here != there {
                        bail!(ErrorKind::InconsistentState(format!("asymmetric wall between {} \
                                                                    and {}",
                                                                   coord,
                                                                   neighbour)));
                    }
                }
            }
        }

        Ok(grid)
    }

    pub fn from_json(json: &str) -> Result<Grid> {
        let snapshot: GridSnapshot = serde_json::from_str(json)?;
        Grid::from_snapshot(&snapshot)
    }

    fn set_wall(&mut self, coord: GridCoordinate, direction: Direction, closed: bool) -> Result<()> {
        let index = self.grid_coordinate_to_index(coord)?;
        let neighbour_index = self.neighbour_at_direction(coord, direction)
            .map(|neighbour| self.index_unchecked(neighbour));

        apply_wall(&mut self.cells[index], direction, closed);
        if let Some(n) = neighbour_index {
            apply_wall(&mut self.cells[n], direction.opposite(), closed);
        }
        Ok(())
    }

    // Breaks wall symmetry on purpose, for exercising the checks that detect it.
    #[cfg(test)]
    pub(crate) fn remove_wall_one_sided(&mut self,
                                        coord: GridCoordinate,
                                        direction: Direction)
                                        -> Result<()> {
        let index = self.grid_coordinate_to_index(coord)?;
        apply_wall(&mut self.cells[index], direction, false);
        Ok(())
    }

    fn check_boundary_coordinate(&self, coord: GridCoordinate) -> Result<()> {
        if !self.is_valid_coordinate(coord) {
            bail!(ErrorKind::OutOfBounds(coord));
        }
        let (x, y) = (coord.x as usize, coord.y as usize);
        let on_boundary = x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height;
        if !on_boundary {
            bail!(ErrorKind::NotOnBoundary(coord));
        }
        Ok(())
    }

    // Only for coordinates already known to be in bounds.
    #[inline]
    fn index_unchecked(&self, coord: GridCoordinate) -> usize {
        coord.y as usize * self.width + coord.x as usize
    }

    #[inline]
    fn is_visited_unchecked(&self, coord: GridCoordinate) -> bool {
        self.cells[self.index_unchecked(coord)].visited()
    }
}

fn apply_wall(cell: &mut Cell, direction: Direction, closed: bool) {
    if closed {
        cell.add_wall(direction);
    } else {
        cell.remove_wall(direction);
    }
}

fn validate_dimensions(width: usize, height: usize) -> Result<usize> {
    let max_side = u32::MAX as usize;
    if width == 0 || height == 0 || width > max_side || height > max_side {
        bail!(ErrorKind::InvalidDimensions(width, height));
    }
    let cells_count = width.checked_mul(height)
        .ok_or_else(|| Error::from(ErrorKind::InvalidDimensions(width, height)))?;
    match cells_count.checked_mul(mem::size_of::<Cell>()) {
        Some(bytes) if bytes <= isize::MAX as usize => Ok(cells_count),
        _ => Err(ErrorKind::InvalidDimensions(width, height).into()),
    }
}

#[derive(Debug, Copy, Clone)]
pub struct CellIter {
    current_cell_number: usize,
    row_length: usize,
    cells_count: usize,
}

impl Iterator for CellIter {
    type Item = GridCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_cell_number < self.cells_count {
            let coord = GridCoordinate::from_row_major_index(self.current_cell_number,
                                                             self.row_length);
            self.current_cell_number += 1;
            Some(coord)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let lower_bound = self.cells_count - self.current_cell_number;
        let upper_bound = lower_bound;
        (lower_bound, Some(upper_bound))
    }
}
impl ExactSizeIterator for CellIter {} // default impl using size_hint()

impl<'a> IntoIterator for &'a Grid {
    type Item = GridCoordinate;
    type IntoIter = CellIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
