//! Structural checks over a carved grid: wall symmetry and the spanning tree property.

use bit_set::BitSet;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::VecDeque;

use crate::cells::Direction;
use crate::coordinates::GridCoordinate;
use crate::errors::*;
use crate::grid::Grid;

/// Interior walls that are open on one side and closed on the other.
/// Each broken wall is reported once, from the cell on its left or above it.
pub fn wall_symmetry_violations(grid: &Grid) -> Vec<(GridCoordinate, Direction)> {
    let mut violations = vec![];
    for coord in grid.iter() {
        for &dir in &[Direction::Right, Direction::Down] {
            if let Some(neighbour) = grid.neighbour_at_direction(coord, dir) {
                let here = grid.wall_status(coord, dir);
                let there = grid.wall_status(neighbour, dir.opposite());
                if let (Ok(here), Ok(there)) = (here, there) {
                    if here != there {
                        violations.push((coord, dir));
                    }
                }
            }
        }
    }
    violations
}

/// The passages of the maze as an undirected graph.
///
/// Node `i` is the cell with row-major index `i`, weighted by its coordinate. There is one edge per
/// open interior wall; the entrance and exit openings lead nowhere and are not edges.
pub fn passage_graph(grid: &Grid) -> UnGraph<GridCoordinate, ()> {
    let mut graph = UnGraph::with_capacity(grid.size(), grid.size().saturating_sub(1));
    for coord in grid.iter() {
        let _ = graph.add_node(coord);
    }

    for coord in grid.iter() {
        for &dir in &[Direction::Right, Direction::Down] {
            if let Ok(Some(neighbour)) = grid.can_move(coord, dir) {
                if let (Ok(a), Ok(b)) = (grid.grid_coordinate_to_index(coord),
                                         grid.grid_coordinate_to_index(neighbour)) {
                    let _ = graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), ());
                }
            }
        }
    }
    graph
}

/// Number of open interior walls.
pub fn passage_count(grid: &Grid) -> usize {
    passage_graph(grid).edge_count()
}

/// How many cells can be reached from `start` through open walls, `start` included.
pub fn reachable_count(grid: &Grid, start: GridCoordinate) -> Result<usize> {
    let start_index = grid.grid_coordinate_to_index(start)?;

    let mut seen = BitSet::with_capacity(grid.size());
    let _ = seen.insert(start_index);
    let mut frontier = VecDeque::new();
    frontier.push_back(start);

    while let Some(coord) = frontier.pop_front() {
        for &dir in Direction::ALL.iter() {
            if let Some(next) = grid.can_move(coord, dir)? {
                if seen.insert(grid.grid_coordinate_to_index(next)?) {
                    frontier.push_back(next);
                }
            }
        }
    }

    Ok(seen.len())
}

/// Is the open-wall graph a spanning tree over every cell?
///
/// Walls must be symmetric, there must be `size - 1` passages, one connected component and no
/// cycle.
pub fn is_perfect(grid: &Grid) -> bool {
    if !wall_symmetry_violations(grid).is_empty() {
        return false;
    }
    let graph = passage_graph(grid);
    graph.edge_count() + 1 == grid.size() && connected_components(&graph) == 1 &&
    !is_cyclic_undirected(&graph)
}
