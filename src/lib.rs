//! **mazegen** generates perfect mazes on rectangular grids: every cell is reachable from every
//! other cell by exactly one path.
//!
//! Four carving algorithms are provided (Aldous-Broder, depth-first, growing tree and
//! hunt-and-kill), along with spanning tree checks, a text and JSON dump of the grid, random level
//! planning and a small game flow state machine.

pub mod analysis;
pub mod cells;
pub mod coordinates;
pub mod errors;
pub mod game;
pub mod generators;
pub mod grid;
pub mod grid_displays;
pub mod levels;
pub mod units;
pub mod utils;
