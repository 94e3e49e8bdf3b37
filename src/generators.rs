use error_chain::bail;
use log::{debug, trace};
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::cells::Direction;
use crate::coordinates::GridCoordinate;
use crate::errors::*;
use crate::grid::{Grid, Neighbours};
use crate::units::{Height, Width};
use crate::utils::{random_entry, random_index, random_range, shuffle};

pub const DEFAULT_BACKTRACK_CHANCE: f64 = 0.5;

/// Where the hunt phase of hunt-and-kill looks for its next starting cell.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum HuntPolicy {
    /// Shuffle the unvisited cells on every hunt and take the first one next to the visited region.
    Random,
    /// Take the first unvisited cell in row-major order. Cheaper to scan, visibly more regular.
    Serpentine,
}

impl Default for HuntPolicy {
    fn default() -> HuntPolicy {
        HuntPolicy::Random
    }
}

impl FromStr for HuntPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<HuntPolicy> {
        match s {
            "random" => Ok(HuntPolicy::Random),
            "serpentine" => Ok(HuntPolicy::Serpentine),
            other => {
                Err(ErrorKind::InvalidParameter(format!("unknown hunt policy '{}'", other)).into())
            }
        }
    }
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub enum Algorithm {
    AldousBroder,
    DepthFirst,
    /// `backtrack_chance` in [0, 1]: 1.0 behaves as depth-first, 0.0 approximates Prim's algorithm.
    GrowingTree { backtrack_chance: f64 },
    HuntAndKill(HuntPolicy),
}

impl Algorithm {
    pub const NAMES: [&'static str; 4] = ["aldous-broder", "depth-first", "growing-tree", "hunt-and-kill"];

    /// Growing tree with the default backtrack chance.
    pub fn growing_tree() -> Algorithm {
        Algorithm::GrowingTree { backtrack_chance: DEFAULT_BACKTRACK_CHANCE }
    }

    /// Hunt-and-kill with the default (random) hunt policy.
    pub fn hunt_and_kill() -> Algorithm {
        Algorithm::HuntAndKill(HuntPolicy::default())
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Algorithm::AldousBroder => Algorithm::NAMES[0],
            Algorithm::DepthFirst => Algorithm::NAMES[1],
            Algorithm::GrowingTree { .. } => Algorithm::NAMES[2],
            Algorithm::HuntAndKill(_) => Algorithm::NAMES[3],
        }
    }

    fn validate(&self) -> Result<()> {
        if let Algorithm::GrowingTree { backtrack_chance } = *self {
            check_backtrack_chance(backtrack_chance)?;
        }
        Ok(())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    /// Parses an algorithm name, using the default parameters.
    fn from_str(s: &str) -> Result<Algorithm> {
        match s {
            "aldous-broder" => Ok(Algorithm::AldousBroder),
            "depth-first" => Ok(Algorithm::DepthFirst),
            "growing-tree" => Ok(Algorithm::growing_tree()),
            "hunt-and-kill" => Ok(Algorithm::hunt_and_kill()),
            other => Err(ErrorKind::InvalidParameter(format!("unknown algorithm '{}'", other)).into()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Algorithm::GrowingTree { backtrack_chance } => {
                write!(f, "{} (backtrack chance {})", self.name(), backtrack_chance)
            }
            Algorithm::HuntAndKill(policy) => write!(f, "{} ({:?} hunt)", self.name(), policy),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Build a new grid and carve a perfect maze into it with the chosen algorithm.
///
/// Parameters and dimensions are checked before the grid is allocated.
pub fn generate<R: Rng + ?Sized>(algorithm: Algorithm,
                                 width: Width,
                                 height: Height,
                                 entrance: GridCoordinate,
                                 exit: GridCoordinate,
                                 rng: &mut R)
                                 -> Result<Grid> {
    algorithm.validate()?;
    let mut grid = Grid::new(width, height, entrance, exit)?;
    carve(algorithm, &mut grid, rng)?;
    Ok(grid)
}

/// Carve a perfect maze into a fresh grid with the chosen algorithm, then open its entrance and
/// exit.
pub fn carve<R: Rng + ?Sized>(algorithm: Algorithm, grid: &mut Grid, rng: &mut R) -> Result<()> {
    algorithm.validate()?;

    debug!("generating {}x{} maze with {}", grid.width(), grid.height(), algorithm);
    match algorithm {
        Algorithm::AldousBroder => aldous_broder(grid, rng),
        Algorithm::DepthFirst => depth_first(grid, rng),
        Algorithm::GrowingTree { backtrack_chance } => growing_tree(grid, backtrack_chance, rng),
        Algorithm::HuntAndKill(policy) => hunt_and_kill(grid, policy, rng),
    }
}

/// Apply the Aldous-Broder algorithm to a fresh grid.
///
/// A random walk that opens a wall every time it steps into a cell it has not seen before. Every
/// spanning tree is equally likely, but the walk keeps stepping over visited cells until the last
/// one is found, so the cost is the cover time of the grid.
pub fn aldous_broder<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Result<()> {
    let start = match random_entry(rng, &grid.unvisited_cells()) {
        Some(&coord) => coord,
        None => return grid.open_entrance_and_exit(),
    };
    grid.visit_cell(start)?;

    let mut current = start;
    let mut wasted_steps = 0usize;
    while grid.visited_count() < grid.size() {
        let unvisited = grid.unvisited_neighbours(current)?;
        if let Some(&(direction, next)) = random_entry(rng, unvisited.as_slice()) {
            grid.remove_wall(current, direction)?;
            grid.visit_cell(next)?;
            current = next;
            continue;
        }

        let visited = grid.visited_neighbours(current)?;
        match random_entry(rng, visited.as_slice()) {
            Some(&(_, next)) => {
                wasted_steps += 1;
                current = next;
            }
            None => {
                trace!("aldous-broder stopped at {}, no neighbours to walk to", current);
                break;
            }
        }
    }

    debug!("aldous-broder finished with {} wasted steps", wasted_steps);
    grid.open_entrance_and_exit()
}

/// Apply the depth first search (recursive backtracker) algorithm to a fresh grid.
///
/// Long twisting corridors with few dead ends. The stack holds the current path from the start
/// cell; a cell with no unvisited neighbours is popped to backtrack.
pub fn depth_first<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> Result<()> {
    let start = random_start(grid, rng);
    grid.visit_cell(start)?;

    let mut stack = vec![start];
    let mut max_depth = 1usize;
    while let Some(&current) = stack.last() {
        let unvisited = grid.unvisited_neighbours(current)?;
        match random_entry(rng, unvisited.as_slice()) {
            Some(&(direction, next)) => {
                grid.remove_wall(current, direction)?;
                grid.visit_cell(next)?;
                stack.push(next);
                max_depth = max_depth.max(stack.len());
            }
            None => {
                let _ = stack.pop();
            }
        }
    }

    debug!("depth-first finished, deepest path {} cells", max_depth);
    grid.open_entrance_and_exit()
}

/// Apply the growing tree algorithm to a fresh grid.
///
/// With probability `backtrack_chance` the newest active cell is grown, giving depth-first style
/// corridors, otherwise a random active cell is grown, giving Prim style branching.
pub fn growing_tree<R: Rng + ?Sized>(grid: &mut Grid,
                                     backtrack_chance: f64,
                                     rng: &mut R)
                                     -> Result<()> {
    check_backtrack_chance(backtrack_chance)?;

    // Same start draw as depth-first, so a backtrack chance of 1.0 carves the same maze.
    let start = random_start(grid, rng);
    grid.visit_cell(start)?;

    let mut active = vec![start];
    let mut iterations = 0usize;
    while !active.is_empty() {
        iterations += 1;
        let newest = active.len() - 1;
        let index = if rng.gen_bool(backtrack_chance) {
            newest
        } else {
            random_index(rng, active.len()).unwrap_or(newest)
        };
        let current = active[index];

        let unvisited = grid.unvisited_neighbours(current)?;
        match random_entry(rng, unvisited.as_slice()) {
            Some(&(direction, next)) => {
                grid.remove_wall(current, direction)?;
                grid.visit_cell(next)?;
                active.push(next);
            }
            None => {
                // Keep the order, the newest cell must stay last.
                let _ = active.remove(index);
            }
        }
    }

    debug!("growing tree finished after {} iterations", iterations);
    grid.open_entrance_and_exit()
}

/// Apply the hunt-and-kill algorithm to a fresh grid.
///
/// Random walks that carve until they run into a dead end, then a hunt for an unvisited cell that
/// touches the carved region, which is joined to it and starts the next walk. The serpentine policy
/// always starts walking from the top left cell.
pub fn hunt_and_kill<R: Rng + ?Sized>(grid: &mut Grid,
                                      policy: HuntPolicy,
                                      rng: &mut R)
                                      -> Result<()> {
    let start = match policy {
        HuntPolicy::Random => random_start(grid, rng),
        HuntPolicy::Serpentine => GridCoordinate::new(0, 0),
    };
    grid.visit_cell(start)?;

    let mut current = start;
    let mut hunts = 0usize;
    loop {
        walk(grid, current, rng)?;

        let hunted = match policy {
            HuntPolicy::Random => random_hunt(grid, rng)?,
            HuntPolicy::Serpentine => serpentine_hunt(grid)?,
        };
        let (coord, visited) = match hunted {
            Some(found) => found,
            None => break,
        };
        let direction = match random_entry(rng, visited.as_slice()) {
            Some(&(direction, _)) => direction,
            None => {
                trace!("hunted cell {} has no visited neighbour", coord);
                break;
            }
        };

        grid.remove_wall(coord, direction)?;
        grid.visit_cell(coord)?;
        current = coord;
        hunts += 1;
    }

    if grid.visited_count() < grid.size() {
        debug!("hunt found nothing with {} of {} cells visited",
               grid.visited_count(),
               grid.size());
    }
    debug!("hunt-and-kill finished after {} hunts", hunts);
    grid.open_entrance_and_exit()
}

fn check_backtrack_chance(backtrack_chance: f64) -> Result<()> {
    if !(backtrack_chance >= 0.0 && backtrack_chance <= 1.0) {
        bail!(ErrorKind::InvalidParameter(format!("backtrack chance {} is outside [0, 1]",
                                                  backtrack_chance)));
    }
    Ok(())
}

// Column first, then row.
fn random_start<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> GridCoordinate {
    let x = random_range(rng, 0, grid.width()).unwrap_or(0);
    let y = random_range(rng, 0, grid.height()).unwrap_or(0);
    GridCoordinate::new(x as u32, y as u32)
}

/// Carve from `start` in random directions until every neighbour of the current cell is visited.
fn walk<R: Rng + ?Sized>(grid: &mut Grid, start: GridCoordinate, rng: &mut R) -> Result<usize> {
    let mut current = start;
    let mut steps = 0;
    loop {
        let mut options: SmallVec<[(Direction, GridCoordinate); 4]> =
            grid.unvisited_neighbours(current)?.iter().cloned().collect();
        shuffle(rng, &mut options);

        let (direction, next) = match options.first() {
            Some(&option) => option,
            None => break,
        };
        grid.remove_wall(current, direction)?;
        grid.visit_cell(next)?;
        current = next;
        steps += 1;
    }

    trace!("walk from {} carved {} cells", start, steps);
    Ok(steps)
}

fn random_hunt<R: Rng + ?Sized>(grid: &Grid,
                                rng: &mut R)
                                -> Result<Option<(GridCoordinate, Neighbours)>> {
    let mut candidates = grid.unvisited_cells();
    shuffle(rng, &mut candidates);
    first_touching_visited(grid, &candidates)
}

fn serpentine_hunt(grid: &Grid) -> Result<Option<(GridCoordinate, Neighbours)>> {
    let candidates = grid.unvisited_cells();
    let first = match candidates.first() {
        Some(&coord) => coord,
        None => return Ok(None),
    };

    // Everything before the first unvisited cell in row-major order is visited, so unless it is the
    // top left cell it has a visited neighbour to its left or above.
    let visited = grid.visited_neighbours(first)?;
    if !visited.is_empty() {
        return Ok(Some((first, visited)));
    }
    trace!("first unvisited cell {} is cut off, scanning on", first);
    first_touching_visited(grid, &candidates[1..])
}

fn first_touching_visited(grid: &Grid,
                          candidates: &[GridCoordinate])
                          -> Result<Option<(GridCoordinate, Neighbours)>> {
    for &coord in candidates {
        let visited = grid.visited_neighbours(coord)?;
        if !visited.is_empty() {
            return Ok(Some((coord, visited)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::analysis;
    use crate::utils::seeded_rng;
    use itertools::Itertools;
    use quickcheck::{quickcheck, TestResult};
    use rand::rngs::mock::StepRng;

    fn gc(x: u32, y: u32) -> GridCoordinate {
        GridCoordinate::new(x, y)
    }

    fn all_algorithms() -> Vec<Algorithm> {
        vec![Algorithm::AldousBroder,
             Algorithm::DepthFirst,
             Algorithm::growing_tree(),
             Algorithm::GrowingTree { backtrack_chance: 0.0 },
             Algorithm::GrowingTree { backtrack_chance: 1.0 },
             Algorithm::HuntAndKill(HuntPolicy::Random),
             Algorithm::HuntAndKill(HuntPolicy::Serpentine)]
    }

    fn corner_maze(algorithm: Algorithm, w: usize, h: usize, seed: u64) -> Grid {
        let mut rng = seeded_rng(seed);
        generate(algorithm,
                 Width(w),
                 Height(h),
                 gc(0, 0),
                 gc(w as u32 - 1, h as u32 - 1),
                 &mut rng)
            .expect("generation failed")
    }

    // Interior passages as sorted (cell, cell) pairs.
    fn passages(grid: &Grid) -> Vec<(GridCoordinate, GridCoordinate)> {
        grid.iter()
            .flat_map(|coord| {
                [Direction::Right, Direction::Down]
                    .iter()
                    .filter_map(|&dir| grid.can_move(coord, dir).unwrap().map(|n| (coord, n)))
                    .collect::<Vec<_>>()
            })
            .sorted()
            .collect()
    }

    fn interior_openings(grid: &Grid, coord: GridCoordinate) -> usize {
        Direction::ALL
            .iter()
            .filter(|&&dir| grid.can_move(coord, dir).unwrap().is_some())
            .count()
    }

    #[test]
    fn every_algorithm_carves_a_perfect_maze() {
        for algorithm in all_algorithms() {
            for &(w, h) in &[(1, 1), (1, 7), (6, 1), (2, 2), (5, 5), (12, 7), (16, 16)] {
                let grid = corner_maze(algorithm, w, h, 17);
                assert!(analysis::is_perfect(&grid), "{} on {}x{}", algorithm, w, h);
                assert_eq!(analysis::passage_count(&grid), w * h - 1);
                assert_eq!(analysis::reachable_count(&grid, gc(0, 0)).unwrap(), w * h);
                assert!(analysis::wall_symmetry_violations(&grid).is_empty());
            }
        }
    }

    #[test]
    fn every_cell_is_visited() {
        for algorithm in all_algorithms() {
            let grid = corner_maze(algorithm, 9, 6, 3);
            assert_eq!(grid.visited_count(), grid.size(), "{}", algorithm);
            assert!(grid.unvisited_cells().is_empty());
            for coord in grid.iter() {
                assert!(grid.is_cell_visited(coord).unwrap());
            }
        }
    }

    #[test]
    fn entrance_and_exit_are_opened() {
        for algorithm in all_algorithms() {
            let mut rng = seeded_rng(99);
            let grid = generate(algorithm, Width(6), Height(4), gc(0, 2), gc(5, 1), &mut rng)
                .unwrap();
            assert!(!grid.wall_status(gc(0, 2), Direction::Left).unwrap());
            assert!(!grid.wall_status(gc(5, 1), Direction::Right).unwrap());

            let boundary_openings: usize = grid.iter()
                .map(|coord| {
                    let cell = grid.cell(coord).unwrap();
                    let sides = grid.boundary_sides(coord).unwrap();
                    sides.iter().filter(|&&dir| !cell.wall(dir)).count()
                })
                .sum();
            assert_eq!(boundary_openings, 2, "{}", algorithm);
        }
    }

    #[test]
    fn depth_first_two_by_two_with_scripted_randomness() {
        // An all zero source always takes the first option: start at (0, 0), then the first
        // unvisited neighbour in Left, Right, Up, Down order.
        let mut rng = StepRng::new(0, 0);
        let grid = generate(Algorithm::DepthFirst,
                            Width(2),
                            Height(2),
                            gc(0, 0),
                            gc(1, 1),
                            &mut rng)
            .unwrap();

        assert_eq!(passages(&grid),
                   vec![(gc(0, 0), gc(1, 0)), (gc(0, 1), gc(1, 1)), (gc(1, 0), gc(1, 1))]);
        assert!(grid.wall_status(gc(0, 0), Direction::Down).unwrap());
        assert!(grid.wall_status(gc(0, 1), Direction::Up).unwrap());
    }

    #[test]
    fn growing_tree_always_backtracking_matches_depth_first() {
        let mut dfs_rng = StepRng::new(0, 0);
        let mut gt_rng = StepRng::new(0, 0);
        let dfs = generate(Algorithm::DepthFirst, Width(4), Height(3), gc(0, 0), gc(3, 2),
                           &mut dfs_rng)
            .unwrap();
        let gt = generate(Algorithm::GrowingTree { backtrack_chance: 1.0 },
                          Width(4),
                          Height(3),
                          gc(0, 0),
                          gc(3, 2),
                          &mut gt_rng)
            .unwrap();
        assert_eq!(passages(&dfs), passages(&gt));

        for seed in 0..20 {
            let dfs = corner_maze(Algorithm::DepthFirst, 9, 7, seed);
            let gt = corner_maze(Algorithm::GrowingTree { backtrack_chance: 1.0 }, 9, 7, seed);
            assert_eq!(passages(&dfs), passages(&gt), "seed {}", seed);
            assert_eq!(dfs, gt);
        }
    }

    #[test]
    fn serpentine_hunt_and_kill_corridor() {
        let mut rng = seeded_rng(5);
        let grid = generate(Algorithm::HuntAndKill(HuntPolicy::Serpentine),
                            Width(1),
                            Height(5),
                            gc(0, 0),
                            gc(0, 4),
                            &mut rng)
            .unwrap();

        let openings: Vec<usize> = grid.iter().map(|coord| interior_openings(&grid, coord)).collect();
        assert_eq!(openings, vec![1, 2, 2, 2, 1]);

        // Ends also carry the entrance and exit.
        assert_eq!(&*grid.cell(gc(0, 0)).unwrap().open_sides(), &[Direction::Left, Direction::Down]);
        assert_eq!(&*grid.cell(gc(0, 4)).unwrap().open_sides(), &[Direction::Left, Direction::Up]);
        for y in 1..4 {
            assert_eq!(&*grid.cell(gc(0, y)).unwrap().open_sides(), &[Direction::Up, Direction::Down]);
        }
    }

    #[test]
    fn aldous_broder_three_by_three_visits_everything() {
        let grid = corner_maze(Algorithm::AldousBroder, 3, 3, 1234);
        assert!(grid.unvisited_cells().is_empty());
        assert!(analysis::is_perfect(&grid));
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        for algorithm in all_algorithms() {
            let a = corner_maze(algorithm, 10, 8, 77);
            let b = corner_maze(algorithm, 10, 8, 77);
            assert_eq!(a, b, "{}", algorithm);
        }
    }

    #[test]
    fn invalid_dimensions_are_rejected() {
        let mut rng = seeded_rng(1);
        for algorithm in all_algorithms() {
            match generate(algorithm, Width(0), Height(4), gc(0, 0), gc(0, 0), &mut rng) {
                Err(Error(ErrorKind::InvalidDimensions(0, 4), _)) => {}
                other => panic!("expected InvalidDimensions, got {:?}", other),
            }
        }
    }

    #[test]
    fn backtrack_chance_must_be_a_probability() {
        let mut rng = seeded_rng(1);
        for &chance in &[-0.1, 1.5, std::f64::NAN] {
            let algorithm = Algorithm::GrowingTree { backtrack_chance: chance };
            match generate(algorithm, Width(3), Height(3), gc(0, 0), gc(2, 2), &mut rng) {
                Err(Error(ErrorKind::InvalidParameter(_), _)) => {}
                other => panic!("expected InvalidParameter, got {:?}", other),
            }
        }

        let mut grid = Grid::new(Width(3), Height(3), gc(0, 0), gc(2, 2)).unwrap();
        assert!(growing_tree(&mut grid, 2.0, &mut rng).is_err());
        assert_eq!(grid.visited_count(), 0);
    }

    #[test]
    fn algorithm_names() {
        for name in Algorithm::NAMES.iter() {
            let algorithm: Algorithm = name.parse().unwrap();
            assert_eq!(algorithm.name(), *name);
        }
        assert_eq!("growing-tree".parse::<Algorithm>().unwrap(),
                   Algorithm::GrowingTree { backtrack_chance: 0.5 });
        assert_eq!("hunt-and-kill".parse::<Algorithm>().unwrap(),
                   Algorithm::HuntAndKill(HuntPolicy::Random));
        assert!("binary-tree".parse::<Algorithm>().is_err());

        assert_eq!("serpentine".parse::<HuntPolicy>().unwrap(), HuntPolicy::Serpentine);
        assert!("spiral".parse::<HuntPolicy>().is_err());
    }

    #[test]
    fn generated_grids_survive_json() {
        for algorithm in all_algorithms() {
            for &(w, h, seed) in &[(1, 1, 0), (1, 6, 1), (7, 1, 2), (8, 5, 3), (12, 12, 4)] {
                let grid = corner_maze(algorithm, w, h, seed);
                let json = grid.to_json().unwrap();
                let restored = Grid::from_json(&json).unwrap();
                assert_eq!(restored, grid, "{} {}x{}", algorithm, w, h);
                assert_eq!(restored.visited_count(), w * h);
                assert!(analysis::is_perfect(&restored), "{} {}x{}", algorithm, w, h);
                assert_eq!(restored.to_json().unwrap(), json);
            }
        }
    }

    #[test]
    fn carving_uses_chosen_sides() {
        for algorithm in all_algorithms() {
            let mut grid = Grid::new(Width(4), Height(4), gc(0, 0), gc(3, 3)).unwrap();
            grid.set_opening_sides(Some(Direction::Up), Some(Direction::Right)).unwrap();
            carve(algorithm, &mut grid, &mut seeded_rng(6)).unwrap();
            assert!(analysis::is_perfect(&grid));
            assert!(!grid.wall_status(gc(0, 0), Direction::Up).unwrap());
            assert!(grid.wall_status(gc(0, 0), Direction::Left).unwrap());
            assert!(!grid.wall_status(gc(3, 3), Direction::Right).unwrap());
            assert!(grid.wall_status(gc(3, 3), Direction::Down).unwrap());
        }
    }

    #[test]
    fn quickcheck_perfect_mazes() {
        fn prop(w: u8, h: u8, seed: u64, which: u8) -> TestResult {
            let (w, h) = (w as usize % 12 + 1, h as usize % 12 + 1);
            let algorithms = all_algorithms();
            let algorithm = algorithms[which as usize % algorithms.len()];
            let grid = corner_maze(algorithm, w, h, seed);
            TestResult::from_bool(analysis::is_perfect(&grid) &&
                                  grid.visited_count() == w * h)
        }
        quickcheck(prop as fn(u8, u8, u64, u8) -> TestResult);
    }
}
