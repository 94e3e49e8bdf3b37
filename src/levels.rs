//! Random level planning: board size, entrance and exit on opposite edges, and the algorithm that
//! will carve the level.

use error_chain::bail;
use rand::Rng;
use serde_derive::{Deserialize, Serialize};

use crate::cells::Direction;
use crate::coordinates::GridCoordinate;
use crate::errors::*;
use crate::generators::{self, Algorithm, HuntPolicy};
use crate::grid::Grid;
use crate::units::{Height, Width};
use crate::utils::{random_entry, random_index, random_range};

pub const DEFAULT_MIN_SIDE: usize = 10;
pub const DEFAULT_MAX_SIDE: usize = 30;

/// Bounds for randomly sized levels. Each range is half open, `min..max`.
#[derive(Eq, PartialEq, Copy, Clone, Debug, Serialize, Deserialize)]
pub struct LevelSettings {
    pub min_width: usize,
    pub max_width: usize,
    pub min_height: usize,
    pub max_height: usize,
}

impl Default for LevelSettings {
    fn default() -> LevelSettings {
        LevelSettings {
            min_width: DEFAULT_MIN_SIDE,
            max_width: DEFAULT_MAX_SIDE,
            min_height: DEFAULT_MIN_SIDE,
            max_height: DEFAULT_MAX_SIDE,
        }
    }
}

impl LevelSettings {
    pub fn validate(&self) -> Result<()> {
        check_side_range("width", self.min_width, self.max_width)?;
        check_side_range("height", self.min_height, self.max_height)
    }
}

fn check_side_range(name: &str, min: usize, max: usize) -> Result<()> {
    if min == 0 || min >= max {
        bail!(ErrorKind::InvalidParameter(format!("{} range {}..{} is empty or starts at zero",
                                                  name,
                                                  min,
                                                  max)));
    }
    Ok(())
}

/// Everything needed to generate one level.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct LevelPlan {
    pub width: Width,
    pub height: Height,
    pub entrance: GridCoordinate,
    pub exit: GridCoordinate,
    /// The edges the entrance and exit were drawn from, opened in preference to any other
    /// boundary side of a corner cell.
    pub entrance_side: Option<Direction>,
    pub exit_side: Option<Direction>,
    pub algorithm: Algorithm,
}

impl LevelPlan {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Grid> {
        let mut grid = Grid::new(self.width, self.height, self.entrance, self.exit)?;
        grid.set_opening_sides(self.entrance_side, self.exit_side)?;
        generators::carve(self.algorithm, &mut grid, rng)?;
        Ok(grid)
    }
}

/// A random cell on the `side` edge of a `width * height` grid.
pub fn random_outer_bound<R: Rng + ?Sized>(width: Width,
                                           height: Height,
                                           side: Direction,
                                           rng: &mut R)
                                           -> Result<GridCoordinate> {
    let (Width(w), Height(h)) = (width, height);
    if w == 0 || h == 0 {
        bail!(ErrorKind::InvalidDimensions(w, h));
    }
    let along = match side {
        Direction::Left | Direction::Right => random_index(rng, h),
        Direction::Up | Direction::Down => random_index(rng, w),
    };
    let along = along.ok_or_else(|| Error::from(ErrorKind::InvalidDimensions(w, h)))? as u32;

    let coord = match side {
        Direction::Left => GridCoordinate::new(0, along),
        Direction::Right => GridCoordinate::new((w - 1) as u32, along),
        Direction::Up => GridCoordinate::new(along, 0),
        Direction::Down => GridCoordinate::new(along, (h - 1) as u32),
    };
    Ok(coord)
}

/// Any of the four algorithms. Growing tree draws its backtrack chance from [0, 1), hunt-and-kill
/// draws its hunt policy.
pub fn random_algorithm<R: Rng + ?Sized>(rng: &mut R) -> Algorithm {
    match random_index(rng, Algorithm::NAMES.len()) {
        Some(1) => Algorithm::DepthFirst,
        Some(2) => Algorithm::GrowingTree { backtrack_chance: rng.gen::<f64>() },
        Some(3) => {
            let policy = if rng.gen_bool(0.5) { HuntPolicy::Random } else { HuntPolicy::Serpentine };
            Algorithm::HuntAndKill(policy)
        }
        _ => Algorithm::AldousBroder,
    }
}

pub fn random_level_plan<R: Rng + ?Sized>(settings: &LevelSettings, rng: &mut R) -> Result<LevelPlan> {
    settings.validate()?;

    let empty = || Error::from(ErrorKind::InvalidDimensions(settings.min_width, settings.min_height));
    let width = random_range(rng, settings.min_width, settings.max_width)
        .map(Width)
        .ok_or_else(empty)?;
    let height = random_range(rng, settings.min_height, settings.max_height)
        .map(Height)
        .ok_or_else(empty)?;

    let entrance_side = *random_entry(rng, &Direction::ALL).unwrap_or(&Direction::Left);
    let entrance = random_outer_bound(width, height, entrance_side, rng)?;
    let exit = random_outer_bound(width, height, entrance_side.opposite(), rng)?;
    let algorithm = random_algorithm(rng);

    Ok(LevelPlan {
        width: width,
        height: height,
        entrance: entrance,
        exit: exit,
        entrance_side: Some(entrance_side),
        exit_side: Some(entrance_side.opposite()),
        algorithm: algorithm,
    })
}
