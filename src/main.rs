use docopt::Docopt;
use log::info;
use mazegen::{
    cells::Direction,
    coordinates::GridCoordinate,
    generators::{self, Algorithm, HuntPolicy},
    levels::random_outer_bound,
    units::{Height, Width},
    utils::{entropy_rng, seeded_rng},
};
use serde_derive::Deserialize;
use std::{
    fs::File,
    io::prelude::*,
    path::Path,
};

const USAGE: &str = "Maze driver

Generates one perfect maze and prints it. The entrance is on the left column and the exit on the
right column.

Usage:
    maze_driver -h | --help
    maze_driver [--algorithm=<a>] [--width=<w>] [--height=<h>] [--seed=<n>] [--backtrack-chance=<p>] [--hunt=<policy>] [--json] [--cursor-x=<x> --cursor-y=<y>] [--out=<path>]

Options:
    -h --help                 Show this screen.
    --algorithm=<a>           aldous-broder, depth-first, growing-tree or hunt-and-kill [default: depth-first].
    --width=<w>               Number of columns [default: 20].
    --height=<h>              Number of rows [default: 20].
    --seed=<n>                Seed for a reproducible maze. A random seed is used if not given.
    --backtrack-chance=<p>    Growing tree only: chance in [0, 1] of continuing from the newest cell [default: 0.5].
    --hunt=<policy>           Hunt-and-kill only: random or serpentine [default: random].
    --json                    Print the grid as JSON instead of text.
    --cursor-x=<x>            Column of a cursor to mark in the text dump.
    --cursor-y=<y>            Row of a cursor to mark in the text dump.
    --out=<path>              Write the dump to a file instead of standard output.
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    flag_algorithm: String,
    flag_width: usize,
    flag_height: usize,
    flag_seed: Option<u64>,
    flag_backtrack_chance: f64,
    flag_hunt: String,
    flag_json: bool,
    flag_cursor_x: Option<u32>,
    flag_cursor_y: Option<u32>,
    flag_out: String,
}

mod errors {
    use error_chain::*;
    error_chain! {

        links {
            Maze(::mazegen::errors::Error, ::mazegen::errors::ErrorKind);
        }

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {
    env_logger::init();

    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;
    let algorithm = algorithm_from_args(&args)?;

    let mut rng = match args.flag_seed {
        Some(seed) => seeded_rng(seed),
        None => entropy_rng(),
    };

    let (width, height) = (Width(args.flag_width), Height(args.flag_height));
    let entrance = random_outer_bound(width, height, Direction::Left, &mut rng)?;
    let exit = random_outer_bound(width, height, Direction::Right, &mut rng)?;
    info!("entrance {}, exit {}", entrance, exit);

    let grid = generators::generate(algorithm, width, height, entrance, exit, &mut rng)?;

    let dump = if args.flag_json {
        grid.to_json()?
    } else {
        let cursor = match (args.flag_cursor_x, args.flag_cursor_y) {
            (Some(x), Some(y)) => Some(GridCoordinate::new(x, y)),
            _ => None,
        };
        grid.render_text(cursor)
    };

    if args.flag_out.is_empty() {
        println!("{}", dump);
    } else {
        write_text_to_file(&dump, &args.flag_out)
            .chain_err(|| format!("Failed to write maze to file {}", args.flag_out))?;
    }

    Ok(())
}

/// The named algorithm with the growing tree and hunt-and-kill parameters filled in from the
/// remaining flags.
fn algorithm_from_args(maze_args: &MazeArgs) -> Result<Algorithm> {
    let algorithm = match maze_args.flag_algorithm.parse::<Algorithm>()? {
        Algorithm::GrowingTree { .. } => {
            Algorithm::GrowingTree { backtrack_chance: maze_args.flag_backtrack_chance }
        }
        Algorithm::HuntAndKill(_) => {
            Algorithm::HuntAndKill(maze_args.flag_hunt.parse::<HuntPolicy>()?)
        }
        other => other,
    };
    Ok(algorithm)
}

fn write_text_to_file(data: &str, file_name: &str) -> Result<()> {
    let path = Path::new(file_name);
    let mut file = File::create(&path)?;
    file.write_all(data.as_bytes())?;
    Ok(())
}
