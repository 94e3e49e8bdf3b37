// Create the Error, ErrorKind, ResultExt, and Result types.
// Result is a typedef of std `Result` with the error type our own `Error`.
// Other modules `use crate::errors::*;` to get access to everything `error_chain!` creates.
#![allow(deprecated)]

use error_chain::error_chain;

use crate::coordinates::GridCoordinate;

error_chain! {

    foreign_links {
        Json(::serde_json::Error);
    }

    errors {
        InvalidDimensions(width: usize, height: usize) {
            description("invalid grid dimensions")
            display("invalid grid dimensions: {} x {}", width, height)
        }
        OutOfBounds(coord: GridCoordinate) {
            description("coordinate outside the grid")
            display("coordinate {} is outside the grid", coord)
        }
        NotOnBoundary(coord: GridCoordinate) {
            description("coordinate not on the grid boundary")
            display("coordinate {} is not on the grid boundary", coord)
        }
        InconsistentState(reason: String) {
            description("inconsistent maze state")
            display("inconsistent maze state: {}", reason)
        }
        InvalidParameter(reason: String) {
            description("invalid parameter")
            display("invalid parameter: {}", reason)
        }
    }
}
