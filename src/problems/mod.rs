//! Problem builders: the sole producers of [`crate::Problem`] stores
//! for the puzzle domains shipped with the crate.

pub mod futoshiki;
pub mod map_colouring;
pub mod sudoku;
