//! Solves a 9x9 Sudoku board supplied as JSON and prints the grid
//! along with the search statistics.

use necto::{
    problems::sudoku::{self, Board},
    solver::stats::render_stats_table,
};

const BOARD_JSON: &str = r#"{
    "size": 9,
    "values": {
        "0": 5, "1": 3, "4": 7,
        "9": 6, "12": 1, "13": 9, "14": 5,
        "19": 9, "20": 8, "25": 6,
        "27": 8, "31": 6, "35": 3,
        "36": 4, "39": 8, "41": 3, "44": 1,
        "45": 7, "49": 2, "53": 6,
        "55": 6, "60": 2, "61": 8,
        "66": 4, "67": 1, "68": 9, "71": 5,
        "76": 8, "79": 7, "80": 9
    }
}"#;

fn main() {
    tracing_subscriber::fmt::init();

    let board: Board = serde_json::from_str(BOARD_JSON).expect("valid board JSON");
    let mut problem = sudoku::problem(&board, sudoku::default_config()).expect("valid problem");
    let outcome = problem
        .solve_with_initial_propagation()
        .expect("solve");

    match outcome.first() {
        Some(solution) => {
            println!("{}", Board::render(board.size, solution));
        }
        None => println!("no solution"),
    }
    println!("{}", render_stats_table(&outcome.stats));
}
