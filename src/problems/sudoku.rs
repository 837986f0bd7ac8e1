//! Sudoku problem builder.
//!
//! A board of subgrid size `k` (2 to 5) has `k²·k²` cells over the value
//! universe `1..=k²`. The builder emits one equality-to-constant
//! constraint per given and one tagged all-different group per row,
//! column, and box; the integer universe always gets the bitmask domain
//! representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::{BuildError, Result},
    solver::{
        constraint::ConstraintKind,
        domain::Universe,
        problem::{Problem, Pruning, SolverConfig, VariableOrdering},
    },
};

/// The board exchange type: side length plus a sparse map from cell
/// index (row-major) to given value. This is the same shape servers
/// exchange as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub size: usize,
    pub values: BTreeMap<usize, u32>,
}

impl Board {
    /// An empty board with the given subgrid size (2 to 5).
    pub fn empty(subgrid: usize) -> Result<Self> {
        if !(2..=5).contains(&subgrid) {
            return Err(
                BuildError::Malformed(format!("unsupported subgrid size {subgrid}")).into(),
            );
        }
        Ok(Self {
            size: subgrid * subgrid,
            values: BTreeMap::new(),
        })
    }

    /// Parses a digit string, one character per cell in row-major
    /// order; `0` or `.` marks a blank. Only sizes with single-digit
    /// values (4x4 and 9x9) can be written this way.
    pub fn parse(text: &str) -> Result<Self> {
        let cells: Vec<char> = text.trim().chars().collect();
        let size = match cells.len() {
            16 => 4,
            81 => 9,
            other => {
                return Err(BuildError::Malformed(format!(
                    "expected 16 or 81 cells, got {other}"
                ))
                .into())
            }
        };
        let mut values = BTreeMap::new();
        for (index, c) in cells.into_iter().enumerate() {
            match c {
                '0' | '.' => {}
                d if d.is_ascii_digit() => {
                    let value = d.to_digit(10).expect("ascii digit");
                    if value as usize > size {
                        return Err(BuildError::Malformed(format!(
                            "value {value} out of range for a {size}x{size} board"
                        ))
                        .into());
                    }
                    values.insert(index, value);
                }
                other => {
                    return Err(
                        BuildError::Malformed(format!("unexpected character `{other}`")).into(),
                    )
                }
            }
        }
        Ok(Self { size, values })
    }

    pub fn subgrid(&self) -> usize {
        (self.size as f64).sqrt() as usize
    }

    /// Renders a solved assignment as rows of space-separated values.
    pub fn render(size: usize, solution: &[u32]) -> String {
        solution
            .chunks(size)
            .map(|row| {
                row.iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The configuration Sudoku solves ship with: forward checking plus the
/// GAC all-different propagator under dom/wdeg ordering.
pub fn default_config() -> SolverConfig {
    SolverConfig {
        pruning: Pruning::ForwardChecking,
        ordering: VariableOrdering::DomWdeg,
        max_solutions: 1,
        use_gac_alldiff: true,
        cancel: None,
    }
}

/// Builds the CSP for a board. Cell `(r, c)` maps to variable index
/// `r * size + c`, so a solution vector reads back as the grid in
/// row-major order.
pub fn problem(board: &Board, config: SolverConfig) -> Result<Problem> {
    let size = board.size;
    let subgrid = board.subgrid();
    if subgrid * subgrid != size || !(2..=5).contains(&subgrid) {
        return Err(BuildError::Malformed(format!("unsupported board size {size}")).into());
    }

    let mut problem = Problem::new(config);
    for r in 0..size {
        for c in 0..size {
            problem.add_variable(format!("r{r}c{c}"), Universe::range(1, size as u32))?;
        }
    }

    for (&index, &value) in &board.values {
        if index >= size * size {
            return Err(BuildError::Malformed(format!("cell index {index} out of range")).into());
        }
        if !(1..=size as u32).contains(&value) {
            return Err(BuildError::Malformed(format!("given value {value} out of range")).into());
        }
        problem.add_constraint(vec![index as u32], ConstraintKind::EqualConst(value))?;
    }

    for r in 0..size {
        let row = (0..size).map(|c| (r * size + c) as u32).collect();
        problem.add_constraint(row, ConstraintKind::AllDifferent)?;
    }
    for c in 0..size {
        let column = (0..size).map(|r| (r * size + c) as u32).collect();
        problem.add_constraint(column, ConstraintKind::AllDifferent)?;
    }
    for br in 0..subgrid {
        for bc in 0..subgrid {
            let mut cells = Vec::with_capacity(size);
            for r in 0..subgrid {
                for c in 0..subgrid {
                    cells.push(((br * subgrid + r) * size + bc * subgrid + c) as u32);
                }
            }
            problem.add_constraint(cells, ConstraintKind::AllDifferent)?;
        }
    }

    Ok(problem)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::solver::problem::{CancelToken, Pruning, VariableOrdering};

    use super::*;

    // A classic 17-clue puzzle with a unique solution.
    const SEVENTEEN_CLUES: &str =
        "000000010400000000020000000000050407008000300001090000300400200050100000000806000";
    const SEVENTEEN_CLUES_SOLUTION: &str =
        "693784512487512936125963874932651487568247391741398625319475268856129743274836159";

    fn assert_satisfies_all(problem: &Problem, solution: &[u32]) {
        let total: Vec<Option<u32>> = solution.iter().map(|&v| Some(v)).collect();
        for id in 0..problem.constraint_count() {
            assert!(
                problem.constraint(id).check(&total),
                "constraint {id} violated"
            );
        }
    }

    #[test]
    fn blank_4x4_board_is_solvable() {
        let _ = tracing_subscriber::fmt::try_init();
        let board = Board::empty(2).unwrap();
        let mut problem = problem(&board, default_config()).unwrap();
        let outcome = problem.solve().unwrap();
        let solution = outcome.first().expect("a blank board has solutions");
        assert_satisfies_all(&problem, solution);
        for value in 1..=4u32 {
            assert_eq!(
                solution.iter().filter(|&&v| v == value).count(),
                4,
                "value {value} must appear exactly four times"
            );
        }
    }

    #[test]
    fn blank_4x4_pruning_modes_agree_on_the_solution_set() {
        let board = Board::empty(2).unwrap();
        let mut reference: Option<Vec<Vec<u32>>> = None;
        for pruning in [Pruning::None, Pruning::ForwardChecking, Pruning::AcFc] {
            let config = SolverConfig {
                pruning,
                ordering: VariableOrdering::Static,
                max_solutions: usize::MAX,
                use_gac_alldiff: false,
                cancel: None,
            };
            let mut problem = problem(&board, config).unwrap();
            let outcome = problem.solve().unwrap();
            let mut solutions = outcome.solutions;
            solutions.sort();
            // A blank 4x4 board has exactly 288 completions.
            assert_eq!(solutions.len(), 288);
            match &reference {
                None => reference = Some(solutions),
                Some(expected) => assert_eq!(&solutions, expected),
            }
        }
    }

    #[test]
    fn seventeen_clue_puzzle_solves_within_the_backtrack_budget() {
        let _ = tracing_subscriber::fmt::try_init();
        let board = Board::parse(SEVENTEEN_CLUES).unwrap();
        let mut problem = problem(&board, default_config()).unwrap();
        let outcome = problem.solve_with_initial_propagation().unwrap();
        let solution = outcome.first().expect("the puzzle has a solution");

        let rendered: String = solution.iter().map(u32::to_string).collect();
        assert_eq!(rendered, SEVENTEEN_CLUES_SOLUTION);
        assert!(
            outcome.stats.backtracks <= 400,
            "regression: {} backtracks",
            outcome.stats.backtracks
        );
    }

    #[test]
    fn classic_puzzle_respects_its_givens() {
        let board = Board::parse(
            "530070000600195000098000060800060003400803001700020006060000280000419005000080079",
        )
        .unwrap();
        let mut problem = problem(&board, default_config()).unwrap();
        let outcome = problem.solve_with_initial_propagation().unwrap();
        let solution = outcome.first().expect("solvable puzzle");
        assert_satisfies_all(&problem, solution);
        for (&index, &value) in &board.values {
            assert_eq!(solution[index], value, "given at cell {index} was changed");
        }
    }

    #[test]
    fn conflicting_givens_fail_during_initial_propagation() {
        let mut board = Board::empty(3).unwrap();
        board.values.insert(0, 5);
        board.values.insert(1, 5);
        let mut problem = problem(&board, default_config()).unwrap();
        let outcome = problem.solve_with_initial_propagation().unwrap();
        assert!(outcome.is_unsat());
        assert_eq!(outcome.stats.nodes_visited, 0);
    }

    #[test]
    fn cancellation_mid_search_leaves_the_store_intact() {
        // A deliberately hard instance: the last cell contradicts the
        // unique completion, so a naive static-order search has to
        // refute an enormous subtree before discovering it.
        let mut board = Board::parse(SEVENTEEN_CLUES).unwrap();
        board.values.insert(80, 1);
        let token = CancelToken::new();
        let config = SolverConfig {
            pruning: Pruning::None,
            ordering: VariableOrdering::Static,
            max_solutions: usize::MAX,
            use_gac_alldiff: false,
            cancel: Some(token.clone()),
        };
        let mut problem = problem(&board, config).unwrap();
        let snapshot: Vec<_> = (0..problem.variable_count() as u32)
            .map(|v| problem.current_domain(v).clone())
            .collect();

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(100));
            token.cancel();
        });
        let started = std::time::Instant::now();
        let outcome = problem.solve().unwrap();
        canceller.join().unwrap();

        assert_eq!(outcome.status, crate::SearchStatus::Cancelled);
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "cancellation must be honoured promptly"
        );
        for v in 0..problem.variable_count() as u32 {
            assert_eq!(problem.current_domain(v), &snapshot[v as usize]);
        }
        assert!(outcome.solutions.is_empty());
    }

    #[test]
    fn board_json_round_trip() {
        let board = Board::parse("1000002000300004").unwrap();
        let json = serde_json::to_string(&board).unwrap();
        assert!(json.contains("\"size\":4"));
        let back: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(back, board);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Board::parse("123").is_err());
        assert!(Board::parse(&"5".repeat(16)).is_err());
        assert!(Board::parse(&"x".repeat(81)).is_err());
    }
}
