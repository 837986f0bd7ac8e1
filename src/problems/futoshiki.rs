//! Futoshiki problem builder.
//!
//! The text format is five lines: the dimension `N`; the indices of the
//! given cells (row-major, `0..N²-1`); the corresponding given values
//! (`1..N`); the source indices of the `>` inequalities; and the
//! corresponding destination indices. Lines two to five may be empty.
//!
//! The builder emits one equality-to-constant per given, one binary
//! greater-than per inequality, and one tagged all-different group per
//! row and column over the integer universe `1..=N` (bitmask domains).

use std::str::FromStr;

use crate::{
    error::{BuildError, Result},
    solver::{
        constraint::ConstraintKind,
        domain::Universe,
        problem::{Problem, SolverConfig},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub dimension: usize,
    /// `(cell index, value)` pairs.
    pub givens: Vec<(usize, u32)>,
    /// `(source, destination)` pairs meaning `source > destination`.
    pub inequalities: Vec<(usize, usize)>,
}

impl Puzzle {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let dimension: usize = parse_token(lines.next().map(str::trim).unwrap_or(""))?;
        if dimension == 0 {
            return Err(BuildError::Malformed("dimension must be positive".into()).into());
        }

        let given_cells: Vec<usize> = parse_row(lines.next())?;
        let given_values: Vec<u32> = parse_row(lines.next())?;
        if given_cells.len() != given_values.len() {
            return Err(BuildError::Malformed(format!(
                "{} given cells but {} given values",
                given_cells.len(),
                given_values.len()
            ))
            .into());
        }
        let sources: Vec<usize> = parse_row(lines.next())?;
        let destinations: Vec<usize> = parse_row(lines.next())?;
        if sources.len() != destinations.len() {
            return Err(BuildError::Malformed(format!(
                "{} inequality sources but {} destinations",
                sources.len(),
                destinations.len()
            ))
            .into());
        }

        let cells = dimension * dimension;
        for &cell in given_cells.iter().chain(&sources).chain(&destinations) {
            if cell >= cells {
                return Err(
                    BuildError::Malformed(format!("cell index {cell} out of range")).into(),
                );
            }
        }
        for &value in &given_values {
            if !(1..=dimension as u32).contains(&value) {
                return Err(
                    BuildError::Malformed(format!("given value {value} out of range")).into(),
                );
            }
        }

        Ok(Self {
            dimension,
            givens: given_cells.into_iter().zip(given_values).collect(),
            inequalities: sources.into_iter().zip(destinations).collect(),
        })
    }

    /// Builds the CSP. Cell `(r, c)` maps to variable `r * N + c`.
    pub fn problem(&self, config: SolverConfig) -> Result<Problem> {
        let n = self.dimension;
        let mut problem = Problem::new(config);
        for r in 0..n {
            for c in 0..n {
                problem.add_variable(format!("r{r}c{c}"), Universe::range(1, n as u32))?;
            }
        }

        for &(cell, value) in &self.givens {
            problem.add_constraint(vec![cell as u32], ConstraintKind::EqualConst(value))?;
        }
        for &(source, destination) in &self.inequalities {
            problem.add_constraint(
                vec![source as u32, destination as u32],
                ConstraintKind::binary(|a, b| a > b),
            )?;
        }
        for r in 0..n {
            let row = (0..n).map(|c| (r * n + c) as u32).collect();
            problem.add_constraint(row, ConstraintKind::AllDifferent)?;
        }
        for c in 0..n {
            let column = (0..n).map(|r| (r * n + c) as u32).collect();
            problem.add_constraint(column, ConstraintKind::AllDifferent)?;
        }
        Ok(problem)
    }
}

/// Renders a solved assignment as `N` rows of space-separated values.
pub fn render(dimension: usize, solution: &[u32]) -> String {
    solution
        .chunks(dimension)
        .map(|row| {
            row.iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_token<T: FromStr>(token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| BuildError::Malformed(format!("invalid number `{token}`")).into())
}

fn parse_row<T: FromStr>(line: Option<&str>) -> Result<Vec<T>> {
    line.unwrap_or("")
        .split_whitespace()
        .map(parse_token)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::solver::problem::{Pruning, VariableOrdering};

    use super::*;

    /// A 5x5 board whose blanks (the main diagonal) are all forced by
    /// their rows, so the completion is unique.
    const SAMPLE: &str = "5\n\
        1 2 3 4 5 7 8 9 10 11 13 14 15 16 17 19 20 21 22 23\n\
        2 3 4 5 2 4 5 1 3 4 1 2 4 5 1 3 5 1 2 3\n\
        24 15 12\n\
        23 10 7\n";

    const SAMPLE_SOLUTION: [u32; 25] = [
        1, 2, 3, 4, 5, //
        2, 3, 4, 5, 1, //
        3, 4, 5, 1, 2, //
        4, 5, 1, 2, 3, //
        5, 1, 2, 3, 4,
    ];

    fn all_solutions_config(pruning: Pruning) -> SolverConfig {
        SolverConfig {
            pruning,
            ordering: VariableOrdering::Mrv,
            max_solutions: usize::MAX,
            use_gac_alldiff: true,
            cancel: None,
        }
    }

    #[test]
    fn parses_the_sample() {
        let puzzle = Puzzle::parse(SAMPLE).unwrap();
        assert_eq!(puzzle.dimension, 5);
        assert_eq!(puzzle.givens.len(), 20);
        assert_eq!(puzzle.inequalities, vec![(24, 23), (15, 10), (12, 7)]);
    }

    #[test]
    fn sample_has_exactly_one_solution() {
        let _ = tracing_subscriber::fmt::try_init();
        let puzzle = Puzzle::parse(SAMPLE).unwrap();
        let mut problem = puzzle
            .problem(all_solutions_config(Pruning::ForwardChecking))
            .unwrap();
        let outcome = problem.solve_with_initial_propagation().unwrap();
        assert_eq!(outcome.solutions.len(), 1);
        let solution = &outcome.solutions[0];
        assert_eq!(solution.as_slice(), SAMPLE_SOLUTION.as_slice());

        // Rows and columns are permutations of 1..=5.
        for r in 0..5 {
            let mut row: Vec<u32> = (0..5).map(|c| solution[r * 5 + c]).collect();
            row.sort_unstable();
            assert_eq!(row, vec![1, 2, 3, 4, 5]);
            let mut column: Vec<u32> = (0..5).map(|c| solution[c * 5 + r]).collect();
            column.sort_unstable();
            assert_eq!(column, vec![1, 2, 3, 4, 5]);
        }
        for &(source, destination) in &puzzle.inequalities {
            assert!(solution[source] > solution[destination]);
        }
    }

    #[test]
    fn every_propagator_finds_the_same_sample_solution() {
        let puzzle = Puzzle::parse(SAMPLE).unwrap();
        for pruning in [Pruning::None, Pruning::ForwardChecking, Pruning::Ac3, Pruning::AcFc] {
            let mut problem = puzzle.problem(all_solutions_config(pruning)).unwrap();
            let outcome = problem.solve().unwrap();
            assert_eq!(outcome.solutions.len(), 1, "pruning mode {pruning:?}");
            assert_eq!(outcome.solutions[0].as_slice(), SAMPLE_SOLUTION.as_slice());
        }
    }

    #[test]
    fn inequalities_prune_through_ac3() {
        // A 2x2 board with cell 1 > cell 0 admits exactly one of the
        // two order-2 Latin squares.
        let text = "2\n\n\n1\n0\n";
        let puzzle = Puzzle::parse(text).unwrap();
        let mut problem = puzzle
            .problem(all_solutions_config(Pruning::Ac3))
            .unwrap();
        let outcome = problem.solve().unwrap();
        assert_eq!(outcome.solutions, vec![vec![1, 2, 2, 1]]);
    }

    #[test]
    fn render_formats_rows() {
        assert_eq!(render(2, &[1, 2, 2, 1]), "1 2\n2 1");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(Puzzle::parse("").is_err());
        assert!(Puzzle::parse("0\n").is_err());
        assert!(Puzzle::parse("5\n1 2\n3\n\n\n").is_err());
        assert!(Puzzle::parse("5\n1\nx\n\n\n").is_err());
        assert!(Puzzle::parse("5\n99\n1\n\n\n").is_err());
        assert!(Puzzle::parse("5\n1\n9\n\n\n").is_err());
        assert!(Puzzle::parse("3\n\n\n1 2\n0\n").is_err());
    }
}
