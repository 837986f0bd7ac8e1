//! Futoshiki CLI: `futoshiki <algo> <filename>`.
//!
//! Prints every solution as N rows of space-separated integers,
//! separated by `###############` lines. Exit codes: 0 when at least
//! one solution was found, 1 on unsatisfiability, 2 on malformed input.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use necto::{
    problems::futoshiki::{self, Puzzle},
    solver::stats::render_stats_table,
    Pruning, SolverConfig, VariableOrdering,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algo {
    /// Plain backtracking, no propagation.
    None,
    /// Forward checking.
    Fc,
    /// AC3.
    Ac3,
    /// Forward checking followed by AC3.
    AcFc,
}

impl From<Algo> for Pruning {
    fn from(algo: Algo) -> Self {
        match algo {
            Algo::None => Pruning::None,
            Algo::Fc => Pruning::ForwardChecking,
            Algo::Ac3 => Pruning::Ac3,
            Algo::AcFc => Pruning::AcFc,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Propagator to run after each assignment.
    #[arg(value_enum)]
    algo: Algo,

    /// Puzzle file in the five-line Futoshiki format.
    filename: PathBuf,

    /// Also run the GAC all-different propagator on rows and columns.
    #[arg(long)]
    gac: bool,

    /// Stop after the first solution instead of enumerating all.
    #[arg(long)]
    first: bool,

    /// Print search statistics after the solutions.
    #[arg(long)]
    stats: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.filename) {
        Ok(text) => text,
        Err(error) => {
            eprintln!("error: cannot read {}: {error}", args.filename.display());
            return ExitCode::from(2);
        }
    };
    let puzzle = match Puzzle::parse(&text) {
        Ok(puzzle) => puzzle,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(2);
        }
    };

    let config = SolverConfig {
        pruning: args.algo.into(),
        ordering: VariableOrdering::Mrv,
        max_solutions: if args.first { 1 } else { usize::MAX },
        use_gac_alldiff: args.gac,
        cancel: None,
    };
    let mut problem = match puzzle.problem(config) {
        Ok(problem) => problem,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(2);
        }
    };

    let outcome = match problem.solve_with_initial_propagation() {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::from(2);
        }
    };

    let rendered: Vec<String> = outcome
        .solutions
        .iter()
        .map(|solution| futoshiki::render(puzzle.dimension, solution))
        .collect();
    println!("{}", rendered.join("\n###############\n"));

    if args.stats {
        eprintln!("{}", render_stats_table(&outcome.stats));
    }

    if outcome.solutions.is_empty() {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
