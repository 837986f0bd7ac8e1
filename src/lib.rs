//! Necto is a finite-domain constraint satisfaction problem (CSP)
//! solver.
//!
//! A problem is a set of variables, one finite domain per variable, and
//! constraints over variable tuples. The solver finds one or more total
//! assignments satisfying every constraint, or reports
//! unsatisfiability.
//!
//! # Core concepts
//!
//! - **[`Problem`]**: the store. Register variables and constraints,
//!   then call [`Problem::solve`] or
//!   [`Problem::solve_with_initial_propagation`].
//! - **[`Universe`]**: the declared value set of a variable. Bounded
//!   integer universes get a bit-parallel domain; sparse or interned
//!   universes fall back to a hash set.
//! - **[`ConstraintKind`]**: the constraint library. The
//!   [`ConstraintKind::AllDifferent`] variant is tagged: enabling
//!   `use_gac_alldiff` in [`SolverConfig`] runs Regin's filtering
//!   algorithm over those groups.
//! - **[`SolverConfig`]**: propagator choice (forward checking, AC3, or
//!   both), variable ordering (static, MRV, dom/wdeg), solution cap,
//!   and cancellation.
//!
//! Problem builders for Sudoku, Futoshiki, and map colouring live in
//! [`problems`].
//!
//! # Example: a simple two-variable problem
//!
//! Solving `a != b` where `a` can be `1` or `2` and `b` can only be
//! `1`; the solver must deduce that `a` is `2`.
//!
//! ```
//! use necto::{ConstraintKind, Problem, SolverConfig, Universe};
//!
//! let mut problem = Problem::new(SolverConfig::default());
//! let a = problem.add_variable("a", Universe::range(1, 2)).unwrap();
//! let b = problem.add_variable("b", Universe::range(1, 1)).unwrap();
//! problem
//!     .add_constraint(vec![a, b], ConstraintKind::NotEqual)
//!     .unwrap();
//!
//! let outcome = problem.solve().unwrap();
//! assert_eq!(outcome.solutions, vec![vec![2, 1]]);
//! ```

pub mod error;
pub mod problems;
pub mod solver;

pub use solver::{
    constraint::{Constraint, ConstraintDescriptor, ConstraintKind},
    domain::{BitSetDomain, Domain, HashSetDomain, Universe},
    engine::{ConstraintId, SearchStats, SearchStatus, SolveOutcome, VariableId},
    local_search::min_conflicts,
    problem::{CancelToken, Problem, Pruning, SolverConfig, VariableOrdering},
};
