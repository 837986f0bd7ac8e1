//! The solver core: problem store, domains, constraints, propagators,
//! and the backtracking search engine.

pub(crate) mod alldiff;
pub mod constraint;
pub mod domain;
pub mod engine;
pub mod heuristics;
pub mod local_search;
pub mod problem;
pub(crate) mod propagate;
pub(crate) mod revise;
pub mod stats;
pub(crate) mod work_list;

pub use propagate::Propagation;
