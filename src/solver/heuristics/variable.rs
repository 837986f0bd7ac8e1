//! Variable-selection heuristics.
//!
//! The ordering is fixed at problem construction via
//! [`crate::solver::problem::VariableOrdering`]. All strategies break
//! ties on the lowest variable index so that search order, and thus the
//! produced solution sequence, is fully deterministic.

use crate::solver::{
    engine::VariableId,
    problem::{Problem, VariableOrdering},
};

/// Selects the next unassigned variable to branch on, or `None` when
/// every variable is assigned.
pub fn select(problem: &Problem) -> Option<VariableId> {
    match problem.config.ordering {
        VariableOrdering::Static => select_static(problem),
        VariableOrdering::Mrv => select_mrv(problem),
        VariableOrdering::DomWdeg => select_dom_wdeg(problem),
    }
}

/// Index order.
fn select_static(problem: &Problem) -> Option<VariableId> {
    (0..problem.variable_count() as VariableId).find(|&v| !problem.is_assigned(v))
}

/// Minimum remaining values: the fail-first strategy picks the most
/// constrained variable so dead ends surface early.
fn select_mrv(problem: &Problem) -> Option<VariableId> {
    let mut best: Option<(usize, VariableId)> = None;
    for v in 0..problem.variable_count() as VariableId {
        if problem.is_assigned(v) {
            continue;
        }
        let size = problem.current_domain(v).len();
        if best.map_or(true, |(best_size, _)| size < best_size) {
            best = Some((size, v));
        }
    }
    best.map(|(_, v)| v)
}

/// dom/wdeg: minimise `|domain(v)| / wdeg(v)` where `wdeg` sums the
/// weights of v's constraints that still have at least two unassigned
/// scope members. A zero denominator degrades to plain domain size.
fn select_dom_wdeg(problem: &Problem) -> Option<VariableId> {
    let mut best: Option<(f64, VariableId)> = None;
    for v in 0..problem.variable_count() as VariableId {
        if problem.is_assigned(v) {
            continue;
        }
        let score = dom_wdeg_score(problem, v);
        if best.map_or(true, |(best_score, _)| score < best_score) {
            best = Some((score, v));
        }
    }
    best.map(|(_, v)| v)
}

fn dom_wdeg_score(problem: &Problem, v: VariableId) -> f64 {
    let size = problem.current_domain(v).len() as f64;
    let mut wdeg = 0.0;
    for &id in &problem.var_constraints[v as usize] {
        let unassigned = problem
            .constraints[id]
            .scope
            .iter()
            .filter(|&&u| !problem.is_assigned(u))
            .count();
        if unassigned >= 2 {
            wdeg += problem.weights[id];
        }
    }
    if wdeg == 0.0 {
        size
    } else {
        size / wdeg
    }
}
