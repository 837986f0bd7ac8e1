//! The problem store: variables, domains, constraints, and the mutable
//! search state (assignment, pruning trail, residual-support cache,
//! constraint weights).
//!
//! Variables are dense `0..N` indices assigned at registration;
//! application names live in a side table and never appear on the hot
//! path. The store is built once, owned exclusively by one solve at a
//! time, and restored to its pre-search state when the solve returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{
    error::{BuildError, Result},
    solver::{
        constraint::{Constraint, ConstraintKind},
        domain::{Domain, Universe},
        engine::{self, ConstraintId, SolveOutcome, VariableId},
    },
};

/// Which propagator chain runs after each tentative assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pruning {
    /// No propagation; the consistency check on the just-assigned
    /// variable's constraints is the only filter.
    None,
    /// Forward checking against the assigned variable's neighbours.
    ForwardChecking,
    /// AC3 seeded from arcs into the assigned variable.
    Ac3,
    /// Forward checking, then AC3 seeded from the variables it touched.
    AcFc,
}

/// Variable-selection heuristic, fixed at problem construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableOrdering {
    /// Index order.
    Static,
    /// Minimum remaining values (fail-first); ties go to the lowest index.
    Mrv,
    /// Minimise `|domain| / wdeg`; ties go to the lowest index.
    DomWdeg,
}

/// Cooperative cancellation flag, checked once per search-tree node.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub pruning: Pruning,
    pub ordering: VariableOrdering,
    /// Stop after this many solutions; `usize::MAX` collects all.
    pub max_solutions: usize,
    /// Run the Regin all-different propagator on tagged groups.
    pub use_gac_alldiff: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            pruning: Pruning::ForwardChecking,
            ordering: VariableOrdering::Mrv,
            max_solutions: 1,
            use_gac_alldiff: false,
            cancel: None,
        }
    }
}

/// Per-assignment undo log. Each frame records the `(variable, value)`
/// pairs pruned while that assignment was in force; rollback is a
/// linear re-insertion scan. Frame storage is recycled across the
/// search, so steady-state descent allocates nothing.
#[derive(Debug, Default)]
pub(crate) struct Trail {
    frames: Vec<Vec<(VariableId, u32)>>,
    depth: usize,
}

impl Trail {
    pub fn push_frame(&mut self) {
        if self.depth == self.frames.len() {
            self.frames.push(Vec::new());
        }
        self.depth += 1;
    }

    pub fn record(&mut self, variable: VariableId, value: u32) {
        debug_assert!(self.depth > 0);
        self.frames[self.depth - 1].push((variable, value));
    }

    pub fn in_frame(&self) -> bool {
        self.depth > 0
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }
}

/// A finite-domain constraint satisfaction problem plus its search
/// state. Built via [`Problem::add_variable`] and
/// [`Problem::add_constraint`], then solved with [`Problem::solve`] or
/// [`Problem::solve_with_initial_propagation`].
#[derive(Debug)]
pub struct Problem {
    pub(crate) config: SolverConfig,
    names: Vec<String>,
    name_ids: HashMap<String, VariableId>,
    pub(crate) initial_domains: Vec<Domain>,
    pub(crate) current_domains: Vec<Domain>,
    pub(crate) constraints: Vec<Constraint>,
    /// dom/wdeg weights, parallel to `constraints`.
    pub(crate) weights: Vec<f64>,
    /// Constraint ids whose scope contains the variable.
    pub(crate) var_constraints: Vec<Vec<ConstraintId>>,
    /// Sorted, deduplicated co-scoped variables, excluding self. Fixed
    /// at build time.
    pub(crate) neighbours: Vec<Vec<VariableId>>,
    /// Unordered pair `{u, v}` (normalised `u < v`) to the constraints
    /// whose scope contains both.
    pub(crate) pair_index: HashMap<(VariableId, VariableId), Vec<ConstraintId>>,
    pub(crate) assignment: Vec<Option<u32>>,
    pub(crate) assigned: usize,
    pub(crate) trail: Trail,
    /// Residual supports (AC-2001): `(Xi, x, Xj)` to the last value of
    /// `Xj` seen supporting `Xi = x`. Never rolled back; a stale entry
    /// costs one extra scan and then self-heals.
    pub(crate) supports: HashMap<(VariableId, u32, VariableId), u32>,
}

impl Problem {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            names: Vec::new(),
            name_ids: HashMap::new(),
            initial_domains: Vec::new(),
            current_domains: Vec::new(),
            constraints: Vec::new(),
            weights: Vec::new(),
            var_constraints: Vec::new(),
            neighbours: Vec::new(),
            pair_index: HashMap::new(),
            assignment: Vec::new(),
            assigned: 0,
            trail: Trail::default(),
            supports: HashMap::new(),
        }
    }

    /// Registers a variable and returns its dense index.
    pub fn add_variable(&mut self, name: impl Into<String>, universe: Universe) -> Result<VariableId> {
        let name = name.into();
        if universe.is_empty() {
            return Err(BuildError::EmptyUniverse(name).into());
        }
        if self.name_ids.contains_key(&name) {
            return Err(BuildError::DuplicateVariable(name).into());
        }
        let id = self.names.len() as VariableId;
        let domain = universe.build();
        self.name_ids.insert(name.clone(), id);
        self.names.push(name);
        self.initial_domains.push(domain.clone());
        self.current_domains.push(domain);
        self.var_constraints.push(Vec::new());
        self.neighbours.push(Vec::new());
        self.assignment.push(None);
        Ok(id)
    }

    /// Registers a constraint over `scope` and returns its id. Updates
    /// the per-variable constraint lists, the neighbour sets, and the
    /// pair index.
    pub fn add_constraint(
        &mut self,
        scope: Vec<VariableId>,
        kind: ConstraintKind,
    ) -> Result<ConstraintId> {
        if scope.is_empty() {
            return Err(BuildError::EmptyScope.into());
        }
        for &v in &scope {
            if v as usize >= self.names.len() {
                return Err(BuildError::UnknownVariable(v).into());
            }
        }
        let id = self.constraints.len();
        for i in 0..scope.len() {
            let u = scope[i];
            self.var_constraints[u as usize].push(id);
            for &v in &scope[i + 1..] {
                if u == v {
                    continue;
                }
                self.pair_index.entry(pair_key(u, v)).or_default().push(id);
                self.add_neighbour(u, v);
                self.add_neighbour(v, u);
            }
        }
        self.constraints.push(Constraint { id, scope, kind });
        self.weights.push(1.0);
        Ok(id)
    }

    fn add_neighbour(&mut self, u: VariableId, v: VariableId) {
        let list = &mut self.neighbours[u as usize];
        if let Err(position) = list.binary_search(&v) {
            list.insert(position, v);
        }
    }

    pub fn variable_count(&self) -> usize {
        self.names.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn name_of(&self, variable: VariableId) -> &str {
        &self.names[variable as usize]
    }

    pub fn index_of(&self, name: &str) -> Option<VariableId> {
        self.name_ids.get(name).copied()
    }

    pub fn initial_domain(&self, variable: VariableId) -> &Domain {
        &self.initial_domains[variable as usize]
    }

    pub fn current_domain(&self, variable: VariableId) -> &Domain {
        &self.current_domains[variable as usize]
    }

    pub fn constraint(&self, id: ConstraintId) -> &Constraint {
        &self.constraints[id]
    }

    pub fn constraint_weight(&self, id: ConstraintId) -> f64 {
        self.weights[id]
    }

    pub fn neighbours_of(&self, variable: VariableId) -> &[VariableId] {
        &self.neighbours[variable as usize]
    }

    pub fn is_assigned(&self, variable: VariableId) -> bool {
        self.assignment[variable as usize].is_some()
    }

    /// Finds one or more total assignments satisfying every constraint.
    /// Respects `max_solutions` and the cancel token from the config.
    pub fn solve(&mut self) -> Result<SolveOutcome> {
        engine::solve(self, false)
    }

    /// [`Problem::solve`] preceded by the initial-propagation pass:
    /// one-hop peer pruning for every given plus an AC3 cascade (and a
    /// GAC sweep when enabled). Those prunings are permanent for the
    /// lifetime of the store.
    pub fn solve_with_initial_propagation(&mut self) -> Result<SolveOutcome> {
        engine::solve(self, true)
    }

    // -- search-state mutation ------------------------------------------

    pub(crate) fn push_frame(&mut self) {
        self.trail.push_frame();
    }

    /// Restores every pruning recorded in the top frame and discards it.
    pub(crate) fn rollback_frame(&mut self) {
        assert!(self.trail.depth > 0, "rollback with no open frame");
        let depth = self.trail.depth - 1;
        for &(variable, value) in &self.trail.frames[depth] {
            let inserted = self.current_domains[variable as usize].insert(value);
            assert!(
                inserted,
                "rollback re-inserted value {value} already present in variable {variable}"
            );
        }
        self.trail.frames[depth].clear();
        self.trail.depth = depth;
    }

    /// Binds `variable = value`, shrinking its current domain to the
    /// singleton and logging the removed values in the open frame.
    pub(crate) fn assign(&mut self, variable: VariableId, value: u32) {
        debug_assert!(self.assignment[variable as usize].is_none());
        self.assignment[variable as usize] = Some(value);
        self.assigned += 1;
        let domain = &mut self.current_domains[variable as usize];
        let trail = &mut self.trail;
        domain.reduce_to_singleton(value, |removed| trail.record(variable, removed));
    }

    pub(crate) fn unassign(&mut self, variable: VariableId) {
        debug_assert!(self.assignment[variable as usize].is_some());
        self.assignment[variable as usize] = None;
        self.assigned -= 1;
    }

    /// Removes `value` from `variable`'s current domain, logging it in
    /// the open frame if one exists. Prunings outside any frame (the
    /// initial-propagation pass) are permanent.
    pub(crate) fn prune(&mut self, variable: VariableId, value: u32) {
        let removed = self.current_domains[variable as usize].remove(value);
        assert!(
            removed,
            "pruned value {value} not present in variable {variable}"
        );
        if self.trail.in_frame() {
            self.trail.record(variable, value);
        }
    }

    /// Evaluates every constraint in `variable`'s list against the
    /// current partial assignment.
    pub(crate) fn check_constraints_of(&self, variable: VariableId) -> bool {
        self.var_constraints[variable as usize]
            .iter()
            .all(|&id| self.constraints[id].check(&self.assignment))
    }

    /// dom/wdeg feedback: after a wipeout triggered by assigning
    /// `variable`, bump every constraint of `variable` that still has
    /// another unassigned scope member.
    pub(crate) fn bump_weights_for(&mut self, variable: VariableId) {
        for i in 0..self.var_constraints[variable as usize].len() {
            let id = self.var_constraints[variable as usize][i];
            let open = self.constraints[id]
                .scope
                .iter()
                .any(|&u| u != variable && self.assignment[u as usize].is_none());
            if open {
                self.weights[id] += 1.0;
            }
        }
    }

    /// Tests whether `u = x` is consistent with already-assigned `v`
    /// under every constraint the pair shares.
    pub(crate) fn consistent_tentative(&mut self, u: VariableId, x: u32, v: VariableId) -> bool {
        let saved = self.assignment[u as usize];
        self.assignment[u as usize] = Some(x);
        let ok = match self.pair_index.get(&pair_key(u, v)) {
            Some(ids) => ids
                .iter()
                .all(|&id| self.constraints[id].check(&self.assignment)),
            None => true,
        };
        self.assignment[u as usize] = saved;
        ok
    }

    /// Tests whether the pair `Xi = x`, `Xj = y` satisfies every
    /// constraint whose scope lies within `{Xi, Xj}`.
    pub(crate) fn binary_pair_consistent(
        &mut self,
        xi: VariableId,
        x: u32,
        xj: VariableId,
        y: u32,
    ) -> bool {
        let saved_i = self.assignment[xi as usize];
        let saved_j = self.assignment[xj as usize];
        self.assignment[xi as usize] = Some(x);
        self.assignment[xj as usize] = Some(y);
        let ok = match self.pair_index.get(&pair_key(xi, xj)) {
            Some(ids) => ids.iter().all(|&id| {
                let constraint = &self.constraints[id];
                constraint.scope.len() > 2 || constraint.check(&self.assignment)
            }),
            None => true,
        };
        self.assignment[xi as usize] = saved_i;
        self.assignment[xj as usize] = saved_j;
        ok
    }

    #[cfg(test)]
    pub(crate) fn poison_support(&mut self, xi: VariableId, x: u32, xj: VariableId, y: u32) {
        self.supports.insert((xi, x, xj), y);
    }
}

#[inline]
pub(crate) fn pair_key(u: VariableId, v: VariableId) -> (VariableId, VariableId) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn two_variable_problem() -> Problem {
        let mut problem = Problem::new(SolverConfig::default());
        let a = problem.add_variable("a", Universe::range(1, 3)).unwrap();
        let b = problem.add_variable("b", Universe::range(1, 3)).unwrap();
        problem
            .add_constraint(vec![a, b], ConstraintKind::NotEqual)
            .unwrap();
        problem
    }

    #[test]
    fn build_rejects_unknown_scope_variable() {
        let mut problem = Problem::new(SolverConfig::default());
        problem.add_variable("a", Universe::range(0, 1)).unwrap();
        let err = problem
            .add_constraint(vec![0, 5], ConstraintKind::NotEqual)
            .unwrap_err();
        assert!(matches!(
            err.build_error(),
            BuildError::UnknownVariable(5)
        ));
    }

    #[test]
    fn build_rejects_empty_universe_and_duplicates() {
        let mut problem = Problem::new(SolverConfig::default());
        assert!(matches!(
            problem
                .add_variable("a", Universe::range(3, 2))
                .unwrap_err()
                .build_error(),
            BuildError::EmptyUniverse(_)
        ));
        problem.add_variable("a", Universe::range(0, 1)).unwrap();
        assert!(matches!(
            problem
                .add_variable("a", Universe::range(0, 1))
                .unwrap_err()
                .build_error(),
            BuildError::DuplicateVariable(_)
        ));
    }

    #[test]
    fn registration_populates_indices() {
        let mut problem = Problem::new(SolverConfig::default());
        let a = problem.add_variable("a", Universe::range(1, 3)).unwrap();
        let b = problem.add_variable("b", Universe::range(1, 3)).unwrap();
        let c = problem.add_variable("c", Universe::range(1, 3)).unwrap();
        let id = problem
            .add_constraint(vec![a, b, c], ConstraintKind::AllDifferent)
            .unwrap();
        assert_eq!(problem.neighbours_of(a), &[b, c]);
        assert_eq!(problem.neighbours_of(b), &[a, c]);
        assert_eq!(problem.pair_index[&pair_key(c, a)], vec![id]);
        assert_eq!(problem.var_constraints[b as usize], vec![id]);
        assert_eq!(problem.constraint_weight(id), 1.0);
    }

    #[test]
    fn assign_and_rollback_restore_domains() {
        let mut problem = two_variable_problem();
        let before = problem.current_domains.clone();
        problem.push_frame();
        problem.assign(0, 2);
        assert_eq!(problem.current_domain(0).singleton_value(), Some(2));
        problem.prune(1, 2);
        assert_eq!(problem.current_domain(1).len(), 2);
        problem.unassign(0);
        problem.rollback_frame();
        assert_eq!(problem.current_domains, before);
        assert!(problem.trail.is_empty());
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn pruning_missing_value_is_an_invariant_violation() {
        let mut problem = two_variable_problem();
        problem.push_frame();
        problem.prune(0, 3);
        problem.prune(0, 3);
    }

    #[test]
    fn tentative_checks_do_not_disturb_assignment() {
        let mut problem = two_variable_problem();
        problem.push_frame();
        problem.assign(1, 2);
        assert!(problem.consistent_tentative(0, 1, 1));
        assert!(!problem.consistent_tentative(0, 2, 1));
        assert_eq!(problem.assignment[0], None);
        assert_eq!(problem.assignment[1], Some(2));
        assert!(problem.binary_pair_consistent(0, 1, 1, 2));
        assert!(!problem.binary_pair_consistent(0, 2, 1, 2));
        assert_eq!(problem.assignment[1], Some(2));
    }
}
