//! The backtracking search engine and the initial-propagation pass.
//!
//! The engine owns the problem store exclusively for the duration of a
//! solve. Each tentative assignment pushes a pruning frame; each
//! backtrack pops and restores it, so the store always returns to its
//! pre-search state. Per-depth buffers are recycled: steady-state
//! descent allocates only when the search first exceeds a depth it has
//! seen before.

use std::mem;

use tracing::debug;

use crate::{
    error::Result,
    solver::{
        alldiff,
        constraint::ConstraintKind,
        heuristics::variable,
        problem::{CancelToken, Problem},
        propagate::{self, Propagation, Workspace},
    },
};

/// A numeric identifier for a single variable in the constraint problem.
pub type VariableId = u32;
/// A numeric identifier for a single constraint in the constraint problem.
pub type ConstraintId = usize;

/// Counters for the entire search process.
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    /// Nodes (tentative assignments) visited in the search tree.
    pub nodes_visited: u64,
    /// Assignment frames rolled back without reaching the solution cap.
    pub backtracks: u64,
    /// Total solutions recorded.
    pub solutions: u64,
    /// Calls into the arc-revision kernel.
    pub revisions: u64,
    /// Revisions short-circuited by a cached residual support.
    pub support_hits: u64,
    /// Values removed by propagation.
    pub prunings: u64,
    /// Domain wipeouts observed during propagation.
    pub wipeouts: u64,
    /// All-different groups filtered by the GAC propagator.
    pub gac_runs: u64,
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The search space was exhausted or the solution cap was reached.
    Complete,
    /// The cancel token fired; `solutions` holds whatever was collected.
    Cancelled,
}

/// The result of a solve: zero or more total assignments (variable
/// index to value, densely indexed), plus status and statistics. An
/// empty solution list with [`SearchStatus::Complete`] means the
/// problem is unsatisfiable.
#[derive(Debug)]
pub struct SolveOutcome {
    pub solutions: Vec<Vec<u32>>,
    pub status: SearchStatus,
    pub stats: SearchStats,
}

impl SolveOutcome {
    pub fn is_unsat(&self) -> bool {
        self.solutions.is_empty() && self.status == SearchStatus::Complete
    }

    pub fn first(&self) -> Option<&Vec<u32>> {
        self.solutions.first()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    /// Keep exploring sibling values.
    Continue,
    /// The solution cap was reached; unwind without exploring further.
    Stop,
    /// The cancel token fired; unwind fully.
    Cancelled,
}

pub(crate) fn solve(problem: &mut Problem, with_initial_propagation: bool) -> Result<SolveOutcome> {
    assert_eq!(problem.assigned, 0, "solve entered with a dirty assignment");
    assert!(problem.trail.is_empty(), "solve entered with a dirty trail");
    // The residual-support cache lives for a single solve.
    problem.supports.clear();

    let mut stats = SearchStats::default();
    let mut workspace = Workspace::default();

    if with_initial_propagation && !initial_propagation(problem, &mut workspace, &mut stats) {
        debug!("initial propagation proved the problem unsatisfiable");
        return Ok(SolveOutcome {
            solutions: Vec::new(),
            status: SearchStatus::Complete,
            stats,
        });
    }

    let cancel = problem.config.cancel.clone();
    let max_solutions = problem.config.max_solutions.max(1);
    let mut search = Search {
        problem,
        workspace,
        stats,
        solutions: Vec::new(),
        max_solutions,
        cancel,
    };
    let control = search.backtrack(0);

    let Search {
        problem, stats, solutions, ..
    } = search;
    assert!(
        problem.trail.is_empty(),
        "pruning trail not fully unwound after search"
    );
    assert_eq!(problem.assigned, 0, "assignment not fully unwound after search");

    debug!(
        solutions = solutions.len(),
        nodes = stats.nodes_visited,
        backtracks = stats.backtracks,
        "search finished"
    );
    Ok(SolveOutcome {
        solutions,
        status: match control {
            Control::Cancelled => SearchStatus::Cancelled,
            _ => SearchStatus::Complete,
        },
        stats,
    })
}

struct Search<'a> {
    problem: &'a mut Problem,
    workspace: Workspace,
    stats: SearchStats,
    solutions: Vec<Vec<u32>>,
    max_solutions: usize,
    cancel: Option<CancelToken>,
}

impl Search<'_> {
    fn backtrack(&mut self, depth: usize) -> Control {
        if self.problem.assigned == self.problem.variable_count() {
            self.record_solution();
            return if self.solutions.len() >= self.max_solutions {
                Control::Stop
            } else {
                Control::Continue
            };
        }

        let v = variable::select(self.problem).expect("an unassigned variable must exist");

        // Stable snapshot of the values to try; the domain itself is
        // mutated (and restored) while each candidate is explored.
        if self.workspace.snapshots.len() == depth {
            self.workspace.snapshots.push(Vec::new());
        }
        let mut snapshot = mem::take(&mut self.workspace.snapshots[depth]);
        self.problem.current_domains[v as usize].collect_sorted_into(&mut snapshot);

        let mut control = Control::Continue;
        for &value in &snapshot {
            if self.cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
                control = Control::Cancelled;
                break;
            }
            self.stats.nodes_visited += 1;
            self.problem.push_frame();
            self.problem.assign(v, value);

            let mut descend = self.problem.check_constraints_of(v);
            if descend {
                match propagate::after_assignment(
                    self.problem,
                    v,
                    &mut self.workspace,
                    &mut self.stats,
                ) {
                    Propagation::Ok => {}
                    Propagation::Wipeout => {
                        self.stats.wipeouts += 1;
                        self.problem.bump_weights_for(v);
                        descend = false;
                    }
                }
            }

            let child = if descend {
                self.backtrack(depth + 1)
            } else {
                Control::Continue
            };

            self.problem.unassign(v);
            self.problem.rollback_frame();

            if child != Control::Continue {
                control = child;
                break;
            }
            self.stats.backtracks += 1;
        }

        self.workspace.snapshots[depth] = snapshot;
        control
    }

    fn record_solution(&mut self) {
        let total = self
            .problem
            .assignment
            .iter()
            .map(|value| value.expect("complete assignment"))
            .collect();
        self.solutions.push(total);
        self.stats.solutions += 1;
        debug!(solution = self.stats.solutions, "recorded a solution");
    }
}

/// One-shot propagation run before the first search step
/// (`solve_with_initial_propagation`): shrink every given to its
/// constant, remove that value from each of its neighbours, then run an
/// AC3 cascade seeded from every arc incident to a given. When GAC is
/// enabled, every tagged all-different group is swept once as well.
///
/// These prunings happen outside any frame and are therefore permanent
/// for the lifetime of the store. Returns `false` if the givens are
/// already contradictory.
pub(crate) fn initial_propagation(
    problem: &mut Problem,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> bool {
    let mut givens: Vec<(VariableId, u32)> = Vec::new();
    for constraint in &problem.constraints {
        if constraint.scope.len() == 1 {
            if let ConstraintKind::EqualConst(value) = &constraint.kind {
                givens.push((constraint.scope[0], *value));
            }
        }
    }

    for &(v, value) in &givens {
        if !problem.current_domains[v as usize].contains(value) {
            debug!(variable = v, value, "given contradicts earlier pruning");
            return false;
        }
        if !problem.current_domains[v as usize].is_singleton() {
            problem.current_domains[v as usize].reduce_to_singleton(value, |_| {});
        }
    }

    // One-hop peer pruning.
    for &(v, value) in &givens {
        for i in 0..problem.neighbours[v as usize].len() {
            let u = problem.neighbours[v as usize][i];
            if problem.current_domains[u as usize].remove(value) {
                stats.prunings += 1;
                if problem.current_domains[u as usize].is_empty() {
                    debug!(variable = u, "peer pruning wiped out a domain");
                    return false;
                }
            }
        }
    }

    // Full AC3 cascade from every arc incident to a given.
    workspace.queue.clear();
    for &(v, _) in &givens {
        for i in 0..problem.neighbours[v as usize].len() {
            let u = problem.neighbours[v as usize][i];
            workspace.queue.push_back(u, v);
            workspace.queue.push_back(v, u);
        }
    }
    if propagate::ac3(problem, workspace, stats) == Propagation::Wipeout {
        return false;
    }

    if problem.config.use_gac_alldiff
        && alldiff::propagate(problem, None, workspace, stats) == Propagation::Wipeout
    {
        debug!("initial GAC sweep found an infeasible all-different group");
        return false;
    }
    true
}
