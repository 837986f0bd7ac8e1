//! Propagator chain run after each tentative assignment.
//!
//! Every propagator shares the same contract: mutate current domains
//! (logging prunings in the open frame) and report
//! [`Propagation::Wipeout`] as soon as any domain empties. The engine
//! translates a wipeout into dom/wdeg weight feedback and a rollback.

use tracing::trace;

use crate::solver::{
    alldiff::{self, ReginScratch},
    engine::{SearchStats, VariableId},
    problem::{Problem, Pruning},
    revise::revise,
    work_list::ArcQueue,
};

/// Explicit propagation outcome; a wipeout is normal control flow, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Ok,
    Wipeout,
}

/// Reusable buffers for one solve. Everything here is recycled between
/// nodes so the steady-state search loop performs no allocation.
#[derive(Debug, Default)]
pub(crate) struct Workspace {
    pub values: Vec<u32>,
    pub witnesses: Vec<u32>,
    pub touched: Vec<VariableId>,
    pub queue: ArcQueue,
    pub snapshots: Vec<Vec<u32>>,
    pub gac: ReginScratch,
}

/// Runs the configured propagator chain for the just-assigned variable.
pub(crate) fn after_assignment(
    problem: &mut Problem,
    variable: VariableId,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> Propagation {
    let base = match problem.config.pruning {
        Pruning::None => Propagation::Ok,
        Pruning::ForwardChecking => {
            workspace.touched.clear();
            forward_check(problem, variable, workspace, stats)
        }
        Pruning::Ac3 => {
            workspace.queue.clear();
            seed_arcs_into(problem, variable, &mut workspace.queue);
            ac3(problem, workspace, stats)
        }
        Pruning::AcFc => {
            workspace.touched.clear();
            match forward_check(problem, variable, workspace, stats) {
                Propagation::Wipeout => Propagation::Wipeout,
                Propagation::Ok => {
                    workspace.queue.clear();
                    for i in 0..workspace.touched.len() {
                        seed_arcs_into(problem, workspace.touched[i], &mut workspace.queue);
                    }
                    ac3(problem, workspace, stats)
                }
            }
        }
    };
    if base == Propagation::Wipeout {
        return Propagation::Wipeout;
    }
    if problem.config.use_gac_alldiff {
        alldiff::propagate(problem, Some(variable), workspace, stats)
    } else {
        Propagation::Ok
    }
}

/// Forward checking: for each unassigned neighbour `u` of `variable`,
/// drop every candidate inconsistent with the new assignment under the
/// constraints `u` shares with it. Variables that lost at least one
/// value are appended to `workspace.touched`.
pub(crate) fn forward_check(
    problem: &mut Problem,
    variable: VariableId,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> Propagation {
    for i in 0..problem.neighbours[variable as usize].len() {
        let u = problem.neighbours[variable as usize][i];
        if problem.is_assigned(u) {
            continue;
        }
        problem.current_domains[u as usize].collect_sorted_into(&mut workspace.values);
        let mut removed_any = false;
        for &x in &workspace.values {
            if !problem.consistent_tentative(u, x, variable) {
                problem.prune(u, x);
                stats.prunings += 1;
                removed_any = true;
            }
        }
        if removed_any {
            workspace.touched.push(u);
            if problem.current_domains[u as usize].is_empty() {
                trace!(variable = u, "forward check wiped out a domain");
                return Propagation::Wipeout;
            }
        }
    }
    Propagation::Ok
}

/// Enqueues every arc `(u -> variable)` for unassigned neighbours `u`.
fn seed_arcs_into(problem: &Problem, variable: VariableId, queue: &mut ArcQueue) {
    for &u in &problem.neighbours[variable as usize] {
        if !problem.is_assigned(u) {
            queue.push_back(u, variable);
        }
    }
}

/// Drains the arc worklist to fixpoint. Each revision that shrinks a
/// domain re-enqueues the arcs pointing at the shrunken variable.
/// Terminates because every effective revision strictly shrinks a
/// finite domain.
pub(crate) fn ac3(
    problem: &mut Problem,
    workspace: &mut Workspace,
    stats: &mut SearchStats,
) -> Propagation {
    while let Some((xi, xj)) = workspace.queue.pop_front() {
        let revision = revise(
            problem,
            xi,
            xj,
            &mut workspace.values,
            &mut workspace.witnesses,
            stats,
        );
        if revision.wipeout {
            trace!(variable = xi, "ac3 wiped out a domain");
            workspace.queue.clear();
            return Propagation::Wipeout;
        }
        if revision.changed {
            for i in 0..problem.neighbours[xi as usize].len() {
                let xk = problem.neighbours[xi as usize][i];
                if xk != xj && !problem.is_assigned(xk) {
                    workspace.queue.push_back(xk, xi);
                }
            }
        }
    }
    Propagation::Ok
}
