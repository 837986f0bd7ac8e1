//! Binary-arc revision with residual supports (AC-2001).

use crate::solver::{
    engine::{SearchStats, VariableId},
    problem::Problem,
};

/// Outcome of one arc revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Revision {
    pub changed: bool,
    pub wipeout: bool,
}

/// Revises the arc `Xi -> Xj`: every value of `Xi` must have some
/// supporting value in `Xj` under the constraints whose scope lies
/// within the pair. Unsupported values are pruned (and logged in the
/// open frame, if any).
///
/// A cached residual support is tried before the scan. The cache is
/// never rolled back on backtrack; a stale entry fails the validity
/// test, costs one scan, and is overwritten by the fresh witness.
pub(crate) fn revise(
    problem: &mut Problem,
    xi: VariableId,
    xj: VariableId,
    candidates: &mut Vec<u32>,
    witnesses: &mut Vec<u32>,
    stats: &mut SearchStats,
) -> Revision {
    stats.revisions += 1;
    problem.current_domains[xi as usize].collect_sorted_into(candidates);
    problem.current_domains[xj as usize].collect_sorted_into(witnesses);

    let mut changed = false;
    for &x in candidates.iter() {
        let cached = problem.supports.get(&(xi, x, xj)).copied();
        if let Some(y) = cached {
            if problem.current_domains[xj as usize].contains(y)
                && problem.binary_pair_consistent(xi, x, xj, y)
            {
                stats.support_hits += 1;
                continue;
            }
        }
        let support = witnesses
            .iter()
            .copied()
            .find(|&y| problem.binary_pair_consistent(xi, x, xj, y));
        match support {
            Some(y) => {
                problem.supports.insert((xi, x, xj), y);
            }
            None => {
                problem.prune(xi, x);
                stats.prunings += 1;
                changed = true;
            }
        }
    }
    Revision {
        changed,
        wipeout: problem.current_domains[xi as usize].is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::solver::{
        constraint::ConstraintKind,
        domain::Universe,
        problem::{Problem, SolverConfig},
    };

    use super::*;

    fn less_than_problem() -> Problem {
        let mut problem = Problem::new(SolverConfig::default());
        let x = problem.add_variable("x", Universe::range(1, 3)).unwrap();
        let y = problem.add_variable("y", Universe::range(1, 3)).unwrap();
        problem
            .add_constraint(vec![x, y], ConstraintKind::binary(|a, b| a < b))
            .unwrap();
        problem
    }

    fn run_revise(problem: &mut Problem, xi: VariableId, xj: VariableId) -> Revision {
        let mut candidates = Vec::new();
        let mut witnesses = Vec::new();
        let mut stats = SearchStats::default();
        revise(problem, xi, xj, &mut candidates, &mut witnesses, &mut stats)
    }

    #[test]
    fn prunes_unsupported_values() {
        let mut problem = less_than_problem();
        let revision = run_revise(&mut problem, 0, 1);
        assert!(revision.changed);
        assert!(!revision.wipeout);
        let mut left = Vec::new();
        problem.current_domain(0).collect_sorted_into(&mut left);
        assert_eq!(left, vec![1, 2]);
    }

    #[test]
    fn reports_wipeout_when_domain_empties() {
        let mut problem = Problem::new(SolverConfig::default());
        let x = problem.add_variable("x", Universe::range(5, 5)).unwrap();
        let y = problem.add_variable("y", Universe::range(1, 3)).unwrap();
        problem
            .add_constraint(vec![x, y], ConstraintKind::binary(|a, b| a < b))
            .unwrap();
        let revision = run_revise(&mut problem, x, y);
        assert!(revision.changed);
        assert!(revision.wipeout);
    }

    #[test]
    fn residual_support_is_reused() {
        let mut problem = less_than_problem();
        let mut candidates = Vec::new();
        let mut witnesses = Vec::new();
        let mut stats = SearchStats::default();
        revise(&mut problem, 0, 1, &mut candidates, &mut witnesses, &mut stats);
        assert_eq!(stats.support_hits, 0);
        revise(&mut problem, 0, 1, &mut candidates, &mut witnesses, &mut stats);
        assert_eq!(stats.support_hits, 2);
    }

    #[test]
    fn poisoned_support_self_heals() {
        let mut problem = less_than_problem();
        // 1 < 1 is false: the cached witness is a lie.
        problem.poison_support(0, 1, 1, 1);
        // And a witness that is no longer in the domain.
        problem.poison_support(0, 2, 1, 3);
        problem.current_domains[1].remove(3);

        let revision = run_revise(&mut problem, 0, 1);
        assert!(revision.changed);
        let mut left = Vec::new();
        problem.current_domain(0).collect_sorted_into(&mut left);
        // x = 1 keeps its (rescanned) support, x = 2 loses its only one.
        assert_eq!(left, vec![1]);
        assert_eq!(problem.supports[&(0, 1, 1)], 2);
    }
}
