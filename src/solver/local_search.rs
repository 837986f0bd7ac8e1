//! Min-conflicts local search.
//!
//! An incomplete alternative to systematic search: start from a random
//! total assignment and repeatedly repair a conflicted variable. A
//! variable is in conflict iff some constraint in its constraint list
//! evaluates false under the current total assignment, whatever the
//! constraint's arity.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::solver::{engine::VariableId, problem::Problem};

/// Runs min-conflicts for at most `max_iterations` repair steps and
/// returns a total assignment, which may or may not satisfy every
/// constraint. The store itself is never mutated.
pub fn min_conflicts<R: Rng>(
    problem: &Problem,
    max_iterations: usize,
    rng: &mut R,
) -> Vec<u32> {
    let n = problem.variable_count();
    let mut assignment: Vec<Option<u32>> = vec![None; n];
    let mut candidates: Vec<u32> = Vec::new();

    for v in 0..n {
        problem
            .initial_domain(v as VariableId)
            .collect_sorted_into(&mut candidates);
        assignment[v] = candidates.choose(rng).copied();
    }

    let mut conflicted: Vec<VariableId> = Vec::new();
    let mut best_values: Vec<u32> = Vec::new();
    for _ in 0..max_iterations {
        conflicted.clear();
        for v in 0..n as VariableId {
            if conflict_count(problem, v, &assignment) > 0 {
                conflicted.push(v);
            }
        }
        let Some(&v) = conflicted.choose(rng) else {
            break;
        };

        problem.initial_domain(v).collect_sorted_into(&mut candidates);
        let mut best = usize::MAX;
        best_values.clear();
        for &value in &candidates {
            assignment[v as usize] = Some(value);
            let conflicts = conflict_count(problem, v, &assignment);
            if conflicts < best {
                best = conflicts;
                best_values.clear();
                best_values.push(value);
            } else if conflicts == best {
                best_values.push(value);
            }
        }
        assignment[v as usize] = best_values.choose(rng).copied();
    }

    assignment
        .into_iter()
        .map(|value| value.expect("total assignment"))
        .collect()
}

fn conflict_count(problem: &Problem, v: VariableId, assignment: &[Option<u32>]) -> usize {
    problem.var_constraints[v as usize]
        .iter()
        .filter(|&&id| !problem.constraints[id].check(assignment))
        .count()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::solver::{
        constraint::ConstraintKind,
        domain::Universe,
        problem::{Problem, SolverConfig},
    };

    use super::*;

    #[test]
    fn repairs_a_small_colouring() {
        let mut problem = Problem::new(SolverConfig::default());
        for name in ["a", "b", "c", "d"] {
            problem.add_variable(name, Universe::range(0, 2)).unwrap();
        }
        for (u, v) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            problem
                .add_constraint(vec![u, v], ConstraintKind::NotEqual)
                .unwrap();
        }

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let assignment = min_conflicts(&problem, 10_000, &mut rng);
        let total: Vec<Option<u32>> = assignment.iter().map(|&v| Some(v)).collect();
        for constraint in &problem.constraints {
            assert!(constraint.check(&total), "constraint left in conflict");
        }
        // The store is untouched.
        assert_eq!(problem.current_domain(0).len(), 3);
    }

    #[test]
    fn respects_the_iteration_cap() {
        // Unsatisfiable: two variables, one shared value, must differ.
        let mut problem = Problem::new(SolverConfig::default());
        problem.add_variable("a", Universe::range(1, 1)).unwrap();
        problem.add_variable("b", Universe::range(1, 1)).unwrap();
        problem
            .add_constraint(vec![0, 1], ConstraintKind::NotEqual)
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let assignment = min_conflicts(&problem, 50, &mut rng);
        assert_eq!(assignment, vec![1, 1]);
    }
}
