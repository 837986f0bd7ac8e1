//! Constraint representation.
//!
//! A [`Constraint`] is a scoped predicate over variable indices. The
//! [`ConstraintKind`] variants double as the global-propagator tag: the
//! GAC machinery recognises [`ConstraintKind::AllDifferent`] by variant,
//! never by inspecting a closure.

use std::fmt;
use std::sync::Arc;

use crate::solver::engine::{ConstraintId, VariableId};

/// Predicate over the two scope values of a binary constraint.
pub type BinaryPredicate = Arc<dyn Fn(u32, u32) -> bool + Send + Sync>;

/// Predicate over an arbitrary scope. Receives the scope and the full
/// assignment array and must return `true` while any scope variable is
/// still unassigned, unless the assigned prefix already contradicts it.
pub type ScopePredicate = Arc<dyn Fn(&[VariableId], &[Option<u32>]) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum ConstraintKind {
    /// The two scope variables must take distinct values.
    NotEqual,
    /// The single scope variable must equal the given constant (a "given").
    EqualConst(u32),
    /// Arbitrary binary relation over the two scope values, in scope order.
    Binary(BinaryPredicate),
    /// Every pair of scope variables must take distinct values. Tagged:
    /// this is the variant the GAC propagator operates on.
    AllDifferent,
    /// Generic k-ary predicate.
    Predicate(ScopePredicate),
}

impl ConstraintKind {
    pub fn binary(f: impl Fn(u32, u32) -> bool + Send + Sync + 'static) -> Self {
        ConstraintKind::Binary(Arc::new(f))
    }

    pub fn predicate(
        f: impl Fn(&[VariableId], &[Option<u32>]) -> bool + Send + Sync + 'static,
    ) -> Self {
        ConstraintKind::Predicate(Arc::new(f))
    }
}

impl fmt::Debug for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::NotEqual => write!(f, "NotEqual"),
            ConstraintKind::EqualConst(value) => write!(f, "EqualConst({value})"),
            ConstraintKind::Binary(_) => write!(f, "Binary(..)"),
            ConstraintKind::AllDifferent => write!(f, "AllDifferent"),
            ConstraintKind::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// A registered constraint: a fresh integer id, an ordered scope, and a
/// kind. The dom/wdeg weight lives in the problem store, parallel to the
/// constraint registry, so the hot path reads a flat `Vec<f64>`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: ConstraintId,
    pub scope: Vec<VariableId>,
    pub kind: ConstraintKind,
}

/// Human-readable identification of a constraint, used by the stats
/// table and log output.
#[derive(Debug, Clone)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub description: String,
}

impl Constraint {
    pub fn is_all_different(&self) -> bool {
        matches!(self.kind, ConstraintKind::AllDifferent)
    }

    /// Evaluates the constraint against a partial assignment. Returns
    /// `true` unless the values assigned so far already violate it; a
    /// constraint with unassigned scope variables is satisfiable until
    /// proven otherwise.
    pub fn check(&self, assignment: &[Option<u32>]) -> bool {
        match &self.kind {
            ConstraintKind::NotEqual => {
                match (
                    assignment[self.scope[0] as usize],
                    assignment[self.scope[1] as usize],
                ) {
                    (Some(a), Some(b)) => a != b,
                    _ => true,
                }
            }
            ConstraintKind::EqualConst(constant) => {
                match assignment[self.scope[0] as usize] {
                    Some(value) => value == *constant,
                    None => true,
                }
            }
            ConstraintKind::Binary(f) => {
                match (
                    assignment[self.scope[0] as usize],
                    assignment[self.scope[1] as usize],
                ) {
                    (Some(a), Some(b)) => f(a, b),
                    _ => true,
                }
            }
            ConstraintKind::AllDifferent => {
                for i in 0..self.scope.len() {
                    let Some(a) = assignment[self.scope[i] as usize] else {
                        continue;
                    };
                    for j in (i + 1)..self.scope.len() {
                        if assignment[self.scope[j] as usize] == Some(a) {
                            return false;
                        }
                    }
                }
                true
            }
            ConstraintKind::Predicate(f) => f(&self.scope, assignment),
        }
    }

    pub fn descriptor(&self) -> ConstraintDescriptor {
        let vars = self
            .scope
            .iter()
            .map(|v| format!("?{v}"))
            .collect::<Vec<_>>()
            .join(", ");
        let name = match &self.kind {
            ConstraintKind::NotEqual => "NotEqual",
            ConstraintKind::EqualConst(_) => "EqualConst",
            ConstraintKind::Binary(_) => "Binary",
            ConstraintKind::AllDifferent => "AllDifferent",
            ConstraintKind::Predicate(_) => "Predicate",
        };
        ConstraintDescriptor {
            name: name.to_string(),
            description: format!("{name}({vars})"),
        }
    }
}
