//! LP solver backends
//!
//! Every backend implements [`Solver`], translating a [`Problem`] into its own
//! representation on each call.
pub mod clarabel;
#[cfg(feature = "minilp")]
pub mod microlp;

use cfg_if::cfg_if;
use thiserror::Error;

use crate::configuration::{SolverKind, CONFIGURATION};
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

/// A solver for linear problems with continuous variables
pub trait Solver {
    /// Solve the problem
    ///
    /// Infeasible and unbounded problems are not errors, they are reported through the
    /// status of the returned [`ProblemSolution`].
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Create the solver selected in the process wide configuration
pub fn default_solver() -> Result<Box<dyn Solver>, SolverError> {
    let kind = CONFIGURATION.read().unwrap().solver;
    solver_for(kind)
}

/// Create a solver of the given kind
pub fn solver_for(kind: SolverKind) -> Result<Box<dyn Solver>, SolverError> {
    match kind {
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::default())),
        SolverKind::MicroLp => microlp_solver(),
    }
}

cfg_if! {
    if #[cfg(feature = "minilp")] {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Ok(Box::new(microlp::MicroLpSolver::default()))
        }
    } else {
        fn microlp_solver() -> Result<Box<dyn Solver>, SolverError> {
            Err(SolverError::SolverNotAvailable(SolverKind::MicroLp))
        }
    }
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Solver {0:?} is not available, check the enabled features")]
    SolverNotAvailable(SolverKind),
    #[error("Problem has no variables")]
    EmptyProblem,
    #[error("Solver failed: {0}")]
    SolverFailure(String),
}
