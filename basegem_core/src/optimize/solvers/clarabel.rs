//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x'Px + q'x` subject to `Ax + s = b`, `s` in a product of cones.
//! Equality constraints and fixed variables become rows of the zero cone, every finite
//! inequality or variable bound becomes a row of the nonnegative cone.
use ::clarabel::algebra::CscMatrix as ClarabelCsc;
use ::clarabel::solver::{
    DefaultSettings, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use log::trace;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point solver backed by the clarabel crate
#[derive(Clone, Debug)]
pub struct ClarabelSolver {
    /// Print clarabel's iteration log
    pub verbose: bool,
    /// Maximum number of interior point iterations
    pub max_iter: u32,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            verbose: false,
            max_iter: 200,
        }
    }
}

/// A single row of the constraint matrix
struct Row {
    entries: Vec<(usize, f64)>,
    rhs: f64,
}

impl Row {
    /// Row representing `coef * x_index <= rhs` (or `= rhs` in the zero cone)
    fn single(index: usize, coef: f64, rhs: f64) -> Self {
        Row {
            entries: vec![(index, coef)],
            rhs,
        }
    }

    fn negated(&self, rhs: f64) -> Self {
        Row {
            entries: self.entries.iter().map(|(i, c)| (*i, -c)).collect(),
            rhs,
        }
    }
}

/// Rows of the problem, split by cone
#[derive(Default)]
struct ConeRows {
    zero: Vec<Row>,
    nonnegative: Vec<Row>,
}

impl ConeRows {
    fn from_problem(problem: &Problem) -> Self {
        let mut rows = ConeRows::default();
        for cons in problem.constraints().values() {
            let entries: Vec<(usize, f64)> = cons
                .terms()
                .iter()
                .filter_map(|t| problem.variable_index(&t.variable).map(|i| (i, t.coefficient)))
                .collect();
            match cons {
                Constraint::Equality { equals, .. } => rows.zero.push(Row {
                    entries,
                    rhs: *equals,
                }),
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    let row = Row { entries, rhs: 0. };
                    if upper_bound.is_finite() {
                        rows.nonnegative.push(Row {
                            entries: row.entries.clone(),
                            rhs: *upper_bound,
                        });
                    }
                    if lower_bound.is_finite() {
                        rows.nonnegative.push(row.negated(-lower_bound));
                    }
                }
            }
        }
        for var in problem.variables().values() {
            if var.is_fixed() {
                rows.zero.push(Row::single(var.index(), 1., var.lower_bound));
                continue;
            }
            if var.upper_bound.is_finite() {
                rows.nonnegative
                    .push(Row::single(var.index(), 1., var.upper_bound));
            }
            if var.lower_bound.is_finite() {
                rows.nonnegative
                    .push(Row::single(var.index(), -1., -var.lower_bound));
            }
        }
        rows
    }

    fn len(&self) -> usize {
        self.zero.len() + self.nonnegative.len()
    }

    /// Assemble `A` and `b`, zero cone rows first
    fn assemble(&self, num_variables: usize) -> (ClarabelCsc<f64>, Vec<f64>) {
        let mut coo = CooMatrix::new(self.len(), num_variables);
        let mut b = Vec::with_capacity(self.len());
        for (row_index, row) in self.zero.iter().chain(self.nonnegative.iter()).enumerate() {
            for (col, coef) in &row.entries {
                coo.push(row_index, *col, *coef);
            }
            b.push(row.rhs);
        }
        let (col_offsets, row_indices, values) = CscMatrix::from(&coo).disassemble();
        (
            ClarabelCsc::new(self.len(), num_variables, col_offsets, row_indices, values),
            b,
        )
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::new();
        if !self.zero.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(self.zero.len()));
        }
        if !self.nonnegative.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(self.nonnegative.len()));
        }
        cones
    }
}

fn convert_status(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::MaxIterations
        | SolverStatus::MaxTime
        | SolverStatus::InsufficientProgress => OptimizationStatus::SolverHalted,
        SolverStatus::Unsolved => OptimizationStatus::Unoptimized,
        _ => OptimizationStatus::NumericalError,
    }
}

impl Solver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let n = problem.num_variables();
        if n == 0 {
            return Err(SolverError::EmptyProblem);
        }
        let sign = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };
        let mut q = vec![0.; n];
        for term in problem.objective().terms() {
            if let Some(i) = problem.variable_index(&term.variable) {
                q[i] += sign * term.coefficient;
            }
        }
        let p = ClarabelCsc::<f64>::zeros((n, n));
        let rows = ConeRows::from_problem(problem);
        let (a, b) = rows.assemble(n);
        let cones = rows.cones();
        trace!(
            "Clarabel problem with {} variables, {} equality rows and {} inequality rows",
            n,
            rows.zero.len(),
            rows.nonnegative.len()
        );

        let settings = DefaultSettings::<f64> {
            verbose: self.verbose,
            max_iter: self.max_iter,
            ..DefaultSettings::default()
        };
        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = convert_status(solver.solution.status);
        if !status.is_solved() {
            return Ok(ProblemSolution::unsolved(status));
        }
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(solver.solution.x.iter().copied())
            .collect();
        let objective_value = problem
            .objective()
            .evaluate(|id| variable_values.get(id).copied().unwrap_or(0.));
        Ok(ProblemSolution {
            status,
            objective_value: Some(objective_value),
            variable_values: Some(variable_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::solvers::tests::small_lp;

    #[test]
    fn solve_small_lp() {
        let solution = ClarabelSolver::default().solve(&small_lp()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 1.6).abs() < 1e-5);
        assert!((values["y"] - 1.2).abs() < 1e-5);
    }

    #[test]
    fn fixed_variables() {
        // maximize x + y with y fixed to 2 and x + y = z, z <= 5
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem.add_new_variable("y", None, 2., 2.).unwrap();
        problem.add_new_variable("z", None, 0., 5.).unwrap();
        problem
            .add_new_equality_constraint_by_id("sum", &["x", "y", "z"], &[1., 1., -1.], 0.)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        problem.add_new_linear_objective_term_by_id("y", 1.).unwrap();
        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 5.).abs() < 1e-5);
        assert!((solution.variable_values.unwrap()["y"] - 2.).abs() < 1e-5);
    }

    #[test]
    fn infeasible() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem
            .add_new_inequality_constraint_by_id("too_big", &["x"], &[1.], 20., f64::INFINITY)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.objective_value.is_none());
    }

    #[test]
    fn empty_problem() {
        let problem = Problem::new_maximization();
        assert!(matches!(
            ClarabelSolver::default().solve(&problem),
            Err(SolverError::EmptyProblem)
        ));
    }
}
