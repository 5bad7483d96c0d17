//! Implements a solver interface for microlp, a pure rust simplex solver
use ::microlp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem as LpProblem};
use indexmap::IndexMap;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex solver backed by the microlp crate
#[derive(Clone, Debug, Default)]
pub struct MicroLpSolver {}

impl Solver for MicroLpSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        if problem.num_variables() == 0 {
            return Err(SolverError::EmptyProblem);
        }
        let direction = match problem.objective().sense() {
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
        };
        let mut coefficients = vec![0.; problem.num_variables()];
        for term in problem.objective().terms() {
            if let Some(i) = problem.variable_index(&term.variable) {
                coefficients[i] += term.coefficient;
            }
        }
        let mut lp = LpProblem::new(direction);
        let lp_vars: Vec<_> = problem
            .variables()
            .values()
            .zip(coefficients)
            .map(|(var, coef)| lp.add_var(coef, (var.lower_bound, var.upper_bound)))
            .collect();

        for cons in problem.constraints().values() {
            let expr = || {
                let mut expr = LinearExpr::empty();
                for term in cons.terms() {
                    if let Some(i) = problem.variable_index(&term.variable) {
                        expr.add(lp_vars[i], term.coefficient);
                    }
                }
                expr
            };
            match cons {
                Constraint::Equality { equals, .. } => {
                    lp.add_constraint(expr(), ComparisonOp::Eq, *equals)
                }
                Constraint::Inequality {
                    lower_bound,
                    upper_bound,
                    ..
                } => {
                    if lower_bound.is_finite() {
                        lp.add_constraint(expr(), ComparisonOp::Ge, *lower_bound);
                    }
                    if upper_bound.is_finite() {
                        lp.add_constraint(expr(), ComparisonOp::Le, *upper_bound);
                    }
                }
            }
        }

        let solution = match lp.solve() {
            Ok(solution) => solution,
            Err(::microlp::Error::Infeasible) => {
                return Ok(ProblemSolution::unsolved(OptimizationStatus::Infeasible))
            }
            Err(::microlp::Error::Unbounded) => {
                return Ok(ProblemSolution::unsolved(OptimizationStatus::Unbounded))
            }
            #[allow(unreachable_patterns)]
            Err(err) => return Err(SolverError::SolverFailure(err.to_string())),
        };
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .zip(lp_vars.iter())
            .map(|(id, var)| (id.clone(), solution[*var]))
            .collect();
        Ok(ProblemSolution {
            status: OptimizationStatus::Optimal,
            objective_value: Some(solution.objective()),
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
        let solution = MicroLpSolver::default().solve(&small_lp()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 2.8).abs() < 1e-8);
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 1.6).abs() < 1e-8);
    }

    #[test]
    fn infeasible() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", None, 0., 10.).unwrap();
        problem
            .add_new_inequality_constraint_by_id("too_big", &["x"], &[1.], 20., f64::INFINITY)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        let solution = problem.solve(&MicroLpSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
    }
}
