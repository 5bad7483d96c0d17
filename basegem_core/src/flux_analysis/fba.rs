//! Flux balance analysis
//!
//! Each reaction is split into a forward and a reverse variable, both non-negative, so the net
//! flux of a reaction is `forward - reverse`. Every metabolite contributes a steady state mass
//! balance constraint.
use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::metabolic_model::model::{GprError, Model};
use crate::metabolic_model::reaction::ReactionActivity;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::solvers::{default_solver, Solver, SolverError};
use crate::optimize::OptimizationStatus;

/// Result of optimizing a model
#[derive(Clone, Debug)]
pub struct FbaSolution {
    pub status: OptimizationStatus,
    /// Value of the objective, `None` if the problem could not be solved
    pub objective_value: Option<f64>,
    /// Net flux through each reaction, keyed by reaction id
    pub fluxes: Option<IndexMap<String, f64>>,
}

impl FbaSolution {
    pub fn is_solved(&self) -> bool {
        self.status.is_solved()
    }
}

impl Model {
    /// Build the FBA problem for the model in its current state
    ///
    /// Reactions which are inactive, either pinned or because of knocked out genes, have
    /// both variables fixed at 0.
    pub fn to_problem(&self) -> Result<Problem, FluxError> {
        let mut problem = Problem::new_maximization();
        let mut mass_balance: IndexMap<&str, Vec<(String, f64)>> = self
            .metabolites
            .keys()
            .map(|id| (id.as_str(), Vec::new()))
            .collect();

        for reaction in self.reactions.values() {
            let activity = self.reaction_activity(reaction)?;
            let forward_id = reaction.get_forward_id();
            let reverse_id = reaction.get_reverse_id();
            let (forward_lb, forward_ub) = reaction.forward_bounds(activity);
            let (reverse_lb, reverse_ub) = reaction.reverse_bounds(activity);
            problem.add_new_variable(&forward_id, Some(reaction.id.as_str()), forward_lb, forward_ub)?;
            problem.add_new_variable(&reverse_id, Some(reaction.id.as_str()), reverse_lb, reverse_ub)?;

            for (met, coef) in &reaction.metabolites {
                let terms = mass_balance.entry(met.as_str()).or_default();
                terms.push((forward_id.clone(), *coef));
                terms.push((reverse_id.clone(), -coef));
            }

            if let Some(coef) = self.objective.get(&reaction.id) {
                problem.add_new_linear_objective_term_by_id(&forward_id, *coef)?;
                problem.add_new_linear_objective_term_by_id(&reverse_id, -coef)?;
            }
            if activity == ReactionActivity::Inactive {
                debug!("Reaction {} is inactive", reaction.id);
            }
        }

        for (met, terms) in mass_balance.iter().filter(|(_, t)| !t.is_empty()) {
            let variables: Vec<&str> = terms.iter().map(|(v, _)| v.as_str()).collect();
            let coefficients: Vec<f64> = terms.iter().map(|(_, c)| *c).collect();
            problem.add_new_equality_constraint_by_id(met, &variables, &coefficients, 0.)?;
        }
        Ok(problem)
    }

    /// Optimize the model with the configured default solver
    pub fn optimize(&self) -> Result<FbaSolution, FluxError> {
        let solver = default_solver()?;
        self.optimize_with(solver.as_ref())
    }

    /// Optimize the model with a specific solver
    pub fn optimize_with<S: Solver + ?Sized>(&self, solver: &S) -> Result<FbaSolution, FluxError> {
        let problem = self.to_problem()?;
        let solution = problem.solve(solver)?;
        let fluxes = solution.variable_values.map(|values| {
            self.reactions
                .values()
                .map(|r| {
                    let forward = values.get(&r.get_forward_id()).copied().unwrap_or(0.);
                    let reverse = values.get(&r.get_reverse_id()).copied().unwrap_or(0.);
                    (r.id.clone(), forward - reverse)
                })
                .collect()
        });
        Ok(FbaSolution {
            status: solution.status,
            objective_value: solution.objective_value,
            fluxes,
        })
    }
}

#[derive(Error, Debug)]
pub enum FluxError {
    #[error("Unable to evaluate reaction activity")]
    Gpr(#[from] GprError),
    #[error("Unable to build optimization problem")]
    Problem(#[from] ProblemError),
    #[error("Unable to solve optimization problem")]
    Solver(#[from] SolverError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::metabolite::Metabolite;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::optimize::solvers::clarabel::ClarabelSolver;

    /// A -> B -> biomass, with uptake of A limited to 10
    fn linear_pathway() -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(Metabolite::new("a", Some("c")));
        model.add_metabolite(Metabolite::new("b", Some("c")));
        let mut add = |id: &str, mets: &[(&str, f64)], lb: f64, ub: f64, gpr: Option<&str>| {
            let mut builder = ReactionBuilder::default();
            builder
                .id(id.to_string())
                .metabolites(mets.iter().map(|(m, c)| (m.to_string(), *c)).collect())
                .lower_bound(lb)
                .upper_bound(ub);
            if let Some(rule) = gpr {
                let gpr = crate::io::gpr_parse::parse_gpr(rule, &mut model.genes).unwrap();
                builder.gpr(Some(gpr));
            }
            model.add_reaction(builder.build().unwrap());
        };
        add("EX_a", &[("a", -1.)], -10., 1000., None);
        add("R1", &[("a", -1.), ("b", 1.)], -1000., 1000., Some("g1 or g2"));
        add("BIOMASS", &[("b", -1.)], 0., 1000., Some("g3"));
        model.objective.insert("BIOMASS".to_string(), 1.);
        model
    }

    #[test]
    fn problem_shape() {
        let problem = linear_pathway().to_problem().unwrap();
        assert_eq!(problem.num_variables(), 6);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.objective().terms().len(), 2);
    }

    #[test]
    fn optimize_linear_pathway() {
        let model = linear_pathway();
        let solution = model.optimize_with(&ClarabelSolver::default()).unwrap();
        assert!(solution.is_solved());
        assert!((solution.objective_value.unwrap() - 10.).abs() < 1e-5);
        let fluxes = solution.fluxes.unwrap();
        assert!((fluxes["EX_a"] + 10.).abs() < 1e-5);
        assert!((fluxes["R1"] - 10.).abs() < 1e-5);
    }

    #[test]
    fn knocked_out_gene_blocks_flux() {
        let mut model = linear_pathway();
        model.knock_out_genes(&["g1"]).unwrap();
        let solution = model.optimize_with(&ClarabelSolver::default()).unwrap();
        assert!((solution.objective_value.unwrap() - 10.).abs() < 1e-5);

        model.knock_out_genes(&["g2"]).unwrap();
        let solution = model.optimize_with(&ClarabelSolver::default()).unwrap();
        assert!(solution.is_solved());
        assert!(solution.objective_value.unwrap().abs() < 1e-5);
    }

    #[test]
    fn forced_flux_through_blocked_pathway_is_infeasible() {
        let mut model = linear_pathway();
        model.reactions.get_mut("BIOMASS").unwrap().lower_bound = 1.;
        model.knock_out_genes(&["g1", "g2"]).unwrap();
        let solution = model.optimize_with(&ClarabelSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.fluxes.is_none());
    }
}
