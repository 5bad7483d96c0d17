//! Single and double gene deletion analysis
//!
//! Deletions are evaluated on a private copy of the model, the model passed in is never
//! modified. A deletion which does not change the activity of any reaction has the same
//! problem as the unperturbed model, so its result is taken from the wild type solution
//! instead of being solved again.
use indexmap::IndexSet;
use log::{debug, trace};
use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::flux_analysis::fba::{FbaSolution, FluxError};
use crate::metabolic_model::gene::GeneActivity;
use crate::metabolic_model::model::{GprError, Model};
use crate::metabolic_model::reaction::ReactionActivity;
use crate::optimize::solvers::{default_solver, Solver};
use crate::optimize::OptimizationStatus;

/// How the growth value of a deletion is classified
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum GrowthCriterion {
    /// The deletion is viable when the model solves and the growth is at least this value
    Threshold(f64),
    /// The deletion is viable only when the growth equals this value, whatever the wild type
    /// growth is. Equality is checked relative to the value, within the configured
    /// `sentinel_tolerance`.
    Sentinel(f64),
}

impl Default for GrowthCriterion {
    fn default() -> Self {
        GrowthCriterion::Threshold(1e-6)
    }
}

impl GrowthCriterion {
    /// Classify the outcome of a deletion
    pub fn classify(&self, status: OptimizationStatus, growth: Option<f64>) -> DeletionOutcome {
        let growth = match growth {
            Some(growth) if status.is_solved() => growth,
            _ => return DeletionOutcome::Infeasible,
        };
        let viable = match self {
            GrowthCriterion::Threshold(min) => growth >= *min,
            GrowthCriterion::Sentinel(value) => {
                let tolerance = CONFIGURATION.read().unwrap().sentinel_tolerance;
                (growth - value).abs() <= tolerance * value.abs().max(1.)
            }
        };
        if viable {
            DeletionOutcome::Viable
        } else {
            DeletionOutcome::Lethal
        }
    }
}

/// Classification of a deletion
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The model still grows
    Viable,
    /// The model solves, but does not grow enough
    Lethal,
    /// The model could not be solved
    Infeasible,
}

/// Result of deleting one or two genes, a row of the deletion table
#[derive(Clone, Debug, PartialEq)]
pub struct DeletionResult {
    /// Ids of the deleted genes, a single id for the diagonal of a double deletion
    pub ids: Vec<String>,
    /// Objective value after the deletion, `None` if the model could not be solved
    pub growth: Option<f64>,
    pub status: OptimizationStatus,
}

impl DeletionResult {
    pub fn outcome(&self, criterion: GrowthCriterion) -> DeletionOutcome {
        criterion.classify(self.status, self.growth)
    }

    pub fn is_viable(&self, criterion: GrowthCriterion) -> bool {
        self.outcome(criterion) == DeletionOutcome::Viable
    }
}

/// Knock out each gene in turn, and optimize the model
///
/// # Returns
/// One [`DeletionResult`] per gene, in the order of `gene_ids`
pub fn single_gene_deletion<S: AsRef<str>>(
    model: &Model,
    gene_ids: &[S],
) -> Result<Vec<DeletionResult>, DeletionError> {
    let solver = default_solver().map_err(FluxError::from)?;
    single_gene_deletion_with(model, gene_ids, solver.as_ref())
}

/// [`single_gene_deletion`] with a specific solver
pub fn single_gene_deletion_with<S: AsRef<str>, L: Solver + ?Sized>(
    model: &Model,
    gene_ids: &[S],
    solver: &L,
) -> Result<Vec<DeletionResult>, DeletionError> {
    let mut runner = DeletionRunner::new(model, solver)?;
    let results = gene_ids
        .iter()
        .map(|g| runner.delete(&[g.as_ref()]))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Single gene deletion of {} genes, {} solved",
        results.len(),
        runner.solved
    );
    Ok(results)
}

/// Knock out every unique unordered pair of genes, one from each list, and optimize the model
///
/// Pairs of a gene with itself are single deletions. When the lists overlap each pair is
/// evaluated only once.
pub fn double_gene_deletion<S: AsRef<str>>(
    model: &Model,
    gene_ids1: &[S],
    gene_ids2: &[S],
) -> Result<Vec<DeletionResult>, DeletionError> {
    let solver = default_solver().map_err(FluxError::from)?;
    double_gene_deletion_with(model, gene_ids1, gene_ids2, solver.as_ref())
}

/// [`double_gene_deletion`] with a specific solver
pub fn double_gene_deletion_with<S: AsRef<str>, L: Solver + ?Sized>(
    model: &Model,
    gene_ids1: &[S],
    gene_ids2: &[S],
    solver: &L,
) -> Result<Vec<DeletionResult>, DeletionError> {
    let mut runner = DeletionRunner::new(model, solver)?;
    let mut seen: IndexSet<(String, String)> = IndexSet::new();
    let mut results = Vec::new();
    for g1 in gene_ids1 {
        for g2 in gene_ids2 {
            let (g1, g2) = (g1.as_ref(), g2.as_ref());
            let key = if g1 <= g2 {
                (g1.to_string(), g2.to_string())
            } else {
                (g2.to_string(), g1.to_string())
            };
            if !seen.insert(key) {
                continue;
            }
            let result = if g1 == g2 {
                runner.delete(&[g1])?
            } else {
                runner.delete(&[g1, g2])?
            };
            results.push(result);
        }
    }
    debug!(
        "Double gene deletion of {} pairs, {} solved",
        results.len(),
        runner.solved
    );
    Ok(results)
}

/// Evaluates deletions on a private copy of a model
struct DeletionRunner<'s, L: Solver + ?Sized> {
    model: Model,
    solver: &'s L,
    wild_type: FbaSolution,
    /// Number of deletions which needed a solve
    solved: usize,
}

impl<'s, L: Solver + ?Sized> DeletionRunner<'s, L> {
    fn new(model: &Model, solver: &'s L) -> Result<Self, DeletionError> {
        let model = model.clone();
        let wild_type = model.optimize_with(solver)?;
        trace!("Wild type objective {:?}", wild_type.objective_value);
        Ok(DeletionRunner {
            model,
            solver,
            wild_type,
            solved: 0,
        })
    }

    fn delete(&mut self, gene_ids: &[&str]) -> Result<DeletionResult, DeletionError> {
        let mut previous = Vec::with_capacity(gene_ids.len());
        for gene_id in gene_ids {
            match self.model.genes.get(*gene_id) {
                Some(gene) => previous.push(gene.activity),
                None => return Err(DeletionError::GeneNotFound(gene_id.to_string())),
            }
        }
        let solution = self.solve_knocked_out(gene_ids);
        // Restore the original activities whether or not the solve succeeded
        for (gene_id, activity) in gene_ids.iter().zip(previous) {
            if let Some(gene) = self.model.genes.get_mut(*gene_id) {
                gene.activity = activity;
            }
        }
        let solution = solution?;
        Ok(DeletionResult {
            ids: gene_ids.iter().map(|g| g.to_string()).collect(),
            growth: solution.objective_value,
            status: solution.status,
        })
    }

    fn solve_knocked_out(&mut self, gene_ids: &[&str]) -> Result<FbaSolution, DeletionError> {
        let before = self.inactive_reactions()?;
        for gene_id in gene_ids {
            if let Some(gene) = self.model.genes.get_mut(*gene_id) {
                gene.activity = GeneActivity::Inactive;
            }
        }
        if self.inactive_reactions()? == before {
            return Ok(self.wild_type.clone());
        }
        self.solved += 1;
        Ok(self.model.optimize_with(self.solver)?)
    }

    fn inactive_reactions(&self) -> Result<Vec<usize>, GprError> {
        let mut inactive = Vec::new();
        for (index, reaction) in self.model.reactions.values().enumerate() {
            if self.model.reaction_activity(reaction)? == ReactionActivity::Inactive {
                inactive.push(index);
            }
        }
        Ok(inactive)
    }
}

#[derive(Error, Debug)]
pub enum DeletionError {
    #[error("Gene {0} is not present in the model")]
    GeneNotFound(String),
    #[error("Unable to evaluate reaction activity")]
    Gpr(#[from] GprError),
    #[error("Unable to optimize the model")]
    Flux(#[from] FluxError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::solvers::clarabel::ClarabelSolver;
    use std::path::PathBuf;

    fn toy_model() -> Model {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("toy_model.json");
        Model::read_json(path).unwrap()
    }

    #[test]
    fn classify_threshold() {
        let criterion = GrowthCriterion::default();
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(5.)),
            DeletionOutcome::Viable
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(1e-9)),
            DeletionOutcome::Lethal
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::Infeasible, None),
            DeletionOutcome::Infeasible
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::NumericalError, Some(5.)),
            DeletionOutcome::Infeasible
        );
    }

    #[test]
    fn classify_sentinel() {
        let criterion = GrowthCriterion::Sentinel(10.);
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(10.)),
            DeletionOutcome::Viable
        );
        // Solver noise around the sentinel is still viable
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(10. + 2e-6)),
            DeletionOutcome::Viable
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(10. - 2e-6)),
            DeletionOutcome::Viable
        );
        // Any other growth, even a larger one, is lethal under the sentinel
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(10.001)),
            DeletionOutcome::Lethal
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::Optimal, Some(12.)),
            DeletionOutcome::Lethal
        );
        assert_eq!(
            criterion.classify(OptimizationStatus::Infeasible, None),
            DeletionOutcome::Infeasible
        );
    }

    #[test]
    fn single_deletion() {
        let model = toy_model();
        let genes: Vec<&str> = model.genes.keys().map(|g| g.as_str()).collect();
        let results =
            single_gene_deletion_with(&model, &genes, &ClarabelSolver::default()).unwrap();
        assert_eq!(results.len(), 10);
        let lethal: Vec<&str> = results
            .iter()
            .filter(|r| !r.is_viable(GrowthCriterion::default()))
            .map(|r| r.ids[0].as_str())
            .collect();
        assert_eq!(lethal, vec!["g1", "g4"]);
        let g7 = results.iter().find(|r| r.ids == vec!["g7"]).unwrap();
        assert!((g7.growth.unwrap() - 5.).abs() < 1e-4);
        // The input model is untouched
        assert!(model.genes.values().all(|g| g.is_active()));
    }

    #[test]
    fn double_deletion() {
        let model = toy_model();
        let genes = ["g2", "g3", "g5", "g6", "g7"];
        let results =
            double_gene_deletion_with(&model, &genes, &genes, &ClarabelSolver::default()).unwrap();
        // 5 diagonal entries plus 10 unordered pairs
        assert_eq!(results.len(), 15);
        assert!(results.iter().any(|r| r.ids == vec!["g2"]));
        let lethal: Vec<Vec<String>> = results
            .iter()
            .filter(|r| !r.is_viable(GrowthCriterion::default()))
            .map(|r| r.ids.clone())
            .collect();
        assert_eq!(
            lethal,
            vec![
                vec!["g2".to_string(), "g3".to_string()],
                vec!["g5".to_string(), "g6".to_string()]
            ]
        );
    }

    #[test]
    fn double_deletion_distinct_lists() {
        let model = toy_model();
        // (g3, g2) is the same pair as (g2, g3) and is only evaluated once
        let results = double_gene_deletion(&model, &["g2", "g3"], &["g3", "g7"]).unwrap();
        let ids: Vec<Vec<&str>> = results
            .iter()
            .map(|r| r.ids.iter().map(|g| g.as_str()).collect())
            .collect();
        assert_eq!(ids, vec![vec!["g2", "g3"], vec!["g2", "g7"], vec!["g3"], vec!["g3", "g7"]]);
        assert_eq!(
            results[0].outcome(GrowthCriterion::default()),
            DeletionOutcome::Lethal
        );
        assert!(results[1..]
            .iter()
            .all(|r| r.is_viable(GrowthCriterion::default())));
    }

    #[test]
    fn missing_gene() {
        let model = toy_model();
        let res = single_gene_deletion_with(&model, &["not_a_gene"], &ClarabelSolver::default());
        assert!(matches!(res, Err(DeletionError::GeneNotFound(g)) if g == "not_a_gene"));
    }
}
