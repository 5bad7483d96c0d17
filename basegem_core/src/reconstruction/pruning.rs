//! Gene pruning pipeline
//!
//! Starting from the reference model genes that have no counterpart in the target organism,
//! the pipeline pulls back every gene whose removal could break the model:
//!
//! 1. genes essential on their own (single gene deletion over every model gene)
//! 2. genes of boundary reactions
//! 3. genes taking part in a lethal pair (double gene deletion over the remaining candidates)
//!
//! The order is fixed, the double deletion is quadratic in the number of candidates, so the
//! cheaper screens run first to shrink its input.
use derive_builder::Builder;
use indexmap::IndexSet;
use log::{debug, info};
use thiserror::Error;

use crate::configuration::{SolverKind, CONFIGURATION};
use crate::flux_analysis::deletion::{
    double_gene_deletion_with, single_gene_deletion_with, DeletionError, GrowthCriterion,
};
use crate::metabolic_model::model::Model;
use crate::optimize::solvers::{solver_for, Solver, SolverError};
use crate::reconstruction::mapping::GeneMappingRecord;

/// Reference gene ids present in the mapping, in order of first appearance
pub fn compute_target_genes(mapping: &[GeneMappingRecord]) -> IndexSet<String> {
    mapping
        .iter()
        .filter_map(|record| record.tair_id.clone())
        .collect()
}

/// Genes of the model which are not targets, in model order
///
/// When `verbose`, the number of target genes, of target genes found in the model, and of
/// genes to remove are logged at info level.
pub fn compute_genes_to_remove(
    model: &Model,
    target_genes: &IndexSet<String>,
    verbose: bool,
) -> IndexSet<String> {
    if verbose {
        info!(
            "{} target species genes were found in the reference proteome",
            target_genes.len()
        );
        let in_model = model
            .genes
            .keys()
            .filter(|g| target_genes.contains(*g))
            .count();
        info!(
            "{} target species genes were found in the reference model containing {} genes",
            in_model,
            model.genes.len()
        );
    }
    let genes_to_remove: IndexSet<String> = model
        .genes
        .keys()
        .filter(|g| !target_genes.contains(*g))
        .cloned()
        .collect();
    if verbose {
        info!(
            "{} genes must be removed from the reference model",
            genes_to_remove.len()
        );
    }
    genes_to_remove
}

/// Remove the genes which are essential on their own from the candidates
pub fn screen_essential(
    model: &Model,
    candidates: &IndexSet<String>,
) -> Result<IndexSet<String>, PruningError> {
    let (criterion, solver) = configured()?;
    screen_essential_with(model, candidates, criterion, solver.as_ref())
}

/// Remove the genes of boundary reactions from the candidates
pub fn screen_exchange(model: &Model, candidates: &IndexSet<String>) -> IndexSet<String> {
    let exchange_genes: IndexSet<String> =
        model.exchanges().flat_map(|r| r.genes()).collect();
    let kept: IndexSet<String> = candidates.difference(&exchange_genes).cloned().collect();
    debug!(
        "Exchange screen pulled back {} genes",
        candidates.len() - kept.len()
    );
    kept
}

/// Remove the genes which take part in a lethal pair from the candidates
///
/// Every candidate paired with itself is tested too, so a candidate which is lethal on its
/// own is also pulled back.
pub fn screen_synthetic_lethal(
    model: &Model,
    candidates: &IndexSet<String>,
) -> Result<IndexSet<String>, PruningError> {
    let (criterion, solver) = configured()?;
    screen_synthetic_lethal_with(model, candidates, criterion, solver.as_ref())
}

/// Run the three screens, in order, over the genes to remove
///
/// The model is not modified.
pub fn prune_genes_to_remove(
    model: &Model,
    genes_to_remove: &IndexSet<String>,
) -> Result<IndexSet<String>, PruningError> {
    let (criterion, solver) = configured()?;
    let candidates = screen_essential_with(model, genes_to_remove, criterion, solver.as_ref())?;
    let candidates = screen_exchange(model, &candidates);
    screen_synthetic_lethal_with(model, &candidates, criterion, solver.as_ref())
}

fn configured() -> Result<(GrowthCriterion, Box<dyn Solver>), PruningError> {
    let (criterion, kind) = {
        let config = CONFIGURATION.read().unwrap();
        (config.growth_criterion, config.solver)
    };
    Ok((criterion, solver_for(kind)?))
}

fn screen_essential_with<L: Solver + ?Sized>(
    model: &Model,
    candidates: &IndexSet<String>,
    criterion: GrowthCriterion,
    solver: &L,
) -> Result<IndexSet<String>, PruningError> {
    let all_genes: Vec<&str> = model.genes.keys().map(|g| g.as_str()).collect();
    let essential: IndexSet<String> = single_gene_deletion_with(model, &all_genes, solver)?
        .into_iter()
        .filter(|r| !r.is_viable(criterion))
        .flat_map(|r| r.ids)
        .collect();
    let kept: IndexSet<String> = candidates.difference(&essential).cloned().collect();
    debug!(
        "Essential screen found {} essential genes, pulled back {}",
        essential.len(),
        candidates.len() - kept.len()
    );
    Ok(kept)
}

fn screen_synthetic_lethal_with<L: Solver + ?Sized>(
    model: &Model,
    candidates: &IndexSet<String>,
    criterion: GrowthCriterion,
    solver: &L,
) -> Result<IndexSet<String>, PruningError> {
    if candidates.is_empty() {
        return Ok(IndexSet::new());
    }
    let genes: Vec<&str> = candidates.iter().map(|g| g.as_str()).collect();
    let lethal: IndexSet<String> = double_gene_deletion_with(model, &genes, &genes, solver)?
        .into_iter()
        .filter(|r| !r.is_viable(criterion))
        .flat_map(|r| r.ids)
        .collect();
    let kept: IndexSet<String> = candidates.difference(&lethal).cloned().collect();
    debug!(
        "Synthetic lethal screen pulled back {} genes",
        candidates.len() - kept.len()
    );
    Ok(kept)
}

/// Configurable run of the whole pipeline, from gene mapping to the genes to remove
///
/// # Examples
/// ```rust
/// use basegem_core::flux_analysis::deletion::GrowthCriterion;
/// use basegem_core::reconstruction::pruning::GenePrunerBuilder;
/// let pruner = GenePrunerBuilder::default()
///     .growth_criterion(GrowthCriterion::Threshold(0.01))
///     .verbose(true)
///     .build()
///     .unwrap();
/// assert!(pruner.synthetic_lethal);
/// ```
#[derive(Builder, Clone, Debug)]
pub struct GenePruner {
    /// How the growth of a deletion is classified
    #[builder(default = "CONFIGURATION.read().unwrap().growth_criterion")]
    pub growth_criterion: GrowthCriterion,
    /// Solver used for the deletions
    #[builder(default = "CONFIGURATION.read().unwrap().solver")]
    pub solver: SolverKind,
    /// Log the gene counts at info level
    #[builder(default = "false")]
    pub verbose: bool,
    /// Run the synthetic lethal screen
    #[builder(default = "true")]
    pub synthetic_lethal: bool,
}

impl Default for GenePruner {
    fn default() -> Self {
        let config = CONFIGURATION.read().unwrap();
        GenePruner {
            growth_criterion: config.growth_criterion,
            solver: config.solver,
            verbose: false,
            synthetic_lethal: true,
        }
    }
}

/// Gene sets produced by each stage of a [`GenePruner`] run
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PruningReport {
    /// Reference genes present in the mapping
    pub target_genes: IndexSet<String>,
    /// Model genes which are not targets
    pub initial_candidates: IndexSet<String>,
    /// Candidates pulled back by the essential screen
    pub essential: IndexSet<String>,
    /// Candidates pulled back by the exchange screen
    pub exchange: IndexSet<String>,
    /// Candidates pulled back by the synthetic lethal screen
    pub synthetic_lethal: IndexSet<String>,
    /// Genes which can safely be removed
    pub genes_to_remove: IndexSet<String>,
}

impl GenePruner {
    pub fn run(
        &self,
        model: &Model,
        mapping: &[GeneMappingRecord],
    ) -> Result<PruningReport, PruningError> {
        let target_genes = compute_target_genes(mapping);
        let initial_candidates = compute_genes_to_remove(model, &target_genes, self.verbose);
        self.prune(model, target_genes, initial_candidates)
    }

    /// Run the screens over an explicit set of candidate genes
    pub fn prune(
        &self,
        model: &Model,
        target_genes: IndexSet<String>,
        initial_candidates: IndexSet<String>,
    ) -> Result<PruningReport, PruningError> {
        let solver = solver_for(self.solver)?;
        let after_essential = screen_essential_with(
            model,
            &initial_candidates,
            self.growth_criterion,
            solver.as_ref(),
        )?;
        let after_exchange = screen_exchange(model, &after_essential);
        let genes_to_remove = if self.synthetic_lethal {
            screen_synthetic_lethal_with(
                model,
                &after_exchange,
                self.growth_criterion,
                solver.as_ref(),
            )?
        } else {
            after_exchange.clone()
        };
        let report = PruningReport {
            essential: initial_candidates
                .difference(&after_essential)
                .cloned()
                .collect(),
            exchange: after_essential.difference(&after_exchange).cloned().collect(),
            synthetic_lethal: after_exchange.difference(&genes_to_remove).cloned().collect(),
            target_genes,
            initial_candidates,
            genes_to_remove,
        };
        if self.verbose {
            info!(
                "{} genes can safely be removed ({} essential, {} exchange, {} synthetic lethal kept)",
                report.genes_to_remove.len(),
                report.essential.len(),
                report.exchange.len(),
                report.synthetic_lethal.len()
            );
        }
        Ok(report)
    }
}

#[derive(Error, Debug)]
pub enum PruningError {
    #[error("Gene deletion failed")]
    Deletion(#[from] DeletionError),
    #[error("Unable to create solver")]
    Solver(#[from] SolverError),
}
