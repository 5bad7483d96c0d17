//! Building the reduced base model from the reference model
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::flux_analysis::fba::FluxError;
use crate::io::json::JsonError;
use crate::metabolic_model::model::{Model, ModelError};
use crate::optimize::OptimizationStatus;

/// Remove the genes, and the reactions they are required for, from a copy of the model and
/// save it as JSON
///
/// # Returns
/// The base model
pub fn generate_base_model<S: AsRef<str>, P: AsRef<Path>>(
    model: &Model,
    genes_to_remove: &[S],
    save_path: P,
) -> Result<Model, BaseModelError> {
    let mut base_model = model.clone();
    let removed_reactions = base_model.remove_genes(genes_to_remove, true)?;
    info!(
        "Base model has {} genes and {} reactions, {} reactions were removed",
        base_model.genes.len(),
        base_model.reactions.len(),
        removed_reactions.len()
    );
    base_model.write_json(save_path)?;
    Ok(base_model)
}

/// Add reactions of the reference model missing from the base model, one at a time, until
/// the base model is no longer infeasible
///
/// The metabolites and genes of each added reaction are copied over from the reference when
/// the base model lacks them.
///
/// # Returns
/// The id of the reaction which made the base model solvable, `None` if no reaction did. In
/// that case every missing reaction has been added.
pub fn gapfill_base_model(
    reference: &Model,
    base_model: &mut Model,
) -> Result<Option<String>, BaseModelError> {
    let missing: Vec<&str> = reference
        .reactions
        .keys()
        .filter(|id| !base_model.reactions.contains_key(*id))
        .map(|id| id.as_str())
        .collect();
    debug!("{} reference reactions are missing from the base model", missing.len());
    for reaction_id in missing {
        let reaction = reference.reaction(reaction_id)?;
        for met in reaction.metabolites.keys() {
            if !base_model.metabolites.contains_key(met) {
                if let Some(metabolite) = reference.metabolites.get(met) {
                    base_model.add_metabolite(metabolite.clone());
                }
            }
        }
        for gene_id in reaction.genes() {
            if !base_model.genes.contains_key(&gene_id) {
                if let Some(gene) = reference.genes.get(&gene_id) {
                    base_model.add_gene(gene.clone());
                }
            }
        }
        base_model.add_reaction(reaction.clone());
        let solution = base_model.optimize()?;
        if solution.status != OptimizationStatus::Infeasible {
            info!(
                "Added {} and it solves the model with value {:?}",
                reaction_id, solution.objective_value
            );
            return Ok(Some(reaction_id.to_string()));
        }
    }
    Ok(None)
}

#[derive(Error, Debug)]
pub enum BaseModelError {
    #[error("Unable to edit the model")]
    Model(#[from] ModelError),
    #[error("Unable to save the model")]
    Json(#[from] JsonError),
    #[error("Unable to optimize the model")]
    Flux(#[from] FluxError),
}
