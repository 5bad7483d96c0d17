//! This module provides the Model struct for representing an entire metabolic model
use std::fmt::{Display, Formatter};

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::{Reaction, ReactionActivity, ReactionBuilder};

use indexmap::{IndexMap, IndexSet};
use log::debug;
use thiserror::Error;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Map of reaction ids to Reaction Objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            id: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// Genes referenced by the reaction's GPR which are not yet part of the model are added
    /// as active genes.
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use basegem_core::metabolic_model::model::Model;
    /// use basegem_core::metabolic_model::reaction::{Reaction, ReactionBuilder};
    /// let mut model = Model::new_empty();
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for gene_id in reaction.genes() {
            if !self.genes.contains_key(&gene_id) {
                self.genes
                    .insert(gene_id.clone(), Gene::new_active(&gene_id));
            }
        }
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a gene to the model
    ///
    /// # Parameters
    /// - gene: Gene to add
    ///
    /// # Examples
    /// ```rust
    /// use basegem_core::metabolic_model::gene::GeneBuilder;
    /// use basegem_core::metabolic_model::model::Model;
    /// let mut model=Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Get a reaction by id
    pub fn reaction(&self, reaction_id: &str) -> Result<&Reaction, ModelError> {
        self.reactions
            .get(reaction_id)
            .ok_or_else(|| ModelError::ReactionNotFound(reaction_id.to_string()))
    }

    /// Get a gene by id
    pub fn gene(&self, gene_id: &str) -> Result<&Gene, ModelError> {
        self.genes
            .get(gene_id)
            .ok_or_else(|| ModelError::GeneNotFound(gene_id.to_string()))
    }

    /// Ids of the genes referenced by a reaction's GPR
    pub fn reaction_genes(&self, reaction_id: &str) -> Result<IndexSet<String>, ModelError> {
        Ok(self.reaction(reaction_id)?.genes())
    }

    /// Iterate over the boundary reactions of the model (reactions involving exactly one
    /// metabolite)
    pub fn exchanges(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.is_boundary())
    }

    // region Model Editing

    /// Change the objective of the model, the objective coefficient of `old_reaction_id`
    /// is set to 0 and the objective coefficient of `new_reaction_id` is set to 1
    pub fn change_objective(
        &mut self,
        old_reaction_id: &str,
        new_reaction_id: &str,
    ) -> Result<(), ModelError> {
        self.reaction(old_reaction_id)?;
        self.reaction(new_reaction_id)?;
        self.objective.shift_remove(old_reaction_id);
        self.objective.insert(new_reaction_id.to_string(), 1.);
        Ok(())
    }

    /// Add an exchange reaction for a metabolite already in the model
    ///
    /// # Returns
    /// The id of the new reaction, `EX_{metabolite_id}`
    pub fn add_boundary(&mut self, metabolite_id: &str) -> Result<String, ModelError> {
        if !self.metabolites.contains_key(metabolite_id) {
            return Err(ModelError::MetaboliteNotFound(metabolite_id.to_string()));
        }
        let reaction_id = format!("EX_{}", metabolite_id);
        if self.reactions.contains_key(&reaction_id) {
            return Err(ModelError::ReactionAlreadyExists(reaction_id));
        }
        let (lower_bound, upper_bound) = {
            let config = CONFIGURATION.read().unwrap();
            (config.lower_bound, config.upper_bound)
        };
        let mut metabolites = IndexMap::new();
        metabolites.insert(metabolite_id.to_string(), -1.);
        let reaction = ReactionBuilder::default()
            .id(reaction_id.clone())
            .name(Some(format!("{} exchange", metabolite_id)))
            .metabolites(metabolites)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()?;
        self.add_reaction(reaction);
        Ok(reaction_id)
    }

    /// Knock out a set of genes, setting their activity to inactive
    pub fn knock_out_genes<S: AsRef<str>>(&mut self, gene_ids: &[S]) -> Result<(), ModelError> {
        for gene_id in gene_ids {
            match self.genes.get_mut(gene_id.as_ref()) {
                Some(gene) => gene.knock_out(),
                None => return Err(ModelError::GeneNotFound(gene_id.as_ref().to_string())),
            }
        }
        Ok(())
    }

    /// Remove genes from the model
    ///
    /// When `remove_reactions` is true, every reaction whose GPR can no longer be satisfied
    /// once the genes are gone is removed as well. The removed genes are then pruned out of
    /// the GPRs of the remaining reactions.
    ///
    /// # Returns
    /// The ids of the removed reactions
    pub fn remove_genes<S: AsRef<str>>(
        &mut self,
        gene_ids: &[S],
        remove_reactions: bool,
    ) -> Result<Vec<String>, ModelError> {
        let removed: IndexSet<String> = gene_ids.iter().map(|g| g.as_ref().to_string()).collect();
        for gene_id in &removed {
            self.gene(gene_id)?;
        }
        let mut removed_reactions = Vec::new();
        if remove_reactions {
            for (id, reaction) in &self.reactions {
                if let Some(gpr) = &reaction.gpr {
                    let activity = gpr.eval_with(&|g: &str| {
                        if removed.contains(g) {
                            Ok(GeneActivity::Inactive)
                        } else {
                            Ok(GeneActivity::Active)
                        }
                    })?;
                    if activity == GeneActivity::Inactive {
                        removed_reactions.push(id.clone());
                    }
                }
            }
            for id in &removed_reactions {
                self.reactions.shift_remove(id);
                self.objective.shift_remove(id);
            }
        }
        for reaction in self.reactions.values_mut() {
            reaction.gpr = match reaction.gpr.take() {
                Some(gpr) => gpr.without_genes(&removed),
                None => None,
            };
        }
        for gene_id in &removed {
            self.genes.shift_remove(gene_id);
        }
        debug!(
            "Removed {} genes and {} reactions from the model",
            removed.len(),
            removed_reactions.len()
        );
        Ok(removed_reactions)
    }

    // endregion Model Editing

    /// Determine the activity of a reaction from its pinned activity and its GPR
    pub fn reaction_activity(&self, reaction: &Reaction) -> Result<ReactionActivity, GprError> {
        if reaction.activity == ReactionActivity::Inactive {
            return Ok(ReactionActivity::Inactive);
        }
        match &reaction.gpr {
            Some(gpr) => Ok(self.eval_gpr(gpr)?.into()),
            None => Ok(ReactionActivity::Active),
        }
    }
}

// region GPR Functionality
/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on two genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene Node (see [`Gene`])
    GeneNode(String),
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}

impl Gpr {
    /// Create a new binary operation node
    pub fn new_binary_operation(
        left: Gpr,
        operator: GprOperatorType,
        right: Gpr,
    ) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Or => GprOperation::Or {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::And => GprOperation::And {
                left: Box::new(left),
                right: Box::new(right),
            },
            GprOperatorType::Not => return Err(GprError::InvalidBinaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new unary operation node
    pub fn new_unary_operation(operator: GprOperatorType, operand: Gpr) -> Result<Gpr, GprError> {
        let op = match operator {
            GprOperatorType::Not => GprOperation::Not {
                val: Box::new(operand),
            },
            _ => return Err(GprError::InvalidUnaryOp),
        };
        Ok(Gpr::Operation(op))
    }

    /// Create a new gene node
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    /// Generate a GPR string with gene ids from the GPR AST
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    format!("({} or {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::And { left, right } => {
                    format!("({} and {})", left.to_string_id(), right.to_string_id())
                }
                GprOperation::Not { val } => {
                    format!("(not {})", val)
                }
            },
            Gpr::GeneNode(gene_ref) => gene_ref.to_string(),
        }
    }

    /// Collect the ids of all genes in the GPR, in order of first appearance
    pub fn genes(&self) -> IndexSet<String> {
        let mut genes = IndexSet::new();
        self.collect_genes(&mut genes);
        genes
    }

    fn collect_genes(&self, genes: &mut IndexSet<String>) {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } | GprOperation::And { left, right } => {
                    left.collect_genes(genes);
                    right.collect_genes(genes);
                }
                GprOperation::Not { val } => val.collect_genes(genes),
            },
            Gpr::GeneNode(gene) => {
                genes.insert(gene.clone());
            }
        }
    }

    /// Evaluate the GPR, looking up the activity of each gene with `activity_of`
    pub fn eval_with<F>(&self, activity_of: &F) -> Result<GeneActivity, GprError>
    where
        F: Fn(&str) -> Result<GeneActivity, GprError>,
    {
        match self {
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    let l = left.eval_with(activity_of)?;
                    let r = right.eval_with(activity_of)?;
                    if l == GeneActivity::Active || r == GeneActivity::Active {
                        Ok(GeneActivity::Active)
                    } else {
                        Ok(GeneActivity::Inactive)
                    }
                }
                GprOperation::And { left, right } => {
                    let l = left.eval_with(activity_of)?;
                    let r = right.eval_with(activity_of)?;
                    if l == GeneActivity::Active && r == GeneActivity::Active {
                        Ok(GeneActivity::Active)
                    } else {
                        Ok(GeneActivity::Inactive)
                    }
                }
                GprOperation::Not { val } => match val.eval_with(activity_of)? {
                    GeneActivity::Active => Ok(GeneActivity::Inactive),
                    GeneActivity::Inactive => Ok(GeneActivity::Active),
                },
            },
            Gpr::GeneNode(gene) => activity_of(gene),
        }
    }

    /// Remove a set of genes from the GPR
    ///
    /// A removed gene drops out of the operation it belongs to, so `a or b` without `a`
    /// becomes `b`. Returns `None` if no genes remain.
    pub fn without_genes(self, removed: &IndexSet<String>) -> Option<Gpr> {
        match self {
            Gpr::GeneNode(gene) => {
                if removed.contains(&gene) {
                    None
                } else {
                    Some(Gpr::GeneNode(gene))
                }
            }
            Gpr::Operation(op) => match op {
                GprOperation::Or { left, right } => {
                    match (left.without_genes(removed), right.without_genes(removed)) {
                        (Some(l), Some(r)) => Some(Gpr::Operation(GprOperation::Or {
                            left: Box::new(l),
                            right: Box::new(r),
                        })),
                        (Some(remaining), None) | (None, Some(remaining)) => Some(remaining),
                        (None, None) => None,
                    }
                }
                GprOperation::And { left, right } => {
                    match (left.without_genes(removed), right.without_genes(removed)) {
                        (Some(l), Some(r)) => Some(Gpr::Operation(GprOperation::And {
                            left: Box::new(l),
                            right: Box::new(r),
                        })),
                        (Some(remaining), None) | (None, Some(remaining)) => Some(remaining),
                        (None, None) => None,
                    }
                }
                GprOperation::Not { val } => val.without_genes(removed).map(|v| {
                    Gpr::Operation(GprOperation::Not { val: Box::new(v) })
                }),
            },
        }
    }
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

/// Types of Allowed GPR Operations
pub enum GprOperatorType {
    /// Or, results in active if either left or right are active
    Or,
    /// And, results in active if both left and right are active
    And,
    /// Not, results in active if val is inactive
    Not,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GprError {
    #[error("Invalid Binary Operation")]
    InvalidBinaryOp,
    #[error("Invalid Unary Operation")]
    InvalidUnaryOp,
    #[error("Gene {0} in GPR is not present in the model")]
    GeneNotFound(String),
}

// Model associated functions for working with GPRs
impl Model {
    /// Evaluate whether a GPR evaluates to Active or Inactive given the current gene
    /// activities of the model
    pub fn eval_gpr(&self, gpr: &Gpr) -> Result<GeneActivity, GprError> {
        gpr.eval_with(&|gene_id: &str| match self.genes.get(gene_id) {
            Some(g) => Ok(g.activity),
            None => Err(GprError::GeneNotFound(gene_id.to_string())),
        })
    }
}

// endregion GPR Functionality

/// Errors raised when querying or editing a [`Model`]
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Gene {0} is not present in the model")]
    GeneNotFound(String),
    #[error("Reaction {0} is not present in the model")]
    ReactionNotFound(String),
    #[error("Metabolite {0} is not present in the model")]
    MetaboliteNotFound(String),
    #[error("Reaction {0} already exists in the model")]
    ReactionAlreadyExists(String),
    #[error("Unable to evaluate GPR")]
    Gpr(#[from] GprError),
    #[error("Unable to build reaction")]
    UnableToBuildReaction(#[from] crate::metabolic_model::reaction::ReactionBuilderError),
}


#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::io::gpr_parse::parse_gpr;

    /// Small model: EX_a -> a, R1: a -> b (g1 or g2), R2: a -> b (g3 and g4), EX_b: b ->
    fn setup_model() -> Model {
        let mut model = Model::new_empty();
        model.add_metabolite(Metabolite::new("a", Some("c")));
        model.add_metabolite(Metabolite::new("b", Some("c")));
        let mut gene_map = IndexMap::new();
        let reactions = [
            ("EX_a", vec![("a", -1.)], ""),
            ("R1", vec![("a", -1.), ("b", 1.)], "g1 or g2"),
            ("R2", vec![("a", -1.), ("b", 1.)], "g3 and g4"),
            ("EX_b", vec![("b", -1.)], ""),
        ];
        for (id, mets, rule) in reactions {
            let gpr = if rule.is_empty() {
                None
            } else {
                Some(parse_gpr(rule, &mut gene_map).unwrap())
            };
            let reaction = ReactionBuilder::default()
                .id(id.to_string())
                .metabolites(mets.into_iter().map(|(m, c)| (m.to_string(), c)).collect())
                .gpr(gpr)
                .build()
                .unwrap();
            model.add_reaction(reaction);
        }
        model.objective.insert("EX_b".to_string(), 1.);
        model
    }

    #[test]
    fn add_reaction_registers_genes() {
        let model = setup_model();
        let genes: Vec<&String> = model.genes.keys().collect();
        assert_eq!(genes, vec!["g1", "g2", "g3", "g4"]);
    }

    #[test]
    fn exchanges() {
        let model = setup_model();
        let exchanges: Vec<&str> = model.exchanges().map(|r| r.id.as_str()).collect();
        assert_eq!(exchanges, vec!["EX_a", "EX_b"]);
    }

    #[test]
    fn reaction_genes() {
        let model = setup_model();
        let genes: Vec<String> = model.reaction_genes("R2").unwrap().into_iter().collect();
        assert_eq!(genes, vec!["g3", "g4"]);
        assert!(model.reaction_genes("EX_a").unwrap().is_empty());
        assert!(matches!(
            model.reaction_genes("missing"),
            Err(ModelError::ReactionNotFound(_))
        ));
    }

    #[test]
    fn change_objective() {
        let mut model = setup_model();
        model.change_objective("EX_b", "R1").unwrap();
        assert!(model.objective.get("EX_b").is_none());
        assert!((model.objective["R1"] - 1.).abs() < 1e-25);
        assert!(matches!(
            model.change_objective("R1", "missing"),
            Err(ModelError::ReactionNotFound(_))
        ));
    }

    #[test]
    fn add_boundary() {
        let mut model = setup_model();
        model.reactions.shift_remove("EX_b");
        let id = model.add_boundary("b").unwrap();
        assert_eq!(id, "EX_b");
        let reaction = model.reaction("EX_b").unwrap();
        assert!(reaction.is_boundary());
        assert!((reaction.metabolites["b"] + 1.).abs() < 1e-25);
        assert!(matches!(
            model.add_boundary("b"),
            Err(ModelError::ReactionAlreadyExists(_))
        ));
        assert!(matches!(
            model.add_boundary("missing"),
            Err(ModelError::MetaboliteNotFound(_))
        ));
    }

    #[test]
    fn reaction_activity_follows_knockouts() {
        let mut model = setup_model();
        model.knock_out_genes(&["g1", "g3"]).unwrap();
        let r1 = model.reaction("R1").unwrap();
        let r2 = model.reaction("R2").unwrap();
        assert_eq!(model.reaction_activity(r1).unwrap(), ReactionActivity::Active);
        assert_eq!(model.reaction_activity(r2).unwrap(), ReactionActivity::Inactive);
        assert!(matches!(
            model.knock_out_genes(&["missing"]),
            Err(ModelError::GeneNotFound(_))
        ));
    }

    #[test]
    fn remove_genes_with_reactions() {
        let mut model = setup_model();
        let removed = model.remove_genes(&["g1", "g3"], true).unwrap();
        assert_eq!(removed, vec!["R2".to_string()]);
        assert!(model.reactions.get("R2").is_none());
        assert_eq!(model.reaction("R1").unwrap().gpr.as_ref().unwrap().to_string_id(), "g2");
        let genes: Vec<&String> = model.genes.keys().collect();
        assert_eq!(genes, vec!["g2", "g4"]);
    }

    #[test]
    fn remove_genes_without_reactions() {
        let mut model = setup_model();
        let removed = model.remove_genes(&["g1", "g2"], false).unwrap();
        assert!(removed.is_empty());
        assert_eq!(model.reactions.len(), 4);
        assert!(model.reaction("R1").unwrap().gpr.is_none());
        assert!(matches!(
            model.remove_genes(&["missing"], true),
            Err(ModelError::GeneNotFound(_))
        ));
    }
}
