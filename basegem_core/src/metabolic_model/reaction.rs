//! This module provides a struct for representing reactions
use super::model::Gpr;
use crate::configuration::CONFIGURATION;
use crate::metabolic_model::gene::GeneActivity;
use crate::utils::hashing::hash_as_hex_string;
use derive_builder::Builder;
use indexmap::{IndexMap, IndexSet};

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule to determine if reaction is active
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<String>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<String>,
    /// Reaction Activity
    ///
    /// ### Note
    /// This acts as a pin: an inactive reaction stays inactive regardless of the
    /// activity of the genes in its GPR.
    #[builder(default = "ReactionActivity::Active")]
    pub activity: ReactionActivity,
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hash_as_hex_string(&self.id))
    }

    /// Whether this is a boundary (exchange, demand, or sink) reaction, i.e. it involves
    /// exactly one metabolite
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// Ids of the genes referenced by this reaction's GPR
    pub fn genes(&self) -> IndexSet<String> {
        match &self.gpr {
            Some(gpr) => gpr.genes(),
            None => IndexSet::new(),
        }
    }

    /// `(lower, upper)` bounds of the variable associated with the forward reaction
    pub(crate) fn forward_bounds(&self, activity: ReactionActivity) -> (f64, f64) {
        match activity {
            ReactionActivity::Active => (self.lower_bound.max(0.), self.upper_bound.max(0.)),
            ReactionActivity::Inactive => (0., 0.),
        }
    }

    /// `(lower, upper)` bounds of the variable associated with the reverse reaction
    pub(crate) fn reverse_bounds(&self, activity: ReactionActivity) -> (f64, f64) {
        match activity {
            ReactionActivity::Active => ((-self.upper_bound).max(0.), (-self.lower_bound).max(0.)),
            ReactionActivity::Inactive => (0., 0.),
        }
    }
}

/// Whether a Reaction is active or inactive
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReactionActivity {
    /// The Reaction is active and can carry flux
    Active,
    /// The Reaction is inactive and can't carry flux
    Inactive,
}

impl From<GeneActivity> for ReactionActivity {
    fn from(value: GeneActivity) -> Self {
        match value {
            GeneActivity::Active => ReactionActivity::Active,
            GeneActivity::Inactive => ReactionActivity::Inactive,
        }
    }
}
