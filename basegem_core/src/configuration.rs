//! Process wide defaults used when building models and running analyses
use std::sync::{LazyLock, RwLock};

use crate::flux_analysis::deletion::GrowthCriterion;

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug)]
pub struct Configuration {
    /// Default lower flux bound for new reactions
    pub lower_bound: f64,
    /// Default upper flux bound for new reactions
    pub upper_bound: f64,
    /// Relative tolerance used when comparing growth against a sentinel value
    pub sentinel_tolerance: f64,
    /// Solver used to optimize models
    pub solver: SolverKind,
    /// How growth values from gene deletions are classified
    pub growth_criterion: GrowthCriterion,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            sentinel_tolerance: 1e-06,
            solver: SolverKind::Clarabel,
            growth_criterion: GrowthCriterion::default(),
        }
    }
}

/// Enum used to specify the default solver to use
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverKind {
    /// Use the Clarabel interior point solver
    Clarabel,
    /// Use the microlp simplex solver, requires the minilp feature to be enabled
    MicroLp,
}
