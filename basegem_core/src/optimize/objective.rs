//! Provides struct for representing an optimization problem's objective

/// Represents the linear Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    /// Add a new term to the objective
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    /// Evaluate the objective for a set of variable values
    pub fn evaluate<F: Fn(&str) -> f64>(&self, value_of: F) -> f64 {
        self.terms
            .iter()
            .map(|t| t.coefficient * value_of(&t.variable))
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveTerm {
    /// Id of the variable in the term
    pub variable: String,
    /// Coefficient for the term
    pub coefficient: f64,
}

impl ObjectiveTerm {
    pub fn new(variable: &str, coefficient: f64) -> Self {
        ObjectiveTerm {
            variable: variable.to_string(),
            coefficient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_objective() {
        let mut objective = Objective::new(ObjectiveSense::Maximize);
        objective.add_term(ObjectiveTerm::new("x", 1.));
        objective.add_term(ObjectiveTerm::new("y", -1.));
        objective.add_term(ObjectiveTerm::new("z", 2.));
        let value = objective.evaluate(|id| match id {
            "x" => 3.,
            "y" => 1.,
            _ => 0.5,
        });
        assert!((value - 3.).abs() < 1e-12);
        assert_eq!(objective.terms().len(), 3);
        assert_eq!(objective.sense(), ObjectiveSense::Maximize);
    }
}
