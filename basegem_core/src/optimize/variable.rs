//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

/// A continuous variable of an optimization problem
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Variable {
    /// Used to identify the variable (must be unique within a problem)
    pub id: String,
    /// Optional human-readable name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Lowest value the variable can take
    #[builder(default = "0.")]
    pub lower_bound: f64,
    /// Highest value the variable can take
    #[builder(default = "f64::INFINITY")]
    pub upper_bound: f64,
    /// Position of the variable in the problem, set when the variable is added
    #[builder(setter(skip), default = "0")]
    pub(crate) index: usize,
}

impl Variable {
    /// Position of the variable within the problem it was added to
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the lower and upper bound are equal
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <= {} <= {}", self.lower_bound, name, self.upper_bound),
            None => write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let x = VariableBuilder::default().id("x").build().unwrap();
        assert_eq!(x.id, "x");
        assert!(x.name.is_none());
        assert!((x.lower_bound - 0.).abs() < 1e-25);
        assert!(x.upper_bound.is_infinite());
        assert!(!x.is_fixed());
    }

    #[test]
    fn display() {
        let x = VariableBuilder::default()
            .id("x")
            .name(Some("flux".to_string()))
            .lower_bound(-1.)
            .upper_bound(1.)
            .build()
            .unwrap();
        assert_eq!(format!("{}", x), "-1 <= flux <= 1");
    }
}
