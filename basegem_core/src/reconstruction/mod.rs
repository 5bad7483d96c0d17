//! Reconstruction of a reduced model for a non-model organism from a reference model
pub mod base_model;
pub mod mapping;
pub mod pruning;
