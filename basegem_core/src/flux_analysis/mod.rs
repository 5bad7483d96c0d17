//! Flux analysis of metabolic models: flux balance analysis, gene deletions and
//! comparison of flux samples
pub mod comparison;
pub mod deletion;
pub mod fba;
