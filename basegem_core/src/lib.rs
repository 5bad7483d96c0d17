//! Core rust implementation of basegem, a crate for building reduced genome scale metabolic
//! models of non-model organisms from a well curated reference model.
//!
//! The reduction works by mapping the target organism's proteome onto the reference model's
//! genes, and then pruning the set of unmapped reference genes so that removing them can not
//! break the solvability of the model (see [`reconstruction::pruning`]).

pub mod configuration;
pub mod flux_analysis;
pub mod io;
pub mod metabolic_model;
pub mod optimize;
pub mod reconstruction;
mod utils;
