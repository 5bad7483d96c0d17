//! Module for reading and writing Models, and the files used to map a proteome onto them
pub mod diamond;
pub mod fasta;
pub mod gpr_parse;
pub mod json;
