//! Parsing diamond blastp results
//!
//! Diamond is run outside of basegem (e.g. `diamond blastp --max-target-seqs 1 ...`), with the
//! default tabular output format, which has no header and the 12 standard BLAST columns.
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of diamond's tabular output, columns
/// `qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentHit {
    /// Query (target organism) protein id
    pub qseqid: String,
    /// Subject (reference proteome) protein id
    pub sseqid: String,
    /// Percentage of identical matches
    pub pident: f64,
    pub length: u32,
    pub mismatch: u32,
    pub gapopen: u32,
    pub qstart: u32,
    pub qend: u32,
    pub sstart: u32,
    pub send: u32,
    pub evalue: f64,
    pub bitscore: f64,
}

/// Read the alignment hits from a diamond output file
pub fn parse_diamond_output<P: AsRef<Path>>(path: P) -> Result<Vec<AlignmentHit>, DiamondError> {
    let file = std::fs::File::open(path.as_ref())?;
    let hits = read_hits(file)?;
    debug!(
        "Read {} alignment hits from {}",
        hits.len(),
        path.as_ref().display()
    );
    Ok(hits)
}

/// Read alignment hits from any reader producing diamond's tabular output
pub fn read_hits<R: Read>(rdr: R) -> Result<Vec<AlignmentHit>, DiamondError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_reader(rdr);
    let mut hits = Vec::new();
    for (line, result) in reader.deserialize().enumerate() {
        let hit: AlignmentHit = result.map_err(|e| DiamondError::InvalidRow(line + 1, e))?;
        hits.push(hit);
    }
    Ok(hits)
}

#[derive(Error, Debug)]
pub enum DiamondError {
    #[error("Unable to open diamond output")]
    UnableToRead(#[from] std::io::Error),
    #[error("Invalid alignment on line {0}")]
    InvalidRow(usize, #[source] csv::Error),
}
