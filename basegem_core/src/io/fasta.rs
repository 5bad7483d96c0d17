//! Reading the reference proteome, and extracting the TAIR locus of each protein
//!
//! NCBI protein FASTA headers carry their cross references in bracketed fields, e.g.
//! `>NP_171609.1 [db_xref=GeneID:839580,TAIR:AT1G01010] [protein=NAC domain containing protein 1]`
use std::fs::File;
use std::path::Path;

use bio::io::fasta;
use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

/// Find the TAIR id in a FASTA record description
///
/// Looks through every `[...]` field of the description for one starting with `db_xref=`,
/// and returns the id of its first `TAIR:` cross reference.
///
/// # Examples
/// ```rust
/// use basegem_core::io::fasta::get_tair_id_from_description;
/// let desc = "[db_xref=GeneID:839580,TAIR:AT1G01010] [protein=NAC001]";
/// assert_eq!(get_tair_id_from_description(desc), Some("AT1G01010".to_string()));
/// assert_eq!(get_tair_id_from_description("[protein=NAC001]"), None);
/// ```
pub fn get_tair_id_from_description(description: &str) -> Option<String> {
    bracketed_fields(description)
        .filter_map(|field| field.strip_prefix("db_xref="))
        .flat_map(|xrefs| xrefs.split(','))
        .find(|xref| xref.starts_with("TAIR:"))
        .and_then(|xref| xref.rsplit(':').next())
        .map(String::from)
}

/// Iterate over the (non-greedy) contents of each `[...]` pair in `text`
fn bracketed_fields(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let start = rest.find('[')?;
        let after = &rest[start + 1..];
        let end = after.find(']')?;
        rest = &after[end + 1..];
        Some(&after[..end])
    })
}

/// Read a proteome FASTA file into a map of record id to TAIR id
///
/// Records without a TAIR cross reference map to `None`.
pub fn read_proteome_tair_map<P: AsRef<Path>>(
    path: P,
) -> Result<IndexMap<String, Option<String>>, FastaError> {
    let file = File::open(path.as_ref())?;
    let reader = fasta::Reader::new(file);
    let mut proteome_map = IndexMap::new();
    for result in reader.records() {
        let record = result.map_err(|e| FastaError::InvalidRecord(e.to_string()))?;
        let tair_id = record.desc().and_then(get_tair_id_from_description);
        proteome_map.insert(record.id().to_string(), tair_id);
    }
    debug!(
        "Read {} proteins from {}, {} with a TAIR id",
        proteome_map.len(),
        path.as_ref().display(),
        proteome_map.values().filter(|t| t.is_some()).count()
    );
    Ok(proteome_map)
}

#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Unable to open proteome file")]
    UnableToRead(#[from] std::io::Error),
    #[error("Invalid FASTA record: {0}")]
    InvalidRecord(String),
}
