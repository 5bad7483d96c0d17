//! Mapping of target organism proteins onto reference model genes
//!
//! Diamond aligns the target proteome against the reference proteome, and each reference
//! protein is tied to a TAIR locus (the gene ids of the reference model) through its FASTA
//! description.
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::io::diamond::{parse_diamond_output, AlignmentHit, DiamondError};
use crate::io::fasta::{read_proteome_tair_map, FastaError};

/// A diamond alignment hit, annotated with the reference gene of the subject protein
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneMappingRecord {
    /// Target organism protein id
    pub qseqid: String,
    /// Reference proteome protein id
    pub sseqid: String,
    /// Reference model gene id of the subject protein, if it has one
    pub tair_id: Option<String>,
    pub pident: f64,
    pub evalue: f64,
    pub bitscore: f64,
}

/// Join alignment hits with the reference proteome, subject ids missing from the
/// proteome map to a `None` gene id
pub fn build_gene_mapping(
    hits: &[AlignmentHit],
    proteome_map: &IndexMap<String, Option<String>>,
) -> Vec<GeneMappingRecord> {
    let mapping: Vec<GeneMappingRecord> = hits
        .iter()
        .map(|hit| GeneMappingRecord {
            qseqid: hit.qseqid.clone(),
            sseqid: hit.sseqid.clone(),
            tair_id: proteome_map.get(&hit.sseqid).cloned().flatten(),
            pident: hit.pident,
            evalue: hit.evalue,
            bitscore: hit.bitscore,
        })
        .collect();
    let unmapped = mapping.iter().filter(|r| r.tair_id.is_none()).count();
    if unmapped > 0 {
        warn!(
            "{} of {} alignment hits have no reference gene id",
            unmapped,
            mapping.len()
        );
    }
    mapping
}

/// Read the reference proteome and diamond output, and build the gene mapping
pub fn map_proteome<P: AsRef<Path>, Q: AsRef<Path>>(
    reference_proteome: P,
    diamond_output: Q,
) -> Result<Vec<GeneMappingRecord>, MappingError> {
    let proteome_map = read_proteome_tair_map(reference_proteome)?;
    let hits = parse_diamond_output(diamond_output)?;
    let mapping = build_gene_mapping(&hits, &proteome_map);
    debug!("Built gene mapping with {} records", mapping.len());
    Ok(mapping)
}

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("Unable to read reference proteome")]
    Fasta(#[from] FastaError),
    #[error("Unable to read diamond output")]
    Diamond(#[from] DiamondError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn hit(qseqid: &str, sseqid: &str) -> AlignmentHit {
        AlignmentHit {
            qseqid: qseqid.to_string(),
            sseqid: sseqid.to_string(),
            pident: 80.,
            length: 100,
            mismatch: 20,
            gapopen: 0,
            qstart: 1,
            qend: 100,
            sstart: 1,
            send: 100,
            evalue: 1e-30,
            bitscore: 200.,
        }
    }

    #[test]
    fn join_hits() {
        let mut proteome = IndexMap::new();
        proteome.insert("NP_1".to_string(), Some("AT1G01010".to_string()));
        proteome.insert("NP_2".to_string(), None);
        let hits = vec![hit("XP_1", "NP_1"), hit("XP_2", "NP_2"), hit("XP_3", "NP_3")];
        let mapping = build_gene_mapping(&hits, &proteome);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[0].tair_id.as_deref(), Some("AT1G01010"));
        assert_eq!(mapping[0].qseqid, "XP_1");
        assert!(mapping[1].tair_id.is_none());
        assert!(mapping[2].tair_id.is_none());
    }

    #[test]
    fn map_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let proteome_path = dir.path().join("reference.faa");
        let mut proteome = std::fs::File::create(&proteome_path).unwrap();
        writeln!(proteome, ">NP_1 [db_xref=GeneID:1,TAIR:AT1G01010]\nMKT").unwrap();
        writeln!(proteome, ">NP_2 [db_xref=GeneID:2,TAIR:AT1G01020]\nMKV").unwrap();
        let diamond_path = dir.path().join("hits.tsv");
        std::fs::write(
            &diamond_path,
            "XP_1\tNP_2\t90.0\t3\t0\t0\t1\t3\t1\t3\t1e-5\t10.0\n",
        )
        .unwrap();
        let mapping = map_proteome(&proteome_path, &diamond_path).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[0].tair_id.as_deref(), Some("AT1G01020"));
    }
}
