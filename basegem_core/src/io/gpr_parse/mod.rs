//! Module for parsing Gene Protein Reaction strings into AST values

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::Gpr;
use indexmap::IndexMap;
use thiserror::Error;

mod lexer;
pub mod parser;
mod token;

/// Parse a Gene Protein Reaction string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene protein reaction rule
/// - `gene_map`: map of gene id strings to genes, genes found in the rule which are not yet
///     in the map are added to it as active genes
///
/// # Returns
/// Parse result which is
/// - `Ok`: The root node of the GPR tree
/// - `Err`: Returns the GprParseError describing the issue with the GPR rule which
///     was being parsed.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use basegem_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "AT1G01010 and AT1G01020";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// assert_eq!(gene_map.len(), 2);
/// ```
pub fn parse_gpr(
    input: &str,
    gene_map: &mut IndexMap<String, Gene>,
) -> Result<Gpr, GprParseError> {
    let tokens = lexer::Lexer::new(input).lex()?;
    let gpr = parser::GprParser::new(&tokens, gene_map).parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum GprParseError {
    /// Lexing Error
    #[error("Error occurred during lexing (conversion of GPR string to tokens)")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("Error occurred during parsing (conversion of tokens to GPR tree)")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use crate::io::gpr_parse::{parse_gpr, GprParseError};
    use crate::metabolic_model::gene::{Gene, GeneActivity};
    use crate::metabolic_model::model::{Gpr, GprOperation};
    use indexmap::IndexMap;

    #[test]
    fn test_parse_gpr() {
        let gpr = "AT1G01010 and (AT1G01020 or AT1G01030)";
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        gene_map.insert(
            "AT1G01010".to_string(),
            Gene::new(
                "AT1G01010".to_string(),
                Some("NAC001".to_string()),
                GeneActivity::Inactive,
                None,
                None,
            ),
        );
        let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
        let expected = Gpr::Operation(GprOperation::And {
            left: Box::new(Gpr::new_gene_node("AT1G01010")),
            right: Box::new(Gpr::Operation(GprOperation::Or {
                left: Box::new(Gpr::new_gene_node("AT1G01020")),
                right: Box::new(Gpr::new_gene_node("AT1G01030")),
            })),
        });
        assert_eq!(gpr_tree, expected);
        // Existing genes are left untouched, new genes are added
        assert_eq!(gene_map.len(), 3);
        assert_eq!(gene_map["AT1G01010"].activity, GeneActivity::Inactive);
        assert_eq!(gene_map["AT1G01030"].activity, GeneActivity::Active);
    }

    #[test]
    fn test_parse_errors() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        assert!(matches!(
            parse_gpr("b0001 | b0002", &mut gene_map),
            Err(GprParseError::LexingError(_))
        ));
        assert!(matches!(
            parse_gpr("b0001 or", &mut gene_map),
            Err(GprParseError::ParsingError(_))
        ));
    }
}
