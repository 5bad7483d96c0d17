use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::{Gpr, GprOperatorType};

use indexmap::IndexMap;
use thiserror::Error;
/*
GPR Grammar, `and` binds tighter than `or`:
disjunction -> conjunction ( "OR" conjunction )* ;
conjunction -> unary ( "AND" unary )* ;
unary -> "NOT" unary | primary ;
primary -> GENE | "(" disjunction ")" ;

e.g. Gene1 AND Gene2 OR Gene3 AND NOT Gene4 == (Gene1 AND Gene2) OR (Gene3 AND (NOT Gene4))
 */

static EOF: Token = Token::Eof;

/// Recursive descent parser turning GPR tokens into a [`Gpr`] tree
pub struct GprParser<'t, 'gm> {
    tokens: &'t [Token],
    position: usize,
    /// Genes seen in the rule are registered here
    pub(crate) gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'t, 'gm> GprParser<'t, 'gm> {
    /// The token slice must end with [`Token::Eof`]
    pub fn new(tokens: &'t [Token], gene_map: &'gm mut IndexMap<String, Gene>) -> Self {
        GprParser {
            tokens,
            position: 0,
            gene_map,
        }
    }

    /// Parse the whole token slice into a GPR tree
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.disjunction()?;
        if !self.at_end() {
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn disjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.conjunction()?;
        while self.eat(&Token::Or) {
            let right = self.conjunction()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::Or, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.unary()?;
        while self.eat(&Token::And) {
            let right = self.unary()?;
            expr = Gpr::new_binary_operation(expr, GprOperatorType::And, right)
                .map_err(|_| ParseError::InvalidBinaryOperator)?;
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Gpr, ParseError> {
        if self.eat(&Token::Not) {
            let operand = self.unary()?;
            return Gpr::new_unary_operation(GprOperatorType::Not, operand)
                .map_err(|_| ParseError::InvalidUnaryOperator);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        match self.current() {
            Token::Identifier(id) => {
                let id = id.clone();
                self.position += 1;
                self.register_gene(&id);
                Ok(Gpr::new_gene_node(&id))
            }
            Token::LeftParen => {
                self.position += 1;
                let expr = self.disjunction()?;
                if !self.eat(&Token::RightParen) {
                    return Err(ParseError::MissingToken(
                        "Expect ')' after expression.".to_string(),
                    ));
                }
                Ok(expr)
            }
            _ => Err(ParseError::ExpectedExpression),
        }
    }

    /// Advance past the current token if it is `expected`
    fn eat(&mut self, expected: &Token) -> bool {
        if !self.at_end() && self.current() == expected {
            self.position += 1;
            return true;
        }
        false
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&EOF)
    }

    fn at_end(&self) -> bool {
        *self.current() == Token::Eof
    }

    /// Add an active gene to the gene map if it is not there yet
    fn register_gene(&mut self, gene_id: &str) {
        if !self.gene_map.contains_key(gene_id) {
            self.gene_map
                .insert(gene_id.to_string(), Gene::new_active(gene_id));
        }
    }
}

/// Ways parsing a token sequence can fail
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseError {
    #[error("Invalid binary operator encountered, expected only `and` and `or`")]
    InvalidBinaryOperator,
    #[error("Invalid unary operator encountered, expected only `not`")]
    InvalidUnaryOperator,
    /// e.g. an unclosed parenthesis
    #[error("Missing expected token: {0}")]
    MissingToken(String),
    #[error("No expression found, check that the GPR string is not empty")]
    ExpectedExpression,
    #[error("Parsing terminated early, check for a `not` between two gene identifiers/grouped expressions")]
    EarlyTermination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gpr_parse::lexer::Lexer;
    use crate::metabolic_model::model::GprOperation;

    fn parse(rule: &str) -> Result<Gpr, ParseError> {
        let mut lexer = Lexer::new(rule);
        let tokens: Vec<Token> = lexer.lex().unwrap();
        let mut gene_map = IndexMap::new();
        GprParser::new(&tokens, &mut gene_map).parse()
    }

    fn assert_gene(gpr: &Gpr, expected: &str) {
        match gpr {
            Gpr::GeneNode(gene) => assert_eq!(gene, expected),
            Gpr::Operation(_) => panic!("Should have been a gene"),
        }
    }

    #[test]
    fn single_gene_parse() {
        let gpr_res = parse("Rv1304").unwrap();
        assert_gene(&gpr_res, "Rv1304");
    }

    #[test]
    fn and_parse() {
        match parse("Rv1304 and Rv0023").unwrap() {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_gene(&left, "Rv1304");
                assert_gene(&right, "Rv0023");
            }
            _ => panic!("Should have been an AND operation"),
        }
    }

    #[test]
    fn or_parse() {
        match parse("Rv1304 or Rv0023").unwrap() {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                assert_gene(&left, "Rv1304");
                assert_gene(&right, "Rv0023");
            }
            _ => panic!("Should have been an OR operation"),
        }
    }

    #[test]
    fn not_parse() {
        match parse("not Rv0023").unwrap() {
            Gpr::Operation(GprOperation::Not { val }) => assert_gene(&val, "Rv0023"),
            _ => panic!("Incorrect Operation Parsed"),
        }
    }

    #[test]
    fn grouping_parse() {
        match parse("(Rv3141 or Rv0023) and Rv0018").unwrap() {
            Gpr::Operation(GprOperation::And { left, right }) => {
                match *left {
                    Gpr::Operation(GprOperation::Or { left, right }) => {
                        assert_gene(&left, "Rv3141");
                        assert_gene(&right, "Rv0023");
                    }
                    _ => panic!("Should have parsed an OR operation"),
                }
                assert_gene(&right, "Rv0018");
            }
            _ => panic!("Incorrect Parse (should have been an AND operation)"),
        }
    }

    #[test]
    fn repeated_binary_parse() {
        // Binary operators are left associative
        match parse("Rv0001 and Rv0002 and Rv0003").unwrap() {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_gene(&right, "Rv0003");
                match *left {
                    Gpr::Operation(GprOperation::And { left, right }) => {
                        assert_gene(&left, "Rv0001");
                        assert_gene(&right, "Rv0002");
                    }
                    _ => panic!("Incorrect parse"),
                }
            }
            _ => panic!("Incorrect parse"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        match parse("Rv0001 or Rv0002 and Rv0003").unwrap() {
            Gpr::Operation(GprOperation::Or { left, right }) => {
                assert_gene(&left, "Rv0001");
                match *right {
                    Gpr::Operation(GprOperation::And { left, right }) => {
                        assert_gene(&left, "Rv0002");
                        assert_gene(&right, "Rv0003");
                    }
                    _ => panic!("Should have parsed an AND operation"),
                }
            }
            _ => panic!("Should have been an OR operation"),
        }
    }

    #[test]
    fn registers_genes() {
        let mut lexer = Lexer::new("b0001 or (b0002 and b0001)");
        let mut gene_map = IndexMap::new();
        let tokens = lexer.lex().unwrap();
        GprParser::new(&tokens, &mut gene_map).parse().unwrap();
        let ids: Vec<&String> = gene_map.keys().collect();
        assert_eq!(ids, vec!["b0001", "b0002"]);
    }

    #[test]
    fn invalid_parse() {
        assert_eq!(
            parse("Rv0001 not Rv0023"),
            Err(ParseError::EarlyTermination)
        );
        assert!(matches!(
            parse("(Rv0001 or Rv0023"),
            Err(ParseError::MissingToken(_))
        ));
        assert_eq!(parse(""), Err(ParseError::ExpectedExpression));
    }
}
