//! Lex a GPR string into a series of tokens for later parsing

use crate::io::gpr_parse::token::Token;
use thiserror::Error;

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
        }
    }

    /// Convert the source string into a vector of tokens, terminated by [`Token::Eof`]
    pub fn lex(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::Eof);
        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            // Identifiers and Operators
            c if Lexer::is_identifier_start(c) => self.read_identifier(),
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            _ => return Err(LexerError::InvalidToken(c, self.start)),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_identifier(&mut self) {
        while Lexer::is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match text.as_str() {
            "and" | "And" | "AND" => self.add_token(Token::And),
            "or" | "Or" | "OR" => self.add_token(Token::Or),
            "not" | "Not" | "NOT" => self.add_token(Token::Not),
            gene => self.add_token(Token::Identifier(gene.to_string())),
        }
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    /// Gene ids such as `AT1G01010.1` or `Rv0001-A` contain more than alphanumerics
    fn is_identifier_char(c: char) -> bool {
        Lexer::is_identifier_start(c) || matches!(c, '.' | '-' | ':')
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum LexerError {
    #[error("Invalid character {0:?} at position {1}")]
    InvalidToken(char, usize),
}
