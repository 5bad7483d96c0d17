//! Tokens produced by the GPR lexer

#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum Token {
    /// A gene id
    Identifier(String),
    And,
    Or,
    Not,
    LeftParen,
    RightParen,
    /// Always the last token of a lexed rule
    Eof,
}
