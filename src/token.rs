/* Split a regular expression into a flat list of tokens. Adjacent symbols get an explicit
 * concatenation token inserted between them so the parser never has to guess. */

use color_eyre::eyre::{Report, Result};
use std::fmt;

/// Character used as the value of the synthetic concatenation token
pub const CONCAT_MARKER: char = '・';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Symbol,
    Union,
    Concat,
    Star,
    EndOfInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    value: char,
}

impl Token {
    pub fn new(kind: TokenKind, value: char) -> Self {
        Token { kind, value }
    }

    pub fn symbol(value: char) -> Self {
        Token::new(TokenKind::Symbol, value)
    }

    pub fn union() -> Self {
        Token::new(TokenKind::Union, '|')
    }

    pub fn concat() -> Self {
        Token::new(TokenKind::Concat, CONCAT_MARKER)
    }

    pub fn star() -> Self {
        Token::new(TokenKind::Star, '*')
    }

    pub fn end_of_input() -> Self {
        Token::new(TokenKind::EndOfInput, '\0')
    }

    pub fn get_kind(&self) -> TokenKind {
        self.kind
    }

    pub fn get_value(&self) -> char {
        self.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Symbol => write!(f, "symbol '{}'", self.value),
            TokenKind::Union => write!(f, "union '|'"),
            TokenKind::Concat => write!(f, "concatenation"),
            TokenKind::Star => write!(f, "star '*'"),
            TokenKind::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// Lexical errors found while tokenizing a regular expression
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    /// A character outside the supported alphabet, along with its character offset
    InvalidCharacter(char, usize),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidCharacter(ch, pos) => {
                write!(f, "Error: Unexpected input character '{}' at position {}", ch, pos)
            }
        }
    }
}

impl std::error::Error for TokenError {}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn last_token_is_symbol(tokens: &[Token]) -> bool {
    matches!(tokens.last(), Some(token) if token.kind == TokenKind::Symbol)
}

/// Tokenize the regular expression. The returned list always ends with exactly one end of input
/// token. Any character other than an ASCII letter, `|` or `*` aborts tokenization.
pub fn tokenize(regex: &str) -> Result<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::with_capacity(regex.len() * 2 + 1);

    for (pos, ch) in regex.chars().enumerate() {
        let token = if is_symbol_char(ch) {
            if last_token_is_symbol(&tokens) {
                tokens.push(Token::concat());
            }
            Token::symbol(ch)
        } else if ch == '|' {
            Token::union()
        } else if ch == '*' {
            Token::star()
        } else {
            let err = Report::new(TokenError::InvalidCharacter(ch, pos));
            return Err(err);
        };
        tokens.push(token);
    }

    tokens.push(Token::end_of_input());
    Ok(tokens)
}
