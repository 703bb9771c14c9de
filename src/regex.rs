/* Precedence climbing parser over the token list produced by the tokenizer.
 *
 * expression := concat ( '|' concat )*
 * concat     := star ( star )*
 * star       := atom ( '*' )*
 * atom       := SYMBOL
 *
 * Every repetition folds to the left, so a|b|c is Union(Union(a, b), c). */

use crate::token::{tokenize, Token, TokenKind};
use color_eyre::eyre::{Report, Result};
use std::fmt;
use std::mem;

#[derive(Debug, PartialEq, Eq)]
pub enum RegEx {
    Symbol(char),
    Union(Box<RegEx>, Box<RegEx>),
    Concat(Box<RegEx>, Box<RegEx>),
    Star(Box<RegEx>),
}

impl RegEx {
    pub fn union(lhs: RegEx, rhs: RegEx) -> RegEx {
        RegEx::Union(Box::new(lhs), Box::new(rhs))
    }

    pub fn concat(lhs: RegEx, rhs: RegEx) -> RegEx {
        RegEx::Concat(Box::new(lhs), Box::new(rhs))
    }

    pub fn star(operand: RegEx) -> RegEx {
        RegEx::Star(Box::new(operand))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegEx::Symbol(_) => "symbol",
            RegEx::Union(..) => "union",
            RegEx::Concat(..) => "concat",
            RegEx::Star(_) => "star",
        }
    }

    // Moves every non leaf child onto `pending`, leaving a leaf in its place
    fn detach_children(&mut self, pending: &mut Vec<Box<RegEx>>) {
        let mut detach = |child: &mut Box<RegEx>| {
            if !matches!(**child, RegEx::Symbol(_)) {
                pending.push(mem::replace(child, Box::new(RegEx::Symbol('\0'))));
            }
        };
        match self {
            RegEx::Symbol(_) => {}
            RegEx::Union(lhs, rhs) | RegEx::Concat(lhs, rhs) => {
                detach(lhs);
                detach(rhs);
            }
            RegEx::Star(operand) => detach(operand),
        }
    }
}

// Left folded trees are as deep as the pattern is long, so neither dropping nor printing a tree
// may recurse into its children.
impl Drop for RegEx {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

enum Piece<'a> {
    Node(&'a RegEx),
    Text(&'static str),
}

impl fmt::Display for RegEx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![Piece::Node(self)];

        while let Some(piece) = pending.pop() {
            let node = match piece {
                Piece::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Piece::Node(node) => node,
            };
            match node {
                RegEx::Symbol(ch) => write!(f, "{}", ch)?,
                RegEx::Union(lhs, rhs) => {
                    f.write_str("(")?;
                    pending.extend([
                        Piece::Text(")"),
                        Piece::Node(rhs),
                        Piece::Text("|"),
                        Piece::Node(lhs),
                    ]);
                }
                RegEx::Concat(lhs, rhs) => {
                    f.write_str("(")?;
                    pending.extend([Piece::Text(")"), Piece::Node(rhs), Piece::Node(lhs)]);
                }
                RegEx::Star(operand) => {
                    f.write_str("(")?;
                    pending.extend([Piece::Text(")*"), Piece::Node(operand)]);
                }
            }
        }
        Ok(())
    }
}

/// Syntax errors found while parsing the token list
#[derive(Debug, PartialEq, Eq)]
pub enum RegExError {
    /// A token showed up where the grammar does not allow it
    UnexpectedToken(Token, usize),
    /// An operand was required but the input ended
    MissingOperand,
}

impl fmt::Display for RegExError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegExError::UnexpectedToken(token, pos) => {
                write!(f, "Error: Unexpected {} at token {}", token, pos)
            }
            RegExError::MissingOperand => {
                write!(f, "Error: Expected a symbol but reached the end of the regex")
            }
        }
    }
}

impl std::error::Error for RegExError {}

fn peek(tokens: &[Token], pos: usize) -> Token {
    // Running off the end is treated the same as an explicit end of input
    tokens.get(pos).copied().unwrap_or_else(Token::end_of_input)
}

fn parse_atom(tokens: &[Token], start: usize) -> Result<(RegEx, usize)> {
    let token = peek(tokens, start);
    match token.get_kind() {
        TokenKind::Symbol => Ok((RegEx::Symbol(token.get_value()), start + 1)),
        TokenKind::EndOfInput => Err(Report::new(RegExError::MissingOperand)),
        _ => Err(Report::new(RegExError::UnexpectedToken(token, start))),
    }
}

fn parse_star(tokens: &[Token], start: usize) -> Result<(RegEx, usize)> {
    let (mut result, mut new_start) = parse_atom(tokens, start)?;

    while peek(tokens, new_start).get_kind() == TokenKind::Star {
        result = RegEx::star(result);
        new_start += 1;
    }
    Ok((result, new_start))
}

fn parse_concat(tokens: &[Token], start: usize) -> Result<(RegEx, usize)> {
    let (mut result, mut new_start) = parse_star(tokens, start)?;

    loop {
        // Symbols are only separated by a marker when they are directly adjacent, a starred
        // operand followed by a symbol is still a concatenation.
        let operand_start = match peek(tokens, new_start).get_kind() {
            TokenKind::Concat => new_start + 1,
            TokenKind::Symbol => new_start,
            _ => break,
        };
        let (rhs, tmp_start) = parse_star(tokens, operand_start)?;
        result = RegEx::concat(result, rhs);
        new_start = tmp_start;
    }
    Ok((result, new_start))
}

fn parse_expression(tokens: &[Token], start: usize) -> Result<(RegEx, usize)> {
    let (mut result, mut new_start) = parse_concat(tokens, start)?;

    while peek(tokens, new_start).get_kind() == TokenKind::Union {
        let (rhs, tmp_start) = parse_concat(tokens, new_start + 1)?;
        result = RegEx::union(result, rhs);
        new_start = tmp_start;
    }
    Ok((result, new_start))
}

/// Parse a token list into a syntax tree. The whole list has to be consumed up to the end of
/// input token.
pub fn parse_regex(tokens: &[Token]) -> Result<RegEx> {
    let (syntax_tree, end) = parse_expression(tokens, 0)?;

    let token = peek(tokens, end);
    if token.get_kind() != TokenKind::EndOfInput {
        let err = Report::new(RegExError::UnexpectedToken(token, end));
        return Err(err);
    }
    Ok(syntax_tree)
}

/// Tokenize and parse a regular expression into its syntax tree
pub fn build_syntax_tree(regex: &str) -> Result<RegEx> {
    let tokens = tokenize(regex)?;
    parse_regex(&tokens)
}
