//! # nfaviz
//!
//! Compiles small regular expressions into non-deterministic finite automata using Thompson's
//! Construction.
//!
//! This library provides functionality to:
//! - Tokenize a regular expression made of letters, `|` and `*`
//! - Parse the tokens into a syntax tree honouring operator precedence
//! - Convert the syntax tree to an NFA using Thompson Construction
//! - Match strings against the NFA by simulating it over sets of states
//! - Export the NFA as a DOT graph, as JSON, or show it in an interactive window

pub mod fa;
pub mod nfa;
pub mod regex;
pub mod token;
pub mod visualizer;

// Re-export commonly used functions for convenience
pub use nfa::{compile, construct_nfa, load_nfa};
pub use regex::{build_syntax_tree, parse_regex};
pub use token::tokenize;
pub use visualizer::visualize;
