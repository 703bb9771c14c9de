use bitvec::prelude::BitVec;
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Label on an automaton edge. Epsilon sorts before every character so it is always listed
/// first among a state's transitions.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "ε"),
            Symbol::Char(ch) => write!(f, "{}", ch),
        }
    }
}

/// Read access to a finite automaton, enough to draw it
pub trait FA {
    /// Render the automaton through Graphviz into `<file_name>.dot` and `<file_name>.jpg`
    fn show_fa(&self, file_name: &str) -> Result<()>;
    fn get_num_states(&self) -> usize;
    fn get_start_state(&self) -> usize;
    fn get_alphabet(&self) -> &HashSet<char>;
    fn get_acceptor_states(&self) -> &BitVec<u8>;
    fn get_state_transitions(&self, state_id: usize) -> Vec<(&Symbol, &usize)>;
}
