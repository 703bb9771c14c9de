/* Thompson Construction of an NFA from the regex syntax tree, plus simulation of the NFA on
 * an input string and DOT export of its state graph.
 *
 * All states of one compilation live in a single arena owned by the generator and are referred
 * to by index. A fragment is only a view over that arena: the list of its states, its start
 * state and its accept states. Composing fragments adds states and epsilon edges to the arena
 * but never removes or renumbers anything. */

use bitvec::prelude::*;
use color_eyre::eyre::{Report, Result};
use log::{debug, info, warn};
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::process::Command;

use crate::fa::{Symbol, FA};
use crate::regex::{build_syntax_tree, RegEx};

/// Errors raised by the NFA outside of matching, which never fails
#[derive(Debug)]
pub enum NFAError {
    InvalidStateIndex(usize),
    MalformedNFA(String), // A loaded automaton that refers to states it does not have
    GraphvizFailed(String),
}

impl fmt::Display for NFAError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NFAError::InvalidStateIndex(id) => write!(f, "Error: Invalid state index {} provided", id),
            NFAError::MalformedNFA(reason) => write!(f, "Error: Malformed NFA: {}", reason),
            NFAError::GraphvizFailed(reason) => {
                write!(f, "Error: Failed to render the NFA with Graphviz: {}", reason)
            }
        }
    }
}

impl std::error::Error for NFAError {}

// JSON object keys have to be strings, so the transitions go out as a list of pairs instead
fn serialize_transitions<S>(
    transitions: &BTreeMap<Symbol, Vec<usize>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    use serde::ser::SerializeSeq;

    let mut ser_seq = serializer.serialize_seq(Some(transitions.len()))?;

    for entry in transitions {
        ser_seq.serialize_element(&entry)?;
    }
    ser_seq.end()
}

fn deserialize_transitions<'de, D>(deserializer: D) -> Result<BTreeMap<Symbol, Vec<usize>>, D::Error>
where
    D: Deserializer<'de>,
{
    let pairs: Vec<(Symbol, Vec<usize>)> = Vec::deserialize(deserializer)?;

    let mut result = BTreeMap::new();

    for (symbol, targets) in pairs {
        if result.insert(symbol, targets).is_some() {
            return Err(serde::de::Error::custom(format!(
                "Duplicate transition list for symbol {}",
                symbol
            )));
        }
    }

    Ok(result)
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NFAState {
    id: usize,
    #[serde(
        serialize_with = "serialize_transitions",
        deserialize_with = "deserialize_transitions"
    )]
    transitions: BTreeMap<Symbol, Vec<usize>>, // Destinations keep the order they were added in
}

impl NFAState {
    fn new(id: usize) -> Self {
        NFAState {
            id,
            transitions: BTreeMap::new(),
        }
    }

    fn add_transition(&mut self, symbol: Symbol, to: usize) {
        // Every composition targets a freshly allocated start state, so no edge is added twice
        self.transitions.entry(symbol).or_default().push(to);
    }

    pub fn get_transitions(&self) -> &BTreeMap<Symbol, Vec<usize>> {
        &self.transitions
    }

    pub fn get_id(&self) -> usize {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    states: Vec<usize>,
    start: usize,
    accepts: Vec<usize>,
}

impl Fragment {
    pub fn get_states(&self) -> &[usize] {
        &self.states
    }

    pub fn get_start_state(&self) -> usize {
        self.start
    }

    pub fn get_accept_states(&self) -> &[usize] {
        &self.accepts
    }
}

// Every state of a compilation comes from the same generator, so state ids are unique across
// all fragments of that compilation.
#[derive(Debug, Default)]
pub struct Generator {
    states: Vec<NFAState>,
    alphabet: HashSet<char>,
}

impl Generator {
    pub fn new() -> Self {
        Generator {
            states: Vec::new(),
            alphabet: HashSet::new(),
        }
    }

    pub fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn new_state(&mut self) -> usize {
        let state_id = self.states.len();
        self.states.push(NFAState::new(state_id));
        state_id
    }

    fn add_transition(&mut self, from: usize, symbol: Symbol, to: usize) {
        self.states[from].add_transition(symbol, to);
    }

    fn symbol_fragment(&mut self, character: char) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        self.alphabet.insert(character);
        self.add_transition(start, Symbol::Char(character), end);

        Fragment {
            states: vec![start, end],
            start,
            accepts: vec![end],
        }
    }

    fn union_fragment(&mut self, lhs: Fragment, rhs: Fragment) -> Fragment {
        let start = self.new_state();
        self.add_transition(start, Symbol::Epsilon, lhs.start);
        self.add_transition(start, Symbol::Epsilon, rhs.start);

        let mut states = Vec::with_capacity(1 + lhs.states.len() + rhs.states.len());
        states.push(start);
        states.extend(lhs.states);
        states.extend(rhs.states);

        let mut accepts = lhs.accepts;
        accepts.extend(rhs.accepts);

        Fragment {
            states,
            start,
            accepts,
        }
    }

    fn concat_fragment(&mut self, lhs: Fragment, rhs: Fragment) -> Fragment {
        // The old accept states of lhs stay in the fragment as interior states
        for &accept in &lhs.accepts {
            self.add_transition(accept, Symbol::Epsilon, rhs.start);
        }

        let mut states = lhs.states;
        states.extend(rhs.states);

        Fragment {
            states,
            start: lhs.start,
            accepts: rhs.accepts,
        }
    }

    fn star_fragment(&mut self, operand: Fragment) -> Fragment {
        let start = self.new_state();
        self.add_transition(start, Symbol::Epsilon, operand.start);

        for &accept in &operand.accepts {
            self.add_transition(accept, Symbol::Epsilon, operand.start);
        }

        let mut states = operand.states;
        states.push(start);

        // The new start accepts too, which is what lets zero repetitions match
        let mut accepts = operand.accepts;
        accepts.push(start);

        Fragment {
            states,
            start,
            accepts,
        }
    }

    fn build(&mut self, node: &RegEx, built: &mut Vec<Fragment>) -> Option<Fragment> {
        let fragment = match node {
            RegEx::Symbol(character) => self.symbol_fragment(*character),
            RegEx::Union(..) => {
                let rhs = built.pop()?;
                let lhs = built.pop()?;
                self.union_fragment(lhs, rhs)
            }
            RegEx::Concat(..) => {
                let rhs = built.pop()?;
                let lhs = built.pop()?;
                self.concat_fragment(lhs, rhs)
            }
            RegEx::Star(_) => {
                let operand = built.pop()?;
                self.star_fragment(operand)
            }
        };
        debug!(
            "Built {} fragment: start {}, {} accepts, {} states",
            node.kind(),
            fragment.start,
            fragment.accepts.len(),
            fragment.states.len()
        );
        Some(fragment)
    }

    pub fn generate(&mut self, tree: &RegEx) -> Fragment {
        // Post-order, left before right. Left folded trees are as deep as the pattern is long,
        // so the walk keeps its own stack.
        let mut pending: Vec<(&RegEx, bool)> = vec![(tree, false)];
        let mut built: Vec<Fragment> = Vec::new();

        while let Some((node, children_done)) = pending.pop() {
            if !children_done {
                pending.push((node, true));
                match node {
                    RegEx::Symbol(_) => {}
                    RegEx::Union(lhs, rhs) | RegEx::Concat(lhs, rhs) => {
                        pending.push((rhs.as_ref(), false));
                        pending.push((lhs.as_ref(), false));
                    }
                    RegEx::Star(operand) => pending.push((operand.as_ref(), false)),
                }
                continue;
            }

            // Children were pushed before their parent is revisited, so they are always there
            if let Some(fragment) = self.build(node, &mut built) {
                built.push(fragment);
            }
        }

        match built.pop() {
            Some(fragment) => fragment,
            None => unreachable!("a syntax tree always yields one fragment"),
        }
    }

    pub fn finish(self, fragment: Fragment, regex: &str) -> NFA {
        let num_states = self.states.len();
        let mut accept_states: BitVec<u8> = BitVec::repeat(false, num_states);
        for accept in fragment.accepts {
            accept_states.set(accept, true);
        }

        NFA {
            states: self.states,
            start_state: fragment.start,
            accept_states,
            alphabet: self.alphabet,
            regex: regex.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NFA {
    states: Vec<NFAState>,
    start_state: usize,
    accept_states: BitVec<u8>,
    alphabet: HashSet<char>,
    regex: String,
}

impl FA for NFA {
    fn show_fa(&self, file_name: &str) -> Result<()> {
        let mut graph = DiGraph::new();
        let mut node_map = Vec::with_capacity(self.states.len());

        for state in &self.states {
            let label = if state.id == self.start_state {
                format!("Start\nState {}", state.id)
            } else if self.accept_states[state.id] {
                format!("Accept\nState {}", state.id)
            } else {
                format!("State {}", state.id)
            };
            node_map.push(graph.add_node(label));
        }

        for state in &self.states {
            for (symbol, targets) in &state.transitions {
                for &target in targets {
                    graph.add_edge(node_map[state.id], node_map[target], symbol.to_string());
                }
            }
        }

        let dot = Dot::new(&graph);

        let dot_file_name = format!("{}.dot", file_name);
        let mut dot_file = File::create(&dot_file_name)?;
        dot_file.write_all(dot.to_string().as_bytes())?;

        let jpg_file_name = format!("{}.jpg", file_name);
        let output = Command::new("dot")
            .args(["-Tjpg", dot_file_name.as_str(), "-o", jpg_file_name.as_str()])
            .output()?;

        if !output.status.success() {
            let reason = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(Report::new(NFAError::GraphvizFailed(reason)));
        }

        info!("NFA visualization saved as {}", jpg_file_name);
        Ok(())
    }

    fn get_num_states(&self) -> usize {
        self.states.len()
    }

    fn get_start_state(&self) -> usize {
        self.start_state
    }

    fn get_alphabet(&self) -> &HashSet<char> {
        &self.alphabet
    }

    fn get_acceptor_states(&self) -> &BitVec<u8> {
        &self.accept_states
    }

    fn get_state_transitions(&self, state_id: usize) -> Vec<(&Symbol, &usize)> {
        let mut result = Vec::new();
        if let Some(state) = self.states.get(state_id) {
            for (symbol, targets) in &state.transitions {
                for target in targets {
                    result.push((symbol, target));
                }
            }
        }
        result
    }
}

impl NFA {
    pub fn get_state(&self, id: usize) -> Result<&NFAState> {
        match self.states.get(id) {
            Some(state) => Ok(state),
            None => Err(Report::new(NFAError::InvalidStateIndex(id))),
        }
    }

    pub fn get_states(&self) -> &[NFAState] {
        &self.states
    }

    pub fn get_regex(&self) -> &String {
        &self.regex
    }

    // Marks and returns every state reachable from the seeds through epsilon edges. States
    // already marked in `members` are neither revisited nor returned.
    fn close_over_epsilon(&self, seeds: Vec<usize>, members: &mut BitVec<u8>) -> Vec<usize> {
        let mut worklist: VecDeque<usize> = VecDeque::with_capacity(seeds.len());
        for state in seeds {
            if !members[state] {
                members.set(state, true);
                worklist.push_back(state);
            }
        }

        let mut reached = Vec::new();
        while let Some(state) = worklist.pop_front() {
            reached.push(state);
            let targets = match self.states[state].transitions.get(&Symbol::Epsilon) {
                Some(targets) => targets,
                None => continue,
            };
            for &target in targets {
                if !members[target] {
                    members.set(target, true);
                    worklist.push_back(target);
                }
            }
        }

        reached
    }

    fn moves_on(&self, states: impl Iterator<Item = usize>, c: char) -> Vec<usize> {
        let symbol = Symbol::Char(c);
        states
            .filter_map(|state| self.states.get(state))
            .filter_map(|state| state.transitions.get(&symbol))
            .flatten()
            .copied()
            .collect()
    }

    /// Add every state reachable through epsilon edges to the set. Bits past the last state
    /// are dropped.
    pub fn epsilon_closure(&self, states: &BitVec<u8>) -> BitVec<u8> {
        let num_states = self.states.len();
        let seeds: Vec<usize> = states
            .iter_ones()
            .take_while(|&state| state < num_states)
            .collect();

        let mut closure: BitVec<u8> = BitVec::repeat(false, num_states);
        self.close_over_epsilon(seeds, &mut closure);
        closure
    }

    pub fn start_set(&self) -> BitVec<u8> {
        let mut start: BitVec<u8> = BitVec::repeat(false, self.states.len());
        start.set(self.start_state, true);
        self.epsilon_closure(&start)
    }

    pub fn step(&self, states: &BitVec<u8>, c: char) -> BitVec<u8> {
        let seeds = self.moves_on(states.iter_ones(), c);

        let mut result: BitVec<u8> = BitVec::repeat(false, self.states.len());
        self.close_over_epsilon(seeds, &mut result);
        result
    }

    pub fn is_in_accept_state(&self, states: &BitVec<u8>) -> bool {
        states
            .iter_ones()
            .any(|state| self.accept_states.get(state).is_some_and(|bit| *bit))
    }

    /// Run the automaton over the whole input and report whether it ends in an accept state
    pub fn accepts(&self, input: &str) -> bool {
        // The active states are kept as a list so each step only costs as much as the states
        // and edges it touches. `members` mirrors the list and is cleared before every step.
        let mut members: BitVec<u8> = BitVec::repeat(false, self.states.len());
        let mut active = self.close_over_epsilon(vec![self.start_state], &mut members);

        for (pos, c) in input.chars().enumerate() {
            if !self.alphabet.contains(&c) {
                debug!("'{}' at position {} is outside the alphabet", c, pos);
                return false;
            }

            for &state in &active {
                members.set(state, false);
            }
            let seeds = self.moves_on(active.iter().copied(), c);
            active = self.close_over_epsilon(seeds, &mut members);

            debug!("After '{}': {} active states", c, active.len());
            if active.is_empty() {
                return false;
            }
        }

        active.iter().any(|&state| self.accept_states[state])
    }

    /// Write the automaton in the DOT graph language. The start state is drawn as a box and
    /// accept states as double circles.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph G {\n");
        dot.push_str(&format!("    q{} [shape = box];\n", self.start_state));

        for accept in self.accept_states.iter_ones() {
            dot.push_str(&format!("    q{} [shape = doublecircle];\n", accept));
        }

        for state in &self.states {
            for (symbol, targets) in &state.transitions {
                for target in targets {
                    dot.push_str(&format!(
                        "    q{} -> q{} [label={}];\n",
                        state.id, target, symbol
                    ));
                }
            }
        }

        dot.push_str("}\n");
        dot
    }

    pub fn dump_dot<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.to_dot().as_bytes())?;
        Ok(())
    }

    pub fn save_nfa(&self, file_name: &str) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;

        let mut file = File::create(file_name)?;

        writeln!(file, "{}", json_string)?;

        info!("NFA for {} saved to {}", self.regex, file_name);
        Ok(())
    }

    fn validate(&self) -> Result<(), NFAError> {
        let num_states = self.states.len();

        if self.start_state >= num_states {
            return Err(NFAError::MalformedNFA(format!(
                "start state {} out of {} states",
                self.start_state, num_states
            )));
        }

        if self.accept_states.len() != num_states {
            return Err(NFAError::MalformedNFA(format!(
                "{} accept flags for {} states",
                self.accept_states.len(),
                num_states
            )));
        }

        for (idx, state) in self.get_states().iter().enumerate() {
            if state.get_id() != idx {
                return Err(NFAError::MalformedNFA(format!(
                    "state {} stored at index {}",
                    state.get_id(),
                    idx
                )));
            }
            for (symbol, targets) in &state.transitions {
                if let Some(target) = targets.iter().find(|&&target| target >= num_states) {
                    return Err(NFAError::MalformedNFA(format!(
                        "state {} has a transition on {} to missing state {}",
                        idx, symbol, target
                    )));
                }
            }
        }

        Ok(())
    }

    // The alphabet is derived data, matching rejects early on anything outside it
    fn rebuild_alphabet(&mut self) {
        let alphabet: HashSet<char> = self
            .states
            .iter()
            .flat_map(|state| state.transitions.keys())
            .filter_map(|symbol| match symbol {
                Symbol::Char(c) => Some(*c),
                Symbol::Epsilon => None,
            })
            .collect();

        if alphabet != self.alphabet {
            warn!(
                "Saved alphabet {:?} does not match the transitions, using {:?}",
                self.alphabet, alphabet
            );
            self.alphabet = alphabet;
        }
    }

    fn from_reader<R: Read>(reader: R) -> Result<NFA> {
        let mut nfa: NFA = serde_json::from_reader(reader)?;

        nfa.validate()?;
        nfa.rebuild_alphabet();

        Ok(nfa)
    }
}

/// Compile an already parsed syntax tree into an NFA. `regex` is only kept for reference.
pub fn construct_nfa(syntax_tree: &RegEx, regex: &str) -> NFA {
    let mut generator = Generator::new();
    let fragment = generator.generate(syntax_tree);
    let nfa = generator.finish(fragment, regex);

    debug!(
        "Constructed NFA for {} with {} states",
        regex,
        nfa.get_num_states()
    );
    nfa
}

pub fn compile(regex: &str) -> Result<NFA> {
    let syntax_tree = build_syntax_tree(regex)?;
    Ok(construct_nfa(&syntax_tree, regex))
}

/// Load an NFA saved with `NFA::save_nfa`
pub fn load_nfa(file_name: &str) -> Result<NFA> {
    let file = File::open(file_name)?;

    let buf_reader = BufReader::new(file);

    NFA::from_reader(buf_reader).map_err(|err| {
        warn!("Refusing to load {}: {}", file_name, err);
        err
    })
}
