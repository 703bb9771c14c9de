use nfaviz::fa::FA;
use nfaviz::{compile, load_nfa};

fn main() {
    let regex = "ab*c|d";

    let nfa = compile(regex).unwrap();

    // Save the NFA and reload it just to demonstrate the save and load feature

    let result = nfa.save_nfa("demos/abc_nfa.json");

    assert!(result.is_ok());

    let nfa = load_nfa("demos/abc_nfa.json").unwrap();

    println!(
        "Loaded NFA for {} with {} states",
        nfa.get_regex(),
        nfa.get_num_states()
    );

    // Needs Graphviz installed
    if let Err(err) = nfa.show_fa("demos/abc_nfa") {
        eprintln!("{}", err);
    }
}
