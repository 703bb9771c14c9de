use nfaviz::compile;

fn main() {
    let regex = "a*|b";

    let nfa = compile(regex).unwrap();

    for input in ["", "a", "aaaa", "b", "ab", "ba", "bb", "c"] {
        let verdict = if nfa.accepts(input) {
            "accepts"
        } else {
            "rejects"
        };
        println!("{} {} {:?}", regex, verdict, input);
    }

    print!("{}", nfa.to_dot());
}
