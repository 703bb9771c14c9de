mod integration_tests_helper {

    use nfaviz::nfa::NFA;
    use nfaviz::{build_syntax_tree, construct_nfa};

    pub fn get_nfa(regex: &str) -> NFA {
        let syntax_tree = build_syntax_tree(regex);

        // assert parsing the regex was successful
        assert!(syntax_tree.is_ok(), "{:?} failed to parse", regex);

        let syntax_tree = syntax_tree.unwrap();

        construct_nfa(&syntax_tree, regex)
    }

    pub fn assert_language(regex: &str, accepted: &[&str], rejected: &[&str]) {
        let nfa = get_nfa(regex);
        for input in accepted {
            assert!(nfa.accepts(input), "{} should accept {:?}", regex, input);
        }
        for input in rejected {
            assert!(!nfa.accepts(input), "{} should reject {:?}", regex, input);
        }
    }

    pub fn temp_file(name: &str) -> String {
        let mut path = std::path::PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
        path.push(name);
        path.to_str().unwrap().to_string()
    }
}

mod integration_tests {
    use crate::integration_tests_helper::{assert_language, get_nfa, temp_file};

    use nfaviz::fa::FA;
    use nfaviz::nfa::NFAError;
    use nfaviz::regex::RegExError;
    use nfaviz::token::{TokenError, TokenKind};
    use nfaviz::{compile, load_nfa, parse_regex, tokenize};

    #[test]
    fn test_pipeline_by_hand() {
        let tokens = tokenize("a*|b").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.get_kind()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Symbol,
                TokenKind::Star,
                TokenKind::Union,
                TokenKind::Symbol,
                TokenKind::EndOfInput
            ]
        );

        let syntax_tree = parse_regex(&tokens).unwrap();
        assert_eq!(syntax_tree.to_string(), "((a)*|b)");

        let nfa = nfaviz::construct_nfa(&syntax_tree, "a*|b");
        assert!(nfa.accepts("aaa"));
        assert!(!nfa.accepts("ab"));
    }

    #[test]
    fn test_star_or_symbol_language() {
        assert_language("a*|b", &["", "a", "aaaa", "b"], &["ab", "ba", "bb", "c"]);
    }

    #[test]
    fn test_concatenation_language() {
        assert_language("ab", &["ab"], &["", "a", "b", "abc"]);
    }

    #[test]
    fn test_star_language() {
        assert_language("a*", &["", "a", "aa", "aaaaaaaa"], &["b", "ab", "aaba", "A"]);
    }

    #[test]
    fn test_mixed_language() {
        assert_language(
            "xy*z|Q",
            &["xz", "xyz", "xyyyz", "Q"],
            &["", "x", "xy", "xzz", "QQ", "q"],
        );
        assert_language("a|b|c", &["a", "b", "c"], &["", "ab", "d"]);
        assert_language("ab*a*", &["a", "ab", "aa", "abbaa"], &["", "b", "abab"]);
    }

    #[test]
    fn test_case_sensitive() {
        assert_language("aB", &["aB"], &["ab", "AB", "Ab"]);
    }

    #[test]
    fn test_same_pattern_twice() {
        let first = get_nfa("ab*|c*d");
        let second = get_nfa("ab*|c*d");
        assert_eq!(first.get_num_states(), second.get_num_states());
        assert_eq!(first.to_dot(), second.to_dot());
    }

    #[test]
    fn test_lexical_error() {
        let result = compile("a(b)");
        assert!(result.is_err());

        let err = result.unwrap_err();

        match err.downcast_ref::<TokenError>().unwrap() {
            TokenError::InvalidCharacter('(', 1) => {}
            err => panic!("Expected InvalidCharacter, got {:?}", err),
        }
    }

    #[test]
    fn test_syntax_errors() {
        for regex in ["", "|", "a|", "*", "*a", "a|*b", "ab||c"] {
            let result = compile(regex);
            assert!(result.is_err(), "{:?} should not compile", regex);
            assert!(
                result.unwrap_err().downcast_ref::<RegExError>().is_some(),
                "{:?} should be a syntax error",
                regex
            );
        }
    }

    #[test]
    fn test_dot_output() {
        let nfa = compile("a").unwrap();
        let dot = nfa.to_dot();

        assert!(dot.starts_with("digraph G {\n"));
        assert!(dot.ends_with("}\n"));

        let symbol_edges: Vec<&str> = dot
            .lines()
            .filter(|line| line.contains("->") && !line.contains("label=ε"))
            .collect();
        assert_eq!(symbol_edges.len(), 1);

        let boxes = dot.lines().filter(|line| line.contains("shape = box")).count();
        assert_eq!(boxes, 1);
    }

    #[test]
    fn test_save_and_load_json() {
        let nfa = compile("ab*|ba*").unwrap();
        let file_name = temp_file("save_and_load.json");

        let result = nfa.save_nfa(&file_name);
        assert!(result.is_ok());

        let loaded = load_nfa(&file_name).unwrap();
        assert_eq!(loaded, nfa);
        assert_eq!(loaded.get_regex(), "ab*|ba*");
        for input in ["a", "abbb", "b", "baa", "", "ab|"] {
            assert_eq!(loaded.accepts(input), nfa.accepts(input));
        }
    }

    #[test]
    fn test_load_malformed_json() {
        let nfa = compile("ab").unwrap();
        let file_name = temp_file("malformed.json");
        nfa.save_nfa(&file_name).unwrap();

        // Point the start state past the end of the state list
        let json = std::fs::read_to_string(&file_name).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["start_state"] = serde_json::Value::from(99);
        std::fs::write(&file_name, value.to_string()).unwrap();

        let result = load_nfa(&file_name);
        assert!(result.is_err());

        match result.unwrap_err().downcast_ref::<NFAError>().unwrap() {
            NFAError::MalformedNFA(_) => {}
            err => panic!("Expected MalformedNFA, got {:?}", err),
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_nfa(&temp_file("does_not_exist.json")).is_err());
    }
}
