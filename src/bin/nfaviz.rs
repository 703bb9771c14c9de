use clap::{Arg, ArgAction, Command};
use color_eyre::eyre::{eyre, Result};
use log::info;
use nfaviz::fa::FA;
use nfaviz::nfa::NFA;
use nfaviz::{compile, load_nfa, visualize};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("nfaviz")
        .version("1.0")
        .about("Compile a regular expression into an NFA using Thompson Construction, then match strings against it or draw it")
        .arg(
            Arg::new("pattern")
                .short('p')
                .long("pattern")
                .value_name("REGEX")
                .help("The regular expression to compile. Only letters, | and * are supported")
                .value_parser(clap::value_parser!(String))
                .required_unless_present("load-json"),
        )
        .arg(
            Arg::new("subject")
                .short('s')
                .long("subject")
                .value_name("STRING")
                .help("A string to match against the compiled NFA. Can be given several times")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("dot")
                .short('d')
                .long("dot")
                .help("Print the NFA in the DOT graph language. This is the default when nothing else is requested")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DOT FILE")
                .help("Write the DOT graph to this file instead of standard output")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("save-nfa")
                .short('n')
                .long("save-nfa")
                .value_name("NAME")
                .help("Render the NFA with Graphviz into NAME.dot and NAME.jpg")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("save-json")
                .short('j')
                .long("save-json")
                .value_name("JSON FILE")
                .help("Save the compiled NFA as JSON so it can be loaded again later")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("load-json")
                .short('l')
                .long("load-json")
                .value_name("JSON FILE")
                .help("Load a previously saved NFA instead of compiling a pattern")
                .conflicts_with("pattern")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("visualize")
                .short('v')
                .long("visualize")
                .help("Show the NFA inside an interactive window that allows for zooming, panning and clicking of elements")
                .action(ArgAction::SetTrue),
        )
}

fn get_nfa(args: &clap::ArgMatches) -> Result<NFA> {
    if let Some(json_file) = args.get_one::<String>("load-json") {
        info!("Loading NFA from {}", json_file);
        return load_nfa(json_file);
    }

    match args.get_one::<String>("pattern") {
        Some(pattern) => compile(pattern),
        None => Err(eyre!("Error: Either a pattern or a saved NFA should be provided!")),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = build_cli().get_matches();

    let nfa = get_nfa(&args)?;

    let subjects: Vec<&String> = args
        .get_many::<String>("subject")
        .map(|values| values.collect())
        .unwrap_or_default();

    for subject in &subjects {
        let verdict = if nfa.accepts(subject) {
            "accepted"
        } else {
            "rejected"
        };
        println!("{:?}: {}", subject, verdict);
    }

    let out_file_path = args.get_one::<PathBuf>("output");
    let save_nfa = args.get_one::<String>("save-nfa");
    let save_json = args.get_one::<String>("save-json");
    let show_window = args.get_flag("visualize");

    let nothing_else_requested = subjects.is_empty()
        && out_file_path.is_none()
        && save_nfa.is_none()
        && save_json.is_none()
        && !show_window;

    if args.get_flag("dot") || nothing_else_requested {
        nfa.dump_dot(&mut io::stdout().lock())?;
    }

    if let Some(out_file_path) = out_file_path {
        let mut out_file = BufWriter::new(File::create(out_file_path)?);
        nfa.dump_dot(&mut out_file)?;
        info!("DOT graph written to {}", out_file_path.display());
    }

    if let Some(file_name) = save_nfa {
        nfa.show_fa(file_name)?;
    }

    if let Some(file_name) = save_json {
        nfa.save_nfa(file_name)?;
    }

    if show_window {
        visualize(&nfa)?;
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::build_cli;

    #[test]
    fn test_cli_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_pattern_or_json_required() {
        assert!(build_cli().try_get_matches_from(["nfaviz"]).is_err());
        assert!(build_cli()
            .try_get_matches_from(["nfaviz", "-p", "a|b", "-l", "nfa.json"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["nfaviz", "-l", "nfa.json"])
            .is_ok());
    }

    #[test]
    fn test_repeated_subjects() {
        let args = build_cli()
            .try_get_matches_from(["nfaviz", "-p", "a*", "-s", "aa", "-s", "b", "--subject", ""])
            .unwrap();
        let subjects: Vec<&String> = args.get_many::<String>("subject").unwrap().collect();
        assert_eq!(subjects, vec!["aa", "b", ""]);
    }
}
