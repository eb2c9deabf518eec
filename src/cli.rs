use crate::driver::FailurePolicy;
use log::{warn, LevelFilter};

const KNOWN_FLAGS: [&str; 3] = ["--keep-going", "--verbose", "--quiet"];

pub struct Args {
    pub keep_going: bool,
    pub verbose: bool,
    pub quiet: bool,
    pub unknown: Vec<String>,
}

impl Args {
    pub fn parse() -> Args {
        Args::parse_from(std::env::args().skip(1))
    }

    pub fn parse_from(args: impl IntoIterator<Item = String>) -> Args {
        let args: Vec<String> = args.into_iter().collect();
        Args {
            keep_going: args.iter().any(|arg| arg == "--keep-going"),
            verbose: args.iter().any(|arg| arg == "--verbose"),
            quiet: args.iter().any(|arg| arg == "--quiet"),
            unknown: args
                .into_iter()
                .filter(|arg| !KNOWN_FLAGS.contains(&arg.as_str()))
                .collect(),
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::Halt
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        // --verbose wins if both are passed.
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }

    pub fn warn_unknown(&self) {
        for arg in &self.unknown {
            warn!("ignoring unrecognised argument {arg:?}");
        }
    }
}

#[test]
fn no_arguments_halts_at_info() {
    let args = Args::parse_from(Vec::new());
    assert_eq!(args.failure_policy(), FailurePolicy::Halt);
    assert_eq!(args.log_level(), LevelFilter::Info);
    assert!(args.unknown.is_empty());
}

#[test]
fn keep_going_and_quiet() {
    let args = Args::parse_from(["--quiet", "--keep-going"].map(String::from));
    assert_eq!(args.failure_policy(), FailurePolicy::KeepGoing);
    assert_eq!(args.log_level(), LevelFilter::Warn);
}

#[test]
fn verbose_overrides_quiet() {
    let args = Args::parse_from(["--quiet", "--verbose"].map(String::from));
    assert_eq!(args.log_level(), LevelFilter::Debug);
}

#[test]
fn unknown_arguments_are_collected() {
    let args = Args::parse_from(["--verbose", "clean", "-j8"].map(String::from));
    assert_eq!(args.unknown, ["clean", "-j8"]);
    assert!(args.verbose);
}
