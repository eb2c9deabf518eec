use crate::cli::Args;
use crate::command::SystemRunner;
use crate::config::DEFAULT_LAYOUT;
use crate::driver::{Driver, Report};
use crate::error::Result;
use crate::logger::{initialize_logger, initialize_panic_hook};
use log::{error, info};
use std::process::ExitCode;

mod cli;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
mod logger;
pub mod workdir;

pub fn main() -> ExitCode {
    let args = Args::parse();
    initialize_logger(args.log_level());
    initialize_panic_hook();
    args.warn_unknown();

    let result = Driver::new(&DEFAULT_LAYOUT, args.failure_policy(), SystemRunner)
        .and_then(|mut driver| driver.run());
    ExitCode::from(exit_status(&result))
}

/// Zero only when every step ran and succeeded, regardless of failure policy.
fn exit_status(result: &Result<Report>) -> u8 {
    match result {
        Ok(report) if report.succeeded() => {
            info!("finished after {} steps", report.invocations);
            0
        }
        Ok(report) => {
            error!(
                "finished after {} steps with {} failures",
                report.invocations,
                report.failures.len()
            );
            1
        }
        Err(e) => {
            error!("{e}");
            1
        }
    }
}

#[test]
fn exit_status_of_clean_run() {
    let report = Report {
        branch: crate::driver::BuildBranch::Fresh,
        invocations: 3,
        failures: Vec::new(),
    };
    assert_eq!(exit_status(&Ok(report)), 0);
}

#[test]
fn exit_status_of_run_with_collected_failures() {
    let report = Report {
        branch: crate::driver::BuildBranch::Existing,
        invocations: 2,
        failures: vec![crate::error::Error::EnterDir {
            path: "res/glsl".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }],
    };
    assert_eq!(exit_status(&Ok(report)), 1);
}

#[test]
fn exit_status_of_halted_run() {
    let result = Err(crate::error::Error::Spawn {
        step: config::MAKE,
        dir: "build".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
    });
    assert_eq!(exit_status(&result), 1);
}
