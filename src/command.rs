use crate::error::{Error, Result};
use log::info;
use std::fmt;
use std::path::PathBuf;
use std::process::Command;

/// A single external command: a program looked up on `PATH` and its fixed arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.program)?;
        for arg in self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub trait Runner {
    /// Runs the step in the current working directory and waits for it to finish.
    fn run(&mut self, step: &Step) -> Result<()>;
}

pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&mut self, step: &Step) -> Result<()> {
        let dir = current_dir()?;
        info!("running `{step}` in {dir:?}");
        let status = Command::new(step.program)
            .args(step.args)
            .status()
            .map_err(|source| Error::Spawn {
                step: *step,
                dir: dir.clone(),
                source,
            })?;
        if !status.success() {
            return Err(Error::Failed {
                step: *step,
                dir,
                status,
            });
        }
        Ok(())
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(Error::CurrentDir)
}

#[test]
fn display_joins_arguments() {
    let step = Step {
        program: "cmake",
        args: &["..", "-G", "Ninja"],
    };
    assert_eq!(step.to_string(), "cmake .. -G Ninja");
    let bare = Step {
        program: "make",
        args: &[],
    };
    assert_eq!(bare.to_string(), "make");
}

#[cfg(unix)]
#[test]
fn successful_command() {
    let _lock = crate::workdir::lock_working_directory();
    let step = Step {
        program: "true",
        args: &[],
    };
    SystemRunner.run(&step).unwrap();
}

#[cfg(unix)]
#[test]
fn unsuccessful_command() {
    let _lock = crate::workdir::lock_working_directory();
    let step = Step {
        program: "sh",
        args: &["-c", "exit 3"],
    };
    match SystemRunner.run(&step) {
        Err(Error::Failed { step: failed, status, .. }) => {
            assert_eq!(failed, step);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected a failed step, got {other:?}"),
    }
}

#[test]
fn missing_program() {
    let _lock = crate::workdir::lock_working_directory();
    let step = Step {
        program: "buildrun-no-such-program",
        args: &[],
    };
    match SystemRunner.run(&step) {
        Err(Error::Spawn { source, .. }) => {
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
        }
        other => panic!("expected a spawn error, got {other:?}"),
    }
}
