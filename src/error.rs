use crate::command::Step;
use std::path::PathBuf;
use std::process::ExitStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to enter directory {path:?}: {source}")]
    EnterDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start `{step}` in {dir:?}: {source}")]
    Spawn {
        step: Step,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{step}` in {dir:?} exited with {status}")]
    Failed {
        step: Step,
        dir: PathBuf,
        status: ExitStatus,
    },
}
