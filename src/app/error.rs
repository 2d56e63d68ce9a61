use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::hooks::Hook;

#[derive(Error, Debug)]
pub enum RawdogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No such feed: {0}")]
    FeedNotFound(String),

    #[error("Extension failed in {hook} hook: {source:#}")]
    Hook {
        hook: Hook,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "An error occurred while reading state from {path}: {reason}\n\
         This usually means the file is corrupt, and removing it will fix the problem."
    )]
    CorruptState { path: PathBuf, reason: String },

    #[error("{} is locked: another instance of rawdog is running", .0.display())]
    Locked(PathBuf),

    #[error("Can't read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RawdogError>;
