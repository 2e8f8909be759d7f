//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to parse manifest stream: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to serialize document {index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid drop-set file {path}: {source}")]
    DropSet {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
