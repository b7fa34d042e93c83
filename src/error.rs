use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FraudCheckError {
    #[error("project path does not exist: {0}")]
    ProjectNotFound(PathBuf),

    #[error("project path is not a directory: {0}")]
    ProjectNotDirectory(PathBuf),

    #[error("invalid threshold `{name}`: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("invalid value for {key}: `{value}`")]
    InvalidConfigValue { key: String, value: String },

    #[error("cannot read config file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("pattern `{name}` has an invalid matcher `{matcher}`: {source}")]
    InvalidPattern {
        name: String,
        matcher: String,
        #[source]
        source: regex::Error,
    },

    #[error("pattern `{name}` matcher `{matcher}` matches empty input")]
    EmptyMatch { name: String, matcher: String },

    #[error("invalid glob pattern `{pattern}`: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("failed to list files under {root}: {source}")]
    Listing {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, FraudCheckError>;
