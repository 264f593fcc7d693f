// attune_sim/src/error.rs

use attune_core::AttuneError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("prefab resolution failed: {0}")]
    Catalog(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse model file {path}: {source}")]
    ModelParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("column '{0}' is missing from the trajectory file")]
    MissingColumn(String),

    #[error("line {line}, column '{column}': '{value}' is not a number")]
    BadCell {
        line: u64,
        column: String,
        value: String,
    },

    #[error("no trajectory row has |pitch| < {max_abs_pitch} and |roll| < {max_abs_roll}")]
    NoPermissibleStates {
        max_abs_pitch: f64,
        max_abs_roll: f64,
    },

    #[error(transparent)]
    Core(#[from] AttuneError),
}

impl From<figment::Error> for HarnessError {
    fn from(e: figment::Error) -> Self {
        HarnessError::Config(Box::new(e))
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
