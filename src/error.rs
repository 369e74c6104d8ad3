use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A failed load. Fatal for the pass that hit it.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid {encoding} text", path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid year {value:?} in record {record} of {}", path.display())]
    InvalidYear {
        path: PathBuf,
        record: usize,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown text encoding label: {0}")]
    UnknownEncoding(String),
}
