//! Error types for modgraph.

use std::path::PathBuf;

use thiserror::Error;

use crate::parser::ParseError;

/// Errors raised while building the module graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The corpus root could not be enumerated. This is the only fatal build error.
    #[error("cannot enumerate source files under {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    /// A source file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file could not be parsed.
    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The configuration file is malformed.
    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
