use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for a generation pass.
///
/// `Scan` is scan-fatal; `Read`, `Parse` and `Grammar` are file-fatal and
/// escalate to scan-fatal (a malformed handler file indicates a
/// build-breaking error upstream). Heuristic misses (uninferable response
/// type, missing documentation, absent routing-root marker) are not errors
/// and never appear here; they degrade to sentinel or absent values in the
/// route model.
#[derive(Debug, Error)]
pub enum Error {
    /// Directory traversal failed (missing root, permissions, symlink loop)
    #[error("failed to scan {}", root.display())]
    Scan {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A route file could not be read (I/O failure or invalid UTF-8)
    #[error("failed to read {}", file.display())]
    Read {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A route file contains invalid TypeScript syntax
    #[error("syntax error in {}", file.display())]
    Parse { file: PathBuf },

    /// The TypeScript grammar could not be loaded into the parser
    #[error("parser configuration error")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// Serializing the OpenAPI document failed
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Writing a generated artifact failed
    #[error("failed to write {}", file.display())]
    Write {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialize(format!("YAML: {}", err))
    }
}
