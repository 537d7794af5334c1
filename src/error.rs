//! Unified error type.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by module loaders and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by dirroute's fallible operations.
///
/// Every variant is fatal to the `routify` / `load_middlewares` call that
/// produced it: no partially built route table is ever returned.
#[derive(Debug, Error)]
pub enum Error {
    /// The composer was asked to do something without the inputs it needs.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("no such directory: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A filename matched the route grammar with an invalid combination of markers.
    #[error("invalid route file `{}`: {reason}", path.display())]
    Grammar { path: PathBuf, reason: String },

    /// A module has the wrong shape for its position, or its factory returned nothing.
    #[error("module contract violated by `{}`: {reason}", path.display())]
    ModuleContract { path: PathBuf, reason: String },

    /// The module could not be loaded, or its factory failed.
    #[error("failed to load module `{}`", path.display())]
    ModuleLoad {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("invalid url pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("invalid ignore pattern `{pattern}`")]
    InvalidIgnorePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
