//! Error types for loading a structure and merging its documents.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Problems with the structure description itself.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("structure file '{}' not found", .0.display())]
    StructureNotFound(PathBuf),

    #[error("structure file '{}' is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing root: the structure must contain a 'home' object")]
    MissingRoot,

    #[error("node '{title}' is missing a 'file' value")]
    MissingFile { title: String },
}

/// Error returned by every fallible operation of the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A referenced source document does not exist.
    #[error("missing PDF: '{}'", path.display())]
    MissingResource { path: PathBuf },

    /// A referenced source document does not have exactly one page.
    #[error("'{}' must be 1 page, but has {pages} pages", path.display())]
    PageCount { path: PathBuf, pages: usize },

    #[error("PDF error on '{}': {source}", path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("could not save '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("page {0} does not exist in the merged document")]
    PageNotFound(u32),

    #[error("the outline of the merged document is empty")]
    EmptyOutline,

    /// Failure while assembling the output document in memory.
    #[error("malformed document structure: {0}")]
    Document(#[from] lopdf::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}
