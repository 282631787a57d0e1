use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    /// A part graph or fixture definition that cannot describe a valid
    /// document. Always a defect in the caller, never retried.
    #[error("Invalid fixture construction: {0}")]
    Construction(String),

    #[error("Failed to persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FixtureError>;

impl FixtureError {
    pub(crate) fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FixtureError::Persist {
            path: path.into(),
            source,
        }
    }
}
