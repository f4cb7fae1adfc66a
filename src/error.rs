//! Typed error classes of a comparison run.
//!
//! Everything is propagated as `anyhow::Error`; callers that need to tell a
//! fatal failure from a reported one use `err.downcast_ref::<VizError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VizError {
    /// Scan or point lookup against one of the snapshots failed. Always fatal.
    #[error("snapshot access failed ({side}): {reason}")]
    SnapshotAccess { side: &'static str, reason: String },

    /// A diagram file could not be created, written or closed. Fatal for the run.
    #[error("output stream {}", path.display())]
    OutputStream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external renderer failed to start or exited non-zero. Never fatal.
    #[error("render {} failed: {reason}", path.display())]
    Render { path: PathBuf, reason: String },

    #[error("invalid nibble value {value} at position {pos}")]
    InvalidNibble { pos: usize, value: u8 },

    #[error("taxonomy: {0}")]
    Taxonomy(String),

    #[error("dump {}:{line}: {reason}", path.display())]
    Dump {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl VizError {
    /// Fatal errors abort the whole comparison; the rest are reported and skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VizError::Render { .. })
    }

    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VizError::OutputStream {
            path: path.into(),
            source,
        }
    }
}
