//! Error types for the I/O boundary. The hot render path signals failure
//! in-band (`Option`/`bool`), matching the original renderer; these types
//! exist only where the crate talks to the filesystem.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to open {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read/write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a supported bitmap: {reason}")]
    InvalidBitmap { path: String, reason: String },
}
