//! Error types for PolyNest.

use thiserror::Error;

/// Result type alias for PolyNest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while clustering, transforming or nesting.
#[derive(Debug, Error)]
pub enum Error {
    /// Mesh input rejected (unreferenced vertex, bad index, ragged index array).
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// A handle does not reference a library entry.
    #[error("Invalid handle {handle}: library holds {len} entries")]
    InvalidHandle { handle: usize, len: usize },

    /// Geometry unusable for the requested operation.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Degenerate geometry hit during an NFP computation.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A command buffer is already executing.
    #[error("Nester is busy executing a command buffer")]
    Busy,

    /// Computation cancelled.
    #[error("Computation cancelled")]
    Cancelled,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = Error::InvalidHandle { handle: 7, len: 3 };
        assert_eq!(e.to_string(), "Invalid handle 7: library holds 3 entries");
        assert_eq!(
            Error::InvalidMesh("vertex 2 unused".into()).to_string(),
            "Invalid mesh: vertex 2 unused"
        );
    }
}
