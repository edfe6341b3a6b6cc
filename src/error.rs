//! Error types for asset loading
//!
//! Asset failures are fatal at startup, so these bubble up through
//! `anyhow` in the binary. The typed variants exist so library users can
//! tell a parse failure from an empty file.

use thiserror::Error;

/// Errors produced while loading scene assets from disk
#[derive(Debug, Error)]
pub enum AssetLoadError {
    /// The OBJ file could not be read or parsed
    #[error("failed to load model '{path}': {source}")]
    Model {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    /// The OBJ file parsed but contained no meshes
    #[error("model '{path}' contains no meshes")]
    EmptyModel { path: String },
}
