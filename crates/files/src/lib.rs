//! Simward blob storage.
//!
//! This crate provides the opaque binary store behind patient files, session
//! assets, and coordinator documents. Entities in the main store reference
//! blobs by content hash; the bytes themselves never enter the entity store.
//!
//! ## Design
//!
//! - Binary bytes and entity metadata are deliberately separated
//! - Blobs are immutable once written (same content, same address)
//! - References from entities to blobs are explicit hash strings
//! - The entity store remains valid even when a referenced blob is absent
//!
//! ## Storage layout
//!
//! ```text
//! <root>/
//! └── blobs/
//!     └── ab/
//!         └── 3f/
//!             ├── ab3f9e…             # raw bytes, SHA-256 addressed
//!             └── ab3f9e….meta.yaml   # metadata sidecar
//! ```

mod blobs;
mod constants;

pub use blobs::{BlobMetadata, BlobStore, Sha256Hex};
pub use constants::BLOBS_FOLDER_NAME;

/// Errors that can occur during blob operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Root directory could not be created or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// No blob exists for the given hash
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// The supplied hash string is not 64 lowercase hex characters
    #[error("Invalid content hash: {0}")]
    InvalidHash(String),

    /// Metadata sidecar could not be serialised or parsed
    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
