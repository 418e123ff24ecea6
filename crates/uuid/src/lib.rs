//! Record identifiers.
//!
//! Every entity in the simward store is keyed by a server-generated UUID. To
//! keep identifier handling deterministic across the codebase, simward uses a
//! *canonical* representation: **32 lowercase hexadecimal characters** (no
//! hyphens). The [`RecordId`] wrapper guarantees the canonical format once
//! constructed.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from
//! `Uuid::new_v4().simple().to_string()`. Externally supplied identifiers
//! (path parameters, request bodies, seed files) must already be canonical;
//! use [`RecordId::parse`] to validate them.

mod service;

pub use service::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
