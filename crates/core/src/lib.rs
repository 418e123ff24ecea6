//! # Simward Core
//!
//! Domain logic for the simward clinical-simulation teaching platform.
//!
//! This crate contains the entity model and the services the REST layer is
//! built on:
//! - [`store`]: the [`EntityStore`] repository trait and its in-memory
//!   adapter
//! - [`visibility`]: group scope resolution and the asset/patient/file
//!   visibility rules
//! - [`investigations`]: the blood-test and imaging request workflow
//! - [`observations`]: the sparse vital-sign bundle writer
//! - [`auth`]: login verification
//! - [`seed`]: seed-file tooling and the demo dataset
//!
//! **No API concerns**: HTTP routing, status-code mapping, and wire DTOs
//! belong in `api-rest` and `api-shared`.

pub mod auth;
pub mod config;
pub mod error;
pub mod investigations;
pub mod model;
pub mod observations;
pub mod seed;
pub mod store;
pub mod visibility;

pub use config::AppConfig;
pub use error::{CoreError, CoreResult, StoreError, StoreResult};
pub use store::{EntityStore, MemoryStore};
pub use visibility::{resolve_group_scope, GroupScope, VisibilityService};

/// List ordering accepted by the request and observation read paths.
///
/// Mirrors the wire form: `created_at` (default) or `-created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrdering {
    #[default]
    CreatedAsc,
    CreatedDesc,
}

impl ListOrdering {
    /// Parses the optional `ordering` query parameter.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for anything other than
    /// `created_at` or `-created_at`.
    pub fn parse(value: Option<&str>) -> CoreResult<Self> {
        match value {
            None | Some("created_at") => Ok(Self::CreatedAsc),
            Some("-created_at") => Ok(Self::CreatedDesc),
            Some(other) => Err(CoreError::InvalidInput(format!(
                "unsupported ordering '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_parses_wire_forms() {
        assert_eq!(ListOrdering::parse(None).unwrap(), ListOrdering::CreatedAsc);
        assert_eq!(
            ListOrdering::parse(Some("created_at")).unwrap(),
            ListOrdering::CreatedAsc
        );
        assert_eq!(
            ListOrdering::parse(Some("-created_at")).unwrap(),
            ListOrdering::CreatedDesc
        );
        assert!(ListOrdering::parse(Some("name")).is_err());
    }
}
