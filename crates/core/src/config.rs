//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! services. Environment variables are never read during request handling,
//! which keeps behaviour consistent across multi-threaded runtimes and test
//! harnesses.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Default address the REST server binds to.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Default directory for blob storage.
pub const DEFAULT_DATA_DIR: &str = "./simward_data";

/// Application configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    addr: String,
    data_dir: PathBuf,
    seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// Create a new `AppConfig`.
    pub fn new(addr: String, data_dir: PathBuf, seed_file: Option<PathBuf>) -> CoreResult<Self> {
        if addr.trim().is_empty() {
            return Err(CoreError::InvalidInput("bind address cannot be empty".into()));
        }

        Ok(Self {
            addr,
            data_dir,
            seed_file,
        })
    }

    /// Resolve configuration from the process environment.
    ///
    /// Reads `SIMWARD_ADDR`, `SIMWARD_DATA_DIR`, and `SIMWARD_SEED_FILE`,
    /// applying defaults for the first two.
    pub fn from_env() -> CoreResult<Self> {
        let addr = std::env::var("SIMWARD_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.into());
        let data_dir = std::env::var("SIMWARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        let seed_file = std::env::var("SIMWARD_SEED_FILE").ok().map(PathBuf::from);

        Self::new(addr, data_dir, seed_file)
    }

    /// Address the server binds to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Root directory for blob storage.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Optional seed file loaded into the in-memory store at startup.
    pub fn seed_file(&self) -> Option<&Path> {
        self.seed_file.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_addr() {
        assert!(AppConfig::new("  ".into(), PathBuf::from("/tmp"), None).is_err());
    }

    #[test]
    fn stores_resolved_values() {
        let cfg = AppConfig::new(
            "127.0.0.1:8080".into(),
            PathBuf::from("/var/simward"),
            Some(PathBuf::from("seed.json")),
        )
        .unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.data_dir(), Path::new("/var/simward"));
        assert_eq!(cfg.seed_file(), Some(Path::new("seed.json")));
    }
}
