//! Content-addressed blob store implementation.
//!
//! Blobs are identified by the SHA-256 hash of their content, which gives
//! deduplication (identical uploads share one blob), integrity checking, and
//! deterministic storage paths. A YAML metadata sidecar is written next to
//! each blob recording size, detected media type, original filename, and the
//! storage timestamp.

use crate::{FilesError, BLOBS_FOLDER_NAME};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use simward_types::NonEmptyText;
use std::fs;
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// A validated SHA-256 digest in lowercase hex form (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Hex(String);

impl Sha256Hex {
    /// Computes the digest of the given bytes.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    /// Validates an externally supplied hash string.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidHash`] unless the input is exactly 64
    /// lowercase hex characters.
    pub fn parse(input: &str) -> Result<Self, FilesError> {
        let ok = input.len() == 64
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !ok {
            return Err(FilesError::InvalidHash(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns the hex digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Sha256Hex {
    type Err = FilesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sha256Hex::parse(s)
    }
}

impl serde::Serialize for Sha256Hex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Sha256Hex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Sha256Hex::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Metadata for a stored blob.
///
/// Serialised to a YAML sidecar next to the blob itself, so the store stays
/// auditable without any database. Contains no patient identifiers.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Hashing algorithm used (always "sha256" for the current implementation)
    pub hash_algorithm: NonEmptyText,

    /// Hexadecimal digest of the blob content
    pub hash: Sha256Hex,

    /// Size of the blob in bytes
    pub size_bytes: u64,

    /// Detected media type (MIME type), if available
    ///
    /// Best-effort detection from the leading bytes; not authoritative.
    pub media_type: Option<NonEmptyText>,

    /// Filename the content was uploaded under
    pub original_filename: NonEmptyText,

    /// UTC timestamp when the blob was stored
    pub stored_at: DateTime<Utc>,
}

/// Content-addressed blob store rooted at a single directory.
///
/// The store is process-wide: all repositories of bytes (assets, patient
/// files, documents) share one hash-addressed namespace. Writing the same
/// content twice yields the same address and is treated as success.
#[derive(Debug)]
pub struct BlobStore {
    root_directory: PathBuf,
}

impl BlobStore {
    /// Opens (creating if necessary) a blob store at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the path exists but is
    /// not a directory, or if it cannot be created or canonicalised.
    pub fn open(root: &Path) -> Result<Self, FilesError> {
        if !root.exists() {
            fs::create_dir_all(root).map_err(|e| {
                FilesError::InvalidRootDirectory(format!(
                    "Cannot create {}: {}",
                    root.display(),
                    e
                ))
            })?;
        }

        if !root.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root.display()
            )));
        }

        let root_directory = root.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Stores bytes under their content address and writes the metadata
    /// sidecar.
    ///
    /// If a blob with the same hash already exists, the existing metadata is
    /// returned and nothing is rewritten; identical uploads are idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Io`] on directory-creation or write failures and
    /// [`FilesError::Metadata`] if the sidecar cannot be serialised.
    pub fn put(&self, original_filename: &str, bytes: &[u8]) -> Result<BlobMetadata, FilesError> {
        let hash = Sha256Hex::digest(bytes);
        let blob_path = self.blob_path(&hash);

        if blob_path.exists() {
            tracing::debug!(hash = %hash, "blob already stored, reusing");
            return self.metadata(&hash);
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&blob_path, bytes)?;

        let filename = NonEmptyText::new(original_filename)
            .unwrap_or_else(|_| NonEmptyText::new("unnamed").expect("literal is non-empty"));

        let media_type = infer::get(bytes)
            .map(|kind| NonEmptyText::new(kind.mime_type()).expect("mime type is non-empty"));

        let metadata = BlobMetadata {
            hash_algorithm: NonEmptyText::new("sha256").expect("literal is non-empty"),
            hash: hash.clone(),
            size_bytes: bytes.len() as u64,
            media_type,
            original_filename: filename,
            stored_at: Utc::now(),
        };

        let sidecar = serde_yaml::to_string(&metadata)?;
        fs::write(self.sidecar_path(&hash), sidecar)?;

        tracing::debug!(hash = %hash, size = bytes.len(), "blob stored");

        Ok(metadata)
    }

    /// Reads a blob's bytes by content hash.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::BlobNotFound`] if no blob exists for the hash.
    pub fn get(&self, hash: &Sha256Hex) -> Result<Vec<u8>, FilesError> {
        let path = self.blob_path(hash);
        if !path.exists() {
            return Err(FilesError::BlobNotFound(hash.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Reads a blob's metadata sidecar.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::BlobNotFound`] if the sidecar does not exist.
    pub fn metadata(&self, hash: &Sha256Hex) -> Result<BlobMetadata, FilesError> {
        let path = self.sidecar_path(hash);
        if !path.exists() {
            return Err(FilesError::BlobNotFound(hash.to_string()));
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Returns true if a blob with this hash is present.
    pub fn contains(&self, hash: &Sha256Hex) -> bool {
        self.blob_path(hash).exists()
    }

    fn shard_dir(&self, hash: &Sha256Hex) -> PathBuf {
        let hex = hash.as_str();
        self.root_directory
            .join(BLOBS_FOLDER_NAME)
            .join(&hex[0..2])
            .join(&hex[2..4])
    }

    fn blob_path(&self, hash: &Sha256Hex) -> PathBuf {
        self.shard_dir(hash).join(hash.as_str())
    }

    fn sidecar_path(&self, hash: &Sha256Hex) -> PathBuf {
        self.shard_dir(hash).join(format!("{}.meta.yaml", hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BlobStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = BlobStore::open(dir.path()).expect("open store");
        (dir, store)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = store();
        let bytes = b"lab report body";

        let meta = store.put("fbc.pdf", bytes).unwrap();
        assert_eq!(meta.size_bytes, bytes.len() as u64);
        assert_eq!(meta.original_filename.as_str(), "fbc.pdf");

        let read_back = store.get(&meta.hash).unwrap();
        assert_eq!(read_back, bytes);
    }

    #[test]
    fn put_is_idempotent_for_same_content() {
        let (_dir, store) = store();
        let first = store.put("a.txt", b"same bytes").unwrap();
        let second = store.put("b.txt", b"same bytes").unwrap();

        // Same address; the original sidecar wins.
        assert_eq!(first.hash, second.hash);
        assert_eq!(second.original_filename.as_str(), "a.txt");
    }

    #[test]
    fn get_unknown_hash_is_not_found() {
        let (_dir, store) = store();
        let hash = Sha256Hex::digest(b"never stored");
        assert!(matches!(
            store.get(&hash),
            Err(FilesError::BlobNotFound(_))
        ));
    }

    #[test]
    fn metadata_sidecar_round_trips() {
        let (_dir, store) = store();
        let meta = store.put("photo.png", b"\x89PNG\r\n\x1a\nrest").unwrap();

        let loaded = store.metadata(&meta.hash).unwrap();
        assert_eq!(loaded, meta);
        // PNG magic bytes should be detected
        assert_eq!(
            loaded.media_type.as_ref().map(|m| m.as_str()),
            Some("image/png")
        );
    }

    #[test]
    fn hash_parse_rejects_bad_input() {
        assert!(Sha256Hex::parse("short").is_err());
        assert!(Sha256Hex::parse(&"Z".repeat(64)).is_err());
        let good = Sha256Hex::digest(b"x").to_string();
        assert!(Sha256Hex::parse(&good).is_ok());
    }

    #[test]
    fn open_rejects_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            BlobStore::open(&file),
            Err(FilesError::InvalidRootDirectory(_))
        ));
    }

    #[test]
    fn blobs_are_sharded_two_levels() {
        let (dir, store) = store();
        let meta = store.put("x.bin", b"shard me").unwrap();
        let hex = meta.hash.as_str();
        let expected = dir
            .path()
            .canonicalize()
            .unwrap()
            .join(BLOBS_FOLDER_NAME)
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(hex);
        assert!(expected.exists());
    }
}
