use async_trait::async_trait;

use super::error::StorageError;

/// Path-addressable object storage.
///
/// Keys are relative, `/`-separated paths such as `games/chips/7_1700000000_token.jpg`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key` unless the key is already taken.
    ///
    /// Returns `true` if the object was created, `false` if `key` already existed.
    /// Existing objects are never overwritten.
    async fn put_new(&self, key: &str, data: &[u8], content_type: &str)
    -> Result<bool, StorageError>;

    /// Retrieve all bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL under which `key` can be retrieved.
    fn url_for(&self, key: &str) -> String;
}

/// Reject keys that are empty, absolute, or contain traversal segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".into()));
    }
    if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(format!("'{key}' is not a relative path")));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "'{key}' contains an empty or traversal segment"
        )));
    }
    Ok(())
}

/// Join a public base URL and a key with exactly one `/` between them.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
