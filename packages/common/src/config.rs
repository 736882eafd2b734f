use std::path::PathBuf;

use serde::Deserialize;

/// Which object store backs the asset store.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Use path-style addressing (MinIO and most self-hosted gateways).
    #[serde(default)]
    pub path_style: bool,
}

/// App-level asset storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: filesystem.
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./images".
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// URL prefix stored paths are served under. Default: "/images".
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_backend() -> StorageBackend {
    StorageBackend::Filesystem
}
fn default_root() -> PathBuf {
    PathBuf::from("./images")
}
fn default_public_base_url() -> String {
    "/images".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            root: default_root(),
            public_base_url: default_public_base_url(),
            s3: None,
        }
    }
}
