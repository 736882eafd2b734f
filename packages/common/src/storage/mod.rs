mod asset;
mod category;
mod error;
mod normalize;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use asset::{AssetError, AssetStore};
pub use category::{AssetCategory, DEFAULT_MAX_DIM, FIELD_MAX_DIM, StoreMode};
pub use error::StorageError;
pub use traits::{ObjectStore, validate_key};

use crate::config::{StorageBackend, StorageConfig};

/// Build the object store selected by `config`.
pub async fn open_object_store(
    config: &StorageConfig,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store = filesystem::FilesystemObjectStore::new(
                config.root.clone(),
                config.public_base_url.clone(),
            )
            .await?;
            tracing::info!(root = %config.root.display(), "Using filesystem asset storage");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.backend = \"s3\" requires a [storage.s3] section".into())
            })?;
            let store = s3::S3ObjectStore::new(s3_config, config.public_base_url.clone())?;
            tracing::info!(bucket = %s3_config.bucket, "Using S3 asset storage");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "S3 storage requires the `object-storage` feature".into(),
        )),
    }
}
