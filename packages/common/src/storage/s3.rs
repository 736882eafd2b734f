use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::{ObjectStore, join_url, validate_key};
use crate::config::S3Config;

/// S3-compatible object store.
///
/// S3 has no conditional create, so `put_new` checks with a HEAD request first.
/// Two writers racing on the same key inside that window can both succeed and the
/// later one wins.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config, public_base_url: impl Into<String>) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid S3 credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(backend)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: public_base_url.into(),
        })
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_new(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<bool, StorageError> {
        if self.exists(key).await? {
            return Ok(false);
        }

        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(backend)?;
        match response.status_code() {
            200..=299 => Ok(true),
            code => Err(StorageError::Backend(format!(
                "PUT {key} returned status {code}"
            ))),
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 200 => Ok(response.bytes().to_vec()),
            Ok(response) if response.status_code() == 404 => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Ok(response) => Err(StorageError::Backend(format!(
                "GET {key} returned status {}",
                response.status_code()
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(backend(e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        match self.bucket.head_object(key).await {
            Ok((_, code)) => Ok(code == 200),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(backend(e)),
        }
    }

    fn url_for(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
