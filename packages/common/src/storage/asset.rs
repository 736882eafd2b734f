use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use super::category::{AssetCategory, StoreMode};
use super::error::StorageError;
use super::normalize::to_bounded_jpeg;
use super::traits::ObjectStore;

/// Upper bound on `-N` suffixes tried for one base name.
const MAX_NAME_ATTEMPTS: u32 = 64;
const MAX_STEM_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("unsupported or corrupt image: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no free asset name for {0}")]
    NamesExhausted(String),
    #[error("asset task failed: {0}")]
    Task(String),
}

/// Turns uploaded bytes into normalized, uniquely named objects.
#[derive(Clone)]
pub struct AssetStore {
    backend: Arc<dyn ObjectStore>,
}

impl AssetStore {
    pub fn new(backend: Arc<dyn ObjectStore>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn ObjectStore {
        &*self.backend
    }

    /// Store an uploaded blob and return its object path.
    ///
    /// Paths look like `{dir}/{owner_id}_{unix_secs}_{stem}.{ext}`. When two uploads in
    /// the same second share a stem, later ones get a `-1`, `-2`, ... suffix.
    pub async fn store(
        &self,
        data: Bytes,
        category: AssetCategory,
        owner_id: i32,
        hint_name: &str,
        mode: StoreMode,
    ) -> Result<String, AssetError> {
        let (payload, ext, content_type) = match mode {
            StoreMode::Image { max_dim } => {
                let jpeg = tokio::task::spawn_blocking(move || to_bounded_jpeg(&data, max_dim))
                    .await
                    .map_err(|e| AssetError::Task(e.to_string()))??;
                (jpeg, "jpg".to_string(), "image/jpeg".to_string())
            }
            StoreMode::Raw => {
                let content_type = mime_guess::from_path(hint_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string();
                (data.to_vec(), raw_extension(hint_name), content_type)
            }
        };

        let base = format!(
            "{}/{}_{}_{}",
            category.dir(),
            owner_id,
            Utc::now().timestamp(),
            sanitize_stem(hint_name)
        );

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let key = if attempt == 0 {
                format!("{base}.{ext}")
            } else {
                format!("{base}-{attempt}.{ext}")
            };
            if self.backend.put_new(&key, &payload, &content_type).await? {
                debug!(%category, key = %key, size = payload.len(), "Stored asset");
                return Ok(key);
            }
        }

        Err(AssetError::NamesExhausted(base))
    }

    /// Store using the category's default mode.
    pub async fn store_default(
        &self,
        data: Bytes,
        category: AssetCategory,
        owner_id: i32,
        hint_name: &str,
    ) -> Result<String, AssetError> {
        self.store(data, category, owner_id, hint_name, category.default_mode())
            .await
    }

    /// Retrievable URL for a stored path.
    pub fn url_for(&self, path: &str) -> String {
        self.backend.url_for(path)
    }
}

/// File stem reduced to `[A-Za-z0-9_-]`, or `asset` if nothing survives.
fn sanitize_stem(hint_name: &str) -> String {
    let file_name = hint_name.rsplit(['/', '\\']).next().unwrap_or(hint_name);
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .take(MAX_STEM_LEN)
        .collect();
    if cleaned.is_empty() {
        "asset".to_string()
    } else {
        cleaned
    }
}

fn raw_extension(hint_name: &str) -> String {
    let file_name = hint_name.rsplit(['/', '\\']).next().unwrap_or(hint_name);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}
