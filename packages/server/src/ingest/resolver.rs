//! Rewrites metadata blocks so that file references point at stored assets.
//!
//! A descriptor is a JSON object with a `type` of `"url"` or `"file"`. File
//! descriptors name one of the files uploaded alongside the block, either by
//! an integer `index` into that category's uploads or by `name`. Matched files
//! are stored and the descriptor becomes `{"type": "file", "path": ...}`.
//!
//! Indexes count every submitted part, including empty ones left by unfilled
//! file inputs. An empty part never matches.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use common::storage::{AssetCategory, AssetError, AssetStore};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

/// A file part taken from the request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub contents: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            contents: contents.into(),
        }
    }

    /// A part with no contents, as sent for an unfilled file input.
    pub fn blank(file_name: Option<String>) -> Self {
        Self {
            file_name,
            contents: Bytes::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.contents.is_empty()
    }

    fn hint(&self) -> &str {
        self.file_name.as_deref().unwrap_or("asset")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataCategory {
    Chips,
    Decks,
    Cube,
    Objects,
}

/// What happens to a file descriptor whose upload is not in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFilePolicy {
    /// The entry is left out of the result.
    Drop,
    /// The descriptor is kept exactly as submitted.
    Keep,
}

impl MetadataCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataCategory::Chips => "chips",
            MetadataCategory::Decks => "decks",
            MetadataCategory::Cube => "cube",
            MetadataCategory::Objects => "objects",
        }
    }

    pub fn missing_file_policy(self) -> MissingFilePolicy {
        match self {
            MetadataCategory::Chips => MissingFilePolicy::Drop,
            MetadataCategory::Decks | MetadataCategory::Cube | MetadataCategory::Objects => {
                MissingFilePolicy::Keep
            }
        }
    }

    /// Value stored when the block is submitted but blank.
    pub fn empty_value(self) -> Value {
        match self {
            MetadataCategory::Chips => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        }
    }
}

impl fmt::Display for MetadataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid JSON format for {category} metadata: {source}")]
    Parse {
        category: MetadataCategory,
        source: serde_json::Error,
    },
    #[error("Invalid {category} metadata: {detail}")]
    Shape {
        category: MetadataCategory,
        detail: String,
    },
    #[error("Ambiguous file reference in {category} metadata: {count} uploads are named {name:?}")]
    AmbiguousFile {
        category: MetadataCategory,
        name: String,
        count: usize,
    },
    #[error("File index {index} in {category} metadata is out of range ({available} uploaded)")]
    FileIndex {
        category: MetadataCategory,
        index: u64,
        available: usize,
    },
    #[error("Failed to store {category} asset: {source}")]
    Asset {
        category: MetadataCategory,
        source: AssetError,
    },
}

impl ResolveError {
    pub fn category(&self) -> MetadataCategory {
        match self {
            ResolveError::Parse { category, .. }
            | ResolveError::Shape { category, .. }
            | ResolveError::AmbiguousFile { category, .. }
            | ResolveError::FileIndex { category, .. }
            | ResolveError::Asset { category, .. } => *category,
        }
    }

    /// Whether the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            ResolveError::Asset { source, .. } => matches!(source, AssetError::Decode(_)),
            _ => true,
        }
    }

    fn shape(category: MetadataCategory, detail: impl Into<String>) -> Self {
        ResolveError::Shape {
            category,
            detail: detail.into(),
        }
    }
}

/// The uploads that one metadata block may reference.
///
/// A file referenced several times under one asset category is stored once.
struct FilePool<'f> {
    category: MetadataCategory,
    files: &'f [UploadedFile],
    stored: HashMap<(usize, AssetCategory), String>,
}

impl<'f> FilePool<'f> {
    fn new(category: MetadataCategory, files: &'f [UploadedFile]) -> Self {
        Self {
            category,
            files,
            stored: HashMap::new(),
        }
    }

    /// Position of the upload a file descriptor refers to, if any.
    ///
    /// An explicit `index` wins over `name`. A name shared by several uploads is
    /// rejected rather than guessed.
    fn locate(&self, descriptor: &Map<String, Value>) -> Result<Option<usize>, ResolveError> {
        if let Some(index) = descriptor.get("index").filter(|v| !v.is_null()) {
            let index = index.as_u64().ok_or_else(|| {
                ResolveError::shape(self.category, "file index must be a non-negative integer")
            })?;
            return match usize::try_from(index) {
                Ok(i) if i < self.files.len() => Ok((!self.files[i].is_blank()).then_some(i)),
                _ => Err(ResolveError::FileIndex {
                    category: self.category,
                    index,
                    available: self.files.len(),
                }),
            };
        }

        let Some(name) = descriptor.get("name").and_then(Value::as_str) else {
            return Ok(None);
        };
        let mut hits = self
            .files
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.is_blank() && f.file_name.as_deref() == Some(name))
            .map(|(i, _)| i);

        match (hits.next(), hits.next()) {
            (None, _) => Ok(None),
            (Some(i), None) => Ok(Some(i)),
            (Some(_), Some(_)) => Err(ResolveError::AmbiguousFile {
                category: self.category,
                name: name.to_string(),
                count: 2 + hits.count(),
            }),
        }
    }
}

fn descriptor_type(descriptor: &Value) -> Option<&str> {
    descriptor.get("type").and_then(Value::as_str)
}

fn describe_reference(descriptor: &Map<String, Value>) -> String {
    match (descriptor.get("index"), descriptor.get("name")) {
        (Some(index), _) if !index.is_null() => format!("index {index}"),
        (_, Some(name)) => format!("name {name}"),
        _ => "no name".to_string(),
    }
}

/// Resolves metadata blocks for one submitter.
pub struct MetadataResolver<'a> {
    assets: &'a AssetStore,
    owner_id: i32,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(assets: &'a AssetStore, owner_id: i32) -> Self {
        Self { assets, owner_id }
    }

    /// Parse `raw` and rewrite its file references against `files`.
    ///
    /// A blank block resolves to the category's empty value.
    pub async fn resolve(
        &self,
        category: MetadataCategory,
        raw: &str,
        files: &[UploadedFile],
    ) -> Result<Value, ResolveError> {
        if raw.trim().is_empty() {
            return Ok(category.empty_value());
        }
        let parsed: Value = serde_json::from_str(raw)
            .map_err(|source| ResolveError::Parse { category, source })?;

        let mut pool = FilePool::new(category, files);
        match category {
            MetadataCategory::Cube => Ok(parsed),
            MetadataCategory::Chips => self.resolve_chips(&mut pool, parsed).await,
            MetadataCategory::Decks => self.resolve_decks(&mut pool, parsed).await,
            MetadataCategory::Objects => self.resolve_objects(&mut pool, parsed).await,
        }
    }

    async fn resolve_chips(
        &self,
        pool: &mut FilePool<'_>,
        parsed: Value,
    ) -> Result<Value, ResolveError> {
        let Value::Object(chips) = parsed else {
            return Err(ResolveError::shape(
                pool.category,
                "expected an object keyed by chip id",
            ));
        };

        let mut out = Vec::with_capacity(chips.len());
        for (chip_id, entry) in chips {
            let Value::Object(descriptor) = entry else {
                return Err(ResolveError::shape(
                    pool.category,
                    format!("chip {chip_id:?} is not an object"),
                ));
            };
            match descriptor.get("type").and_then(Value::as_str) {
                Some("url") => {
                    let value = descriptor.get("value").cloned().unwrap_or(Value::Null);
                    out.push(json!({ "type": "url", "value": value }));
                }
                Some("file") => {
                    let stored = self
                        .store_reference(pool, &descriptor, AssetCategory::Chip)
                        .await?;
                    if let Some(resolved) = self.apply_policy(pool, &chip_id, &descriptor, stored)
                    {
                        out.push(resolved);
                    }
                }
                other => {
                    debug!(chip = %chip_id, kind = ?other, "Skipping chip with unknown type");
                }
            }
        }
        Ok(Value::Array(out))
    }

    async fn resolve_decks(
        &self,
        pool: &mut FilePool<'_>,
        parsed: Value,
    ) -> Result<Value, ResolveError> {
        let Value::Object(mut decks) = parsed else {
            return Err(ResolveError::shape(
                pool.category,
                "expected an object keyed by deck id",
            ));
        };

        for (deck_id, deck) in decks.iter_mut() {
            let Value::Object(deck) = deck else {
                return Err(ResolveError::shape(
                    pool.category,
                    format!("deck {deck_id:?} is not an object"),
                ));
            };

            if let Some(back) = deck.get_mut("backImage") {
                self.resolve_in_place(pool, deck_id, back, AssetCategory::DeckBack)
                    .await?;
            }

            match deck.get_mut("cards") {
                None | Some(Value::Null) => {}
                Some(Value::Array(cards)) => {
                    for card in cards.iter_mut() {
                        self.resolve_in_place(pool, deck_id, card, AssetCategory::DeckCard)
                            .await?;
                    }
                }
                Some(_) => {
                    return Err(ResolveError::shape(
                        pool.category,
                        format!("cards of deck {deck_id:?} must be a list"),
                    ));
                }
            }
        }
        Ok(Value::Object(decks))
    }

    async fn resolve_objects(
        &self,
        pool: &mut FilePool<'_>,
        parsed: Value,
    ) -> Result<Value, ResolveError> {
        let Value::Object(mut objects) = parsed else {
            return Err(ResolveError::shape(
                pool.category,
                "expected an object keyed by object id",
            ));
        };

        for (object_id, object) in objects.iter_mut() {
            let Value::Object(object) = object else {
                return Err(ResolveError::shape(
                    pool.category,
                    format!("object {object_id:?} is not an object"),
                ));
            };
            if let Some(image) = object.get_mut("image") {
                self.resolve_in_place(pool, object_id, image, AssetCategory::Object)
                    .await?;
            }
        }
        Ok(Value::Object(objects))
    }

    /// Rewrite a nested file descriptor; anything else is left untouched.
    async fn resolve_in_place(
        &self,
        pool: &mut FilePool<'_>,
        owner_key: &str,
        slot: &mut Value,
        asset_category: AssetCategory,
    ) -> Result<(), ResolveError> {
        if descriptor_type(slot) != Some("file") {
            return Ok(());
        }
        let Value::Object(descriptor) = &*slot else {
            return Ok(());
        };
        let stored = self
            .store_reference(pool, descriptor, asset_category)
            .await?;
        if let Some(resolved) = self.apply_policy(pool, owner_key, descriptor, stored) {
            *slot = resolved;
        }
        Ok(())
    }

    /// Store the referenced upload and return its resolved descriptor.
    async fn store_reference(
        &self,
        pool: &mut FilePool<'_>,
        descriptor: &Map<String, Value>,
        asset_category: AssetCategory,
    ) -> Result<Option<Value>, ResolveError> {
        let Some(position) = pool.locate(descriptor)? else {
            return Ok(None);
        };

        let path = match pool.stored.get(&(position, asset_category)) {
            Some(path) => path.clone(),
            None => {
                let file = &pool.files[position];
                let path = self
                    .assets
                    .store_default(file.contents.clone(), asset_category, self.owner_id, file.hint())
                    .await
                    .map_err(|source| ResolveError::Asset {
                        category: pool.category,
                        source,
                    })?;
                pool.stored.insert((position, asset_category), path.clone());
                path
            }
        };
        Ok(Some(json!({ "type": "file", "path": path })))
    }

    /// Outcome for an entry after lookup: the resolved descriptor, the original
    /// descriptor, or nothing, depending on the category's policy.
    fn apply_policy(
        &self,
        pool: &FilePool<'_>,
        owner_key: &str,
        descriptor: &Map<String, Value>,
        stored: Option<Value>,
    ) -> Option<Value> {
        if stored.is_some() {
            return stored;
        }
        let reference = describe_reference(descriptor);
        match pool.category.missing_file_policy() {
            MissingFilePolicy::Drop => {
                warn!(
                    category = %pool.category,
                    entry = %owner_key,
                    reference = %reference,
                    "No upload matches file reference, dropping entry"
                );
                None
            }
            MissingFilePolicy::Keep => {
                warn!(
                    category = %pool.category,
                    entry = %owner_key,
                    reference = %reference,
                    "No upload matches file reference, keeping descriptor unresolved"
                );
                Some(Value::Object(descriptor.clone()))
            }
        }
    }
}
