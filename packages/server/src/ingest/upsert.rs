use chrono::Utc;
use common::storage::{AssetCategory, AssetError, AssetStore};
use sea_orm::*;
use serde_json::Value;
use tracing::{info, instrument};

use super::resolver::{MetadataCategory, MetadataResolver, UploadedFile};
use crate::entity::{game, user};
use crate::error::AppError;

/// Everything a create-or-update request may carry. `None` means "not sent".
#[derive(Debug, Default)]
pub struct GameSubmission {
    pub user_id: i32,
    pub game_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub max_players: Option<i32>,
    pub cover_image: Option<UploadedFile>,
    pub field_image: Option<UploadedFile>,
    pub rules_file: Option<UploadedFile>,
    pub chips_metadata: Option<String>,
    pub chip_files: Vec<UploadedFile>,
    pub cubes_metadata: Option<String>,
    pub decks_metadata: Option<String>,
    pub deck_files: Vec<UploadedFile>,
    pub game_objects_metadata: Option<String>,
    pub game_object_files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub game_id: i32,
    pub created: bool,
}

impl UpsertOutcome {
    pub fn detail(&self) -> &'static str {
        if self.created {
            "Game created successfully"
        } else {
            "Game updated successfully"
        }
    }
}

/// Media and metadata after storage, ready to be written.
#[derive(Default)]
struct ResolvedContent {
    picture: Option<String>,
    map: Option<String>,
    rules: Option<String>,
    chips: Option<Value>,
    cube: Option<Value>,
    decks: Option<Value>,
    objects: Option<Value>,
}

const MAX_TITLE_CHARS: usize = 255;

fn validate_title(title: Option<&str>, creating: bool) -> Result<(), AppError> {
    match title.map(str::trim) {
        None if creating => Err(AppError::Validation(
            "Missing required fields: user_id or title".into(),
        )),
        None => Ok(()),
        Some("") => Err(AppError::Validation(
            "Missing required fields: user_id or title".into(),
        )),
        Some(t) if t.chars().count() > MAX_TITLE_CHARS => Err(AppError::Validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        ))),
        Some(_) => Ok(()),
    }
}

fn validate_max_players(max_players: Option<i32>) -> Result<(), AppError> {
    match max_players {
        Some(n) if n < 1 => Err(AppError::Validation(
            "max_players must be at least 1".into(),
        )),
        _ => Ok(()),
    }
}

async fn store_media(
    assets: &AssetStore,
    file: Option<UploadedFile>,
    category: AssetCategory,
    owner_id: i32,
    field: &str,
) -> Result<Option<String>, AppError> {
    let Some(file) = file else {
        return Ok(None);
    };
    let hint = file.file_name.as_deref().unwrap_or(field);
    let path = assets
        .store_default(file.contents, category, owner_id, hint)
        .await
        .map_err(|e| match e {
            AssetError::Decode(detail) => {
                AppError::Validation(format!("Invalid {field}: {detail}"))
            }
            other => AppError::from(other),
        })?;
    Ok(Some(path))
}

async fn resolve_block(
    resolver: &MetadataResolver<'_>,
    category: MetadataCategory,
    raw: Option<&str>,
    files: &[UploadedFile],
) -> Result<Option<Value>, AppError> {
    match raw {
        Some(raw) => Ok(Some(resolver.resolve(category, raw, files).await?)),
        None => Ok(None),
    }
}

async fn resolve_content(
    assets: &AssetStore,
    submission: &mut GameSubmission,
) -> Result<ResolvedContent, AppError> {
    let owner = submission.user_id;
    let picture = store_media(
        assets,
        submission.cover_image.take(),
        AssetCategory::Cover,
        owner,
        "cover_image",
    )
    .await?;
    let map = store_media(
        assets,
        submission.field_image.take(),
        AssetCategory::Field,
        owner,
        "field_image",
    )
    .await?;
    let rules = store_media(
        assets,
        submission.rules_file.take(),
        AssetCategory::Rules,
        owner,
        "rules_file",
    )
    .await?;

    let resolver = MetadataResolver::new(assets, owner);
    let chips = resolve_block(
        &resolver,
        MetadataCategory::Chips,
        submission.chips_metadata.as_deref(),
        &submission.chip_files,
    )
    .await?;
    let cube = resolve_block(
        &resolver,
        MetadataCategory::Cube,
        submission.cubes_metadata.as_deref(),
        &[],
    )
    .await?;
    let decks = resolve_block(
        &resolver,
        MetadataCategory::Decks,
        submission.decks_metadata.as_deref(),
        &submission.deck_files,
    )
    .await?;
    let objects = resolve_block(
        &resolver,
        MetadataCategory::Objects,
        submission.game_objects_metadata.as_deref(),
        &submission.game_object_files,
    )
    .await?;

    Ok(ResolvedContent {
        picture,
        map,
        rules,
        chips,
        cube,
        decks,
        objects,
    })
}

/// Create a game, or merge into an existing one when `game_id` is given.
///
/// Only fields present in the submission change on update. Files are stored
/// before the database transaction opens; if a later step fails they are left
/// in place.
#[instrument(skip(db, assets, submission), fields(user_id = submission.user_id, game_id = ?submission.game_id))]
pub async fn upsert_game(
    db: &DatabaseConnection,
    assets: &AssetStore,
    mut submission: GameSubmission,
) -> Result<UpsertOutcome, AppError> {
    let creating = submission.game_id.is_none();
    validate_title(submission.title.as_deref(), creating)?;
    validate_max_players(submission.max_players)?;

    user::Entity::find_by_id(submission.user_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("User with id {} not found", submission.user_id))
        })?;

    if let Some(id) = submission.game_id {
        find_game(db, id).await?;
    }

    let content = resolve_content(assets, &mut submission).await?;
    let title = submission.title.map(|t| t.trim().to_string());

    let txn = db.begin().await?;
    let outcome = match submission.game_id {
        None => {
            let model = game::ActiveModel {
                name: Set(title.unwrap_or_default()),
                user_id: Set(Some(submission.user_id)),
                description: Set(submission.description),
                max_users: Set(submission.max_players),
                picture: Set(content.picture),
                map: Set(content.map),
                rules: Set(content.rules),
                chips: Set(content
                    .chips
                    .unwrap_or_else(|| MetadataCategory::Chips.empty_value())),
                cube: Set(content
                    .cube
                    .unwrap_or_else(|| MetadataCategory::Cube.empty_value())),
                decks: Set(content
                    .decks
                    .unwrap_or_else(|| MetadataCategory::Decks.empty_value())),
                objects_json: Set(content
                    .objects
                    .unwrap_or_else(|| MetadataCategory::Objects.empty_value())),
                date_created: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            UpsertOutcome {
                game_id: model.id,
                created: true,
            }
        }
        Some(id) => {
            let existing = find_game(&txn, id).await?;
            let mut active: game::ActiveModel = existing.into();

            if let Some(title) = title {
                active.name = Set(title);
            }
            if let Some(description) = submission.description {
                active.description = Set(Some(description));
            }
            if let Some(max_players) = submission.max_players {
                active.max_users = Set(Some(max_players));
            }
            if let Some(picture) = content.picture {
                active.picture = Set(Some(picture));
            }
            if let Some(map) = content.map {
                active.map = Set(Some(map));
            }
            if let Some(rules) = content.rules {
                active.rules = Set(Some(rules));
            }
            if let Some(chips) = content.chips {
                active.chips = Set(chips);
            }
            if let Some(cube) = content.cube {
                active.cube = Set(cube);
            }
            if let Some(decks) = content.decks {
                active.decks = Set(decks);
            }
            if let Some(objects) = content.objects {
                active.objects_json = Set(objects);
            }

            if active.is_changed() {
                active.update(&txn).await?;
            }
            UpsertOutcome {
                game_id: id,
                created: false,
            }
        }
    };
    txn.commit().await?;

    info!(
        game_id = outcome.game_id,
        created = outcome.created,
        "Game saved"
    );
    Ok(outcome)
}

/// Find a game by ID or return 404.
pub async fn find_game<C: ConnectionTrait>(db: &C, id: i32) -> Result<game::Model, AppError> {
    game::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Game with id {id} not found")))
}
