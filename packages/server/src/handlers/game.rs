use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::Field},
};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{game, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppQuery;
use crate::ingest::{GameSubmission, UploadedFile, find_game, upsert_game};
use crate::models::game::{GameResponse, GameSummary, UpsertGameResponse, UserGamesQuery};
use crate::models::shared::{DetailResponse, GameUserQuery};
use crate::state::AppState;

pub fn create_game_body_limit(max_bytes: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_bytes)
}

#[utoipa::path(
    post,
    path = "/game/create-game/",
    tag = "Games",
    operation_id = "createOrUpdateGame",
    summary = "Create a game or update an existing one",
    description = "Multipart submission. Without `game_id` a new game is created and `title` is required. \
        With `game_id` only the fields present in the request change. Metadata blocks \
        (`chips_metadata`, `cubes_metadata`, `decks_metadata`, `game_objects_metadata`) are JSON; \
        their `file` descriptors reference uploads in `chip_files`, `deck_files` and \
        `game_object_files` by `index` or `name`.",
    request_body(content_type = "multipart/form-data", description = "Game fields, media files and metadata blocks"),
    responses(
        (status = 200, description = "Game saved", body = UpsertGameResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "User or game not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_game(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UpsertGameResponse>, AppError> {
    let submission = read_submission(&mut multipart).await?;
    let outcome = upsert_game(&state.db, &state.assets, submission).await?;

    Ok(Json(UpsertGameResponse {
        game_id: outcome.game_id,
        detail: outcome.detail().to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/game/game/{id}/",
    tag = "Games",
    operation_id = "getGame",
    summary = "Get a game by ID",
    params(("id" = i32, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Game details", body = GameResponse),
        (status = 404, description = "Game not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GameResponse>, AppError> {
    let model = find_game(&state.db, id).await?;
    Ok(Json(GameResponse::from_model(model, &state.assets)))
}

#[utoipa::path(
    get,
    path = "/game/games/",
    tag = "Games",
    operation_id = "listUserGames",
    summary = "List a user's games",
    params(UserGamesQuery),
    responses(
        (status = 200, description = "Games owned by the user, oldest first", body = [GameSummary]),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(user_id = query.user_id))]
pub async fn list_games(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserGamesQuery>,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    let games = game::Entity::find()
        .filter(game::Column::UserId.eq(query.user_id))
        .order_by_asc(game::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        games
            .into_iter()
            .map(|g| GameSummary::from_model(g, &state.assets))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/game/delete-game/",
    tag = "Games",
    operation_id = "deleteGame",
    summary = "Delete a game",
    description = "Deletes the game. The requesting `user_id` must exist; ownership is not checked. \
        Stored assets are not reclaimed.",
    params(GameUserQuery),
    responses(
        (status = 200, description = "Game deleted", body = DetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Game or user not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(game_id = query.game_id, user_id = query.user_id))]
pub async fn delete_game(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GameUserQuery>,
) -> Result<Json<DetailResponse>, AppError> {
    let game = find_game(&state.db, query.game_id).await?;
    find_user(&state.db, query.user_id).await?;

    game::Entity::delete_by_id(game.id).exec(&state.db).await?;
    info!(game_id = game.id, "Game deleted");

    Ok(Json(DetailResponse {
        detail: format!("Game with id {} deleted successfully", game.id),
    }))
}

/// Find a user by ID or return 404.
pub(crate) async fn find_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {id} not found")))
}

async fn field_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))
}

async fn field_upload(field: Field<'_>, name: &str) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let contents = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read {name}: {e}")))?;
    Ok(UploadedFile {
        file_name,
        contents,
    })
}

/// A single file part, or `None` when the part has an empty body.
async fn field_file(field: Field<'_>, name: &str) -> Result<Option<UploadedFile>, AppError> {
    let upload = field_upload(field, name).await?;
    Ok((!upload.is_blank()).then_some(upload))
}

/// Blank text parts count as absent for optional numeric fields.
fn parse_optional_int(raw: String, name: &str) -> Result<Option<i32>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{name} must be an integer")))
}

async fn read_submission(multipart: &mut Multipart) -> Result<GameSubmission, AppError> {
    let mut submission = GameSubmission::default();
    let mut user_id: Option<i32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "user_id" => user_id = parse_optional_int(field_text(field, &name).await?, &name)?,
            "game_id" => {
                submission.game_id = parse_optional_int(field_text(field, &name).await?, &name)?
            }
            "max_players" => {
                submission.max_players =
                    parse_optional_int(field_text(field, &name).await?, &name)?
            }
            "title" => submission.title = Some(field_text(field, &name).await?),
            "description" => submission.description = Some(field_text(field, &name).await?),
            "chips_metadata" => submission.chips_metadata = Some(field_text(field, &name).await?),
            "cubes_metadata" => submission.cubes_metadata = Some(field_text(field, &name).await?),
            "decks_metadata" => submission.decks_metadata = Some(field_text(field, &name).await?),
            "game_objects_metadata" => {
                submission.game_objects_metadata = Some(field_text(field, &name).await?)
            }
            "cover_image" => submission.cover_image = field_file(field, &name).await?,
            "field_image" => submission.field_image = field_file(field, &name).await?,
            "rules_file" => submission.rules_file = field_file(field, &name).await?,
            // Repeated parts keep blanks so descriptor indexes stay positional.
            "chip_files" => submission.chip_files.push(field_upload(field, &name).await?),
            "deck_files" => submission.deck_files.push(field_upload(field, &name).await?),
            "game_object_files" => submission
                .game_object_files
                .push(field_upload(field, &name).await?),
            _ => {} // Ignore unknown fields.
        }
    }

    submission.user_id = user_id.ok_or_else(|| {
        AppError::Validation("Missing required fields: user_id or title".into())
    })?;
    Ok(submission)
}
