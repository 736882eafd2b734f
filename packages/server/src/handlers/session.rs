use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::instrument;

use super::game::find_user;
use crate::coords::{ChipCoord, CoordMap};
use crate::entity::room;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::{AppJson, AppQuery};
use crate::ingest::find_game;
use crate::models::session::{CoordUpdate, CoordsResponse, CreateSessionResponse, RoomResponse};
use crate::models::shared::GameUserQuery;
use crate::rooms;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/game/create-session/",
    tag = "Sessions",
    operation_id = "createSession",
    summary = "Open a room from a game",
    description = "Snapshots the game into a new room under a fresh `XXXX-XXXX` code. \
        Later edits to the game do not affect the room.",
    params(GameUserQuery),
    responses(
        (status = 200, description = "Room created", body = CreateSessionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Game or user not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(game_id = query.game_id, user_id = query.user_id))]
pub async fn create_session(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<GameUserQuery>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let game = find_game(&state.db, query.game_id).await?;
    find_user(&state.db, query.user_id).await?;

    let room = rooms::materialize(&state.db, &game).await?;

    Ok(Json(CreateSessionResponse {
        room_id: room.room_id,
        detail: "Room created successfully".into(),
    }))
}

#[utoipa::path(
    get,
    path = "/game/session/{room_id}/",
    tag = "Sessions",
    operation_id = "getSession",
    summary = "Get a room by its code",
    params(("room_id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 404, description = "Room not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = room::Entity::find()
        .filter(room::Column::RoomId.eq(&room_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Session with id {room_id} not found")))?;

    Ok(Json(RoomResponse::from_model(room, &state.assets)))
}

#[utoipa::path(
    get,
    path = "/game/session/{room_id}/chips/coords/",
    tag = "Sessions",
    operation_id = "getChipCoords",
    summary = "Read chip positions for a live session",
    params(("room_id" = String, Path, description = "Session identifier (the room code)")),
    responses(
        (status = 200, description = "Chip positions keyed by chip index; empty if none", body = Object),
    ),
)]
#[instrument(skip(state))]
pub async fn get_chip_coords(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<CoordMap> {
    Json(state.coords.get(&id))
}

#[utoipa::path(
    post,
    path = "/game/session/{room_id}/chips/coords/",
    tag = "Sessions",
    operation_id = "setChipCoords",
    summary = "Report a chip position",
    description = "Last write wins per chip index. Returns every known position in the session.",
    params(("room_id" = String, Path, description = "Session identifier (the room code)")),
    request_body = CoordUpdate,
    responses(
        (status = 200, description = "Position stored", body = CoordsResponse),
        (status = 400, description = "Missing idx, left or bottom (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(idx = payload.idx))]
pub async fn set_chip_coords(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CoordUpdate>,
) -> Result<Json<CoordsResponse>, AppError> {
    if !payload.left.is_finite() || !payload.bottom.is_finite() {
        return Err(AppError::Validation(
            "left and bottom must be finite numbers".into(),
        ));
    }
    let coords = state.coords.set(
        &id,
        payload.idx,
        ChipCoord {
            left: payload.left,
            bottom: payload.bottom,
        },
    );
    Ok(Json(CoordsResponse { ok: true, coords }))
}
