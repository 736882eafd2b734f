use chrono::{DateTime, Utc};
use common::storage::AssetStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::asset_url;
use crate::coords::CoordMap;
use crate::entity::room;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateSessionResponse {
    /// Shareable room code.
    #[schema(example = "aZ3k-9QxB")]
    pub room_id: String,
    #[schema(example = "Room created successfully")]
    pub detail: String,
}

/// Full room projection.
#[derive(Serialize, utoipa::ToSchema)]
pub struct RoomResponse {
    #[schema(example = "aZ3k-9QxB")]
    pub room_id: String,
    /// Game the room was created from.
    pub game_id: i32,
    #[schema(example = "Catan")]
    pub name: String,
    pub description: Option<String>,
    pub max_users: Option<i32>,
    pub picture: Option<String>,
    pub map: Option<String>,
    pub rules: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub chips: Value,
    #[schema(value_type = Object)]
    pub cube: Value,
    #[schema(value_type = Object)]
    pub decks: Value,
    #[schema(value_type = Object)]
    pub objects_json: Value,
    pub user_id: Option<i32>,
    pub date_created: DateTime<Utc>,
}

impl RoomResponse {
    pub fn from_model(model: room::Model, assets: &AssetStore) -> Self {
        Self {
            picture: asset_url(assets, model.picture.as_deref()),
            map: asset_url(assets, model.map.as_deref()),
            rules: asset_url(assets, model.rules.as_deref()),
            room_id: model.room_id,
            game_id: model.game_id,
            name: model.name,
            description: model.description,
            max_users: model.max_users,
            chips: model.chips,
            cube: model.cube,
            decks: model.decks,
            objects_json: model.objects_json,
            user_id: model.user_id,
            date_created: model.date_created,
        }
    }
}

/// A single chip position report.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CoordUpdate {
    #[schema(example = 3)]
    pub idx: i64,
    #[schema(example = 120.5)]
    pub left: f64,
    #[schema(example = 48.0)]
    pub bottom: f64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CoordsResponse {
    pub ok: bool,
    /// All known positions in the session, keyed by chip index.
    #[schema(value_type = Object)]
    pub coords: CoordMap,
}
