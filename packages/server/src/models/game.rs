use chrono::{DateTime, Utc};
use common::storage::AssetStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::asset_url;
use crate::entity::game;

/// Result of a create-or-update submission.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpsertGameResponse {
    #[schema(example = 12)]
    pub game_id: i32,
    #[schema(example = "Game created successfully")]
    pub detail: String,
}

/// Full game projection.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GameResponse {
    #[schema(example = 12)]
    pub game_id: i32,
    #[schema(example = 7)]
    pub user_id: Option<i32>,
    #[schema(example = "Catan")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = 4)]
    pub max_users: Option<i32>,
    /// Public URL of the cover image.
    #[schema(example = "/images/games/7_1718000000_cover.jpg")]
    pub cover_image: Option<String>,
    /// Public URL of the board image.
    pub field_image: Option<String>,
    /// Public URL of the rules document.
    pub rules_file: Option<String>,
    /// Ordered chip descriptors.
    #[schema(value_type = Vec<Object>)]
    pub chips: Value,
    #[schema(value_type = Object)]
    pub cube: Value,
    #[schema(value_type = Object)]
    pub decks: Value,
    #[schema(value_type = Object)]
    pub objects_json: Value,
    pub date_created: DateTime<Utc>,
}

impl GameResponse {
    pub fn from_model(model: game::Model, assets: &AssetStore) -> Self {
        Self {
            game_id: model.id,
            user_id: model.user_id,
            cover_image: asset_url(assets, model.picture.as_deref()),
            field_image: asset_url(assets, model.map.as_deref()),
            rules_file: asset_url(assets, model.rules.as_deref()),
            title: model.name,
            description: model.description,
            max_users: model.max_users,
            chips: model.chips,
            cube: model.cube,
            decks: model.decks,
            objects_json: model.objects_json,
            date_created: model.date_created,
        }
    }
}

/// One entry of a user's game list.
#[derive(Serialize, utoipa::ToSchema)]
pub struct GameSummary {
    #[schema(example = 12)]
    pub id: i32,
    #[schema(example = "Catan")]
    pub name: String,
    pub description: Option<String>,
    pub date_created: DateTime<Utc>,
    pub cover_image: Option<String>,
}

impl GameSummary {
    pub fn from_model(model: game::Model, assets: &AssetStore) -> Self {
        Self {
            id: model.id,
            cover_image: asset_url(assets, model.picture.as_deref()),
            name: model.name,
            description: model.description,
            date_created: model.date_created,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserGamesQuery {
    /// Owner whose games are listed.
    pub user_id: i32,
}
