use common::storage::AssetStore;
use serde::{Deserialize, Serialize};

use crate::entity::{feature, main_page_game, tariff};
use crate::models::shared::asset_url;

/// A subscription plan with the names of its features.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct TariffResponse {
    #[schema(example = 2)]
    pub id: i32,
    #[schema(example = "Pro")]
    pub name: String,
    #[schema(example = 4990)]
    pub price: i32,
    /// Feature names, in insertion order.
    pub features: Vec<String>,
}

impl TariffResponse {
    pub fn new(tariff: tariff::Model, features: Vec<feature::Model>) -> Self {
        Self {
            id: tariff.id,
            name: tariff.name,
            price: tariff.price,
            features: features.into_iter().map(|f| f.name).collect(),
        }
    }
}

/// Landing-page showcase entry.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MainPageGameResponse {
    pub id: i32,
    /// Position on the page, ascending.
    pub order: i32,
    #[schema(example = "Catan")]
    pub name: String,
    pub author: String,
    pub author_link: Option<String>,
    pub description: String,
    /// Public URL of the picture, or null.
    pub picture: Option<String>,
}

impl MainPageGameResponse {
    pub fn from_model(game: main_page_game::Model, assets: &AssetStore) -> Self {
        Self {
            picture: asset_url(assets, game.picture.as_deref()),
            id: game.id,
            order: game.order,
            name: game.name,
            author: game.author,
            author_link: game.author_link,
            description: game.description,
        }
    }
}
