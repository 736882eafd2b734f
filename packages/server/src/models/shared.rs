use serde::{Deserialize, Serialize};

/// Plain acknowledgement body.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct DetailResponse {
    #[schema(example = "Game with id 3 deleted successfully")]
    pub detail: String,
}

/// Plain acknowledgement body used by the account endpoints.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Verification code sent to email")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Query pair used by endpoints that act on a game on behalf of a user.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GameUserQuery {
    /// Target game ID.
    pub game_id: i32,
    /// Requesting user ID; must exist.
    pub user_id: i32,
}

/// Resolve an optional stored path to a public URL.
pub fn asset_url(assets: &common::storage::AssetStore, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| assets.url_for(p))
}
