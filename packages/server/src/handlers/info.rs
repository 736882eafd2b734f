use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{feature, main_page_game, tariff};
use crate::error::AppError;
use crate::models::info::{MainPageGameResponse, TariffResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/info/tariffs/",
    tag = "Info",
    operation_id = "listTariffs",
    summary = "List subscription tariffs",
    responses(
        (status = 200, description = "Every tariff with its feature names, by ID", body = [TariffResponse]),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tariffs(
    State(state): State<AppState>,
) -> Result<Json<Vec<TariffResponse>>, AppError> {
    let tariffs = tariff::Entity::find()
        .find_with_related(feature::Entity)
        .order_by_asc(tariff::Column::Id)
        .order_by_asc(feature::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        tariffs
            .into_iter()
            .map(|(t, features)| TariffResponse::new(t, features))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/info/main-page-games/",
    tag = "Info",
    operation_id = "listMainPageGames",
    summary = "List landing-page showcase games",
    responses(
        (status = 200, description = "Showcase entries by ascending order", body = [MainPageGameResponse]),
    ),
)]
#[instrument(skip(state))]
pub async fn list_main_page_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<MainPageGameResponse>>, AppError> {
    let games = main_page_game::Entity::find()
        .order_by_asc(main_page_game::Column::Order)
        .order_by_asc(main_page_game::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        games
            .into_iter()
            .map(|g| MainPageGameResponse::from_model(g, &state.assets))
            .collect(),
    ))
}
