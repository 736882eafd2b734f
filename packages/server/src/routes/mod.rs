use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/game", game_routes(config))
        .nest("/auth", auth_routes())
        .nest("/info", info_routes())
        .route(
            "/email/send-feedback/",
            post(handlers::feedback::send_feedback),
        )
        .route("/health", get(handlers::health::health))
}

fn game_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/create-game/",
            post(handlers::game::create_game).layer(handlers::game::create_game_body_limit(
                config.server.max_upload_bytes,
            )),
        )
        .route("/game/{id}/", get(handlers::game::get_game))
        .route("/games/", get(handlers::game::list_games))
        .route("/delete-game/", get(handlers::game::delete_game))
        .route("/create-session/", get(handlers::session::create_session))
        .route("/session/{room_id}/", get(handlers::session::get_session))
        .route(
            "/session/{room_id}/chips/coords/",
            get(handlers::session::get_chip_coords).post(handlers::session::set_chip_coords),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup/", post(handlers::auth::signup))
        .route("/verify-email/", post(handlers::auth::verify_email))
        .route(
            "/resend-verification/",
            post(handlers::auth::resend_verification),
        )
        .route("/login/", post(handlers::auth::login))
        .route("/user/", get(handlers::auth::current_user))
}

fn info_routes() -> Router<AppState> {
    Router::new()
        .route("/tariffs/", get(handlers::info::list_tariffs))
        .route("/main-page-games/", get(handlers::info::list_main_page_games))
}
