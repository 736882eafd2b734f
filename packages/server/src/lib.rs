pub mod config;
pub mod coords;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod ingest;
pub mod mail;
pub mod models;
pub mod rooms;
pub mod routes;
pub mod state;
pub mod utils;

use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use common::config::StorageBackend;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GameOrbit API",
        version = "1.0.0",
        description = "Board game authoring and live session backend"
    ),
    paths(
        handlers::game::create_game,
        handlers::game::get_game,
        handlers::game::list_games,
        handlers::game::delete_game,
        handlers::session::create_session,
        handlers::session::get_session,
        handlers::session::get_chip_coords,
        handlers::session::set_chip_coords,
        handlers::auth::signup,
        handlers::auth::verify_email,
        handlers::auth::resend_verification,
        handlers::auth::login,
        handlers::auth::current_user,
        handlers::info::list_tariffs,
        handlers::info::list_main_page_games,
        handlers::feedback::send_feedback,
        handlers::health::health,
    ),
    tags(
        (name = "Games", description = "Game authoring"),
        (name = "Sessions", description = "Rooms and live chip positions"),
        (name = "Auth", description = "Accounts and authentication"),
        (name = "Info", description = "Pricing and landing-page content"),
        (name = "Feedback", description = "Contact form"),
        (name = "Health", description = "Service status"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors_layer(&state.config.server.cors);
    let storage = state.config.storage.clone();

    let mut router = routes::api_routes(&state.config).with_state(state);

    // Stored paths resolve under the public base URL; serve them when they live on disk.
    if storage.backend == StorageBackend::Filesystem
        && storage.public_base_url.starts_with('/')
        && storage.public_base_url.len() > 1
    {
        router = router.nest_service(
            storage.public_base_url.trim_end_matches('/'),
            ServeDir::new(&storage.root),
        );
    }

    let api = ApiDoc::openapi();
    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
