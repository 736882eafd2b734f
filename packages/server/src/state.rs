use std::sync::Arc;

use common::storage::AssetStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::coords::CoordRegistry;
use crate::mail::Mailer;
use crate::utils::throttle::LoginThrottle;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub assets: AssetStore,
    pub coords: Arc<CoordRegistry>,
    pub mailer: Arc<dyn Mailer>,
    pub login_throttle: Arc<LoginThrottle>,
}
