use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::StorageConfig;
use common::config::StorageBackend;
use common::storage::{AssetStore, filesystem::FilesystemObjectStore};
use image::{ImageFormat, RgbImage};
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Schema, Set,
};
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, MailConfig, ServerConfig, SessionConfig,
};
use server::coords::CoordRegistry;
use server::entity::{feature, game, main_page_game, room, tariff, user};
use server::mail::{MailError, Mailer};
use server::state::AppState;
use server::utils::throttle::LoginThrottle;

pub const MAX_LOGIN_ATTEMPTS: u32 = 10;

pub mod routes {
    pub const CREATE_GAME: &str = "/game/create-game/";
    pub const GAMES: &str = "/game/games/";
    pub const SIGNUP: &str = "/auth/signup/";
    pub const VERIFY_EMAIL: &str = "/auth/verify-email/";
    pub const RESEND_VERIFICATION: &str = "/auth/resend-verification/";
    pub const LOGIN: &str = "/auth/login/";
    pub const CURRENT_USER: &str = "/auth/user/";
    pub const HEALTH: &str = "/health";
    pub const TARIFFS: &str = "/info/tariffs/";
    pub const MAIN_PAGE_GAMES: &str = "/info/main-page-games/";
    pub const SEND_FEEDBACK: &str = "/email/send-feedback/";

    pub fn game(id: i32) -> String {
        format!("/game/game/{id}/")
    }

    pub fn user_games(user_id: i32) -> String {
        format!("/game/games/?user_id={user_id}")
    }

    pub fn delete_game(game_id: i32, user_id: i32) -> String {
        format!("/game/delete-game/?game_id={game_id}&user_id={user_id}")
    }

    pub fn create_session(game_id: i32, user_id: i32) -> String {
        format!("/game/create-session/?game_id={game_id}&user_id={user_id}")
    }

    pub fn session(room_id: &str) -> String {
        format!("/game/session/{room_id}/")
    }

    pub fn chip_coords(session_id: &str) -> String {
        format!("/game/session/{session_id}/chips/coords/")
    }
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub mailbox: Arc<Mailbox>,
    _assets_dir: TempDir,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Records outgoing mail; fails every send while `offline` is set.
#[derive(Default)]
pub struct Mailbox {
    sent: Mutex<Vec<SentMail>>,
    offline: Mutex<bool>,
}

impl Mailbox {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }
}

#[async_trait]
impl Mailer for Mailbox {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        if *self.offline.lock().unwrap() {
            return Err(MailError::Transport("connection refused".into()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct TestResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub text: String,
    pub body: Value,
}

async fn in_memory_db() -> DatabaseConnection {
    // One connection: every pooled connection to `sqlite::memory:` is its own database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to open in-memory database");

    let schema = Schema::new(DbBackend::Sqlite);
    for stmt in [
        schema.create_table_from_entity(tariff::Entity),
        schema.create_table_from_entity(feature::Entity),
        schema.create_table_from_entity(main_page_game::Entity),
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(game::Entity),
        schema.create_table_from_entity(room::Entity),
    ] {
        db.execute(&stmt).await.expect("Failed to create table");
    }
    db
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db = in_memory_db().await;
        let assets_dir = TempDir::new().expect("Failed to create asset dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
                max_upload_bytes: 32 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_days: 1,
                remember_ttl_days: 30,
                max_login_attempts: MAX_LOGIN_ATTEMPTS,
                login_lockout_secs: 1800,
                verification_code_ttl_mins: 30,
            },
            storage: StorageConfig {
                backend: StorageBackend::Filesystem,
                root: assets_dir.path().to_path_buf(),
                public_base_url: "/images".to_string(),
                s3: None,
            },
            session: SessionConfig::default(),
            mail: MailConfig::default(),
        };

        let backend = FilesystemObjectStore::new(
            app_config.storage.root.clone(),
            app_config.storage.public_base_url.clone(),
        )
        .await
        .expect("Failed to open asset store");

        let mailbox = Arc::new(Mailbox::default());
        let state = AppState {
            db: db.clone(),
            assets: AssetStore::new(Arc::new(backend)),
            coords: Arc::new(CoordRegistry::new()),
            mailer: mailbox.clone(),
            login_throttle: Arc::new(LoginThrottle::new(
                app_config.auth.max_login_attempts,
                Duration::from_secs(app_config.auth.login_lockout_secs),
            )),
            config: app_config,
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            mailbox,
            _assets_dir: assets_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_bytes(&self, path: &str) -> (u16, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");
        let status = res.status().as_u16();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, bytes)
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Insert a verified user with a fixed ID.
    pub async fn create_user(&self, id: i32) -> i32 {
        let now = Utc::now();
        user::ActiveModel {
            id: Set(id),
            name: Set(format!("player{id}")),
            email: Set(format!("player{id}@example.com")),
            password: Set("unused".to_string()),
            phone: Set(None),
            is_verified: Set(true),
            verification_code: Set(None),
            verification_code_created: Set(None),
            role: Set(user::DEFAULT_ROLE.to_string()),
            active: Set(true),
            date_joined: Set(now),
            subscription_id: Set(None),
            end_date: Set(None),
            free_trial: Set(false),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert user")
        .id
    }

    /// Create a game with just a title and return its ID.
    pub async fn create_game(&self, user_id: i32, title: &str) -> i32 {
        let form = Form::new()
            .text("user_id", user_id.to_string())
            .text("title", title.to_string());
        let res = self.post_form(routes::CREATE_GAME, form).await;
        assert_eq!(res.status, 200, "Game creation failed: {}", res.text);
        res.game_id()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn game_id(&self) -> i32 {
        self.body["game_id"]
            .as_i64()
            .expect("response body should contain 'game_id'") as i32
    }
}

/// PNG of the given size, encoded in memory.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([20, 120, 220]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode PNG");
    buf.into_inner()
}

pub fn file_part(bytes: Vec<u8>, file_name: &str) -> Part {
    let mime = if file_name.ends_with(".pdf") {
        "application/pdf"
    } else {
        "image/png"
    };
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime")
}

/// `XXXX-XXXX` with alphanumeric segments.
pub fn looks_like_room_code(code: &str) -> bool {
    match code.split_once('-') {
        Some((a, b)) => [a, b]
            .iter()
            .all(|s| s.len() == 4 && s.chars().all(|c| c.is_ascii_alphanumeric())),
        None => false,
    }
}
