pub mod access;
pub mod appresult;
pub mod auth;
pub mod chats;
pub mod config;
pub mod conversation;
pub mod db;
pub mod favorites;
pub mod feed;
pub mod groups;
pub mod messages;
pub mod profiles;
pub mod session;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};
pub use config::Config;

/// Identity-provider user id.
pub type UserId = i64;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
}

impl AppState {
    /// Connects and brings the schema up to date.
    pub async fn init(config: Config) -> anyhow::Result<Self> {
        let db_pool = db::connect(&config).await?;
        db::migrate(&db_pool).await?;
        Ok(Self { db_pool, config })
    }
}

pub fn app(app_state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(app_state.config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            app_state.config.session_idle_minutes,
        )));

    Router::new()
        .merge(auth::router())
        .nest("/profile", profiles::router())
        .nest("/chats", chats::router())
        .nest("/groups", groups::router())
        .nest("/conversations", feed::router().merge(messages::router()))
        .nest("/favorites", favorites::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
