use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{profiles, session::USER_ID, AppError, AppResult, UserId};

use super::{authenticate, create_user};

#[derive(Deserialize)]
pub(crate) struct Credentials {
    username: String,
    password: String,
}

async fn sign_in(session: &Session, user_id: UserId, username: &str) -> AppResult<Json<Value>> {
    session.cycle_id().await?;
    session.insert(USER_ID, user_id).await?;

    tracing::info!(user_id, "signed in");
    Ok(Json(json!({ "userId": user_id, "username": username })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(Credentials { username, password }): Json<Credentials>,
) -> AppResult<Json<Value>> {
    let username = username.trim();
    let user_id = create_user(&db_pool, username, &password).await?;
    profiles::get_or_create_profile(&db_pool, user_id).await?;

    sign_in(&session, user_id, username).await
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(Credentials { username, password }): Json<Credentials>,
) -> AppResult<Json<Value>> {
    let username = username.trim();
    let Some(user_id) = authenticate(&db_pool, username, &password).await? else {
        return Err(AppError::Unauthorized);
    };

    sign_in(&session, user_id, username).await
}
