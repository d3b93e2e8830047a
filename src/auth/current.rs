use axum::{debug_handler, extract::{FromRequestParts, State}, http::request::Parts, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{profiles, session::USER_ID, AppError, AppResult, UserId};

/// The signed-in user, pulled from the session on every request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))?;

        match session.get::<UserId>(USER_ID).await? {
            Some(user_id) => Ok(CurrentUser(user_id)),
            None => Err(AppError::Unauthorized),
        }
    }
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn me(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Value>> {
    let Some((username,)): Option<(String,)> = sqlx::query_as("SELECT username FROM users WHERE id=?")
        .bind(user_id)
        .fetch_optional(&db_pool)
        .await?
    else {
        return Err(AppError::Unauthorized);
    };

    let profile = profiles::get_or_create_profile(&db_pool, user_id).await?;

    Ok(Json(json!({
        "userId": user_id,
        "username": username,
        "profileComplete": profile.is_complete(),
    })))
}
