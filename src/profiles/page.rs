use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, AppError, AppResult};

use super::{ProfileUpdate, MAX_FIELD_LEN};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<Value>> {
    let profile = super::get_or_create_profile(&db_pool, user_id).await?;
    let complete = profile.is_complete();
    Ok(Json(json!({ "profile": profile, "complete": complete })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_profile(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<Value>> {
    let profile = super::update_profile(&db_pool, user_id, update).await?;
    let complete = profile.is_complete();
    Ok(Json(json!({ "profile": profile, "complete": complete })))
}

#[derive(Deserialize)]
pub(crate) struct AvatarForm {
    avatar: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_avatar(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(AvatarForm { avatar }): Json<AvatarForm>,
) -> AppResult<Json<Value>> {
    let avatar = avatar.trim();
    if avatar.is_empty() || avatar.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::validation("pick an avatar"));
    }

    let update = ProfileUpdate { avatar: Some(avatar.to_owned()), ..Default::default() };
    let profile = super::update_profile(&db_pool, user_id, update).await?;
    Ok(Json(json!({ "success": true, "avatar": profile.avatar })))
}

#[derive(Deserialize)]
pub(crate) struct ColorForm {
    color: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_message_color(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(ColorForm { color }): Json<ColorForm>,
) -> AppResult<Json<Value>> {
    super::update_message_color(&db_pool, user_id, &color).await?;
    Ok(Json(json!({ "success": true, "color": color })))
}
