use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, AppResult, UserId};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartChatForm {
    user_id: UserId,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn start_chat(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(StartChatForm { user_id: peer_id }): Json<StartChatForm>,
) -> AppResult<Json<Value>> {
    let (chat, created) = super::get_or_create_private_chat(&db_pool, user_id, peer_id).await?;
    Ok(Json(json!({ "chat": chat, "created": created })))
}
