use axum::{debug_handler, extract::{Path, Query, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, conversation::ConversationRef, AppResult};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PollQuery {
    last_id: Option<i64>,
}

#[derive(Deserialize)]
pub(crate) struct SendMessageForm {
    text: String,
}

/// Clients poll with the last id they hold and get only what came after it.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn list_messages(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path((kind, conversation_id)): Path<(String, i64)>,
    Query(PollQuery { last_id }): Query<PollQuery>,
) -> AppResult<Json<Value>> {
    let conversation = ConversationRef::parse(&kind, conversation_id)?;
    let messages = super::list_since(&db_pool, conversation, user_id, last_id).await?;
    Ok(Json(json!({ "messages": messages })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_message(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path((kind, conversation_id)): Path<(String, i64)>,
    Json(SendMessageForm { text }): Json<SendMessageForm>,
) -> AppResult<Json<Value>> {
    let conversation = ConversationRef::parse(&kind, conversation_id)?;
    let message = super::append_message(&db_pool, conversation, user_id, &text).await?;
    Ok(Json(json!({ "success": true, "message": message })))
}
