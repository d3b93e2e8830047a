use axum::{debug_handler, extract::{Path, State}, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, AppResult};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn delete_chat(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(chat_id): Path<i64>,
) -> AppResult<Json<Value>> {
    super::delete_chat(&db_pool, chat_id, user_id).await?;
    Ok(Json(json!({ "success": true })))
}
