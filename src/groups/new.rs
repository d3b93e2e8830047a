use axum::{debug_handler, extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, AppResult};

#[derive(Deserialize)]
pub(crate) struct NewGroupForm {
    name: String,
    #[serde(default)]
    description: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_group(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(NewGroupForm { name, description }): Json<NewGroupForm>,
) -> AppResult<Json<Value>> {
    let group = super::create_group(&db_pool, user_id, &name, &description).await?;
    Ok(Json(json!({ "group": group })))
}
