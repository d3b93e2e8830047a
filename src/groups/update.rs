use axum::{debug_handler, extract::{Path, State}, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{auth::CurrentUser, AppResult, UserId};

use super::GroupField;

#[derive(Deserialize)]
pub(crate) struct FieldForm {
    value: String,
}

async fn update(
    db_pool: &SqlitePool,
    group_id: i64,
    field: GroupField,
    value: &str,
    user_id: UserId,
) -> AppResult<Json<Value>> {
    let value = super::update_group_field(db_pool, group_id, field, value, user_id).await?;
    Ok(Json(json!({ "success": true, "value": value })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_name(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(group_id): Path<i64>,
    Json(FieldForm { value }): Json<FieldForm>,
) -> AppResult<Json<Value>> {
    update(&db_pool, group_id, GroupField::Name, &value, user_id).await
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_description(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(group_id): Path<i64>,
    Json(FieldForm { value }): Json<FieldForm>,
) -> AppResult<Json<Value>> {
    update(&db_pool, group_id, GroupField::Description, &value, user_id).await
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn update_icon(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(group_id): Path<i64>,
    Json(FieldForm { value }): Json<FieldForm>,
) -> AppResult<Json<Value>> {
    update(&db_pool, group_id, GroupField::Icon, &value, user_id).await
}
