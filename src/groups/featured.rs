use axum::{debug_handler, extract::{Path, Query, State}, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{access, auth::CurrentUser, AppResult, UserId};

const FEATURED_LIMIT: i64 = 50;

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub creator_id: UserId,
    pub member_count: i64,
    pub is_member: bool,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
}

/// Groups by popularity, optionally filtered by a case-insensitive name match.
pub async fn featured(
    db_pool: &SqlitePool,
    viewer: UserId,
    q: Option<&str>,
) -> AppResult<Vec<GroupSummary>> {
    let q = q.map(str::trim).filter(|q| !q.is_empty());

    Ok(sqlx::query_as(
        "SELECT g.id, g.name, g.description, g.icon, g.creator_id, \
            (SELECT COUNT(*) FROM group_members m WHERE m.group_id=g.id AND m.user_id<>g.creator_id) + 1 \
                AS member_count, \
            (g.creator_id=? OR EXISTS(SELECT 1 FROM group_members m WHERE m.group_id=g.id AND m.user_id=?)) \
                AS is_member \
         FROM groups g \
         WHERE ? IS NULL OR instr(lower(g.name), lower(?)) > 0 \
         ORDER BY member_count DESC, g.id \
         LIMIT ?",
    )
    .bind(viewer)
    .bind(viewer)
    .bind(q)
    .bind(q)
    .bind(FEATURED_LIMIT)
    .fetch_all(db_pool)
    .await?)
}

pub async fn members(db_pool: &SqlitePool, group_id: i64, creator_id: UserId) -> AppResult<Vec<MemberView>> {
    Ok(sqlx::query_as(
        "SELECT u.id AS user_id, u.username, \
            COALESCE(NULLIF(p.display_name,''), u.username) AS display_name, \
            COALESCE(p.avatar,'default') AS avatar \
         FROM users u LEFT JOIN profiles p ON p.user_id=u.id \
         WHERE u.id=? OR u.id IN (SELECT user_id FROM group_members WHERE group_id=?) \
         ORDER BY u.id",
    )
    .bind(creator_id)
    .bind(group_id)
    .fetch_all(db_pool)
    .await?)
}

#[derive(Deserialize)]
pub(crate) struct FeaturedQuery {
    q: Option<String>,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn featured_groups(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Query(FeaturedQuery { q }): Query<FeaturedQuery>,
) -> AppResult<Json<Value>> {
    let groups = featured(&db_pool, user_id, q.as_deref()).await?;
    Ok(Json(json!({ "groups": groups })))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn group_details(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Path(group_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let group = super::get_group(&db_pool, group_id).await?;
    let access = access::group_access(&db_pool, group_id, user_id).await?;
    let members = members(&db_pool, group_id, group.creator_id).await?;

    Ok(Json(json!({
        "group": group,
        "members": members,
        "memberCount": members.len(),
        "isMember": access.is_member(user_id),
        "isCreator": access.is_creator(user_id),
    })))
}
