//! Group conversations: creation, settings, membership lifecycle.

mod delete;
mod featured;
mod members;
mod new;
mod update;

use axum::{routing::{get, post}, Router};
use serde::Serialize;
use sqlx::SqlitePool;
use unicode_segmentation::UnicodeSegmentation;

use crate::{access, db, AppError, AppResult, AppState, UserId};

pub const DEFAULT_ICON: &str = "👥";
const MAX_NAME_LEN: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(new::create_group))
        .route("/featured", get(featured::featured_groups))
        .route("/{group_id}", get(featured::group_details))
        .route("/{group_id}/name", post(update::update_name))
        .route("/{group_id}/description", post(update::update_description))
        .route("/{group_id}/icon", post(update::update_icon))
        .route("/{group_id}/delete", post(delete::delete_group))
        .route("/{group_id}/leave", post(members::leave_group))
        .route("/{group_id}/join", post(members::join_group))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub creator_id: UserId,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Name,
    Description,
    Icon,
}

impl GroupField {
    fn column(self) -> &'static str {
        match self {
            GroupField::Name => "name",
            GroupField::Description => "description",
            GroupField::Icon => "icon",
        }
    }

    /// Normalises `value` for storage or rejects it.
    pub fn validate(self, value: &str) -> AppResult<String> {
        match self {
            GroupField::Name => validate_name(value),
            GroupField::Description => Ok(value.trim().to_owned()),
            GroupField::Icon => validate_icon(value),
        }
    }
}

pub fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("group name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "group name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

/// One grapheme, and it has to carry a non-ASCII symbol (an emoji, not "a" or "!").
pub fn validate_icon(icon: &str) -> AppResult<String> {
    let icon = icon.trim();
    if icon.graphemes(true).count() != 1 {
        return Err(AppError::validation("icon must be a single emoji"));
    }
    if !icon.chars().any(|c| !c.is_ascii() && !c.is_alphanumeric()) {
        return Err(AppError::validation("icon must be an emoji"));
    }
    Ok(icon.to_owned())
}

pub async fn get_group(db_pool: &SqlitePool, group_id: i64) -> AppResult<Group> {
    sqlx::query_as("SELECT * FROM groups WHERE id=?")
        .bind(group_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound("group"))
}

/// Creates the group and enrolls its creator, both or neither.
pub async fn create_group(
    db_pool: &SqlitePool,
    creator: UserId,
    name: &str,
    description: &str,
) -> AppResult<Group> {
    let name = validate_name(name)?;
    let now = db::now_millis();

    let mut tx = db_pool.begin().await?;
    let group: Group = sqlx::query_as(
        "INSERT INTO groups (name,description,icon,creator_id,created_at) VALUES (?,?,?,?,?) RETURNING *",
    )
    .bind(&name)
    .bind(description.trim())
    .bind(DEFAULT_ICON)
    .bind(creator)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    ?;

    sqlx::query("INSERT INTO group_members (group_id,user_id,joined_at) VALUES (?,?,?)")
        .bind(group.id)
        .bind(creator)
        .bind(now)
        .execute(&mut *tx)
        .await
        ?;
    tx.commit().await?;

    tracing::info!(group_id = group.id, creator, "group created");
    Ok(group)
}

/// Creator-only. Returns the stored (normalised) value.
pub async fn update_group_field(
    db_pool: &SqlitePool,
    group_id: i64,
    field: GroupField,
    value: &str,
    actor: UserId,
) -> AppResult<String> {
    let access = access::group_access(db_pool, group_id, actor).await?;
    if !access.is_creator(actor) {
        return Err(AppError::Forbidden);
    }
    let value = field.validate(value)?;

    sqlx::query(&format!("UPDATE groups SET {}=? WHERE id=?", field.column()))
        .bind(&value)
        .bind(group_id)
        .execute(db_pool)
        .await
        ?;

    tracing::info!(group_id, field = field.column(), "group updated");
    Ok(value)
}

/// Creator-only. Messages, favorites and memberships go with it.
pub async fn delete_group(db_pool: &SqlitePool, group_id: i64, actor: UserId) -> AppResult<()> {
    let access = access::group_access(db_pool, group_id, actor).await?;
    if !access.is_creator(actor) {
        return Err(AppError::Forbidden);
    }

    let mut tx = db_pool.begin().await?;
    for table in ["favorites", "messages", "group_members"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE group_id=?"))
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
    }
    let removed = sqlx::query("DELETE FROM groups WHERE id=?")
        .bind(group_id)
        .execute(&mut *tx)
        .await?;
    if removed.rows_affected() == 0 {
        return Err(AppError::NotFound("group"));
    }
    tx.commit().await?;

    tracing::info!(group_id, actor, "group deleted");
    Ok(())
}

/// Drops the actor's membership and their favorite. Creators must delete instead.
pub async fn leave_group(db_pool: &SqlitePool, group_id: i64, actor: UserId) -> AppResult<()> {
    let access = access::group_access(db_pool, group_id, actor).await?;
    if access.is_creator(actor) {
        return Err(AppError::Forbidden);
    }

    let mut tx = db_pool.begin().await?;
    let left = sqlx::query("DELETE FROM group_members WHERE group_id=? AND user_id=?")
        .bind(group_id)
        .bind(actor)
        .execute(&mut *tx)
        .await?;
    if left.rows_affected() == 0 {
        return Err(AppError::Forbidden);
    }
    sqlx::query("DELETE FROM favorites WHERE group_id=? AND user_id=?")
        .bind(group_id)
        .bind(actor)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(group_id, user_id = actor, "member left group");
    Ok(())
}

/// Idempotent; joining twice (or as the creator) changes nothing.
pub async fn join_group(db_pool: &SqlitePool, group_id: i64, actor: UserId) -> AppResult<()> {
    let access = access::group_access(db_pool, group_id, actor).await?;
    if access.is_member(actor) {
        return Ok(());
    }

    let joined = sqlx::query(
        "INSERT INTO group_members (group_id,user_id,joined_at) VALUES (?,?,?) \
         ON CONFLICT(group_id,user_id) DO NOTHING",
    )
    .bind(group_id)
    .bind(actor)
    .bind(db::now_millis())
    .execute(db_pool)
    .await
    ?;

    if joined.rows_affected() > 0 {
        tracing::info!(group_id, user_id = actor, "member joined group");
    }
    Ok(())
}
