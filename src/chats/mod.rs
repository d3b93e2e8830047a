//! Private (1:1) chats.

mod delete;
mod new;

use axum::{routing::post, Router};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    appresult::{is_foreign_key_violation, is_unique_violation},
    db, AppError, AppResult, AppState, UserId,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(new::start_chat))
        .route("/{chat_id}/delete", post(delete::delete_chat))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrivateChat {
    pub id: i64,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub created_at: i64,
}

/// Lower id first, so an unordered pair has one spelling.
pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

async fn find_chat(db_pool: &SqlitePool, user1: UserId, user2: UserId) -> AppResult<Option<PrivateChat>> {
    Ok(sqlx::query_as("SELECT * FROM private_chats WHERE user1_id=? AND user2_id=?")
        .bind(user1)
        .bind(user2)
        .fetch_optional(db_pool)
        .await?)
}

pub async fn get_chat(db_pool: &SqlitePool, chat_id: i64) -> AppResult<PrivateChat> {
    sqlx::query_as("SELECT * FROM private_chats WHERE id=?")
        .bind(chat_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or(AppError::NotFound("chat"))
}

/// Returns the chat between two users and whether this call created it.
///
/// Racing callers both try the insert; the UNIQUE pair lets one win and the
/// loser reads the winner's row.
pub async fn get_or_create_private_chat(
    db_pool: &SqlitePool,
    user_a: UserId,
    user_b: UserId,
) -> AppResult<(PrivateChat, bool)> {
    if user_a == user_b {
        return Err(AppError::InvalidOperation("cannot start a chat with yourself".to_owned()));
    }
    let (user1, user2) = canonical_pair(user_a, user_b);

    if let Some(chat) = find_chat(db_pool, user1, user2).await? {
        return Ok((chat, false));
    }

    let peer_exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id=?")
        .bind(user_b)
        .fetch_optional(db_pool)
        .await?;
    if peer_exists.is_none() {
        return Err(AppError::NotFound("user"));
    }

    let inserted = sqlx::query_as::<_, PrivateChat>(
        "INSERT INTO private_chats (user1_id,user2_id,created_at) VALUES (?,?,?) RETURNING *",
    )
    .bind(user1)
    .bind(user2)
    .bind(db::now_millis())
    .fetch_one(db_pool)
    .await;

    match inserted {
        Ok(chat) => {
            tracing::info!(chat_id = chat.id, user1, user2, "private chat created");
            Ok((chat, true))
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(user1, user2, "lost private chat race, reading winner");
            let chat = find_chat(db_pool, user1, user2)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("chat vanished after conflict")))?;
            Ok((chat, false))
        }
        Err(e) if is_foreign_key_violation(&e) => Err(AppError::NotFound("user")),
        Err(e) => Err(e.into()),
    }
}

/// Removes the chat with its messages and favorites. Participants only.
pub async fn delete_chat(db_pool: &SqlitePool, chat_id: i64, actor: UserId) -> AppResult<()> {
    let chat = get_chat(db_pool, chat_id).await?;
    if actor != chat.user1_id && actor != chat.user2_id {
        return Err(AppError::Forbidden);
    }

    let mut tx = db_pool.begin().await?;
    sqlx::query("DELETE FROM favorites WHERE chat_id=?")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM messages WHERE chat_id=?")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    let removed = sqlx::query("DELETE FROM private_chats WHERE id=?")
        .bind(chat_id)
        .execute(&mut *tx)
        .await?;
    if removed.rows_affected() == 0 {
        return Err(AppError::NotFound("chat"));
    }
    tx.commit().await?;

    tracing::info!(chat_id, actor, "private chat deleted");
    Ok(())
}
