//! Per-user favorite markers on chats and groups.

use std::collections::HashSet;

use axum::{debug_handler, extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    access,
    appresult::is_foreign_key_violation,
    auth::CurrentUser,
    conversation::ConversationRef,
    db, AppError, AppResult, AppState, UserId,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(toggle))
}

/// Flips the marker and reports the new state.
///
/// Delete-or-insert runs in one write transaction, so racing toggles
/// serialise and alternate; the UNIQUE pair backs that up.
pub async fn toggle_favorite(
    db_pool: &SqlitePool,
    user_id: UserId,
    target: ConversationRef,
) -> AppResult<bool> {
    let related = match target {
        ConversationRef::Chat(_) => access::can_read(db_pool, target, user_id).await?,
        ConversationRef::Group(group_id) => access::is_member(db_pool, group_id, user_id).await?,
    };
    if !related {
        return Err(AppError::Forbidden);
    }

    let column = target.column();
    let mut tx = db_pool.begin().await?;

    let removed = sqlx::query(&format!("DELETE FROM favorites WHERE user_id=? AND {column}=?"))
        .bind(user_id)
        .bind(target.id())
        .execute(&mut *tx)
        .await
        ?;
    if removed.rows_affected() > 0 {
        tx.commit().await?;
        tracing::debug!(user_id, %target, "unfavorited");
        return Ok(false);
    }

    // a conflict here means a concurrent toggle already favorited it
    let added = sqlx::query(&format!(
        "INSERT INTO favorites (user_id,{column},created_at) VALUES (?,?,?) ON CONFLICT DO NOTHING"
    ))
    .bind(user_id)
    .bind(target.id())
    .bind(db::now_millis())
    .execute(&mut *tx)
    .await;
    match added {
        Ok(_) => {}
        Err(e) if is_foreign_key_violation(&e) => return Err(AppError::NotFound("conversation")),
        Err(e) => return Err(e.into()),
    }
    tx.commit().await?;

    tracing::debug!(user_id, %target, "favorited");
    Ok(true)
}

/// Everything `user_id` has favorited.
pub async fn favorite_set(db_pool: &SqlitePool, user_id: UserId) -> AppResult<HashSet<ConversationRef>> {
    let rows: Vec<(Option<i64>, Option<i64>)> =
        sqlx::query_as("SELECT chat_id,group_id FROM favorites WHERE user_id=?")
            .bind(user_id)
            .fetch_all(db_pool)
            .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            (Some(chat_id), None) => Some(ConversationRef::Chat(chat_id)),
            (None, Some(group_id)) => Some(ConversationRef::Group(group_id)),
            _ => None,
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToggleForm {
    target_id: i64,
    target_type: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn toggle(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Json(ToggleForm { target_id, target_type }): Json<ToggleForm>,
) -> AppResult<Json<Value>> {
    let target = ConversationRef::parse(&target_type, target_id)?;
    let favorited = toggle_favorite(&db_pool, user_id, target).await?;
    Ok(Json(json!({ "favorited": favorited })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chats, db::pool_with_users, groups};

    #[tokio::test]
    async fn toggling_alternates() {
        let (db_pool, ids) = pool_with_users(2).await;
        let (chat, _) = chats::get_or_create_private_chat(&db_pool, ids[0], ids[1]).await.unwrap();
        let target = ConversationRef::Chat(chat.id);

        let mut states = Vec::new();
        for _ in 0..5 {
            states.push(toggle_favorite(&db_pool, ids[0], target).await.unwrap());
        }
        assert_eq!(states, [true, false, true, false, true]);
        assert!(favorite_set(&db_pool, ids[0]).await.unwrap().contains(&target));
        assert!(favorite_set(&db_pool, ids[1]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_favorite() {
        let (db_pool, ids) = pool_with_users(3).await;
        let (chat, _) = chats::get_or_create_private_chat(&db_pool, ids[0], ids[1]).await.unwrap();
        let group = groups::create_group(&db_pool, ids[0], "Devs", "").await.unwrap();

        assert!(matches!(
            toggle_favorite(&db_pool, ids[2], ConversationRef::Chat(chat.id)).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            toggle_favorite(&db_pool, ids[2], ConversationRef::Group(group.id)).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            toggle_favorite(&db_pool, ids[2], ConversationRef::Group(404)).await,
            Err(AppError::NotFound(_))
        ));

        assert!(toggle_favorite(&db_pool, ids[0], ConversationRef::Group(group.id)).await.unwrap());
    }
}
