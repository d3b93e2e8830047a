//! The merged conversation list: private chats and groups with activity.

use std::{cmp::Reverse, collections::HashSet};

use axum::{debug_handler, extract::{Query, State}, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    appresult::is_missing_table,
    auth::CurrentUser,
    conversation::{ConversationKind, ConversationRef},
    favorites,
    messages::format_time_of_day,
    AppError, AppResult, AppState, UserId,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFilter {
    #[default]
    All,
    Private,
    Group,
    Favorited,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: i64,
    pub text: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub id: i64,
    pub name: String,
    /// Peer avatar for chats, the icon for groups.
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
    pub is_favorite: bool,
    pub last_message: LastMessage,
    pub last_activity: i64,
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    name: String,
    avatar: String,
    peer_id: Option<UserId>,
    member_count: Option<i64>,
    last_id: i64,
    last_text: String,
    last_sender_id: UserId,
    last_sender_name: String,
    last_at: i64,
}

impl ActivityRow {
    fn into_entry(self, kind: ConversationKind, favorites: &HashSet<ConversationRef>) -> FeedEntry {
        FeedEntry {
            kind,
            id: self.id,
            name: self.name,
            avatar: self.avatar,
            peer_id: self.peer_id,
            member_count: self.member_count,
            is_favorite: favorites.contains(&ConversationRef::new(kind, self.id)),
            last_message: LastMessage {
                id: self.last_id,
                text: self.last_text,
                sender_id: self.last_sender_id,
                sender_name: self.last_sender_name,
                time: format_time_of_day(self.last_at),
            },
            last_activity: self.last_at,
        }
    }
}

const LAST_MESSAGE_COLUMNS: &str = "m.id AS last_id, m.text AS last_text, m.sender_id AS last_sender_id, \
    COALESCE(NULLIF(sp.display_name,''), su.username) AS last_sender_name, m.created_at AS last_at";

async fn active_chats(db_pool: &SqlitePool, user_id: UserId) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT c.id, COALESCE(NULLIF(pp.display_name,''), peer.username) AS name, \
            COALESCE(pp.avatar,'default') AS avatar, peer.id AS peer_id, NULL AS member_count, \
            {LAST_MESSAGE_COLUMNS} \
         FROM private_chats c \
         JOIN users peer ON peer.id = CASE WHEN c.user1_id=? THEN c.user2_id ELSE c.user1_id END \
         LEFT JOIN profiles pp ON pp.user_id=peer.id \
         JOIN messages m ON m.id=(SELECT MAX(id) FROM messages WHERE chat_id=c.id) \
         JOIN users su ON su.id=m.sender_id \
         LEFT JOIN profiles sp ON sp.user_id=su.id \
         WHERE c.user1_id=? OR c.user2_id=?"
    ))
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db_pool)
    .await
}

async fn active_groups(db_pool: &SqlitePool, user_id: UserId) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT g.id, g.name, g.icon AS avatar, NULL AS peer_id, \
            (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id=g.id AND gm.user_id<>g.creator_id) + 1 \
                AS member_count, \
            {LAST_MESSAGE_COLUMNS} \
         FROM groups g \
         JOIN messages m ON m.id=(SELECT MAX(id) FROM messages WHERE group_id=g.id) \
         JOIN users su ON su.id=m.sender_id \
         LEFT JOIN profiles sp ON sp.user_id=su.id \
         WHERE g.creator_id=? OR EXISTS(\
            SELECT 1 FROM group_members gm WHERE gm.group_id=g.id AND gm.user_id=?)"
    ))
    .bind(user_id)
    .bind(user_id)
    .fetch_all(db_pool)
    .await
}

/// Newest activity first. Ties go to the higher last-message id, which is
/// the later append since ids only grow.
pub async fn list_conversations(
    db_pool: &SqlitePool,
    user_id: UserId,
    filter: FeedFilter,
) -> AppResult<Vec<FeedEntry>> {
    let favorites = match favorites::favorite_set(db_pool, user_id).await {
        Ok(set) => set,
        Err(AppError::ServiceUnavailable(_)) => {
            tracing::warn!(user_id, "favorites storage missing, feed shows none");
            HashSet::new()
        }
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();

    if filter != FeedFilter::Group {
        entries.extend(
            active_chats(db_pool, user_id)
                .await?
                .into_iter()
                .map(|row| row.into_entry(ConversationKind::Chat, &favorites)),
        );
    }

    if filter != FeedFilter::Private {
        match active_groups(db_pool, user_id).await {
            Ok(rows) => entries.extend(
                rows.into_iter()
                    .map(|row| row.into_entry(ConversationKind::Group, &favorites)),
            ),
            Err(e) if is_missing_table(&e) => {
                tracing::warn!(user_id, error = %e, "group storage missing, feed shows chats only");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if filter == FeedFilter::Favorited {
        entries.retain(|entry| entry.is_favorite);
    }

    entries.sort_by_key(|entry| Reverse((entry.last_activity, entry.last_message.id)));
    Ok(entries)
}

#[derive(Deserialize)]
pub(crate) struct FeedQuery {
    #[serde(default)]
    filter: FeedFilter,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list(
    CurrentUser(user_id): CurrentUser,
    State(db_pool): State<SqlitePool>,
    Query(FeedQuery { filter }): Query<FeedQuery>,
) -> AppResult<Json<Value>> {
    let conversations = list_conversations(&db_pool, user_id, filter).await?;
    Ok(Json(json!({ "conversations": conversations })))
}
