use sqlx::SqlitePool;

use crate::{
    access,
    appresult::is_foreign_key_violation,
    conversation::ConversationRef,
    db, AppError, AppResult, UserId,
};

use super::{format_time_of_day, MessageView};

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    text: String,
    sender_id: UserId,
    sender_name: String,
    avatar: String,
    message_color: String,
    created_at: i64,
}

impl MessageRow {
    fn into_view(self, viewer: UserId) -> MessageView {
        MessageView {
            id: self.id,
            time: format_time_of_day(self.created_at),
            is_me: self.sender_id == viewer,
            text: self.text,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            avatar: self.avatar,
            message_color: self.message_color,
            created_at: self.created_at,
        }
    }
}

const VIEW_COLUMNS: &str = "m.id, m.text, m.sender_id, \
    COALESCE(NULLIF(p.display_name,''), u.username) AS sender_name, \
    COALESCE(p.avatar,'default') AS avatar, \
    COALESCE(p.message_color,'#4a3a6f') AS message_color, \
    m.created_at \
    FROM messages m \
    JOIN users u ON u.id=m.sender_id \
    LEFT JOIN profiles p ON p.user_id=m.sender_id";

/// Appends a message. Write permission is part of the INSERT itself, so a
/// leave that commits first always wins over a racing send.
pub async fn append_message(
    db_pool: &SqlitePool,
    conversation: ConversationRef,
    sender: UserId,
    text: &str,
) -> AppResult<MessageView> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::validation("message cannot be empty"));
    }

    let guard = match conversation {
        ConversationRef::Chat(_) => {
            "SELECT c.id FROM private_chats c WHERE c.id=? AND ? IN (c.user1_id, c.user2_id)"
        }
        ConversationRef::Group(_) => {
            "SELECT g.id FROM groups g WHERE g.id=? AND (g.creator_id=? OR EXISTS(\
                SELECT 1 FROM group_members gm WHERE gm.group_id=g.id AND gm.user_id=?))"
        }
    };
    let sql = format!(
        "INSERT INTO messages ({},sender_id,text,created_at) \
         SELECT allowed.id, ?, ?, ? FROM ({guard}) AS allowed RETURNING id",
        conversation.column()
    );

    let mut insert = sqlx::query_scalar::<_, i64>(&sql)
        .bind(sender)
        .bind(text)
        .bind(db::now_millis())
        .bind(conversation.id())
        .bind(sender);
    if let ConversationRef::Group(_) = conversation {
        insert = insert.bind(sender);
    }

    let id = match insert.fetch_optional(db_pool).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            // tells "no such conversation" apart from "not yours to write in"
            access::require_write(db_pool, conversation, sender).await?;
            return Err(AppError::Forbidden);
        }
        Err(e) if is_foreign_key_violation(&e) => return Err(AppError::NotFound("conversation")),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(message_id = id, %conversation, sender, "message appended");

    let row: MessageRow = sqlx::query_as(&format!("SELECT {VIEW_COLUMNS} WHERE m.id=?"))
        .bind(id)
        .fetch_one(db_pool)
        .await?;
    Ok(row.into_view(sender))
}

/// Messages with `id > cursor`, oldest first. The id is the only ordering key.
pub async fn list_since(
    db_pool: &SqlitePool,
    conversation: ConversationRef,
    viewer: UserId,
    cursor: Option<i64>,
) -> AppResult<Vec<MessageView>> {
    access::require_read(db_pool, conversation, viewer).await?;

    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "SELECT {VIEW_COLUMNS} WHERE m.{}=? AND m.id>? ORDER BY m.id",
        conversation.column()
    ))
    .bind(conversation.id())
    .bind(cursor.unwrap_or(0))
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.into_view(viewer)).collect())
}
