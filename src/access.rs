//! Who may see and who may post in a conversation.
//!
//! Every answer here is read from the current rows. Nothing is cached past the
//! query that produced it, so a leave followed by a send sees the leave.

use sqlx::SqliteExecutor;

use crate::{conversation::ConversationRef, AppError, AppResult, UserId};

/// A group's creator plus whether `user` holds a membership row.
#[derive(Debug, Clone, Copy)]
pub struct GroupAccess {
    pub creator_id: UserId,
    pub has_member_row: bool,
}

impl GroupAccess {
    pub fn is_creator(&self, user_id: UserId) -> bool {
        self.creator_id == user_id
    }

    /// The creator counts as a member with or without a row.
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.is_creator(user_id) || self.has_member_row
    }
}

pub async fn group_access(
    db: impl SqliteExecutor<'_>,
    group_id: i64,
    user_id: UserId,
) -> AppResult<GroupAccess> {
    let row: Option<(UserId, bool)> = sqlx::query_as(
        "SELECT g.creator_id, \
            EXISTS(SELECT 1 FROM group_members m WHERE m.group_id=g.id AND m.user_id=?) \
         FROM groups g WHERE g.id=?",
    )
    .bind(user_id)
    .bind(group_id)
    .fetch_optional(db)
    .await?;

    let (creator_id, has_member_row) = row.ok_or(AppError::NotFound("group"))?;
    Ok(GroupAccess { creator_id, has_member_row })
}

pub async fn chat_participants(
    db: impl SqliteExecutor<'_>,
    chat_id: i64,
) -> AppResult<(UserId, UserId)> {
    sqlx::query_as("SELECT user1_id,user2_id FROM private_chats WHERE id=?")
        .bind(chat_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("chat"))
}

pub async fn is_member(db: impl SqliteExecutor<'_>, group_id: i64, user_id: UserId) -> AppResult<bool> {
    Ok(group_access(db, group_id, user_id).await?.is_member(user_id))
}

pub async fn is_creator(db: impl SqliteExecutor<'_>, group_id: i64, user_id: UserId) -> AppResult<bool> {
    Ok(group_access(db, group_id, user_id).await?.is_creator(user_id))
}

/// Chats are readable by their two participants; groups by anyone.
pub async fn can_read(
    db: impl SqliteExecutor<'_>,
    conversation: ConversationRef,
    user_id: UserId,
) -> AppResult<bool> {
    match conversation {
        ConversationRef::Chat(chat_id) => {
            let (user1, user2) = chat_participants(db, chat_id).await?;
            Ok(user_id == user1 || user_id == user2)
        }
        ConversationRef::Group(group_id) => {
            group_access(db, group_id, user_id).await?;
            Ok(true)
        }
    }
}

/// Chats: the participants. Groups: members only.
pub async fn can_write(
    db: impl SqliteExecutor<'_>,
    conversation: ConversationRef,
    user_id: UserId,
) -> AppResult<bool> {
    match conversation {
        ConversationRef::Chat(_) => can_read(db, conversation, user_id).await,
        ConversationRef::Group(group_id) => is_member(db, group_id, user_id).await,
    }
}

pub async fn require_read(
    db: impl SqliteExecutor<'_>,
    conversation: ConversationRef,
    user_id: UserId,
) -> AppResult<()> {
    if can_read(db, conversation, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub async fn require_write(
    db: impl SqliteExecutor<'_>,
    conversation: ConversationRef,
    user_id: UserId,
) -> AppResult<()> {
    if can_write(db, conversation, user_id).await? {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
