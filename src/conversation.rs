use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Chat,
    Group,
}

impl FromStr for ConversationKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(ConversationKind::Chat),
            "group" => Ok(ConversationKind::Group),
            other => Err(AppError::validation(format!(
                "conversation type must be chat or group, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConversationKind::Chat => f.write_str("chat"),
            ConversationKind::Group => f.write_str("group"),
        }
    }
}

/// A message or favorite points at exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationRef {
    Chat(i64),
    Group(i64),
}

impl ConversationRef {
    pub fn new(kind: ConversationKind, id: i64) -> Self {
        match kind {
            ConversationKind::Chat => ConversationRef::Chat(id),
            ConversationKind::Group => ConversationRef::Group(id),
        }
    }

    /// Parses the `(type, id)` pair clients send.
    pub fn parse(kind: &str, id: i64) -> Result<Self, AppError> {
        Ok(Self::new(kind.parse()?, id))
    }

    pub fn kind(&self) -> ConversationKind {
        match self {
            ConversationRef::Chat(_) => ConversationKind::Chat,
            ConversationRef::Group(_) => ConversationKind::Group,
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            ConversationRef::Chat(id) | ConversationRef::Group(id) => id,
        }
    }

    /// The foreign-key column this reference lives in on `messages`/`favorites`.
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ConversationRef::Chat(_) => "chat_id",
            ConversationRef::Group(_) => "group_id",
        }
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.id())
    }
}
