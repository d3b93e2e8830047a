//! Per-conversation message ledger and the polling endpoints over it.

mod ledger;
mod poll;

use axum::{routing::get, Router};
use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};

use crate::{AppState, UserId};

pub use ledger::{append_message, list_since};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{kind}/{conversation_id}/messages",
        get(poll::list_messages).post(poll::send_message),
    )
}

/// A message as the requesting user sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub text: String,
    pub sender_id: UserId,
    pub sender_name: String,
    pub avatar: String,
    pub message_color: String,
    pub is_me: bool,
    pub time: String,
    pub created_at: i64,
}

/// `HH:MM` (UTC) for a unix-millisecond timestamp.
pub fn format_time_of_day(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .ok()
        .and_then(|t| t.format(format_description!("[hour]:[minute]")).ok())
        .unwrap_or_default()
}
