mod page;

use std::sync::LazyLock;

use axum::{routing::{get, post}, Router};
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{AppError, AppResult, AppState, UserId};

pub const DEFAULT_AVATAR: &str = "default";
pub const DEFAULT_MESSAGE_COLOR: &str = "#4a3a6f";

const MAX_FIELD_LEN: usize = 122;
const MAX_PHONE_LEN: usize = 12;

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static regex"));

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::profile).post(page::update_profile))
        .route("/avatar", post(page::update_avatar))
        .route("/color", post(page::update_message_color))
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: String,
    pub age: String,
    pub gender: String,
    pub preference: String,
    pub email: String,
    pub phone: String,
    pub hush_points: i64,
    pub roses: i64,
    pub hearts: i64,
    pub stars: i64,
    pub crowns: i64,
    pub message_color: String,
}

impl Profile {
    pub fn is_complete(&self) -> bool {
        !self.display_name.trim().is_empty()
            && !self.age.trim().is_empty()
            && !self.gender.trim().is_empty()
            && !self.preference.trim().is_empty()
            && self.avatar != DEFAULT_AVATAR
    }
}

/// Editable presentation fields; `None` leaves a field as is.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub preference: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Loads a user's profile, creating the default one on first access.
pub async fn get_or_create_profile(db_pool: &SqlitePool, user_id: UserId) -> AppResult<Profile> {
    let created = sqlx::query("INSERT INTO profiles (user_id) VALUES (?) ON CONFLICT(user_id) DO NOTHING")
        .bind(user_id)
        .execute(db_pool)
        .await?;
    if created.rows_affected() > 0 {
        tracing::debug!(user_id, "created default profile");
    }

    Ok(sqlx::query_as("SELECT * FROM profiles WHERE user_id=?")
        .bind(user_id)
        .fetch_one(db_pool)
        .await?)
}

fn check_len(name: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!("{name} must be at most {max} characters")));
    }
    Ok(())
}

pub fn validate_message_color(color: &str) -> AppResult<()> {
    if COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(AppError::validation("color must look like #1a2b3c"))
    }
}

pub async fn update_profile(
    db_pool: &SqlitePool,
    user_id: UserId,
    update: ProfileUpdate,
) -> AppResult<Profile> {
    let mut profile = get_or_create_profile(db_pool, user_id).await?;

    let fields = [
        ("displayName", update.display_name, &mut profile.display_name, MAX_FIELD_LEN),
        ("avatar", update.avatar, &mut profile.avatar, MAX_FIELD_LEN),
        ("age", update.age, &mut profile.age, MAX_FIELD_LEN),
        ("gender", update.gender, &mut profile.gender, MAX_FIELD_LEN),
        ("preference", update.preference, &mut profile.preference, MAX_FIELD_LEN),
        ("email", update.email, &mut profile.email, MAX_FIELD_LEN),
        ("phone", update.phone, &mut profile.phone, MAX_PHONE_LEN),
    ];
    for (name, value, slot, max) in fields {
        if let Some(value) = value {
            let value = value.trim();
            check_len(name, value, max)?;
            *slot = value.to_owned();
        }
    }
    if profile.avatar.is_empty() {
        profile.avatar = DEFAULT_AVATAR.to_owned();
    }

    sqlx::query(
        "UPDATE profiles SET display_name=?,avatar=?,age=?,gender=?,preference=?,email=?,phone=? \
         WHERE user_id=?",
    )
    .bind(&profile.display_name)
    .bind(&profile.avatar)
    .bind(&profile.age)
    .bind(&profile.gender)
    .bind(&profile.preference)
    .bind(&profile.email)
    .bind(&profile.phone)
    .bind(user_id)
    .execute(db_pool)
    .await?;

    Ok(profile)
}

pub async fn update_message_color(db_pool: &SqlitePool, user_id: UserId, color: &str) -> AppResult<()> {
    validate_message_color(color)?;
    get_or_create_profile(db_pool, user_id).await?;

    sqlx::query("UPDATE profiles SET message_color=? WHERE user_id=?")
        .bind(color)
        .bind(user_id)
        .execute(db_pool)
        .await?;
    Ok(())
}
