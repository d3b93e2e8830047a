//! Identity gateway: accounts, password checks and the signed-in user.

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use axum::{routing::{get, post}, Router};
use regex::Regex;
use sqlx::SqlitePool;

use crate::{appresult::is_unique_violation, db, AppError, AppResult, AppState, UserId};

mod current;
mod login;
mod logout;

pub use current::CurrentUser;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]{1,150}$").expect("static regex"));

const MIN_PASSWORD_LEN: usize = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(login::register))
        .route("/login", post(login::login))
        .route("/logout", post(logout::logout))
        .route("/me", get(current::me))
}

pub fn validate_credentials(username: &str, password: &str) -> AppResult<()> {
    if !USERNAME_RE.is_match(username) {
        return Err(AppError::validation(
            "username must be 1-150 letters, digits or @.+-_",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub async fn create_user(db_pool: &SqlitePool, username: &str, password: &str) -> AppResult<UserId> {
    validate_credentials(username, password)?;

    let password = password.to_owned();
    let password_hash = tokio::task::spawn_blocking(move || -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    })
    .await
    .map_err(anyhow::Error::from)??;

    let inserted = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username,password_hash,created_at) VALUES (?,?,?) RETURNING id",
    )
    .bind(username)
    .bind(&password_hash)
    .bind(db::now_millis())
    .fetch_one(db_pool)
    .await;

    match inserted {
        Ok(user_id) => {
            tracing::info!(user_id, username, "user registered");
            Ok(user_id)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::validation("username is taken")),
        Err(e) => Err(e.into()),
    }
}

/// `None` on an unknown user or a wrong password; the caller can't tell which.
pub async fn authenticate(
    db_pool: &SqlitePool,
    username: &str,
    password: &str,
) -> AppResult<Option<UserId>> {
    let Some((user_id, password_hash)): Option<(UserId, String)> =
        sqlx::query_as("SELECT id,password_hash FROM users WHERE username=?")
            .bind(username)
            .fetch_optional(db_pool)
            .await?
    else {
        return Ok(None);
    };

    let password = password.to_owned();
    let verified = tokio::task::spawn_blocking(move || -> AppResult<bool> {
        let parsed = PasswordHash::new(&password_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(anyhow::Error::from)??;

    Ok(verified.then_some(user_id))
}
