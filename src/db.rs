use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::config::Config;

/// Schema steps, applied in order. `PRAGMA user_version` records how many ran.
const MIGRATIONS: &[&str] = &[
    // 1: identity + profiles
    r#"
    CREATE TABLE users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at    INTEGER NOT NULL
    );

    CREATE TABLE profiles (
        user_id       INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        display_name  TEXT NOT NULL DEFAULT '',
        avatar        TEXT NOT NULL DEFAULT 'default',
        age           TEXT NOT NULL DEFAULT '',
        gender        TEXT NOT NULL DEFAULT '',
        preference    TEXT NOT NULL DEFAULT '',
        email         TEXT NOT NULL DEFAULT '',
        phone         TEXT NOT NULL DEFAULT '',
        hush_points   INTEGER NOT NULL DEFAULT 0,
        roses         INTEGER NOT NULL DEFAULT 0,
        hearts        INTEGER NOT NULL DEFAULT 0,
        stars         INTEGER NOT NULL DEFAULT 0,
        crowns        INTEGER NOT NULL DEFAULT 0,
        message_color TEXT NOT NULL DEFAULT '#4a3a6f'
    );
    "#,
    // 2: conversations
    r#"
    CREATE TABLE private_chats (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user1_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        user2_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        UNIQUE (user1_id, user2_id),
        CHECK (user1_id < user2_id)
    );

    CREATE TABLE groups (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 255),
        description TEXT NOT NULL DEFAULT '',
        icon        TEXT NOT NULL DEFAULT '👥',
        creator_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at  INTEGER NOT NULL
    );

    CREATE TABLE group_members (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id  INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        user_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        joined_at INTEGER NOT NULL,
        UNIQUE (group_id, user_id)
    );

    CREATE TABLE messages (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        chat_id    INTEGER REFERENCES private_chats(id) ON DELETE CASCADE,
        group_id   INTEGER REFERENCES groups(id) ON DELETE CASCADE,
        sender_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        text       TEXT NOT NULL,
        is_read    INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        CHECK ((chat_id IS NULL) <> (group_id IS NULL))
    );
    CREATE INDEX idx_messages_chat ON messages(chat_id, id);
    CREATE INDEX idx_messages_group ON messages(group_id, id);

    CREATE TABLE favorites (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        chat_id    INTEGER REFERENCES private_chats(id) ON DELETE CASCADE,
        group_id   INTEGER REFERENCES groups(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        UNIQUE (user_id, chat_id),
        UNIQUE (user_id, group_id),
        CHECK ((chat_id IS NULL) <> (group_id IS NULL))
    );
    "#,
];

pub const SCHEMA_VERSION: i64 = MIGRATIONS.len() as i64;

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let mut options = SqliteConnectOptions::from_str(&config.database_url)?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    if !config.database_url.contains(":memory:") {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);
    }

    let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_db_connections);
    if config.max_db_connections == 1 {
        // an in-memory database lives and dies with its only connection
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    Ok(pool_options.connect_with(options).await?)
}

/// Brings the schema up to `SCHEMA_VERSION`. Each step commits on its own.
pub async fn migrate(db_pool: &SqlitePool) -> anyhow::Result<()> {
    let (current,): (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(db_pool)
        .await?;

    for (idx, step) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = idx as i64 + 1;
        let mut tx = db_pool.begin().await?;
        sqlx::raw_sql(step).execute(&mut *tx).await?;
        sqlx::raw_sql(&format!("PRAGMA user_version = {version}"))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(version, "applied schema migration");
    }

    Ok(())
}

/// Unix milliseconds, the unit every `created_at` column stores.
pub fn now_millis() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Fresh migrated in-memory database with `n` registered users.
#[cfg(test)]
pub(crate) async fn pool_with_users(n: usize) -> (SqlitePool, Vec<crate::UserId>) {
    let db_pool = connect(&Config::for_tests()).await.unwrap();
    migrate(&db_pool).await.unwrap();
    let mut ids = Vec::new();
    for i in 0..n {
        ids.push(
            crate::auth::create_user(&db_pool, &format!("user{i}"), "correct horse")
                .await
                .unwrap(),
        );
    }
    (db_pool, ids)
}
