//! SQLite-backed runtime settings
//!
//! Database-first configuration: everything that can change at runtime
//! (volume, crossfade timing, visibility threshold) lives in a key-value
//! `settings` table; the TOML bootstrap file only says where that
//! database is.

pub mod init;
pub mod settings;

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Open (creating if missing) the settings database.
pub async fn connect(path: &Path) -> Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    init::init_schema(&pool).await?;
    init::init_settings_defaults(&pool).await?;

    Ok(pool)
}
