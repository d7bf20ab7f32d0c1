//! Database initialization
//!
//! Creates the settings schema and fills in defaults for any missing
//! keys, so a fresh database starts with a complete, valid configuration.

use crate::Result;
use segue_common::params;
use sqlx::{Pool, Sqlite};
use tracing::info;

/// Create tables if they do not exist.
pub async fn init_schema(pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize missing settings with built-in defaults.
pub async fn init_settings_defaults(pool: &Pool<Sqlite>) -> Result<()> {
    let defaults = [
        ("volume_level", "0.75".to_string()),
        (
            "crossfade_lead_seconds",
            params::DEFAULT_CROSSFADE_LEAD_SECS.to_string(),
        ),
        (
            "fade_duration_seconds",
            params::DEFAULT_FADE_SECS.to_string(),
        ),
        (
            "visibility_threshold",
            params::DEFAULT_VISIBILITY_THRESHOLD.to_string(),
        ),
        ("audio_sink", "default".to_string()),
    ];

    for (key, default_value) in defaults {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
                .bind(key)
                .fetch_one(pool)
                .await?;

        if !exists {
            sqlx::query("INSERT INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(&default_value)
                .execute(pool)
                .await?;

            info!("Initialized setting '{}' = {}", key, default_value);
        }
    }

    Ok(())
}
