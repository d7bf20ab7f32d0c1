//! Settings table access
//!
//! Read/write runtime settings from the key-value settings table. All
//! settings are system-wide.

use crate::error::{Error, Result};
use segue_common::EngineParams;
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// Get master volume (0.0-1.0).
pub async fn get_volume(db: &Pool<Sqlite>) -> Result<f32> {
    match get_setting::<f32>(db, "volume_level").await? {
        Some(volume) => Ok(volume.clamp(0.0, 1.0)),
        None => {
            set_volume(db, 0.75).await?;
            Ok(0.75)
        }
    }
}

/// Set master volume (0.0-1.0).
pub async fn set_volume(db: &Pool<Sqlite>, volume: f32) -> Result<()> {
    set_setting(db, "volume_level", volume.clamp(0.0, 1.0)).await
}

/// Get the configured audio output device name, None meaning default.
pub async fn get_audio_device(db: &Pool<Sqlite>) -> Result<Option<String>> {
    Ok(get_setting::<String>(db, "audio_sink")
        .await?
        .filter(|name| name != "default"))
}

/// Load engine timing parameters, falling back to built-in defaults for
/// missing keys.
///
/// The caller validates the result before the engine starts; a lead
/// shorter than the fade is a startup failure, not something to silently
/// repair here.
pub async fn load_engine_params(db: &Pool<Sqlite>) -> Result<EngineParams> {
    let mut params = EngineParams::default();

    if let Some(lead) = get_setting::<f64>(db, "crossfade_lead_seconds").await? {
        params.crossfade_lead = Duration::from_secs_f64(lead.max(0.0));
    }
    if let Some(fade) = get_setting::<f64>(db, "fade_duration_seconds").await? {
        params.fade_duration = Duration::from_secs_f64(fade.max(0.0));
    }
    if let Some(threshold) = get_setting::<f32>(db, "visibility_threshold").await? {
        params.visibility_threshold = threshold;
    }

    Ok(params)
}

/// Generic setting getter; None when the key doesn't exist.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update).
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}
