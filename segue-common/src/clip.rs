//! Clip data model
//!
//! A clip is the unit of playback: a playable source reference plus the
//! display metadata the catalog returned for it. The engine consumes only
//! `source_uri` and `duration_seconds`; everything else is passed through
//! to whoever renders it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A playable audio clip selected for looping playback.
///
/// Immutable once selected. The nominal duration is whatever the source
/// reported and may be approximate; the playback unit's decoded duration
/// is authoritative once the clip is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// Opaque clip identity
    pub clip_id: Uuid,

    /// Playable source reference (file path or URI)
    pub source_uri: String,

    /// Display title
    pub title: String,

    /// Display artist name
    pub artist_name: String,

    /// Display album title
    pub album_title: String,

    /// Cover art reference (opaque, passed through to the UI)
    pub cover_art_uri: Option<String>,

    /// Nominal duration in seconds, as reported by the source
    pub duration_seconds: f64,
}

impl Clip {
    /// Create a clip with a fresh identity.
    pub fn new(source_uri: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            clip_id: Uuid::new_v4(),
            source_uri: source_uri.into(),
            title: String::new(),
            artist_name: String::new(),
            album_title: String::new(),
            cover_art_uri: None,
            duration_seconds,
        }
    }
}

impl PartialEq for Clip {
    /// Clips compare by identity only; metadata is opaque payload.
    fn eq(&self, other: &Self) -> bool {
        self.clip_id == other.clip_id
    }
}
