//! Visibility-driven playback controller
//!
//! Auto-play on scroll: each on-screen item reports discrete visibility
//! ratio changes; when an item's ratio rises across the threshold and it
//! is not already the auto-playing item, playback switches to it. Items
//! scrolling away force nothing — only a newly visible item causes a
//! switch, so at most one item plays at a time.

use crate::engine::session::PlaybackSession;
use crate::Result;
use segue_common::Clip;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

struct VisibilityState {
    /// Last reported ratio per item, for rising-edge detection
    ratios: HashMap<Uuid, f32>,
    /// The single item currently auto-playing, if any
    current_item: Option<Uuid>,
}

/// Switches loop playback between feed items as they scroll into view.
pub struct VisibilityController {
    session: Arc<PlaybackSession>,
    threshold: f32,
    state: Mutex<VisibilityState>,
}

impl VisibilityController {
    pub fn new(session: Arc<PlaybackSession>, threshold: f32) -> Self {
        Self {
            session,
            threshold,
            state: Mutex::new(VisibilityState {
                ratios: HashMap::new(),
                current_item: None,
            }),
        }
    }

    /// Feed one visibility change event for an item.
    ///
    /// Returns true when the event switched playback to this item.
    /// Idempotent for repeated above-threshold reports of the current
    /// item, and a no-op for any ratio below the threshold.
    pub async fn observe(&self, item_id: Uuid, clip: Clip, ratio: f32) -> Result<bool> {
        let ratio = ratio.clamp(0.0, 1.0);

        // Held across the switch so two items can never start together
        let mut state = self.state.lock().await;

        let previous = state.ratios.insert(item_id, ratio).unwrap_or(0.0);
        let rising_cross = previous < self.threshold && ratio >= self.threshold;

        if !rising_cross {
            return Ok(false);
        }
        if state.current_item == Some(item_id) {
            debug!("Item {} already auto-playing, ignoring", item_id);
            return Ok(false);
        }

        if let Some(previous_item) = state.current_item.take() {
            info!("Auto-play switching: {} -> {}", previous_item, item_id);
            self.session.stop().await;
        } else {
            info!("Auto-play starting: {}", item_id);
        }

        // On a load failure the session is Idle and no item is current
        self.session.select(clip).await?;
        state.current_item = Some(item_id);
        Ok(true)
    }

    /// The item currently auto-playing, if any.
    pub async fn current_item(&self) -> Option<Uuid> {
        self.state.lock().await.current_item
    }
}
