//! # Segue Player Library
//!
//! Continuous-loop playback engine with seam-free loop crossfading.
//!
//! **Purpose:** Play a short clip on indefinite repeat, hiding the loop
//! boundary by overlapping two playback channels and ramping their volumes
//! in opposite directions, with an HTTP/SSE control surface.
//!
//! **Architecture:** Two fixed playback channels (symphonia + rubato +
//! cpal in production) coordinated by a polling state machine on tokio.

pub mod api;
pub mod audio;
pub mod db;
pub mod engine;
pub mod error;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
