//! HTTP control surface
//!
//! Axum router exposing playback control, the position readout, volume,
//! the visibility feed, and the SSE event stream.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
