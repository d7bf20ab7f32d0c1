//! Loop crossfade engine
//!
//! Two fixed playback channels trade the "active" role at every loop
//! boundary: near the end of the clip the inactive channel starts from
//! position 0 and fades in while the active channel fades out, hiding the
//! seam. The coordinator polls progress, dispatches the fades, and swaps
//! the roles; the session and visibility controller sit on top.

pub mod channel;
pub mod coordinator;
pub mod fader;
pub mod session;
pub mod visibility;

pub use channel::{Channel, ChannelPair};
pub use coordinator::LoopCoordinator;
pub use fader::{FadeDirection, Fader};
pub use session::PlaybackSession;
pub use visibility::VisibilityController;
