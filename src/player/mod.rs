//! Voice playback: one intro/loop session per guild, driven by songbird
//! track events.

pub(crate) mod events;
pub(crate) mod manager;

pub use manager::{PauseToggle, PlaybackPhase, PlayerError, PlayerManager};
