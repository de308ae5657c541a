pub mod backend;
pub mod engine;
mod fade;
pub mod tracks;

pub use backend::{AudioBackend, RodioBackend};
pub use engine::{AudioChannelState, SkipReason, TransitionEngine, TransitionOutcome};
pub use tracks::{default_tracks, TrackAsset, TrackCatalog, TrackKey};
