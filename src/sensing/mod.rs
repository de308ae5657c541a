pub mod camera;
pub mod controller;
pub mod evidence;
pub mod frame;
mod loop_worker;

pub use camera::{Camera, SnapshotCamera};
pub use controller::LoopController;
pub use evidence::{Evidence, EvidenceExtractor, MotionLevel, PostureHint};
pub use frame::Frame;
