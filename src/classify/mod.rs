//! Turning local evidence and classifier answers into a single label per tick.

pub mod ambiguity;
pub mod gate;
pub mod label;
pub mod mood;
pub mod session;

pub use ambiguity::AmbiguityResolver;
pub use gate::{GateOutcome, GateScenario, ScenarioDecision, ScenarioGate};
pub use label::{Label, Mood, Scenario};
pub use mood::MoodResolver;
pub use session::{MoodSession, SessionParts, TickOutcome};
