use crate::config::GateConfig;
use crate::sensing::{Evidence, MotionLevel, PostureHint};
use crate::utils::clamp_finite;

use super::label::{Label, Mood, Scenario};

/// Scenario the gate can settle on without the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateScenario {
    /// Office or date; the classifier picks which.
    Social,
    Workout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Definite(GateScenario),
    NeedsSemanticCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioDecision {
    pub gate: GateOutcome,
    /// Streak after this decision
    pub streak: u32,
}

/// Hysteresis gate over consecutive ticks.
///
/// The streak is the only state carried between ticks. A confident seated
/// posture resets it; any tick that is not high-motion resets it.
#[derive(Debug, Clone)]
pub struct ScenarioGate {
    config: GateConfig,
    streak: u32,
}

impl ScenarioGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config, streak: 0 }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn decide(&mut self, evidence: &Evidence) -> ScenarioDecision {
        if evidence.posture_hint == PostureHint::Seated
            && evidence.posture_confidence >= self.config.seated_confidence
        {
            self.streak = 0;
            return self.decision(GateOutcome::Definite(GateScenario::Social));
        }

        if evidence.motion_level == MotionLevel::High {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }

        if self.streak >= self.config.workout_streak {
            return self.decision(GateOutcome::Definite(GateScenario::Workout));
        }

        self.decision(GateOutcome::NeedsSemanticCheck)
    }

    fn decision(&self, gate: GateOutcome) -> ScenarioDecision {
        ScenarioDecision {
            gate,
            streak: self.streak,
        }
    }

    /// Label for a gate-level workout decision, built from local evidence alone.
    pub fn workout_label(&self, evidence: &Evidence) -> Label {
        let mood = if evidence.motion_score > self.config.active_motion_score {
            Mood::Active
        } else {
            Mood::Resting
        };

        let posture_part = if evidence.posture_hint == PostureHint::Standing {
            clamp_finite(evidence.posture_confidence, 0.0, 1.0)
        } else {
            0.50
        };
        let motion_part = match evidence.motion_level {
            MotionLevel::High => 0.20,
            MotionLevel::Medium => 0.10,
            MotionLevel::Low => 0.0,
        };

        let notes = match mood {
            Mood::Active => "Sustained movement, full workout mode.",
            _ => "Slowing down between sets.",
        };

        Label::new(
            Scenario::Workout,
            mood,
            clamp_finite(posture_part + motion_part, 0.0, 1.0),
            format!("{notes} {}", evidence.summary()),
        )
    }
}

impl Default for ScenarioGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(level: MotionLevel, hint: PostureHint, confidence: f64) -> Evidence {
        let score = match level {
            MotionLevel::High => 0.20,
            MotionLevel::Medium => 0.10,
            MotionLevel::Low => 0.01,
        };
        Evidence {
            motion_score: score,
            motion_level: level,
            posture_hint: hint,
            posture_confidence: confidence,
        }
    }

    #[test]
    fn confident_seated_overrides_motion_and_resets_streak() {
        let mut gate = ScenarioGate::default();
        gate.decide(&evidence(MotionLevel::High, PostureHint::Unknown, 0.35));
        assert_eq!(gate.streak(), 1);

        for level in [MotionLevel::Low, MotionLevel::Medium, MotionLevel::High] {
            let decision = gate.decide(&evidence(level, PostureHint::Seated, 0.45));
            assert_eq!(decision.gate, GateOutcome::Definite(GateScenario::Social));
            assert_eq!(decision.streak, 0);
        }
    }

    #[test]
    fn weak_seated_does_not_override() {
        let mut gate = ScenarioGate::default();
        let decision = gate.decide(&evidence(MotionLevel::Low, PostureHint::Seated, 0.44));
        assert_eq!(decision.gate, GateOutcome::NeedsSemanticCheck);
    }

    #[test]
    fn workout_needs_two_consecutive_high_ticks() {
        let mut gate = ScenarioGate::default();
        let high = evidence(MotionLevel::High, PostureHint::Unknown, 0.35);

        assert_eq!(gate.decide(&high).gate, GateOutcome::NeedsSemanticCheck);
        let second = gate.decide(&high);
        assert_eq!(second.gate, GateOutcome::Definite(GateScenario::Workout));
        assert_eq!(second.streak, 2);
    }

    #[test]
    fn interrupted_streak_never_triggers_workout() {
        let mut gate = ScenarioGate::default();
        let high = evidence(MotionLevel::High, PostureHint::Standing, 0.6);
        let medium = evidence(MotionLevel::Medium, PostureHint::Standing, 0.6);

        for _ in 0..5 {
            assert_eq!(gate.decide(&high).gate, GateOutcome::NeedsSemanticCheck);
            let reset = gate.decide(&medium);
            assert_eq!(reset.gate, GateOutcome::NeedsSemanticCheck);
            assert_eq!(reset.streak, 0);
        }
    }

    #[test]
    fn workout_label_uses_motion_score_for_mood() {
        let gate = ScenarioGate::default();
        let active = gate.workout_label(&evidence(MotionLevel::High, PostureHint::Unknown, 0.35));
        assert_eq!(active.mood, Mood::Active);
        assert!((active.confidence - 0.70).abs() < 1e-9);

        let mut calm = evidence(MotionLevel::High, PostureHint::Standing, 0.9);
        calm.motion_score = 0.11;
        let resting = gate.workout_label(&calm);
        assert_eq!(resting.mood, Mood::Resting);
        assert!((resting.confidence - 1.0).abs() < 1e-9);
    }
}
