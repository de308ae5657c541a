use crate::classifier::SocialOutput;
use crate::config::ResolverConfig;
use crate::error::{TickError, TickResult};
use crate::sensing::{Evidence, MotionLevel};

use super::label::{Label, Mood, Scenario};

/// Anti-flip and override rules applied to the classifier's full label.
///
/// Order matters: vocabulary check, then `tense` suppression, then the
/// motion-conflict override.
#[derive(Debug, Clone)]
pub struct MoodResolver {
    tense_confidence: f64,
    motion_override: bool,
}

impl MoodResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            tense_confidence: config.tense_confidence,
            motion_override: config.motion_override,
        }
    }

    /// Validate and normalise a raw classifier answer.
    pub fn resolve(&self, output: &SocialOutput, evidence: &Evidence) -> TickResult<Label> {
        let scenario: Scenario = output
            .scenario
            .parse()
            .map_err(|e| TickError::contract(format!("Invalid scenario from model: {e}")))?;
        let mood: Mood = output
            .mood
            .parse()
            .map_err(|e| TickError::contract(format!("Invalid {scenario} mood: {e}")))?;

        if !output.confidence.is_finite() || !(0.0..=1.0).contains(&output.confidence) {
            return Err(TickError::contract(format!(
                "Confidence out of range: {}",
                output.confidence
            )));
        }

        let label = Label::new(scenario, mood, output.confidence, output.notes.clone());
        self.apply(label, output.angry, evidence)
    }

    /// Rules 1-3 on an already typed label.
    pub fn apply(&self, mut label: Label, angry: bool, evidence: &Evidence) -> TickResult<Label> {
        if !label.scenario.permits(label.mood) {
            return Err(TickError::contract(format!(
                "Invalid {} mood: {}",
                label.scenario, label.mood
            )));
        }

        if label.scenario == Scenario::Office
            && label.mood == Mood::Tense
            && !(angry && label.confidence >= self.tense_confidence)
        {
            log::debug!(
                "Demoting office/tense to break (angry={angry}, confidence={:.2})",
                label.confidence
            );
            label.mood = Mood::Break;
        }

        if self.motion_override
            && label.scenario == Scenario::Office
            && label.mood == Mood::Break
            && evidence.motion_level == MotionLevel::High
        {
            log::info!("Overriding office/break to workout/active due to high motion");
            label.scenario = Scenario::Workout;
            label.mood = Mood::Active;
        }

        Ok(label)
    }
}

impl Default for MoodResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::PostureHint;

    fn evidence(level: MotionLevel) -> Evidence {
        Evidence {
            motion_score: 0.05,
            motion_level: level,
            posture_hint: PostureHint::Seated,
            posture_confidence: 0.3,
        }
    }

    fn output(scenario: &str, mood: &str, angry: bool, confidence: f64) -> SocialOutput {
        SocialOutput {
            scenario: scenario.into(),
            mood: mood.into(),
            angry,
            confidence,
            notes: "n".into(),
            motion_level: None,
            motion_score: None,
            posture_hint: None,
            posture_confidence: None,
        }
    }

    fn resolve(out: SocialOutput, level: MotionLevel) -> TickResult<Label> {
        MoodResolver::default().resolve(&out, &evidence(level))
    }

    #[test]
    fn tense_without_anger_is_a_break() {
        let label = resolve(output("office", "tense", false, 0.9), MotionLevel::Low).unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Office, Mood::Break));
    }

    #[test]
    fn tense_with_weak_anger_is_a_break() {
        let label = resolve(output("office", "tense", true, 0.50), MotionLevel::Low).unwrap();
        assert_eq!(label.mood, Mood::Break);
    }

    #[test]
    fn tense_with_confident_anger_survives() {
        let label = resolve(output("office", "tense", true, 0.80), MotionLevel::Low).unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Office, Mood::Tense));
    }

    #[test]
    fn break_under_high_motion_becomes_workout() {
        let label = resolve(output("office", "break", false, 0.7), MotionLevel::High).unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Workout, Mood::Active));
    }

    #[test]
    fn demoted_tense_under_high_motion_becomes_workout() {
        let label = resolve(output("office", "tense", false, 0.9), MotionLevel::High).unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Workout, Mood::Active));
    }

    #[test]
    fn motion_override_can_be_disabled() {
        let config = ResolverConfig {
            motion_override: false,
            ..ResolverConfig::default()
        };
        let label = MoodResolver::new(&config)
            .resolve(&output("office", "break", false, 0.7), &evidence(MotionLevel::High))
            .unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Office, Mood::Break));
    }

    #[test]
    fn other_labels_pass_through() {
        let label = resolve(output("date", "romantic", false, 0.6), MotionLevel::High).unwrap();
        assert_eq!((label.scenario, label.mood), (Scenario::Date, Mood::Romantic));
        assert_eq!(label.notes, "n");
    }

    #[test]
    fn mood_from_another_scenario_is_a_contract_violation() {
        let err = resolve(output("date", "focused", false, 0.6), MotionLevel::Low).unwrap_err();
        assert!(matches!(err, TickError::Contract(msg) if msg.contains("date")));
    }

    #[test]
    fn unknown_vocabulary_is_a_contract_violation() {
        assert!(matches!(
            resolve(output("gym", "active", false, 0.6), MotionLevel::Low),
            Err(TickError::Contract(_))
        ));
        assert!(matches!(
            resolve(output("office", "sleepy", false, 0.6), MotionLevel::Low),
            Err(TickError::Contract(_))
        ));
        assert!(matches!(
            resolve(output("office", "focused", false, 1.5), MotionLevel::Low),
            Err(TickError::Contract(_))
        ));
    }
}
