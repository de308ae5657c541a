use image::DynamicImage;

use crate::classifier::prompts::rest_pose_instructions;
use crate::classifier::schema::rest_pose_schema;
use crate::classifier::{parse_output, ClassifierRequest, RestPoseOutput, SemanticClassifier};
use crate::error::TickResult;
use crate::sensing::Evidence;
use crate::utils::clamp_finite;

use super::label::{Label, Mood, Scenario};

/// Settles the gate's inconclusive branch with one narrow probe: is this a
/// resting-exercise stance? Anything short of a confident yes hands over to
/// full classification.
#[derive(Debug, Clone)]
pub struct AmbiguityResolver {
    min_confidence: f64,
}

impl AmbiguityResolver {
    pub fn new(min_confidence: f64) -> Self {
        Self { min_confidence }
    }

    /// Map a probe answer to a forced workout/resting label, or `None` when the
    /// stance is not accepted.
    pub fn accept(&self, pose: &RestPoseOutput, evidence: &Evidence) -> Option<Label> {
        if !pose.resting_pose || pose.confidence < self.min_confidence {
            return None;
        }

        let notes = format!(
            "Resting pose detected ({}%). {}.",
            (pose.confidence * 100.0).round() as i64,
            evidence.summary()
        );

        Some(Label::new(
            Scenario::Workout,
            Mood::Resting,
            clamp_finite(0.65 + 0.25 * pose.confidence, 0.0, 1.0),
            notes,
        ))
    }

    /// Issue the probe on a single frame.
    pub async fn resolve(
        &self,
        classifier: &dyn SemanticClassifier,
        api_key: &str,
        frame: DynamicImage,
        evidence: &Evidence,
    ) -> TickResult<Option<Label>> {
        let request = ClassifierRequest {
            images: vec![frame],
            instructions: rest_pose_instructions(),
            schema: rest_pose_schema(),
        };

        let raw = classifier.classify(api_key, &request).await?;
        let pose: RestPoseOutput = parse_output(raw)?;
        log::debug!(
            "Rest pose probe: resting_pose={} confidence={:.2} notes={}",
            pose.resting_pose,
            pose.confidence,
            pose.notes
        );

        Ok(self.accept(&pose, evidence))
    }
}

impl Default for AmbiguityResolver {
    fn default() -> Self {
        Self::new(0.55)
    }
}
