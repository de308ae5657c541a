use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::classify::label::{Mood, Scenario};
use crate::sensing::{MotionLevel, PostureHint};

/// A named JSON schema for strict structured output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Full scenario/mood answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialOutput {
    pub scenario: String,
    pub mood: String,
    /// Second, independent affirmation required before `tense` is accepted
    pub angry: bool,
    pub confidence: f64,
    pub notes: String,

    // Echo of the local evidence, present when it was embedded in the prompt
    #[serde(default)]
    pub motion_level: Option<MotionLevel>,
    #[serde(default)]
    pub motion_score: Option<f64>,
    #[serde(default)]
    pub posture_hint: Option<PostureHint>,
    #[serde(default)]
    pub posture_confidence: Option<f64>,
}

/// Narrow resting-stance probe answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestPoseOutput {
    pub resting_pose: bool,
    pub confidence: f64,
    #[serde(default)]
    pub notes: String,
}

fn names<T>(items: &[T], f: impl Fn(&T) -> &'static str) -> Vec<&'static str> {
    items.iter().map(f).collect()
}

pub fn social_schema(include_evidence: bool) -> OutputSchema {
    let mut properties = json!({
        "scenario": { "type": "string", "enum": names(&Scenario::ALL, Scenario::as_str) },
        "mood": { "type": "string", "enum": names(&Mood::ALL, Mood::as_str) },
        "angry": { "type": "boolean" },
        "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
        "notes": { "type": "string" },
    });
    let mut required = vec!["scenario", "mood", "angry", "confidence", "notes"];

    if include_evidence {
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                "motion_level".into(),
                json!({ "type": "string", "enum": ["low", "medium", "high"] }),
            );
            map.insert("motion_score".into(), json!({ "type": "number" }));
            map.insert(
                "posture_hint".into(),
                json!({ "type": "string", "enum": ["seated", "standing", "unknown"] }),
            );
            map.insert(
                "posture_confidence".into(),
                json!({ "type": "number", "minimum": 0, "maximum": 1 }),
            );
        }
        required.extend(["motion_level", "motion_score", "posture_hint", "posture_confidence"]);
    }

    OutputSchema {
        name: "scene_label",
        schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": properties,
            "required": required,
        }),
    }
}

pub fn rest_pose_schema() -> OutputSchema {
    OutputSchema {
        name: "rest_pose",
        schema: json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "resting_pose": { "type": "boolean" },
                "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                "notes": { "type": "string" },
            },
            "required": ["resting_pose", "confidence", "notes"],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_fields_are_required_only_when_embedded() {
        let plain = social_schema(false);
        let required = plain.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 5);
        assert!(plain.schema["properties"].get("motion_level").is_none());

        let primed = social_schema(true);
        let required = primed.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 9);
        assert!(required.iter().any(|v| v == "posture_confidence"));
    }

    #[test]
    fn mood_enum_covers_every_mood() {
        let schema = social_schema(false);
        let moods = schema.schema["properties"]["mood"]["enum"].as_array().unwrap();
        assert_eq!(moods.len(), Mood::ALL.len());
        assert!(moods.iter().any(|v| v == "date-gone-wrong"));
    }
}
