use std::fmt::Write;

use crate::classify::label::{Mood, Scenario};
use crate::sensing::Evidence;

fn mood_list(scenario: Scenario) -> String {
    scenario
        .moods()
        .iter()
        .map(|m| format!("- {m}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Instructions for the full scenario/mood classification of a frame burst.
///
/// With `evidence` the locally measured motion and posture are stated up front
/// and the model is asked to copy them back verbatim.
pub fn social_instructions(frame_count: usize, evidence: Option<&Evidence>) -> String {
    let mut text = format!(
        "You are classifying a short webcam burst ({frame_count} frames). \
         Ignore all room and object context. Use only facial/body vibe and interaction cues.\n\n"
    );

    if let Some(ev) = evidence {
        let _ = write!(
            text,
            "Measured locally:\n\
             - motion_level=\"{}\", motion_score={:.4}\n\
             - posture_hint=\"{}\", posture_confidence={:.2}\n\n",
            ev.motion_level, ev.motion_score, ev.posture_hint, ev.posture_confidence
        );
    }

    let _ = write!(
        text,
        "Task:\nChoose scenario \"office\", \"date\", or \"workout\", then ONE mood for that scenario.\n\n\
         OFFICE moods (exactly one person, low/medium motion):\n{}\n\
         DATE moods (exactly two people):\n{}\n\
         WORKOUT moods (exactly one person doing physical activity):\n{}\n\n",
        mood_list(Scenario::Office),
        mood_list(Scenario::Date),
        mood_list(Scenario::Workout),
    );

    text.push_str(
        "Rules:\n\
         - \"office\": one person only.\n\
         \x20 - \"focused\": seated, still, concentrated.\n\
         \x20 - \"break\": stretching, drinking, looking around. Intensive movement is NOT an office break.\n\
         \x20 - \"tense\": visibly stressed. Set angry=true only if the person clearly looks angry.\n\
         - \"date\": exactly two people.\n\
         - \"workout\": one person.\n\
         \x20 - \"active\": intensive exercise (jumping, fast arms, arms raised).\n\
         \x20 - \"resting\": standing and catching breath, hands on hips.\n\
         - Arms raised above the head => always \"workout\". Two people => always \"date\".\n",
    );

    if evidence.is_some() {
        text.push_str(
            "- High motion (score > 0.14) is always \"workout\"; low/medium motion is \"office\" or workout resting.\n\
             - Copy motion_level, motion_score, posture_hint, posture_confidence exactly into the JSON.\n",
        );
    }

    text.push_str("- Keep 'notes' short, casual and cheeky.\nReturn ONLY JSON matching the schema.");
    text
}

/// Instructions for the single-frame resting-stance probe.
pub fn rest_pose_instructions() -> String {
    format!(
        "You are checking a single webcam frame. Ignore all room and object context.\n\
         Question: is the person STANDING with their hands on their hips (arms akimbo), \
         as when resting between exercises?\n\
         - If yes, set resting_pose=true.\n\
         - If unsure or seated, set resting_pose=false.\n\
         Write a short casual note (the stance reads as workout {}).\n\
         Return ONLY JSON.",
        Mood::Resting
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::{MotionLevel, PostureHint};

    #[test]
    fn evidence_is_embedded_only_when_given() {
        let ev = Evidence {
            motion_score: 0.2,
            motion_level: MotionLevel::High,
            posture_hint: PostureHint::Unknown,
            posture_confidence: 0.35,
        };
        let primed = social_instructions(3, Some(&ev));
        assert!(primed.contains("motion_level=\"high\", motion_score=0.2000"));
        assert!(primed.contains("Copy motion_level"));

        let plain = social_instructions(3, None);
        assert!(!plain.contains("Measured locally"));
        assert!(plain.contains("- date-gone-wrong"));
    }
}
