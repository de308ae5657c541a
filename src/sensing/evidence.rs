use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EvidenceThresholds;
use crate::utils::clamp_finite;

use super::frame::{Frame, MAX_LUMA_DELTA};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotionLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostureHint {
    Seated,
    Standing,
    Unknown,
}

impl MotionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionLevel::Low => "low",
            MotionLevel::Medium => "medium",
            MotionLevel::High => "high",
        }
    }
}

impl PostureHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureHint::Seated => "seated",
            PostureHint::Standing => "standing",
            PostureHint::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MotionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PostureHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local motion/posture signal for one classification tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub motion_score: f64,
    pub motion_level: MotionLevel,
    pub posture_hint: PostureHint,
    pub posture_confidence: f64,
}

impl Evidence {
    /// Compact `posture=..(..), motion=..(..)` summary for notes and logs.
    pub fn summary(&self) -> String {
        format!(
            "posture={}({:.2}), motion={}({:.4})",
            self.posture_hint, self.posture_confidence, self.motion_level, self.motion_score
        )
    }
}

/// One frame-pair comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PassReading {
    motion_score: f64,
    posture_hint: PostureHint,
    posture_confidence: f64,
}

/// Converts frame pairs into [`Evidence`]. Never fails: a signal that is too
/// weak, or frames that cannot be compared, produce the unknown/low defaults.
#[derive(Debug, Clone)]
pub struct EvidenceExtractor {
    thresholds: EvidenceThresholds,
}

impl EvidenceExtractor {
    pub fn new(thresholds: EvidenceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn motion_level(&self, motion_score: f64) -> MotionLevel {
        if motion_score > self.thresholds.high_motion {
            MotionLevel::High
        } else if motion_score > self.thresholds.medium_motion {
            MotionLevel::Medium
        } else {
            MotionLevel::Low
        }
    }

    /// Evidence from a single earlier/later pair.
    pub fn extract(&self, earlier: &Frame, later: &Frame) -> Evidence {
        let pass = self.compare(earlier, later);
        Evidence {
            motion_score: pass.motion_score,
            motion_level: self.motion_level(pass.motion_score),
            posture_hint: pass.posture_hint,
            posture_confidence: pass.posture_confidence,
        }
    }

    /// Evidence over a three-frame window: A→B and B→C.
    ///
    /// The motion score is the mean of both passes. The posture comes from the
    /// pass with a definite hint and the higher confidence; ties go to the
    /// earlier pass.
    pub fn extract_window(&self, a: &Frame, b: &Frame, c: &Frame) -> Evidence {
        let first = self.compare(a, b);
        let second = self.compare(b, c);

        let motion_score = (first.motion_score + second.motion_score) / 2.0;

        let (posture_hint, posture_confidence) = match (
            first.posture_hint != PostureHint::Unknown,
            second.posture_hint != PostureHint::Unknown,
        ) {
            (true, true) if second.posture_confidence > first.posture_confidence => {
                (second.posture_hint, second.posture_confidence)
            }
            (true, _) => (first.posture_hint, first.posture_confidence),
            (false, true) => (second.posture_hint, second.posture_confidence),
            (false, false) => (
                PostureHint::Unknown,
                first.posture_confidence.max(second.posture_confidence),
            ),
        };

        Evidence {
            motion_score,
            motion_level: self.motion_level(motion_score),
            posture_hint,
            posture_confidence,
        }
    }

    fn no_signal(&self) -> PassReading {
        PassReading {
            motion_score: 0.0,
            posture_hint: PostureHint::Unknown,
            posture_confidence: self.thresholds.no_signal_confidence,
        }
    }

    fn compare(&self, earlier: &Frame, later: &Frame) -> PassReading {
        if !earlier.same_shape(later) || earlier.area() == 0 {
            return self.no_signal();
        }

        let width = earlier.width() as usize;
        let height = earlier.height();
        let area = earlier.area();

        let mut total = 0.0;
        let mut row_moment = 0.0;
        for (i, (y1, y2)) in earlier.luma().iter().zip(later.luma()).enumerate() {
            let delta = (y1 - y2).abs();
            total += delta;
            row_moment += delta * (i / width) as f64;
        }

        let motion_score = total / (area as f64 * MAX_LUMA_DELTA);

        if total < area as f64 * self.thresholds.min_change_per_pixel {
            return PassReading {
                motion_score,
                ..self.no_signal()
            };
        }

        let centroid = (row_moment / total) / height as f64;
        let (posture_hint, posture_confidence) = self.posture_from_centroid(centroid);

        PassReading {
            motion_score,
            posture_hint,
            posture_confidence,
        }
    }

    fn posture_from_centroid(&self, centroid: f64) -> (PostureHint, f64) {
        let t = &self.thresholds;
        if centroid < t.seated_below {
            let confidence = (t.seated_below - centroid) / t.seated_span;
            (
                PostureHint::Seated,
                clamp_finite(confidence, t.min_confidence, t.max_confidence),
            )
        } else if centroid > t.standing_above {
            let confidence = (centroid - t.standing_above) / t.standing_span;
            (
                PostureHint::Standing,
                clamp_finite(confidence, t.min_confidence, t.max_confidence),
            )
        } else {
            (PostureHint::Unknown, t.min_confidence)
        }
    }
}

impl Default for EvidenceExtractor {
    fn default() -> Self {
        Self::new(EvidenceThresholds::default())
    }
}
