use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};

use crate::audio::tracks::TrackAsset;

/// Top-level configuration. Every section falls back to its defaults, so an
/// empty `{}` file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sampling: SamplingConfig,
    pub evidence: EvidenceThresholds,
    pub gate: GateConfig,
    pub resolver: ResolverConfig,
    pub audio: AudioConfig,
    pub classifier: ClassifierConfig,
    pub camera: CameraConfig,
}

impl AppConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }
}

/// Loop cadence and frame capture timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Interval between classification ticks
    pub check_every_ms: u64,
    /// Upper bound on a single tick before it is abandoned
    pub tick_timeout_ms: u64,
    /// Gap between the three evidence frames (A, B, C)
    pub evidence_spacing_ms: u64,
    /// Frames sent to the classifier per tick
    pub burst_count: usize,
    pub burst_spacing_ms: u64,
}

impl SamplingConfig {
    pub fn check_every(&self) -> Duration {
        Duration::from_millis(self.check_every_ms)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_millis(self.tick_timeout_ms)
    }

    pub fn evidence_spacing(&self) -> Duration {
        Duration::from_millis(self.evidence_spacing_ms)
    }

    pub fn burst_spacing(&self) -> Duration {
        Duration::from_millis(self.burst_spacing_ms)
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            check_every_ms: 1500,
            tick_timeout_ms: 10_000,
            evidence_spacing_ms: 250,
            burst_count: 3,
            burst_spacing_ms: 550,
        }
    }
}

/// Tunable constants of the evidence extractor. The gate's behaviour depends
/// on these, so they are public rather than buried in the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceThresholds {
    /// Resolution every frame is downsampled to before comparison
    pub frame_width: u32,
    pub frame_height: u32,

    /// motion_score strictly above this is `high`
    pub high_motion: f64,
    /// motion_score strictly above this is `medium`
    pub medium_motion: f64,

    /// Accumulated luminance difference per pixel below which posture is unreadable
    pub min_change_per_pixel: f64,

    /// Normalised change centroid below this reads as seated
    pub seated_below: f64,
    /// Normalised change centroid above this reads as standing
    pub standing_above: f64,
    /// Distance from the boundary that maps to full confidence scaling
    pub seated_span: f64,
    pub standing_span: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    /// Confidence reported when the change is too small to locate
    pub no_signal_confidence: f64,
}

impl Default for EvidenceThresholds {
    fn default() -> Self {
        Self {
            frame_width: 96,
            frame_height: 54,
            high_motion: 0.14,
            medium_motion: 0.07,
            min_change_per_pixel: 1.5,
            seated_below: 0.52,
            standing_above: 0.60,
            seated_span: 0.20,
            standing_span: 0.25,
            min_confidence: 0.35,
            max_confidence: 0.95,
            no_signal_confidence: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Seated posture at or above this confidence forces the social branch
    pub seated_confidence: f64,
    /// Consecutive high-motion ticks needed for a local workout decision
    pub workout_streak: u32,
    /// Above this score a local workout label is `active`, otherwise `resting`
    pub active_motion_score: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            seated_confidence: 0.45,
            workout_streak: 2,
            active_motion_score: 0.12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Minimum probe confidence to accept a resting stance
    pub resting_pose_confidence: f64,
    /// Minimum classifier confidence for an angry `tense` to survive
    pub tense_confidence: f64,
    /// Rewrite office/break to workout/active under high local motion
    pub motion_override: bool,
    /// Embed the local evidence in the social prompt and ask for it back
    pub prompt_evidence: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resting_pose_confidence: 0.55,
            tense_confidence: 0.65,
            motion_override: true,
            prompt_evidence: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub crossfade_ms: u64,
    /// Minimum gap between two accepted transitions
    pub switch_cooldown_ms: u64,
    /// Period of one fade step
    pub frame_ms: u64,
    /// Track key to asset. Keys must match the label lookup in `audio::tracks`.
    pub tracks: HashMap<String, TrackAsset>,
}

impl AudioConfig {
    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    pub fn switch_cooldown(&self) -> Duration {
        Duration::from_millis(self.switch_cooldown_ms)
    }

    pub fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            crossfade_ms: 1200,
            switch_cooldown_ms: 1500,
            frame_ms: 16,
            tracks: crate::audio::tracks::default_tracks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    /// Frames larger than this are scaled down before upload
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/responses".into(),
            model: "gpt-4.1-mini".into(),
            max_width: 1280,
            max_height: 720,
            jpeg_quality: 82,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Still image continuously overwritten by the capture process
    pub snapshot_path: PathBuf,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("frame.jpg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.sampling.check_every_ms, 1500);
        assert_eq!(config.gate.workout_streak, 2);
        assert!(config.resolver.motion_override);
        assert_eq!(config.audio.tracks.len(), 6);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "resolver": { "prompt_evidence": false } }"#).unwrap();
        assert!(!config.resolver.prompt_evidence);
        assert!(config.resolver.motion_override);
        assert_eq!(config.resolver.tense_confidence, 0.65);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let path = std::env::temp_dir().join("ambiance-config-does-not-exist.json");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.audio.crossfade_ms, 1200);
    }
}
