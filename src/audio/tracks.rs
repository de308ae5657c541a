use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::classify::label::{Mood, Scenario};

/// Identifier of one playable soundtrack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackKey(String);

impl TrackKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pure lookup from a resolved (scenario, mood) pair.
    pub fn for_label(scenario: Scenario, mood: Mood) -> Self {
        let key = match (scenario, mood) {
            (Scenario::Office, Mood::Focused | Mood::Tense) => "office_focus",
            (Scenario::Office, _) => "office_chill",
            (Scenario::Date, Mood::Romantic) => "date_romantic",
            (Scenario::Date, _) => "date_awkward",
            (Scenario::Workout, Mood::Active) => "workout_active",
            (Scenario::Workout, _) => "workout_rest",
        };
        Self::new(key)
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a track lives and where playback starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAsset {
    pub path: PathBuf,
    /// Skips a silent lead-in
    #[serde(default)]
    pub start_offset_ms: u64,
}

impl TrackAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            start_offset_ms: 0,
        }
    }

    pub fn start_offset(&self) -> Duration {
        Duration::from_millis(self.start_offset_ms)
    }
}

pub fn default_tracks() -> HashMap<String, TrackAsset> {
    let base = PathBuf::from("assets/sounds");
    let mut tracks = HashMap::new();
    tracks.insert(
        "office_focus".to_string(),
        TrackAsset {
            path: base.join("office-focus.mp3"),
            start_offset_ms: 20_000,
        },
    );
    tracks.insert("office_chill".into(), TrackAsset::new(base.join("office-break.mp3")));
    tracks.insert("date_romantic".into(), TrackAsset::new(base.join("date-romantic.mp3")));
    tracks.insert("date_awkward".into(), TrackAsset::new(base.join("date-gone-wrong.mp3")));
    tracks.insert("workout_active".into(), TrackAsset::new(base.join("workout-active.mp3")));
    tracks.insert("workout_rest".into(), TrackAsset::new(base.join("workout-rest.mp3")));
    tracks
}

/// Every known track, keyed for the transition engine.
#[derive(Debug, Clone, Default)]
pub struct TrackCatalog {
    assets: HashMap<TrackKey, TrackAsset>,
}

impl TrackCatalog {
    pub fn new(tracks: &HashMap<String, TrackAsset>) -> Self {
        let assets = tracks
            .iter()
            .map(|(key, asset)| (TrackKey::new(key.clone()), asset.clone()))
            .collect();
        Self { assets }
    }

    pub fn get(&self, key: &TrackKey) -> Option<&TrackAsset> {
        self.assets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TrackKey> {
        self.assets.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_maps_to_a_default_track() {
        let catalog = TrackCatalog::new(&default_tracks());
        for scenario in Scenario::ALL {
            for mood in scenario.moods() {
                let key = TrackKey::for_label(scenario, *mood);
                assert!(catalog.get(&key).is_some(), "no asset for {key}");
            }
        }
    }

    #[test]
    fn tense_shares_the_focus_track() {
        assert_eq!(
            TrackKey::for_label(Scenario::Office, Mood::Tense),
            TrackKey::for_label(Scenario::Office, Mood::Focused)
        );
        assert_eq!(
            TrackKey::for_label(Scenario::Date, Mood::DateGoneWrong).as_str(),
            "date_awkward"
        );
    }

    #[test]
    fn focus_track_skips_its_lead_in() {
        let tracks = default_tracks();
        assert_eq!(tracks["office_focus"].start_offset(), Duration::from_secs(20));
        assert_eq!(tracks["office_chill"].start_offset(), Duration::ZERO);
    }
}
