use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Office,
    Date,
    Workout,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    Focused,
    Break,
    /// Office only, and only while the anti-flip gate lets it through.
    Tense,
    Romantic,
    DateGoneWrong,
    Active,
    Resting,
}

pub const OFFICE_MOODS: &[Mood] = &[Mood::Focused, Mood::Break, Mood::Tense];
pub const DATE_MOODS: &[Mood] = &[Mood::Romantic, Mood::DateGoneWrong];
pub const WORKOUT_MOODS: &[Mood] = &[Mood::Active, Mood::Resting];

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Office, Scenario::Date, Scenario::Workout];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Office => "office",
            Scenario::Date => "date",
            Scenario::Workout => "workout",
        }
    }

    pub fn moods(&self) -> &'static [Mood] {
        match self {
            Scenario::Office => OFFICE_MOODS,
            Scenario::Date => DATE_MOODS,
            Scenario::Workout => WORKOUT_MOODS,
        }
    }

    pub fn permits(&self, mood: Mood) -> bool {
        self.moods().contains(&mood)
    }
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Focused,
        Mood::Break,
        Mood::Tense,
        Mood::Romantic,
        Mood::DateGoneWrong,
        Mood::Active,
        Mood::Resting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Focused => "focused",
            Mood::Break => "break",
            Mood::Tense => "tense",
            Mood::Romantic => "romantic",
            Mood::DateGoneWrong => "date-gone-wrong",
            Mood::Active => "active",
            Mood::Resting => "resting",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| format!("unknown scenario {s:?}"))
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == s)
            .ok_or_else(|| format!("unknown mood {s:?}"))
    }
}

/// The resolved classification for one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Label {
    pub scenario: Scenario,
    pub mood: Mood,
    pub confidence: f64,
    pub notes: String,
}

impl Label {
    pub fn new(scenario: Scenario, mood: Mood, confidence: f64, notes: impl Into<String>) -> Self {
        Self {
            scenario,
            mood,
            confidence,
            notes: notes.into(),
        }
    }

    /// Same (scenario, mood) pair, ignoring confidence and notes.
    pub fn same_state(&self, other: &Label) -> bool {
        self.scenario == other.scenario && self.mood == other.mood
    }
}
