use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::classify::label::{Label, Mood, Scenario};
use crate::error::TickError;
use crate::sensing::Evidence;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Which branch of the pipeline produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Gate settled on workout from local evidence alone
    LocalWorkout,
    RestingPose,
    Classifier,
}

/// Extra detail attached only while the debug panel is open.
#[derive(Debug, Clone, Serialize)]
pub struct DebugInfo {
    pub evidence: Evidence,
    pub streak: u32,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelUpdate {
    pub scenario: Scenario,
    pub mood: Mood,
    pub confidence: f64,
    pub notes: String,
    /// False when scenario and mood match the previous tick
    pub changed: bool,
    pub decided_at: DateTime<Utc>,
    pub debug: Option<DebugInfo>,
}

impl LabelUpdate {
    pub fn new(label: &Label, changed: bool, debug: Option<DebugInfo>) -> Self {
        Self {
            scenario: label.scenario,
            mood: label.mood,
            confidence: label.confidence,
            notes: label.notes.clone(),
            changed,
            decided_at: Utc::now(),
            debug,
        }
    }
}

/// Sink for everything the user sees: labels and error statuses.
pub trait Presenter: Send + Sync {
    fn present(&self, update: &LabelUpdate);

    fn report_error(&self, error: &TickError);
}

/// Headless presenter that writes the first update and every change to the log.
#[derive(Debug, Default)]
pub struct LogPresenter {
    shown: AtomicBool,
}

impl LogPresenter {
    /// Whether `update` would be written. Flips the shown flag on first use.
    fn should_log(&self, update: &LabelUpdate) -> bool {
        let first = !self.shown.swap(true, Ordering::AcqRel);
        first || update.changed
    }
}

impl Presenter for LogPresenter {
    fn present(&self, update: &LabelUpdate) {
        if !self.should_log(update) {
            return;
        }
        log_info!(
            "{}/{} ({:.0}%) {}",
            update.scenario,
            update.mood,
            update.confidence * 100.0,
            update.notes
        );
        if let Some(debug) = &update.debug {
            match serde_json::to_string(debug) {
                Ok(json) => log_info!("debug: {json}"),
                Err(err) => log_warn!("debug info not serialisable: {err}"),
            }
        }
    }

    fn report_error(&self, error: &TickError) {
        log_warn!("{}: {error}", error.status());
    }
}
