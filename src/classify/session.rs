use image::DynamicImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::sleep;
use uuid::Uuid;

use crate::audio::{TrackKey, TransitionEngine};
use crate::classifier::prompts::social_instructions;
use crate::classifier::schema::social_schema;
use crate::classifier::{parse_output, ClassifierRequest, SemanticClassifier, SocialOutput};
use crate::config::AppConfig;
use crate::error::{TickError, TickResult};
use crate::presentation::{DebugInfo, Decision, LabelUpdate, Presenter};
use crate::sensing::{Camera, Evidence, EvidenceExtractor, Frame, MotionLevel};
use crate::settings::Preferences;

use super::ambiguity::AmbiguityResolver;
use super::gate::{GateOutcome, GateScenario, ScenarioDecision, ScenarioGate};
use super::label::Label;
use super::mood::MoodResolver;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

const EVIDENCE_FRAMES: usize = 3;

/// Result of one scheduled tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Another tick was still running
    Skipped,
    Labeled(Label),
    Failed(TickError),
}

/// Collaborators a session talks to.
pub struct SessionParts {
    pub camera: Arc<dyn Camera>,
    pub classifier: Arc<dyn SemanticClassifier>,
    pub preferences: Arc<dyn Preferences>,
    pub presenter: Arc<dyn Presenter>,
    pub audio: TransitionEngine,
}

/// Held for the duration of a tick; clears the in-flight flag on every exit
/// path, including a tick future dropped on timeout.
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// With evidence in the prompt the schema makes the echo fields required, so a
/// reply without them breaks the contract. A mismatched echo is only logged.
fn check_echo(output: &SocialOutput, evidence: &Evidence) -> TickResult<()> {
    let (Some(level), Some(_), Some(_), Some(_)) = (
        output.motion_level,
        output.motion_score,
        output.posture_hint,
        output.posture_confidence,
    ) else {
        return Err(TickError::contract("Model output is missing the evidence echo."));
    };

    if level != evidence.motion_level {
        log_warn!(
            "Classifier echoed motion_level={level}, measured {}",
            evidence.motion_level
        );
    }
    Ok(())
}

/// Everything one classification run carries between ticks: the gate streak,
/// the last presented label and the audio engine.
pub struct MoodSession {
    id: Uuid,
    config: AppConfig,
    extractor: EvidenceExtractor,
    ambiguity: AmbiguityResolver,
    mood: MoodResolver,
    camera: Arc<dyn Camera>,
    classifier: Arc<dyn SemanticClassifier>,
    preferences: Arc<dyn Preferences>,
    presenter: Arc<dyn Presenter>,
    audio: TransitionEngine,
    gate: Mutex<ScenarioGate>,
    last_label: Mutex<Option<Label>>,
    in_flight: AtomicBool,
}

impl MoodSession {
    pub fn new(config: AppConfig, parts: SessionParts) -> Self {
        Self {
            id: Uuid::new_v4(),
            extractor: EvidenceExtractor::new(config.evidence.clone()),
            ambiguity: AmbiguityResolver::new(config.resolver.resting_pose_confidence),
            mood: MoodResolver::new(&config.resolver),
            gate: Mutex::new(ScenarioGate::new(config.gate.clone())),
            camera: parts.camera,
            classifier: parts.classifier,
            preferences: parts.preferences,
            presenter: parts.presenter,
            audio: parts.audio,
            last_label: Mutex::new(None),
            in_flight: AtomicBool::new(false),
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn audio(&self) -> &TransitionEngine {
        &self.audio
    }

    pub fn current_label(&self) -> Option<Label> {
        lock(&self.last_label).clone()
    }

    pub fn streak(&self) -> u32 {
        lock(&self.gate).streak()
    }

    /// Run one classification tick. Returns immediately with `Skipped` when a
    /// tick is already in flight.
    pub async fn tick(&self) -> TickOutcome {
        let Some(_guard) = TickGuard::acquire(&self.in_flight) else {
            log_debug!("Tick skipped: previous tick still running");
            return TickOutcome::Skipped;
        };

        match self.run_tick().await {
            Ok(label) => TickOutcome::Labeled(label),
            Err(err) => {
                log_warn!("Tick failed for session {}: {err}", self.id);
                self.presenter.report_error(&err);
                TickOutcome::Failed(err)
            }
        }
    }

    async fn run_tick(&self) -> TickResult<Label> {
        let api_key = self
            .preferences
            .api_key()
            .ok_or_else(|| TickError::acquisition("Missing OpenAI API key."))?;

        let evidence = self.sample_evidence().await?;
        let burst = self.capture_burst().await?;

        let (decision, local) = {
            let mut gate = lock(&self.gate);
            let decision = gate.decide(&evidence);
            let local = (decision.gate == GateOutcome::Definite(GateScenario::Workout))
                .then(|| gate.workout_label(&evidence));
            (decision, local)
        };
        log_debug!(
            "Gate: {:?} (streak {}), {}",
            decision.gate,
            decision.streak,
            evidence.summary()
        );

        let (label, kind) = match local {
            Some(label) => (label, Decision::LocalWorkout),
            None => self.classify(&api_key, &decision, burst, &evidence).await?,
        };

        self.publish(&label, &evidence, &decision, kind);
        Ok(label)
    }

    async fn classify(
        &self,
        api_key: &str,
        decision: &ScenarioDecision,
        burst: Vec<DynamicImage>,
        evidence: &Evidence,
    ) -> TickResult<(Label, Decision)> {
        // The resting-stance probe only makes sense for a subject that is not
        // moving hard.
        let probe_pose = decision.gate == GateOutcome::NeedsSemanticCheck
            && evidence.motion_level != MotionLevel::High;
        if probe_pose {
            if let Some(latest) = burst.last().cloned() {
                let probe = self
                    .ambiguity
                    .resolve(self.classifier.as_ref(), api_key, latest, evidence)
                    .await?;
                if let Some(label) = probe {
                    return Ok((label, Decision::RestingPose));
                }
            }
        }

        let label = self.classify_social(api_key, burst, evidence).await?;
        Ok((label, Decision::Classifier))
    }

    async fn classify_social(
        &self,
        api_key: &str,
        burst: Vec<DynamicImage>,
        evidence: &Evidence,
    ) -> TickResult<Label> {
        let include_evidence = self.config.resolver.prompt_evidence;
        let request = ClassifierRequest {
            instructions: social_instructions(burst.len(), include_evidence.then_some(evidence)),
            schema: social_schema(include_evidence),
            images: burst,
        };

        let raw = self.classifier.classify(api_key, &request).await?;
        let output: SocialOutput = parse_output(raw)?;

        if include_evidence {
            check_echo(&output, evidence)?;
        }

        let mut label = self.mood.resolve(&output, evidence)?;
        label.notes = format!(
            "{} (angry={}, {})",
            label.notes,
            output.angry,
            evidence.summary()
        );
        Ok(label)
    }

    fn publish(
        &self,
        label: &Label,
        evidence: &Evidence,
        decision: &ScenarioDecision,
        kind: Decision,
    ) {
        // The first label of a session has nothing to change from.
        let (first, changed) = {
            let mut last = lock(&self.last_label);
            let first = last.is_none();
            let changed = last.as_ref().is_some_and(|prev| !prev.same_state(label));
            *last = Some(label.clone());
            (first, changed)
        };

        let debug = self.preferences.debug_panel_open().then(|| DebugInfo {
            evidence: *evidence,
            streak: decision.streak,
            decision: kind,
        });
        self.presenter.present(&LabelUpdate::new(label, changed, debug));

        if first || changed {
            log_info!(
                "Session {}: {}/{} ({:.2})",
                self.id,
                label.scenario,
                label.mood,
                label.confidence
            );
        }

        let track = TrackKey::for_label(label.scenario, label.mood);
        self.audio.transition_to(Some(&track));
    }

    async fn grab(&self) -> TickResult<DynamicImage> {
        self.camera
            .grab()
            .await
            .map_err(|err| TickError::acquisition(format!("Camera unavailable: {err:#}")))
    }

    /// Three downsampled frames `evidence_spacing` apart, reduced to one reading.
    async fn sample_evidence(&self) -> TickResult<Evidence> {
        let spacing = self.config.sampling.evidence_spacing();
        let (width, height) = (
            self.config.evidence.frame_width,
            self.config.evidence.frame_height,
        );

        let mut frames = Vec::with_capacity(EVIDENCE_FRAMES);
        for i in 0..EVIDENCE_FRAMES {
            if i > 0 {
                sleep(spacing).await;
            }
            let image = self.grab().await?;
            frames.push(Frame::downsample(&image, width, height));
        }

        Ok(self
            .extractor
            .extract_window(&frames[0], &frames[1], &frames[2]))
    }

    /// Full-resolution frames for the classifier. Individual grab failures are
    /// tolerated; an empty burst is not.
    async fn capture_burst(&self) -> TickResult<Vec<DynamicImage>> {
        let count = self.config.sampling.burst_count;
        let spacing = self.config.sampling.burst_spacing();

        let mut burst = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                sleep(spacing).await;
            }
            match self.camera.grab().await {
                Ok(image) => burst.push(image),
                Err(err) => log_warn!("Burst frame {i} dropped: {err:#}"),
            }
        }

        if burst.is_empty() {
            return Err(TickError::acquisition("No frames yet (camera warming up)."));
        }
        Ok(burst)
    }
}
