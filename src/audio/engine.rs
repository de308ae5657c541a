use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

use crate::config::AudioConfig;

use super::backend::AudioBackend;
use super::fade::{spawn_fade, FadePlan};
use super::tracks::{TrackCatalog, TrackKey};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioChannelState {
    pub volume: f32,
    pub is_playing: bool,
}

/// Why a `transition_to` call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyKey,
    AlreadyCurrent,
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Skipped(SkipReason),
    Started { token: u64, from: Option<TrackKey> },
}

/// Mutable engine state. One mutex guards all of it, and the live token is
/// compared under that same lock, so a fade step can never interleave with a
/// transition.
pub(super) struct EngineState {
    pub(super) token: u64,
    pub(super) current: Option<TrackKey>,
    pub(super) last_switch_at: Option<Instant>,
    pub(super) channels: HashMap<TrackKey, AudioChannelState>,
}

pub(super) struct EngineInner {
    pub(super) backend: Arc<dyn AudioBackend>,
    pub(super) catalog: TrackCatalog,
    pub(super) config: AudioConfig,
    state: Mutex<EngineState>,
}

impl EngineInner {
    pub(super) fn lock(&self) -> MutexGuard<'_, EngineState> {
        // A panicking fade step must not silence the engine for good.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pause, rewind and silence one track.
    pub(super) fn halt(&self, state: &mut EngineState, key: &TrackKey) {
        self.backend.stop(key);
        state.channels.insert(key.clone(), AudioChannelState::default());
    }
}

/// Catalog tracks plus any track that has been touched, deduplicated.
fn known_keys(inner: &EngineInner, state: &EngineState) -> HashSet<TrackKey> {
    inner
        .catalog
        .keys()
        .chain(state.channels.keys())
        .cloned()
        .collect()
}

/// Crossfading soundtrack player.
///
/// At most one track is audible once a transition settles. Each accepted
/// transition allocates a new token; every fade loop captured the token it was
/// started with and quietly exits on its next step once the live token moves
/// on. Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct TransitionEngine {
    inner: Arc<EngineInner>,
}

impl TransitionEngine {
    pub fn new(backend: Arc<dyn AudioBackend>, config: AudioConfig) -> Self {
        let catalog = TrackCatalog::new(&config.tracks);
        Self {
            inner: Arc::new(EngineInner {
                backend,
                catalog,
                config,
                state: Mutex::new(EngineState {
                    token: 0,
                    current: None,
                    last_switch_at: None,
                    channels: HashMap::new(),
                }),
            }),
        }
    }

    /// Crossfade into `key`. Must be called from within a tokio runtime; the
    /// fades run as their own tasks and outlive this call.
    pub fn transition_to(&self, key: Option<&TrackKey>) -> TransitionOutcome {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return TransitionOutcome::Skipped(SkipReason::EmptyKey);
        };

        let inner = &self.inner;
        let mut state = inner.lock();

        if state.current.as_ref() == Some(key) {
            return TransitionOutcome::Skipped(SkipReason::AlreadyCurrent);
        }

        let now = Instant::now();
        if let Some(last) = state.last_switch_at {
            if now.duration_since(last) < inner.config.switch_cooldown() {
                log_debug!("Transition to {key} suppressed by cooldown");
                return TransitionOutcome::Skipped(SkipReason::Cooldown);
            }
        }
        state.last_switch_at = Some(now);

        let previous = state.current.replace(key.clone());
        state.token += 1;
        let token = state.token;

        // Anything still sounding besides the outgoing track is left over from
        // an interrupted fade.
        let stale: Vec<TrackKey> = known_keys(inner, &state)
            .into_iter()
            .filter(|k| previous.as_ref() != Some(k))
            .collect();
        for stale_key in &stale {
            inner.halt(&mut state, stale_key);
        }

        let is_playing = match inner.catalog.get(key) {
            Some(asset) => match inner.backend.start(key, asset) {
                Ok(()) => true,
                Err(err) => {
                    log_warn!("Track {key} failed to start: {err:#}");
                    false
                }
            },
            None => {
                log_warn!("No asset configured for track {key}");
                false
            }
        };
        let channel = state.channels.entry(key.clone()).or_default();
        channel.is_playing = is_playing;
        let fade_in_from = channel.volume;

        let fade_out_from = previous
            .as_ref()
            .and_then(|prev| state.channels.get(prev))
            .map(|c| c.volume);
        drop(state);

        log_info!(
            "Crossfading {} -> {key} (token {token})",
            previous.as_ref().map(TrackKey::as_str).unwrap_or("silence")
        );

        spawn_fade(
            Arc::clone(inner),
            FadePlan {
                key: key.clone(),
                from: fade_in_from,
                target: 1.0,
                stop_at_end: false,
                token,
            },
        );

        if let (Some(prev), Some(from)) = (previous.as_ref(), fade_out_from) {
            spawn_fade(
                Arc::clone(inner),
                FadePlan {
                    key: prev.clone(),
                    from,
                    target: 0.0,
                    stop_at_end: true,
                    token,
                },
            );
        }

        TransitionOutcome::Started {
            token,
            from: previous,
        }
    }

    /// Silence everything immediately and forget the current track. Used when
    /// the view is hidden; ignores the cooldown.
    pub fn force_stop_all(&self) {
        let inner = &self.inner;
        let mut state = inner.lock();
        state.token += 1;
        for key in &known_keys(inner, &state) {
            inner.halt(&mut state, key);
        }
        state.current = None;
        log_info!("All tracks stopped (token {})", state.token);
    }

    pub fn current_track(&self) -> Option<TrackKey> {
        self.inner.lock().current.clone()
    }

    pub fn live_token(&self) -> u64 {
        self.inner.lock().token
    }

    pub fn channel(&self, key: &TrackKey) -> AudioChannelState {
        self.inner
            .lock()
            .channels
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    pub fn channels(&self) -> HashMap<TrackKey, AudioChannelState> {
        self.inner.lock().channels.clone()
    }
}
