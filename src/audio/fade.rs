use std::sync::Arc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::engine::EngineInner;
use super::tracks::TrackKey;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// One volume ramp, tied to the token of the transition that started it.
#[derive(Debug, Clone)]
pub(super) struct FadePlan {
    pub(super) key: TrackKey,
    pub(super) from: f32,
    pub(super) target: f32,
    pub(super) stop_at_end: bool,
    pub(super) token: u64,
}

/// Ramp `plan.key` towards `plan.target` over the configured crossfade, one
/// step per frame. The loop ends early and touches nothing once the live token
/// differs from `plan.token`.
pub(super) fn spawn_fade(inner: Arc<EngineInner>, plan: FadePlan) {
    let duration = inner.config.crossfade();
    let frame = inner.config.frame();

    tokio::spawn(async move {
        let started = Instant::now();
        let mut ticker = interval(frame);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let mut state = inner.lock();
            if state.token != plan.token {
                log_debug!(
                    "Fade of {} abandoned (token {} superseded by {})",
                    plan.key,
                    plan.token,
                    state.token
                );
                return;
            }

            let t = if duration.is_zero() {
                1.0
            } else {
                (started.elapsed().as_secs_f32() / duration.as_secs_f32()).min(1.0)
            };
            let volume = (plan.from + (plan.target - plan.from) * t).clamp(0.0, 1.0);

            state.channels.entry(plan.key.clone()).or_default().volume = volume;
            inner.backend.set_volume(&plan.key, volume);

            if t >= 1.0 {
                if plan.stop_at_end && plan.target == 0.0 {
                    inner.halt(&mut state, &plan.key);
                }
                log_debug!("Fade of {} settled at {volume:.2}", plan.key);
                return;
            }
        }
    });
}
