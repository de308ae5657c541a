use std::sync::Arc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::classify::{MoodSession, TickOutcome};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Drive `session` at the configured interval until `cancel_token` fires.
///
/// Ticks run inline, so a slow tick delays the next one instead of overlapping
/// it; missed intervals are skipped rather than replayed.
pub async fn classification_loop(session: Arc<MoodSession>, cancel_token: CancellationToken) {
    let sampling = session.config().sampling.clone();
    let mut ticker = interval(sampling.check_every());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log_info!("classification loop started for session {}", session.id());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tokio::select! {
                    result = timeout(sampling.tick_timeout(), session.tick()) => match result {
                        Ok(TickOutcome::Labeled(label)) => {
                            log_debug!("tick labeled {}/{}", label.scenario, label.mood);
                        }
                        Ok(TickOutcome::Skipped | TickOutcome::Failed(_)) => {}
                        Err(_) => log_warn!(
                            "tick timeout (> {}ms) session {}",
                            sampling.tick_timeout_ms,
                            session.id()
                        ),
                    },
                    _ = cancel_token.cancelled() => {
                        log_info!("classification loop cancelled mid-tick");
                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("classification loop shutting down");
                break;
            }
        }
    }
}
