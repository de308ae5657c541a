use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::classify::MoodSession;

use super::loop_worker::classification_loop;

/// Owns the background classification task of one session.
pub struct LoopController {
    session: Arc<MoodSession>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl LoopController {
    pub fn new(session: Arc<MoodSession>) -> Self {
        Self {
            session,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            bail!("classification loop already active");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(classification_loop(
            Arc::clone(&self.session),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("classification loop task failed to join")
        } else {
            Ok(())
        }
    }

    /// Hiding the view silences audio at once; the next visible tick picks a
    /// track again.
    pub fn set_visibility(&self, hidden: bool) {
        if hidden {
            info!("View hidden, stopping all tracks");
            self.session.audio().force_stop_all();
        }
    }
}
