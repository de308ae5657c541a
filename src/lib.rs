pub mod audio;
pub mod classifier;
pub mod classify;
pub mod config;
pub mod error;
pub mod presentation;
pub mod sensing;
pub mod settings;
pub mod utils;

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use audio::{RodioBackend, TransitionEngine};
use classifier::OpenAiClassifier;
use classify::{MoodSession, SessionParts};
use config::AppConfig;
use presentation::LogPresenter;
use sensing::{LoopController, SnapshotCamera};
use settings::SettingsStore;

/// Path of the JSON config file; missing file means defaults.
pub const CONFIG_ENV: &str = "AMBIANCE_CONFIG";
pub const SETTINGS_ENV: &str = "AMBIANCE_SETTINGS";

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn build_session() -> Result<MoodSession> {
    let config_path = path_from_env(CONFIG_ENV, "ambiance.json");
    let config = AppConfig::load(&config_path)?;

    let settings_path = path_from_env(SETTINGS_ENV, "settings.json");
    let settings = SettingsStore::new(&settings_path)?;

    let classifier = OpenAiClassifier::new(config.classifier.clone())?;
    let audio = TransitionEngine::new(Arc::new(RodioBackend::new()), config.audio.clone());

    let parts = SessionParts {
        camera: Arc::new(SnapshotCamera::new(config.camera.snapshot_path.clone())),
        classifier: Arc::new(classifier),
        preferences: Arc::new(settings),
        presenter: Arc::new(LogPresenter::default()),
        audio,
    };
    Ok(MoodSession::new(config, parts))
}

async fn serve() -> Result<()> {
    let session = Arc::new(build_session()?);
    log::info!(
        "Session {} ready (camera: {})",
        session.id(),
        session.config().camera.snapshot_path.display()
    );

    let mut controller = LoopController::new(Arc::clone(&session));
    controller.start()?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    log::info!("Shutting down...");

    controller.set_visibility(true);
    controller.stop().await
}

pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    log::info!("Ambiance starting up...");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("failed to start tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(serve()) {
        log::error!("Ambiance exited with error: {err:#}");
        std::process::exit(1);
    }
}
