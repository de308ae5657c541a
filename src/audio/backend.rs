use anyhow::{anyhow, Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{
    mpsc::{self, Sender},
    Mutex,
};
use std::thread;
use std::time::Duration;

use super::tracks::{TrackAsset, TrackKey};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

/// Playback primitives the transition engine drives. Implementations must be
/// cheap to call: the engine invokes them on every fade step.
pub trait AudioBackend: Send + Sync {
    /// Begin playback of `asset` at volume 0 from its start offset.
    fn start(&self, key: &TrackKey, asset: &TrackAsset) -> Result<()>;

    fn set_volume(&self, key: &TrackKey, volume: f32);

    /// Pause, rewind and silence.
    fn stop(&self, key: &TrackKey);
}

enum AudioCommand {
    Start {
        key: TrackKey,
        path: PathBuf,
        offset: Duration,
    },
    SetVolume {
        key: TrackKey,
        volume: f32,
    },
    Stop {
        key: TrackKey,
    },
}

/// rodio output owned by a dedicated thread.
///
/// `OutputStream` is not `Send`, so the stream and its sinks live on the
/// `audio-engine` thread and everything else talks to it over a channel. Each
/// track gets its own `Sink`; stopping a track drops its sink, so the next
/// start decodes from the top again.
pub struct RodioBackend {
    tx: Mutex<Option<Sender<AudioCommand>>>,
}

impl RodioBackend {
    pub fn new() -> Self {
        Self {
            tx: Mutex::new(None),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<AudioCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("audio command channel poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
                let mut sinks: HashMap<TrackKey, Sink> = HashMap::new();

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Start { key, path, offset } => {
                            if let Some(old) = sinks.remove(&key) {
                                old.stop();
                            }
                            match open_track(&mut output, &path, offset) {
                                Ok(sink) => {
                                    sinks.insert(key, sink);
                                }
                                Err(err) => {
                                    log_error!("Failed to start track {key}: {err:#}");
                                }
                            }
                        }
                        AudioCommand::SetVolume { key, volume } => {
                            if let Some(sink) = sinks.get(&key) {
                                sink.set_volume(volume.clamp(0.0, 1.0));
                            }
                        }
                        AudioCommand::Stop { key } => {
                            if let Some(sink) = sinks.remove(&key) {
                                sink.stop();
                            }
                        }
                    }
                }
                log_debug!("audio-engine thread exiting");
            })
            .context("failed to spawn audio-engine thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, cmd: AudioCommand) -> Result<()> {
        self.ensure_thread()?
            .send(cmd)
            .map_err(|_| anyhow!("audio-engine thread is gone"))
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn open_track(
    output: &mut Option<(OutputStream, OutputStreamHandle)>,
    path: &Path,
    offset: Duration,
) -> Result<Sink> {
    if output.is_none() {
        let pair = OutputStream::try_default().context("failed to open audio output")?;
        *output = Some(pair);
    }
    let Some((_, handle)) = output.as_ref() else {
        return Err(anyhow!("audio output unavailable"));
    };

    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let source = Decoder::new_looped(BufReader::new(file))
        .with_context(|| format!("cannot decode {}", path.display()))?
        .skip_duration(offset);

    let sink = Sink::try_new(handle).context("failed to create audio sink")?;
    sink.set_volume(0.0);
    sink.append(source);
    sink.play();
    Ok(sink)
}

impl AudioBackend for RodioBackend {
    fn start(&self, key: &TrackKey, asset: &TrackAsset) -> Result<()> {
        self.send(AudioCommand::Start {
            key: key.clone(),
            path: asset.path.clone(),
            offset: asset.start_offset(),
        })
    }

    fn set_volume(&self, key: &TrackKey, volume: f32) {
        if let Err(err) = self.send(AudioCommand::SetVolume {
            key: key.clone(),
            volume,
        }) {
            log_warn!("set_volume({key}) dropped: {err}");
        }
    }

    fn stop(&self, key: &TrackKey) {
        if let Err(err) = self.send(AudioCommand::Stop { key: key.clone() }) {
            log_warn!("stop({key}) dropped: {err}");
        }
    }
}
