use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::PathBuf;

/// Source of live frames.
///
/// A failure means the camera is unavailable right now; callers treat it as
/// retryable on the next tick.
#[async_trait]
pub trait Camera: Send + Sync {
    async fn grab(&self) -> Result<DynamicImage>;
}

/// Reads the latest still written by an external capture process, for example
/// `ffmpeg -f v4l2 -i /dev/video0 -update 1 -y frame.jpg`.
pub struct SnapshotCamera {
    path: PathBuf,
}

impl SnapshotCamera {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Camera for SnapshotCamera {
    async fn grab(&self) -> Result<DynamicImage> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("camera snapshot {} unavailable", path.display()))?;
            // The writer may be mid-flush; a truncated file fails to decode and
            // the tick is retried.
            image::load_from_memory(&bytes)
                .map_err(|err| anyhow!("camera snapshot {} unreadable: {err}", path.display()))
        })
        .await
        .context("camera worker join failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    #[tokio::test]
    async fn reads_snapshot_from_disk() {
        let path = std::env::temp_dir().join(format!("ambiance-cam-{}.png", uuid::Uuid::new_v4()));
        RgbImage::from_pixel(32, 18, Rgb([1, 2, 3]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();

        let camera = SnapshotCamera::new(path.clone());
        let frame = camera.grab().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 18));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_error() {
        let camera = SnapshotCamera::new(std::env::temp_dir().join("ambiance-no-such-frame.jpg"));
        let err = camera.grab().await.unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }
}
