//! Audio/video muxer
//!
//! Combines a sung audio track with the reference video into one webm file.
//! Each call works in its own temporary arena so concurrent calls never share
//! input or output paths.

use crate::config::MediaConfig;
use crate::media::ffmpeg;
use crate::media::types::{CompositeVideo, MediaAsset, MediaError, MediaKind};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::{OnceCell, Semaphore};

/// Output file name inside an arena
const OUTPUT_FILE: &str = "output.webm";

/// Prefix for arena directory names
const ARENA_PREFIX: &str = "mux-";

/// Details about the transcoding engine, detected on first use
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub version: String,
}

/// Combines audio and video tracks using FFmpeg
pub struct Muxer {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    work_root: PathBuf,
    engine: OnceCell<EngineInfo>,
    permits: Semaphore,
}

impl Muxer {
    /// Create a muxer; the engine is not touched until first use
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            work_root: config.work_root(),
            engine: OnceCell::new(),
            permits: Semaphore::new(config.max_concurrent_jobs.max(1)),
        }
    }

    /// Initialize the engine once; later calls return the cached result
    pub async fn init(&self) -> Result<&EngineInfo, MediaError> {
        self.engine
            .get_or_try_init(|| async {
                let version = ffmpeg::engine_version(&self.ffmpeg).await?;
                tracing::info!("Transcoding engine ready: FFmpeg {}", version);
                Ok::<_, MediaError>(EngineInfo { version })
            })
            .await
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    /// Engine details, if initialization has already succeeded
    pub fn engine_info(&self) -> Option<&EngineInfo> {
        self.engine.get()
    }

    /// Combine an audio track and a video track into one webm composite
    ///
    /// The video stream is copied as-is and the audio is re-encoded; the
    /// result is as long as the shorter input.
    pub async fn combine(
        &self,
        audio: &MediaAsset,
        video: &MediaAsset,
    ) -> Result<CompositeVideo, MediaError> {
        audio.expect_kind(MediaKind::Audio)?;
        video.expect_kind(MediaKind::Video)?;

        self.init().await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MediaError::EngineUnavailable("muxer is closed".to_string()))?;

        let arena = self.create_arena().await?;
        let result = self.mux_in(arena.path(), audio, video).await;
        release_arena(arena).await;
        result
    }

    /// Write both inputs into `arena`, run FFmpeg and read the output back
    async fn mux_in(
        &self,
        arena: &Path,
        audio: &MediaAsset,
        video: &MediaAsset,
    ) -> Result<CompositeVideo, MediaError> {
        tracing::debug!(
            "Muxing {} bytes of audio with {} bytes of video in {:?}",
            audio.len(),
            video.len(),
            arena
        );

        let video_path = arena.join(format!("video.{}", ffmpeg::extension_for_mime(&video.mime)));
        let audio_path = arena.join(format!("audio.{}", ffmpeg::extension_for_mime(&audio.mime)));
        let output_path = arena.join(OUTPUT_FILE);

        tokio::fs::write(&video_path, &video.data).await?;
        tokio::fs::write(&audio_path, &audio.data).await?;

        let args = ffmpeg::mux_args(&video_path, &audio_path, &output_path);
        ffmpeg::run_ffmpeg(&self.ffmpeg, &args).await?;

        let data = match tokio::fs::read(&output_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::Ffmpeg("FFmpeg produced no output".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let duration_ms = match self.probe_duration_ms(&output_path).await {
            Ok(ms) => Some(ms),
            Err(e) => {
                tracing::warn!("Could not probe composite duration: {}", e);
                None
            }
        };

        tracing::info!(
            "Composite ready: {} bytes, duration {:?} ms",
            data.len(),
            duration_ms
        );

        Ok(CompositeVideo {
            data: Bytes::from(data),
            duration_ms,
        })
    }

    /// Duration of a media file in milliseconds
    pub async fn probe_duration_ms(&self, path: &Path) -> Result<u64, MediaError> {
        ffmpeg::probe_duration_ms(&self.ffprobe, path).await
    }

    /// Create a uniquely named working directory under the work root
    pub(crate) async fn create_arena(&self) -> Result<TempDir, MediaError> {
        let root = self.work_root.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&root)?;
            tempfile::Builder::new().prefix(ARENA_PREFIX).tempdir_in(&root)
        })
        .await
        .map_err(|e| MediaError::Io(std::io::Error::other(e)))?
        .map_err(MediaError::from)
    }
}

/// Remove an arena and everything in it off the async runtime
///
/// If the calling future is cancelled first, the arena is removed by
/// `TempDir`'s drop instead.
async fn release_arena(arena: TempDir) {
    let path = arena.path().to_path_buf();
    match tokio::task::spawn_blocking(move || arena.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Failed to remove arena {:?}: {}", path, e),
        Err(e) => tracing::warn!("Arena cleanup task failed for {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(work_dir: &Path, ffmpeg: &str) -> MediaConfig {
        MediaConfig {
            ffmpeg_path: PathBuf::from(ffmpeg),
            ffprobe_path: PathBuf::from("ffprobe"),
            work_dir: Some(work_dir.to_path_buf()),
            max_concurrent_jobs: 2,
        }
    }

    #[tokio::test]
    async fn test_arenas_are_distinct() {
        let dir = tempdir().unwrap();
        let muxer = Muxer::new(&config(dir.path(), "ffmpeg"));

        let first = muxer.create_arena().await.unwrap();
        let second = muxer.create_arena().await.unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(dir.path()));
        assert!(first
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(ARENA_PREFIX));
    }

    #[tokio::test]
    async fn test_arena_removed_on_drop() {
        let dir = tempdir().unwrap();
        let muxer = Muxer::new(&config(dir.path(), "ffmpeg"));

        let arena = muxer.create_arena().await.unwrap();
        let path = arena.path().to_path_buf();
        assert!(path.exists());
        drop(arena);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_release_arena_removes_contents() {
        let dir = tempdir().unwrap();
        let muxer = Muxer::new(&config(dir.path(), "ffmpeg"));

        let arena = muxer.create_arena().await.unwrap();
        let path = arena.path().to_path_buf();
        std::fs::write(path.join(OUTPUT_FILE), b"webm").unwrap();

        release_arena(arena).await;
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_combine_rejects_swapped_inputs() {
        let dir = tempdir().unwrap();
        let muxer = Muxer::new(&config(dir.path(), "/nonexistent/ffmpeg"));

        let audio = MediaAsset::new(vec![0u8; 16], "audio/webm");
        let video = MediaAsset::new(vec![0u8; 16], "video/webm");

        let err = muxer.combine(&video, &audio).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedMime { .. }));
        // Kind checks run before the engine is touched
        assert!(!muxer.is_initialized());
    }

    #[tokio::test]
    async fn test_missing_engine() {
        let dir = tempdir().unwrap();
        let muxer = Muxer::new(&config(dir.path(), "/nonexistent/ffmpeg"));

        let err = muxer.init().await.unwrap_err();
        assert!(matches!(err, MediaError::EngineUnavailable(_)));
        assert!(!muxer.is_initialized());

        let audio = MediaAsset::new(vec![0u8; 16], "audio/webm");
        let video = MediaAsset::new(vec![0u8; 16], "video/webm");
        let err = muxer.combine(&audio, &video).await.unwrap_err();
        assert!(matches!(err, MediaError::EngineUnavailable(_)));

        // No arena is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
