//! Muxer checks
//!
//! The stub-engine tests always run. The real-FFmpeg tests return early when
//! FFmpeg (or the codecs it needs) is missing.

#[cfg(unix)]
mod common;

use karaoke_studio_lib::config::MediaConfig;
use karaoke_studio_lib::media::{MediaAsset, MediaError, Muxer};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::{tempdir, TempDir};
use tokio::process::Command;

async fn run_quiet(program: &str, args: &[&str]) -> Option<Vec<u8>> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    output.status.success().then_some(output.stdout)
}

/// Generate a VP8 test pattern and an Opus tone, or None if FFmpeg can't
async fn make_tracks(dir: &Path, video_secs: f64, audio_secs: f64) -> Option<(PathBuf, PathBuf)> {
    let video = dir.join("backing.webm");
    let audio = dir.join("vocals.webm");

    run_quiet(
        "ffmpeg",
        &[
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x48:rate=10",
            "-t",
            &video_secs.to_string(),
            "-c:v",
            "libvpx",
            "-b:v",
            "100k",
            video.to_str()?,
        ],
    )
    .await?;

    run_quiet(
        "ffmpeg",
        &[
            "-y",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=440:sample_rate=48000",
            "-t",
            &audio_secs.to_string(),
            "-c:a",
            "libopus",
            audio.to_str()?,
        ],
    )
    .await?;

    Some((video, audio))
}

/// Per-packet hashes of a file's video stream
async fn video_packet_hashes(path: &Path) -> Vec<String> {
    let out = run_quiet(
        "ffmpeg",
        &[
            "-i",
            path.to_str().unwrap(),
            "-map",
            "0:v:0",
            "-c",
            "copy",
            "-f",
            "framemd5",
            "-",
        ],
    )
    .await
    .unwrap();

    String::from_utf8_lossy(&out)
        .lines()
        .filter(|l| !l.starts_with('#'))
        .filter_map(|l| l.rsplit(',').next().map(|h| h.trim().to_string()))
        .collect()
}

async fn setup(
    video_secs: f64,
    audio_secs: f64,
) -> Option<(TempDir, Muxer, MediaAsset, MediaAsset)> {
    run_quiet("ffmpeg", &["-version"]).await?;
    run_quiet("ffprobe", &["-version"]).await?;

    let dir = tempdir().unwrap();
    let (video_path, audio_path) = make_tracks(dir.path(), video_secs, audio_secs).await?;

    let muxer = Muxer::new(&MediaConfig {
        work_dir: Some(dir.path().join("arenas")),
        ..MediaConfig::default()
    });
    let video = MediaAsset::new(std::fs::read(&video_path).unwrap(), "video/webm");
    let audio = MediaAsset::new(std::fs::read(&audio_path).unwrap(), "audio/webm");

    Some((dir, muxer, audio, video))
}

#[cfg(unix)]
#[tokio::test]
async fn test_concurrent_combines_keep_their_inputs() {
    let dir = tempdir().unwrap();
    let muxer = Muxer::new(&common::concat_engine(dir.path()));

    let first_audio = MediaAsset::new(b"A1".to_vec(), "audio/webm");
    let first_video = MediaAsset::new(b"V1".to_vec(), "video/webm");
    let second_audio = MediaAsset::new(b"A2".to_vec(), "audio/ogg");
    let second_video = MediaAsset::new(b"V2".to_vec(), "video/mp4");

    let (first, second) = tokio::join!(
        muxer.combine(&first_audio, &first_video),
        muxer.combine(&second_audio, &second_video)
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(&first.data[..], b"V1A1");
    assert_eq!(&second.data[..], b"V2A2");
    assert_eq!(first.duration_ms, Some(common::STUB_DURATION_MS));
    assert_eq!(second.mime(), "video/webm");

    let engine = muxer.engine_info().unwrap();
    assert_eq!(engine.version, "0.0-stub");
    assert_eq!(common::arena_count(dir.path()), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_without_output_is_an_error() {
    let dir = tempdir().unwrap();
    let muxer = Muxer::new(&common::silent_engine(dir.path()));

    let audio = MediaAsset::new(b"A".to_vec(), "audio/webm");
    let video = MediaAsset::new(b"V".to_vec(), "video/webm");

    let err = muxer.combine(&audio, &video).await.unwrap_err();
    assert!(matches!(err, MediaError::Ffmpeg(ref msg) if msg.contains("no output")));
    assert_eq!(common::arena_count(dir.path()), 0);
}

#[tokio::test]
async fn test_video_stream_copied_unchanged() {
    let Some((dir, muxer, audio, video)) = setup(2.0, 2.0).await else {
        eprintln!("FFmpeg with libvpx/libopus not available, skipping");
        return;
    };

    let composite = muxer.combine(&audio, &video).await.unwrap();
    assert!(muxer.is_initialized());

    let input_path = dir.path().join("backing.webm");
    let output_path = dir.path().join("composite.webm");
    std::fs::write(&output_path, &composite.data).unwrap();

    let input_hashes = video_packet_hashes(&input_path).await;
    let output_hashes = video_packet_hashes(&output_path).await;

    assert!(!output_hashes.is_empty());
    // -shortest may drop a trailing packet, never alter one
    assert!(output_hashes.len() * 10 >= input_hashes.len() * 9);
    assert_eq!(output_hashes[..], input_hashes[..output_hashes.len()]);

    // The arena is gone once combine returns
    let arenas = std::fs::read_dir(dir.path().join("arenas")).unwrap().count();
    assert_eq!(arenas, 0);
}

#[tokio::test]
async fn test_output_truncated_to_shorter_audio() {
    let Some((_dir, muxer, audio, video)) = setup(3.0, 1.0).await else {
        eprintln!("FFmpeg with libvpx/libopus not available, skipping");
        return;
    };

    let composite = muxer.combine(&audio, &video).await.unwrap();
    let duration_ms = composite.duration_ms.expect("ffprobe should read the composite");

    assert!(
        (700..=1600).contains(&duration_ms),
        "expected about 1000 ms, got {}",
        duration_ms
    );
}

#[tokio::test]
async fn test_output_truncated_to_shorter_video() {
    let Some((_dir, muxer, audio, video)) = setup(1.0, 3.0).await else {
        eprintln!("FFmpeg with libvpx/libopus not available, skipping");
        return;
    };

    let composite = muxer.combine(&audio, &video).await.unwrap();
    let duration_ms = composite.duration_ms.expect("ffprobe should read the composite");

    assert!(
        (700..=1600).contains(&duration_ms),
        "expected about 1000 ms, got {}",
        duration_ms
    );
}

#[tokio::test]
async fn test_concurrent_combines_do_not_interfere() {
    let Some((_dir, muxer, audio, video)) = setup(1.0, 1.0).await else {
        eprintln!("FFmpeg with libvpx/libopus not available, skipping");
        return;
    };

    let (first, second) = tokio::join!(
        muxer.combine(&audio, &video),
        muxer.combine(&audio, &video)
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(!first.data.is_empty());
    assert!(!second.data.is_empty());
    assert!(first.duration_ms.is_some());
    assert!(second.duration_ms.is_some());
}
