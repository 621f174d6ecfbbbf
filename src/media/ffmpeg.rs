//! FFmpeg process wrappers for the muxer
//!
//! This module builds the fixed mux command line and runs the `ffmpeg` and
//! `ffprobe` binaries as child processes.

use crate::media::types::MediaError;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Audio codec the composite's audio stream is re-encoded to
pub const AUDIO_CODEC: &str = "libopus";

/// Audio bitrate for the re-encoded stream
pub const AUDIO_BITRATE: &str = "128k";

/// How many trailing stderr lines to keep in error messages
const STDERR_TAIL_LINES: usize = 12;

/// Pick a file extension for an input blob so FFmpeg's probing has a hint
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "video/webm" | "audio/webm" => "webm",
        "video/mp4" | "audio/mp4" | "audio/x-m4a" => "mp4",
        "video/quicktime" => "mov",
        "video/x-matroska" | "audio/x-matroska" => "mkv",
        "audio/ogg" | "video/ogg" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/aac" => "aac",
        "audio/flac" => "flac",
        _ => "bin",
    }
}

/// Build the fixed mux command line
///
/// Video stream 0 of the first input is copied untouched, audio stream 0 of
/// the second input is re-encoded to Opus, and the output stops at the end of
/// the shorter input.
pub fn mux_args(video_path: &Path, audio_path: &Path, output_path: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        video_path.to_string_lossy().to_string(),
        "-i".to_string(),
        audio_path.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        AUDIO_CODEC.to_string(),
        "-b:a".to_string(),
        AUDIO_BITRATE.to_string(),
        "-shortest".to_string(),
        "-f".to_string(),
        "webm".to_string(),
        output_path.to_string_lossy().to_string(),
    ]
}

/// Run `ffmpeg -version` and return the reported version string
pub async fn engine_version(ffmpeg: &Path) -> Result<String, MediaError> {
    let output = Command::new(ffmpeg)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| MediaError::EngineUnavailable(format!("{}: {}", ffmpeg.display(), e)))?;

    if !output.status.success() {
        return Err(MediaError::EngineUnavailable(format!(
            "{} -version exited with {}",
            ffmpeg.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_version(&stdout).unwrap_or_else(|| "unknown".to_string()))
}

/// Run FFmpeg with the given arguments, failing on a non-zero exit
pub async fn run_ffmpeg(ffmpeg: &Path, args: &[String]) -> Result<(), MediaError> {
    tracing::debug!("Running FFmpeg: {:?}", args);

    let output = Command::new(ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| MediaError::Ffmpeg(format!("Failed to start FFmpeg: {}", e)))?;

    if !output.status.success() {
        return Err(MediaError::Ffmpeg(format!(
            "FFmpeg exited with {}: {}",
            output.status,
            stderr_tail(&output.stderr, STDERR_TAIL_LINES)
        )));
    }

    Ok(())
}

/// Get a media file's duration in milliseconds using ffprobe
pub async fn probe_duration_ms(ffprobe: &Path, path: &Path) -> Result<u64, MediaError> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| MediaError::Probe(format!("Failed to start ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(MediaError::Probe(format!(
            "ffprobe failed: {}",
            stderr_tail(&output.stderr, STDERR_TAIL_LINES)
        )));
    }

    parse_duration_ms(&String::from_utf8_lossy(&output.stdout))
}

fn parse_version(stdout: &str) -> Option<String> {
    // "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) ..."
    stdout
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

fn parse_duration_ms(stdout: &str) -> Result<u64, MediaError> {
    let text = stdout.trim();
    let secs: f64 = text
        .parse()
        .map_err(|_| MediaError::Probe(format!("Unreadable duration '{}'", text)))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(MediaError::Probe(format!("Invalid duration '{}'", text)));
    }
    Ok((secs * 1000.0).round() as u64)
}

fn stderr_tail(stderr: &[u8], max_lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn test_mux_args_copy_video() {
        let args = mux_args(
            &PathBuf::from("/arena/video.webm"),
            &PathBuf::from("/arena/audio.ogg"),
            &PathBuf::from("/arena/output.webm"),
        );
        assert_eq!(args[position(&args, "-c:v") + 1], "copy");
        assert_eq!(args[position(&args, "-c:a") + 1], "libopus");
        assert!(args.contains(&"-shortest".to_string()));
        assert_eq!(args.last().unwrap(), "/arena/output.webm");
    }

    #[test]
    fn test_mux_args_input_order() {
        let args = mux_args(
            &PathBuf::from("v.webm"),
            &PathBuf::from("a.webm"),
            &PathBuf::from("out.webm"),
        );
        let inputs: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-i")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(inputs, ["v.webm", "a.webm"]);

        // Video comes from input 0, audio from input 1
        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, ["0:v:0", "1:a:0"]);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("video/webm;codecs=vp8,opus"), "webm");
        assert_eq!(extension_for_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_for_mime("audio/x-wav"), "wav");
        assert_eq!(extension_for_mime("application/x-unknown"), "bin");
    }

    #[test]
    fn test_parse_version() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\nbuilt with gcc";
        assert_eq!(parse_version(out), Some("6.1.1-3ubuntu5".to_string()));
        assert_eq!(parse_version("garbage"), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_ms("12.345678\n").unwrap(), 12346);
        assert_eq!(parse_duration_ms("0").unwrap(), 0);
        assert!(parse_duration_ms("N/A").is_err());
        assert!(parse_duration_ms("-1.0").is_err());
    }

    #[test]
    fn test_stderr_tail() {
        let stderr = b"line1\nline2\n\nline3\nline4\n";
        assert_eq!(stderr_tail(stderr, 2), "line3\nline4");
        assert_eq!(stderr_tail(b"", 5), "");
    }
}
