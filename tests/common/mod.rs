//! Stand-in transcoding engine for tests that must not depend on FFmpeg
//!
//! The stub `ffmpeg` answers `-version`, then concatenates its two `-i`
//! inputs (video first) into the last argument. The stub `ffprobe` always
//! reports a 1.5 second duration.

#![allow(dead_code)]

use karaoke_studio_lib::config::MediaConfig;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub const STUB_DURATION_MS: u64 = 1500;

const STUB_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffmpeg version 0.0-stub Copyright (c) the test suite"
    exit 0
fi
video=""
audio=""
prev=""
out=""
for arg in "$@"; do
    if [ "$prev" = "-i" ]; then
        if [ -z "$video" ]; then video="$arg"; else audio="$arg"; fi
    fi
    prev="$arg"
    out="$arg"
done
cat "$video" "$audio" > "$out"
"#;

/// Exits cleanly without writing anything
const SILENT_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffmpeg version 0.0-stub Copyright (c) the test suite"
fi
exit 0
"#;

const STUB_FFPROBE: &str = r#"#!/bin/sh
echo 1.500000
"#;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn stub_config(dir: &Path, ffmpeg_body: &str) -> MediaConfig {
    let bin = dir.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    MediaConfig {
        ffmpeg_path: write_script(&bin, "ffmpeg", ffmpeg_body),
        ffprobe_path: write_script(&bin, "ffprobe", STUB_FFPROBE),
        work_dir: Some(dir.join("arenas")),
        max_concurrent_jobs: 2,
    }
}

/// Media config whose engine concatenates video then audio
pub fn concat_engine(dir: &Path) -> MediaConfig {
    stub_config(dir, STUB_FFMPEG)
}

/// Media config whose engine succeeds without producing output
pub fn silent_engine(dir: &Path) -> MediaConfig {
    stub_config(dir, SILENT_FFMPEG)
}

/// Number of arenas still present under a stub config's work dir
pub fn arena_count(dir: &Path) -> usize {
    match std::fs::read_dir(dir.join("arenas")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}
