//! Media types and errors
//!
//! This module defines the in-memory media blobs handed to the muxer and the
//! errors the transcoding engine can produce.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME type of every composite the muxer produces
pub const COMPOSITE_MIME: &str = "video/webm";

/// File name given to every composite
pub const COMPOSITE_FILE_NAME: &str = "karaoke.webm";

/// Broad kind of a media blob, taken from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a MIME type, ignoring parameters such as `;codecs=opus`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        if essence.starts_with("audio/") {
            Some(MediaKind::Audio)
        } else if essence.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// An opaque audio or video blob with its MIME type
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub data: Bytes,
    pub mime: String,
    /// Name the client gave the file, if any
    pub file_name: Option<String>,
}

impl MediaAsset {
    pub fn new(data: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail unless this asset is of the expected kind
    pub fn expect_kind(&self, expected: MediaKind) -> Result<(), MediaError> {
        match self.kind() {
            Some(kind) if kind == expected => Ok(()),
            _ => Err(MediaError::UnsupportedMime {
                expected,
                actual: self.mime.clone(),
            }),
        }
    }
}

/// The muxer's output: one `video/webm` file
#[derive(Debug, Clone)]
pub struct CompositeVideo {
    pub data: Bytes,
    /// Output duration, when ffprobe could read it
    pub duration_ms: Option<u64>,
}

impl CompositeVideo {
    pub fn mime(&self) -> &'static str {
        COMPOSITE_MIME
    }

    /// View the composite as an uploadable asset
    pub fn into_asset(self) -> MediaAsset {
        MediaAsset::new(self.data, COMPOSITE_MIME).with_file_name(COMPOSITE_FILE_NAME)
    }
}

/// Media errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Transcoding engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Expected {expected:?} input, got MIME type '{actual}'")]
    UnsupportedMime { expected: MediaKind, actual: String },

    #[error("Probe error: {0}")]
    Probe(String),
}
