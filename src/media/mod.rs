//! Media composition module
//!
//! This module combines a recorded vocal track with the reference video into
//! a single webm file using FFmpeg.

pub mod ffmpeg;
pub mod muxer;
pub mod types;

pub use muxer::{EngineInfo, Muxer};
pub use types::{
    CompositeVideo, MediaAsset, MediaError, MediaKind, COMPOSITE_FILE_NAME, COMPOSITE_MIME,
};
