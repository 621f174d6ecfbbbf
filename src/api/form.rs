//! Multipart form reading
//!
//! Buffers every part of a `multipart/form-data` body so handlers can look
//! fields up by name.

use crate::media::MediaAsset;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use std::collections::HashMap;

/// MIME type assumed for parts that declare none
const DEFAULT_PART_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone)]
struct FormPart {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

/// A fully buffered multipart form
#[derive(Debug, Default)]
pub struct FormData {
    parts: HashMap<String, FormPart>,
}

/// Why a form could not be read
#[derive(Debug)]
pub enum FormError {
    /// Body exceeded the configured upload limit
    TooLarge,
    /// Anything else: not multipart, truncated, malformed
    Malformed(String),
}

impl From<MultipartError> for FormError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            FormError::TooLarge
        } else {
            FormError::Malformed(e.body_text())
        }
    }
}

impl FormData {
    /// Read every part of the body; the first part with a given name wins
    pub async fn read(mut multipart: Multipart) -> Result<Self, FormError> {
        let mut parts = HashMap::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let content_type = field.content_type().map(str::to_string);
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;

            tracing::trace!("Form part '{}': {} bytes", name, data.len());
            parts.entry(name).or_insert(FormPart {
                data,
                content_type,
                file_name,
            });
        }

        Ok(Self { parts })
    }

    /// A file part as a media asset
    ///
    /// Parts sent without a `filename` are plain form values, not files, and
    /// count as absent.
    pub fn file(&self, name: &str) -> Option<MediaAsset> {
        let part = self.parts.get(name)?;
        let file_name = part.file_name.clone()?;
        let mime = part
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_PART_MIME.to_string());
        Some(MediaAsset::new(part.data.clone(), mime).with_file_name(file_name))
    }

    /// A part as trimmed text; blank or non-UTF-8 values count as absent
    pub fn text(&self, name: &str) -> Option<String> {
        let part = self.parts.get(name)?;
        let text = std::str::from_utf8(&part.data).ok()?.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}
