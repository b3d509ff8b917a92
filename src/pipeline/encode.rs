//! Media encoding: PNG file on disk → base64 payload for `storeMediaFile`.
//!
//! AnkiConnect accepts media inline in the JSON body, so each question and
//! answer image is read and base64-encoded (standard alphabet, padded) before
//! upload. The stored filename is the image's base name, which is also what
//! the note's `<img src>` references.

use crate::error::SyncError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::Path;
use tracing::trace;

/// One `storeMediaFile` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaFile {
    pub filename: String,
    pub data: String,
}

/// Base name of `path`, as stored in the flashcard application's media folder.
pub fn media_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read `path` and wrap it as a [`MediaFile`].
pub fn encode_media(path: &Path) -> Result<MediaFile, SyncError> {
    let bytes = std::fs::read(path).map_err(|e| SyncError::MediaRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let data = STANDARD.encode(&bytes);
    trace!("Encoded {} → {} bytes base64", path.display(), data.len());

    Ok(MediaFile {
        filename: media_filename(path),
        data,
    })
}

/// `<img src="{filename}">`
pub fn img_tag(filename: &str) -> String {
    format!("<img src=\"{filename}\">")
}
