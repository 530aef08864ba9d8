//! Persisted document blob: JSON encode/decode plus file load/save.
//!
//! Wire shape:
//!
//! ```json
//! {
//!   "stickers": [{ "glyph": "🍺", "x": 80, "y": 80, "size": 50, "id": 1 }],
//!   "background": "blank" | { "url": "https://…" } | { "imageData": "<base64>" },
//!   "nextId": 2
//! }
//! ```
//!
//! A missing `background` decodes as blank. A missing sticker `id` gets a
//! fresh one on load; `nextId` keeps ids of removed stickers retired.

use crate::id::StickerId;
use crate::model::{Background, DocPoint, Document};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed document: {0}")]
    Decoding(#[source] serde_json::Error),

    #[error("failed to encode document: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error("no document at {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ─── Wire records ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRecord {
    stickers: Vec<StickerRecord>,
    #[serde(default)]
    background: BackgroundRecord,
    #[serde(default, rename = "nextId", skip_serializing_if = "Option::is_none")]
    next_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StickerRecord {
    glyph: String,
    x: i32,
    y: i32,
    size: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<StickerId>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum BackgroundRecord {
    #[default]
    Blank,
    Url(Url),
    ImageData(#[serde(with = "base64_bytes")] Vec<u8>),
}

mod base64_bytes {
    use super::BASE64;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s.as_bytes()).map_err(de::Error::custom)
    }
}

impl From<&Background> for BackgroundRecord {
    fn from(bg: &Background) -> Self {
        match bg {
            Background::Blank => Self::Blank,
            Background::Url(url) => Self::Url(url.clone()),
            Background::ImageData(data) => Self::ImageData(data.to_vec()),
        }
    }
}

impl From<BackgroundRecord> for Background {
    fn from(rec: BackgroundRecord) -> Self {
        match rec {
            BackgroundRecord::Blank => Self::Blank,
            BackgroundRecord::Url(url) => Self::Url(url),
            BackgroundRecord::ImageData(data) => Self::ImageData(data.into()),
        }
    }
}

// ─── Encode / decode ─────────────────────────────────────────────────────

/// Encode a document into its persisted byte form.
pub fn serialize(document: &Document) -> Result<Vec<u8>, CodecError> {
    let record = DocumentRecord {
        stickers: document
            .stickers()
            .iter()
            .map(|s| StickerRecord {
                glyph: s.glyph.clone(),
                x: s.position.x,
                y: s.position.y,
                size: s.size,
                id: Some(s.id),
            })
            .collect(),
        background: document.background().into(),
        next_id: Some(document.next_sticker_id()),
    };
    serde_json::to_vec(&record).map_err(CodecError::Encoding)
}

/// Decode a document from its persisted byte form.
///
/// # Errors
/// `CodecError::Decoding` if the bytes are not a valid document, including an
/// unknown background variant.
pub fn deserialize(bytes: &[u8]) -> Result<Document, CodecError> {
    let record: DocumentRecord = serde_json::from_slice(bytes).map_err(CodecError::Decoding)?;
    let stickers = record
        .stickers
        .into_iter()
        .map(|s| (s.id, s.glyph, DocPoint::new(s.x, s.y), s.size));
    let mut document = Document::from_parts(stickers, record.background.into());
    if let Some(next) = record.next_id {
        document.reserve_sticker_ids(next);
    }
    Ok(document)
}

// ─── Files ───────────────────────────────────────────────────────────────

/// Read and decode the document stored at `path`.
pub fn load(path: &Path) -> Result<Document, CodecError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            CodecError::NotFound(path.to_path_buf())
        } else {
            CodecError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let document = deserialize(&bytes)?;
    log::debug!(
        "loaded document from {} ({} stickers)",
        path.display(),
        document.stickers().len()
    );
    Ok(document)
}

/// Encode `document` and write it to `path`, replacing whatever was there.
///
/// Writes to a sibling temp file first and renames it over the target, so a
/// failed write never leaves a truncated document behind.
pub fn save(document: &Document, path: &Path) -> Result<(), CodecError> {
    let bytes = serialize(document)?;
    let tmp = temp_sibling(path);
    let write_err = |source| CodecError::Write {
        path: path.to_path_buf(),
        source,
    };

    std::fs::write(&tmp, &bytes).map_err(write_err)?;
    if let Err(source) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    log::debug!("saved document to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
