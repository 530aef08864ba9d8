//! Drag/drop ingestion: turns already-extracted drop payloads into a single
//! document mutation.
//!
//! Payload kinds are tried in a fixed order: a locator becomes the
//! background, then raw image bytes become the background, then the first
//! text whose leading grapheme is an emoji becomes a sticker at the drop
//! point. Only the first kind that matches is used.

use crate::session::DocumentMutation;
use ea_core::glyph::first_emoji;
use ea_core::{Background, Point, Size, Url, ViewTransform};

/// One item carried by a drop.
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    Url(Url),
    /// Encoded image bytes (PNG, JPEG).
    Image(Vec<u8>),
    Text(String),
}

/// Pick the mutation a drop at `location` (in pixels, relative to a canvas
/// of size `frame`) should produce, or `None` if nothing usable was dropped.
pub fn ingest(
    payloads: &[DropPayload],
    location: Point,
    frame: Size,
    view: &ViewTransform,
    sticker_size: i32,
) -> Option<DocumentMutation> {
    if let Some(url) = payloads.iter().find_map(|p| match p {
        DropPayload::Url(url) => Some(url),
        _ => None,
    }) {
        log::debug!("drop: background locator {url}");
        return Some(DocumentMutation::SetBackground(Background::Url(url.clone())));
    }

    if let Some(bytes) = payloads.iter().find_map(|p| match p {
        DropPayload::Image(bytes) => Some(bytes),
        _ => None,
    }) {
        log::debug!("drop: background image ({} bytes)", bytes.len());
        return Some(DocumentMutation::SetBackground(Background::ImageData(
            bytes.as_slice().into(),
        )));
    }

    let glyph = payloads.iter().find_map(|p| match p {
        DropPayload::Text(text) => first_emoji(text),
        _ => None,
    })?;
    let position = view.to_document_space(location, frame);
    log::debug!("drop: sticker {glyph} at ({}, {})", position.x, position.y);
    Some(DocumentMutation::AddSticker {
        glyph: glyph.to_string(),
        position,
        size: sticker_size,
    })
}
