//! Core document model for EmojiArt.
//!
//! A document is an ordered list of placed emoji stickers over a single
//! background. Sticker positions live in *document space*: integer
//! coordinates with the origin at the center of the canvas, independent of
//! the current pan and zoom. Insertion order is paint order.

use crate::id::{IdAllocator, StickerId};
use kurbo::Vec2;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

// ─── Geometry ────────────────────────────────────────────────────────────

/// An integer point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DocPoint {
    pub x: i32,
    pub y: i32,
}

impl DocPoint {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a real-valued delta, truncating each component toward zero.
    pub fn offset_by(self, delta: Vec2) -> Self {
        Self {
            x: self.x.saturating_add(delta.x as i32),
            y: self.y.saturating_add(delta.y as i32),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(f64::from(self.x), f64::from(self.y))
    }
}

impl From<(i32, i32)> for DocPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// ─── Stickers ────────────────────────────────────────────────────────────

/// One placed emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sticker {
    pub id: StickerId,
    /// The emoji text. Not validated here; drop ingestion filters it.
    pub glyph: String,
    pub position: DocPoint,
    /// Font size in document units.
    pub size: i32,
}

// ─── Background ──────────────────────────────────────────────────────────

/// The document's single backing image reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Blank,
    /// A locator to fetch from. May point at a local file or the network.
    Url(Url),
    /// Raw encoded image bytes, e.g. from a dropped image. Shared, so
    /// snapshotting a document does not copy the image.
    ImageData(Arc<[u8]>),
}

impl Background {
    pub fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            _ => None,
        }
    }

    pub fn image_data(&self) -> Option<&[u8]> {
        match self {
            Self::ImageData(data) => Some(data.as_ref()),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("no sticker with id {0} in document")]
    StickerNotFound(StickerId),
}

// ─── Document ────────────────────────────────────────────────────────────

/// The aggregate root: placed stickers plus one background.
///
/// Equality compares stickers and background only. The id counter is an
/// allocation detail; the codec persists it so removed ids stay retired.
#[derive(Debug, Clone, Default)]
pub struct Document {
    stickers: Vec<Sticker>,
    background: Background,
    ids: IdAllocator,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.stickers == other.stickers && self.background == other.background
    }
}

impl Eq for Document {}

impl Document {
    /// An empty document with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A document seeded with a couple of stickers, handy for a first launch
    /// and for previews.
    #[must_use]
    pub fn with_sample_stickers() -> Self {
        let mut doc = Self::new();
        doc.add_sticker("🍺", DocPoint::new(80, 80), 50);
        doc.add_sticker("🤣", DocPoint::new(-20, -120), 50);
        doc
    }

    /// Rebuild a document from persisted parts.
    ///
    /// Stickers keep their stored id when it is present and not already
    /// taken by an earlier sticker; everything else gets a fresh id above
    /// every stored one, so nothing is ever handed out twice.
    pub fn from_parts<I>(stickers: I, background: Background) -> Self
    where
        I: IntoIterator<Item = (Option<StickerId>, String, DocPoint, i32)>,
    {
        let parts: Vec<_> = stickers.into_iter().collect();
        let mut ids = IdAllocator::default();
        for (id, ..) in &parts {
            if let Some(id) = id {
                ids.reserve(id.get());
            }
        }

        let mut seen = HashSet::with_capacity(parts.len());
        let stickers = parts
            .into_iter()
            .map(|(id, glyph, position, size)| {
                let id = match id {
                    Some(id) if seen.insert(id) => id,
                    _ => {
                        let fresh = StickerId::new(ids.allocate());
                        seen.insert(fresh);
                        fresh
                    }
                };
                Sticker {
                    id,
                    glyph,
                    position,
                    size,
                }
            })
            .collect();

        Self {
            stickers,
            background,
            ids,
        }
    }

    /// The raw id the next added sticker will get.
    pub fn next_sticker_id(&self) -> u64 {
        self.ids.peek()
    }

    /// Make sure no id below `next` is handed out again.
    pub(crate) fn reserve_sticker_ids(&mut self, next: u64) {
        if let Some(highest) = next.checked_sub(1) {
            self.ids.reserve(highest);
        }
    }

    /// Stickers in paint order (first is at the back).
    pub fn stickers(&self) -> &[Sticker] {
        &self.stickers
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Look up a sticker by id.
    pub fn sticker(&self, id: StickerId) -> Option<&Sticker> {
        self.stickers.iter().find(|s| s.id == id)
    }

    fn sticker_mut(&mut self, id: StickerId) -> Result<&mut Sticker, ModelError> {
        self.stickers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ModelError::StickerNotFound(id))
    }

    /// Place a new sticker on top of the others and return it.
    pub fn add_sticker(
        &mut self,
        glyph: impl Into<String>,
        position: DocPoint,
        size: i32,
    ) -> &Sticker {
        let id = StickerId::new(self.ids.allocate());
        self.stickers.push(Sticker {
            id,
            glyph: glyph.into(),
            position,
            size,
        });
        let idx = self.stickers.len() - 1;
        &self.stickers[idx]
    }

    /// Move a sticker by a document-space offset. Fractional parts are
    /// truncated toward zero.
    pub fn move_sticker(&mut self, id: StickerId, offset: Vec2) -> Result<(), ModelError> {
        let sticker = self.sticker_mut(id)?;
        sticker.position = sticker.position.offset_by(offset);
        Ok(())
    }

    /// Multiply a sticker's size by `factor`, rounding half away from zero.
    pub fn scale_sticker(&mut self, id: StickerId, factor: f64) -> Result<(), ModelError> {
        let sticker = self.sticker_mut(id)?;
        sticker.size = scale_size(sticker.size, factor);
        Ok(())
    }

    /// Remove a sticker. Its id is not handed out again.
    pub fn remove_sticker(&mut self, id: StickerId) -> Result<Sticker, ModelError> {
        let idx = self
            .stickers
            .iter()
            .position(|s| s.id == id)
            .ok_or(ModelError::StickerNotFound(id))?;
        Ok(self.stickers.remove(idx))
    }

    /// Replace the background unconditionally.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }
}

/// `size * factor` rounded to the nearest integer, ties away from zero.
pub fn scale_size(size: i32, factor: f64) -> i32 {
    // `f64::round` already rounds ties away from zero; the cast saturates.
    (f64::from(size) * factor).round() as i32
}
