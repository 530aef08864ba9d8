//! The editing session: one document plus everything that reacts to it.
//!
//! `DocumentSession` is owned by a single thread (the UI thread). Every edit
//! goes through [`DocumentSession::apply`], which schedules an autosave and,
//! when the background changed, re-resolves it. Background fetches and
//! autosave writes run on the Tokio runtime; their results only touch the
//! session when the owner calls [`DocumentSession::pump`] or awaits
//! [`DocumentSession::next_event`].

use crate::autosave::{Autosave, DEFAULT_AUTOSAVE_DELAY, FileTarget, SaveReport, SaveTarget};
use crate::fetch::{FetchError, Fetcher};
use crate::ingest::{DropPayload, ingest};
use crate::resolver::{BackgroundResolver, FetchOutcome, FetchStatus};
use ea_core::codec::{self, CodecError};
use ea_core::{
    Background, DocPoint, Document, ModelError, Point, Size, StickerId, Url, Vec2, ViewTransform,
};
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Duration;

// ─── Configuration ───────────────────────────────────────────────────────

/// Configuration for a [`DocumentSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where the document is restored from and autosaved to.
    /// Default: `Autosaved.emojiart` in the working directory.
    pub autosave_path: PathBuf,

    /// Quiet period after the last edit before the autosave fires.
    /// Default: **5 s**.
    pub autosave_delay: Duration,

    /// Size given to stickers created by a drop. Default: **40**.
    pub default_sticker_size: i32,

    /// Start from the sample stickers when there is nothing to restore.
    /// Default: **false**.
    pub seed_sample: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_path: PathBuf::from("Autosaved.emojiart"),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            default_sticker_size: 40,
            seed_sample: false,
        }
    }
}

// ─── Mutations & events ──────────────────────────────────────────────────

/// An edit to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentMutation {
    AddSticker {
        glyph: String,
        position: DocPoint,
        size: i32,
    },
    /// Offset is in document units.
    MoveSticker {
        id: StickerId,
        offset: Vec2,
    },
    ScaleSticker {
        id: StickerId,
        factor: f64,
    },
    RemoveSticker {
        id: StickerId,
    },
    SetBackground(Background),
}

/// Something that happened off-thread and has now been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A background fetch finished. `committed` is `false` if the document
    /// had moved on to another background and the result was dropped.
    BackgroundFetched { url: Url, committed: bool },
    /// An autosave finished.
    Saved { ok: bool },
}

// ─── Session ─────────────────────────────────────────────────────────────

pub struct DocumentSession<F, T = FileTarget> {
    document: Document,
    resolver: BackgroundResolver<F>,
    autosave: Autosave<T>,
    view: ViewTransform,
    config: SessionConfig,
    last_save_error: Option<CodecError>,
}

impl<F: Fetcher> DocumentSession<F, FileTarget> {
    /// Restore the document from the autosave file, or start a new one if
    /// there is nothing usable there.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(config: SessionConfig, fetcher: F) -> Self {
        let document = match codec::load(&config.autosave_path) {
            Ok(document) => {
                log::info!(
                    "restored {} stickers from {}",
                    document.stickers().len(),
                    config.autosave_path.display()
                );
                document
            }
            Err(CodecError::NotFound(_)) if config.seed_sample => Document::with_sample_stickers(),
            Err(CodecError::NotFound(_)) => Document::new(),
            Err(e) => {
                log::warn!("could not restore autosave, starting empty: {e}");
                Document::new()
            }
        };
        let target = FileTarget::new(config.autosave_path.clone());
        Self::with_parts(document, config, fetcher, target)
    }
}

impl<F: Fetcher, T: SaveTarget> DocumentSession<F, T> {
    /// Build a session around an existing document. Starts resolving its
    /// background immediately, so this must run inside a Tokio runtime.
    pub fn with_parts(document: Document, config: SessionConfig, fetcher: F, target: T) -> Self {
        let mut resolver = BackgroundResolver::new(fetcher);
        resolver.resolve(document.background());
        Self {
            document,
            resolver,
            autosave: Autosave::new(target, config.autosave_delay),
            view: ViewTransform::new(),
            config,
            last_save_error: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn background_image(&self) -> Option<&DynamicImage> {
        self.resolver.image()
    }

    pub fn fetch_status(&self) -> FetchStatus {
        self.resolver.status()
    }

    /// Why the current background has no image, if resolving it failed.
    pub fn background_failure(&self) -> Option<&FetchError> {
        self.resolver.failure()
    }

    /// The error from the most recent autosave, cleared by the next success.
    pub fn last_save_error(&self) -> Option<&CodecError> {
        self.last_save_error.as_ref()
    }

    pub fn autosave(&self) -> &Autosave<T> {
        &self.autosave
    }

    /// Apply an edit, then schedule an autosave of the result.
    ///
    /// A background is only re-resolved when it differs by value from the
    /// current one.
    pub fn apply(&mut self, mutation: DocumentMutation) -> Result<(), ModelError> {
        match mutation {
            DocumentMutation::AddSticker {
                glyph,
                position,
                size,
            } => {
                self.document.add_sticker(glyph, position, size);
            }
            DocumentMutation::MoveSticker { id, offset } => {
                self.document
                    .move_sticker(id, offset)
                    .inspect_err(|e| log::warn!("move ignored: {e}"))?;
            }
            DocumentMutation::ScaleSticker { id, factor } => {
                self.document
                    .scale_sticker(id, factor)
                    .inspect_err(|e| log::warn!("scale ignored: {e}"))?;
            }
            DocumentMutation::RemoveSticker { id } => {
                self.document
                    .remove_sticker(id)
                    .inspect_err(|e| log::warn!("remove ignored: {e}"))?;
            }
            DocumentMutation::SetBackground(background) => {
                let changed = *self.document.background() != background;
                self.document.set_background(background);
                if changed {
                    self.resolver.resolve(self.document.background());
                }
            }
        }
        self.autosave.schedule(self.document.clone());
        Ok(())
    }

    /// Move a sticker by an on-screen drag delta.
    pub fn drag_sticker(&mut self, id: StickerId, pixels: Vec2) -> Result<(), ModelError> {
        let offset = self.view.to_document_delta(pixels);
        self.apply(DocumentMutation::MoveSticker { id, offset })
    }

    /// Handle a drop at `location` on a canvas of size `frame`.
    ///
    /// Returns `false` if nothing in `payloads` was usable.
    pub fn drop_payloads(&mut self, payloads: &[DropPayload], location: Point, frame: Size) -> bool {
        let Some(mutation) = ingest(
            payloads,
            location,
            frame,
            &self.view,
            self.config.default_sticker_size,
        ) else {
            return false;
        };
        // Drops only add stickers or set the background, neither can miss.
        self.apply(mutation).is_ok()
    }

    /// Zoom so the resolved background fills `frame`. No-op without an image.
    pub fn zoom_to_fit(&mut self, frame: Size) -> bool {
        let Some(image) = self.resolver.image() else {
            return false;
        };
        let size = Size::new(f64::from(image.width()), f64::from(image.height()));
        self.view.zoom_to_fit(size, frame)
    }

    /// Apply every finished fetch and save without waiting. Returns the
    /// events in the order they were applied.
    pub fn pump(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(outcome) = self.resolver.try_next_outcome() {
            events.push(self.commit_outcome(outcome));
        }
        while let Some(report) = self.autosave.try_next_report() {
            events.push(self.record_report(report));
        }
        events
    }

    /// Wait for the next fetch or save to finish and apply it.
    ///
    /// Pends forever if neither is in flight.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        tokio::select! {
            Some(outcome) = self.resolver.next_outcome() => Some(self.commit_outcome(outcome)),
            Some(report) = self.autosave.next_report() => Some(self.record_report(report)),
            else => None,
        }
    }

    /// Write any pending autosave now. Call before shutting down.
    pub fn flush(&mut self) -> bool {
        match self.autosave.flush() {
            Some(result) => {
                self.record_report(SaveReport { result });
                true
            }
            None => false,
        }
    }

    fn commit_outcome(&mut self, outcome: FetchOutcome) -> SessionEvent {
        let url = outcome.url.clone();
        let committed = self.resolver.commit(outcome, self.document.background());
        SessionEvent::BackgroundFetched { url, committed }
    }

    fn record_report(&mut self, report: SaveReport) -> SessionEvent {
        match report.result {
            Ok(()) => {
                log::trace!("autosaved");
                self.last_save_error = None;
                SessionEvent::Saved { ok: true }
            }
            Err(e) => {
                log::error!("autosave failed: {e}");
                self.last_save_error = Some(e);
                SessionEvent::Saved { ok: false }
            }
        }
    }
}
