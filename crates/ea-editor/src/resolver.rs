//! Background resolution: turns the document's `Background` into pixels.
//!
//! Remote locators are fetched on the Tokio runtime. The result comes back
//! through a channel as a [`FetchOutcome`] and only takes effect through
//! [`BackgroundResolver::commit`], which the owning thread calls with the
//! document's *current* background. An outcome whose locator no longer
//! matches that background (by value) is stale and is dropped, so a slow
//! fetch can never overwrite a newer background. Superseded fetches are not
//! cancelled; they run to completion and get discarded.

use crate::fetch::{FetchError, Fetcher};
use ea_core::{Background, Url};
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
}

/// A finished fetch, waiting to be committed or discarded.
#[derive(Debug)]
pub struct FetchOutcome {
    pub url: Url,
    pub result: Result<DynamicImage, FetchError>,
}

/// Decode encoded image bytes (PNG or JPEG).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, FetchError> {
    Ok(image::load_from_memory(bytes)?)
}

pub struct BackgroundResolver<F> {
    fetcher: Arc<F>,
    image: Option<DynamicImage>,
    status: FetchStatus,
    failure: Option<FetchError>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
}

impl<F: Fetcher> BackgroundResolver<F> {
    pub fn new(fetcher: F) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            image: None,
            status: FetchStatus::Idle,
            failure: None,
            outcome_tx,
            outcome_rx,
        }
    }

    /// The decoded background, if any.
    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Why the current background has no image, if resolving it failed.
    pub fn failure(&self) -> Option<&FetchError> {
        self.failure.as_ref()
    }

    /// Start resolving `background`. Call whenever the document's
    /// background changes.
    ///
    /// Embedded bytes decode synchronously; a locator spawns a fetch, so this
    /// must be called from within a Tokio runtime.
    pub fn resolve(&mut self, background: &Background) {
        self.image = None;
        self.failure = None;

        match background {
            Background::Blank => {
                self.status = FetchStatus::Idle;
            }
            Background::ImageData(bytes) => {
                self.status = FetchStatus::Idle;
                match decode_image(bytes) {
                    Ok(image) => self.image = Some(image),
                    Err(e) => {
                        log::warn!("embedded background could not be decoded: {e}");
                        self.failure = Some(e);
                    }
                }
            }
            Background::Url(url) => {
                self.status = FetchStatus::Fetching;
                self.spawn_fetch(url.clone());
            }
        }
    }

    fn spawn_fetch(&self, url: Url) {
        log::debug!("fetching background {url}");
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = match fetcher.fetch(&url).await {
                Ok(bytes) => decode_image(&bytes),
                Err(e) => Err(e),
            };
            // The receiver lives as long as the resolver; if it is gone
            // nobody is left to show the image.
            let _ = tx.send(FetchOutcome { url, result });
        });
    }

    /// A finished fetch, if one is ready. Never blocks.
    pub fn try_next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.try_recv().ok()
    }

    /// Wait for the next finished fetch.
    pub async fn next_outcome(&mut self) -> Option<FetchOutcome> {
        self.outcome_rx.recv().await
    }

    /// Apply `outcome` if `current` still refers to the fetched locator.
    ///
    /// Returns `true` if the outcome was committed, `false` if it was stale.
    pub fn commit(&mut self, outcome: FetchOutcome, current: &Background) -> bool {
        if current.url() != Some(&outcome.url) {
            log::debug!("discarding stale background fetch for {}", outcome.url);
            return false;
        }

        self.status = FetchStatus::Idle;
        match outcome.result {
            Ok(image) => {
                log::info!(
                    "background {} resolved ({}x{})",
                    outcome.url,
                    image.width(),
                    image.height()
                );
                self.image = Some(image);
                self.failure = None;
            }
            Err(e) => {
                log::warn!("background {} failed to resolve: {e}", outcome.url);
                self.image = None;
                self.failure = Some(e);
            }
        }
        true
    }
}
