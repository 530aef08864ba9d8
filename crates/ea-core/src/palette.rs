//! Palette catalog: named emoji collections shown beside the canvas.
//!
//! The catalog is independent of any document. Every change is written
//! straight through to a [`KeyValueStore`] under `PaletteStore:<name>`, and
//! opening a catalog restores from the same key. A fresh store is seeded
//! with the default palettes.

use crate::glyph::emoji_graphemes;
use crate::id::PaletteId;
use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Palettes seeded into an empty catalog, in insertion order.
pub const DEFAULT_PALETTES: &[(&str, &str)] = &[
    (
        "Vehicles",
        "🚗🚕🚙🚌🚎🏎🚓🚑🚒🚐🚚🚛🚜🛴🚲🛵🏍🛺🚔🚍🚘🚖🚡🚠🚟🚃🚋🚞🚝🚄🚅🚈🚂🚆🚇🚊🚉✈️🛫🛬🛩🛸🚀🛰🚁🛶⛵️🚤🛥🛳⛴🚢",
    ),
    (
        "Animals",
        "🐶🐱🐭🐹🐰🦊🐻🐼🐨🐯🦁🐮🐷🐽🐸🐵🦄🐞🐍🐢🐠🐅🐆🦓🦍🐘🦛🦏🐪🐫🦒🦘🐃🐂🐄🐎🐖🐏🐑🦙🐐🦌🐕🐩🐈🐓🦃🦚🦜🦢🐲🐉🦕🦖🌸💮🏵️🌹🥀🌺🌻🌼🌷🍀☘️🌾🌵🎄",
    ),
    (
        "Food",
        "🍏🍎🍐🍊🍋🍌🍉🍇🍓🍈🍒🍑🍍🥦🥬🌽🥕🍖🍗🍔🍟🍕🥪🍳🧀🍿🥗🍲🍙🍣🍱🍛🍜🍝🍠🍞🥐🥖🥨🍰🎂🥮🍨🍩🍪🥛🍵",
    ),
    (
        "Weather",
        "☀️🌤️⛅🌥️🌦️☁️🌧️⛈️🌩️⚡🌨️❄️🌬️💨💧💦☔⛱️🌞🌛🌜🌚🌝🌖🌗🌘🌑🌒🌓🌔🌙⭐🌟🔥💥🌈",
    ),
    (
        "Sports",
        "⚽⚾🏀🏐🏈🎾🎱🏓🏸🥊🥋🎣⛸️🎿⛷️🏂🏋️‍♀️🤺🏌️‍♀️🏇⛹️‍♀️🤾‍♀️🏊‍♀️🤽‍♀️🚣‍♀️🧘‍♀️🚴‍♀️🤼",
    ),
    (
        "Music",
        "🎵🎶🎼🎹🎺🎸🎷🎻🪕🪗🪘🥁🔔🎤🎧🎙️🎚️🎛️📻📣📯",
    ),
];

/// A named collection of emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    /// The glyphs, concatenated. Use [`Palette::glyphs`] to iterate them.
    pub emojis: String,
    pub id: PaletteId,
}

impl Palette {
    /// The palette's glyphs as grapheme clusters.
    pub fn glyphs(&self) -> impl Iterator<Item = &str> {
        self.emojis.graphemes(true)
    }
}

/// An ordered, persisted list of palettes.
pub struct PaletteCatalog<S> {
    name: String,
    palettes: Vec<Palette>,
    store: S,
    /// Highest id ever handed out, so removing the newest palette does not
    /// free its id.
    highest_id: u64,
    last_store_error: Option<StoreError>,
}

impl<S: KeyValueStore> PaletteCatalog<S> {
    /// Open the catalog called `name`, restoring it from `store` or seeding
    /// the defaults when nothing usable is stored.
    pub fn open(name: impl Into<String>, store: S) -> Self {
        let mut catalog = Self {
            name: name.into(),
            palettes: Vec::new(),
            store,
            highest_id: 0,
            last_store_error: None,
        };
        catalog.restore();
        if catalog.palettes.is_empty() {
            log::info!("seeding default palettes for catalog `{}`", catalog.name);
            // Each default goes to the front, like a user pressing "New".
            for (name, emojis) in DEFAULT_PALETTES {
                catalog.insert(*name, *emojis, 0);
            }
        }
        catalog
    }

    /// The key this catalog is stored under.
    pub fn store_key(&self) -> String {
        format!("PaletteStore:{}", self.name)
    }

    /// The key the highest id ever handed out is stored under.
    pub fn highest_id_key(&self) -> String {
        format!("{}:HighestId", self.store_key())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Palette> {
        self.palettes.iter()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The error from the most recent failed write, cleared by the next
    /// successful one.
    pub fn last_store_error(&self) -> Option<&StoreError> {
        self.last_store_error.as_ref()
    }

    /// The palette at `index`, clamped into range. `None` only when empty.
    pub fn get(&self, index: usize) -> Option<&Palette> {
        let last = self.palettes.len().checked_sub(1)?;
        self.palettes.get(index.min(last))
    }

    /// Position of the palette with `id`.
    pub fn index_of(&self, id: PaletteId) -> Option<usize> {
        self.palettes.iter().position(|p| p.id == id)
    }

    /// The index after `current`, wrapping around. `0` for an empty catalog.
    pub fn next_index(&self, current: usize) -> usize {
        match self.palettes.len() {
            0 => 0,
            n => (current + 1) % n,
        }
    }

    /// Insert a new palette at `index` (clamped to `0..=len`) with a fresh id.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        emojis: impl Into<String>,
        index: usize,
    ) -> &Palette {
        let max_existing = self.palettes.iter().map(|p| p.id.get()).max().unwrap_or(0);
        self.highest_id = self.highest_id.max(max_existing) + 1;
        let palette = Palette {
            name: name.into(),
            emojis: emojis.into(),
            id: PaletteId::new(self.highest_id),
        };
        let index = index.min(self.palettes.len());
        self.palettes.insert(index, palette);
        self.persist();
        &self.palettes[index]
    }

    /// Remove the palette at `index`.
    ///
    /// Returns the index to select next (`index` modulo the new length), or
    /// `None` when the catalog is now empty or `index` was out of range.
    pub fn remove(&mut self, index: usize) -> Option<usize> {
        if index >= self.palettes.len() {
            return None;
        }
        let removed = self.palettes.remove(index);
        log::debug!("removed palette `{}` ({})", removed.name, removed.id);
        self.persist();
        match self.palettes.len() {
            0 => None,
            n => Some(index % n),
        }
    }

    /// Rename the palette at `index` (clamped).
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Option<&Palette> {
        let index = index.min(self.palettes.len().checked_sub(1)?);
        self.palettes[index].name = name.into();
        self.persist();
        self.palettes.get(index)
    }

    /// Replace the glyphs of the palette at `index` (clamped).
    ///
    /// Non-emoji text is dropped and repeated glyphs keep their first
    /// occurrence only.
    pub fn set_emojis(&mut self, index: usize, emojis: &str) -> Option<&Palette> {
        let index = index.min(self.palettes.len().checked_sub(1)?);
        let mut seen = HashSet::new();
        let cleaned: String = emoji_graphemes(emojis).filter(|g| seen.insert(*g)).collect();
        self.palettes[index].emojis = cleaned;
        self.persist();
        self.palettes.get(index)
    }

    fn restore(&mut self) {
        let key = self.store_key();
        let bytes = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return,
            Err(e) => {
                log::warn!("could not read palettes under `{key}`: {e}");
                return;
            }
        };
        match rmp_serde::from_slice::<Vec<Palette>>(&bytes) {
            Ok(palettes) => {
                let max_existing = palettes.iter().map(|p| p.id.get()).max().unwrap_or(0);
                self.highest_id = self.restore_highest_id().max(max_existing);
                log::debug!("restored {} palettes from `{key}`", palettes.len());
                self.palettes = palettes;
            }
            Err(e) => log::warn!("discarding unreadable palettes under `{key}`: {e}"),
        }
    }

    fn restore_highest_id(&self) -> u64 {
        let key = self.highest_id_key();
        match self.store.get(&key) {
            Ok(Some(bytes)) => rmp_serde::from_slice(&bytes)
                .inspect_err(|e| log::warn!("ignoring unreadable `{key}`: {e}"))
                .unwrap_or(0),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("could not read `{key}`: {e}");
                0
            }
        }
    }

    fn persist(&mut self) {
        let key = self.store_key();
        let highest_key = self.highest_id_key();
        let result = rmp_serde::to_vec_named(&self.palettes)
            .map_err(StoreError::from)
            .and_then(|bytes| self.store.set(&key, &bytes))
            .and_then(|()| Ok(rmp_serde::to_vec(&self.highest_id)?))
            .and_then(|bytes| self.store.set(&highest_key, &bytes));
        match result {
            Ok(()) => self.last_store_error = None,
            Err(e) => {
                log::error!("failed to store palettes under `{key}`: {e}");
                self.last_store_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn catalog() -> PaletteCatalog<MemoryStore> {
        PaletteCatalog::open("Test", MemoryStore::new())
    }

    #[test]
    fn empty_store_is_seeded_with_defaults() {
        let c = catalog();
        assert_eq!(c.len(), DEFAULT_PALETTES.len());
        // Defaults are pushed to the front one by one, so the last is first.
        assert_eq!(c.get(0).unwrap().name, "Music");
        assert_eq!(c.get(usize::MAX).unwrap().name, "Vehicles");
        assert!(c.store().contains_key("PaletteStore:Test"));
    }

    #[test]
    fn insert_clamps_index_and_allocates_fresh_id() {
        let mut c = catalog();
        let before_max = c.iter().map(|p| p.id).max().unwrap();
        let id = c.insert("New", "", 999).id;
        assert!(id > before_max);
        assert_eq!(c.get(c.len() - 1).unwrap().name, "New");
    }

    #[test]
    fn ids_never_reused_after_removing_newest() {
        let mut c = catalog();
        let newest = c.insert("Temp", "", 0).id;
        c.remove(0);
        let next = c.insert("Again", "", 0).id;
        assert!(next > newest);
    }

    #[test]
    fn remove_returns_wrapped_next_index() {
        let mut c = catalog();
        let last = c.len() - 1;
        assert_eq!(c.remove(last), Some(0));
        assert_eq!(c.remove(1), Some(1));
        assert_eq!(c.remove(99), None);
    }

    #[test]
    fn removing_last_palette_returns_none() {
        let mut c = catalog();
        while c.len() > 1 {
            c.remove(0);
        }
        assert_eq!(c.remove(0), None);
        assert!(c.is_empty());
        assert!(c.get(0).is_none());
        assert_eq!(c.next_index(3), 0);
    }

    #[test]
    fn next_index_wraps() {
        let c = catalog();
        assert_eq!(c.next_index(0), 1);
        assert_eq!(c.next_index(c.len() - 1), 0);
    }

    #[test]
    fn set_emojis_filters_and_dedups() {
        let mut c = catalog();
        let p = c.set_emojis(0, "🎵x🎵🎶 ").unwrap();
        assert_eq!(p.emojis, "🎵🎶");
        assert_eq!(p.glyphs().count(), 2);
    }

    #[test]
    fn rename_clamps_index() {
        let mut c = catalog();
        let id = c.rename(usize::MAX, "Cars").unwrap().id;
        assert_eq!(c.index_of(id), Some(c.len() - 1));
        assert_eq!(c.get(c.len() - 1).unwrap().name, "Cars");
    }
}
