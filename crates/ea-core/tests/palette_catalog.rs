//! Integration tests: palette catalog mutations and write-through persistence.

use ea_core::palette::{DEFAULT_PALETTES, PaletteCatalog};
use ea_core::store::{DirStore, KeyValueStore, MemoryStore, StoreError};
use pretty_assertions::assert_eq;

/// A store whose writes can be switched off, to observe write failures.
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.set(key, value)
    }
}

fn names<S: KeyValueStore>(catalog: &PaletteCatalog<S>) -> Vec<String> {
    catalog.iter().map(|p| p.name.clone()).collect()
}

#[test]
fn insert_then_remove_restores_count() {
    let mut catalog = PaletteCatalog::open("Default", MemoryStore::new());
    for index in [0, 3, 6, 42] {
        let before = catalog.len();
        let clamped = index.min(before);
        catalog.insert("Scratch", "🧪", index);
        assert_eq!(catalog.len(), before + 1);
        assert_eq!(catalog.get(clamped).unwrap().name, "Scratch");
        catalog.remove(clamped);
        assert_eq!(catalog.len(), before);
    }
}

#[test]
fn inserted_ids_strictly_increase() {
    let mut catalog = PaletteCatalog::open("Default", MemoryStore::new());
    let mut highest = catalog.iter().map(|p| p.id).max().unwrap();
    for round in 0..10 {
        let id = catalog.insert(format!("P{round}"), "", round % 3).id;
        assert!(id > highest, "{id} is not above {highest}");
        highest = id;
        if round % 2 == 0 {
            // Removing the newest palette must not free its id.
            let at = catalog.index_of(id).unwrap();
            catalog.remove(at);
        }
    }
}

#[test]
fn catalog_restores_from_the_same_key() {
    let mut catalog = PaletteCatalog::open("Shared", MemoryStore::new());
    catalog.insert("Faces", "😀😂😍", 2);
    catalog.rename(0, "Tunes");
    catalog.remove(1);
    let expected = names(&catalog);
    let expected_ids: Vec<_> = catalog.iter().map(|p| p.id).collect();

    let store = catalog.store().clone();
    let reopened = PaletteCatalog::open("Shared", store);
    assert_eq!(names(&reopened), expected);
    assert_eq!(reopened.iter().map(|p| p.id).collect::<Vec<_>>(), expected_ids);
}

#[test]
fn catalogs_with_different_names_do_not_share_state() {
    let mut first = PaletteCatalog::open("One", MemoryStore::new());
    while first.len() > 1 {
        first.remove(0);
    }
    let store = first.store().clone();
    let second = PaletteCatalog::open("Two", store);
    assert_eq!(second.len(), DEFAULT_PALETTES.len());
}

#[test]
fn dir_store_survives_reopen() {
    let root = std::env::temp_dir().join(format!("ea-palettes-{}", std::process::id()));
    {
        let mut catalog = PaletteCatalog::open("Disk", DirStore::open(&root).unwrap());
        catalog.insert("Travel", "🗺️🧳", 0);
    }
    let catalog = PaletteCatalog::open("Disk", DirStore::open(&root).unwrap());
    assert_eq!(catalog.get(0).unwrap().name, "Travel");
    assert_eq!(catalog.len(), DEFAULT_PALETTES.len() + 1);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn corrupt_record_falls_back_to_defaults() {
    let mut store = MemoryStore::new();
    store.set("PaletteStore:Default", b"\xc1 not msgpack").unwrap();
    let catalog = PaletteCatalog::open("Default", store);
    assert_eq!(catalog.len(), DEFAULT_PALETTES.len());
}

#[test]
fn write_failures_are_observable() {
    let seeded = PaletteCatalog::open("Default", MemoryStore::new());
    assert!(seeded.last_store_error().is_none());

    let mut catalog = PaletteCatalog::open(
        "Default",
        FlakyStore {
            inner: seeded.store().clone(),
            fail_writes: true,
        },
    );
    catalog.insert("Lost", "", 0);
    assert!(matches!(catalog.last_store_error(), Some(StoreError::Io(_))));
    // The in-memory list still changed.
    assert_eq!(catalog.get(0).unwrap().name, "Lost");
}

#[test]
fn removed_newest_id_stays_retired_after_reopen() {
    let mut catalog = PaletteCatalog::open("Retired", MemoryStore::new());
    let newest = catalog.insert("Temporary", "⏳", 0).id;
    catalog.remove(catalog.index_of(newest).unwrap());

    let mut reopened = PaletteCatalog::open("Retired", catalog.store().clone());
    assert!(reopened.index_of(newest).is_none());
    let fresh = reopened.insert("Next", "🔜", 0).id;
    assert!(fresh > newest, "{fresh} reuses an id at or below {newest}");
}
