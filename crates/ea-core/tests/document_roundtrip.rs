//! Integration tests: document → bytes → document round-trip, and file
//! load/save through the persistence gateway.

use ea_core::codec::{self, CodecError};
use ea_core::model::*;
use ea_core::{StickerId, Url, Vec2};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn assert_roundtrip(doc: &Document) {
    let bytes = codec::serialize(doc).expect("serialize failed");
    let back = codec::deserialize(&bytes).expect("deserialize failed");
    assert_eq!(
        &back,
        doc,
        "round-trip changed the document.\nEncoded:\n{}",
        String::from_utf8_lossy(&bytes)
    );
}

fn scratch_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ea-core-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

fn busy_document() -> Document {
    let mut doc = Document::new();
    for (i, glyph) in ["🚗", "🐶", "🍏", "☀️", "🏋️‍♀️"].iter().enumerate() {
        let i = i as i32;
        doc.add_sticker(*glyph, DocPoint::new(i * 37 - 90, 60 - i * 41), 20 + i * 7);
    }
    doc
}

// ─── Round-trip ──────────────────────────────────────────────────────────

#[test]
fn roundtrip_empty_document() {
    assert_roundtrip(&Document::new());
}

#[test]
fn roundtrip_each_background_kind() {
    let mut doc = busy_document();
    assert_roundtrip(&doc);

    doc.set_background(Background::Url(
        Url::parse("https://upload.example.org/images/sky%20blue.jpg?size=large").unwrap(),
    ));
    assert_roundtrip(&doc);

    doc.set_background(Background::Url(Url::parse("file:///tmp/background.png").unwrap()));
    assert_roundtrip(&doc);

    doc.set_background(Background::ImageData((0..=255).collect()));
    assert_roundtrip(&doc);

    doc.set_background(Background::ImageData(Vec::<u8>::new().into()));
    assert_roundtrip(&doc);
}

#[test]
fn roundtrip_after_edits() {
    let mut doc = busy_document();
    let first = doc.stickers()[0].id;
    let last = doc.stickers()[4].id;
    doc.move_sticker(first, Vec2::new(-12.5, 33.9)).unwrap();
    doc.scale_sticker(last, 1.75).unwrap();
    doc.remove_sticker(doc.stickers()[2].id).unwrap();
    assert_roundtrip(&doc);
}

#[test]
fn roundtrip_extreme_coordinates() {
    let mut doc = Document::new();
    doc.add_sticker("🛸", DocPoint::new(i32::MAX, i32::MIN), 1);
    doc.add_sticker("🛰", DocPoint::new(0, 0), i32::MAX);
    assert_roundtrip(&doc);
}

#[test]
fn ids_survive_reload_and_stay_fresh() {
    let mut doc = busy_document();
    // Remove the newest sticker so the highest id is no longer present.
    let newest = doc.stickers().last().unwrap().id;
    doc.remove_sticker(newest).unwrap();

    let mut reloaded = codec::deserialize(&codec::serialize(&doc).unwrap()).unwrap();
    let ids: Vec<StickerId> = reloaded.stickers().iter().map(|s| s.id).collect();
    let expected: Vec<StickerId> = doc.stickers().iter().map(|s| s.id).collect();
    assert_eq!(ids, expected);

    let fresh = reloaded.add_sticker("🆕", DocPoint::ORIGIN, 40).id;
    assert!(
        ids.iter().all(|id| *id < fresh),
        "fresh id {fresh} collides with or precedes a stored id"
    );
    assert!(fresh > newest, "removed id {newest} was handed out again");
}

// ─── Files ───────────────────────────────────────────────────────────────

#[test]
fn save_then_load_from_disk() {
    let path = scratch_path("save_then_load.emojiart");
    let mut doc = busy_document();
    doc.set_background(Background::ImageData(vec![9, 8, 7].into()));

    codec::save(&doc, &path).unwrap();
    assert_eq!(codec::load(&path).unwrap(), doc);

    // Saving again overwrites.
    let smaller = Document::with_sample_stickers();
    codec::save(&smaller, &path).unwrap();
    assert_eq!(codec::load(&path).unwrap(), smaller);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_missing_file_is_not_found() {
    let path = scratch_path("does_not_exist.emojiart");
    let _ = std::fs::remove_file(&path);
    match codec::load(&path) {
        Err(CodecError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn load_garbage_is_decoding_error() {
    let path = scratch_path("garbage.emojiart");
    std::fs::write(&path, b"\x00\x01 definitely not a document").unwrap();
    assert!(matches!(codec::load(&path), Err(CodecError::Decoding(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn save_into_missing_directory_is_write_error() {
    let path = scratch_path("no/such/dir/doc.emojiart");
    let err = codec::save(&Document::new(), &path).unwrap_err();
    assert!(matches!(err, CodecError::Write { .. }), "{err}");
}
