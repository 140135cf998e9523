//! JSON settings store tests

use ambience_core::{CoreError, Entry, EntryId, JsonFileSettings, SettingsStore, SourceKind};
use std::fs;
use tempfile::TempDir;

fn sample_entries() -> Vec<Entry> {
    vec![
        Entry::new(1, "Rain", SourceKind::LocalFile, "/tmp/rain.ogg"),
        Entry::new(2, "Forest", SourceKind::VideoLink, "https://video/xyz"),
        Entry::new(3, "Radio", SourceKind::WebUrl, "https://radio/stream.mp3"),
    ]
}

#[test]
fn missing_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSettings::open(dir.path().join("settings.json"));

    assert!(store.entries().unwrap().is_empty());
    assert_eq!(store.last_played().unwrap(), None);
}

#[test]
fn reads_resource_list_in_stored_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{
            "resources": [
                {"type": 0, "name": "Rain", "uri": "/tmp/rain.ogg", "id": 1},
                {"type": 2, "name": "Forest", "uri": "https://video/xyz", "id": 2}
            ],
            "last-played": 2
        }"#,
    )
    .unwrap();

    let store = JsonFileSettings::open(&path);
    let entries = store.entries().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Rain");
    assert_eq!(entries[1].source_kind, SourceKind::VideoLink);
    assert_eq!(store.last_played().unwrap(), Some(EntryId::new(2)));
}

#[test]
fn last_played_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let store = JsonFileSettings::open(&path);
    store.save_entries(sample_entries()).unwrap();
    store.set_last_played(EntryId::new(3)).unwrap();

    let reopened = JsonFileSettings::open(&path);
    assert_eq!(reopened.last_played().unwrap(), Some(EntryId::new(3)));
    assert_eq!(reopened.entries().unwrap(), sample_entries());
}

#[test]
fn setting_last_played_keeps_resources() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileSettings::open(dir.path().join("settings.json"));
    store.save_entries(sample_entries()).unwrap();

    store.set_last_played(EntryId::new(1)).unwrap();

    assert_eq!(store.entries().unwrap().len(), 3);
    assert_eq!(
        store.entry(EntryId::new(2)).unwrap().map(|e| e.locator),
        Some("https://video/xyz".to_string())
    );
}

#[test]
fn corrupt_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let store = JsonFileSettings::open(&path);
    assert!(matches!(store.entries(), Err(CoreError::Serialization(_))));
}
