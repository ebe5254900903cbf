use std::fs;
use std::sync::Arc;

use tempfile::tempdir;
use vastra::application::favorites::{FAVORITES_STORAGE_KEY, FavoritesStore, LocalStorage};
use vastra::infra::local_store::{FileStorage, open_or_memory};

#[test]
fn entries_survive_reopening() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("store.json");

    let storage = FileStorage::open(&path).expect("open");
    assert_eq!(storage.get("greeting").expect("get"), None);
    storage.set("greeting", "namaste").expect("set");
    storage.set("other", "value").expect("set");
    storage.remove("other").expect("remove");

    let reopened = FileStorage::open(&path).expect("reopen");
    assert_eq!(
        reopened.get("greeting").expect("get").as_deref(),
        Some("namaste")
    );
    assert_eq!(reopened.get("other").expect("get"), None);
}

#[test]
fn corrupted_file_opens_empty_and_is_replaced() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.json");
    fs::write(&path, "{not json").expect("write");

    let storage = FileStorage::open(&path).expect("open");
    assert_eq!(storage.get("anything").expect("get"), None);

    storage.set("fresh", "start").expect("set");
    let contents = fs::read_to_string(&path).expect("read");
    let parsed: serde_json::Value = serde_json::from_str(&contents).expect("valid json");
    assert_eq!(parsed["fresh"], "start");
}

#[test]
fn removing_absent_key_leaves_no_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("store.json");

    let storage = FileStorage::open(&path).expect("open");
    storage.remove("missing").expect("remove");
    assert!(!path.exists());
}

#[test]
fn favorites_persist_across_sessions() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("favorites.json");

    let first = FavoritesStore::initialize(Arc::new(FileStorage::open(&path).expect("open")));
    assert!(first.toggle("saree-1"));
    assert!(first.toggle("kurta-7"));
    assert!(!first.toggle("saree-1"));
    drop(first);

    let storage = Arc::new(FileStorage::open(&path).expect("reopen"));
    let raw = storage
        .get(FAVORITES_STORAGE_KEY)
        .expect("get")
        .expect("persisted entry");
    assert_eq!(raw, r#"["kurta-7"]"#);

    let second = FavoritesStore::initialize(storage);
    assert_eq!(second.ids(), ["kurta-7"]);
    assert!(second.is_favorite("kurta-7"));

    second.clear();
    let reopened = FileStorage::open(&path).expect("reopen");
    assert_eq!(reopened.get(FAVORITES_STORAGE_KEY).expect("get"), None);
}

#[test]
fn unreadable_storage_falls_back_to_memory() {
    let dir = tempdir().expect("tempdir");

    assert!(FileStorage::open(dir.path()).is_err());

    let favorites = FavoritesStore::initialize(open_or_memory(dir.path()));
    assert_eq!(favorites.count(), 0);
    assert!(favorites.toggle("saree-1"));
    assert!(favorites.is_favorite("saree-1"));
    assert_eq!(favorites.ids(), ["saree-1"]);
    assert!(dir.path().is_dir());
}
