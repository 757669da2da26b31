//! On-disk last-known-good catalog and offline mode.

mod common;

use std::fs;

use tempfile::TempDir;

use rawline_sdk::models::{ContentPatch, NewItem};
use rawline_sdk::store::memory::Failure;
use rawline_sdk::{
    MemoryStore, RawlineClient, RawlineError, RemoteStore, SnapshotCache, StaticAuthenticator,
    SyncHealth,
};

fn cached_client(dir: &TempDir, store: MemoryStore) -> RawlineClient {
    RawlineClient::builder()
        .store(store)
        .media(common::ScriptedMedia::new())
        .authenticator(StaticAuthenticator::new(
            common::OPERATOR_EMAIL,
            common::OPERATOR_PASSWORD,
        ))
        .cache_dir(dir.path())
        .build()
        .unwrap()
}

#[test]
fn successful_reload_writes_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = common::store_with_pieces(2).with_content(ContentPatch::hero_title("CACHED"));
    let client = cached_client(&dir, store);

    let cache = client.snapshot_cache().unwrap();
    assert!(cache.path().exists());
    assert!(!dir.path().join("catalog.json.tmp").exists());

    let saved = cache.load().unwrap();
    assert_eq!(saved.items.len(), 2);
    assert_eq!(saved.content.hero_title, "CACHED");
}

#[test]
fn failed_reload_does_not_overwrite_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = common::store_with_pieces(2);
    let mut client = cached_client(&dir, store.clone());
    let before = fs::read_to_string(client.snapshot_cache().unwrap().path()).unwrap();

    store.create_item(&NewItem::archive("RL-3")).unwrap();
    store.fail_next(Failure::Network);
    client.reload();

    let after = fs::read_to_string(client.snapshot_cache().unwrap().path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn offline_mode_starts_from_snapshot() {
    let dir = TempDir::new().unwrap();
    let online = cached_client(&dir, common::store_with_pieces(3));
    let synced = online.state().items.clone();
    drop(online);

    let offline = RawlineClient::builder()
        .offline(true)
        .cache_dir(dir.path())
        .build()
        .unwrap();

    assert_eq!(offline.state().items, synced);
    assert!(!offline.state().loading);
    assert_eq!(offline.health(), SyncHealth::Offline);
    assert_eq!(
        offline.state().last_error.as_deref(),
        Some("Cloud Link Failed: Offline Mode")
    );
}

#[test]
fn offline_mode_without_snapshot_shows_seed() {
    let dir = TempDir::new().unwrap();
    let mut client = RawlineClient::builder()
        .offline(true)
        .cache_dir(dir.path())
        .build()
        .unwrap();

    assert_eq!(client.catalog().count(), 6);
    assert_eq!(client.health(), SyncHealth::Offline);
    assert!(!client.snapshot_cache().unwrap().path().exists());

    let mut admin = client.admin();
    admin.login(common::OPERATOR_EMAIL, common::OPERATOR_PASSWORD);
    assert!(!admin.is_logged_in());
}

#[test]
fn offline_curator_fails() {
    let dir = TempDir::new().unwrap();
    let client = RawlineClient::builder()
        .offline(true)
        .cache_dir(dir.path())
        .build()
        .unwrap();
    let mut panel = client.curator().unwrap();
    assert!(matches!(
        panel.analyze("anything"),
        rawline_sdk::CuratorState::Failed(_)
    ));
}

#[test]
fn corrupt_snapshot_is_removed() {
    let dir = TempDir::new().unwrap();
    let cache = SnapshotCache::new(Some(dir.path().to_path_buf())).unwrap();
    fs::write(cache.path(), "{ not json").unwrap();

    assert!(cache.load().is_none());
    assert!(!cache.path().exists());
}

#[test]
fn clear_removes_snapshot() {
    let dir = TempDir::new().unwrap();
    let client = cached_client(&dir, common::store_with_pieces(1));
    let cache = client.snapshot_cache().unwrap();

    cache.clear().unwrap();
    assert!(cache.load().is_none());
    cache.clear().unwrap();
}

#[test]
fn snapshot_dir_that_is_a_file_fails_build() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let err = RawlineClient::builder()
        .store(MemoryStore::new())
        .media(common::ScriptedMedia::new())
        .authenticator(StaticAuthenticator::new("a", "b"))
        .cache_dir(&blocker)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RawlineError::Io(_)));
}
