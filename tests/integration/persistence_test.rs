//! Integration tests for the persistence layer.

use query_console::persistence::{StateStore, LAST_QUERY_KEY};
use tempfile::tempdir;

async fn create_test_store() -> (StateStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test_state.db");
    let store = StateStore::open(&path).await.unwrap();
    (store, dir)
}

#[tokio::test]
async fn test_state_store_creation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    let store = StateStore::open(&path).await.unwrap();
    assert!(path.exists());
    store.close().await;
}

#[tokio::test]
async fn test_last_query_uses_fixed_key() {
    let (store, _dir) = create_test_store().await;

    store.set_last_query("SELECT 1;").await.unwrap();
    assert_eq!(
        store.get(LAST_QUERY_KEY).await.unwrap(),
        Some("SELECT 1;".to_string())
    );
    assert_eq!(LAST_QUERY_KEY, "lastQuery");

    store.close().await;
}

#[tokio::test]
async fn test_generic_values_are_independent() {
    let (store, _dir) = create_test_store().await;

    store.set("theme", "dark").await.unwrap();
    store.set_last_query("SELECT 2;").await.unwrap();
    store.set("theme", "light").await.unwrap();

    assert_eq!(store.get("theme").await.unwrap(), Some("light".to_string()));
    assert_eq!(store.last_query().await.unwrap(), Some("SELECT 2;".to_string()));
    assert_eq!(store.get("missing").await.unwrap(), None);

    store.close().await;
}

#[tokio::test]
async fn test_multiline_query_is_kept_verbatim() {
    let (store, _dir) = create_test_store().await;
    let query = "SELECT `name`,\n\t`sql`\n  FROM `sqlite_master` -- 'quoted'\n";

    store.set_last_query(query).await.unwrap();
    assert_eq!(store.last_query().await.unwrap().as_deref(), Some(query));

    store.close().await;
}
