use storage::store::{KeyValueStore, StoreEvent};
use storage::SqliteStore;

#[tokio::test]
async fn round_trips_a_payload() {
    let store = SqliteStore::open("sqlite:file:memdb_kv_roundtrip?mode=memory&cache=shared")
        .await
        .expect("open sqlite");

    assert_eq!(store.get("quizapp:questions").await.unwrap(), None);

    store.set("quizapp:questions", r#"[{"q":1}]"#).await.unwrap();
    assert_eq!(
        store.get("quizapp:questions").await.unwrap(),
        Some(r#"[{"q":1}]"#.to_owned())
    );
}

#[tokio::test]
async fn set_overwrites_the_whole_document() {
    let store = SqliteStore::open("sqlite:file:memdb_kv_overwrite?mode=memory&cache=shared")
        .await
        .expect("open sqlite");

    store.set("k", "first").await.unwrap();
    store.set("k", "second").await.unwrap();

    assert_eq!(store.get("k").await.unwrap(), Some("second".to_owned()));
}

#[tokio::test]
async fn writes_echo_to_the_writers_subscribers() {
    let store = SqliteStore::open("sqlite:file:memdb_kv_events?mode=memory&cache=shared")
        .await
        .expect("open sqlite");
    let mut events = store.subscribe();

    store.set("k", "payload").await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        StoreEvent {
            key: "k".to_owned(),
            value: Some("payload".to_owned()),
        }
    );
}

#[tokio::test]
async fn separate_handles_observe_last_writer_wins() {
    // Two handles to the same shared-cache database stand in for two
    // concurrently open app instances.
    let url = "sqlite:file:memdb_kv_two_handles?mode=memory&cache=shared";
    let first = SqliteStore::open(url).await.expect("open first");
    let second = SqliteStore::open(url).await.expect("open second");

    first.set("k", "from-first").await.unwrap();
    second.set("k", "from-second").await.unwrap();

    assert_eq!(first.get("k").await.unwrap(), Some("from-second".to_owned()));
    assert_eq!(
        second.get("k").await.unwrap(),
        Some("from-second".to_owned())
    );

    // Migrating twice is a no-op thanks to the version guard.
    second.migrate().await.expect("re-migrate");
}
