mod common;

use common::{init_tracing, MemoryBridge};
use lunadb_client::{Client, ClientConfig, ClientError};
use lunadb_core::Operation;
use serde_json::json;
use std::sync::Arc;

fn client(bridge: &Arc<MemoryBridge>) -> Client<Arc<MemoryBridge>> {
    Client::new(bridge.clone(), ClientConfig::default())
}

#[tokio::test]
async fn test_two_sessions_converge() {
    init_tracing();
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({"tasks": ["a", "b", "c"], "title": "Hello"}));

    let alice = client(&bridge);
    let bob = client(&bridge);
    let mut alice_session = alice.load_document("doc").await.unwrap();
    let mut bob_session = bob.load_document("doc").await.unwrap();

    alice_session.edit(Operation::insert("/tasks/0", json!("x"))).unwrap();
    alice_session.edit(Operation::string_insert("/title", 5, " world")).unwrap();

    bob_session.edit(Operation::delete("/tasks/1")).unwrap();
    bob_session.edit(Operation::string_insert("/title", 0, ">> ")).unwrap();

    let outcome = alice.sync(&mut alice_session).await.unwrap();
    assert_eq!(outcome.hlc, "2");
    assert_eq!(outcome.remote_applied, 0);

    let outcome = bob.sync(&mut bob_session).await.unwrap();
    assert_eq!(outcome.hlc, "4");
    assert_eq!(outcome.remote_applied, 2);
    assert!(outcome.dropped.is_empty());
    assert!(outcome.rejected.is_empty());

    let outcome = alice.sync(&mut alice_session).await.unwrap();
    assert_eq!(outcome.remote_applied, 2);

    let expected = json!({"tasks": ["x", "a", "c"], "title": ">> Hello world"});
    assert_eq!(bridge.contents("doc").unwrap(), expected);
    assert_eq!(alice_session.view(), &expected);
    assert_eq!(bob_session.view(), &expected);
    assert_eq!(alice_session.document().checksum(), bob_session.document().checksum());
}

#[tokio::test]
async fn test_server_commits_rebased_changes() {
    init_tracing();
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({"items": ["a", "b"]}));

    let first = client(&bridge);
    let second = client(&bridge);
    let mut first_session = first.load_document("doc").await.unwrap();
    let mut second_session = second.load_document("doc").await.unwrap();

    first_session.edit(Operation::insert("/items/0", json!("z"))).unwrap();
    first.sync(&mut first_session).await.unwrap();

    second_session.edit(Operation::replace("/items/1", json!("B"))).unwrap();
    second.sync(&mut second_session).await.unwrap();

    assert_eq!(
        bridge.log("doc"),
        vec![
            Operation::insert("/items/0", json!("z")),
            Operation::replace("/items/2", json!("B")),
        ]
    );
    assert_eq!(second_session.view(), &json!({"items": ["z", "a", "B"]}));
}

#[tokio::test]
async fn test_edit_on_removed_element_is_dropped() {
    init_tracing();
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({"counters": [1, 2]}));

    let first = client(&bridge);
    let second = client(&bridge);
    let mut first_session = first.load_document("doc").await.unwrap();
    let mut second_session = second.load_document("doc").await.unwrap();

    first_session.edit(Operation::delete("/counters/0")).unwrap();
    first.sync(&mut first_session).await.unwrap();

    second_session.edit(Operation::increment("/counters/0", 5)).unwrap();
    let outcome = second.sync(&mut second_session).await.unwrap();

    assert_eq!(outcome.dropped, vec![Operation::increment("/counters/0", 5)]);
    assert_eq!(second_session.view(), &json!({"counters": [2]}));
    assert_eq!(bridge.contents("doc").unwrap(), json!({"counters": [2]}));
}

#[tokio::test]
async fn test_sync_without_changes_pulls_remote() {
    init_tracing();
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({"count": 0}));

    let writer = client(&bridge);
    let reader = client(&bridge);
    let mut writer_session = writer.load_document("doc").await.unwrap();
    let mut reader_session = reader.load_document("doc").await.unwrap();

    for _ in 0..3 {
        writer_session.edit(Operation::increment("/count", 1)).unwrap();
    }
    writer.sync(&mut writer_session).await.unwrap();

    let outcome = reader.sync(&mut reader_session).await.unwrap();
    assert_eq!(outcome.hlc, "3");
    assert_eq!(outcome.remote_applied, 3);
    assert_eq!(reader_session.view(), &json!({"count": 3}));
    assert!(reader_session.document().last_synced_at.is_some());
}

#[tokio::test]
async fn test_presence_is_sent_with_sync() {
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({}));

    let mut config = ClientConfig::default().with_session_metadata(json!({"cursor": 4}));
    config.fetch_all_presence_data = true;
    let session_id = config.session_id;
    let client = Client::new(bridge.clone(), config);

    let mut session = client.load_document("doc").await.unwrap();
    session.edit(Operation::insert("/k", json!(1))).unwrap();
    client.sync(&mut session).await.unwrap();

    let request = bridge.last_request().unwrap();
    let presence = request.presence.unwrap();
    assert_eq!(presence.id, Some(session_id.to_string()));
    assert_eq!(presence.metadata, Some(json!({"cursor": 4})));
    assert!(request.fetch_all_presence_data);
    assert!(!request.exclude_presence);
    assert_eq!(request.transaction.hlc, "0");
    assert_eq!(request.transaction.changes.len(), 1);
}

#[tokio::test]
async fn test_stale_transaction_is_rejected_after_sync() {
    let bridge = Arc::new(MemoryBridge::new());
    bridge.seed("doc", json!({"n": 0}));
    let client = client(&bridge);

    let mut session = client.load_document("doc").await.unwrap();
    let mut tx = session.begin();
    tx.increment("/n", 1);

    session.edit(Operation::increment("/n", 1)).unwrap();
    client.sync(&mut session).await.unwrap();

    match session.commit(tx) {
        Err(ClientError::VersionMismatch { expected, actual }) => {
            assert_eq!(expected, "1");
            assert_eq!(actual, "0");
        }
        other => panic!("expected version mismatch, got {:?}", other),
    }

    let tx = session.begin();
    assert!(session.commit(tx).unwrap().is_empty());
}

#[tokio::test]
async fn test_document_lifecycle() {
    let bridge = Arc::new(MemoryBridge::new());
    let client = client(&bridge);

    client.create_document("notes").await.unwrap();
    assert!(matches!(
        client.create_document("notes").await,
        Err(ClientError::Bridge { status: 409, .. })
    ));

    let session = client.load_document("notes").await.unwrap();
    assert_eq!(session.view(), &json!({}));
    assert_eq!(session.hlc(), "0");

    client.delete_document("notes").await.unwrap();
    assert!(matches!(
        client.load_document("notes").await,
        Err(ClientError::DocumentNotFound(key)) if key == "notes"
    ));
}

#[tokio::test]
async fn test_unknown_document() {
    let bridge = Arc::new(MemoryBridge::new());
    let client = client(&bridge);

    assert!(matches!(
        client.load_document("missing").await,
        Err(ClientError::DocumentNotFound(_))
    ));
    assert!(matches!(
        client.delete_document("missing").await,
        Err(ClientError::DocumentNotFound(_))
    ));
}
