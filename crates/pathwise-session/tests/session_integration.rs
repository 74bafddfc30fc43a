#![allow(clippy::unwrap_used, clippy::expect_used)]

use pathwise_core::{KnowledgePoint, PathwiseError, Role, SessionStatus};
use pathwise_session::{FileSessionStore, Session, SessionStore};

/// Helper: create a FileSessionStore in a temp directory.
async fn temp_store() -> (FileSessionStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let store = FileSessionStore::new(tmp.path().join("sessions"))
        .await
        .unwrap();
    (store, tmp)
}

fn plan() -> Vec<KnowledgePoint> {
    vec![
        KnowledgePoint::new(
            "Transformer Overview",
            "Attention replaces recurrence.",
            "block order",
        ),
        KnowledgePoint::new("Self-Attention", "softmax(QK^T / sqrt(d_k)) V", "scaling"),
    ]
}

#[tokio::test]
async fn test_create_and_load_session() {
    let (store, _tmp) = temp_store().await;
    let session = Session::new("nb-1", "Transformers", plan());
    let id = session.session_id.clone();

    store.create(&session).await.unwrap();

    let loaded = store.load(&id).await.unwrap();
    assert_eq!(loaded, session);
    assert!(loaded.chat_history.is_empty());
    assert!(loaded.current_index.is_none());
}

#[tokio::test]
async fn test_load_nonexistent_is_not_found() {
    let (store, _tmp) = temp_store().await;
    let err = store.load("does-not-exist").await.unwrap_err();
    assert!(matches!(err, PathwiseError::NotFound(id) if id == "does-not-exist"));
    assert!(!store.exists("does-not-exist").await.unwrap());
}

#[tokio::test]
async fn test_round_trip_completed_session() {
    let (store, _tmp) = temp_store().await;
    let mut session = Session::new("nb-1", "Transformers", plan());
    store.create(&session).await.unwrap();

    session.begin("<html><body>0</body></html>".into()).unwrap();
    session.append_message(Role::System, "Starting knowledge point 1").unwrap();
    session.append_message(Role::User, "What is Q?").unwrap();
    session.append_message(Role::Assistant, "The query projection.").unwrap();
    session.advance("<html><body>1</body></html>".into()).unwrap();
    session.complete("# Summary\n\n- Q/K/V".into()).unwrap();
    store.save(&session).await.unwrap();

    let loaded = store.load(&session.session_id).await.unwrap();
    assert_eq!(loaded, session);
    assert_eq!(loaded.status, SessionStatus::Completed);
    assert_eq!(loaded.chat_history.len(), 3);
    assert_eq!(loaded.chat_history[1].knowledge_index, 0);
    assert_eq!(loaded.summary_markdown.as_deref(), Some("# Summary\n\n- Q/K/V"));
}

#[tokio::test]
async fn test_document_layout_uses_plain_field_names() {
    let (store, _tmp) = temp_store().await;
    let session = Session::new("nb-1", "Transformers", plan());
    store.create(&session).await.unwrap();

    let path = store
        .dir()
        .join(format!("session_{}.json", session.session_id));
    let raw: serde_json::Value =
        serde_json::from_str(&tokio::fs::read_to_string(path).await.unwrap()).unwrap();
    assert_eq!(raw["status"], "initialized");
    assert_eq!(raw["knowledge_points"][1]["knowledge_title"], "Self-Attention");
    assert!(raw["current_index"].is_null());
    assert!(raw["chat_history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_sessions() {
    let (store, _tmp) = temp_store().await;
    let s1 = Session::new("nb", "A", plan());
    let s2 = Session::new("nb", "B", plan());
    store.create(&s1).await.unwrap();
    store.create(&s2).await.unwrap();

    let ids = store.list().await.unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&s1.session_id));
    assert!(ids.contains(&s2.session_id));
}

#[tokio::test]
async fn test_interrupted_write_keeps_previous_document() {
    let (store, _tmp) = temp_store().await;
    let mut session = Session::new("nb", "Transformers", plan());
    store.create(&session).await.unwrap();
    session.begin("<html>v1</html>".into()).unwrap();
    store.save(&session).await.unwrap();

    // A crash mid-save leaves a truncated staging file behind.
    let staging = store
        .dir()
        .join(format!(".session_{}.json.deadbeef.tmp", session.session_id));
    tokio::fs::write(&staging, b"{\"session_id\": \"trunc")
        .await
        .unwrap();

    let loaded = store.load(&session.session_id).await.unwrap();
    assert_eq!(loaded, session);
    assert_eq!(store.list().await.unwrap(), vec![session.session_id.clone()]);

    // The next save still installs cleanly.
    session.replace_html("<html>v2</html>".into()).unwrap();
    store.save(&session).await.unwrap();
    let loaded = store.load(&session.session_id).await.unwrap();
    assert_eq!(loaded.current_html.as_deref(), Some("<html>v2</html>"));
}

#[tokio::test]
async fn test_failed_install_removes_staging_file() {
    let (store, _tmp) = temp_store().await;
    let session = Session::new("nb", "Transformers", plan());

    // A non-empty directory where the document belongs makes the rename fail.
    let target = store
        .dir()
        .join(format!("session_{}.json", session.session_id));
    tokio::fs::create_dir(&target).await.unwrap();
    tokio::fs::write(target.join("keep"), b"x").await.unwrap();

    let err = store.save(&session).await.unwrap_err();
    assert!(matches!(err, PathwiseError::Storage(msg) if msg.contains("install")));

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(store.dir()).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().to_string());
    }
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
    assert!(target.join("keep").exists());
}

#[tokio::test]
async fn test_corrupt_document_is_storage_error() {
    let (store, _tmp) = temp_store().await;
    let path = store.dir().join("session_broken.json");
    tokio::fs::write(&path, b"not json").await.unwrap();

    let err = store.load("broken").await.unwrap_err();
    assert!(matches!(err, PathwiseError::Storage(msg) if msg.contains("broken")));
}

#[tokio::test]
async fn test_concurrent_readers_never_see_partial_documents() {
    let (store, _tmp) = temp_store().await;
    let store = std::sync::Arc::new(store);
    let mut session = Session::new("nb", "Transformers", plan());
    store.create(&session).await.unwrap();
    session.begin("<html>start</html>".into()).unwrap();

    let id = session.session_id.clone();
    let writer = {
        let store = store.clone();
        let mut session = session.clone();
        tokio::spawn(async move {
            for i in 0..50 {
                session
                    .append_message(Role::User, format!("message {i} {}", "x".repeat(512)))
                    .unwrap();
                store.save(&session).await.unwrap();
            }
        })
    };
    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let loaded = store.load(&id).await.unwrap();
                assert_eq!(loaded.knowledge_points.len(), 2);
            }
        })
    };
    writer.await.unwrap();
    reader.await.unwrap();

    let loaded = store.load(&session.session_id).await.unwrap();
    assert_eq!(loaded.chat_history.len(), 50);
}

#[tokio::test]
async fn test_persistence_across_store_instances() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sessions");
    let session = Session::new("nb", "Transformers", plan());

    {
        let store = FileSessionStore::new(dir.clone()).await.unwrap();
        store.create(&session).await.unwrap();
    }

    let store = FileSessionStore::new(dir).await.unwrap();
    assert!(store.exists(&session.session_id).await.unwrap());
    assert_eq!(store.load(&session.session_id).await.unwrap(), session);
}
