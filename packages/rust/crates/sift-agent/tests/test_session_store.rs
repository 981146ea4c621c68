#![allow(missing_docs)]

use std::sync::Arc;

use sift_agent::{
    FileSessionStore, MemorySessionStore, Message, ReasoningTrace, SessionError, SessionStatus,
    SessionStore,
};

const WRITERS: usize = 8;
const PER_WRITER: usize = 25;

async fn assert_concurrent_appends_keep_order(store: Arc<dyn SessionStore>) -> anyhow::Result<()> {
    let session_id = store.create(Some("shared".to_string())).await?;
    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let store = store.clone();
        let session_id = session_id.clone();
        handles.push(tokio::spawn(async move {
            for seq in 0..PER_WRITER {
                store
                    .append(&session_id, Message::user(format!("{writer}:{seq}")))
                    .await?;
            }
            Ok::<(), SessionError>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let session = store.get(&session_id).await?;
    assert_eq!(session.messages.len(), WRITERS * PER_WRITER);
    let mut next = [0usize; WRITERS];
    for message in &session.messages {
        let (writer, seq) = message
            .content
            .split_once(':')
            .expect("writer:seq content");
        let writer: usize = writer.parse()?;
        let seq: usize = seq.parse()?;
        assert_eq!(seq, next[writer], "writer {writer} appended out of order");
        next[writer] += 1;
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_store_keeps_per_writer_append_order() -> anyhow::Result<()> {
    assert_concurrent_appends_keep_order(Arc::new(MemorySessionStore::new())).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_keeps_per_writer_append_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileSessionStore::open(dir.path()).await?;
    assert_concurrent_appends_keep_order(Arc::new(store)).await
}

#[tokio::test]
async fn memory_store_create_get_and_errors() -> anyhow::Result<()> {
    let store = MemorySessionStore::new();
    let generated = store.create(None).await?;
    assert!(!generated.is_empty());
    assert_eq!(store.create(Some("s1".to_string())).await?, "s1");
    assert!(matches!(
        store.create(Some("s1".to_string())).await,
        Err(SessionError::AlreadyExists(id)) if id == "s1"
    ));
    assert!(matches!(
        store.get("missing").await,
        Err(SessionError::NotFound(_))
    ));
    assert!(matches!(
        store.append("missing", Message::user("hi")).await,
        Err(SessionError::NotFound(_))
    ));
    assert_eq!(store.len().await, 2);

    let session = store.get("s1").await?;
    assert_eq!(session.status, SessionStatus::Active);
    assert!(session.messages.is_empty());
    Ok(())
}

async fn assert_stale_prefix_is_rejected(store: Arc<dyn SessionStore>) -> anyhow::Result<()> {
    let id = store.create(Some("compacted".to_string())).await?;
    for text in ["a", "b", "c", "d"] {
        store.append(&id, Message::user(text)).await?;
    }
    let first = store.get(&id).await?;
    let second = store.get(&id).await?;

    store
        .replace_prefix(&id, first.compactions, 2, Message::summary("a+b"))
        .await?;
    store.append(&id, Message::user("e")).await?;
    let stale = store
        .replace_prefix(&id, second.compactions, 3, Message::summary("a+b+c"))
        .await;

    assert!(matches!(
        stale,
        Err(SessionError::PrefixConflict {
            expected: 0,
            actual: 1,
            ..
        })
    ));
    let session = store.get(&id).await?;
    let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["a+b", "c", "d", "e"]);
    assert_eq!(session.compactions, 1);
    Ok(())
}

#[tokio::test]
async fn memory_store_rejects_stale_prefix_replacement() -> anyhow::Result<()> {
    assert_stale_prefix_is_rejected(Arc::new(MemorySessionStore::new())).await
}

#[tokio::test]
async fn file_store_rejects_stale_prefix_replacement() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert_stale_prefix_is_rejected(Arc::new(FileSessionStore::open(dir.path()).await?)).await
}

#[tokio::test]
async fn memory_store_replace_prefix_and_status() -> anyhow::Result<()> {
    let store = MemorySessionStore::new();
    let id = store.create(None).await?;
    for text in ["a", "b", "c", "d"] {
        store.append(&id, Message::user(text)).await?;
    }

    store.replace_prefix(&id, 0, 2, Message::summary("a+b")).await?;
    store.set_status(&id, SessionStatus::Completed).await?;

    let session = store.get(&id).await?;
    let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["a+b", "c", "d"]);
    assert!(session.messages[0].is_summary());
    assert_eq!(session.status, SessionStatus::Completed);

    assert!(matches!(
        store.replace_prefix(&id, 1, 9, Message::summary("x")).await,
        Err(SessionError::InvalidPrefix { prefix_len: 9, available: 3, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn file_store_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let id = {
        let store = FileSessionStore::open(dir.path()).await?;
        let id = store.create(Some("persisted".to_string())).await?;
        store.append(&id, Message::user("what is our travel policy?")).await?;
        store
            .append(
                &id,
                Message::assistant(
                    "Economy class for trips under 6 hours.",
                    Some(ReasoningTrace::new()),
                ),
            )
            .await?;
        store.set_status(&id, SessionStatus::Completed).await?;
        id
    };

    let reopened = FileSessionStore::open(dir.path()).await?;
    let session = reopened.get(&id).await?;

    assert_eq!(session.id, "persisted");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].content, "what is our travel policy?");
    assert!(session.messages[1].trace.is_some());
    Ok(())
}

#[tokio::test]
async fn file_store_replace_prefix_rewrites_log() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileSessionStore::open(dir.path()).await?;
    let id = store.create(None).await?;
    for text in ["one", "two", "three", "four", "five"] {
        store.append(&id, Message::user(text)).await?;
    }

    store
        .replace_prefix(&id, 0, 3, Message::summary("one to three"))
        .await?;
    store.append(&id, Message::user("six")).await?;

    let reopened = FileSessionStore::open(dir.path()).await?;
    let session = reopened.get(&id).await?;
    let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one to three", "four", "five", "six"]);
    assert!(session.messages[0].is_summary());
    assert_eq!(session.compactions, 1);
    Ok(())
}

#[tokio::test]
async fn file_store_rejects_unsafe_ids() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let store = FileSessionStore::open(dir.path()).await?;
    for bad in ["../escape", ".hidden", "a/b", ""] {
        assert!(
            matches!(
                store.create(Some(bad.to_string())).await,
                Err(SessionError::InvalidId(_))
            ),
            "{bad:?} should be rejected"
        );
    }
    assert!(matches!(
        store.get("never-created").await,
        Err(SessionError::NotFound(_))
    ));
    Ok(())
}
