use super::{FileSessionStore, Record, decode_log, encode, validate_session_id};
use crate::session::{Message, SessionError, SessionStatus, SessionStore};

fn header_line(id: &str) -> String {
    let record = Record::Header {
        id: id.to_string(),
        created_at: chrono::Utc::now(),
        status: SessionStatus::Active,
        compactions: 0,
    };
    encode(id, &record).unwrap_or_default()
}

fn message_line(id: &str, text: &str) -> String {
    encode(id, &Record::Message(Box::new(Message::user(text)))).unwrap_or_default()
}

#[test]
fn decode_replays_messages_and_status() {
    let log = [
        header_line("s1"),
        message_line("s1", "first"),
        message_line("s1", "second"),
        encode("s1", &Record::Status {
            status: SessionStatus::Completed,
        })
        .unwrap_or_default(),
    ]
    .join("\n");

    let session = decode_log("s1", &log).expect("decode");

    assert_eq!(session.id, "s1");
    assert_eq!(session.status, SessionStatus::Completed);
    let contents: Vec<&str> = session.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[test]
fn decode_skips_torn_trailing_line() {
    let log = format!(
        "{}\n{}\n{{\"kind\":\"message\",\"role\":\"us",
        header_line("s1"),
        message_line("s1", "kept")
    );

    let session = decode_log("s1", &log).expect("decode");

    assert_eq!(session.messages.len(), 1);
}

#[test]
fn decode_rejects_corruption_before_the_tail() {
    let log = format!(
        "{}\nnot json\n{}",
        header_line("s1"),
        message_line("s1", "after")
    );

    assert!(matches!(
        decode_log("s1", &log),
        Err(SessionError::Corrupt { .. })
    ));
}

#[test]
fn decode_requires_header_first() {
    let log = message_line("s1", "orphan");
    assert!(matches!(
        decode_log("s1", &log),
        Err(SessionError::Corrupt { .. })
    ));
}

#[test]
fn session_ids_must_be_safe_file_names() {
    assert!(validate_session_id("user-42_chat.v1").is_ok());
    for bad in ["", "../escape", ".hidden", "a/b", "spaces here"] {
        assert!(
            matches!(validate_session_id(bad), Err(SessionError::InvalidId(_))),
            "accepted {bad:?}"
        );
    }
}

#[test]
fn decode_reads_compaction_count_and_defaults_missing_to_zero() {
    let record = Record::Header {
        id: "s1".to_string(),
        created_at: chrono::Utc::now(),
        status: SessionStatus::Active,
        compactions: 3,
    };
    let log = encode("s1", &record).unwrap_or_default();
    assert_eq!(decode_log("s1", &log).expect("decode").compactions, 3);

    let legacy = r#"{"kind":"header","id":"s1","created_at":"2026-01-01T00:00:00Z","status":"active"}"#;
    assert_eq!(decode_log("s1", legacy).expect("decode").compactions, 0);
}

#[tokio::test]
async fn unknown_ids_leave_no_lock_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileSessionStore::open(dir.path()).await.expect("open");

    assert!(matches!(store.get("ghost").await, Err(SessionError::NotFound(_))));
    assert!(matches!(
        store.append("ghost", Message::user("hi")).await,
        Err(SessionError::NotFound(_))
    ));
    assert!(matches!(
        store.set_status("ghost", SessionStatus::Completed).await,
        Err(SessionError::NotFound(_))
    ));
    assert!(store.locks.lock().await.is_empty());

    let id = store.create(Some("real".to_string())).await.expect("create");
    store.append(&id, Message::user("hi")).await.expect("append");
    assert_eq!(store.locks.lock().await.len(), 1);
}
