//! End-to-end tests of the JSON-lines channel against the bridge.

use malbrose_integration_tests::{config_in, memory_bridge, reply_lines};
use malbrose_runner::channel;
use malbrose_secure_storage::{KeyProtector, SecureStorageBridge};
use tempfile::TempDir;

const MASTER: [u8; 32] = [7u8; 32];

async fn run_session(bridge: &SecureStorageBridge, input: &str) -> Vec<serde_json::Value> {
    let mut output = Vec::new();
    channel::serve(bridge, input.as_bytes(), &mut output)
        .await
        .unwrap();
    reply_lines(&output)
}

#[tokio::test]
async fn test_encryption_key_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let first = memory_bridge(&config, KeyProtector::new(MASTER.to_vec()).unwrap());
    let replies = run_session(
        &first,
        r#"{"id":1,"method":"setEncryptionKey","arguments":{"key":"db-key-0001"}}"#,
    )
    .await;
    assert_eq!(replies[0]["status"], "success");
    drop(first);

    // Same identity, fresh process.
    let second = memory_bridge(&config, KeyProtector::new(MASTER.to_vec()).unwrap());
    let replies = run_session(&second, r#"{"id":2,"method":"getEncryptionKey"}"#).await;
    assert_eq!(replies[0]["id"], 2);
    assert_eq!(replies[0]["result"], "db-key-0001");
}

#[tokio::test]
async fn test_other_identity_cannot_read_slot() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());

    let owner = memory_bridge(&config, KeyProtector::new(MASTER.to_vec()).unwrap());
    run_session(
        &owner,
        r#"{"method":"setEncryptionKey","arguments":{"key":"db-key-0001"}}"#,
    )
    .await;

    let stranger = memory_bridge(&config, KeyProtector::new(vec![9u8; 32]).unwrap());
    let replies = run_session(&stranger, r#"{"method":"getEncryptionKey"}"#).await;
    assert_eq!(replies[0]["status"], "error");
    assert_eq!(replies[0]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_credential_lifecycle() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let bridge = memory_bridge(&config, KeyProtector::generate());

    let input = [
        r#"{"id":"a","method":"setCredential","arguments":{"key":"till-7","value":"1234","description":"Till PIN"}}"#,
        r#"{"id":"b","method":"getCredential","arguments":{"key":"till-7"}}"#,
        r#"{"id":"c","method":"deleteCredential","arguments":{"key":"till-7"}}"#,
        r#"{"id":"d","method":"getCredential","arguments":{"key":"till-7"}}"#,
        r#"{"id":"e","method":"deleteCredential","arguments":{"key":"till-7"}}"#,
    ]
    .join("\n");
    let replies = run_session(&bridge, &input).await;

    assert_eq!(replies.len(), 5);
    assert_eq!(replies[0]["status"], "success");
    assert_eq!(replies[1]["result"], "1234");
    assert_eq!(replies[2]["status"], "success");
    assert_eq!(replies[3]["code"], "NOT_FOUND");
    assert_eq!(replies[4]["code"], "DELETE_FAILED");
    for (reply, id) in replies.iter().zip(["a", "b", "c", "d", "e"]) {
        assert_eq!(reply["id"], id);
    }
}

#[tokio::test]
async fn test_argument_errors_and_unknown_methods() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let bridge = memory_bridge(&config, KeyProtector::generate());

    let input = [
        r#"{"id":1,"method":"setEncryptionKey","arguments":"oops"}"#,
        r#"{"id":2,"method":"setEncryptionKey","arguments":{"key":42}}"#,
        r#"{"id":3,"method":"setCredential","arguments":{"key":"k"}}"#,
        r#"{"id":4,"method":"openCashDrawer"}"#,
        "garbage",
    ]
    .join("\n");
    let replies = run_session(&bridge, &input).await;

    assert_eq!(replies[0]["code"], "INVALID_ARGUMENTS");
    assert_eq!(replies[1]["code"], "INVALID_ARGUMENTS");
    assert_eq!(replies[2]["code"], "INVALID_ARGUMENTS");
    assert_eq!(replies[3]["status"], "notImplemented");
    assert_eq!(replies[4]["code"], "INVALID_ARGUMENTS");
    assert!(replies[4]["id"].is_null());
}

#[test]
fn test_slot_file_holds_no_plaintext() {
    let dir = TempDir::new().unwrap();
    let config = config_in(dir.path());
    let bridge = memory_bridge(&config, KeyProtector::generate());

    let line = channel::handle_line(
        &bridge,
        r#"{"method":"setEncryptionKey","arguments":{"key":"plain-text-marker"}}"#,
    )
    .unwrap()
    .unwrap();
    assert!(line.contains("success"));

    let bytes = std::fs::read(config.slot_path().unwrap()).unwrap();
    let needle = b"plain-text-marker";
    assert!(!bytes.windows(needle.len()).any(|w| w == needle));
}
