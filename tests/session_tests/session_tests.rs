//! Tests for Session
//!
//! These tests verify:
//! - Opening requires an existing chmpx configuration file
//! - An invalid native handle surfaces as an open failure
//! - Close reaches the native layer exactly once
//! - Dropping a session closes its handle
//! - Sessions can move to another thread

use std::sync::Arc;
use std::thread;

use k2hdkc::native::{MemoryCluster, Native, INVALID_HANDLE};
use k2hdkc::{
    Client, ClientConfig, Command, Get, GetSubKeys, K2hdkcError, Logger, Set, Severity,
};
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_client() -> (NamedTempFile, Arc<MemoryCluster>, Client) {
    let conf = NamedTempFile::new().unwrap();
    let cluster = Arc::new(MemoryCluster::new());
    let native: Arc<dyn Native> = cluster.clone();
    let client = Client::with_native(ClientConfig::new(conf.path(), 8031), native)
        .with_logger(Logger::stderr(Severity::Silent));
    (conf, cluster, client)
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_missing_config() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("slave.ini");
    let client = Client::with_native(
        ClientConfig::new(&missing, 8031),
        Arc::new(MemoryCluster::new()),
    )
    .with_logger(Logger::stderr(Severity::Silent));

    let err = client.create_session().unwrap_err();
    assert!(matches!(err, K2hdkcError::ConfigNotFound(ref p) if *p == missing));
    assert!(err.to_string().starts_with("no "));
    assert!(err.to_string().ends_with("slave.ini exists"));
}

#[test]
fn test_open_invalid_handle() {
    let (_conf, cluster, client) = setup_client();
    cluster.fail_open(true);

    let err = client.create_session().unwrap_err();
    assert!(matches!(err, K2hdkcError::OpenFailed { handle: INVALID_HANDLE }));
    assert_eq!(cluster.open_handles(), 0);

    cluster.fail_open(false);
    assert!(client.create_session().is_ok());
}

#[test]
fn test_sessions_get_distinct_handles() {
    let (_conf, cluster, client) = setup_client();
    let a = client.create_session().unwrap();
    let b = client.create_session().unwrap();
    assert_ne!(a.handle(), b.handle());
    assert_ne!(a.handle(), INVALID_HANDLE);
    assert_eq!(cluster.open_handles(), 2);
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_is_idempotent() {
    let (_conf, cluster, client) = setup_client();
    let mut session = client.create_session().unwrap();

    session.close().unwrap();
    session.close().unwrap();
    assert!(session.is_closed());
    drop(session);

    assert_eq!(cluster.close_calls(), 1);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_drop_closes_handle() {
    let (_conf, cluster, client) = setup_client();
    {
        let _session = client.create_session().unwrap();
        assert_eq!(cluster.open_handles(), 1);
    }
    assert_eq!(cluster.open_handles(), 0);
    assert_eq!(cluster.close_calls(), 1);
}

#[test]
fn test_send_closes_its_session() {
    let (_conf, cluster, client) = setup_client();
    client.set("key", "value").unwrap();
    client.get("key").unwrap();
    assert_eq!(cluster.open_handles(), 0);
    assert_eq!(cluster.close_calls(), 2);
}

#[test]
fn test_with_session_reuses_one_handle() {
    let (_conf, cluster, client) = setup_client();
    let value = client
        .with_session(|session| {
            let mut set = Set::new("key", "value")?;
            set.execute(session)?;
            let mut get = Get::new("key")?;
            get.execute(session)?;
            Ok(get.result().string())
        })
        .unwrap();

    assert_eq!(value, "value");
    assert_eq!(cluster.close_calls(), 1);
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_with_session_returns_batch_error() {
    let (_conf, cluster, client) = setup_client();
    let err = client
        .with_session(|session| {
            let mut list = GetSubKeys::new("missing")?;
            list.execute(session)
        })
        .unwrap_err();

    assert!(err.status().is_some());
    assert_eq!(cluster.open_handles(), 0);
}

// =============================================================================
// Threading Tests
// =============================================================================

#[test]
fn test_session_moves_between_threads() {
    let (_conf, cluster, client) = setup_client();
    client.set("shared", "value").unwrap();

    let session = client.create_session().unwrap();
    let value = thread::spawn(move || {
        let mut get = Get::new("shared").unwrap();
        get.execute(&session).unwrap();
        get.result().string()
    })
    .join()
    .unwrap();

    assert_eq!(value, "value");
    assert_eq!(cluster.open_handles(), 0);
}

#[test]
fn test_one_session_per_thread() {
    let (_conf, cluster, client) = setup_client();
    let client = Arc::new(client);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                let key = format!("key-{i}");
                client.set(key.as_str(), format!("value-{i}")).unwrap();
                client.get(key.as_str()).unwrap().string()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("value-{i}"));
    }
    assert_eq!(cluster.open_handles(), 0);
}
