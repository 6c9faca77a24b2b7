//! Tests for Client
//!
//! These tests verify:
//! - Convenience operations, one session per call
//! - Results carry the success flag and status text
//! - Settings flow into the next session
//! - Logging goes to the configured destination

use std::fs;
use std::sync::Arc;

use k2hdkc::native::{MemoryCluster, Native};
use k2hdkc::{
    CasValue, CasWidth, Client, ClientConfig, Command, K2hdkcError, LibLogLevel, Logger,
    QueuePop, QueuePush, Severity, Status, SubCode,
};
use tempfile::{NamedTempFile, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_client() -> (NamedTempFile, Client) {
    let conf = NamedTempFile::new().unwrap();
    let native: Arc<dyn Native> = Arc::new(MemoryCluster::new());
    let client = Client::with_native(ClientConfig::new(conf.path(), 8031), native)
        .with_logger(Logger::stderr(Severity::Silent));
    (conf, client)
}

// =============================================================================
// Value Tests
// =============================================================================

#[test]
fn test_set_get_hello_world() {
    let (_conf, client) = setup_client();

    let set = client.set("hello", "world").unwrap();
    assert!(set.ok());
    assert_eq!(set.error_text(), Status::SUCCESS_TEXT);

    let get = client.get("hello").unwrap();
    assert!(get.ok());
    assert_eq!(get.string(), "world");
    assert_eq!(get.error_text(), "DKC_RES_SUCCESS DKC_RES_SUBCODE_NOTHING");
}

#[test]
fn test_get_missing_key() {
    let (_conf, client) = setup_client();
    let get = client.get("nothing-here").unwrap();
    assert!(get.ok());
    assert!(get.bytes().is_empty());
    assert_eq!(get.error_text(), "DKC_RES_SUCCESS DKC_RES_SUBCODE_NODATA");
}

#[test]
fn test_failed_call_names_entry_point() {
    let (_conf, client) = setup_client();
    let err = client.queue_pop("nothing-here").unwrap_err();
    match err {
        K2hdkcError::NativeCall { call, status } => {
            assert_eq!(call, "k2hdkc_pm_q_pop_wp");
            assert_eq!(status, Status::error(SubCode::NODATA));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_validation_error_before_session() {
    let (_conf, client) = setup_client();
    let err = client.set("", "value").unwrap_err();
    assert_eq!(err.to_string(), "len(key) is zero");
}

#[test]
fn test_remove_and_rename() {
    let (_conf, client) = setup_client();
    client.set("a", "1").unwrap();
    client.rename("a", "b").unwrap();
    assert_eq!(client.get("a").unwrap().status().subcode, SubCode::NODATA);
    assert_eq!(client.get("b").unwrap().string(), "1");

    client.remove("b").unwrap();
    assert!(client.get("b").unwrap().bytes().is_empty());
    let again = client.remove("b").unwrap();
    assert!(again.ok());
    assert_eq!(again.error_text(), Status::SUCCESS_TEXT);
}

#[test]
fn test_binary_value() {
    let (_conf, client) = setup_client();
    let raw = vec![0u8, 159, 146, 150];
    client.set(b"bin", raw.clone()).unwrap();
    assert_eq!(client.get(b"bin").unwrap().bytes().as_ref(), raw.as_slice());
}

#[test]
fn test_attrs() {
    let (_conf, client) = setup_client();
    client.set("key", "value").unwrap();

    let attrs = client.get_attrs("key").unwrap();
    assert!(attrs.attrs().iter().any(|a| a.key_string() == "mtime"));
    assert!(!attrs.to_string_map().contains_key("expire"));
}

// =============================================================================
// Subkey Tests
// =============================================================================

#[test]
fn test_subkey_roundtrip() {
    let (_conf, client) = setup_client();
    client.set("parent", "p").unwrap();
    client.set_sub_keys("parent", ["c1", "c2"]).unwrap();
    assert_eq!(client.get_sub_keys("parent").unwrap().strings(), vec!["c1", "c2"]);

    client.clear_sub_keys("parent").unwrap();
    assert!(client.get_sub_keys("parent").is_err());
}

#[test]
fn test_add_and_remove_sub_key() {
    let (_conf, client) = setup_client();
    client.add_sub_key("parent", "child", "value").unwrap();
    assert_eq!(client.get("child").unwrap().string(), "value");
    assert_eq!(client.get_sub_keys("parent").unwrap().strings(), vec!["child"]);

    client.remove_sub_key("parent", "child").unwrap();
    assert!(client.get_sub_keys("parent").is_err());
    assert_eq!(client.get("child").unwrap().string(), "value");
}

#[test]
fn test_set_all() {
    let (_conf, client) = setup_client();
    client.set_all("key", "value", ["s1", "s2"]).unwrap();
    assert_eq!(client.get("key").unwrap().string(), "value");
    assert_eq!(client.get_sub_keys("key").unwrap().strings(), vec!["s1", "s2"]);
}

// =============================================================================
// CAS Tests
// =============================================================================

#[test]
fn test_cas_counter() {
    let (_conf, client) = setup_client();
    client.cas_init("counter", 41u32).unwrap();
    client.cas_increment("counter").unwrap();

    let value = client.cas_get("counter", CasWidth::W32).unwrap();
    assert_eq!(value.value(), Some(CasValue::U32(42)));

    client.cas_set("counter", 42u32, 7u32).unwrap();
    client.cas_decrement("counter").unwrap();
    assert_eq!(client.cas_get("counter", CasWidth::W32).unwrap().as_u64(), Some(6));
}

#[test]
fn test_cas_set_lost_race() {
    let (_conf, client) = setup_client();
    client.cas_init("counter", 1u16).unwrap();
    let err = client.cas_set("counter", 2u16, 3u16).unwrap_err();
    assert_eq!(err.status().map(|s| s.subcode), Some(SubCode::DATACHANGED));
}

#[test]
fn test_cas_set_mismatched_widths() {
    let (_conf, client) = setup_client();
    let err = client.cas_set("counter", 1u8, 1u16).unwrap_err();
    assert!(matches!(err, K2hdkcError::CasLengthMismatch { old: 1, new: 2 }));
}

// =============================================================================
// Queue Tests
// =============================================================================

#[test]
fn test_queue_push_pop() {
    let (_conf, client) = setup_client();
    client.queue_push("jobs", "first").unwrap();
    client.queue_push("jobs", "second").unwrap();

    assert_eq!(client.queue_pop("jobs").unwrap().payload().value_string(), "first");
    assert_eq!(client.queue_pop("jobs").unwrap().payload().value_string(), "second");
    assert!(client.queue_pop("jobs").is_err());
}

#[test]
fn test_queue_lifo_and_keys() {
    let (_conf, client) = setup_client();
    client.send(QueuePush::with_key("kq", "v1", "k1").unwrap()).unwrap();
    client.send(QueuePush::with_key("kq", "v2", "k2").unwrap()).unwrap();

    let mut pop = QueuePop::with_key_queue("kq", true).unwrap();
    pop.use_fifo(false);
    let item = client.send(pop).unwrap().into_result().into_payload();
    assert_eq!(item.key_string(), "k2");
    assert_eq!(item.value_string(), "v2");
}

#[test]
fn test_queue_remove() {
    let (_conf, client) = setup_client();
    for v in ["1", "2", "3"] {
        client.queue_push("q", v).unwrap();
    }
    client.queue_remove("q", 2).unwrap();
    assert_eq!(client.queue_pop("q").unwrap().payload().value_string(), "3");
    assert!(matches!(
        client.queue_remove("q", 0),
        Err(K2hdkcError::InvalidCount(0))
    ));
}

// =============================================================================
// Settings Tests
// =============================================================================

#[test]
fn test_settings_apply_to_next_session() {
    let (_conf, mut client) = setup_client();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("other.yaml");

    client.set_chmpx_file(&missing).set_ctl_port(8022).set_cuk("cuk");
    assert_eq!(client.config().ctl_port, 8022);
    assert_eq!(client.config().cuk, "cuk");
    assert!(matches!(
        client.get("key"),
        Err(K2hdkcError::ConfigNotFound(_))
    ));
}

#[test]
fn test_reconnect_settings() {
    let (_conf, mut client) = setup_client();
    client
        .set_auto_rejoin(false)
        .set_auto_rejoin_retry(false)
        .set_cleanup(false);
    assert!(!client.config().auto_rejoin);
    assert!(!client.config().auto_rejoin_retry);
    assert!(!client.config().cleanup);
    client.set("key", "value").unwrap();
}

// =============================================================================
// Logging Tests
// =============================================================================

#[test]
fn test_log_file_receives_warnings() {
    let (_conf, mut client) = setup_client();
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("k2hdkc.log");

    client.set_log_severity(Severity::Warning);
    client.set_log_file(Some(log.as_path())).unwrap();
    assert_eq!(client.logger().log_file(), Some(log.clone()));

    assert!(client.queue_pop("missing").is_err());

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("QueuePop.execute() failed"));
    assert!(text.contains("DKC_RES_SUBCODE_NODATA"));
}

#[test]
fn test_silent_logger_writes_nothing() {
    let (_conf, mut client) = setup_client();
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("silent.log");

    client.set_log_file(Some(log.as_path())).unwrap();
    assert!(client.queue_pop("missing").is_err());
    assert_eq!(fs::read_to_string(&log).unwrap(), "");
}

#[test]
fn test_log_back_to_stderr() {
    let (_conf, mut client) = setup_client();
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("k2hdkc.log");

    client.set_log_file(Some(log.as_path())).unwrap();
    client.set_log_file(None).unwrap();
    assert_eq!(client.logger().log_file(), None);
}

#[test]
fn test_lib_log_level_on_memory_backend() {
    let (_conf, mut client) = setup_client();
    client.set_lib_log_level(LibLogLevel::K2HDKC | LibLogLevel::CHMPX);
    client.set_lib_log_level(LibLogLevel::SILENT);
    client.set("key", "value").unwrap();
}

#[test]
fn test_replacing_logger() {
    let (_conf, mut client) = setup_client();
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("replacement.log");

    client.set_logger(Logger::to_file(&log, Severity::Warning).unwrap());
    assert_eq!(client.logger().severity(), Severity::Warning);
    assert!(client.get_sub_keys("missing").is_err());
    assert!(fs::read_to_string(&log).unwrap().contains("GetSubKeys.execute() failed"));

    client.close();
    assert_eq!(client.logger().log_file(), None);
}
