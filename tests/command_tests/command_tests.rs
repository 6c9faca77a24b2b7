//! Tests for commands
//!
//! These tests verify:
//! - Construction-time validation of required fields
//! - The single-shot lifecycle (Constructed -> Succeeded / Failed)
//! - Each command against an in-memory cluster through one session
//! - Status codes recorded on success and failure

use std::sync::Arc;

use k2hdkc::native::{MemoryCluster, Native};
use k2hdkc::{
    AddSubKey, CasGet, CasIncDec, CasInit, CasSet, CasValue, CasWidth, ClearSubKeys, Client,
    ClientConfig, Command, CommandState, Get, GetAttrs, GetSubKeys, K2hdkcError, Logger,
    QueuePop, QueuePush, QueueRemove, Remove, RemoveSubKey, Rename, ResCode, Session, Set, SetAll,
    SetSubKeys, Severity, Status, SubCode,
};
use tempfile::NamedTempFile;

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

fn exec<C: Command>(session: &Session, mut cmd: C) -> C {
    cmd.execute(session).unwrap();
    cmd
}

fn get_string(session: &Session, key: &str) -> String {
    exec(session, Get::new(key).unwrap()).result().string()
}

/// A read of an absent key succeeds with an empty value and `NODATA`
fn assert_no_data(session: &Session, key: &str) {
    let get = exec(session, Get::new(key).unwrap());
    assert!(get.result().ok());
    assert!(get.result().bytes().is_empty());
    assert_eq!(get.result().status(), Status::new(ResCode::SUCCESS, SubCode::NODATA));
    assert_eq!(get.result().error_text(), "DKC_RES_SUCCESS DKC_RES_SUBCODE_NODATA");
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_key_rejected_everywhere() {
    assert!(matches!(Get::new(""), Err(K2hdkcError::ZeroLength { field: "key" })));
    assert!(Set::new("", "v").is_err());
    assert!(Remove::new("").is_err());
    assert!(GetSubKeys::new("").is_err());
    assert!(ClearSubKeys::new("").is_err());
    assert!(GetAttrs::new("").is_err());
    assert!(CasInit::new("").is_err());
    assert!(CasGet::new("").is_err());
    assert!(CasIncDec::increment("").is_err());
}

#[test]
fn test_set_allows_empty_value() {
    let cmd = Set::new("key", "").unwrap();
    assert_eq!(cmd.value().as_ref(), b"\0");
    let cmd = Set::new("key", Vec::<u8>::new()).unwrap();
    assert!(cmd.value().is_empty());
}

#[test]
fn test_rename_field_names() {
    let err = Rename::new("", "new").unwrap_err();
    assert_eq!(err.to_string(), "len(oldKey) is zero");
    let err = Rename::new("old", "").unwrap_err();
    assert_eq!(err.to_string(), "len(newKey) is zero");
    let err = Rename::new("old", "new").unwrap().set_parent_key("").map(|_| ()).unwrap_err();
    assert_eq!(err.to_string(), "len(parentKey) is zero");
}

#[test]
fn test_subkey_field_names() {
    let err = AddSubKey::new("parent", "", "v").unwrap_err();
    assert_eq!(err.to_string(), "len(skey) is zero");
    assert!(AddSubKey::new("parent", "child", "").is_ok());
    assert!(RemoveSubKey::new("parent", "").is_err());
    let err = SetSubKeys::new("parent", Vec::<&str>::new()).unwrap_err();
    assert_eq!(err.to_string(), "len(skeys) is zero");
}

#[test]
fn test_set_all_requires_value_and_subkeys() {
    let err = SetAll::new("key", "", ["a"]).unwrap_err();
    assert_eq!(err.to_string(), "len(val) is zero");
    assert!(SetAll::new("key", "v", Vec::<&str>::new()).is_err());
}

#[test]
fn test_queue_validation() {
    let err = QueuePush::new("", "v").unwrap_err();
    assert_eq!(err.to_string(), "len(prefix) is zero");
    assert!(QueuePush::new("q", "").is_err());
    assert!(QueuePop::new("").is_err());
    assert!(matches!(QueueRemove::new("q", 0), Err(K2hdkcError::InvalidCount(0))));
    assert!(matches!(QueueRemove::new("q", -3), Err(K2hdkcError::InvalidCount(-3))));
    assert!(QueueRemove::new("q", i64::from(i32::MAX) + 1).is_err());
    assert_eq!(QueueRemove::new("q", i64::from(i32::MAX)).unwrap().count(), i32::MAX);
}

#[test]
fn test_cas_validation() {
    let err = CasSet::new("key", 1u32, 2u64).unwrap_err();
    assert!(matches!(err, K2hdkcError::CasLengthMismatch { old: 4, new: 8 }));
    assert!(CasInit::with_value("key", vec![1u8, 2, 3]).is_err());
    assert!(CasGet::new("key").unwrap().set_value_len(3).is_err());
    assert_eq!(CasGet::new("key").unwrap().width(), CasWidth::W32);
    assert_eq!(CasInit::new("key").unwrap().value(), CasValue::U64(0));
}

#[test]
fn test_validation_errors_are_flagged() {
    assert!(Get::new("").unwrap_err().is_validation());
    assert!(QueueRemove::new("q", 0).unwrap_err().is_validation());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_new_command_state() {
    let cmd = Get::new("key").unwrap();
    assert_eq!(cmd.state(), CommandState::Constructed);
    assert!(!cmd.result().ok());
    assert_eq!(cmd.name(), "Get");
}

#[test]
fn test_second_execute_rejected() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut cmd = Set::new("key", "value").unwrap();
    cmd.execute(&session).unwrap();
    assert_eq!(cmd.state(), CommandState::Succeeded);

    let err = cmd.execute(&session).unwrap_err();
    assert!(matches!(err, K2hdkcError::AlreadyExecuted("Set")));
    assert_eq!(cmd.state(), CommandState::Succeeded);
}

#[test]
fn test_failed_command_keeps_status() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut cmd = QueuePop::new("empty").unwrap();
    let err = cmd.execute(&session).unwrap_err();
    assert_eq!(err.status(), Some(&Status::error(SubCode::NODATA)));
    assert_eq!(cmd.state(), CommandState::Failed);
    assert!(!cmd.result().ok());
    assert_eq!(cmd.result().error_text(), "DKC_RES_ERROR DKC_RES_SUBCODE_NODATA");
    assert!(cmd.result().payload().value_bytes().is_empty());
}

#[test]
fn test_execute_on_closed_session() {
    let (_conf, client) = setup_client();
    let mut session = client.create_session().unwrap();
    session.close().unwrap();

    let mut cmd = Get::new("key").unwrap();
    assert!(matches!(cmd.execute(&session), Err(K2hdkcError::SessionClosed)));
    assert_eq!(cmd.state(), CommandState::Failed);
}

#[test]
fn test_bad_password_fails_before_call() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut cmd = Set::new("key", "value").unwrap();
    cmd.set_enc_pass("bad\0pass");
    assert!(matches!(cmd.execute(&session), Err(K2hdkcError::InvalidPassword)));
    assert_eq!(cmd.state(), CommandState::Failed);
}

// =============================================================================
// Value Command Tests
// =============================================================================

#[test]
fn test_set_get_remove() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let set = exec(&session, Set::new("hello", "world").unwrap());
    assert!(set.result().ok());
    assert_eq!(set.result().error_text(), Status::SUCCESS_TEXT);

    let get = exec(&session, Get::new("hello").unwrap());
    assert_eq!(get.result().bytes().as_ref(), b"world\0");
    assert_eq!(get.result().string(), "world");

    exec(&session, Remove::new("hello").unwrap());
    assert_no_data(&session, "hello");
}

#[test]
fn test_get_missing_key_succeeds_with_nodata() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    assert_no_data(&session, "never-set");
}

#[test]
fn test_remove_twice_succeeds() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, Set::new("k", "v").unwrap());
    for _ in 0..2 {
        let remove = exec(&session, Remove::new("k").unwrap());
        assert!(remove.result().ok());
        assert_eq!(remove.result().error_text(), Status::SUCCESS_TEXT);
    }
    assert_no_data(&session, "k");
}

#[test]
fn test_binary_and_text_keys_are_distinct() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, Set::new("k", "text").unwrap());
    exec(&session, Set::new(b"k", b"binary").unwrap());

    assert_eq!(get_string(&session, "k"), "text");
    let binary = exec(&session, Get::new(b"k").unwrap()).into_result().into_payload();
    assert_eq!(binary.as_ref(), b"binary");
}

#[test]
fn test_password_scopes_reads() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut set = Set::new("secret", "value").unwrap();
    set.set_enc_pass("pw");
    exec(&session, set);

    assert_no_data(&session, "secret");
    let mut get = Get::new("secret").unwrap();
    get.set_enc_pass("pw");
    assert_eq!(exec(&session, get).result().string(), "value");
}

#[test]
fn test_rename_updates_parent() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, AddSubKey::new("parent", "old", "v").unwrap());
    let mut rename = Rename::new("old", "new").unwrap();
    rename.set_parent_key("parent").unwrap();
    exec(&session, rename);

    assert_eq!(get_string(&session, "new"), "v");
    let subkeys = exec(&session, GetSubKeys::new("parent").unwrap());
    assert_eq!(subkeys.result().strings(), vec!["new".to_string()]);
    assert_no_data(&session, "old");
}

#[test]
fn test_rename_missing_key_fails() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut cmd = Rename::new("nope", "new").unwrap();
    assert!(cmd.execute(&session).is_err());
    assert_eq!(cmd.result().status(), Status::error(SubCode::NODATA));
}

#[test]
fn test_get_attrs_reports_mtime() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut set = Set::new("key", "value").unwrap();
    set.set_expire(3600);
    exec(&session, set);

    let attrs = exec(&session, GetAttrs::new("key").unwrap()).into_result();
    let map = attrs.to_string_map();
    let mtime: u64 = map["mtime"].parse().unwrap();
    let expire: u64 = map["expire"].parse().unwrap();
    assert!(mtime > 0);
    assert!(expire > mtime);
}

// =============================================================================
// Subkey Command Tests
// =============================================================================

#[test]
fn test_add_and_remove_subkey() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, AddSubKey::new("parent", "a", "1").unwrap());
    exec(&session, AddSubKey::new("parent", "b", "2").unwrap());
    exec(&session, AddSubKey::new("parent", "a", "3").unwrap());

    let subkeys = exec(&session, GetSubKeys::new("parent").unwrap());
    assert_eq!(subkeys.result().strings(), vec!["a", "b"]);
    assert_eq!(get_string(&session, "a"), "3");

    let mut remove = RemoveSubKey::new("parent", "a").unwrap();
    remove.set_nest(true);
    exec(&session, remove);
    assert_no_data(&session, "a");

    let mut again = RemoveSubKey::new("parent", "a").unwrap();
    assert!(again.execute(&session).is_err());
}

#[test]
fn test_set_and_clear_subkeys() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, Set::new("parent", "v").unwrap());
    exec(&session, SetSubKeys::new("parent", ["x", "y", "x"]).unwrap());
    let subkeys = exec(&session, GetSubKeys::new("parent").unwrap());
    assert_eq!(subkeys.result().strings(), vec!["x", "y", "x"]);

    exec(&session, ClearSubKeys::new("parent").unwrap());
    let mut get = GetSubKeys::new("parent").unwrap();
    assert!(get.execute(&session).is_err());
    assert_eq!(get.result().status().subcode, SubCode::NODATA);
}

#[test]
fn test_set_rm_subkey_list() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, SetAll::new("parent", "v1", ["a", "b"]).unwrap());
    exec(&session, Set::new("parent", "v2").unwrap());
    assert_eq!(
        exec(&session, GetSubKeys::new("parent").unwrap()).result().strings(),
        vec!["a", "b"]
    );

    let mut set = Set::new("parent", "v3").unwrap();
    set.set_rm_subkey_list(true);
    exec(&session, set);
    assert!(GetSubKeys::new("parent").unwrap().execute(&session).is_err());
    assert_eq!(get_string(&session, "parent"), "v3");
}

// =============================================================================
// CAS Command Tests
// =============================================================================

#[test]
fn test_cas_roundtrip_each_width() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    for (key, value) in [
        ("c8", CasValue::U8(0xfe)),
        ("c16", CasValue::U16(0xbeef)),
        ("c32", CasValue::U32(0xdead_beef)),
        ("c64", CasValue::U64(u64::MAX - 1)),
    ] {
        exec(&session, CasInit::with_value(key, value).unwrap());
        let get = exec(&session, CasGet::with_width(key, value.width()).unwrap());
        assert_eq!(get.result().value(), Some(value));
        assert_eq!(get.result().bytes(), value.to_le_bytes());
    }
}

#[test]
fn test_cas_set_detects_change() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, CasInit::with_value("counter", 10u32).unwrap());
    exec(&session, CasSet::new("counter", 10u32, 20u32).unwrap());

    let mut stale = CasSet::new("counter", 10u32, 30u32).unwrap();
    assert!(stale.execute(&session).is_err());
    assert_eq!(stale.result().status().subcode, SubCode::DATACHANGED);

    let get = exec(&session, CasGet::new("counter").unwrap());
    assert_eq!(get.result().as_u64(), Some(20));
}

#[test]
fn test_cas_wrong_width_read_fails() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, CasInit::new("counter").unwrap());
    let mut get = CasGet::with_width("counter", CasWidth::W8).unwrap();
    assert!(get.execute(&session).is_err());
    assert_eq!(get.result().value(), None);
    assert!(get.result().bytes().is_empty());
}

#[test]
fn test_cas_increment_decrement() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, CasInit::with_value("counter", 0u8).unwrap());
    exec(&session, CasIncDec::increment("counter").unwrap());
    exec(&session, CasIncDec::increment("counter").unwrap());
    exec(&session, CasIncDec::decrement("counter").unwrap());

    let get = exec(&session, CasGet::with_width("counter", CasWidth::W8).unwrap());
    assert_eq!(get.result().value(), Some(CasValue::U8(1)));

    exec(&session, CasIncDec::decrement("counter").unwrap());
    exec(&session, CasIncDec::decrement("counter").unwrap());
    let get = exec(&session, CasGet::with_width("counter", CasWidth::W8).unwrap());
    assert_eq!(get.result().value(), Some(CasValue::U8(u8::MAX)));
}

// =============================================================================
// Queue Command Tests
// =============================================================================

#[test]
fn test_queue_fifo_and_lifo() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    for value in ["1", "2", "3"] {
        exec(&session, QueuePush::new("q", value).unwrap());
    }

    let head = exec(&session, QueuePop::new("q").unwrap()).into_result().into_payload();
    assert_eq!(head.value_string(), "1");
    assert_eq!(head.key, None);

    let mut lifo = QueuePop::new("q").unwrap();
    lifo.use_fifo(false);
    let tail = exec(&session, lifo).into_result().into_payload();
    assert_eq!(tail.value_string(), "3");
}

#[test]
fn test_key_queue_pairs() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    exec(&session, QueuePush::with_key("kq", "v1", "k1").unwrap());
    exec(&session, QueuePush::with_key("kq", "v2", "k2").unwrap());

    let item = exec(&session, QueuePop::with_key_queue("kq", true).unwrap())
        .into_result()
        .into_payload();
    assert_eq!(item.key_string(), "k1");
    assert_eq!(item.value_string(), "v1");

    // plain and key queues of one prefix are separate
    assert!(QueuePop::new("kq").unwrap().execute(&session).is_err());
}

#[test]
fn test_queue_remove() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    for value in ["a", "b", "c", "d"] {
        exec(&session, QueuePush::new("q", value).unwrap());
    }
    exec(&session, QueueRemove::new("q", 2).unwrap());

    let item = exec(&session, QueuePop::new("q").unwrap()).into_result().into_payload();
    assert_eq!(item.value_string(), "c");
}

#[test]
fn test_queue_password_scopes_pops() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut push = QueuePush::new("sealed", "payload").unwrap();
    push.set_enc_pass("pw");
    exec(&session, push);

    let mut open_pop = QueuePop::new("sealed").unwrap();
    assert!(open_pop.execute(&session).is_err());
    assert_eq!(open_pop.result().status(), Status::error(SubCode::NODATA));

    let mut pop = QueuePop::new("sealed").unwrap();
    pop.set_enc_pass("pw");
    let item = exec(&session, pop).into_result().into_payload();
    assert_eq!(item.value_string(), "payload");
}

#[test]
fn test_expired_queue_item_is_skipped() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut stale = QueuePush::new("q", "stale").unwrap();
    stale.set_expire(-1);
    exec(&session, stale);
    exec(&session, QueuePush::new("q", "fresh").unwrap());

    let item = exec(&session, QueuePop::new("q").unwrap()).into_result().into_payload();
    assert_eq!(item.value_string(), "fresh");
}

#[test]
fn test_pop_empty_queue() {
    let (_conf, client) = setup_client();
    let session = client.create_session().unwrap();

    let mut pop = QueuePop::new("empty").unwrap();
    let err = pop.execute(&session).unwrap_err();
    assert_eq!(err.status().map(|s| s.subcode), Some(SubCode::NODATA));
    assert!(pop.result().payload().value.is_empty());
}
