//! Data directory persistence.

use convoroom_cli::store::DataDir;
use convoroom_core::{RoomId, ledger::RoomLedger};
use rand::{SeedableRng, rngs::StdRng};
use time::macros::datetime;

#[test]
fn generated_name_is_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataDir::open(dir.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let first = store.resolve_username(None, &mut rng).unwrap();
    let second = store.resolve_username(None, &mut rng).unwrap();

    assert_eq!(first, second);
    assert_eq!(store.load_username().unwrap(), Some(first));
}

#[test]
fn explicit_name_is_not_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataDir::open(dir.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(store.resolve_username(Some(" alice "), &mut rng).unwrap(), "alice");
    assert_eq!(store.load_username().unwrap(), None);

    // Blank override falls back to generation.
    let generated = store.resolve_username(Some("  "), &mut rng).unwrap();
    assert_ne!(generated, "");
    assert_eq!(store.load_username().unwrap(), Some(generated));
}

#[test]
fn ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataDir::open(dir.path().join("nested")).unwrap();
    assert!(store.load_ledger().unwrap().is_empty());

    let mut ledger = RoomLedger::new();
    ledger.record_created(RoomId::new("OLD111"), datetime!(2024-05-01 09:00:00 UTC));
    ledger.record_created(RoomId::new("NEW222"), datetime!(2024-05-01 10:00:00 UTC));
    store.save_ledger(&ledger).unwrap();

    let reopened = DataDir::open(dir.path().join("nested")).unwrap();
    let loaded = reopened.load_ledger().unwrap();
    let ids: Vec<_> = loaded.entries().iter().map(|e| e.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["NEW222", "OLD111"]);
    assert_eq!(
        loaded.created_at(&RoomId::new("OLD111")),
        Some(datetime!(2024-05-01 09:00:00 UTC))
    );
}

#[test]
fn corrupt_files_are_treated_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("rooms.json"), "{not json").unwrap();
    std::fs::write(dir.path().join("profile.json"), "[]").unwrap();

    let store = DataDir::open(dir.path()).unwrap();
    assert!(store.load_ledger().unwrap().is_empty());
    assert_eq!(store.load_username().unwrap(), None);
}

#[test]
fn ledger_file_is_a_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataDir::open(dir.path()).unwrap();

    let mut ledger = RoomLedger::new();
    ledger.record_created(RoomId::new("AB12CD"), datetime!(2024-05-01 10:00:00 UTC));
    store.save_ledger(&ledger).unwrap();

    let text = std::fs::read_to_string(dir.path().join("rooms.json")).unwrap();
    insta::assert_snapshot!(text, @r#"
    [
      {
        "id": "AB12CD",
        "timestamp": "2024-05-01T10:00:00Z"
      }
    ]
    "#);
}
