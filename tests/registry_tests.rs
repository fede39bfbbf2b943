//! Integration tests for the record store and registration workflow against
//! on-disk databases.

use std::time::Duration;

use rusqlite::Connection;
use tempfile::TempDir;
use user_registry::ids::IdSource;
use user_registry::store::{Result as StoreResult, SCHEMA_VERSION};
use user_registry::{
    FormFields, ListingRenderer, RecordField, RecordStore, Registry, StoreError, Submission,
    UserId, UserRecord,
};

struct TestDb {
    path: std::path::PathBuf,
    _dir: TempDir,
}

fn setup_test_db() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    TestDb {
        path: dir.path().join("nested").join("registry.sqlite"),
        _dir: dir,
    }
}

/// Hands out the same id every time.
struct FixedIds(UserId);

impl IdSource for FixedIds {
    fn next_id(&mut self, _store: &RecordStore) -> StoreResult<UserId> {
        Ok(self.0)
    }
}

#[derive(Default)]
struct Listing {
    rows: Vec<UserRecord>,
}

impl ListingRenderer for Listing {
    fn render(&mut self, records: &[UserRecord]) {
        self.rows = records.to_vec();
    }

    fn remove_row(&mut self, user_id: UserId) {
        self.rows.retain(|row| row.user_id != user_id);
    }
}

fn form(pairs: [(&str, &str); 6]) -> FormFields {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ana() -> FormFields {
    form([
        ("name", "Ana"),
        ("family", "Lee"),
        ("age", "30"),
        ("city", "Rome"),
        ("email", "a@b.co"),
        ("password", "x"),
    ])
}

// ============================================================================
// Schema lifecycle
// ============================================================================

#[test]
fn open_creates_file_and_upgrades_once() {
    let db = setup_test_db();

    let store = RecordStore::open(&db.path).unwrap();
    assert!(db.path.exists());
    assert_eq!(store.upgrade().map(|u| (u.from, u.to)), Some((0, SCHEMA_VERSION)));
    store.close().unwrap();

    let reopened = RecordStore::open(&db.path).unwrap();
    assert_eq!(reopened.upgrade(), None);
    assert_eq!(reopened.schema_version().unwrap(), SCHEMA_VERSION);
}

#[test]
fn reopening_keeps_records() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(7))).unwrap();
    let mut listing = Listing::default();
    registry.submit(&ana(), &mut listing).unwrap();
    registry.shutdown().unwrap();

    let store = RecordStore::open(&db.path).unwrap();
    let users = store.list_all().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, 7);
}

#[test]
fn newer_schema_is_refused() {
    let db = setup_test_db();
    RecordStore::open_with_version(&db.path, SCHEMA_VERSION + 1)
        .unwrap()
        .close()
        .unwrap();

    let err = RecordStore::open(&db.path).unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionTooNew { found, supported }
            if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
    ));
}

#[test]
fn unopenable_path_is_an_open_error() {
    let db = setup_test_db();
    std::fs::create_dir_all(&db.path).unwrap();

    let err = RecordStore::open(&db.path).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }), "{err:?}");
}

#[test]
fn uncreatable_data_directory_is_an_open_error() {
    let db = setup_test_db();
    let plain = db.path.parent().unwrap().with_file_name("plain");
    std::fs::write(&plain, b"not a directory").unwrap();

    let err = RecordStore::open(&plain.join("registry.sqlite")).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }), "{err:?}");
}

#[test]
fn locked_database_is_an_open_error() {
    let db = setup_test_db();
    std::fs::create_dir_all(db.path.parent().unwrap()).unwrap();
    let holder = Connection::open(&db.path).unwrap();
    holder
        .execute_batch("BEGIN EXCLUSIVE; CREATE TABLE held (x INTEGER);")
        .unwrap();

    let err = RecordStore::open_with_busy_timeout(&db.path, Duration::from_millis(50))
        .unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }), "{err:?}");

    holder.execute_batch("ROLLBACK;").unwrap();
    assert!(RecordStore::open(&db.path).is_ok());
}

// ============================================================================
// Registration scenarios
// ============================================================================

#[test]
fn valid_submission_appears_once() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(42))).unwrap();
    let mut listing = Listing::default();

    let outcome = registry.submit(&ana(), &mut listing).unwrap();

    let expected = UserRecord::from_fields(42, &ana());
    assert_eq!(outcome, Submission::Accepted(expected.clone()));
    assert_eq!(listing.rows, vec![expected.clone()]);
    assert_eq!(registry.store().list_all().unwrap(), vec![expected]);
}

#[test]
fn empty_name_is_rejected_and_store_unchanged() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(1))).unwrap();
    let mut listing = Listing::default();

    let mut fields = ana();
    fields.insert("name".into(), String::new());
    let outcome = registry.submit(&fields, &mut listing).unwrap();

    assert!(matches!(outcome, Submission::Rejected(ref err) if err.fields == vec![RecordField::Name]));
    assert!(registry.store().list_all().unwrap().is_empty());
    assert!(listing.rows.is_empty());
}

#[test]
fn colliding_id_fails_and_keeps_first_record() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(3))).unwrap();
    let mut listing = Listing::default();
    registry.submit(&ana(), &mut listing).unwrap();

    let mut other = ana();
    other.insert("name".into(), "Bo".into());
    let err = registry.submit(&other, &mut listing).unwrap_err();

    assert!(matches!(err, StoreError::DuplicateKey(3)));
    let users = registry.store().list_all().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "Ana");
}

#[test]
fn editing_city_keeps_other_fields() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(7))).unwrap();
    let mut listing = Listing::default();
    registry.submit(&ana(), &mut listing).unwrap();

    let mut session = registry.begin_edit(7).unwrap().unwrap();
    session.apply(RecordField::City, "Oslo");
    registry.commit_edit(&session, &mut listing).unwrap();

    let stored = registry.store().get_one(7).unwrap().unwrap();
    assert_eq!(stored.city, "Oslo");
    assert_eq!(stored.name, "Ana");
    assert_eq!(stored.family, "Lee");
    assert_eq!(stored.age, "30");
    assert_eq!(stored.email, "a@b.co");
    assert_eq!(listing.rows, vec![stored]);
}

// ============================================================================
// Store contracts
// ============================================================================

#[test]
fn update_is_a_full_replace() {
    let db = setup_test_db();
    let store = RecordStore::open(&db.path).unwrap();
    store.create(&UserRecord::from_fields(9, &ana())).unwrap();

    let replacement = UserRecord {
        user_id: 9,
        name: "Cy".into(),
        family: "Park".into(),
        age: "41".into(),
        city: "Seoul".into(),
        email: "cy@park.kr".into(),
        password: "y".into(),
    };
    store.update(&replacement).unwrap();

    assert_eq!(store.get_one(9).unwrap(), Some(replacement));
}

#[test]
fn delete_then_lookups_miss() {
    let db = setup_test_db();
    let mut registry = Registry::init(&db.path, Box::new(FixedIds(5))).unwrap();
    let mut listing = Listing::default();
    registry.submit(&ana(), &mut listing).unwrap();

    assert!(registry.remove(5, &mut listing).unwrap());
    assert!(listing.rows.is_empty());
    assert_eq!(registry.store().get_one(5).unwrap(), None);
    assert!(registry
        .store()
        .list_all()
        .unwrap()
        .iter()
        .all(|user| user.user_id != 5));

    assert!(!registry.remove(5, &mut listing).unwrap());
}

#[test]
fn list_all_is_stable_for_a_fixed_table() {
    let db = setup_test_db();
    let store = RecordStore::open(&db.path).unwrap();
    for id in [500, 2, 77] {
        store.create(&UserRecord::from_fields(id, &ana())).unwrap();
    }

    let first = store.list_all().unwrap();
    let second = store.list_all().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|u| u.user_id).collect::<Vec<_>>(),
        vec![2, 77, 500]
    );
}
