//! Table Integration Tests
//!
//! End-to-end tests of the public table API over both backends, including
//! concurrent-update serialization and persistence across reopen.
//!
//! Run with:
//! ```bash
//! cargo test --test table_integration
//! ```

use facet_db::{Error, FieldValue, KvStore, Record};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

// ============================================================================
// Core Semantics (in-memory backend)
// ============================================================================

#[test]
fn test_insert_read_identity() {
    let kv = KvStore::in_memory();
    let users = kv.table("users").unwrap();

    let rec = Record::new()
        .with("name", "alice")
        .with("age", 30i64)
        .with("active", true);
    users.insert("alice", rec.clone()).unwrap();

    assert_eq!(users.read("alice").unwrap(), rec);
}

#[test]
fn test_update_merge_semantics() {
    let kv = KvStore::in_memory();
    let users = kv.table("users").unwrap();

    users
        .insert("k", Record::new().with("a", 1i64).with("b", 2i64))
        .unwrap();
    users
        .update("k", Record::new().with("b", 3i64).with("c", 4i64))
        .unwrap();

    let rec = users.read("k").unwrap();
    assert_eq!(rec.get("a").unwrap().as_int().unwrap(), 1);
    assert_eq!(rec.get("b").unwrap().as_int().unwrap(), 3);
    assert_eq!(rec.get("c").unwrap().as_int().unwrap(), 4);
    assert_eq!(rec.len(), 3);
}

#[test]
fn test_subset_read_omits_missing_fields() {
    let kv = KvStore::in_memory();
    let users = kv.table("users").unwrap();

    users
        .insert(
            "k",
            Record::new().with("a", 1i64).with("b", 2i64).with("c", 3i64),
        )
        .unwrap();

    let subset = users.read_fields("k", &["a", "c"]).unwrap();
    assert_eq!(subset.len(), 2);
    assert_eq!(subset.get("a").unwrap().as_int().unwrap(), 1);
    assert_eq!(subset.get("c").unwrap().as_int().unwrap(), 3);

    let partial = users.read_fields("k", &["a", "z"]).unwrap();
    assert_eq!(partial.len(), 1);
    assert!(partial.contains("a"));
    assert!(!partial.contains("z"));
}

#[test]
fn test_erase_is_idempotent_and_read_fails_after() {
    let kv = KvStore::in_memory();
    let users = kv.table("users").unwrap();

    // Erasing a key that never existed succeeds
    users.erase("ghost").unwrap();

    users.insert("k", Record::new().with("a", 1i64)).unwrap();
    users.erase("k").unwrap();
    users.erase("k").unwrap();

    assert!(matches!(users.read("k"), Err(Error::KeyNotFound(_))));
}

#[test]
fn test_destroyed_table_rejects_all_operations() {
    let kv = KvStore::in_memory();
    let doomed = kv.table("doomed").unwrap();
    doomed.insert("k", Record::new().with("a", 1i64)).unwrap();

    doomed.destroy().unwrap();

    assert!(matches!(
        doomed.insert("k", Record::new()),
        Err(Error::TableDestroyed(_))
    ));
    assert!(matches!(doomed.read("k"), Err(Error::TableDestroyed(_))));
    assert!(matches!(doomed.destroy(), Err(Error::TableDestroyed(_))));
}

#[test]
fn test_two_handles_share_one_table() {
    let kv = KvStore::in_memory();
    let writer = kv.table("shared").unwrap();
    let reader = kv.table("shared").unwrap();

    writer
        .insert("k", Record::new().with("from", "writer"))
        .unwrap();
    assert_eq!(
        reader.read("k").unwrap().get("from").unwrap().as_text().unwrap(),
        "writer"
    );
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_updates_lose_no_fields() {
    let kv = KvStore::in_memory();
    let table = Arc::new(kv.table("counters").unwrap());
    table.insert("k", Record::new().with("seed", 0i64)).unwrap();

    // Each writer repeatedly merges its own disjoint fields; the write lock
    // serializes the read-merge-write sequences, so none may be lost.
    let writers = 4usize;
    let rounds = 25usize;
    let mut handles = Vec::new();
    for w in 0..writers {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for r in 0..rounds {
                let field = format!("w{}_r{}", w, r);
                table
                    .update("k", Record::new().with(field, r as i64))
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let rec = table.read("k").unwrap();
    assert_eq!(rec.len(), 1 + writers * rounds);
    for w in 0..writers {
        for r in 0..rounds {
            let field = format!("w{}_r{}", w, r);
            assert_eq!(
                rec.get(&field).unwrap().as_int().unwrap(),
                r as i64,
                "field {} lost or corrupted",
                field
            );
        }
    }
}

#[test]
fn test_concurrent_readers_see_whole_records() {
    let kv = KvStore::in_memory();
    let table = Arc::new(kv.table("docs").unwrap());

    // Writer alternates between two complete states; readers must only ever
    // observe one of them, never a mix.
    let state_a = Record::new().with("x", 1i64).with("y", 1i64);
    let state_b = Record::new().with("x", 2i64).with("y", 2i64);
    table.insert("k", state_a.clone()).unwrap();

    let writer = {
        let table = Arc::clone(&table);
        let (a, b) = (state_a.clone(), state_b.clone());
        thread::spawn(move || {
            for i in 0..50 {
                let next = if i % 2 == 0 { b.clone() } else { a.clone() };
                table.insert("k", next).unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..3 {
        let table = Arc::clone(&table);
        readers.push(thread::spawn(move || {
            for _ in 0..50 {
                let rec = table.read("k").unwrap();
                let x = rec.get("x").unwrap().as_int().unwrap();
                let y = rec.get("y").unwrap().as_int().unwrap();
                assert_eq!(x, y, "observed a torn record");
            }
        }));
    }

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

// ============================================================================
// Persistence (file backend)
// ============================================================================

#[test]
fn test_records_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.facet");

    {
        let kv = KvStore::create(&path).unwrap();
        let users = kv.table("users").unwrap();
        users
            .insert(
                "alice",
                Record::new()
                    .with("age", 30i64)
                    .with("bio", "likes storage engines")
                    .with("avatar", vec![0xDEu8, 0xAD, 0xBE, 0xEF]),
            )
            .unwrap();
        kv.sync().unwrap();
    }

    {
        let kv = KvStore::open(&path).unwrap();
        let users = kv.table("users").unwrap();
        let rec = users.read("alice").unwrap();
        assert_eq!(rec.get("age").unwrap().as_int().unwrap(), 30);
        assert_eq!(
            rec.get("bio").unwrap().as_text().unwrap(),
            "likes storage engines"
        );
        assert_eq!(
            rec.get("avatar").unwrap().as_bytes().unwrap(),
            &[0xDE, 0xAD, 0xBE, 0xEF]
        );
    }
}

#[test]
fn test_update_merge_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.facet");

    {
        let kv = KvStore::create(&path).unwrap();
        let table = kv.table("t").unwrap();
        table
            .insert("k", Record::new().with("a", 1i64).with("b", 2i64))
            .unwrap();
        table
            .update("k", Record::new().with("b", 3i64).with("c", 4i64))
            .unwrap();
        kv.sync().unwrap();
    }

    {
        let kv = KvStore::open(&path).unwrap();
        let rec = kv.table("t").unwrap().read("k").unwrap();
        assert_eq!(rec.get("a").unwrap().as_int().unwrap(), 1);
        assert_eq!(rec.get("b").unwrap().as_int().unwrap(), 3);
        assert_eq!(rec.get("c").unwrap().as_int().unwrap(), 4);
    }
}

#[test]
fn test_erase_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.facet");

    {
        let kv = KvStore::create(&path).unwrap();
        let table = kv.table("t").unwrap();
        table.insert("kept", Record::new().with("a", 1i64)).unwrap();
        table.insert("gone", Record::new().with("b", 2i64)).unwrap();
        table.erase("gone").unwrap();
        kv.sync().unwrap();
    }

    {
        let kv = KvStore::open(&path).unwrap();
        let table = kv.table("t").unwrap();
        assert_eq!(table.keys().unwrap(), vec!["kept"]);
        assert!(matches!(table.read("gone"), Err(Error::KeyNotFound(_))));
    }
}

#[test]
fn test_destroy_persists() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.facet");

    {
        let kv = KvStore::create(&path).unwrap();
        kv.table("keep")
            .unwrap()
            .insert("k", Record::new().with("a", 1i64))
            .unwrap();
        kv.table("drop")
            .unwrap()
            .insert("k", Record::new().with("b", 2i64))
            .unwrap();
        kv.table("drop").unwrap().destroy().unwrap();
        kv.sync().unwrap();
    }

    {
        let kv = KvStore::open(&path).unwrap();
        assert_eq!(kv.table_names().unwrap(), vec!["keep"]);
    }
}

// ============================================================================
// Typed Values
// ============================================================================

#[test]
fn test_typed_access_and_mismatch() {
    let kv = KvStore::in_memory();
    let table = kv.table("t").unwrap();

    table
        .insert(
            "k",
            Record::new()
                .with("count", 7i64)
                .with("ratio", 0.5f64)
                .with("label", "seven"),
        )
        .unwrap();

    let rec = table.read("k").unwrap();
    assert_eq!(rec.get("count").unwrap().as_int().unwrap(), 7);
    assert_eq!(rec.get("ratio").unwrap().as_float().unwrap(), 0.5);

    let err = rec.get("count").unwrap().as_text().unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            expected: "text",
            found: "int"
        }
    ));
    assert!(matches!(
        rec.get("label").unwrap(),
        FieldValue::Text(s) if s == "seven"
    ));
}
