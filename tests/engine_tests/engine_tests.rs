//! Tests for Engine
//!
//! These tests verify:
//! - Basic upsert/remove/get operations
//! - Range iteration across MemTable and segments
//! - Overwrite precedence and tombstone shadowing
//! - Timestamp-first conflict resolution, generation order on ties
//! - Flush threshold behavior
//! - Recovery after close
//! - Engine lifecycle (open/close)

use std::fs;
use std::path::Path;

use bytes::Bytes;
use stratakv::config::Config;
use stratakv::engine::Engine;
use stratakv::storage::write_segment;
use stratakv::{Cell, StrataError, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_engine() -> (TempDir, Engine) {
    setup_temp_engine_with_threshold(1024 * 1024) // 1 MB
}

fn setup_temp_engine_with_threshold(threshold: usize) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = Engine::open_path(temp_dir.path(), threshold).unwrap();
    (temp_dir, engine)
}

fn scan(engine: &Engine, from: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
    engine
        .iter(from)
        .unwrap()
        .map(|pair| {
            let (key, data) = pair.unwrap();
            (key.to_vec(), data.to_vec())
        })
        .collect()
}

fn pair(key: &str, data: &str) -> (Vec<u8>, Vec<u8>) {
    (key.as_bytes().to_vec(), data.as_bytes().to_vec())
}

fn segment_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter(|e| {
            e.as_ref().unwrap().path().extension().and_then(|x| x.to_str()) == Some("dat")
        })
        .count()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_upsert_get() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"hello", b"world").unwrap();

    assert_eq!(engine.get(b"hello").unwrap(), Some(Bytes::from_static(b"world")));
}

#[test]
fn test_engine_get_nonexistent_key() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"b", b"1").unwrap();

    assert_eq!(engine.get(b"a").unwrap(), None);
    assert_eq!(engine.get(b"c").unwrap(), None);
}

#[test]
fn test_engine_remove() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"key", b"value").unwrap();
    engine.upsert(b"next", b"other").unwrap();
    engine.remove(b"key").unwrap();

    assert_eq!(engine.get(b"key").unwrap(), None);
    assert_eq!(scan(&engine, b""), vec![pair("next", "other")]);
}

#[test]
fn test_engine_remove_nonexistent_key() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.remove(b"ghost").unwrap();

    assert!(scan(&engine, b"").is_empty());
    assert_eq!(engine.memtable_entry_count(), 1);
}

#[test]
fn test_engine_empty_iteration() {
    let (_temp, engine) = setup_temp_engine();

    assert!(scan(&engine, b"").is_empty());
}

// =============================================================================
// Range Iteration Tests
// =============================================================================

#[test]
fn test_iter_ascending_from_key() {
    let (_temp, mut engine) = setup_temp_engine();

    for key in ["d", "a", "c", "b", "e"] {
        engine.upsert(key.as_bytes(), key.to_uppercase().as_bytes()).unwrap();
    }

    assert_eq!(
        scan(&engine, b"c"),
        vec![pair("c", "C"), pair("d", "D"), pair("e", "E")]
    );
    assert_eq!(scan(&engine, b"bb").len(), 3);
    assert!(scan(&engine, b"f").is_empty());
}

#[test]
fn test_iter_merges_memtable_and_segments() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"a", b"1").unwrap();
    engine.upsert(b"d", b"4").unwrap();
    engine.flush().unwrap();
    engine.upsert(b"c", b"3").unwrap();
    engine.flush().unwrap();
    engine.upsert(b"b", b"2").unwrap();

    assert_eq!(engine.segment_count(), 2);
    assert_eq!(
        scan(&engine, b""),
        vec![pair("a", "1"), pair("b", "2"), pair("c", "3"), pair("d", "4")]
    );
}

#[test]
fn test_iter_is_recomputed_each_call() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"a", b"1").unwrap();
    let before = scan(&engine, b"");
    engine.upsert(b"b", b"2").unwrap();
    let after = scan(&engine, b"");

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
}

// =============================================================================
// Precedence Tests
// =============================================================================

#[test]
fn test_overwrite_precedence_memtable_over_segment() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"A", b"v1").unwrap();
    engine.flush().unwrap();
    engine.upsert(b"A", b"v2").unwrap();

    assert_eq!(scan(&engine, b""), vec![pair("A", "v2")]);
}

#[test]
fn test_overwrite_precedence_newer_segment() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"A", b"v1").unwrap();
    engine.flush().unwrap();
    engine.upsert(b"A", b"v2").unwrap();
    engine.flush().unwrap();

    assert_eq!(scan(&engine, b""), vec![pair("A", "v2")]);
}

#[test]
fn test_tombstone_shadows_older_segment() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"A", b"v1").unwrap();
    engine.flush().unwrap();
    engine.remove(b"A").unwrap();
    engine.flush().unwrap();

    assert_eq!(engine.segment_count(), 2);
    assert!(scan(&engine, b"").is_empty());
    assert_eq!(engine.get(b"A").unwrap(), None);
}

#[test]
fn test_tombstone_in_memtable_shadows_segment() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"A", b"v1").unwrap();
    engine.upsert(b"B", b"v1").unwrap();
    engine.flush().unwrap();
    engine.remove(b"A").unwrap();

    assert_eq!(scan(&engine, b""), vec![pair("B", "v1")]);
}

#[test]
fn test_upsert_after_tombstone_revives_key() {
    let (_temp, mut engine) = setup_temp_engine();

    engine.upsert(b"A", b"v1").unwrap();
    engine.flush().unwrap();
    engine.remove(b"A").unwrap();
    engine.flush().unwrap();
    engine.upsert(b"A", b"v3").unwrap();

    assert_eq!(scan(&engine, b""), vec![pair("A", "v3")]);
}

#[test]
fn test_timestamp_wins_over_generation_and_ties_go_to_newest() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    write_segment(
        &dir.join("0.dat"),
        vec![
            Cell::new(&b"a"[..], Value::present_at(100, "gen0")),
            Cell::new(&b"b"[..], Value::tombstone_at(100)),
            Cell::new(&b"c"[..], Value::present_at(200, "gen0-newer")),
        ],
    )
    .unwrap();
    write_segment(
        &dir.join("1.dat"),
        vec![
            Cell::new(&b"a"[..], Value::tombstone_at(100)),
            Cell::new(&b"b"[..], Value::present_at(100, "gen1")),
            Cell::new(&b"c"[..], Value::present_at(150, "gen1-older")),
        ],
    )
    .unwrap();

    let engine = Engine::open_path(dir, 1024).unwrap();

    assert_eq!(engine.next_generation(), 2);
    assert_eq!(
        scan(&engine, b""),
        vec![pair("b", "gen1"), pair("c", "gen0-newer")]
    );
}

// =============================================================================
// Flush Threshold Tests
// =============================================================================

#[test]
fn test_no_flush_below_threshold() {
    let (temp, mut engine) = setup_temp_engine_with_threshold(10);

    engine.upsert(b"a", b"1234").unwrap(); // 5 bytes
    engine.upsert(b"b", b"123").unwrap(); // 9 bytes

    assert_eq!(segment_files(temp.path()), 0);
    assert_eq!(engine.memtable_size(), 9);
}

#[test]
fn test_flush_when_threshold_reached() {
    let (temp, mut engine) = setup_temp_engine_with_threshold(10);

    engine.upsert(b"a", b"1234").unwrap(); // 5 bytes
    engine.upsert(b"b", b"1234").unwrap(); // 10 bytes -> flush
    assert_eq!(segment_files(temp.path()), 1);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.memtable_entry_count(), 0);

    engine.upsert(b"c", b"12345678").unwrap(); // 9 bytes
    assert_eq!(segment_files(temp.path()), 1);

    engine.remove(b"d").unwrap(); // 10 bytes -> flush
    assert_eq!(segment_files(temp.path()), 2);

    assert_eq!(
        scan(&engine, b""),
        vec![pair("a", "1234"), pair("b", "1234"), pair("c", "12345678")]
    );
}

#[test]
fn test_shrinking_write_does_not_flush() {
    let (temp, mut engine) = setup_temp_engine_with_threshold(10);

    engine.upsert(b"a", b"12345678").unwrap(); // 9 bytes
    engine.remove(b"a").unwrap(); // 1 byte

    assert_eq!(segment_files(temp.path()), 0);
    assert_eq!(engine.memtable_size(), 1);
}

#[test]
fn test_zero_threshold_flushes_every_write() {
    let (temp, mut engine) = setup_temp_engine_with_threshold(0);

    engine.upsert(b"a", b"1").unwrap();
    engine.upsert(b"b", b"2").unwrap();
    engine.remove(b"a").unwrap();

    assert_eq!(segment_files(temp.path()), 3);
    assert_eq!(engine.generations(), vec![0, 1, 2]);
    assert_eq!(scan(&engine, b""), vec![pair("b", "2")]);
}

#[test]
fn test_failed_flush_leaves_memtable_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    // The writer cannot create its temp file over a directory
    fs::create_dir(dir.join("0.tmp")).unwrap();

    let mut engine = Engine::open_path(dir, 1).unwrap();
    let result = engine.upsert(b"a", b"1");

    assert!(matches!(result, Err(StrataError::Io(_))));
    assert_eq!(engine.memtable_entry_count(), 1);
    assert_eq!(engine.next_generation(), 0);
    assert_eq!(engine.segment_count(), 0);
    assert_eq!(engine.get(b"a").unwrap(), Some(Bytes::from_static(b"1")));
    assert!(!dir.join("0.dat").exists());
}

#[test]
fn test_explicit_flush_on_empty_memtable_is_noop() {
    let (temp, mut engine) = setup_temp_engine();

    engine.flush().unwrap();

    assert_eq!(segment_files(temp.path()), 0);
    assert_eq!(engine.next_generation(), 0);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recovery_reproduces_iteration() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let (expected, max_generation) = {
        let mut engine = Engine::open_path(dir, 64).unwrap();
        for i in 0..200 {
            let key = format!("key{:04}", i % 70);
            if i % 7 == 0 {
                engine.remove(key.as_bytes()).unwrap();
            } else {
                engine.upsert(key.as_bytes(), format!("value{}", i).as_bytes()).unwrap();
            }
        }
        let expected = scan(&engine, b"");
        engine.close().unwrap();

        let reopened = Engine::open_path(dir, 64).unwrap();
        let max_generation = *reopened.generations().last().unwrap();
        (expected, max_generation)
    };

    let engine = Engine::open_path(dir, 64).unwrap();

    assert!(engine.segment_count() > 1);
    assert_eq!(scan(&engine, b""), expected);
    assert!(engine.next_generation() > max_generation);
}

#[test]
fn test_recovered_engine_keeps_assigning_new_generations() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    {
        let mut engine = Engine::open_path(dir, 0).unwrap();
        engine.upsert(b"a", b"1").unwrap();
        engine.upsert(b"b", b"2").unwrap();
        engine.close().unwrap();
    }

    let mut engine = Engine::open_path(dir, 0).unwrap();
    assert_eq!(engine.generations(), vec![0, 1]);

    engine.upsert(b"a", b"3").unwrap();
    assert_eq!(engine.generations(), vec![0, 1, 2]);
    assert_eq!(scan(&engine, b""), vec![pair("a", "3"), pair("b", "2")]);
}

#[test]
fn test_open_fails_on_corrupt_segment() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("0.dat"), [0u8, 0, 0, 9]).unwrap();

    let result = Engine::open_path(temp_dir.path(), 1024);

    assert!(matches!(result, Err(StrataError::Corrupt { .. })));
}

#[test]
fn test_scan_stops_at_corrupt_row() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    write_segment(
        &dir.join("0.dat"),
        vec![Cell::new(&b"d"[..], Value::present_at(100, "old"))],
    )
    .unwrap();
    write_segment(
        &dir.join("1.dat"),
        vec![
            Cell::new(&b"a"[..], Value::present_at(200, "1")),
            Cell::new(&b"b"[..], Value::present_at(200, "2")),
            Cell::new(&b"c"[..], Value::present_at(200, "3")),
            Cell::new(&b"d"[..], Value::tombstone_at(200)),
        ],
    )
    .unwrap();

    // Rows 0..3 are 18 bytes each, so the tombstone's key length sits at 54
    let path = dir.join("1.dat");
    let mut bytes = fs::read(&path).unwrap();
    bytes[54..58].copy_from_slice(&500u32.to_be_bytes());
    fs::write(&path, &bytes).unwrap();

    let engine = Engine::open_path(dir, 1024).unwrap();
    let results: Vec<_> = engine.iter(b"").unwrap().collect();

    assert_eq!(results.len(), 2);
    match &results[0] {
        Ok((key, data)) => {
            assert_eq!(key.as_ref(), b"a");
            assert_eq!(data.as_ref(), b"1");
        }
        Err(e) => panic!("expected a live pair, got {}", e),
    }
    assert!(matches!(results[1], Err(StrataError::Corrupt { .. })));
    assert!(!results
        .iter()
        .any(|r| matches!(r, Ok((key, _)) if key.as_ref() == b"d")));
}

// =============================================================================
// Close/Lifecycle Tests
// =============================================================================

#[test]
fn test_engine_close_flushes_data() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    {
        let mut engine = Engine::open_path(dir, 1024).unwrap();
        engine.upsert(b"key", b"value").unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open_path(dir, 1024).unwrap();
    assert_eq!(engine.get(b"key").unwrap(), Some(Bytes::from_static(b"value")));
    assert_eq!(engine.segment_count(), 1);
}

#[test]
fn test_close_with_empty_memtable_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    {
        let mut engine = Engine::open_path(dir, 1024).unwrap();
        engine.upsert(b"key", b"value").unwrap();
        engine.close().unwrap();
    }

    // Closing again through a fresh instance is a no-op
    Engine::open_path(dir, 1024).unwrap().close().unwrap();

    assert_eq!(segment_files(dir), 1);
}

#[test]
fn test_close_flushes_tombstone_only_memtable() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    {
        let mut engine = Engine::open_path(dir, 1024).unwrap();
        engine.upsert(b"key", b"value").unwrap();
        engine.flush().unwrap();
        engine.remove(b"key").unwrap();
        engine.close().unwrap();
    }

    let engine = Engine::open_path(dir, 1024).unwrap();
    assert_eq!(engine.segment_count(), 2);
    assert_eq!(engine.get(b"key").unwrap(), None);
}

#[test]
fn test_drop_without_close_loses_memtable() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    {
        let mut engine = Engine::open_path(dir, 1024).unwrap();
        engine.upsert(b"key", b"value").unwrap();
    }

    let engine = Engine::open_path(dir, 1024).unwrap();
    assert_eq!(engine.get(b"key").unwrap(), None);
}

#[test]
fn test_open_requires_existing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing");

    let result = Engine::open_path(&missing, 1024);
    assert!(matches!(result, Err(StrataError::Config(_))));

    let config = Config::builder()
        .data_dir(&missing)
        .create_if_missing(true)
        .build();
    let _engine = Engine::open(config).unwrap();
    assert!(missing.is_dir());
}

#[test]
fn test_orphaned_temp_file_is_left_alone() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("3.tmp"), b"partial").unwrap();

    let mut engine = Engine::open_path(dir, 0).unwrap();
    engine.upsert(b"a", b"1").unwrap();

    assert!(dir.join("3.tmp").exists());
    assert!(dir.join("0.dat").exists());
    assert!(!dir.join("0.tmp").exists());
}

// =============================================================================
// Accessor Tests
// =============================================================================

#[test]
fn test_engine_accessors() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().to_path_buf();

    let config = Config::builder()
        .data_dir(&data_dir)
        .flush_threshold(1024)
        .build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.data_dir(), data_dir);
    assert_eq!(engine.memtable_size(), 0);
    assert_eq!(engine.memtable_entry_count(), 0);
    assert_eq!(engine.segment_count(), 0);
    assert_eq!(engine.next_generation(), 0);
    assert!(engine.generations().is_empty());
    assert_eq!(engine.config().flush_threshold, 1024);
}
