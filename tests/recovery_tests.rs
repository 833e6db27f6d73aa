// Recovery tests: restart, crash, and torn-write behavior

use duolog::{hash_key, Engine, Error, Location, Options};
use std::fs::OpenOptions;
use std::io::Write;
use tempfile::TempDir;

const RECORD_SIZE: u64 = 48;

/// Simulates a crash by leaking the engine so no clean shutdown runs.
fn simulate_crash(engine: Engine) {
    std::mem::forget(engine);
}

fn append_to(path: &std::path::Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

#[test]
fn test_recovery_after_clean_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        for i in 0..50 {
            let key = format!("key_{}", i);
            let value = format!("value_{}", i);
            engine.set(key.as_bytes(), value.as_bytes()).unwrap();
        }
        engine.shutdown();
    }

    let engine = Engine::open(&path, Options::default()).unwrap();
    assert_eq!(engine.index_len(), 50);
    for i in 0..50 {
        let key = format!("key_{}", i);
        let expected = format!("value_{}", i);
        assert_eq!(
            engine.get(key.as_bytes()).unwrap(),
            Some(expected.as_bytes().to_vec()),
            "key {} should be recovered",
            key
        );
    }
}

#[test]
fn test_recovery_after_crash() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        for i in 0..20 {
            let key = format!("key_{}", i);
            engine.set(key.as_bytes(), b"survives").unwrap();
        }
        simulate_crash(engine);
    }

    // Every acknowledged write was appended before its set() returned.
    let engine = Engine::open(&path, Options::default()).unwrap();
    for i in 0..20 {
        let key = format!("key_{}", i);
        assert_eq!(engine.get(key.as_bytes()).unwrap(), Some(b"survives".to_vec()));
    }
}

#[test]
fn test_recovery_last_write_wins_across_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        engine.set(b"key", b"old").unwrap();
        engine.set(b"key", b"new").unwrap();
        engine.shutdown();
    }

    let engine = Engine::open(&path, Options::default()).unwrap();
    assert_eq!(engine.get(b"key").unwrap(), Some(b"new".to_vec()));
    assert_eq!(engine.index_len(), 1);
}

#[test]
fn test_torn_tail_is_dropped_silently() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        engine.set(b"intact", b"value").unwrap();
        engine.shutdown();
    }

    // Interrupted append: a partial record at the end of the index log.
    append_to(&path.join("index.map"), &[0xAB; 30]);

    let engine = Engine::open(&path, Options::default()).unwrap();
    assert_eq!(engine.index_len(), 1);
    assert_eq!(engine.get(b"intact").unwrap(), Some(b"value".to_vec()));
    // The torn fragment is not counted as consumed log.
    assert_eq!(engine.map_file_len(), RECORD_SIZE);
}

#[test]
fn test_torn_tail_recovers_same_as_truncated_log() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    for dir in [&dir_a, &dir_b] {
        let engine = Engine::open(dir.path(), Options::default()).unwrap();
        for i in 0..10 {
            engine
                .set(format!("key{}", i).as_bytes(), format!("v{}", i).as_bytes())
                .unwrap();
        }
        engine.shutdown();
    }

    // Only one copy gets the torn tail.
    append_to(&dir_b.path().join("index.map"), &[0x77; 47]);

    let clean = Engine::open(dir_a.path(), Options::default()).unwrap();
    let torn = Engine::open(dir_b.path(), Options::default()).unwrap();

    assert_eq!(clean.index_len(), torn.index_len());
    assert_eq!(clean.map_file_len(), torn.map_file_len());
    for i in 0..10 {
        let key = format!("key{}", i);
        assert_eq!(
            clean.get(key.as_bytes()).unwrap(),
            torn.get(key.as_bytes()).unwrap()
        );
    }
}

#[test]
fn test_recorded_length_past_data_eof_is_read_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    // Hand-craft an index record claiming 512 bytes that the data log
    // doesn't have.
    let hash = hash_key(b"phantom");
    let mut record = Vec::with_capacity(RECORD_SIZE as usize);
    record.extend_from_slice(&hash);
    record.extend_from_slice(&0u64.to_be_bytes());
    record.extend_from_slice(&512u64.to_be_bytes());

    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(path.join("index.map"), &record).unwrap();
    std::fs::write(path.join("data.log"), b"only nine").unwrap();

    let engine = Engine::open(&path, Options::default()).unwrap();
    assert_eq!(engine.index_len(), 1);

    // Never a truncated success.
    match engine.get(b"phantom") {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
        other => panic!("expected read error, got {:?}", other),
    }
}

#[test]
fn test_known_index_record_decodes_as_documented() {
    // The documented wire layout: 32-byte hash, then offset 123, length 9,
    // both big-endian.
    let hash: [u8; 32] = [
        0x07, 0x7F, 0x33, 0x77, 0xC2, 0xE9, 0xAE, 0xD3, 0x2C, 0xBA, 0xE1, 0xA9, 0xCC, 0x2C, 0x65,
        0xDA, 0x3E, 0x3D, 0xD4, 0x58, 0xCF, 0x14, 0x04, 0xE1, 0xFB, 0xC6, 0xCD, 0x29, 0x75, 0x95,
        0x37, 0xE6,
    ];
    let mut record = Vec::new();
    record.extend_from_slice(&hash);
    record.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0x7B]);
    record.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0x09]);

    let dir = TempDir::new().unwrap();
    let map_path = dir.path().join("index.map");
    std::fs::write(&map_path, &record).unwrap();

    let file = OpenOptions::new().read(true).append(true).open(&map_path).unwrap();
    let (index, consumed) = duolog::index::recovery::recover(&file).unwrap();

    assert_eq!(consumed, RECORD_SIZE);
    assert_eq!(
        index.get(&hash),
        Some(Location {
            offset: 123,
            length: 9
        })
    );
}

#[test]
fn test_reopen_appends_continue_after_existing_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_path_buf();

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        engine.set(b"first", b"aaaa").unwrap();
        engine.shutdown();
    }

    {
        let engine = Engine::open(&path, Options::default()).unwrap();
        assert_eq!(engine.data_file_len(), 4);
        engine.set(b"second", b"bbbb").unwrap();
        assert_eq!(engine.data_file_len(), 8);
        assert_eq!(engine.map_file_len(), 2 * RECORD_SIZE);

        // Both generations readable.
        assert_eq!(engine.get(b"first").unwrap(), Some(b"aaaa".to_vec()));
        assert_eq!(engine.get(b"second").unwrap(), Some(b"bbbb".to_vec()));
        engine.shutdown();
    }
}
