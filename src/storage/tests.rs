//! Unit tests for the storage module.

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::recording::{ViewportSize, ZoomSegment};

#[test]
fn test_memory_store_round_trip() {
    let store = MemoryStore::new();
    assert!(store.load::<bool>(keys::DEBUG_MODE).unwrap().is_none());

    store.save(keys::DEBUG_MODE, &true).unwrap();
    assert_eq!(store.load::<bool>(keys::DEBUG_MODE).unwrap(), Some(true));

    store.remove(&[keys::DEBUG_MODE]).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_null_entry_is_absent() {
    let store = MemoryStore::new();
    store.set(keys::CURSOR_OFFSET, serde_json::Value::Null).unwrap();
    assert_eq!(store.load::<f64>(keys::CURSOR_OFFSET).unwrap(), None);
}

#[test]
fn test_malformed_entry() {
    let store = MemoryStore::new();
    store.set(keys::ZOOM_SEGMENTS, json!({"not": "a list"})).unwrap();

    assert!(store.load::<Vec<ZoomSegment>>(keys::ZOOM_SEGMENTS).is_err());
    assert!(store
        .load_or_warn::<Vec<ZoomSegment>>(keys::ZOOM_SEGMENTS)
        .is_none());
}

#[test]
fn test_blob_round_trip() {
    let url = encode_blob(&[0x1a, 0x45, 0xdf, 0xa3], "video/webm");
    assert!(url.starts_with("data:video/webm;base64,"));

    let (mime, bytes) = decode_blob(&url).unwrap();
    assert_eq!(mime, "video/webm");
    assert_eq!(bytes, vec![0x1a, 0x45, 0xdf, 0xa3]);
}

#[test]
fn test_decode_blob_rejects_bad_input() {
    assert!(decode_blob("video/webm;base64,AAAA").is_err());
    assert!(decode_blob("data:video/webm,plain").is_err());
    assert!(decode_blob("data:video/webm;base64").is_err());
    assert!(matches!(
        decode_blob("data:video/webm;base64,@@@"),
        Err(ZoomReelError::BlobError(_))
    ));
}

#[test]
fn test_store_and_load_recording() {
    let store = MemoryStore::new();
    let mut metadata = RecordingMetadata::from_wall_clock(1_700_000_000_000, 1_700_000_010_000);
    metadata.viewport = Some(ViewportSize {
        width: 1280.0,
        height: 720.0,
    });
    store_recording(&store, b"webm", "video/webm", &metadata).unwrap();

    let loaded = load_metadata(&store);
    assert_eq!(loaded.duration_secs, Some(10.0));
    assert_eq!(loaded.start_time_ms, Some(1_700_000_000_000));
    assert_eq!(loaded.recorded_at, metadata.recorded_at);
    assert_eq!(loaded.viewport, metadata.viewport);

    assert_eq!(
        store.load::<i64>(keys::TIMESTAMP).unwrap(),
        Some(1_700_000_010_000)
    );
    let (mime, video) = load_video(&store).unwrap().unwrap();
    assert_eq!(mime, "video/webm");
    assert_eq!(video, b"webm");
}

#[test]
fn test_load_metadata_from_recorder_entries() {
    // The recorder writes only the video, an epoch-ms timestamp and a duration
    let store = MemoryStore::new();
    store
        .set(keys::RECORDED_VIDEO, json!(encode_blob(b"webm", "video/webm")))
        .unwrap();
    store.set(keys::TIMESTAMP, json!(1_700_000_010_000i64)).unwrap();
    store.set(keys::RECORDING_DURATION, json!(10)).unwrap();

    let loaded = load_metadata(&store);
    assert_eq!(loaded.duration_secs, Some(10.0));
    assert_eq!(
        loaded.recorded_at.map(|at| at.timestamp_millis()),
        Some(1_700_000_010_000)
    );
    assert!(loaded.describe().starts_with("Recording from "));
}

#[test]
fn test_load_metadata_falls_back_to_stored_duration() {
    let store = MemoryStore::new();
    store.save(keys::RECORDING_DURATION, &4.5).unwrap();
    store.set(keys::RECORDING_START_TIME, json!("garbage")).unwrap();

    let loaded = load_metadata(&store);
    assert_eq!(loaded.duration_secs, Some(4.5));
    assert_eq!(loaded.start_time_ms, None);
    assert!(loaded.viewport.is_none());
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.json");

    {
        let store = FileStore::open(&path).unwrap();
        store.save(keys::CURSOR_OFFSET, &0.25).unwrap();
        store.save(keys::DEBUG_MODE, &true).unwrap();
    }

    let store = FileStore::open(&path).unwrap();
    assert_eq!(store.load::<f64>(keys::CURSOR_OFFSET).unwrap(), Some(0.25));

    store.remove(&[keys::DEBUG_MODE]).unwrap();
    let reopened = FileStore::open(&path).unwrap();
    assert!(reopened.get(keys::DEBUG_MODE).unwrap().is_none());

    // No temp file left behind
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        FileStore::open(&path),
        Err(ZoomReelError::JsonError(_))
    ));
}
