//! Persistent key-value storage for recordings and editor state.
//!
//! ## Architecture
//!
//! ```text
//! mod.rs (trait, keys, typed helpers, blob encoding)
//!   |
//!   +-- memory.rs (in-process store)
//!   +-- file.rs (single JSON document on disk)
//!   +-- tests.rs (unit tests)
//! ```
//!
//! Entries are independent named JSON values. The session reads them once at
//! load and writes segments and preferences back after every mutation; each
//! write replaces a whole entry, so a reader never sees a half-updated list.

pub mod file;
pub mod memory;
#[cfg(test)]
mod tests;

pub use file::FileStore;
pub use memory::MemoryStore;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ZoomReelError, ZoomReelResult};
use crate::recording::RecordingMetadata;

/// Entry names shared with the capture side.
pub mod keys {
    pub const RECORDED_VIDEO: &str = "recordedVideo";
    pub const TIMESTAMP: &str = "timestamp";
    pub const RECORDING_START_TIME: &str = "recordingStartTime";
    pub const RECORDING_END_TIME: &str = "recordingEndTime";
    pub const RECORDING_DURATION: &str = "recordingDuration";
    pub const CURSOR_DATA: &str = "cursorData";
    pub const VIEWPORT_SIZE: &str = "viewportSize";
    pub const ZOOM_SEGMENTS: &str = "zoomSegments";
    pub const DEBUG_MODE: &str = "debugMode";
    pub const CURSOR_OFFSET: &str = "cursorOffset";
    pub const PLAYER_CONFIG: &str = "playerConfig";

    /// Everything that belongs to one recording.
    pub const RECORDING: &[&str] = &[
        RECORDED_VIDEO,
        TIMESTAMP,
        RECORDING_START_TIME,
        RECORDING_END_TIME,
        RECORDING_DURATION,
        CURSOR_DATA,
        VIEWPORT_SIZE,
        ZOOM_SEGMENTS,
    ];
}

/// A store of independently readable and writable JSON entries.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> ZoomReelResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> ZoomReelResult<()>;

    fn remove(&self, keys: &[&str]) -> ZoomReelResult<()>;

    /// Read and deserialize an entry. Absent entries are `Ok(None)`.
    fn load<T: DeserializeOwned>(&self, key: &str) -> ZoomReelResult<Option<T>>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Serialize and write an entry.
    fn save<T: Serialize>(&self, key: &str, value: &T) -> ZoomReelResult<()>
    where
        Self: Sized,
    {
        self.set(key, serde_json::to_value(value)?)
    }

    /// Like [`KeyValueStore::load`], but a malformed entry is logged and
    /// treated as absent.
    fn load_or_warn<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        match self.load(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[STORE] Ignoring unreadable '{}': {}", key, e);
                None
            },
        }
    }
}

/// Encode bytes as a `data:` URL.
pub fn encode_blob(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URL into its MIME type and bytes.
pub fn decode_blob(data_url: &str) -> ZoomReelResult<(String, Vec<u8>)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| ZoomReelError::BlobError("not a data URL".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ZoomReelError::BlobError("missing data URL payload".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| ZoomReelError::BlobError("data URL is not base64".to_string()))?;

    Ok((mime.to_string(), STANDARD.decode(payload)?))
}

/// Write a finished capture the way the recorder does: the video blob plus
/// its wall-clock timestamps.
pub fn store_recording<S: KeyValueStore>(
    store: &S,
    video: &[u8],
    mime: &str,
    metadata: &RecordingMetadata,
) -> ZoomReelResult<()> {
    store.set(keys::RECORDED_VIDEO, Value::String(encode_blob(video, mime)))?;
    if let Some(at) = metadata.recorded_at {
        store.save(keys::TIMESTAMP, &at.timestamp_millis())?;
    }
    if let Some(start) = metadata.start_time_ms {
        store.save(keys::RECORDING_START_TIME, &start)?;
    }
    if let Some(end) = metadata.end_time_ms {
        store.save(keys::RECORDING_END_TIME, &end)?;
    }
    if let Some(duration) = metadata.duration_secs {
        store.save(keys::RECORDING_DURATION, &duration)?;
    }
    if let Some(viewport) = metadata.viewport {
        store.save(keys::VIEWPORT_SIZE, &viewport)?;
    }

    log::info!("[STORE] Saved recording ({} bytes)", video.len());
    Ok(())
}

/// Read the recording metadata entries. Missing or malformed entries stay unset.
pub fn load_metadata<S: KeyValueStore>(store: &S) -> RecordingMetadata {
    let start_time_ms: Option<i64> = store.load_or_warn(keys::RECORDING_START_TIME);
    let end_time_ms: Option<i64> = store.load_or_warn(keys::RECORDING_END_TIME);
    let stored_duration: Option<f64> = store.load_or_warn(keys::RECORDING_DURATION);

    let mut metadata = match (start_time_ms, end_time_ms) {
        (Some(start), Some(end)) => RecordingMetadata::from_wall_clock(start, end),
        _ => RecordingMetadata {
            start_time_ms,
            end_time_ms,
            ..Default::default()
        },
    };
    if metadata.duration_secs.is_none() {
        metadata.duration_secs = stored_duration;
    }

    // Epoch milliseconds, as the recorder writes it
    let timestamp: Option<i64> = store.load_or_warn(keys::TIMESTAMP);
    if let Some(at) = timestamp.and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        metadata.recorded_at = Some(at);
    }
    metadata.viewport = store.load_or_warn(keys::VIEWPORT_SIZE);
    metadata
}

/// Read the recorded video blob as its MIME type and bytes.
pub fn load_video<S: KeyValueStore>(store: &S) -> ZoomReelResult<Option<(String, Vec<u8>)>> {
    match store.load::<String>(keys::RECORDED_VIDEO)? {
        Some(url) => decode_blob(&url).map(Some),
        None => Ok(None),
    }
}
