//! ZoomReel: timeline engine for cursor-following zoom effects over browser
//! screen recordings.
//!
//! A recording is a video plus a cursor track sampled from the page. The
//! editor lays zoom segments over the timeline; while a segment is active the
//! camera eases in and either follows the cursor or holds a pinned point.
//! The same render routine drives the real-time preview and a deterministic,
//! frame-exact export.
//!
//! ## Layout
//! - `recording`: cursor track, zoom segments, recording metadata
//! - `rendering`: coordinate spaces, camera, preview and export drivers
//! - `session`: one loaded recording plus the user's edits
//! - `storage`: key-value persistence shared with the capture side
//! - `config`: player and export settings
//! - `timeline`: timeline labels and positions

pub mod config;
pub mod error;
pub mod logging;
pub mod recording;
pub mod rendering;
pub mod session;
pub mod storage;
pub mod timeline;

pub use config::{CameraTuning, ExportSettings, OverlapPolicy, PlayerConfig};
pub use error::{ZoomReelError, ZoomReelResult};
pub use logging::init_logging;
pub use recording::{
    CursorKind, CursorSample, CursorTrack, RecordingMetadata, SegmentEdge, SegmentProperty,
    SegmentStore, ZoomMode, ZoomSegment,
};
pub use rendering::{
    export_video, CameraState, ExportProgress, ExportResult, ExportStage, FfmpegEncoder,
    FrameEncoder, MediaSource, PlaybackState, PreviewPlayer,
};
pub use session::{DragHandle, EditorSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
