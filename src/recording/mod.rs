//! Recorded data the player works on.
//!
//! - `cursor`: cursor telemetry and interpolation
//! - `segments`: zoom segments and their store
//! - `metadata`: capture timestamps, duration and viewport

pub mod cursor;
pub mod metadata;
pub mod segments;

pub use cursor::{CursorKind, CursorSample, CursorTrack};
pub use metadata::{RecordingMetadata, ViewportSize};
pub use segments::{
    SegmentEdge, SegmentProperty, SegmentStore, ZoomMode, ZoomSegment, DEFAULT_SEGMENT_DURATION,
    MIN_SEGMENT_DURATION,
};
