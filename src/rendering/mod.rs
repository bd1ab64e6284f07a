//! Zoom rendering for preview and export.
//!
//! Both drivers run the same routine: [`render_tick`] advances the camera
//! and picks a draw command, [`draw`] blits the media frame. Only the clock
//! differs.
//!
//! ## Components
//! - `coord`: typed coordinate spaces and the transforms between them
//! - `camera`: the eased zoom/pan state machine
//! - `frame`: RGBA frames, draw commands and blits
//! - `renderer`: the shared tick + draw routine
//! - `media`: the media source seam and a synthetic test source
//! - `playback`: real-time preview driver
//! - `overlay`: debug overlay
//! - `exporter`: deterministic export driver and encoders

pub mod camera;
pub mod coord;
pub mod exporter;
pub mod frame;
pub mod media;
pub mod overlay;
pub mod playback;
pub mod renderer;

pub use camera::{CameraPhase, CameraState};
pub use coord::{zoomed_source_rect, Coord, MediaSpace, Rect, Size, TargetSpace, ViewportSpace};
pub use exporter::{
    export_video, ExportJob, ExportProgress, ExportRenderLoop, ExportResult, ExportStage,
    FfmpegEncoder, FrameEncoder,
};
pub use frame::{DrawCommand, Frame};
pub use media::{MediaSource, TestPatternMedia};
pub use overlay::{draw_debug_overlay, OverlayReport};
pub use playback::{PlaybackState, PreviewPlayer};
pub use renderer::{draw, render_tick, RenderContext, TickOutput};
