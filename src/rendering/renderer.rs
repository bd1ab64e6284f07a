//! The shared render routine.
//!
//! Preview and export both call [`render_tick`] to advance the camera and
//! decide what to draw, then [`draw`] to blit the media frame. Neither driver
//! has its own zoom math, so the two outputs cannot drift apart.

use image::RgbaImage;

use super::camera::{CameraPhase, CameraState};
use super::coord::{MediaSpace, Rect, Size};
use super::frame::{full_frame_blit, stretch_blit, DrawCommand};
use crate::config::CameraTuning;
use crate::recording::{CursorTrack, SegmentStore, ZoomMode};

/// Everything a tick reads besides the time and the previous camera.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub segments: &'a SegmentStore,
    pub track: &'a CursorTrack,
    pub media: Size<MediaSpace>,
    pub tuning: &'a CameraTuning,
    /// A segment is selected for editing; force an unzoomed, centred view.
    pub editing: bool,
}

impl<'a> RenderContext<'a> {
    pub fn with_editing(mut self, editing: bool) -> Self {
        self.editing = editing;
        self
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Camera after this tick; feed it into the next one.
    pub camera: CameraState,
    pub command: DrawCommand,
    pub phase: CameraPhase,
    pub active_segment: Option<u64>,
}

/// Advance the camera to `time` and decide what to draw.
///
/// Pure: the same inputs always give the same output, whichever clock
/// produced `time`.
pub fn render_tick(time: f64, ctx: &RenderContext<'_>, camera: &CameraState) -> TickOutput {
    if ctx.editing {
        return TickOutput {
            camera: CameraState::neutral(ctx.media),
            command: DrawCommand::FullFrame,
            phase: CameraPhase::Idle,
            active_segment: None,
        };
    }

    let active = ctx.segments.active_at(time);
    let cursor = match active {
        Some(segment) if segment.mode == ZoomMode::Follow => {
            ctx.track.interpolate_media(time, ctx.media)
        },
        _ => None,
    };

    let mut next = *camera;
    next.step(active, cursor, ctx.media, ctx.tuning);

    let command = if next.is_full_frame(ctx.tuning) {
        DrawCommand::FullFrame
    } else {
        DrawCommand::Zoomed {
            source: next.source_rect(ctx.media),
        }
    };

    TickOutput {
        camera: next,
        command,
        phase: next.phase(active, ctx.tuning),
        active_segment: active.map(|s| s.id),
    }
}

/// Execute a draw command from `source` into `target`.
///
/// `media` is the size the command's rectangle is expressed in; if the
/// decoded frame has a different size the rectangle is rescaled to it.
pub fn draw(command: &DrawCommand, media: Size<MediaSpace>, source: &RgbaImage, target: &mut RgbaImage) {
    match command {
        DrawCommand::FullFrame => full_frame_blit(source, target),
        DrawCommand::Zoomed { source: rect } => {
            let sx = if media.width > 0.0 {
                source.width() as f64 / media.width
            } else {
                1.0
            };
            let sy = if media.height > 0.0 {
                source.height() as f64 / media.height
            } else {
                1.0
            };
            let region = Rect::from_coords(
                rect.origin.x * sx,
                rect.origin.y * sy,
                rect.size.width * sx,
                rect.size.height * sy,
            );
            stretch_blit(source, region, target);
        },
    }
}
