//! Debug overlay for the preview surface.
//!
//! Draws the recorded cursor path around the playhead, click markers, the
//! interpolated cursor and, while the view is unzoomed, the window the
//! active segment would zoom to. Everything is mapped through whichever
//! transform the frame was drawn with, so markers land on the pixels they
//! describe.

use image::{Rgba, RgbaImage};
use serde::Serialize;
use ts_rs::TS;

use super::camera::CameraPhase;
use super::coord::{zoomed_source_rect, Coord, MediaSpace, Rect, Size, TargetSpace};
use super::frame::DrawCommand;
use super::renderer::{RenderContext, TickOutput};
use crate::recording::{CursorKind, ZoomMode};

/// Seconds of cursor path drawn either side of the playhead.
pub const PATH_WINDOW_SECS: f64 = 1.0;

const PATH_COLOR: Rgba<u8> = Rgba([0, 160, 255, 255]);
const CLICK_COLOR: Rgba<u8> = Rgba([255, 64, 64, 255]);
const WINDOW_COLOR: Rgba<u8> = Rgba([255, 210, 0, 255]);

/// What the overlay showed for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OverlayReport {
    pub time: f64,
    pub phase: CameraPhase,
    pub scale: f64,
    pub camera_x: f64,
    pub camera_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    #[ts(type = "number | null")]
    pub active_segment: Option<u64>,
    /// Interpolated cursor in media pixels.
    pub cursor_x: Option<f64>,
    pub cursor_y: Option<f64>,
    pub samples_drawn: usize,
}

impl OverlayReport {
    pub fn describe(&self) -> String {
        let cursor = match (self.cursor_x, self.cursor_y) {
            (Some(x), Some(y)) => format!("({:.0}, {:.0})", x, y),
            _ => "none".to_string(),
        };
        let segment = self
            .active_segment
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "t={:.2}s {:?} scale={:.2} camera=({:.0}, {:.0}) target=({:.0}, {:.0}) segment={} cursor={}",
            self.time,
            self.phase,
            self.scale,
            self.camera_x,
            self.camera_y,
            self.target_x,
            self.target_y,
            segment,
            cursor
        )
    }
}

/// Draw the debug overlay on top of an already drawn frame.
pub fn draw_debug_overlay(
    target: &mut RgbaImage,
    time: f64,
    ctx: &RenderContext<'_>,
    tick: &TickOutput,
) -> OverlayReport {
    let surface = Size::<TargetSpace>::from_u32(target.width(), target.height());
    let media = ctx.media;
    let project = |p: Coord<MediaSpace>| match &tick.command {
        DrawCommand::FullFrame => p.to_target_space(media, surface),
        DrawCommand::Zoomed { source } => p.to_zoomed_target_space(source, surface),
    };
    let zoom = match tick.command {
        DrawCommand::Zoomed { .. } => tick.camera.scale,
        DrawCommand::FullFrame => 1.0,
    };

    // Path around the playhead
    let mut samples_drawn = 0;
    if let Some(viewport) = ctx.track.viewport() {
        let window = ctx
            .track
            .samples_between(time - PATH_WINDOW_SECS, time + PATH_WINDOW_SECS);
        for sample in window {
            let p = project(sample.position().to_media_space(viewport, media));
            match sample.kind {
                CursorKind::Move => fill_circle(target, p, 2.0, PATH_COLOR, 0.8),
                CursorKind::Click => stroke_circle(target, p, 8.0 * zoom, 2.0, CLICK_COLOR),
            }
            samples_drawn += 1;
        }
    }

    // Zoom window of the segment under the playhead, on the unzoomed view
    let under_playhead = ctx.segments.active_at(time);
    if let (DrawCommand::FullFrame, Some(segment)) = (&tick.command, under_playhead) {
        let center = match segment.mode {
            ZoomMode::Manual => Coord::from_percent(segment.manual_x, segment.manual_y, media),
            ZoomMode::Follow => ctx
                .track
                .interpolate_media(time, media)
                .unwrap_or_else(|| tick.camera.center()),
        };
        let window = zoomed_source_rect(segment.zoom_level, center, media);
        let top_left = project(window.origin);
        let bottom_right = project(window.bottom_right());
        stroke_rect(
            target,
            Rect::from_coords(
                top_left.x,
                top_left.y,
                bottom_right.x - top_left.x,
                bottom_right.y - top_left.y,
            ),
            2.0,
            WINDOW_COLOR,
        );
    }

    let cursor = ctx.track.interpolate_media(time, media);
    if let Some(p) = cursor {
        draw_cursor_circle(target, project(p), zoom);
    }

    OverlayReport {
        time,
        phase: tick.phase,
        scale: tick.camera.scale,
        camera_x: tick.camera.x,
        camera_y: tick.camera.y,
        target_x: tick.camera.target_x,
        target_y: tick.camera.target_y,
        active_segment: under_playhead.map(|s| s.id),
        cursor_x: cursor.map(|p| p.x),
        cursor_y: cursor.map(|p| p.y),
        samples_drawn,
    }
}

/// Blend `color` into one pixel at `alpha`.
fn blend(target: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= target.width() as i64 || y >= target.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let inv_alpha = 1.0 - alpha;
    let pixel = target.get_pixel_mut(x as u32, y as u32);
    for c in 0..4 {
        pixel.0[c] = (color.0[c] as f32 * alpha + pixel.0[c] as f32 * inv_alpha) as u8;
    }
}

/// Pixel bounds of a circle, clipped to the surface.
fn circle_bounds(target: &RgbaImage, center: Coord<TargetSpace>, reach: f64) -> Option<(i64, i64, i64, i64)> {
    if !center.is_finite() {
        return None;
    }
    let min_x = ((center.x - reach).floor() as i64).max(0);
    let max_x = ((center.x + reach).ceil() as i64).min(target.width() as i64 - 1);
    let min_y = ((center.y - reach).floor() as i64).max(0);
    let max_y = ((center.y + reach).ceil() as i64).min(target.height() as i64 - 1);
    (min_x <= max_x && min_y <= max_y).then_some((min_x, max_x, min_y, max_y))
}

fn fill_circle(target: &mut RgbaImage, center: Coord<TargetSpace>, radius: f64, color: Rgba<u8>, alpha: f32) {
    let Some((min_x, max_x, min_y, max_y)) = circle_bounds(target, center, radius) else {
        return;
    };
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = Coord::<TargetSpace>::new(x as f64, y as f64).distance(&center);
            if dist <= radius {
                blend(target, x, y, color, alpha);
            }
        }
    }
}

fn stroke_circle(target: &mut RgbaImage, center: Coord<TargetSpace>, radius: f64, width: f64, color: Rgba<u8>) {
    let Some((min_x, max_x, min_y, max_y)) = circle_bounds(target, center, radius + width) else {
        return;
    };
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = Coord::<TargetSpace>::new(x as f64, y as f64).distance(&center);
            if (dist - radius).abs() <= width / 2.0 {
                blend(target, x, y, color, 1.0);
            }
        }
    }
}

fn stroke_rect(target: &mut RgbaImage, rect: Rect<TargetSpace>, width: f64, color: Rgba<u8>) {
    if !rect.origin.is_finite() || !rect.size.width.is_finite() || !rect.size.height.is_finite() {
        return;
    }
    let left = rect.origin.x.round() as i64;
    let top = rect.origin.y.round() as i64;
    let right = (rect.origin.x + rect.size.width).round() as i64;
    let bottom = (rect.origin.y + rect.size.height).round() as i64;
    let w = width.max(1.0) as i64;

    for x in left..=right {
        for d in 0..w {
            blend(target, x, top + d, color, 1.0);
            blend(target, x, bottom - d, color, 1.0);
        }
    }
    for y in top..=bottom {
        for d in 0..w {
            blend(target, left + d, y, color, 1.0);
            blend(target, right - d, y, color, 1.0);
        }
    }
}

/// Cursor marker: translucent white disc with a dark ring, scaled with zoom.
fn draw_cursor_circle(target: &mut RgbaImage, center: Coord<TargetSpace>, scale: f64) {
    let radius = 12.0 * scale;
    let border_width = 2.0 * scale;
    let inner_radius = radius - border_width;

    let Some((min_x, max_x, min_y, max_y)) = circle_bounds(target, center, radius + border_width) else {
        return;
    };

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = Coord::<TargetSpace>::new(x as f64, y as f64).distance(&center);

            if dist <= inner_radius {
                // Fill, anti-aliased at the edge
                let edge = (inner_radius - dist) as f32;
                let alpha = if edge < 1.0 { edge * 0.5 } else { 0.5 };
                blend(target, x, y, Rgba([255, 255, 255, 255]), alpha);
            } else if dist <= radius {
                let outer_edge = (radius - dist) as f32;
                let inner_edge = (dist - inner_radius) as f32;
                let alpha = if outer_edge < 1.0 {
                    outer_edge * 0.7
                } else if inner_edge < 1.0 {
                    inner_edge * 0.7
                } else {
                    0.7
                };
                blend(target, x, y, Rgba([50, 50, 50, 255]), alpha);
            }
        }
    }
}
