//! Deterministic video export.
//!
//! The export driver runs the same [`render_tick`] + [`draw`] routine as the
//! preview, but on a synthetic clock: frame `i` is rendered at exactly
//! `i / fps` seconds no matter how long rendering takes, so the output never
//! drops frames and never depends on host speed.
//!
//! 1. Step the synthetic clock and seek the media to it
//! 2. Advance the camera and draw into an off-screen frame
//! 3. Send the frame through a bounded channel to the encode task
//! 4. Flush the encoder and hand its output to the caller

mod encoder;
mod ffmpeg;
mod pipeline;


use std::time::Instant;

use image::RgbaImage;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use ts_rs::TS;

use super::camera::CameraState;
use super::frame::Frame;
use super::media::MediaSource;
use super::renderer::{draw, render_tick, RenderContext, TickOutput};
use crate::config::ExportSettings;
use crate::error::{ZoomReelError, ZoomReelResult};

pub use encoder::{EncoderSettings, FrameEncoder};
pub use ffmpeg::{build_args, find_ffmpeg, FfmpegEncoder};
pub use pipeline::{spawn_encode_task, PIPELINE_BUFFER_SIZE};

/// Progress event for the export UI.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExportProgress {
    /// Current progress (0.0 - 1.0).
    pub progress: f32,
    /// Current stage of export.
    pub stage: ExportStage,
    /// Human-readable status message.
    pub message: String,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ExportStage {
    /// Validating inputs and starting the encoder.
    Preparing,
    /// Rendering and encoding frames.
    Encoding,
    /// Flushing the encoder.
    Finalizing,
    /// Export complete.
    Complete,
    /// Export failed or was cancelled.
    Failed,
}

/// Result of a successful export.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ExportResult {
    /// Encoded media bytes.
    #[serde(skip)]
    #[ts(skip)]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frame_count: u32,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Encoded size in bytes.
    #[ts(type = "number")]
    pub size_bytes: u64,
}

/// Everything an export reads from the editor.
#[derive(Debug, Clone, Copy)]
pub struct ExportJob<'a> {
    pub ctx: RenderContext<'a>,
    /// Recording duration; `None` or non-finite fails the export.
    pub duration: Option<f64>,
    pub settings: ExportSettings,
}

/// Fixed-step clock yielding `(frame_index, seconds)`.
#[derive(Debug, Clone)]
pub struct ExportClock {
    fps: u32,
    total_frames: u32,
    next: u32,
}

impl ExportClock {
    /// Clock covering `duration` seconds: `ceil(duration * fps)` frames, at
    /// least one.
    pub fn new(duration: f64, fps: u32) -> Self {
        let fps = fps.max(1);
        let total_frames = if duration.is_finite() && duration > 0.0 {
            ((duration * fps as f64).ceil() as u32).max(1)
        } else {
            1
        };
        Self {
            fps,
            total_frames,
            next: 0,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Timestamp of frame `index`.
    pub fn time_of(&self, index: u32) -> f64 {
        index as f64 / self.fps as f64
    }
}

impl Iterator for ExportClock {
    type Item = (u32, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total_frames {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some((index, self.time_of(index)))
    }
}

/// One rendered export frame plus the tick that produced it.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub frame: Frame,
    pub tick: TickOutput,
}

/// Export-side driver of the shared render routine.
pub struct ExportRenderLoop<'a> {
    ctx: RenderContext<'a>,
    clock: ExportClock,
    camera: CameraState,
    width: u32,
    height: u32,
}

impl<'a> ExportRenderLoop<'a> {
    /// Editing mode never applies to export.
    pub fn new(ctx: RenderContext<'a>, duration: f64, fps: u32, width: u32, height: u32) -> Self {
        Self {
            ctx: ctx.with_editing(false),
            clock: ExportClock::new(duration, fps),
            camera: CameraState::neutral(ctx.media),
            width,
            height,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.clock.total_frames()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    /// Render the next frame, or `None` once the clock is exhausted.
    pub fn render_next<M: MediaSource>(
        &mut self,
        media: &mut M,
    ) -> Option<ZoomReelResult<RenderedFrame>> {
        let (index, time) = self.clock.next()?;

        media.seek(time);
        let tick = render_tick(time, &self.ctx, &self.camera);
        self.camera = tick.camera;

        let Some(source) = media.current_frame() else {
            return Some(Err(ZoomReelError::FrameUnavailable { time }));
        };
        let mut image = RgbaImage::new(self.width, self.height);
        draw(&tick.command, self.ctx.media, source, &mut image);

        Some(Ok(RenderedFrame {
            frame: Frame::new(index, time, image),
            tick,
        }))
    }
}

fn report<P: FnMut(ExportProgress)>(on_progress: &mut P, progress: f32, stage: ExportStage, message: &str) {
    on_progress(ExportProgress {
        progress,
        stage,
        message: message.to_string(),
    });
}

/// Export the recording with its zoom effects applied.
///
/// Progress is reported through `on_progress`. Cancelling `cancel` stops the
/// export before the next frame; the encoder is dropped and its partial
/// output discarded. Any failure is reported once as [`ExportStage::Failed`]
/// and returned.
pub async fn export_video<M, E, P>(
    job: ExportJob<'_>,
    media: &mut M,
    encoder: E,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> ZoomReelResult<ExportResult>
where
    M: MediaSource,
    E: FrameEncoder + 'static,
    P: FnMut(ExportProgress),
{
    let start_time = Instant::now();
    let result = run_export(job, media, encoder, cancel, &mut on_progress).await;

    match &result {
        Ok(export) => log::info!(
            "[EXPORT] Complete in {:.1}s: {} frames, {} bytes",
            start_time.elapsed().as_secs_f32(),
            export.frame_count,
            export.size_bytes
        ),
        Err(ZoomReelError::ExportCancelled) => {
            log::info!("[EXPORT] Cancelled after {:.1}s", start_time.elapsed().as_secs_f32());
            report(&mut on_progress, 0.0, ExportStage::Failed, "Export cancelled");
        },
        Err(e) => {
            log::error!("[EXPORT] Failed: {}", e);
            report(&mut on_progress, 0.0, ExportStage::Failed, &e.to_string());
        },
    }

    result
}

async fn run_export<M, E, P>(
    job: ExportJob<'_>,
    media: &mut M,
    mut encoder: E,
    cancel: &CancellationToken,
    on_progress: &mut P,
) -> ZoomReelResult<ExportResult>
where
    M: MediaSource,
    E: FrameEncoder + 'static,
    P: FnMut(ExportProgress),
{
    report(on_progress, 0.0, ExportStage::Preparing, "Preparing export...");

    let duration = job
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or(ZoomReelError::DurationUnknown)?;

    let (media_w, media_h) = media.dimensions();
    let (width, height) = job.settings.output_size(media_w, media_h);
    if width == 0 || height == 0 {
        return Err(ZoomReelError::ExportError(
            "Media has no dimensions".to_string(),
        ));
    }

    let fps = job.settings.fps.as_u32();
    let encoder_settings = EncoderSettings {
        width,
        height,
        fps,
        bitrate: job.settings.bitrate.bits_per_second(),
    };
    let mut render_loop = ExportRenderLoop::new(job.ctx, duration, fps, width, height);
    let total_frames = render_loop.total_frames();

    log::info!(
        "[EXPORT] {}x{} (from {}x{}) @ {}fps, {} frames, {:.2}s, {} segments",
        width,
        height,
        media_w,
        media_h,
        fps,
        total_frames,
        duration,
        job.ctx.segments.len()
    );

    if cancel.is_cancelled() {
        return Err(ZoomReelError::ExportCancelled);
    }

    report(on_progress, 0.02, ExportStage::Preparing, "Starting encoder...");
    encoder.start(&encoder_settings).await?;
    let (tx, encode_handle) = spawn_encode_task(encoder);

    media.pause();
    report(on_progress, 0.05, ExportStage::Encoding, "Rendering frames...");

    loop {
        if cancel.is_cancelled() {
            drop(tx);
            encode_handle.abort();
            return Err(ZoomReelError::ExportCancelled);
        }

        let rendered = match render_loop.render_next(media) {
            None => break,
            Some(Ok(rendered)) => rendered,
            Some(Err(e)) => {
                drop(tx);
                encode_handle.abort();
                return Err(e);
            },
        };

        let frame_idx = rendered.frame.frame_number;
        if frame_idx < 3 {
            log::debug!(
                "[EXPORT] Frame {} at {:.3}s: {:?}, scale {:.3}",
                frame_idx,
                rendered.frame.timestamp,
                rendered.tick.phase,
                rendered.tick.camera.scale
            );
        }

        if tx.send(rendered.frame).await.is_err() {
            // Encode task exited early; its result carries the error
            break;
        }

        // Progress update (every 10 frames)
        if frame_idx % 10 == 0 {
            let progress = (frame_idx + 1) as f32 / total_frames as f32;
            report(
                on_progress,
                0.05 + progress * 0.9,
                ExportStage::Encoding,
                &format!("Rendering: {:.0}%", progress * 100.0),
            );
        }
    }

    drop(tx);
    report(on_progress, 0.95, ExportStage::Finalizing, "Finalizing...");

    let data = encode_handle
        .await
        .map_err(|e| ZoomReelError::ExportError(format!("Encode task failed: {}", e)))??;

    report(on_progress, 1.0, ExportStage::Complete, "Export complete!");

    Ok(ExportResult {
        size_bytes: data.len() as u64,
        data,
        width,
        height,
        fps,
        frame_count: total_frames,
        duration_secs: duration,
    })
}
