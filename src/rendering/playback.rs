//! Real-time preview driver.
//!
//! The host calls [`PreviewPlayer::on_frame`] once per display refresh while
//! playing. Each call reads the media clock, advances the session's camera
//! through the shared render routine and redraws the preview surface. Seeks
//! and pauses redraw once so the surface never shows a stale frame.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::camera::CameraPhase;
use super::media::MediaSource;
use super::overlay::{draw_debug_overlay, OverlayReport};
use super::renderer::{draw, TickOutput};
use crate::session::EditorSession;
use crate::storage::KeyValueStore;

/// Seconds skipped by the arrow-key seek.
pub const SEEK_STEP_SECS: f64 = 5.0;
/// Volume change per key press.
pub const VOLUME_STEP: f64 = 0.1;
pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

/// Transport state of the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Ended,
}

/// Preview playback over a media source.
pub struct PreviewPlayer<M: MediaSource> {
    /// Unique ID for this player, used in logs.
    pub id: String,
    media: M,
    surface: RgbaImage,
    state: PlaybackState,
    speed: f64,
    volume: f64,
    last_phase: CameraPhase,
    last_overlay: Option<OverlayReport>,
}

impl<M: MediaSource> PreviewPlayer<M> {
    /// Player drawing onto a surface the size of the media.
    pub fn new(mut media: M) -> Self {
        let (width, height) = media.dimensions();
        media.set_playback_rate(1.0);
        media.set_volume(1.0);
        let id = Uuid::new_v4().to_string();
        log::debug!("[PREVIEW] Player {} for {}x{} media", id, width, height);

        Self {
            id,
            media,
            surface: RgbaImage::new(width, height),
            state: PlaybackState::Stopped,
            speed: 1.0,
            volume: 1.0,
            last_phase: CameraPhase::Idle,
            last_overlay: None,
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    /// Direct access for hosts that drive the media clock themselves.
    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    /// The preview surface as last drawn.
    pub fn frame(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_time(&self) -> f64 {
        self.media.current_time()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Overlay state from the last redraw, when debug mode was on.
    pub fn last_overlay(&self) -> Option<&OverlayReport> {
        self.last_overlay.as_ref()
    }

    pub fn play(&mut self) {
        if self.state == PlaybackState::Ended || self.media.is_ended() {
            self.media.seek(0.0);
        }
        self.media.play();
        self.state = PlaybackState::Playing;
        log::debug!("[PREVIEW] {} play at {:.2}s", self.id, self.media.current_time());
    }

    pub fn pause(&mut self) {
        self.media.pause();
        self.state = PlaybackState::Paused;
        log::debug!("[PREVIEW] {} pause at {:.2}s", self.id, self.media.current_time());
    }

    pub fn toggle(&mut self) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Restart from the beginning and play.
    pub fn replay<S: KeyValueStore>(&mut self, session: &mut EditorSession<S>) -> TickOutput {
        self.media.seek(0.0);
        session.reset_camera();
        self.media.play();
        self.state = PlaybackState::Playing;
        self.redraw(session)
    }

    /// Jump to `time`, clamped to the recording, and redraw.
    pub fn seek<S: KeyValueStore>(&mut self, time: f64, session: &mut EditorSession<S>) -> TickOutput {
        let end = session.duration().unwrap_or(f64::INFINITY);
        let time = if time.is_finite() { time.clamp(0.0, end) } else { 0.0 };
        self.media.seek(time);
        if self.state == PlaybackState::Ended && time < end {
            self.state = PlaybackState::Paused;
        }
        self.redraw(session)
    }

    /// Seek relative to the playhead.
    pub fn seek_by<S: KeyValueStore>(&mut self, delta: f64, session: &mut EditorSession<S>) -> TickOutput {
        let time = self.media.current_time() + delta;
        self.seek(time, session)
    }

    /// Playback speed, clamped to 0.25x - 4x. Non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            return;
        }
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        self.media.set_playback_rate(self.speed);
    }

    /// Volume, clamped to 0 - 1. Non-finite values are ignored.
    pub fn set_volume(&mut self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.media.set_volume(self.volume);
    }

    pub fn adjust_volume(&mut self, delta: f64) {
        self.set_volume(self.volume + delta);
    }

    /// One display refresh.
    ///
    /// Returns the tick that was drawn, or `None` when not playing. Reaching
    /// the end draws the final frame and moves to [`PlaybackState::Ended`].
    pub fn on_frame<S: KeyValueStore>(&mut self, session: &mut EditorSession<S>) -> Option<TickOutput> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        if self.media.is_ended() {
            self.redraw(session);
            self.state = PlaybackState::Ended;
            log::debug!("[PREVIEW] {} ended at {:.2}s", self.id, self.media.current_time());
            return None;
        }
        if self.media.is_paused() {
            self.state = PlaybackState::Paused;
            return None;
        }
        Some(self.redraw(session))
    }

    /// Tick the camera at the current media time and repaint the surface.
    pub fn redraw<S: KeyValueStore>(&mut self, session: &mut EditorSession<S>) -> TickOutput {
        let time = self.media.current_time();
        let out = session.tick(time);

        if out.phase != self.last_phase {
            log::debug!(
                "[PREVIEW] {:?} -> {:?} at {:.2}s (scale {:.3})",
                self.last_phase,
                out.phase,
                time,
                out.camera.scale
            );
            self.last_phase = out.phase;
        }

        match self.media.current_frame() {
            Some(source) => draw(&out.command, session.media_size(), source, &mut self.surface),
            None => log::trace!("[PREVIEW] No frame at {:.3}s", time),
        }

        self.last_overlay = if session.debug_mode() {
            let report = draw_debug_overlay(&mut self.surface, time, &session.render_context(), &out);
            log::debug!("[PREVIEW] {}", report.describe());
            Some(report)
        } else {
            None
        };

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::media::TestPatternMedia;
    use crate::storage::MemoryStore;

    fn setup(duration: f64) -> (PreviewPlayer<TestPatternMedia>, EditorSession<MemoryStore>) {
        let media = TestPatternMedia::new(64, 36, Some(duration), 30.0);
        let session = EditorSession::load(MemoryStore::new(), 64, 36, Some(duration)).unwrap();
        (PreviewPlayer::new(media), session)
    }

    #[test]
    fn test_transport() {
        let (mut player, mut session) = setup(10.0);
        assert_eq!(player.state(), PlaybackState::Stopped);
        assert!(player.on_frame(&mut session).is_none());

        player.toggle();
        assert_eq!(player.state(), PlaybackState::Playing);
        assert!(player.on_frame(&mut session).is_some());

        player.toggle();
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(player.media().is_paused());
    }

    #[test]
    fn test_seek_clamps_and_redraws() {
        let (mut player, mut session) = setup(10.0);
        player.seek(4.0, &mut session);
        assert_eq!(player.current_time(), 4.0);

        player.seek_by(SEEK_STEP_SECS, &mut session);
        player.seek_by(SEEK_STEP_SECS, &mut session);
        assert_eq!(player.current_time(), 10.0);

        player.seek_by(-30.0, &mut session);
        assert_eq!(player.current_time(), 0.0);

        // Frame 0 pattern: pixel (5, 7) is (5, 7, 0)
        assert_eq!(player.frame().get_pixel(5, 7).0, [5, 7, 0, 255]);
    }

    #[test]
    fn test_speed_and_volume_limits() {
        let (mut player, _) = setup(10.0);
        player.set_speed(10.0);
        assert_eq!(player.speed(), MAX_SPEED);
        assert_eq!(player.media().playback_rate(), MAX_SPEED);
        player.set_speed(0.1);
        assert_eq!(player.speed(), MIN_SPEED);
        player.set_speed(f64::NAN);
        assert_eq!(player.speed(), MIN_SPEED);

        player.adjust_volume(VOLUME_STEP);
        assert_eq!(player.volume(), 1.0);
        for _ in 0..20 {
            player.adjust_volume(-VOLUME_STEP);
        }
        assert_eq!(player.volume(), 0.0);
        assert_eq!(player.media().volume(), 0.0);
    }

    #[test]
    fn test_end_of_media() {
        let (mut player, mut session) = setup(1.0);
        player.play();
        player.media_mut().advance(2.0);
        assert!(player.on_frame(&mut session).is_none());
        assert_eq!(player.state(), PlaybackState::Ended);

        // Play after the end starts over
        player.play();
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_debug_overlay_only_in_debug_mode() {
        let (mut player, mut session) = setup(10.0);
        player.redraw(&mut session);
        assert!(player.last_overlay().is_none());

        session.set_debug_mode(true).unwrap();
        player.redraw(&mut session);
        let report = player.last_overlay().unwrap();
        assert_eq!(report.time, 0.0);
        assert_eq!(report.phase, CameraPhase::Idle);
    }

    #[test]
    fn test_replay_resets_camera() {
        let (mut player, mut session) = setup(10.0);
        session.add_segment_at(0.0).unwrap();
        player.play();
        for i in 1..10 {
            player.media_mut().seek(i as f64 / 30.0);
            player.on_frame(&mut session);
        }
        assert!(session.camera().scale > 1.0);

        let out = player.replay(&mut session);
        assert_eq!(player.current_time(), 0.0);
        // One tick from neutral
        assert!((out.camera.scale - 1.15).abs() < 1e-9);
    }
}
