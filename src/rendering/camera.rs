//! Virtual camera and its per-tick update rule.
//!
//! The camera has a scale and a centre in media pixels. Each tick it eases
//! toward the active segment's zoom level and, while a segment is active,
//! pans toward either the interpolated cursor (follow mode, with a deadband)
//! or a fixed manual point. With no active segment it eases back to 1x and
//! holds its pan.
//!
//! ```text
//!          segment active             scale reached
//!   Idle ─────────────────► ZoomingIn ─────────────► Tracking
//!    ▲                          │                       │
//!    │ scale == 1               │ segment gone          │ segment gone
//!    └───────────────────── ZoomingOut ◄────────────────┘
//! ```
//!
//! The phase is derived from the state, never stored, so the transitions are
//! driven only by what is active at the queried time.

use serde::Serialize;
use ts_rs::TS;

use super::coord::{zoomed_source_rect, Coord, MediaSpace, Rect, Size};
use crate::config::CameraTuning;
use crate::recording::{ZoomMode, ZoomSegment};

/// Phase of the zoom animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CameraPhase {
    /// Unzoomed, nothing active.
    Idle,
    /// A segment is active and the scale is still moving toward it.
    ZoomingIn,
    /// A segment is active and the scale has arrived.
    Tracking,
    /// Nothing active, scale returning to 1.
    ZoomingOut,
}

/// Transient camera state, recomputed every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CameraState {
    /// Zoom scale, always >= 1.
    pub scale: f64,
    /// Camera centre X in media pixels.
    pub x: f64,
    /// Camera centre Y in media pixels.
    pub y: f64,
    /// Pan target X in media pixels.
    pub target_x: f64,
    /// Pan target Y in media pixels.
    pub target_y: f64,
}

impl CameraState {
    /// Unzoomed and centred on the media.
    pub fn neutral(media: Size<MediaSpace>) -> Self {
        let center = media.center();
        Self {
            scale: 1.0,
            x: center.x,
            y: center.y,
            target_x: center.x,
            target_y: center.y,
        }
    }

    pub fn reset(&mut self, media: Size<MediaSpace>) {
        *self = Self::neutral(media);
    }

    pub fn center(&self) -> Coord<MediaSpace> {
        Coord::new(self.x, self.y)
    }

    pub fn target(&self) -> Coord<MediaSpace> {
        Coord::new(self.target_x, self.target_y)
    }

    /// Media rectangle shown at the current scale and centre.
    pub fn source_rect(&self, media: Size<MediaSpace>) -> Rect<MediaSpace> {
        zoomed_source_rect(self.scale, self.center(), media)
    }

    /// Close enough to 1x that a full-frame draw is equivalent.
    pub fn is_full_frame(&self, tuning: &CameraTuning) -> bool {
        self.scale < 1.0 + tuning.full_frame_epsilon
    }

    /// Current animation phase given the active segment.
    pub fn phase(&self, active: Option<&ZoomSegment>, tuning: &CameraTuning) -> CameraPhase {
        match active {
            Some(segment) => {
                if (segment.zoom_level - self.scale).abs() < tuning.snap_epsilon {
                    CameraPhase::Tracking
                } else {
                    CameraPhase::ZoomingIn
                }
            },
            None => {
                if (self.scale - 1.0).abs() < tuning.snap_epsilon {
                    CameraPhase::Idle
                } else {
                    CameraPhase::ZoomingOut
                }
            },
        }
    }

    /// Advance one tick.
    ///
    /// `cursor` is the interpolated cursor in media pixels; it is only read in
    /// follow mode, and `None` holds the current pan.
    pub fn step(
        &mut self,
        active: Option<&ZoomSegment>,
        cursor: Option<Coord<MediaSpace>>,
        media: Size<MediaSpace>,
        tuning: &CameraTuning,
    ) {
        let target_scale = active.map_or(1.0, |segment| segment.zoom_level.max(1.0));
        self.scale += (target_scale - self.scale) * tuning.zoom_speed;
        if (self.scale - target_scale).abs() < tuning.snap_epsilon {
            self.scale = target_scale;
        }

        let Some(segment) = active else {
            return;
        };

        match segment.mode {
            ZoomMode::Manual => {
                let target = Coord::<MediaSpace>::from_percent(segment.manual_x, segment.manual_y, media);
                self.target_x = target.x;
                self.target_y = target.y;
                self.x += (self.target_x - self.x) * tuning.manual_smooth;
                self.y += (self.target_y - self.y) * tuning.manual_smooth;
            },
            ZoomMode::Follow => {
                let Some(cursor) = cursor.filter(Coord::is_finite) else {
                    return;
                };
                self.target_x = cursor.x;
                self.target_y = cursor.y;

                let dx = self.target_x - self.x;
                let dy = self.target_y - self.y;
                if dx.abs() > tuning.follow_deadband_px || dy.abs() > tuning.follow_deadband_px {
                    self.x += dx * tuning.follow_smooth;
                    self.y += dy * tuning.follow_smooth;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media() -> Size<MediaSpace> {
        Size::new(1000.0, 600.0)
    }

    fn segment(zoom_level: f64, mode: ZoomMode) -> ZoomSegment {
        ZoomSegment {
            zoom_level,
            mode,
            ..ZoomSegment::new(1, 0.0, 10.0)
        }
    }

    #[test]
    fn test_scale_converges_exactly() {
        let tuning = CameraTuning::default();
        let active = segment(3.0, ZoomMode::Follow);
        let mut camera = CameraState::neutral(media());

        let mut ticks = 0;
        while camera.scale != 3.0 {
            camera.step(Some(&active), None, media(), &tuning);
            ticks += 1;
            assert!(ticks <= 60, "scale {} after {} ticks", camera.scale, ticks);
        }

        // Idempotent once converged
        for _ in 0..10 {
            camera.step(Some(&active), None, media(), &tuning);
            assert_eq!(camera.scale, 3.0);
        }
    }

    #[test]
    fn test_zoom_out_returns_to_one() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState {
            scale: 2.0,
            ..CameraState::neutral(media())
        };
        for _ in 0..60 {
            camera.step(None, None, media(), &tuning);
        }
        assert_eq!(camera.scale, 1.0);
    }

    #[test]
    fn test_follow_deadband() {
        let tuning = CameraTuning::default();
        let active = segment(2.0, ZoomMode::Follow);
        let mut camera = CameraState::neutral(media());

        // Within 50px on both axes: no pan, but target updates
        camera.step(Some(&active), Some(Coord::new(540.0, 330.0)), media(), &tuning);
        assert_eq!((camera.x, camera.y), (500.0, 300.0));
        assert_eq!((camera.target_x, camera.target_y), (540.0, 330.0));

        // Beyond the deadband on one axis: both axes move 10%
        camera.step(Some(&active), Some(Coord::new(700.0, 320.0)), media(), &tuning);
        assert!((camera.x - 520.0).abs() < 1e-9, "x was {}", camera.x);
        assert!((camera.y - 302.0).abs() < 1e-9, "y was {}", camera.y);
    }

    #[test]
    fn test_follow_without_cursor_holds_position() {
        let tuning = CameraTuning::default();
        let active = segment(2.0, ZoomMode::Follow);
        let mut camera = CameraState {
            x: 200.0,
            y: 100.0,
            ..CameraState::neutral(media())
        };
        camera.step(Some(&active), None, media(), &tuning);
        assert_eq!((camera.x, camera.y), (200.0, 100.0));
        assert!(camera.scale > 1.0);

        camera.step(Some(&active), Some(Coord::new(f64::NAN, 0.0)), media(), &tuning);
        assert_eq!((camera.x, camera.y), (200.0, 100.0));
    }

    #[test]
    fn test_manual_mode_eases_without_deadband() {
        let tuning = CameraTuning::default();
        let active = ZoomSegment {
            manual_x: 52.0,
            manual_y: 50.0,
            ..segment(2.0, ZoomMode::Manual)
        };
        let mut camera = CameraState::neutral(media());
        camera.step(Some(&active), None, media(), &tuning);

        // 20px away, still moves 15%
        assert_eq!(camera.target_x, 520.0);
        assert!((camera.x - 503.0).abs() < 1e-9, "x was {}", camera.x);
    }

    #[test]
    fn test_no_segment_holds_pan() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState {
            scale: 2.0,
            x: 100.0,
            y: 80.0,
            ..CameraState::neutral(media())
        };
        camera.step(None, Some(Coord::new(900.0, 500.0)), media(), &tuning);
        assert_eq!((camera.x, camera.y), (100.0, 80.0));
    }

    #[test]
    fn test_phases() {
        let tuning = CameraTuning::default();
        let active = segment(2.0, ZoomMode::Follow);
        let mut camera = CameraState::neutral(media());

        assert_eq!(camera.phase(None, &tuning), CameraPhase::Idle);
        assert_eq!(camera.phase(Some(&active), &tuning), CameraPhase::ZoomingIn);

        camera.scale = 2.0;
        assert_eq!(camera.phase(Some(&active), &tuning), CameraPhase::Tracking);
        assert_eq!(camera.phase(None, &tuning), CameraPhase::ZoomingOut);
    }

    #[test]
    fn test_full_frame_threshold() {
        let tuning = CameraTuning::default();
        let mut camera = CameraState::neutral(media());
        assert!(camera.is_full_frame(&tuning));
        camera.scale = 1.009;
        assert!(camera.is_full_frame(&tuning));
        camera.scale = 1.02;
        assert!(!camera.is_full_frame(&tuning));
    }
}
