//! Media source abstraction.
//!
//! The host owns the actual video element or decoder; the engine only needs
//! its clock, its size, transport controls and the frame at the current
//! position.

use image::{Rgba, RgbaImage};

/// A seekable video the render loop can sample.
pub trait MediaSource {
    /// Native pixel dimensions.
    fn dimensions(&self) -> (u32, u32);

    /// Self-reported duration in seconds. Streamed WebM often reports
    /// `None` or infinity until metadata settles.
    fn duration(&self) -> Option<f64>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    fn is_paused(&self) -> bool;

    fn is_ended(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    /// Jump to `time` seconds. Implementations clamp to their own range.
    fn seek(&mut self, time: f64);

    fn set_playback_rate(&mut self, rate: f64);

    fn set_volume(&mut self, volume: f64);

    /// The decoded frame at the current position, if one is available.
    fn current_frame(&self) -> Option<&RgbaImage>;
}

/// Synthetic media whose frames are a deterministic pattern.
///
/// Pixel `(x, y)` at time `t` is `(x % 256, y % 256, frame_index % 256, 255)`,
/// so tests can tell exactly which source pixel ended up where. The clock
/// only moves through [`TestPatternMedia::advance`] or `seek`.
#[derive(Debug, Clone)]
pub struct TestPatternMedia {
    width: u32,
    height: u32,
    duration: Option<f64>,
    fps: f64,
    time: f64,
    paused: bool,
    rate: f64,
    volume: f64,
    frame: RgbaImage,
    frame_index: Option<u64>,
}

impl TestPatternMedia {
    pub fn new(width: u32, height: u32, duration: Option<f64>, fps: f64) -> Self {
        let mut media = Self {
            width,
            height,
            duration,
            fps: if fps.is_finite() && fps > 0.0 { fps } else { 30.0 },
            time: 0.0,
            paused: true,
            rate: 1.0,
            volume: 1.0,
            frame: RgbaImage::new(width, height),
            frame_index: None,
        };
        media.refresh_frame();
        media
    }

    /// Move the clock forward by `wall_seconds` of real time, honouring the
    /// playback rate. Does nothing while paused.
    pub fn advance(&mut self, wall_seconds: f64) {
        if self.paused || !wall_seconds.is_finite() {
            return;
        }
        self.time += wall_seconds * self.rate;
        if let Some(end) = self.finite_duration() {
            if self.time >= end {
                self.time = end;
                self.paused = true;
            }
        }
        self.refresh_frame();
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    fn finite_duration(&self) -> Option<f64> {
        self.duration.filter(|d| d.is_finite() && *d >= 0.0)
    }

    fn refresh_frame(&mut self) {
        let index = (self.time * self.fps).floor().max(0.0) as u64;
        if self.frame_index == Some(index) {
            return;
        }
        let band = (index % 256) as u8;
        self.frame = RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, band, 255])
        });
        self.frame_index = Some(index);
    }
}

impl MediaSource for TestPatternMedia {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_ended(&self) -> bool {
        self.finite_duration().is_some_and(|end| self.time >= end)
    }

    fn play(&mut self) {
        if self.is_ended() {
            self.time = 0.0;
            self.refresh_frame();
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn seek(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        let upper = self.finite_duration().unwrap_or(f64::INFINITY);
        self.time = time.clamp(0.0, upper);
        self.refresh_frame();
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn current_frame(&self) -> Option<&RgbaImage> {
        (self.width > 0 && self.height > 0).then_some(&self.frame)
    }
}
