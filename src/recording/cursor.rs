//! Recorded cursor telemetry and time-based lookup.
//!
//! Samples arrive from the page tracker in viewport pixels, possibly in
//! several batches (one per tracked navigation) that interleave in time. The
//! track keeps them sorted and answers "where was the cursor at time t" with
//! linear interpolation between the two bracketing samples.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rendering::coord::{Coord, MediaSpace, Size, ViewportSpace};

/// Kind of cursor sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum CursorKind {
    #[default]
    Move,
    Click,
}

/// A single cursor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CursorSample {
    /// Seconds since recording start.
    pub time: f64,
    /// Viewport X position in pixels.
    pub x: f64,
    /// Viewport Y position in pixels.
    pub y: f64,
    #[serde(default, alias = "type")]
    pub kind: CursorKind,
}

impl CursorSample {
    pub fn new(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            kind: CursorKind::Move,
        }
    }

    pub fn click(time: f64, x: f64, y: f64) -> Self {
        Self {
            time,
            x,
            y,
            kind: CursorKind::Click,
        }
    }

    pub fn position(&self) -> Coord<ViewportSpace> {
        Coord::new(self.x, self.y)
    }

    fn is_finite(&self) -> bool {
        self.time.is_finite() && self.x.is_finite() && self.y.is_finite()
    }
}

/// Sorted cursor samples plus the viewport they were taken in.
#[derive(Debug, Clone, Default)]
pub struct CursorTrack {
    samples: Vec<CursorSample>,
    viewport: Option<Size<ViewportSpace>>,
    /// Calibration added to every query time.
    offset: f64,
}

impl CursorTrack {
    /// Build a track from an unordered batch.
    pub fn new(samples: Vec<CursorSample>, viewport: Option<Size<ViewportSpace>>) -> Self {
        let mut track = Self {
            samples: Vec::with_capacity(samples.len()),
            viewport: None,
            offset: 0.0,
        };
        track.set_viewport(viewport);
        track.merge(samples);
        track
    }

    /// Merge a late-arriving batch and restore time order.
    ///
    /// Non-finite samples are dropped. The sort is stable, so samples sharing
    /// a timestamp keep their arrival order.
    pub fn merge(&mut self, batch: Vec<CursorSample>) {
        let incoming = batch.len();
        let before = self.samples.len();
        self.samples
            .extend(batch.into_iter().filter(CursorSample::is_finite));
        let dropped = incoming - (self.samples.len() - before);
        if dropped > 0 {
            log::warn!("[CURSOR] Dropped {} non-finite samples", dropped);
        }

        self.samples.sort_by(|a, b| a.time.total_cmp(&b.time));

        log::debug!(
            "[CURSOR] Merged batch of {} samples ({} total)",
            incoming,
            self.samples.len()
        );
    }

    /// Set the viewport size the samples were recorded in.
    ///
    /// A zero or non-finite size counts as unknown.
    pub fn set_viewport(&mut self, viewport: Option<Size<ViewportSpace>>) {
        self.viewport = viewport.filter(Size::is_valid);
    }

    pub fn viewport(&self) -> Option<Size<ViewportSpace>> {
        self.viewport
    }

    /// Set the time calibration offset in seconds. Non-finite values are ignored.
    pub fn set_offset(&mut self, offset: f64) {
        if offset.is_finite() {
            self.offset = offset;
        } else {
            log::warn!("[CURSOR] Ignoring non-finite cursor offset {}", offset);
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn samples(&self) -> &[CursorSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples whose (offset-corrected) time lies in `[from, to]`.
    pub fn samples_between(&self, from: f64, to: f64) -> &[CursorSample] {
        let from = from + self.offset;
        let to = to + self.offset;
        let start = self.samples.partition_point(|s| s.time < from);
        let end = self.samples.partition_point(|s| s.time <= to);
        if start >= end {
            return &[];
        }
        &self.samples[start..end]
    }

    /// Cursor position at `time`, in viewport pixels.
    ///
    /// Returns `None` when there are no samples, the viewport is unknown, or
    /// the time is not finite. Times outside the recorded range clamp to the
    /// first/last sample.
    pub fn interpolate(&self, time: f64) -> Option<Coord<ViewportSpace>> {
        self.viewport?;
        let t = time + self.offset;
        if !t.is_finite() || self.samples.is_empty() {
            return None;
        }

        // Last sample with time <= t, first sample with time >= t
        let before_end = self.samples.partition_point(|s| s.time <= t);
        let after_idx = self.samples.partition_point(|s| s.time < t);
        let before = before_end.checked_sub(1).map(|i| &self.samples[i]);
        let after = self.samples.get(after_idx);

        match (before, after) {
            (Some(b), None) => Some(b.position()),
            (None, Some(a)) => Some(a.position()),
            (Some(b), Some(a)) => {
                let span = a.time - b.time;
                if span <= 0.0 {
                    return Some(b.position());
                }
                let fraction = (t - b.time) / span;
                Some(b.position().lerp(a.position(), fraction))
            },
            (None, None) => None,
        }
    }

    /// Cursor position at `time`, scaled into media pixels.
    pub fn interpolate_media(&self, time: f64, media: Size<MediaSpace>) -> Option<Coord<MediaSpace>> {
        let viewport = self.viewport?;
        self.interpolate(time)
            .map(|point| point.to_media_space(viewport, media))
    }
}
