//! Recording metadata written by the capture side.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rendering::coord::{MediaSpace, Size, ViewportSpace};

/// Size of the tracked browser viewport, as stored next to the cursor data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    pub fn to_size(self) -> Size<ViewportSpace> {
        Size::new(self.width, self.height)
    }
}

/// Wall-clock facts about one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct RecordingMetadata {
    /// Epoch milliseconds when capture started.
    #[ts(type = "number | null")]
    pub start_time_ms: Option<i64>,
    /// Epoch milliseconds when capture stopped.
    #[ts(type = "number | null")]
    pub end_time_ms: Option<i64>,
    /// Capture duration in seconds.
    pub duration_secs: Option<f64>,
    /// When the recording was saved.
    #[ts(type = "string | null")]
    pub recorded_at: Option<DateTime<Utc>>,
    pub viewport: Option<ViewportSize>,
}

impl RecordingMetadata {
    /// Metadata from the capture start/stop timestamps.
    ///
    /// The duration is derived from the two timestamps and left unset if they
    /// are out of order.
    pub fn from_wall_clock(start_time_ms: i64, end_time_ms: i64) -> Self {
        let duration_secs =
            (end_time_ms > start_time_ms).then(|| (end_time_ms - start_time_ms) as f64 / 1000.0);

        Self {
            start_time_ms: Some(start_time_ms),
            end_time_ms: Some(end_time_ms),
            duration_secs,
            recorded_at: Utc.timestamp_millis_opt(end_time_ms).single(),
            viewport: None,
        }
    }

    /// Playable duration in seconds.
    ///
    /// Streamed containers often report an unknown or infinite duration, so
    /// the stored capture duration wins, then the media's own value.
    pub fn effective_duration(&self, media_reported: Option<f64>) -> Option<f64> {
        let usable = |d: f64| d.is_finite() && d > 0.0;

        self.duration_secs
            .filter(|d| usable(*d))
            .or_else(|| {
                let (start, end) = (self.start_time_ms?, self.end_time_ms?);
                let derived = (end - start) as f64 / 1000.0;
                usable(derived).then_some(derived)
            })
            .or_else(|| media_reported.filter(|d| usable(*d)))
    }

    /// Recorded viewport, or the media size for legacy recordings without one.
    pub fn viewport_or_media(&self, media: Size<MediaSpace>) -> Size<ViewportSpace> {
        if let Some(viewport) = self.viewport.map(ViewportSize::to_size) {
            if viewport.is_valid() {
                return viewport;
            }
        }

        let guess = Size::new(media.width, media.height);
        log::warn!(
            "[SESSION] Viewport size missing, assuming {}x{}",
            guess.width,
            guess.height
        );
        guess
    }

    /// One-line description for the player header.
    pub fn describe(&self) -> String {
        match self.recorded_at {
            Some(at) => format!(
                "Recording from {}",
                at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            ),
            None => "No recording available".to_string(),
        }
    }
}
