//! Timeline math for the editor UI: labels, playhead position and segment
//! bars, all as fractions of the recording duration.

use crate::recording::ZoomSegment;

fn usable(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

/// `MM:SS` label. Non-finite or negative input shows `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Playhead position as a percentage of the timeline, clamped to 0-100.
pub fn progress_percent(time: f64, duration: f64) -> Option<f64> {
    let duration = usable(duration)?;
    if !time.is_finite() {
        return None;
    }
    Some((time / duration * 100.0).clamp(0.0, 100.0))
}

/// Time under a click at `fraction` (0-1) of the timeline width.
pub fn time_at_fraction(fraction: f64, duration: f64) -> Option<f64> {
    let duration = usable(duration)?;
    if !fraction.is_finite() {
        return None;
    }
    Some(fraction.clamp(0.0, 1.0) * duration)
}

/// Left offset and width of a segment bar, in percent of the timeline.
pub fn segment_span_percent(segment: &ZoomSegment, duration: f64) -> Option<(f64, f64)> {
    let duration = usable(duration)?;
    let left = (segment.start / duration * 100.0).clamp(0.0, 100.0);
    let right = (segment.end / duration * 100.0).clamp(0.0, 100.0);
    Some((left, (right - left).max(0.0)))
}
