//! Playback and camera configuration.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::export::ExportSettings;

/// How the active segment is chosen when several segments cover the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum OverlapPolicy {
    /// First segment in store order wins.
    #[default]
    FirstMatch,
    /// Last segment in store order wins.
    LastMatch,
    /// Segment with the latest start wins (innermost when nested).
    LatestStart,
}

/// Camera smoothing constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CameraTuning {
    /// Fraction of the remaining scale distance covered per tick.
    pub zoom_speed: f64,
    /// Scale snaps to its target once closer than this.
    pub snap_epsilon: f64,
    /// Pan easing per tick in manual mode.
    pub manual_smooth: f64,
    /// Pan easing per tick in follow mode (once outside the deadband).
    pub follow_smooth: f64,
    /// Follow mode ignores cursor offsets up to this many media pixels per axis.
    pub follow_deadband_px: f64,
    /// Below `1 + full_frame_epsilon` the renderer uses a plain full-frame blit.
    pub full_frame_epsilon: f64,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            zoom_speed: 0.15,
            snap_epsilon: 0.01,
            manual_smooth: 0.15,
            follow_smooth: 0.1,
            follow_deadband_px: 50.0,
            full_frame_epsilon: 0.01,
        }
    }
}

impl CameraTuning {
    /// Clamp settings to acceptable ranges.
    ///
    /// Easing factors stay in `(0, 1]` so the camera always converges and never
    /// overshoots.
    pub fn validate(&mut self) {
        let defaults = Self::default();
        self.zoom_speed = clamp_factor(self.zoom_speed, defaults.zoom_speed);
        self.manual_smooth = clamp_factor(self.manual_smooth, defaults.manual_smooth);
        self.follow_smooth = clamp_factor(self.follow_smooth, defaults.follow_smooth);
        self.snap_epsilon = clamp_non_negative(self.snap_epsilon, defaults.snap_epsilon);
        self.follow_deadband_px =
            clamp_non_negative(self.follow_deadband_px, defaults.follow_deadband_px);
        self.full_frame_epsilon =
            clamp_non_negative(self.full_frame_epsilon, defaults.full_frame_epsilon);
    }
}

fn clamp_factor(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value.min(1.0)
    } else {
        fallback
    }
}

fn clamp_non_negative(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        fallback
    }
}

/// Everything the player needs to know that is not part of the recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct PlayerConfig {
    pub camera: CameraTuning,
    pub overlap_policy: OverlapPolicy,
    pub export: ExportSettings,
}

impl PlayerConfig {
    /// Validate and clamp settings to acceptable ranges.
    pub fn validate(&mut self) {
        self.camera.validate();
        self.export.validate();
    }

    /// Reset all settings to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.camera.zoom_speed, 0.15);
        assert_eq!(config.camera.follow_smooth, 0.1);
        assert_eq!(config.camera.manual_smooth, 0.15);
        assert_eq!(config.camera.follow_deadband_px, 50.0);
        assert_eq!(config.overlap_policy, OverlapPolicy::FirstMatch);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PlayerConfig {
            camera: CameraTuning {
                zoom_speed: 3.0,
                manual_smooth: -1.0,
                follow_smooth: f64::NAN,
                follow_deadband_px: -20.0,
                ..Default::default()
            },
            ..Default::default()
        };
        config.validate();

        assert_eq!(config.camera.zoom_speed, 1.0);
        assert_eq!(config.camera.manual_smooth, 0.15);
        assert_eq!(config.camera.follow_smooth, 0.1);
        assert_eq!(config.camera.follow_deadband_px, 0.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"overlapPolicy":"lastMatch","camera":{"zoomSpeed":0.3}}"#)
                .unwrap();
        assert_eq!(config.overlap_policy, OverlapPolicy::LastMatch);
        assert_eq!(config.camera.zoom_speed, 0.3);
        assert_eq!(config.camera.follow_deadband_px, 50.0);
    }
}
