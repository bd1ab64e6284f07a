//! Export configuration.
//!
//! Frame rate and bitrate are simple enumerated choices; the synthetic export
//! clock steps by `1 / fps`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Export frame rate choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ExportFps {
    Fps24,
    #[default]
    Fps30,
    Fps60,
}

impl ExportFps {
    pub fn as_u32(self) -> u32 {
        match self {
            ExportFps::Fps24 => 24,
            ExportFps::Fps30 => 30,
            ExportFps::Fps60 => 60,
        }
    }

    /// Seconds between two exported frames.
    pub fn frame_interval(self) -> f64 {
        1.0 / self.as_u32() as f64
    }
}

/// Export bitrate choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ExportBitrate {
    /// 1 Mbps.
    Low,
    /// 2.5 Mbps, same as the capture bitrate.
    #[default]
    Standard,
    /// 5 Mbps.
    High,
    /// 8 Mbps.
    Ultra,
}

impl ExportBitrate {
    pub fn bits_per_second(self) -> u32 {
        match self {
            ExportBitrate::Low => 1_000_000,
            ExportBitrate::Standard => 2_500_000,
            ExportBitrate::High => 5_000_000,
            ExportBitrate::Ultra => 8_000_000,
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ExportSettings {
    pub fps: ExportFps,
    pub bitrate: ExportBitrate,
    /// Largest output width; larger media is downscaled.
    pub max_width: u32,
    /// Largest output height; larger media is downscaled.
    pub max_height: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: ExportFps::default(),
            bitrate: ExportBitrate::default(),
            max_width: 1920,
            max_height: 1080,
        }
    }
}

impl ExportSettings {
    /// Clamp the resolution cap into a range encoders accept.
    pub fn validate(&mut self) {
        self.max_width = self.max_width.clamp(2, 1920);
        self.max_height = self.max_height.clamp(2, 1080);
    }

    /// Output size for a given media size.
    ///
    /// Aspect-preserving downscale only (never upscales), rounded down to even
    /// dimensions for the encoder. `(0, 0)` when no even size fits.
    pub fn output_size(&self, media_width: u32, media_height: u32) -> (u32, u32) {
        if media_width == 0 || media_height == 0 {
            return (0, 0);
        }

        let factor = (self.max_width as f64 / media_width as f64)
            .min(self.max_height as f64 / media_height as f64)
            .min(1.0);

        let width = (media_width as f64 * factor).floor() as u32 / 2 * 2;
        let height = (media_height as f64 * factor).floor() as u32 / 2 * 2;
        if width == 0 || height == 0 {
            return (0, 0);
        }

        (width, height)
    }
}
