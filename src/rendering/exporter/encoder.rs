//! Encoder collaborator interface.

use async_trait::async_trait;

use crate::error::ZoomReelResult;
use crate::rendering::frame::Frame;

/// Output stream parameters, fixed for the whole export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

/// Turns a fixed-rate sequence of RGBA frames into a finished media blob.
///
/// Called as `start` once, `encode` per frame in order, then `finish`. If the
/// export is cancelled the encoder is dropped without `finish`, and whatever
/// it buffered is discarded.
#[async_trait]
pub trait FrameEncoder: Send {
    async fn start(&mut self, settings: &EncoderSettings) -> ZoomReelResult<()>;

    async fn encode(&mut self, frame: &Frame) -> ZoomReelResult<()>;

    /// Flush and return the encoded output.
    async fn finish(&mut self) -> ZoomReelResult<Vec<u8>>;
}
