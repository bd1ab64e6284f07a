//! Pipeline parallelism for video export.
//!
//! The render loop hands finished frames to an encode task through a bounded
//! channel, so encoding overlaps rendering and a slow encoder applies
//! backpressure instead of letting frames pile up.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::encoder::FrameEncoder;
use crate::error::ZoomReelResult;
use crate::rendering::frame::Frame;

/// Buffer size for the encode channel.
/// At 1080p RGBA (~8MB/frame), 4 frames is ~32MB.
pub const PIPELINE_BUFFER_SIZE: usize = 4;

/// Spawns an encode task that feeds frames to an already started encoder.
///
/// When the sender is dropped the task flushes the encoder and returns its
/// output. If an encode call fails the task returns early, which closes the
/// channel and makes the next `send` fail.
///
/// Returns the sender and task handle for cleanup.
pub fn spawn_encode_task<E>(
    mut encoder: E,
) -> (mpsc::Sender<Frame>, JoinHandle<ZoomReelResult<Vec<u8>>>)
where
    E: FrameEncoder + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Frame>(PIPELINE_BUFFER_SIZE);

    let handle = tokio::spawn(async move {
        let mut frame_count = 0u32;

        while let Some(frame) = rx.recv().await {
            if let Err(e) = encoder.encode(&frame).await {
                log::error!(
                    "[PIPELINE] Encode error at frame {}: {}",
                    frame.frame_number,
                    e
                );
                return Err(e);
            }
            frame_count += 1;
        }

        log::debug!("[PIPELINE] Encode task complete: {} frames", frame_count);
        encoder.finish().await
    });

    (tx, handle)
}
