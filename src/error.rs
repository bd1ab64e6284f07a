//! Central error types for ZoomReel.
//!
//! Render-tick code never produces these: missing data there degrades to an
//! unzoomed draw. Errors only come out of storage, session loading and export.
//! All errors implement `Serialize` so they can be handed to the extension UI.

use serde::Serialize;
use thiserror::Error;

/// Main error type for ZoomReel operations.
#[derive(Error, Debug)]
pub enum ZoomReelError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Stored blob could not be decoded
    #[error("Blob error: {0}")]
    BlobError(String),

    /// Encoder setup, write or flush failed
    #[error("Encoder error: {0}")]
    EncoderError(String),

    /// Export pipeline error
    #[error("Export error: {0}")]
    ExportError(String),

    /// Export was cancelled before completion
    #[error("Export cancelled")]
    ExportCancelled,

    /// Neither the recording timestamps nor the media report a usable duration
    #[error("Recording duration is unknown")]
    DurationUnknown,

    /// Media source has no frame to draw
    #[error("Media frame unavailable at {time:.3}s")]
    FrameUnavailable { time: f64 },

    /// Zoom segment not found by ID
    #[error("Zoom segment not found with ID {id}")]
    SegmentNotFound { id: u64 },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Serialize as the error message string for the UI boundary.
impl Serialize for ZoomReelError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<base64::DecodeError> for ZoomReelError {
    fn from(err: base64::DecodeError) -> Self {
        ZoomReelError::BlobError(err.to_string())
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to ZoomReelError::Other with the given message.
    fn context(self, msg: &str) -> ZoomReelResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> ZoomReelResult<T> {
        self.ok_or_else(|| ZoomReelError::Other(msg.to_string()))
    }
}

/// Type alias for Results using ZoomReelError.
pub type ZoomReelResult<T> = Result<T, ZoomReelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZoomReelError::EncoderError("flush failed".to_string());
        assert_eq!(err.to_string(), "Encoder error: flush failed");
    }

    #[test]
    fn test_error_serialization() {
        let err = ZoomReelError::ExportCancelled;
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Export cancelled\"");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ZoomReelError = io_err.into();
        assert!(matches!(err, ZoomReelError::StorageError(_)));
    }

    #[test]
    fn test_segment_and_frame_errors() {
        let missing = ZoomReelError::SegmentNotFound { id: 42 };
        assert!(missing.to_string().contains("42"));

        let frame = ZoomReelError::FrameUnavailable { time: 1.5 };
        assert_eq!(frame.to_string(), "Media frame unavailable at 1.500s");

        assert!(ZoomReelError::DurationUnknown
            .to_string()
            .contains("duration"));
    }

    #[test]
    fn test_option_ext_context() {
        let opt: Option<i32> = None;
        let result = opt.context("value was missing");

        assert!(matches!(result, Err(ZoomReelError::Other(_))));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("value was missing"));
    }

    #[test]
    fn test_option_ext_some_passthrough() {
        let opt: Option<i32> = Some(42);
        assert_eq!(opt.context("should not appear").unwrap(), 42);
    }
}
