//! FFmpeg encoder: raw RGBA on stdin, VP9 WebM on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures::future;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

use super::encoder::{EncoderSettings, FrameEncoder};
use crate::error::{ZoomReelError, ZoomReelResult};
use crate::rendering::frame::Frame;

/// Environment variable that overrides the ffmpeg binary location.
pub const FFMPEG_ENV: &str = "ZOOMREEL_FFMPEG";

/// How much of ffmpeg's stderr to keep in error messages.
const STDERR_TAIL: usize = 512;

/// Create a Command configured to hide the console window on Windows.
fn create_hidden_command(program: &Path) -> Command {
    let mut cmd = Command::new(program);

    #[cfg(windows)]
    {
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    cmd
}

/// Find a working ffmpeg binary.
///
/// Order: `ZOOMREEL_FFMPEG`, then ffmpeg-sidecar's resolved path, then the
/// system PATH. Each candidate must answer `-version`.
pub fn find_ffmpeg() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(FFMPEG_ENV).map(PathBuf::from) {
        if ffmpeg_works(&path) {
            log::debug!("[FFMPEG] Using {}: {}", FFMPEG_ENV, path.display());
            return Some(path);
        }
        log::warn!(
            "[FFMPEG] {} points to unusable binary {}",
            FFMPEG_ENV,
            path.display()
        );
    }

    let sidecar_path = ffmpeg_sidecar::paths::ffmpeg_path();
    if ffmpeg_works(&sidecar_path) {
        log::debug!("[FFMPEG] Using sidecar path: {}", sidecar_path.display());
        return Some(sidecar_path);
    }

    log::debug!(
        "[FFMPEG] Sidecar path failed ({}), trying system PATH",
        sidecar_path.display()
    );

    let binary_name = if cfg!(windows) {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    };

    if let Some(path) = find_in_system_path(binary_name) {
        if ffmpeg_works(&path) {
            log::debug!("[FFMPEG] Using system PATH: {}", path.display());
            return Some(path);
        }
    }

    log::warn!("[FFMPEG] No working ffmpeg found");
    None
}

/// Whether `path` runs and answers `-version`.
fn ffmpeg_works(path: &Path) -> bool {
    let mut cmd = std::process::Command::new(path);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    cmd.arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn find_in_system_path(binary_name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary_name))
        .find(|candidate| candidate.is_file())
}

/// FFmpeg arguments for one export.
pub fn build_args(settings: &EncoderSettings) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-y".to_string(),
        // Raw RGBA input from stdin
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", settings.width, settings.height),
        "-r".to_string(),
        settings.fps.to_string(),
        "-i".to_string(),
        "-".to_string(),
        "-c:v".to_string(),
        "libvpx-vp9".to_string(),
        "-b:v".to_string(),
        settings.bitrate.to_string(),
        "-deadline".to_string(),
        "realtime".to_string(),
        "-cpu-used".to_string(),
        "4".to_string(),
        // Keyframe every second for seeking
        "-g".to_string(),
        settings.fps.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-f".to_string(),
        "webm".to_string(),
        "pipe:1".to_string(),
    ]
}

/// Encoder that runs one ffmpeg process per export.
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    settings: Option<EncoderSettings>,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_task: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr_task: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    frames_written: u32,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            settings: None,
            child: None,
            stdin: None,
            stdout_task: None,
            stderr_task: None,
            frames_written: 0,
        }
    }

    /// Encoder using the ffmpeg found by [`find_ffmpeg`].
    pub fn locate() -> ZoomReelResult<Self> {
        find_ffmpeg()
            .map(Self::new)
            .ok_or_else(|| ZoomReelError::EncoderError("FFmpeg not found".to_string()))
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    async fn stderr_tail(&mut self) -> String {
        let Some(task) = self.stderr_task.take() else {
            return String::new();
        };
        match task.await {
            Ok(Ok(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                let start = text.len().saturating_sub(STDERR_TAIL);
                text.get(start..).unwrap_or(text.as_ref()).trim().to_string()
            },
            _ => String::new(),
        }
    }
}

fn drain<R>(mut reader: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

#[async_trait]
impl FrameEncoder for FfmpegEncoder {
    async fn start(&mut self, settings: &EncoderSettings) -> ZoomReelResult<()> {
        if self.child.is_some() {
            return Err(ZoomReelError::EncoderError(
                "Encoder already started".to_string(),
            ));
        }

        let args = build_args(settings);
        log::info!("[EXPORT] FFmpeg encoder: ffmpeg {}", args.join(" "));

        let mut child = create_hidden_command(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ZoomReelError::EncoderError(format!("Failed to start FFmpeg: {}", e)))?;

        self.stdin = child.stdin.take();
        self.stdout_task = child.stdout.take().map(drain);
        self.stderr_task = child.stderr.take().map(drain);
        self.child = Some(child);
        self.settings = Some(*settings);
        self.frames_written = 0;
        Ok(())
    }

    async fn encode(&mut self, frame: &Frame) -> ZoomReelResult<()> {
        let settings = self
            .settings
            .ok_or_else(|| ZoomReelError::EncoderError("Encoder not started".to_string()))?;
        if frame.width() != settings.width || frame.height() != settings.height {
            return Err(ZoomReelError::EncoderError(format!(
                "Frame {} is {}x{}, encoder expects {}x{}",
                frame.frame_number,
                frame.width(),
                frame.height(),
                settings.width,
                settings.height
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ZoomReelError::EncoderError("Encoder input closed".to_string()))?;
        let written = stdin.write_all(frame.as_bytes()).await;
        if let Err(e) = written {
            let tail = self.stderr_tail().await;
            return Err(ZoomReelError::EncoderError(format!(
                "FFmpeg write failed: {} {}",
                e, tail
            )));
        }
        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> ZoomReelResult<Vec<u8>> {
        // Closing stdin signals EOF
        drop(self.stdin.take());

        let mut child = self
            .child
            .take()
            .ok_or_else(|| ZoomReelError::EncoderError("Encoder not started".to_string()))?;
        let stdout_task = self
            .stdout_task
            .take()
            .ok_or_else(|| ZoomReelError::EncoderError("Encoder output closed".to_string()))?;

        // Drain output while ffmpeg flushes
        let (status, output) = future::join(child.wait(), stdout_task).await;
        let status = status?;
        let output = output
            .map_err(|e| ZoomReelError::EncoderError(format!("Output reader failed: {}", e)))??;

        if !status.success() {
            let tail = self.stderr_tail().await;
            return Err(ZoomReelError::EncoderError(format!(
                "FFmpeg exited with {}: {}",
                status, tail
            )));
        }

        log::info!(
            "[EXPORT] FFmpeg finished: {} frames, {} bytes",
            self.frames_written,
            output.len()
        );
        Ok(output)
    }
}
