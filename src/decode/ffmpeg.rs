//! Conversion of non-WAV files through ffmpeg.
//!
//! The input is transcoded to a temporary 16-bit PCM WAV keeping its channel
//! layout and sample rate. The temporary file is removed when the returned
//! guard is dropped.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::binaries::find_ffmpeg;
use super::error::{DecodeError, DecodeResult};
use super::CancelFlag;

static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// How often the ffmpeg child is polled for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lines of ffmpeg's stderr kept for the error message.
const ERROR_TAIL_LINES: usize = 20;

/// Temporary WAV produced by ffmpeg; deleted on drop.
#[derive(Debug)]
pub struct TempWav {
    path: PathBuf,
}

impl TempWav {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!("Failed to remove temp file {}: {}", self.path.display(), e);
        }
    }
}

/// Converts `input` to a temporary WAV file.
///
/// # Errors
/// - `Ffmpeg` if ffmpeg is missing, cannot be started, or exits with an error
/// - `Cancelled` if `cancel` is raised; the child process is killed
pub fn convert_to_wav(input: &Path, cancel: &CancelFlag) -> DecodeResult<TempWav> {
    let ffmpeg_path = find_ffmpeg().map_err(|e| DecodeError::Ffmpeg(e.to_string()))?;
    let temp = TempWav {
        path: temp_wav_path(),
    };

    let mut child = Command::new(&ffmpeg_path)
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-vn")
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-f")
        .arg("wav")
        .arg("-y")
        .arg(temp.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DecodeError::Ffmpeg(format!("failed to start ffmpeg: {e}")))?;

    tracing::debug!("ffmpeg converting {} -> {}", input.display(), temp.path().display());

    let (status, stderr) = wait_for_exit(&mut child, cancel)?;

    if status.success() {
        Ok(temp)
    } else {
        let message = tail(&stderr, ERROR_TAIL_LINES);
        tracing::error!("ffmpeg conversion failed: {}", message);
        Err(DecodeError::Ffmpeg(message))
    }
}

/// Waits for `child` while draining its stderr, killing it on cancel.
///
/// stderr is read on a helper thread; a child that fills the pipe would
/// otherwise block on write and never exit.
fn wait_for_exit(child: &mut Child, cancel: &CancelFlag) -> DecodeResult<(ExitStatus, String)> {
    let drain = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            if let Err(e) = pipe.read_to_end(&mut bytes) {
                tracing::debug!("Failed to read ffmpeg stderr: {}", e);
            }
            String::from_utf8_lossy(&bytes).into_owned()
        })
    });
    let collect = |drain: Option<std::thread::JoinHandle<String>>| {
        drain
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    };

    loop {
        if cancel.is_cancelled() {
            if let Err(e) = child.kill() {
                tracing::debug!("Failed to kill ffmpeg: {}", e);
            }
            let _ = child.wait();
            collect(drain);
            return Err(DecodeError::Cancelled);
        }
        match child.try_wait()? {
            Some(status) => return Ok((status, collect(drain))),
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }
}

/// The last `lines` non-empty lines of `text`.
fn tail(text: &str, lines: usize) -> String {
    let kept: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    kept[kept.len().saturating_sub(lines)..].join("\n")
}

fn temp_wav_path() -> PathBuf {
    let id = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("wavescope_{}_{}.wav", std::process::id(), id))
}
