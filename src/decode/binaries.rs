//! External binary locator.
//!
//! Finds helper programs (ffmpeg for conversion, ffplay/mpv for audible
//! playback). Checks the usual per-platform install locations before falling
//! back to a PATH search, so binaries are found even from shells with a
//! trimmed PATH.

use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Locates `binary_name` on the system.
///
/// Checks in this order:
/// 1. macOS homebrew locations: `/opt/homebrew/bin`, `/usr/local/bin`
/// 2. Linux standard locations: `/usr/bin`, `/usr/local/bin`, `/snap/bin`
/// 3. Windows: `C:\<name>\bin`, `C:\Program Files\<name>\bin`
/// 4. PATH search via `which` or `where`
pub fn find_binary(binary_name: &str) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = if cfg!(target_os = "macos") {
        ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
            .iter()
            .map(|dir| PathBuf::from(dir).join(binary_name))
            .collect()
    } else if cfg!(target_os = "linux") {
        ["/usr/bin", "/usr/local/bin", "/snap/bin"]
            .iter()
            .map(|dir| PathBuf::from(dir).join(binary_name))
            .collect()
    } else if cfg!(target_os = "windows") {
        let exe = format!("{binary_name}.exe");
        vec![
            PathBuf::from(format!("C:\\{binary_name}\\bin")).join(&exe),
            PathBuf::from(format!("C:\\Program Files\\{binary_name}\\bin")).join(&exe),
            // ffplay ships inside the ffmpeg distribution
            PathBuf::from("C:\\ffmpeg\\bin").join(&exe),
        ]
    } else {
        Vec::new()
    };

    for path in candidates {
        if path.exists() {
            tracing::debug!("Found {} at: {}", binary_name, path.display());
            return Ok(path);
        }
    }

    let path = find_in_path(binary_name)?;
    tracing::debug!("Found {} in PATH at: {}", binary_name, path.display());
    Ok(path)
}

/// Locates ffmpeg, with an install hint in the error.
pub fn find_ffmpeg() -> Result<PathBuf> {
    find_binary("ffmpeg").map_err(|_| {
        anyhow!(
            "ffmpeg not found. It is needed for non-WAV files. Please install ffmpeg:\n\
             macOS: brew install ffmpeg\n\
             Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
             Windows: Download from https://ffmpeg.org/download.html"
        )
    })
}

/// Searches the system PATH with `which` (Unix) or `where` (Windows).
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = std::process::Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `where` may list several matches, one per line
        if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            return Ok(PathBuf::from(first));
        }
    }

    Err(anyhow!("{binary_name} not found in PATH"))
}
