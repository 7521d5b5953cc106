use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    capture::Frame,
    error::{ShadercapError, ShadercapResult},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Raise the encoder's log level (the container is produced either way).
    pub verbose: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> ShadercapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ShadercapError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(ShadercapError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p output, required for broad playback compatibility.
            return Err(ShadercapError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// The encoder command line, in order: frame rate, probe limits large enough
/// to never misdetect a long still sequence, the numbered input pattern, the
/// output pixel format, output geometry, output filename.
fn encode_args(cfg: &EncodeConfig) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        if cfg.verbose { "info" } else { "error" }.to_string(),
        "-r".to_string(),
        cfg.fps.to_string(),
        "-analyzeduration".to_string(),
        "6000M".to_string(),
        "-probesize".to_string(),
        "6000M".to_string(),
        "-i".to_string(),
        "image%d.png".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-s".to_string(),
        format!("{}x{}", cfg.width, cfg.height),
        "output.mp4".to_string(),
    ]
}

/// Write every frame into the staging directory as `image<i>.png`,
/// zero-based, strictly increasing, no gaps. The loop returns only after the
/// last frame is on disk, so the encoder can never start on a partial or
/// out-of-order input set.
fn stage_frames(dir: &Path, frames: &[Frame]) -> ShadercapResult<()> {
    for (index, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("image{index}.png"));
        std::fs::write(&path, frame.as_bytes())
            .with_context(|| format!("failed to stage frame '{}'", path.display()))?;
    }
    Ok(())
}

/// Encode an ordered frame sequence into an MP4 container and return its
/// bytes. Invokes the system `ffmpeg` binary once over a staged directory of
/// numbered stills; the staging directory is removed when this returns.
#[tracing::instrument(skip(frames), fields(frames = frames.len()))]
pub fn encode_frames(cfg: &EncodeConfig, frames: &[Frame]) -> ShadercapResult<Vec<u8>> {
    cfg.validate()?;

    if frames.is_empty() {
        return Err(ShadercapError::validation(
            "cannot encode an empty frame sequence",
        ));
    }

    if !is_ffmpeg_on_path() {
        return Err(ShadercapError::encode(
            "ffmpeg is required for MP4 encoding, but was not found on PATH",
        ));
    }

    let dir = std::env::temp_dir().join(format!(
        "shadercap_frames_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ));
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create staging directory '{}'", dir.display()))?;
    let _guard = StagingDirGuard(dir.clone());

    stage_frames(&dir, frames)?;

    // We intentionally use the system `ffmpeg` binary rather than `ffmpeg-next`
    // to avoid native FFmpeg dev header/lib requirements.
    let mut cmd = Command::new("ffmpeg");
    cmd.current_dir(&dir)
        .args(encode_args(cfg))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = cmd.output().map_err(|e| {
        ShadercapError::encode(format!(
            "failed to run ffmpeg (is it installed and on PATH?): {e}"
        ))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ShadercapError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let out_path = dir.join("output.mp4");
    let bytes = std::fs::read(&out_path)
        .with_context(|| format!("failed to read encoded output '{}'", out_path.display()))?;

    tracing::debug!(bytes = bytes.len(), "ffmpeg encode complete");
    Ok(bytes)
}

struct StagingDirGuard(PathBuf);

impl Drop for StagingDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
