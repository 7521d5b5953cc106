use std::collections::HashMap;

use crate::{
    capture::FrameBuffer,
    encode_ffmpeg::{self, EncodeConfig},
    error::{ShadercapError, ShadercapResult},
};

pub const MP4_MEDIA_TYPE: &str = "video/mp4";

/// Options for one assembly run. Unset values fall back per the pipeline
/// contract: 60 fps, the stage's configured output geometry.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct AssembleOptions {
    pub frame_rate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub verbose: bool,
}

fn resolved_config(opts: &AssembleOptions, stage_width: u32, stage_height: u32) -> EncodeConfig {
    EncodeConfig {
        width: opts.width.unwrap_or(stage_width),
        height: opts.height.unwrap_or(stage_height),
        fps: opts.frame_rate.unwrap_or(60),
        verbose: opts.verbose,
    }
}

/// Encoded video bytes plus their container media type.
#[derive(Clone, Debug)]
pub struct VideoArtifact {
    media_type: String,
    bytes: Vec<u8>,
}

impl VideoArtifact {
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Owned registry of encoded artifacts, addressed by opaque handle strings.
///
/// An artifact lives from assembly completion until the caller revokes its
/// handle (releasing the bytes) or drops the store. One store per pipeline
/// owner; nothing here is process-global.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    next_id: u64,
    entries: HashMap<String, VideoArtifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bytes: Vec<u8>, media_type: impl Into<String>) -> String {
        let handle = format!("shadercap://artifact/{}", self.next_id);
        self.next_id += 1;
        self.entries.insert(
            handle.clone(),
            VideoArtifact {
                media_type: media_type.into(),
                bytes,
            },
        );
        handle
    }

    pub fn resolve(&self, handle: &str) -> Option<&VideoArtifact> {
        self.entries.get(handle)
    }

    /// Release the bytes behind `handle`. Returns whether anything was
    /// revoked; revoking twice is a no-op.
    pub fn revoke(&mut self, handle: &str) -> bool {
        self.entries.remove(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drain `buffer` exactly once, encode the frames, and return a handle to
/// the stored artifact. On any failure no handle is inserted.
pub fn assemble_frames(
    buffer: &mut FrameBuffer,
    store: &mut ArtifactStore,
    stage_width: u32,
    stage_height: u32,
    opts: &AssembleOptions,
) -> ShadercapResult<String> {
    let cfg = resolved_config(opts, stage_width, stage_height);
    cfg.validate()?;

    if buffer.is_empty() {
        return Err(ShadercapError::validation(
            "cannot assemble a video from an empty frame buffer",
        ));
    }

    let frames = buffer.drain_all()?;
    let bytes = encode_ffmpeg::encode_frames(&cfg, &frames)?;

    tracing::debug!(
        frames = frames.len(),
        bytes = bytes.len(),
        "assembled video artifact"
    );
    Ok(store.insert(bytes, MP4_MEDIA_TYPE))
}
