use image::ImageEncoder as _;

use crate::{
    compose,
    error::{ShadercapError, ShadercapResult},
    render::FrameRGBA,
};

/// One captured still image: a self-contained PNG encoding of the composed
/// surface at one point in the capture sequence. Immutable once captured.
#[derive(Clone, Debug)]
pub struct Frame {
    png: Vec<u8>,
}

impl Frame {
    pub const MEDIA_TYPE: &'static str = "image/png";

    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn len(&self) -> usize {
        self.png.len()
    }

    pub fn is_empty(&self) -> bool {
        self.png.is_empty()
    }
}

/// Ordered frame storage: append-only during capture, drained exactly once,
/// in order, by assembly. Append order is frame order is playback order.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
    drained: bool,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) -> ShadercapResult<()> {
        if self.drained {
            return Err(ShadercapError::validation(
                "frame buffer was already assembled; captures into a stale buffer are not supported",
            ));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Take every frame in capture order. The buffer can be drained only
    /// once; a second assembly from the same buffer is an error, not
    /// undefined behavior.
    pub fn drain_all(&mut self) -> ShadercapResult<Vec<Frame>> {
        if self.drained {
            return Err(ShadercapError::validation(
                "frame buffer was already assembled; re-assembly from a stale buffer is not supported",
            ));
        }
        self.drained = true;
        Ok(std::mem::take(&mut self.frames))
    }
}

/// Flatten a composed surface over an opaque background and PNG-encode it.
pub fn encode_frame_png(surface: &FrameRGBA, bg_rgba: [u8; 4]) -> ShadercapResult<Frame> {
    let mut opaque = vec![0u8; surface.data.len()];
    compose::flatten_to_opaque_rgba8(&mut opaque, &surface.data, surface.premultiplied, bg_rgba)?;

    let mut png = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png)
        .write_image(
            &opaque,
            surface.width,
            surface.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ShadercapError::encode(format!("failed to encode frame as PNG: {e}")))?;

    Ok(Frame { png })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(byte: u8) -> Frame {
        let mut surface = FrameRGBA::new(2, 2).unwrap();
        surface.data.fill(byte);
        encode_frame_png(&surface, [0, 0, 0, 255]).unwrap()
    }

    #[test]
    fn encoded_frame_is_png() {
        let frame = solid_frame(255);
        assert_eq!(&frame.as_bytes()[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn push_preserves_capture_order() {
        let mut buffer = FrameBuffer::new();
        let a = solid_frame(0);
        let b = solid_frame(255);
        buffer.push(a.clone()).unwrap();
        buffer.push(b.clone()).unwrap();

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(0).unwrap().as_bytes(), a.as_bytes());
        assert_eq!(buffer.get(1).unwrap().as_bytes(), b.as_bytes());

        let drained = buffer.drain_all().unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].as_bytes(), a.as_bytes());
        assert_eq!(drained[1].as_bytes(), b.as_bytes());
    }

    #[test]
    fn second_drain_is_rejected() {
        let mut buffer = FrameBuffer::new();
        buffer.push(solid_frame(1)).unwrap();
        buffer.drain_all().unwrap();
        assert!(buffer.drain_all().is_err());
    }

    #[test]
    fn push_after_drain_is_rejected() {
        let mut buffer = FrameBuffer::new();
        buffer.drain_all().unwrap();
        assert!(buffer.push(solid_frame(1)).is_err());
    }
}
