use crate::{
    error::{ShadercapError, ShadercapResult},
    shader::{ShaderProgram, UniformSet},
};

/// One raw RGBA8 pixel surface, as produced by the renderer collaborator.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// A transparent surface sized for one output frame.
    pub fn new(width: u32, height: u32) -> ShadercapResult<Self> {
        if width == 0 || height == 0 {
            return Err(ShadercapError::validation(
                "frame width/height must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
            premultiplied: true,
        })
    }
}

/// Renderer-side clear behavior between draws.
///
/// `clear_rgba: None` leaves the previous frame's pixels in the target, so a
/// shader that draws with partial coverage accumulates trails across captures.
#[derive(Clone, Debug, Default)]
pub struct RenderSettings {
    pub clear_rgba: Option<[u8; 4]>,
}

/// The external renderer collaborator.
///
/// An implementation owns whatever drawing context it needs and draws one
/// full-screen quad (orthographic view volume fixed at [-1,1] on each axis)
/// with the given program and uniform set into `target`. Acquiring the
/// context happens in the implementation's constructor; a host without one
/// must fail there, fatally, before a stage can be built around it.
///
/// Shader source is passed through unvalidated: a malformed program is the
/// renderer's to reject, and its error is surfaced unmodified.
pub trait QuadRenderer {
    fn render_quad(
        &mut self,
        program: &ShaderProgram,
        uniforms: &UniformSet,
        target: &mut FrameRGBA,
    ) -> ShadercapResult<()>;
}
